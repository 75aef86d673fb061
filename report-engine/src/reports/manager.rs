//! ReportManager - report lifecycle over the storage boundary
//!
//! This module handles:
//! - Creation of pending reports from employee drafts
//! - Edits while a report is still pending
//! - Review transitions (approve / reject), single and bulk
//! - Deletion under the role rules
//!
//! Validation and permission checks run before any write; a rejected call
//! leaves storage untouched. Observers learn about changes through the
//! store's event stream, bulk transitions appearing as one event.

use std::sync::Arc;

use shared::error::{AppError, AppResult};
use shared::models::{
    Identity, Report, ReportDraft, ReportPatch, ReportStatus, normalize_service_labels,
};

use crate::access::require_admin;
use crate::store::{ReportQuery, ReportStore};
use crate::utils::time::now_millis;

use super::validate::{validate_new_report, validate_report};

/// Report lifecycle manager
#[derive(Clone)]
pub struct ReportManager {
    store: Arc<dyn ReportStore>,
}

impl std::fmt::Debug for ReportManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportManager").finish()
    }
}

impl ReportManager {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    // ========== Permission predicates ==========

    /// A report can be edited while pending, by an admin or its owner.
    /// Once reviewed it is frozen for everyone, admins included.
    pub fn can_edit(viewer: &Identity, report: &Report) -> bool {
        report.status == ReportStatus::Pending
            && (viewer.is_admin() || report.is_owned_by(&viewer.id))
    }

    /// Admins may delete at any status; employees only their own pending
    /// reports. Deletion is deliberately wider than editing.
    pub fn can_delete(viewer: &Identity, report: &Report) -> bool {
        viewer.is_admin()
            || (report.is_owned_by(&viewer.id) && report.status == ReportStatus::Pending)
    }

    // ========== Lifecycle operations ==========

    /// Create a pending report submitted by `actor`.
    ///
    /// The business date defaults to now and may be overridden for
    /// backdated entries. Participants are derived from the partner field.
    pub async fn create(&self, draft: ReportDraft, actor: &Identity) -> AppResult<Report> {
        let now = now_millis();
        let mut report = Report {
            id: String::new(),
            price: draft.price,
            services: normalize_service_labels(draft.services),
            payment_method: draft.payment_method,
            note: draft.note,
            image_url: draft.image_url,
            status: ReportStatus::Pending,
            is_overtime: draft.is_overtime,
            user_id: actor.id.clone(),
            employee_name: actor.display_name.clone(),
            partner_id: draft.partner_id,
            partner_name: draft.partner_name,
            participant_ids: Vec::new(),
            created_at: draft.created_at.unwrap_or(now),
            updated_at: now,
        };
        report.rebuild_participants();
        validate_new_report(&report)?;

        report.id = self.store.insert(report.clone()).await?;
        tracing::info!(
            report_id = %report.id,
            user_id = %actor.id,
            price = report.price,
            participants = report.participant_count(),
            "Report submitted"
        );
        Ok(report)
    }

    /// Apply changes to a pending report.
    ///
    /// Only admins and the owner may edit. Any field may change, including
    /// the business date; the photo and the partner may be cleared. The
    /// resulting record is re-validated before the write.
    pub async fn edit(&self, id: &str, patch: ReportPatch, viewer: &Identity) -> AppResult<Report> {
        let mut report = self.load(id).await?;

        if report.status != ReportStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "report {id} has been reviewed and can no longer be edited"
            )));
        }
        if !Self::can_edit(viewer, &report) {
            return Err(AppError::permission(
                "only an admin or the submitting employee can edit a report",
            ));
        }

        patch.apply_to(&mut report);
        validate_report(&report)?;
        report.updated_at = now_millis();

        self.store.update(&report).await?;
        tracing::info!(report_id = %id, editor = %viewer.id, "Report edited");
        Ok(report)
    }

    /// Mark a pending report approved. Admin only.
    pub async fn approve(&self, id: &str, viewer: &Identity) -> AppResult<Report> {
        self.transition(id, ReportStatus::Approved, viewer).await
    }

    /// Mark a pending report rejected. Admin only.
    pub async fn reject(&self, id: &str, viewer: &Identity) -> AppResult<Report> {
        self.transition(id, ReportStatus::Rejected, viewer).await
    }

    async fn transition(
        &self,
        id: &str,
        target: ReportStatus,
        viewer: &Identity,
    ) -> AppResult<Report> {
        require_admin(viewer)?;
        let mut report = self.load(id).await?;

        // Approved and rejected are terminal; a second review must fail
        // rather than double-apply.
        if report.status != ReportStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "report {id} has already been reviewed"
            )));
        }

        report.status = target;
        report.updated_at = now_millis();
        self.store.update(&report).await?;
        tracing::info!(
            report_id = %id,
            reviewer = %viewer.id,
            approved = target == ReportStatus::Approved,
            "Report reviewed"
        );
        Ok(report)
    }

    /// Approve every currently-pending report in one atomic batch.
    /// Returns how many reports were approved.
    pub async fn approve_all_pending(&self, viewer: &Identity) -> AppResult<usize> {
        self.bulk_transition(ReportStatus::Approved, viewer).await
    }

    /// Reject every currently-pending report in one atomic batch.
    pub async fn reject_all_pending(&self, viewer: &Identity) -> AppResult<usize> {
        self.bulk_transition(ReportStatus::Rejected, viewer).await
    }

    async fn bulk_transition(&self, target: ReportStatus, viewer: &Identity) -> AppResult<usize> {
        require_admin(viewer)?;
        let mut pending = self.store.query(&ReportQuery::pending()).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        let now = now_millis();
        for report in &mut pending {
            report.status = target;
            report.updated_at = now;
        }
        self.store.apply_batch(&pending).await?;
        tracing::info!(
            count = pending.len(),
            reviewer = %viewer.id,
            approved = target == ReportStatus::Approved,
            "Bulk review applied"
        );
        Ok(pending.len())
    }

    /// Delete a report under the role rules.
    pub async fn delete(&self, id: &str, viewer: &Identity) -> AppResult<()> {
        let report = self.load(id).await?;
        if !Self::can_delete(viewer, &report) {
            return Err(AppError::permission(
                "employees can only delete their own pending reports",
            ));
        }
        self.store.delete(id).await?;
        tracing::info!(report_id = %id, deleted_by = %viewer.id, "Report deleted");
        Ok(())
    }

    // ========== Reads ==========

    /// Fetch one report.
    pub async fn get(&self, id: &str) -> AppResult<Report> {
        self.load(id).await
    }

    /// Run a report query against the store.
    pub async fn list(&self, query: &ReportQuery) -> AppResult<Vec<Report>> {
        Ok(self.store.query(query).await?)
    }

    /// How many reports are awaiting review.
    pub async fn pending_count(&self) -> AppResult<usize> {
        Ok(self.store.query(&ReportQuery::pending()).await?.len())
    }

    async fn load(&self, id: &str) -> AppResult<Report> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("report {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreEvent};

    fn create_test_manager() -> (ReportManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ReportManager::new(store.clone()), store)
    }

    fn admin() -> Identity {
        Identity::admin("boss", "Chi")
    }

    fn lan() -> Identity {
        Identity::employee("u-lan", "Lan")
    }

    fn mai() -> Identity {
        Identity::employee("u-mai", "Mai")
    }

    fn draft(price: f64) -> ReportDraft {
        ReportDraft {
            price,
            services: vec!["Nail".to_owned()],
            image_url: Some("https://img.example/proof.jpg".to_owned()),
            ..Default::default()
        }
    }

    async fn submit(manager: &ReportManager, actor: &Identity, price: f64) -> Report {
        manager.create(draft(price), actor).await.unwrap()
    }

    // ==================== Creation ====================

    #[tokio::test]
    async fn create_starts_pending_with_derived_participants() {
        let (manager, _) = create_test_manager();

        let mut input = draft(150_000.0);
        input.partner_id = Some("u-mai".to_owned());
        input.partner_name = Some("Mai".to_owned());
        let report = manager.create(input, &lan()).await.unwrap();

        assert!(!report.id.is_empty());
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.user_id, "u-lan");
        assert_eq!(report.employee_name, "Lan");
        assert_eq!(report.participant_ids, vec!["u-lan", "u-mai"]);
        assert_eq!(report.shared_price(), 75_000.0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input() {
        let (manager, store) = create_test_manager();

        let err = manager.create(draft(0.0), &lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut no_image = draft(100_000.0);
        no_image.image_url = None;
        let err = manager.create(no_image, &lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        let mut no_service = draft(100_000.0);
        no_service.services.clear();
        let err = manager.create(no_service, &lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert_eq!(store.report_count(), 0);
    }

    #[tokio::test]
    async fn create_accepts_backdated_business_date() {
        let (manager, _) = create_test_manager();

        let mut input = draft(100_000.0);
        input.created_at = Some(1_600_000_000_000);
        let report = manager.create(input, &lan()).await.unwrap();
        assert_eq!(report.created_at, 1_600_000_000_000);
        assert!(report.updated_at > report.created_at);
    }

    // ==================== Editing ====================

    #[tokio::test]
    async fn owner_edits_pending_report() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let patch = ReportPatch {
            price: Some(120_000.0),
            note: Some(Some("tip included".to_owned())),
            ..Default::default()
        };
        let edited = manager.edit(&report.id, patch, &lan()).await.unwrap();

        assert_eq!(edited.price, 120_000.0);
        assert_eq!(edited.note.as_deref(), Some("tip included"));
        assert_eq!(edited.created_at, report.created_at);
        assert_eq!(edited.services, report.services);
    }

    #[tokio::test]
    async fn edit_can_clear_the_image() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let patch = ReportPatch {
            image_url: Some(None),
            ..Default::default()
        };
        let edited = manager.edit(&report.id, patch, &lan()).await.unwrap();
        assert_eq!(edited.image_url, None);
    }

    #[tokio::test]
    async fn edit_can_move_the_business_date() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let patch = ReportPatch {
            created_at: Some(1_650_000_000_000),
            ..Default::default()
        };
        let edited = manager.edit(&report.id, patch, &lan()).await.unwrap();
        assert_eq!(edited.created_at, 1_650_000_000_000);
    }

    #[tokio::test]
    async fn reviewed_reports_are_frozen_for_everyone() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;
        manager.approve(&report.id, &admin()).await.unwrap();

        let patch = ReportPatch {
            price: Some(1.0),
            ..Default::default()
        };
        let err = manager
            .edit(&report.id, patch.clone(), &lan())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        // Not even the admin can edit after review
        let err = manager.edit(&report.id, patch, &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn strangers_cannot_edit() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let patch = ReportPatch {
            price: Some(1_000.0),
            ..Default::default()
        };
        let err = manager.edit(&report.id, patch, &mai()).await.unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));
    }

    #[tokio::test]
    async fn edit_rejects_invalid_result() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let patch = ReportPatch {
            price: Some(-5.0),
            ..Default::default()
        };
        let err = manager.edit(&report.id, patch, &lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        // Record unchanged
        let stored = manager.get(&report.id).await.unwrap();
        assert_eq!(stored.price, 100_000.0);
    }

    // ==================== Review ====================

    #[tokio::test]
    async fn admin_approves_and_rejects() {
        let (manager, _) = create_test_manager();
        let first = submit(&manager, &lan(), 100_000.0).await;
        let second = submit(&manager, &lan(), 200_000.0).await;

        let approved = manager.approve(&first.id, &admin()).await.unwrap();
        assert_eq!(approved.status, ReportStatus::Approved);
        assert!(approved.updated_at >= first.updated_at);

        let rejected = manager.reject(&second.id, &admin()).await.unwrap();
        assert_eq!(rejected.status, ReportStatus::Rejected);
    }

    #[tokio::test]
    async fn employees_cannot_review() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        let err = manager.approve(&report.id, &lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));

        let err = manager.reject(&report.id, &mai()).await.unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));
    }

    #[tokio::test]
    async fn double_review_fails_without_reapplying() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;

        manager.approve(&report.id, &admin()).await.unwrap();
        let err = manager.approve(&report.id, &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        // Rejecting an approved report fails the same way
        let err = manager.reject(&report.id, &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidState { .. }));

        let stored = manager.get(&report.id).await.unwrap();
        assert_eq!(stored.status, ReportStatus::Approved);
    }

    #[tokio::test]
    async fn review_of_unknown_report_is_not_found() {
        let (manager, _) = create_test_manager();
        let err = manager.approve("ghost", &admin()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    // ==================== Bulk review ====================

    #[tokio::test]
    async fn bulk_approve_touches_only_pending() {
        let (manager, _) = create_test_manager();
        submit(&manager, &lan(), 100_000.0).await;
        submit(&manager, &mai(), 200_000.0).await;
        let rejected = submit(&manager, &lan(), 300_000.0).await;
        manager.reject(&rejected.id, &admin()).await.unwrap();

        let count = manager.approve_all_pending(&admin()).await.unwrap();
        assert_eq!(count, 2);

        let still_rejected = manager.get(&rejected.id).await.unwrap();
        assert_eq!(still_rejected.status, ReportStatus::Rejected);
        assert_eq!(manager.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn bulk_review_is_one_store_event() {
        let (manager, store) = create_test_manager();
        submit(&manager, &lan(), 100_000.0).await;
        submit(&manager, &mai(), 200_000.0).await;

        let mut rx = store.events();
        manager.reject_all_pending(&admin()).await.unwrap();

        match rx.recv().await.unwrap() {
            StoreEvent::BulkUpdated(batch) => {
                assert_eq!(batch.len(), 2);
                assert!(batch.iter().all(|r| r.status == ReportStatus::Rejected));
            }
            other => panic!("expected BulkUpdated, got {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn bulk_review_requires_admin_and_tolerates_empty() {
        let (manager, _) = create_test_manager();

        let err = manager.approve_all_pending(&lan()).await.unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));

        assert_eq!(manager.approve_all_pending(&admin()).await.unwrap(), 0);
    }

    // ==================== Deletion ====================

    #[tokio::test]
    async fn admin_deletes_at_any_status() {
        let (manager, store) = create_test_manager();
        let pending = submit(&manager, &lan(), 100_000.0).await;
        let approved = submit(&manager, &lan(), 200_000.0).await;
        manager.approve(&approved.id, &admin()).await.unwrap();

        manager.delete(&pending.id, &admin()).await.unwrap();
        manager.delete(&approved.id, &admin()).await.unwrap();
        assert_eq!(store.report_count(), 0);
    }

    #[tokio::test]
    async fn employee_deletes_only_own_pending() {
        let (manager, _) = create_test_manager();
        let own_pending = submit(&manager, &lan(), 100_000.0).await;
        let own_approved = submit(&manager, &lan(), 200_000.0).await;
        manager.approve(&own_approved.id, &admin()).await.unwrap();
        let someone_elses = submit(&manager, &mai(), 300_000.0).await;

        manager.delete(&own_pending.id, &lan()).await.unwrap();

        let err = manager
            .delete(&own_approved.id, &lan())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));

        let err = manager
            .delete(&someone_elses.id, &lan())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Permission { .. }));
    }

    // ==================== Predicates ====================

    #[tokio::test]
    async fn edit_and_delete_rules_diverge_for_admins() {
        let (manager, _) = create_test_manager();
        let report = submit(&manager, &lan(), 100_000.0).await;
        let approved = manager.approve(&report.id, &admin()).await.unwrap();

        // Frozen for editing, still deletable
        assert!(!ReportManager::can_edit(&admin(), &approved));
        assert!(ReportManager::can_delete(&admin(), &approved));

        // Owner keeps neither right after review
        assert!(!ReportManager::can_edit(&lan(), &approved));
        assert!(!ReportManager::can_delete(&lan(), &approved));
    }
}
