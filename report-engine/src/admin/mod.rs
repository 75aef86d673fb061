//! Privileged administration
//!
//! Role reassignment, account removal, full backup and full wipe. Every
//! operation verifies the actor's admin role before touching anything.
//! Bulk deletions run in capped batches so one storage round-trip never
//! carries more than [`PURGE_BATCH_SIZE`] documents.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use shared::models::{CommissionRates, Identity, Report, Role, UserRecord};

use crate::access::require_admin;
use crate::store::{ReportQuery, ReportStore, UserDirectory};
use crate::utils::time::now_millis;

/// Documents deleted per storage round-trip during cascades and wipes
pub const PURGE_BATCH_SIZE: usize = 100;

/// Full engine snapshot produced by a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    /// When the export ran, Unix millis
    pub exported_at: i64,
    pub users: Vec<UserRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates: Option<CommissionRates>,
    pub reports: Vec<Report>,
}

/// What a full wipe removed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WipeOutcome {
    pub reports_removed: usize,
    pub users_removed: usize,
}

pub struct AdminService {
    store: Arc<dyn ReportStore>,
    directory: Arc<dyn UserDirectory>,
    purge_batch_size: usize,
}

impl AdminService {
    pub fn new(store: Arc<dyn ReportStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self::with_batch_size(store, directory, PURGE_BATCH_SIZE)
    }

    pub fn with_batch_size(
        store: Arc<dyn ReportStore>,
        directory: Arc<dyn UserDirectory>,
        purge_batch_size: usize,
    ) -> Self {
        Self {
            store,
            directory,
            purge_batch_size: purge_batch_size.max(1),
        }
    }

    /// Reassign a user's role.
    pub async fn set_role(&self, actor: &Identity, target_id: &str, role: Role) -> AppResult<()> {
        require_admin(actor)?;
        self.directory.set_role(target_id, role).await?;
        tracing::info!(actor = %actor.id, target = %target_id, role = ?role, "Role reassigned");
        Ok(())
    }

    /// Remove an account and every report it owns.
    ///
    /// Admins cannot delete themselves. Reports where the target was only
    /// the partner stay with their owner. Returns how many reports the
    /// cascade removed.
    pub async fn delete_account(&self, actor: &Identity, target_id: &str) -> AppResult<usize> {
        require_admin(actor)?;
        if actor.id == target_id {
            return Err(AppError::validation("cannot delete your own account"));
        }
        if self.directory.find(target_id).await?.is_none() {
            return Err(AppError::not_found("user"));
        }

        let owned: Vec<String> = self
            .store
            .query(&ReportQuery::for_participant(target_id))
            .await?
            .into_iter()
            .filter(|report| report.is_owned_by(target_id))
            .map(|report| report.id)
            .collect();

        let mut removed = 0;
        for chunk in owned.chunks(self.purge_batch_size) {
            removed += self.store.delete_many(chunk).await?;
        }
        self.directory.remove(target_id).await?;

        tracing::info!(
            actor = %actor.id,
            target = %target_id,
            reports_removed = removed,
            "Account deleted"
        );
        Ok(removed)
    }

    /// Snapshot every user record, the rate configuration and every report.
    pub async fn export_backup(&self, actor: &Identity) -> AppResult<BackupDocument> {
        require_admin(actor)?;
        let users = self.directory.list().await?;
        let rates = self.store.load_rates().await?;
        let reports = self.store.query(&ReportQuery::all().oldest_first()).await?;
        Ok(BackupDocument {
            exported_at: now_millis(),
            users,
            rates,
            reports,
        })
    }

    /// Serialize a backup to `path`.
    ///
    /// Written to a temp name and renamed, so a crash mid-write never
    /// leaves a truncated backup behind.
    pub async fn export_backup_to(
        &self,
        actor: &Identity,
        path: &Path,
    ) -> AppResult<BackupDocument> {
        let backup = self.export_backup(actor).await?;
        let json = serde_json::to_vec_pretty(&backup)
            .map_err(|e| AppError::collaborator(format!("failed to serialize backup: {e}")))?;

        let tmp_path = path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &json)
            .await
            .map_err(|e| AppError::collaborator(format!("failed to write backup file: {e}")))?;
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::collaborator(format!(
                "failed to finalize backup file: {e}"
            )));
        }

        tracing::info!(
            actor = %actor.id,
            path = %path.display(),
            users = backup.users.len(),
            reports = backup.reports.len(),
            "Backup exported"
        );
        Ok(backup)
    }

    /// Remove every report, every user record, then the rate configuration.
    pub async fn wipe_all(&self, actor: &Identity) -> AppResult<WipeOutcome> {
        require_admin(actor)?;

        let report_ids: Vec<String> = self
            .store
            .query(&ReportQuery::all())
            .await?
            .into_iter()
            .map(|report| report.id)
            .collect();
        let mut reports_removed = 0;
        for chunk in report_ids.chunks(self.purge_batch_size) {
            reports_removed += self.store.delete_many(chunk).await?;
        }

        let users = self.directory.list().await?;
        let mut users_removed = 0;
        for user in &users {
            self.directory.remove(&user.id).await?;
            users_removed += 1;
        }

        self.store.clear_rates().await?;

        tracing::warn!(
            actor = %actor.id,
            reports_removed,
            users_removed,
            "All engine data wiped"
        );
        Ok(WipeOutcome {
            reports_removed,
            users_removed,
        })
    }
}
