//! In-memory store implementation
//!
//! Backs the engine in tests and embedded single-process deployments. All
//! writes go through one lock per collection, so a batch is atomic by
//! construction and observers always see it as a single event.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::models::{CommissionRates, Report, Role, UserRecord};
use tokio::sync::broadcast;

use super::{ReportQuery, ReportStore, StoreError, StoreEvent, StoreResult, UserDirectory};

/// Default event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// In-memory report store and user directory
pub struct MemoryStore {
    reports: RwLock<HashMap<String, Report>>,
    users: RwLock<HashMap<String, UserRecord>>,
    rates: RwLock<Option<CommissionRates>>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_event_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self {
            reports: RwLock::new(HashMap::new()),
            users: RwLock::new(HashMap::new()),
            rates: RwLock::new(None),
            event_tx,
        }
    }

    fn emit(&self, event: StoreEvent) {
        // Nobody listening is fine
        let _ = self.event_tx.send(event);
    }

    pub fn report_count(&self) -> usize {
        self.reports.read().len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("reports", &self.reports.read().len())
            .field("users", &self.users.read().len())
            .finish()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn insert(&self, mut report: Report) -> StoreResult<String> {
        if report.id.is_empty() {
            report.id = uuid::Uuid::new_v4().to_string();
        }
        let id = report.id.clone();
        self.reports.write().insert(id.clone(), report.clone());
        self.emit(StoreEvent::Created(report));
        Ok(id)
    }

    async fn get(&self, id: &str) -> StoreResult<Option<Report>> {
        Ok(self.reports.read().get(id).cloned())
    }

    async fn update(&self, report: &Report) -> StoreResult<()> {
        let mut reports = self.reports.write();
        if !reports.contains_key(&report.id) {
            return Err(StoreError::ReportNotFound(report.id.clone()));
        }
        reports.insert(report.id.clone(), report.clone());
        drop(reports);
        self.emit(StoreEvent::Updated(report.clone()));
        Ok(())
    }

    async fn delete(&self, id: &str) -> StoreResult<()> {
        let removed = self.reports.write().remove(id).is_some();
        if removed {
            self.emit(StoreEvent::Deleted(id.to_owned()));
        }
        Ok(())
    }

    async fn apply_batch(&self, batch: &[Report]) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut reports = self.reports.write();
        // Validate every target before touching anything
        for report in batch {
            if !reports.contains_key(&report.id) {
                return Err(StoreError::ReportNotFound(report.id.clone()));
            }
        }
        for report in batch {
            reports.insert(report.id.clone(), report.clone());
        }
        drop(reports);
        self.emit(StoreEvent::BulkUpdated(batch.to_vec()));
        Ok(())
    }

    async fn delete_many(&self, ids: &[String]) -> StoreResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut reports = self.reports.write();
        let mut removed = Vec::new();
        for id in ids {
            if reports.remove(id).is_some() {
                removed.push(id.clone());
            }
        }
        drop(reports);
        let count = removed.len();
        if count > 0 {
            self.emit(StoreEvent::BulkDeleted(removed));
        }
        Ok(count)
    }

    async fn query(&self, query: &ReportQuery) -> StoreResult<Vec<Report>> {
        let mut matched: Vec<Report> = self
            .reports
            .read()
            .values()
            .filter(|report| query.matches(report))
            .cloned()
            .collect();
        query.sort(&mut matched);
        Ok(matched)
    }

    fn events(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    async fn load_rates(&self) -> StoreResult<Option<CommissionRates>> {
        Ok(*self.rates.read())
    }

    async fn save_rates(&self, rates: &CommissionRates) -> StoreResult<()> {
        *self.rates.write() = Some(*rates);
        self.emit(StoreEvent::RatesChanged(*rates));
        Ok(())
    }

    async fn clear_rates(&self) -> StoreResult<()> {
        let was_set = self.rates.write().take().is_some();
        if was_set {
            self.emit(StoreEvent::RatesCleared);
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn list(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }

    async fn find(&self, id: &str) -> StoreResult<Option<UserRecord>> {
        Ok(self.users.read().get(id).cloned())
    }

    async fn upsert(&self, user: &UserRecord) -> StoreResult<()> {
        self.users.write().insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn set_role(&self, id: &str, role: Role) -> StoreResult<()> {
        let mut users = self.users.write();
        match users.get_mut(id) {
            Some(user) => {
                user.role = role;
                Ok(())
            }
            None => Err(StoreError::UserNotFound(id.to_owned())),
        }
    }

    async fn remove(&self, id: &str) -> StoreResult<()> {
        self.users.write().remove(id);
        Ok(())
    }
}
