use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::admin::AdminService;
use crate::core::Config;
use crate::rates::RateProvider;
use crate::reports::feed::{PendingCounter, ReportFeed};
use crate::reports::ReportManager;
use crate::stats::StatsService;
use crate::store::{MemoryStore, ReportQuery, ReportStore, UserDirectory};
use shared::error::AppResult;

/// Engine state - shared handle to every service
///
/// One `EngineState` is built at startup and cloned wherever a service is
/// needed; clones share the underlying `Arc`s. It owns the root
/// cancellation token, so [`EngineState::shutdown`] tears down the rate
/// provider and every feed opened through this state.
///
/// | Accessor | Service |
/// |----------|---------|
/// | `reports()` | Report lifecycle (create/edit/review/delete) |
/// | `stats()` | Dashboard aggregation |
/// | `admin()` | Role changes, account removal, backup, wipe |
/// | `rates()` | Live commission rates |
#[derive(Clone)]
pub struct EngineState {
    pub config: Config,
    store: Arc<dyn ReportStore>,
    directory: Arc<dyn UserDirectory>,
    reports: Arc<ReportManager>,
    stats: Arc<StatsService>,
    admin: Arc<AdminService>,
    rates: Arc<RateProvider>,
    shutdown: CancellationToken,
}

impl EngineState {
    /// Wire every service over the given store and user directory.
    pub fn new(
        config: Config,
        store: Arc<dyn ReportStore>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        let shutdown = CancellationToken::new();
        let reports = Arc::new(ReportManager::new(store.clone()));
        let stats = Arc::new(StatsService::new(store.clone(), config.timezone));
        let admin = Arc::new(AdminService::with_batch_size(
            store.clone(),
            directory.clone(),
            config.purge_batch_size,
        ));
        let rates = Arc::new(RateProvider::spawn(
            store.clone(),
            config.fallback_rates,
            &shutdown,
        ));

        tracing::info!(
            timezone = %config.timezone,
            purge_batch_size = config.purge_batch_size,
            "Engine state initialized"
        );

        Self {
            config,
            store,
            directory,
            reports,
            stats,
            admin,
            rates,
            shutdown,
        }
    }

    /// Wire everything over the in-memory store. Used by tests and
    /// embedders that persist elsewhere.
    pub fn in_memory(config: Config) -> Self {
        let store = Arc::new(MemoryStore::with_event_capacity(
            config.event_channel_capacity,
        ));
        Self::new(config, store.clone(), store)
    }

    pub fn reports(&self) -> &ReportManager {
        &self.reports
    }

    pub fn stats(&self) -> &StatsService {
        &self.stats
    }

    pub fn admin(&self) -> &AdminService {
        &self.admin
    }

    pub fn rates(&self) -> &RateProvider {
        &self.rates
    }

    pub fn store(&self) -> Arc<dyn ReportStore> {
        self.store.clone()
    }

    pub fn directory(&self) -> Arc<dyn UserDirectory> {
        self.directory.clone()
    }

    /// Open a live feed tied to this state's lifetime.
    pub async fn open_feed(&self, query: ReportQuery) -> AppResult<ReportFeed> {
        ReportFeed::open(self.store.clone(), query, &self.shutdown).await
    }

    /// Open the pending-review counter tied to this state's lifetime.
    pub async fn open_pending_counter(&self) -> AppResult<PendingCounter> {
        PendingCounter::open(self.store.clone(), &self.shutdown).await
    }

    /// Stop every background worker started through this state. Safe to
    /// call more than once.
    pub fn shutdown(&self) {
        tracing::info!("Engine shutting down");
        self.shutdown.cancel();
    }

    /// Token that trips when [`EngineState::shutdown`] runs.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
