//! Live report feeds
//!
//! A feed is one view's push subscription: it holds the current result set
//! of a query and keeps it fresh as the store changes. Every view opens its
//! own feed, so closing one never disturbs another. Teardown is explicit
//! and idempotent; dropping the feed also stops its worker.

use std::sync::Arc;

use shared::error::AppResult;
use shared::models::Report;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::store::{ReportQuery, ReportStore, StoreEvent};

/// A live, self-updating result set for one query
pub struct ReportFeed {
    rx: watch::Receiver<Vec<Report>>,
    cancel: CancellationToken,
}

impl ReportFeed {
    /// Open a feed under a parent shutdown token.
    ///
    /// The initial result set is queried before this returns, so
    /// [`ReportFeed::current`] is immediately meaningful. The worker
    /// subscribes to store events before that first query; an event racing
    /// the query only causes one redundant refresh.
    pub async fn open(
        store: Arc<dyn ReportStore>,
        query: ReportQuery,
        shutdown: &CancellationToken,
    ) -> AppResult<Self> {
        let events = store.events();
        let initial = store.query(&query).await?;
        let (tx, rx) = watch::channel(initial.clone());
        let cancel = shutdown.child_token();

        let worker = FeedWorker {
            store,
            query,
            current: initial,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run(events));

        Ok(Self { rx, cancel })
    }

    /// The latest result set.
    pub fn current(&self) -> Vec<Report> {
        self.rx.borrow().clone()
    }

    /// Follow result-set changes.
    pub fn watch(&self) -> watch::Receiver<Vec<Report>> {
        self.rx.clone()
    }

    /// Stop the feed. Safe to call more than once.
    pub fn close(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReportFeed {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct FeedWorker {
    store: Arc<dyn ReportStore>,
    query: ReportQuery,
    current: Vec<Report>,
    tx: watch::Sender<Vec<Report>>,
    cancel: CancellationToken,
}

impl FeedWorker {
    async fn run(mut self, mut events: broadcast::Receiver<StoreEvent>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Report feed closed");
                    return;
                }
                event = events.recv() => match event {
                    Ok(event) => {
                        if self.needs_refresh(&event) {
                            self.refresh().await;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Report feed lagged behind store events, refreshing");
                        self.refresh().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }

    /// An event matters when the new state matches the query or the feed
    /// currently shows the touched record (it may have stopped matching).
    fn needs_refresh(&self, event: &StoreEvent) -> bool {
        let shown = |id: &str| self.current.iter().any(|r| r.id == id);
        match event {
            StoreEvent::Created(report) | StoreEvent::Updated(report) => {
                self.query.matches(report) || shown(&report.id)
            }
            StoreEvent::Deleted(id) => shown(id),
            StoreEvent::BulkUpdated(batch) => batch
                .iter()
                .any(|report| self.query.matches(report) || shown(&report.id)),
            StoreEvent::BulkDeleted(ids) => ids.iter().any(|id| shown(id)),
            StoreEvent::RatesChanged(_) | StoreEvent::RatesCleared => false,
        }
    }

    async fn refresh(&mut self) {
        match self.store.query(&self.query).await {
            Ok(reports) => {
                self.current = reports.clone();
                // Receivers may all be gone; the cancel token will follow
                let _ = self.tx.send(reports);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Report feed refresh failed, keeping last result set");
            }
        }
    }
}

/// Live count of reports awaiting review, for the admin badge
pub struct PendingCounter {
    feed: ReportFeed,
    rx: watch::Receiver<usize>,
}

impl PendingCounter {
    pub async fn open(
        store: Arc<dyn ReportStore>,
        shutdown: &CancellationToken,
    ) -> AppResult<Self> {
        let feed = ReportFeed::open(store, ReportQuery::pending(), shutdown).await?;
        let (tx, rx) = watch::channel(feed.current().len());

        let mut feed_rx = feed.watch();
        let cancel = feed.cancel.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = feed_rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                        let count = feed_rx.borrow().len();
                        if tx.send(count).is_err() {
                            return;
                        }
                    }
                }
            }
        });

        Ok(Self { feed, rx })
    }

    pub fn count(&self) -> usize {
        *self.rx.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<usize> {
        self.rx.clone()
    }

    /// Stop the counter. Safe to call more than once.
    pub fn close(&self) {
        self.feed.close();
    }
}
