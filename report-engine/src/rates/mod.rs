//! Commission rate distribution
//!
//! Rates live in the store's settings record but every consumer reads them
//! through a watch channel. Subscribers always get the best-known value
//! synchronously: the compiled-in fallback first, the saved record once
//! loaded, then every later change. A store failure keeps the last value
//! and only raises the `degraded` flag, so revenue math never stalls on a
//! broken backend.

use std::sync::Arc;

use shared::models::CommissionRates;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::store::{ReportStore, StoreEvent};

/// Best-known commission rates plus the health of that knowledge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateState {
    pub rates: CommissionRates,
    /// True when the last settings load failed and `rates` may be stale
    pub degraded: bool,
}

/// Watch-channel publisher for commission rates
pub struct RateProvider {
    rx: watch::Receiver<RateState>,
    fallback: CommissionRates,
    cancel: CancellationToken,
}

impl RateProvider {
    /// Start publishing under a parent shutdown token.
    ///
    /// The channel starts at `fallback` and is revised once the saved
    /// record loads. The worker subscribes to store events before that
    /// first load so a concurrent save is never missed.
    pub fn spawn(
        store: Arc<dyn ReportStore>,
        fallback: CommissionRates,
        shutdown: &CancellationToken,
    ) -> Self {
        let (tx, rx) = watch::channel(RateState {
            rates: fallback,
            degraded: false,
        });
        let cancel = shutdown.child_token();

        let worker = RateWorker {
            store,
            fallback,
            tx,
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            rx,
            fallback,
            cancel,
        }
    }

    /// The best-known state right now.
    pub fn current(&self) -> RateState {
        *self.rx.borrow()
    }

    /// The rates to split revenue with right now.
    pub fn rates(&self) -> CommissionRates {
        self.rx.borrow().rates
    }

    /// The compiled-in rates used until a saved record loads.
    pub fn fallback(&self) -> CommissionRates {
        self.fallback
    }

    /// Follow rate changes.
    pub fn watch(&self) -> watch::Receiver<RateState> {
        self.rx.clone()
    }

    /// Stop publishing and release the store subscription. Safe to call
    /// more than once.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RateProvider {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct RateWorker {
    store: Arc<dyn ReportStore>,
    fallback: CommissionRates,
    tx: watch::Sender<RateState>,
    cancel: CancellationToken,
}

impl RateWorker {
    async fn run(self) {
        let mut events = self.store.events();
        self.load().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!("Rate provider stopped");
                    return;
                }
                event = events.recv() => match event {
                    Ok(StoreEvent::RatesChanged(rates)) => {
                        tracing::info!(
                            default_rate = rates.default_revenue_percentage,
                            overtime_rate = rates.overtime_percentage,
                            "Commission rates updated"
                        );
                        self.publish(rates, false);
                    }
                    Ok(StoreEvent::RatesCleared) => {
                        tracing::info!("Commission rates cleared, using fallback");
                        self.publish(self.fallback, false);
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Rate provider lagged behind store events, reloading");
                        self.load().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => return,
                },
            }
        }
    }

    async fn load(&self) {
        match self.store.load_rates().await {
            Ok(Some(rates)) => self.publish(rates, false),
            Ok(None) => self.publish(self.fallback, false),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load commission rates, keeping last value");
                let last = self.tx.borrow().rates;
                self.publish(last, true);
            }
        }
    }

    fn publish(&self, rates: CommissionRates, degraded: bool) {
        let _ = self.tx.send(RateState { rates, degraded });
    }
}
