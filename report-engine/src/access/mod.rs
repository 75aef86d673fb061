//! Role gate and visibility scopes
//!
//! Identity comes from an embedder-provided [`IdentityProvider`]; this
//! module maps roles onto what a caller may see and gates the admin-only
//! operations. Admins see the whole shop, employees the reports crediting
//! them, including partner credit.

use async_trait::async_trait;
use shared::error::{AppError, AppResult};
use shared::models::Identity;
use tokio::sync::watch;

use crate::store::ReportQuery;

/// Identity source for engine operations
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The currently signed-in identity, if any.
    async fn current(&self) -> AppResult<Option<Identity>>;

    /// Follow sign-in / sign-out changes.
    fn watch(&self) -> watch::Receiver<Option<Identity>>;
}

/// What one viewer may see
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportScope {
    /// Every report in the shop
    All,
    /// Only reports crediting one participant
    Mine(String),
}

/// Admins see the whole shop; employees their own work.
pub fn scope_for(viewer: &Identity) -> ReportScope {
    if viewer.is_admin() {
        ReportScope::All
    } else {
        ReportScope::Mine(viewer.id.clone())
    }
}

/// Query covering everything the viewer may see, newest first.
pub fn visible_query(viewer: &Identity) -> ReportQuery {
    match scope_for(viewer) {
        ReportScope::All => ReportQuery::all(),
        ReportScope::Mine(user_id) => ReportQuery::for_participant(user_id),
    }
}

/// Reject callers without the admin role.
pub fn require_admin(viewer: &Identity) -> AppResult<()> {
    if viewer.is_admin() {
        Ok(())
    } else {
        Err(AppError::permission("this operation requires the admin role"))
    }
}

/// Watch-channel identity provider for embedded use and tests.
///
/// The embedder pushes sign-in / sign-out transitions; everything inside
/// the engine observes them through [`IdentityProvider::watch`].
pub struct SessionIdentity {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionIdentity {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, identity: Identity) {
        let _ = self.tx.send(Some(identity));
    }

    pub fn sign_out(&self) {
        let _ = self.tx.send(None);
    }
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn current(&self) -> AppResult<Option<Identity>> {
        Ok(self.tx.borrow().clone())
    }

    fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}
