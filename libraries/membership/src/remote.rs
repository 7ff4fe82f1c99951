use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::RemoteError;

/// The source of truth for a membership relation, e.g. the backend's "followed players" endpoints.
///
/// Writes should be idempotent on the server side: following an already followed id succeeds.
// The store is driven from a single-threaded event loop, so the returned futures need not be `Send`.
#[allow(async_fn_in_trait)]
pub trait MembershipRemote {
    type Id: Eq + Hash + Ord + Clone + Debug + Display + 'static;

    /// The full authoritative membership list for the active user.
    async fn fetch_membership(&self) -> Result<Vec<Self::Id>, RemoteError>;

    async fn add_membership(&self, id: &Self::Id) -> Result<(), RemoteError>;

    async fn remove_membership(&self, id: &Self::Id) -> Result<(), RemoteError>;
}
