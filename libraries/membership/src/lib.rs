//! This is a library for keeping a local set of ids in sync with a server, optimistically.
//! It was created for the followed players list of the FPL companion app, so it doesn't include much that was not needed for that.
//!
//! Syncing strategy:
//! 1. On startup (and whenever the UI asks for a refresh) the full membership list is fetched and replaces the local set.
//! 2. When the user toggles an id, the local set changes immediately, so the UI never waits on the network.
//! 3. The matching write (add or remove) is then sent to the server.
//! 4. If the write fails, the id is put back and the error goes to the caller. Nothing is retried automatically.
//!
//! Sounds simple, but there are a few tricky parts that this library handles:
//! rollbacks that only touch their own id, overlapping toggles of the same id, fetches that settle out of order,
//! responses that arrive after the UI has gone away, and listeners that read the store while being notified.

pub mod data_model;
mod error;
mod remote;
mod store;

#[cfg(test)]
mod test_remote;

pub use error::{FetchError, MUTATION_FALLBACK_MESSAGE, MutationError, RemoteError};
pub use remote::MembershipRemote;
pub use store::{MembershipStore, Settlement};
