#[path = "1-membership-set.rs"]
mod membership_set;

#[path = "2-undo-token.rs"]
mod undo_token;

#[path = "3-pending-intents.rs"]
mod pending_intents;

#[path = "4-dirty-tracker.rs"]
mod dirty_tracker;

#[path = "5-load-state.rs"]
mod load_state;

pub use dirty_tracker::*;
pub use load_state::*;
pub use membership_set::*;
pub use pending_intents::*;
pub use undo_token::*;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);
