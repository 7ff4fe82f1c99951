mod api;
mod config;
mod utils;

use std::rc::Rc;
use std::sync::LazyLock;

use membership::MembershipStore;
use membership::data_model::{ListenerKey, LoadState};
use wasm_bindgen::prelude::*;

pub use api::HttpFollowApi;
pub use config::{ApiConfig, api_config};

/// The current user's followed players, kept in sync with the backend.
///
/// Follows and unfollows show up immediately. If the backend rejects one, it is undone and the returned promise rejects
/// with a message fit for a toast.
#[wasm_bindgen]
pub struct FollowedPlayers {
    // Rc so toggle promises can outlive the borrow of `self`
    store: Rc<MembershipStore<HttpFollowApi>>,
}

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
static LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    #[cfg(target_arch = "wasm32")]
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl FollowedPlayers {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(config: Option<ApiConfig>) -> FollowedPlayers {
        LazyLock::force(&LOGGER);

        let config = config.unwrap_or_else(api_config);
        log::info!("Using followed players API at {}", config.base_url);

        Self {
            store: Rc::new(MembershipStore::new(HttpFollowApi::new(config))),
        }
    }

    /// Loads the followed players from the backend, replacing what is shown. Failures end up in `error`.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn initialize(&self) {
        let is_initial_load = !self.store.loaded_at_least_once();
        let start_time = if is_initial_load { now_ms() } else { None };

        self.store.initialize().await;

        if is_initial_load
            && self.store.loaded_at_least_once()
            && let (Some(start), Some(end)) = (start_time, now_ms())
        {
            log::info!("Initial load of followed players took {}ms", end - start);
        }
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub async fn refresh(&self) {
        self.initialize().await
    }

    /// Follows or unfollows right away, then tells the backend.
    /// The promise resolves once the backend agrees, and rejects with the error message if it doesn't.
    #[cfg(target_arch = "wasm32")]
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn toggle_follow(&self, player_id: u32, follow: bool) -> js_sys::Promise {
        let token = self.store.apply_local(player_id, follow, None);
        let store = self.store.clone();

        wasm_bindgen_futures::future_to_promise(async move {
            store
                .confirm(token)
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_following(&self, player_id: u32) -> bool {
        self.store.is_member(&player_id)
    }

    /// True while a follow or unfollow for the player has not been answered.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn is_pending(&self, player_id: u32) -> bool {
        self.store.is_pending(&player_id)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn followed_ids(&self) -> Vec<u32> {
        self.store.members()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn count(&self) -> usize {
        self.store.len()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn loading(&self) -> bool {
        self.store.is_loading()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn error(&self) -> Option<String> {
        self.store.fetch_error().map(|e| e.message)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn loaded_at_least_once(&self) -> bool {
        self.store.loaded_at_least_once()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn get_load_state(&self) -> LoadState {
        self.store.load_state()
    }

    /// `callback` is called with no arguments whenever the followed players, `loading` or `error` change.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn subscribe(&self, callback: js_sys::Function) -> ListenerKey {
        self.store.subscribe(move |_| {
            let this = JsValue::null();
            if let Err(e) = callback.call0(&this) {
                log::error!("Followed players listener threw: {e:?}");
            }
        })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn unsubscribe(&self, key: ListenerKey) {
        self.store.unsubscribe(key)
    }

    /// Call when the page using this goes away. Answers that arrive later are ignored.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn teardown(&self) {
        self.store.teardown()
    }
}

impl FollowedPlayers {
    pub fn store(&self) -> &MembershipStore<HttpFollowApi> {
        &self.store
    }
}

fn now_ms() -> Option<f64> {
    #[cfg(target_arch = "wasm32")]
    {
        web_sys::window()
            .and_then(|w| w.performance())
            .map(|p| p.now())
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        None
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
