//! # LoadState
//! Progress of fetching the authoritative membership list. Fetch failures never reach the caller as errors; they are recorded here for the UI to read.

use crate::FetchError;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "camelCase")]
pub struct LoadState {
    /// True from the moment a fetch starts until the newest fetch settles.
    pub loading: bool,

    pub last_fetch_started: Option<chrono::DateTime<chrono::Utc>>,
    pub last_fetch_finished: Option<chrono::DateTime<chrono::Utc>>,

    /// If last_fetch_error is Some, then the last fetch failed. Gets reset to None when the next fetch succeeds.
    pub last_fetch_error: Option<FetchError>,
}

impl LoadState {
    pub(crate) fn mark_fetch_started(&mut self) {
        self.loading = true;
        self.last_fetch_started = Some(chrono::Utc::now());
    }

    pub(crate) fn mark_fetch_finished(&mut self, error: Option<FetchError>) {
        self.loading = false;
        self.last_fetch_finished = Some(chrono::Utc::now());
        self.last_fetch_error = error;
    }
}
