use thiserror::Error;

use crate::data_model::UndoToken;

/// Shown when a write fails and the server gave no detail.
pub const MUTATION_FALLBACK_MESSAGE: &str = "Failed to update membership";

/// A failed call to the remote side of the relation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The request never produced a response (offline, CORS, timeout...).
    #[error("Request error: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("HTTP error: {status}")]
    Status { status: u16, detail: Option<String> },

    /// The server answered, but the body could not be understood.
    #[error("Response parsing error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// A rejection carrying a structured message from the server.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        RemoteError::Status {
            status,
            detail: Some(detail.into()),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            RemoteError::Status { detail, .. } => detail.as_deref(),
            RemoteError::Request(_) | RemoteError::Decode(_) => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Request(_) | RemoteError::Decode(_) => None,
        }
    }
}

/// The membership list could not be loaded.
#[derive(Error, Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(target_arch = "wasm32", derive(tsify::Tsify))]
#[cfg_attr(target_arch = "wasm32", tsify(into_wasm_abi, from_wasm_abi))]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
    pub status: Option<u16>,
}

impl From<RemoteError> for FetchError {
    fn from(error: RemoteError) -> Self {
        let message = match error.detail() {
            Some(detail) => detail.to_string(),
            None => format!("Failed to load membership: {error}"),
        };
        FetchError {
            message,
            status: error.status(),
        }
    }
}

/// A toggle's remote write failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MutationError {
    /// The id the write was for, as text.
    pub id: String,
    pub desired: bool,
    /// The server's detail if it sent one, otherwise [`MUTATION_FALLBACK_MESSAGE`].
    pub message: String,
    /// Whether this failure moved the id back to its earlier value.
    /// False when a newer toggle for the same id had already taken over, or the store was torn down.
    pub rolled_back: bool,
    #[source]
    pub source: RemoteError,
}

impl MutationError {
    pub(crate) fn new<Id: std::fmt::Display>(
        token: &UndoToken<Id>,
        source: RemoteError,
        rolled_back: bool,
    ) -> Self {
        let message = source
            .detail()
            .map(str::to_owned)
            .unwrap_or_else(|| MUTATION_FALLBACK_MESSAGE.to_string());
        MutationError {
            id: token.id().to_string(),
            desired: token.desired(),
            message,
            rolled_back,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_prefers_server_detail() {
        let error = FetchError::from(RemoteError::rejected(503, "maintenance"));
        assert_eq!(error.to_string(), "maintenance");
        assert_eq!(error.status, Some(503));

        let error = FetchError::from(RemoteError::Request("offline".to_string()));
        assert_eq!(
            error.to_string(),
            "Failed to load membership: Request error: offline"
        );
        assert_eq!(error.status, None);
    }

    #[test]
    fn test_mutation_error_formats_id_as_text() {
        let token = UndoToken {
            id: "salah".to_string(),
            desired: true,
            previous: false,
            sequence: 1,
        };
        let error = MutationError::new(&token, RemoteError::rejected(400, "limit reached"), true);
        assert_eq!(error.id, "salah");
        assert_eq!(error.to_string(), "limit reached");
    }

    #[test]
    fn test_status_without_detail() {
        let error = RemoteError::Status {
            status: 500,
            detail: None,
        };
        assert_eq!(error.detail(), None);
        assert_eq!(error.to_string(), "HTTP error: 500");
    }
}
