use membership::{MembershipRemote, RemoteError};
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;

use crate::config::ApiConfig;

#[derive(Debug, Deserialize)]
struct FollowedPlayer {
    id: u32,
}

/// Error bodies look like `{"detail": "limit reached"}`. Validation errors put structured JSON in `detail`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// The backend's followed players endpoints.
pub struct HttpFollowApi {
    client: reqwest::Client,
    config: ApiConfig,
}

impl HttpFollowApi {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.client.request(method, self.config.endpoint(path));
        match &self.config.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RemoteError> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Request(format!("{e:?}")))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| error_detail(&body));
        Err(RemoteError::Status { status, detail })
    }

    async fn post_player(&self, id: u32, action: &str) -> Result<(), RemoteError> {
        let request = self.request(Method::POST, &format!("players/{id}/{action}"));
        self.send(request)
            .await
            .map(|_| ())
            .inspect_err(|e| log::error!("Error sending {action} for player {id}: {e}"))
    }
}

impl MembershipRemote for HttpFollowApi {
    type Id = u32;

    async fn fetch_membership(&self) -> Result<Vec<u32>, RemoteError> {
        let response = self
            .send(self.request(Method::GET, "players/followed"))
            .await?;
        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Request(format!("{e:?}")))?;
        parse_followed(&body)
    }

    async fn add_membership(&self, id: &u32) -> Result<(), RemoteError> {
        self.post_player(*id, "follow").await
    }

    async fn remove_membership(&self, id: &u32) -> Result<(), RemoteError> {
        self.post_player(*id, "unfollow").await
    }
}

fn parse_followed(body: &str) -> Result<Vec<u32>, RemoteError> {
    serde_json::from_str::<Vec<FollowedPlayer>>(body)
        .map(|players| players.into_iter().map(|player| player.id).collect())
        .map_err(|e| RemoteError::Decode(format!("{e:?}")))
}

fn error_detail(body: &str) -> Option<String> {
    let body: ErrorBody = serde_json::from_str(body).ok()?;
    match body.detail? {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_followed_ignores_extra_fields() {
        let ids = parse_followed(r#"[{"id":3,"web_name":"Salah"},{"id":8}]"#).unwrap();
        assert_eq!(ids, vec![3, 8]);
        assert_eq!(parse_followed("[]").unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn test_parse_followed_rejects_garbage() {
        let error = parse_followed(r#"{"players":[]}"#).unwrap_err();
        assert!(matches!(error, RemoteError::Decode(_)));
    }

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(r#"{"detail":"limit reached"}"#).as_deref(),
            Some("limit reached")
        );
        assert_eq!(
            error_detail(r#"{"detail":[{"msg":"bad id"}]}"#).as_deref(),
            Some(r#"[{"msg":"bad id"}]"#)
        );
        assert_eq!(error_detail(r#"{"detail":null}"#), None);
        assert_eq!(error_detail(r#"{"error":"nope"}"#), None);
        assert_eq!(error_detail("<html>Bad Gateway</html>"), None);
    }
}
