#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

const LOCAL_API_URL: &str = "http://localhost:8000";

#[derive(Clone, Debug, PartialEq, Eq, tsify::Tsify, serde::Serialize, serde::Deserialize)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ApiConfig {
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
pub fn api_config() -> ApiConfig {
    ApiConfig {
        base_url: default_base_url(),
        access_token: None,
    }
}

/// `local-backend` wins, then `FPL_API_URL` at build time, then `/api` on the page's own origin.
fn default_base_url() -> String {
    if cfg!(feature = "local-backend") {
        return LOCAL_API_URL.to_string();
    }
    if let Some(url) = option_env!("FPL_API_URL") {
        return url.to_string();
    }
    #[cfg(target_arch = "wasm32")]
    {
        if let Some(origin) = web_sys::window().and_then(|w| w.location().origin().ok()) {
            return format!("{origin}/api");
        }
    }
    LOCAL_API_URL.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_with_one_slash() {
        let config = ApiConfig {
            base_url: "http://localhost:8000/".to_string(),
            access_token: None,
        };
        assert_eq!(
            config.endpoint("/players/followed"),
            "http://localhost:8000/players/followed"
        );
        assert_eq!(
            config.endpoint("players/7/follow"),
            "http://localhost:8000/players/7/follow"
        );
    }

    #[test]
    fn test_config_reads_camel_case() {
        let config: ApiConfig =
            serde_json::from_str(r#"{"baseUrl":"https://example.test","accessToken":"abc"}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://example.test");
        assert_eq!(config.access_token.as_deref(), Some("abc"));

        let config: ApiConfig = serde_json::from_str(r#"{"baseUrl":"/api"}"#).unwrap();
        assert_eq!(config.access_token, None);
    }

    #[test]
    fn test_default_config_has_no_token() {
        let config = api_config();
        assert!(!config.base_url.is_empty());
        assert_eq!(config.access_token, None);
    }
}
