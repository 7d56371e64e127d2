//! Portal client configuration.
//!
//! Two layers:
//!
//! - [`ClientConfig`]: what the HTTP client needs (API base URL, bearer
//!   token, timeout). Built from the environment, from a fetched
//!   [`AppConfig`], or for local development.
//! - Startup assets served next to the portal: `appConfig.json`
//!   (identity-provider parameters and the API gateway URL) and
//!   `customizations.json` (branding overrides). In
//!   [`Environment::Development`] neither is fetched.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;
use zeroize::Zeroizing;

/// Base URL of a locally running stub backend.
pub const DEVELOPMENT_API_URL: &str = "http://127.0.0.1:8095";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Deployment flavour of the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

/// Configuration for connecting to the portal REST backend.
///
/// Custom `Debug` implementation redacts the `api_token` field.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: Url,
    /// Bearer token for the initial session.
    pub api_token: Zeroizing<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_token", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(api_url: &str, token: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_url("api_url", api_url)?,
            api_token: Zeroizing::new(token.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// - `PYRO_API_URL` (default: [`DEVELOPMENT_API_URL`])
    /// - `PYRO_API_TOKEN` (required)
    /// - `PYRO_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = std::env::var("PYRO_API_TOKEN").map_err(|_| ConfigError::MissingToken)?;
        let raw = std::env::var("PYRO_API_URL").unwrap_or_else(|_| DEVELOPMENT_API_URL.to_string());
        Ok(Self {
            api_url: parse_url("PYRO_API_URL", &raw)?,
            api_token: Zeroizing::new(token),
            timeout_secs: std::env::var("PYRO_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Local stub backend, short timeout.
    pub fn development(token: &str) -> Result<Self, ConfigError> {
        let mut config = Self::new(DEVELOPMENT_API_URL, token)?;
        config.timeout_secs = 5;
        Ok(config)
    }

    /// Point at the API gateway named in a fetched `appConfig.json`.
    pub fn from_app_config(app: &AppConfig, token: &str) -> Result<Self, ConfigError> {
        Self::new(&app.api_gateway_url, token)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

/// `appConfig.json`: identity-provider parameters and the API base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppConfig {
    pub region: String,
    pub user_pool_id: String,
    pub user_pool_client_id: String,
    #[serde(default)]
    pub identity_pool_id: Option<String>,
    pub api_gateway_url: String,
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Asset {
            asset: path.display().to_string(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Asset {
            asset: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

/// `customizations.json`: optional branding and locale overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Customizations {
    pub title: Option<String>,
    pub locale: Option<String>,
    pub primary_color: Option<String>,
    pub logo: Option<String>,
}

impl Customizations {
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("Fireworks Permit Portal")
    }

    pub fn locale_or_default(&self) -> &str {
        self.locale.as_deref().unwrap_or("en-US")
    }
}

/// Everything fetched before the portal starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartupConfig {
    /// `None` in development.
    pub app: Option<AppConfig>,
    pub customizations: Customizations,
}

/// Fetch `appConfig.json` and `customizations.json` from `origin`.
///
/// Development skips both. A missing `customizations.json` (404) means no
/// overrides; a missing `appConfig.json` is an error.
pub async fn load_startup_config(
    environment: Environment,
    origin: &Url,
) -> Result<StartupConfig, ConfigError> {
    if environment == Environment::Development {
        tracing::debug!("development mode, skipping startup assets");
        return Ok(StartupConfig::default());
    }
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
        .build()
        .map_err(|e| ConfigError::Asset {
            asset: "http client".into(),
            reason: e.to_string(),
        })?;

    let app: AppConfig = fetch_asset(&http, origin, "appConfig.json")
        .await?
        .ok_or_else(|| ConfigError::Asset {
            asset: "appConfig.json".into(),
            reason: "not found".into(),
        })?;
    let customizations = fetch_asset(&http, origin, "customizations.json")
        .await?
        .unwrap_or_default();

    tracing::info!(region = %app.region, api = %app.api_gateway_url, "startup configuration loaded");
    Ok(StartupConfig {
        app: Some(app),
        customizations,
    })
}

async fn fetch_asset<T: serde::de::DeserializeOwned>(
    http: &reqwest::Client,
    origin: &Url,
    name: &str,
) -> Result<Option<T>, ConfigError> {
    let asset_err = |reason: String| ConfigError::Asset {
        asset: name.to_string(),
        reason,
    };
    let url = origin.join(name).map_err(|e| asset_err(e.to_string()))?;
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| asset_err(e.to_string()))?;
    if resp.status() == reqwest::StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !resp.status().is_success() {
        return Err(asset_err(format!("HTTP {}", resp.status())));
    }
    resp.json().await.map(Some).map_err(|e| asset_err(e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PYRO_API_TOKEN environment variable is required")]
    MissingToken,
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("failed to load {asset}: {reason}")]
    Asset { asset: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_points_at_local_stub() {
        let cfg = ClientConfig::development("dev-token").unwrap();
        assert_eq!(cfg.api_url.as_str(), "http://127.0.0.1:8095/");
        assert_eq!(cfg.timeout_secs, 5);
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = ClientConfig::development("super-secret").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn invalid_url_rejected() {
        assert!(matches!(
            ClientConfig::new("not a url", "t"),
            Err(ConfigError::InvalidUrl(..))
        ));
    }

    #[test]
    fn app_config_parses_pascal_case() {
        let app: AppConfig = serde_json::from_str(
            r#"{"Region":"us-east-1","UserPoolId":"us-east-1_abc","UserPoolClientId":"client",
                "IdentityPoolId":"us-east-1:pool","ApiGatewayUrl":"https://api.example.gov/prod/"}"#,
        )
        .unwrap();
        assert_eq!(app.region, "us-east-1");
        let cfg = ClientConfig::from_app_config(&app, "t").unwrap();
        assert_eq!(cfg.api_url.as_str(), "https://api.example.gov/prod/");
    }

    #[test]
    fn customizations_all_optional() {
        let c: Customizations = serde_json::from_str(r#"{"Title":"Delaware Fireworks"}"#).unwrap();
        assert_eq!(c.title_or_default(), "Delaware Fireworks");
        assert_eq!(c.locale_or_default(), "en-US");
    }

    #[tokio::test]
    async fn development_skips_startup_assets() {
        // Port 1 is closed; a fetch would fail.
        let origin = Url::parse("http://127.0.0.1:1/").unwrap();
        let startup = load_startup_config(Environment::Development, &origin).await.unwrap();
        assert_eq!(startup, StartupConfig::default());
    }
}
