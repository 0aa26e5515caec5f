//! Gateway configuration, loaded from environment variables at startup.

use std::time::Duration;

use anyhow::{Context, bail};
use hugchat_client::{Credentials, SessionOptions};

/// Used when `GATEWAY_REQUEST_TIMEOUT_SECS` is unset, unparsable or zero.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Runtime configuration for hugchat-gateway.
///
/// Secrets have no defaults; everything else works out-of-the-box.
#[derive(Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:5000"`).
    pub bind_address: String,

    /// Bearer token clients must present on `/v1` routes.
    pub api_key: Option<String>,

    /// HuggingChat account email.
    pub hugchat_email: Option<String>,

    /// HuggingChat account password.
    pub hugchat_password: Option<String>,

    /// Backend model to answer with; the first catalog entry when unset.
    pub hugchat_model: Option<String>,

    /// Hugging Face origin (default: `"https://huggingface.co"`).
    pub hugchat_base_url: String,

    /// Upper bound on a synchronous ask, on opening a stream and on the gap
    /// between two streamed fragments.
    pub request_timeout: Duration,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated CORS origins; wildcard when unset.
    pub cors_allowed_origins: Option<String>,

    /// Serve Swagger UI at `/swagger-ui`.
    pub enable_swagger: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("hugchat_email", &self.hugchat_email)
            .field("hugchat_password", &self.hugchat_password.as_ref().map(|_| "[REDACTED]"))
            .field("hugchat_model", &self.hugchat_model)
            .field("hugchat_base_url", &self.hugchat_base_url)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .field("log_json", &self.log_json)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("enable_swagger", &self.enable_swagger)
            .finish()
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build [`Config`] from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            bind_address: non_empty("GATEWAY_BIND").unwrap_or_else(|| "0.0.0.0:5000".to_owned()),
            api_key: non_empty("GATEWAY_API_KEY"),
            hugchat_email: non_empty("HUGCHAT_EMAIL"),
            hugchat_password: non_empty("HUGCHAT_PASSWORD"),
            hugchat_model: non_empty("HUGCHAT_MODEL"),
            hugchat_base_url: non_empty("HUGCHAT_BASE_URL")
                .unwrap_or_else(|| "https://huggingface.co".to_owned()),
            request_timeout: Duration::from_secs(
                Some(parse_or(lookup("GATEWAY_REQUEST_TIMEOUT_SECS"), DEFAULT_TIMEOUT_SECS))
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            log_level: non_empty("GATEWAY_LOG").unwrap_or_else(|| "info".to_owned()),
            log_json: lookup("GATEWAY_LOG_JSON").is_some_and(|v| is_truthy(&v)),
            cors_allowed_origins: non_empty("GATEWAY_CORS_ORIGINS"),
            enable_swagger: lookup("GATEWAY_ENABLE_SWAGGER").is_none_or(|v| is_truthy(&v)),
        }
    }

    /// The bearer secret; the gateway refuses to start without one.
    pub fn api_key(&self) -> anyhow::Result<&str> {
        self.api_key
            .as_deref()
            .context("GATEWAY_API_KEY must be set to a non-empty value")
    }

    /// HuggingChat account credentials.
    pub fn credentials(&self) -> anyhow::Result<Credentials> {
        match (&self.hugchat_email, &self.hugchat_password) {
            (Some(email), Some(password)) => Ok(Credentials::new(email, password)),
            (None, _) => bail!("HUGCHAT_EMAIL must be set"),
            (_, None) => bail!("HUGCHAT_PASSWORD must be set"),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            base_url: self.hugchat_base_url.clone(),
            model: self.hugchat_model.clone(),
            ..SessionOptions::default()
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn is_truthy(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
