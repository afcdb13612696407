use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the path editor API.
#[derive(Clone, Debug, PartialEq)]
pub struct BridgeConfig {
    /// Base URL every route is resolved against.
    pub api_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Canvas size sent when applying a template.
    pub canvas_size: (f64, f64),
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            canvas_size: (1200.0, 800.0),
        }
    }
}

impl BridgeConfig {
    /// Reads `PATH_EDITOR_API_URL` and `PATH_EDITOR_API_TIMEOUT_MS`, falling back to
    /// the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("PATH_EDITOR_API_URL")
            && !url.trim().is_empty()
        {
            config.api_url = url;
        }
        if let Ok(raw) = std::env::var("PATH_EDITOR_API_TIMEOUT_MS") {
            match raw.parse::<u64>() {
                Ok(ms) => config.timeout = Duration::from_millis(ms),
                Err(e) => tracing::warn!(
                    value = %raw,
                    error = %e,
                    "Ignoring invalid PATH_EDITOR_API_TIMEOUT_MS"
                ),
            }
        }
        config
    }
}
