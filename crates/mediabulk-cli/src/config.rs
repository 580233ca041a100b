//! API connection settings, resolved from the environment.
//!
//! `dotenvy` has already loaded `.env` by the time this runs, so values can
//! come from either the process environment or that file.

use anyhow::{Context, Result};

/// Environment variable holding the media-management API base URL.
pub const API_URL_VAR: &str = "MEDIA_API_URL";
/// Optional basic-auth credentials.
pub const API_KEY_VAR: &str = "MEDIA_API_KEY";
pub const API_SECRET_VAR: &str = "MEDIA_API_SECRET";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
}

impl ApiConfig {
    /// Resolve the configuration or fail before any processing starts.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_VAR).with_context(|| {
            format!(
                "API config is not initialized; set the {API_URL_VAR} environment variable (explicitly or via a .env file)"
            )
        })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var(API_KEY_VAR).ok(),
            api_secret: std::env::var(API_SECRET_VAR).ok(),
        })
    }

    /// Endpoint URL under the configured base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
