//! Client configuration.

/// Environment variable holding the API origin.
pub const BASE_URL_ENV: &str = "KANTHALLOOR_API_URL";

/// Origin used when [`BASE_URL_ENV`] is unset.
pub const DEFAULT_BASE_URL: &str = "https://e-kanthalloor.onrender.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
