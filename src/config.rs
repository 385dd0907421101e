//! Configuration management

use anyhow::Result;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Canvass API origin, e.g. `http://localhost:3001`
    pub api_url: String,

    /// Bearer credential for the API. Injected into the client rather than
    /// read from ambient storage by the pipeline itself; optional so local
    /// development backends without auth keep working.
    pub api_token: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let api_url = std::env::var("CANVASS_API_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());

        let api_token = std::env::var("CANVASS_API_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());

        if api_token.is_none() {
            tracing::warn!("CANVASS_API_TOKEN not set — requests will be unauthenticated");
        }

        Ok(Self { api_url, api_token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_api_url_uses_env_when_set() {
        std::env::set_var("CANVASS_API_URL", "https://api.canvass.example");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "https://api.canvass.example");

        // Cleanup
        std::env::remove_var("CANVASS_API_URL");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_api_url_defaults_to_localhost() {
        std::env::remove_var("CANVASS_API_URL");

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "http://localhost:3001");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_blank_token_is_none() {
        std::env::set_var("CANVASS_API_TOKEN", "   ");

        let config = Config::from_env().unwrap();
        assert!(config.api_token.is_none());

        std::env::remove_var("CANVASS_API_TOKEN");
    }
}
