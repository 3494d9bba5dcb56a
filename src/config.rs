//! Runtime configuration resolved from command-line flags and environment

use std::path::PathBuf;

use crate::cli::Cli;
use crate::data::client::DEFAULT_BASE_URL;

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "INFOBUS_API_URL";

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "INFOBUS_DATA_DIR";

/// Settings needed to construct the application services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the Infobus API
    pub api_url: String,
    /// Directory for settings and cached lists; `None` uses the platform default
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            data_dir: None,
        }
    }
}

impl Config {
    /// Builds the configuration from parsed CLI arguments
    ///
    /// clap has already applied the environment fallbacks for both values.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.clone(),
            data_dir: cli.data_dir.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_points_at_public_api() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://infobus.kz/api");
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_from_cli_uses_flags() {
        let cli = Cli::parse_from([
            "infobus",
            "--api-url",
            "http://localhost:8080/api",
            "--data-dir",
            "/tmp/infobus-test",
            "selection",
        ]);

        let config = Config::from_cli(&cli);

        assert_eq!(config.api_url, "http://localhost:8080/api");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/infobus-test")));
    }
}
