//! Command-line interface parsing for the Infobus client
//!
//! This module handles parsing of CLI arguments using clap. Global flags select
//! the API endpoint and data directory; subcommands map onto the cache,
//! selection and live-data operations.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use thiserror::Error;

use crate::config::{API_URL_ENV, DATA_DIR_ENV};
use crate::data::client::DEFAULT_BASE_URL;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The argument is not a recognized on/off value
    #[error("Invalid switch value: '{0}'. Valid values: on, off")]
    InvalidSwitch(String),
}

/// Infobus - track city buses from the terminal
#[derive(Parser, Debug)]
#[command(name = "infobus")]
#[command(about = "Infobus transit tracker: routes, stops, live buses and arrivals")]
#[command(version)]
pub struct Cli {
    /// Base URL of the Infobus API
    #[arg(long, global = true, env = API_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    /// Directory for settings and cached data
    #[arg(long, global = true, env = DATA_DIR_ENV, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List countries served by Infobus
    Regions,
    /// List cities of a country (defaults to the selected one)
    Cities {
        #[arg(long, value_name = "ID")]
        region: Option<i64>,
    },
    /// Remember a country
    SelectRegion { region_id: i64 },
    /// Remember a city; clears cached routes and stops when it changes
    SelectCity { city_id: i64 },
    /// Show details of the selected city
    City,
    /// List routes of the selected city
    Routes {
        /// Ignore cached data and fetch again
        #[arg(long)]
        refresh: bool,
    },
    /// List stops of the selected city
    Stations {
        /// Ignore cached data and fetch again
        #[arg(long)]
        refresh: bool,
    },
    /// List the stops of a route in order
    RouteStops {
        route_id: i64,
        /// Show the reverse direction
        #[arg(long)]
        reverse: bool,
    },
    /// Track or untrack a route (up to five at a time)
    Toggle { route_id: i64 },
    /// Show tracked routes, their colors and recent route numbers
    Selection,
    /// Untrack every route
    ClearSelection,
    /// Show the map overlays for tracked routes
    Map,
    /// Show live buses on a route, or on every tracked route
    Buses {
        route_id: Option<i64>,
        /// Keep polling every SECONDS until interrupted
        #[arg(long, value_name = "SECONDS")]
        watch: Option<u64>,
    },
    /// Show routes serving a stop and upcoming arrivals
    Arrivals { station_id: i64 },
    /// Show only buses adapted for reduced mobility
    Accessible {
        #[arg(value_parser = parse_switch, action = ArgAction::Set)]
        enabled: bool,
    },
    /// Print the installation code used in support requests
    AppCode,
}

/// Parses an on/off style argument.
///
/// # Returns
/// * `Ok(bool)` for on/off, yes/no, true/false, 1/0 (case-insensitive)
/// * `Err(CliError::InvalidSwitch)` otherwise
pub fn parse_switch(s: &str) -> Result<bool, CliError> {
    match s.to_ascii_lowercase().as_str() {
        "on" | "yes" | "true" | "1" => Ok(true),
        "off" | "no" | "false" | "0" => Ok(false),
        _ => Err(CliError::InvalidSwitch(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_switch_on_aliases() {
        assert!(parse_switch("on").unwrap());
        assert!(parse_switch("ON").unwrap());
        assert!(parse_switch("yes").unwrap());
        assert!(parse_switch("1").unwrap());
    }

    #[test]
    fn test_parse_switch_off_aliases() {
        assert!(!parse_switch("off").unwrap());
        assert!(!parse_switch("no").unwrap());
        assert!(!parse_switch("false").unwrap());
    }

    #[test]
    fn test_parse_switch_invalid() {
        let err = parse_switch("maybe").unwrap_err();
        assert!(err.to_string().contains("Invalid switch value"));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_cli_parse_simple_command() {
        let cli = Cli::parse_from(["infobus", "regions"]);
        assert_eq!(cli.command, Command::Regions);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_cli_parse_toggle() {
        let cli = Cli::parse_from(["infobus", "toggle", "42"]);
        assert_eq!(cli.command, Command::Toggle { route_id: 42 });
    }

    #[test]
    fn test_cli_parse_buses_watch() {
        let cli = Cli::parse_from(["infobus", "buses", "5", "--watch", "15"]);
        assert_eq!(
            cli.command,
            Command::Buses {
                route_id: Some(5),
                watch: Some(15)
            }
        );
    }

    #[test]
    fn test_cli_parse_buses_all_tracked() {
        let cli = Cli::parse_from(["infobus", "buses"]);
        assert_eq!(
            cli.command,
            Command::Buses {
                route_id: None,
                watch: None
            }
        );
    }

    #[test]
    fn test_cli_parse_accessible_switch() {
        let cli = Cli::parse_from(["infobus", "accessible", "on"]);
        assert_eq!(cli.command, Command::Accessible { enabled: true });
    }

    #[test]
    fn test_cli_rejects_invalid_switch() {
        let result = Cli::try_parse_from(["infobus", "accessible", "maybe"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["infobus", "routes", "--refresh", "-vv", "--data-dir", "/tmp/x"]);
        assert_eq!(cli.command, Command::Routes { refresh: true });
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["infobus"]).is_err());
    }
}
