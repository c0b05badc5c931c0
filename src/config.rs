//! Application configuration loaded from CLI, environment, and files.
//!
//! Configuration merges command-line arguments, environment variables, and
//! configuration files through ortho-config's layered approach.
//!
//! # Precedence
//!
//! Values are loaded with the following precedence (lowest to highest):
//!
//! 1. **Defaults** – Built-in application defaults
//! 2. **Configuration file** – `.gatehouse.toml` in the current directory,
//!    home directory, or XDG config directory
//! 3. **Environment variables** – `GATEHOUSE_API_BASE_URL`,
//!    `GATEHOUSE_USERNAME`, `GATEHOUSE_PASSWORD`, …
//! 4. **Command-line arguments** – `--api-base-url`, `--username`, …
//!
//! # Configuration File
//!
//! ```toml
//! api_base_url = "https://api.example.com"
//! state_dir = ".gatehouse"
//! poll_interval_seconds = 10
//! review_limit = 50
//! ```

use std::time::Duration;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::nav::RoutePath;
use crate::polling::{DEFAULT_POLL_INTERVAL, DEFAULT_REVIEW_LIMIT};

/// Default state directory when none is configured.
const DEFAULT_STATE_DIR: &str = ".gatehouse";

/// Application configuration supporting CLI, environment, and file sources.
///
/// # Environment Variables
///
/// - `GATEHOUSE_API_BASE_URL` or `--api-base-url`: review service base URL
/// - `GATEHOUSE_USERNAME` / `GATEHOUSE_PASSWORD` or `--username`/`--password`
/// - `GATEHOUSE_STATE_DIR` or `--state-dir`: session state directory
/// - `GATEHOUSE_POLL_INTERVAL_SECONDS`, `GATEHOUSE_REVIEW_LIMIT`
#[derive(Debug, Clone, Default, Deserialize, Serialize, OrthoConfig)]
#[serde(default)]
#[ortho_config(
    prefix = "GATEHOUSE",
    discovery(
        dotfile_name = ".gatehouse.toml",
        config_file_name = "gatehouse.toml",
        app_name = "gatehouse"
    )
)]
pub struct GatehouseConfig {
    /// Base URL of the review service API.
    #[ortho_config(cli_short = 'b')]
    pub api_base_url: Option<String>,

    /// Login username for password-based authentication.
    #[ortho_config(cli_short = 'u')]
    pub username: Option<String>,

    /// Login password for password-based authentication.
    #[ortho_config(cli_short = 'p')]
    pub password: Option<String>,

    /// Directory holding the persisted session entries.
    pub state_dir: Option<Utf8PathBuf>,

    /// Polling cadence in seconds for background refresh tasks.
    pub poll_interval_seconds: Option<u64>,

    /// Route to gate and land on after authentication.
    #[ortho_config(cli_short = 'r')]
    pub route: Option<String>,

    /// Listing bound per polling tick.
    pub review_limit: Option<u32>,

    /// Emit telemetry events to stderr as JSON lines.
    pub telemetry: Option<bool>,
}

impl GatehouseConfig {
    /// Returns the API base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingApiBaseUrl`] when no value is configured.
    pub fn require_api_base_url(&self) -> Result<&str, ApiError> {
        self.api_base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::MissingApiBaseUrl)
    }

    /// Returns the configured login credentials, when both are present.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                Some((username, password))
            }
            _ => None,
        }
    }

    /// Returns the session state directory, defaulting to `.gatehouse`.
    #[must_use]
    pub fn resolve_state_dir(&self) -> Utf8PathBuf {
        self.state_dir
            .clone()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_STATE_DIR))
    }

    /// Returns the polling cadence.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval_seconds
            .filter(|seconds| *seconds > 0)
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_secs)
    }

    /// Returns the listing bound per polling tick.
    #[must_use]
    pub fn resolve_review_limit(&self) -> u32 {
        self.review_limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_REVIEW_LIMIT)
    }

    /// Returns the route to gate, defaulting to the dashboard.
    #[must_use]
    pub fn resolve_route(&self) -> RoutePath {
        let route = self
            .route
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(crate::nav::DEFAULT_LANDING_ROUTE);
        RoutePath::new(route)
    }

    /// Whether stderr telemetry is enabled.
    #[must_use]
    pub fn telemetry_enabled(&self) -> bool {
        self.telemetry.unwrap_or(false)
    }
}
