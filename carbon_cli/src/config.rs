//! Layered configuration for the `carbon` binary, loaded with figment.
//!
//! Sources, lowest to highest priority:
//! 1. Built-in defaults
//! 2. User-level `<config_dir>/carbon/config.toml`
//! 3. Project-level `carbon.toml` in the working directory
//! 4. Environment variables with the `CARBON_` prefix (`CARBON_LEDGER_PATH`, ...)
//!
//! Command-line flags override all of these.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use carbon_core::scope::DEFAULT_SCOPE;

const LOCAL_CONFIG_FILE: &str = "carbon.toml";
const FALLBACK_LEDGER_FILE: &str = "carbon-ledger.json";
const DEFAULT_USER: &str = "local";

fn default_ledger_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("carbon").join("ledger.json"))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_LEDGER_FILE))
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

fn default_scope() -> String {
    DEFAULT_SCOPE.to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarbonConfig {
    /// Ledger file results are recorded in.
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    /// User id rows are stored under when `--user` is not given.
    #[serde(default = "default_user")]
    pub default_user: String,

    /// Scope used by `calculate` when `--scope` is not given.
    #[serde(default = "default_scope")]
    pub default_scope: String,
}

impl Default for CarbonConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            default_user: default_user(),
            default_scope: default_scope(),
        }
    }
}

impl CarbonConfig {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Build the provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CARBON_"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("carbon").join("config.toml"))
    }
}
