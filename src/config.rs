//! Settings for the port owner resolver.
//!
//! Handles locating and loading the TOML settings file. A missing file means
//! defaults; the file is never written by this tool.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::{IdentityEntry, IdentityMap, LookupChain, SystemAccounts};
use crate::resolver::PortResolver;
use crate::table::{ParseOptions, TableSources};

/// Environment variable that overrides the settings file location.
pub const CONFIG_PATH_ENV: &str = "POWNER_CONFIG_PATH";

/// Top-level settings file contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where the connection tables are read from.
    #[serde(default)]
    pub tables: TableSources,

    /// Row matching and port decoding options.
    #[serde(default)]
    pub parsing: ParseOptions,

    #[serde(default)]
    pub lookup: LookupSettings,

    /// Static identities keyed by owner credential (e.g. `"10045"`).
    #[serde(default)]
    pub identities: BTreeMap<String, IdentityEntry>,
}

/// Which identity services are consulted, after the static identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Fall back to the system account database (credential read as a uid).
    #[serde(default = "default_system_accounts")]
    pub system_accounts: bool,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            system_accounts: default_system_accounts(),
        }
    }
}

fn default_system_accounts() -> bool {
    true
}

impl Settings {
    /// Builds the identity chain: static identities first, then system accounts.
    pub fn identity_lookup(&self) -> Result<LookupChain, ConfigError> {
        let mut chain = LookupChain::new();

        let map = IdentityMap::from_table(&self.identities)?;
        if !map.is_empty() {
            chain.push(map);
        }
        if self.lookup.system_accounts {
            chain.push(SystemAccounts);
        }

        Ok(chain)
    }

    /// Builds a resolver wired to these settings.
    pub fn resolver(&self) -> Result<PortResolver<LookupChain>, ConfigError> {
        Ok(PortResolver::new(self.identity_lookup()?)
            .with_sources(self.tables.clone())
            .with_options(self.parsing))
    }
}

/// Returns the path to the settings file.
///
/// Respects the `POWNER_CONFIG_PATH` environment variable if set,
/// otherwise uses the system config directory.
pub fn settings_path() -> Result<PathBuf, ConfigError> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
    Ok(config_dir.join("port-owner").join("config.toml"))
}

/// Loads the settings, falling back to defaults if the file doesn't exist.
pub fn load_settings() -> Result<Settings, ConfigError> {
    load_settings_from(&settings_path()?)
}

/// Loads settings from an explicit path.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        debug!("no settings file at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let read_failed = |source: std::io::Error| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(read_failed)?;
    // Shared lock; released when `file` drops.
    FileExt::lock_shared(&file).map_err(read_failed)?;

    let mut content = String::new();
    file.read_to_string(&mut content).map_err(read_failed)?;

    let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
        path: path.to_path_buf(),
        source,
    })?;

    // Identity keys must be numeric credentials.
    IdentityMap::from_table(&settings.identities)?;

    debug!("loaded settings from {}", path.display());
    Ok(settings)
}
