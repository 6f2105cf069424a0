//! Configuration file support.
//!
//! Looks for `tablepivot.toml` in the working directory, then
//! `<config dir>/tablepivot/config.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/warehouse"
//! dialect = "postgres"
//!
//! [pivot]
//! row_cap = 500
//! ```
//!
//! Command-line flags override anything set here.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dialect::Dialect;
use crate::error::{PivotError, PivotResult};
use crate::model::RowCap;

pub const CONFIG_FILE: &str = "tablepivot.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PivotConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub pivot: PivotSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub dialect: Option<Dialect>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PivotSection {
    pub row_cap: Option<RowCap>,
}

impl PivotConfig {
    /// Load the first config file found, or defaults when there is none.
    pub fn load() -> PivotResult<Self> {
        match Self::locate() {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> PivotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PivotError::Config(format!("{}: {}", path.display(), e)))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(input: &str) -> PivotResult<Self> {
        toml::from_str(input).map_err(|e| PivotError::Config(e.to_string()))
    }

    fn locate() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }
        dirs::config_dir()
            .map(|dir| dir.join("tablepivot").join("config.toml"))
            .filter(|path| path.exists())
    }

    pub fn row_cap(&self) -> RowCap {
        self.pivot.row_cap.unwrap_or_default()
    }

    /// Explicit dialect, else the one implied by the database URL, else the default.
    pub fn dialect(&self) -> Dialect {
        self.database
            .dialect
            .or_else(|| self.database.url.as_deref().and_then(Dialect::from_url))
            .unwrap_or_default()
    }
}
