//! Staging configuration via `mvccdb.toml`
//!
//! All settings are optional; an empty file yields the defaults.
//!
//! ```toml
//! # What to do when a written key has no Final Store entry at merge time:
//! # "skip" (default) = warn and leave the key out of the merge
//! # "conflict"       = treat the key as conflicting and abort the merge
//! missing_baseline = "skip"
//!
//! # Initial Final Store capacity (keys)
//! final_capacity = 1024
//!
//! # Expected number of concurrently staged transactions
//! expected_transactions = 64
//! ```

use mvccdb_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "mvccdb.toml";

/// Handling of a written key whose Final Store counterpart is absent at merge
///
/// Materialization of a write always creates a Final Store baseline, so this
/// only happens when a transaction's view was populated outside the normal
/// Put/Del path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingBaselinePolicy {
    /// Emit an advisory event; the key is neither validated nor installed
    #[default]
    Skip,
    /// Report the key as a conflict, aborting the merge
    Conflict,
}

/// Staging table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Missing-baseline handling during merge validation
    #[serde(default)]
    pub missing_baseline: MissingBaselinePolicy,
    /// Initial Final Store capacity
    #[serde(default = "default_final_capacity")]
    pub final_capacity: usize,
    /// Initial capacity of the transaction view registry
    #[serde(default = "default_expected_transactions")]
    pub expected_transactions: usize,
}

fn default_final_capacity() -> usize {
    1024
}

fn default_expected_transactions() -> usize {
    64
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            missing_baseline: MissingBaselinePolicy::default(),
            final_capacity: default_final_capacity(),
            expected_transactions: default_expected_transactions(),
        }
    }
}

impl StagingConfig {
    /// Builder-style override of the missing-baseline policy
    pub fn with_missing_baseline(mut self, policy: MissingBaselinePolicy) -> Self {
        self.missing_baseline = policy;
        self
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# mvccdb staging configuration
#
# What to do when a written key has no Final Store entry at merge time:
#   "skip"     = warn and leave the key out of the merge (default)
#   "conflict" = treat the key as conflicting and abort the merge
missing_baseline = "skip"

# Initial Final Store capacity (keys)
final_capacity = 1024

# Expected number of concurrently staged transactions
expected_transactions = 64
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the text is not valid configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("Failed to parse staging config: {}", e)))
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::InvalidConfig(msg) => {
                Error::InvalidConfig(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
