//! Lockup configuration
//!
//! Every policy number the handlers and queries use lives here so a chain
//! can tune it without recompiling.

use crate::error::LockupError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockupConfig {
    // === Lock window ===
    /// Earliest unlock date for a new lock, in months from the block day
    #[serde(default = "default_min_lock_months")]
    pub min_lock_months: u32,

    /// Latest unlock date for a new or extended lock, in months
    #[serde(default = "default_max_lock_months")]
    pub max_lock_months: u32,

    // === Scans ===
    /// Page size when summing an address's delegations
    #[serde(default = "default_delegation_page_size")]
    pub delegation_page_size: usize,

    // === Queries ===
    #[serde(default = "default_page_limit")]
    pub default_page_limit: u64,

    #[serde(default = "default_max_page_limit")]
    pub max_page_limit: u64,
}

fn default_min_lock_months() -> u32 {
    6
}

fn default_max_lock_months() -> u32 {
    24
}

fn default_delegation_page_size() -> usize {
    100
}

fn default_page_limit() -> u64 {
    100
}

fn default_max_page_limit() -> u64 {
    1000
}

impl Default for LockupConfig {
    fn default() -> Self {
        Self {
            min_lock_months: default_min_lock_months(),
            max_lock_months: default_max_lock_months(),
            delegation_page_size: default_delegation_page_size(),
            default_page_limit: default_page_limit(),
            max_page_limit: default_max_page_limit(),
        }
    }
}

impl LockupConfig {
    /// Load configuration from JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn validate(&self) -> Result<(), LockupError> {
        if self.min_lock_months > self.max_lock_months {
            return Err(LockupError::Config(format!(
                "min_lock_months ({}) exceeds max_lock_months ({})",
                self.min_lock_months, self.max_lock_months
            )));
        }
        if self.max_lock_months == 0 {
            return Err(LockupError::Config("max_lock_months must be positive".to_string()));
        }
        if self.delegation_page_size == 0 {
            return Err(LockupError::Config(
                "delegation_page_size must be positive".to_string(),
            ));
        }
        if self.default_page_limit == 0 || self.default_page_limit > self.max_page_limit {
            return Err(LockupError::Config(format!(
                "default_page_limit ({}) must be in 1..={}",
                self.default_page_limit, self.max_page_limit
            )));
        }
        Ok(())
    }

    /// Clamp a requested page size to the configured bounds
    pub fn page_limit(&self, requested: u64) -> u64 {
        if requested == 0 {
            self.default_page_limit
        } else {
            requested.min(self.max_page_limit)
        }
    }
}
