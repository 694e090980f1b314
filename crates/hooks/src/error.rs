//! Hook errors

use lockup_risk::{CollaboratorError, RiskError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HookError {
    #[error("Rejected by {hook}: {source}")]
    Rejected {
        hook: String,
        #[source]
        source: RiskError,
    },

    #[error("Invariant check failed: {0}")]
    Risk(#[from] RiskError),
}

impl HookError {
    pub fn rejected(hook: impl Into<String>, source: RiskError) -> Self {
        HookError::Rejected {
            hook: hook.into(),
            source,
        }
    }

    /// The underlying invariant error
    pub fn risk(&self) -> &RiskError {
        match self {
            HookError::Rejected { source, .. } => source,
            HookError::Risk(e) => e,
        }
    }

    pub fn into_risk(self) -> RiskError {
        match self {
            HookError::Rejected { source, .. } => source,
            HookError::Risk(e) => e,
        }
    }
}

impl From<CollaboratorError> for HookError {
    fn from(e: CollaboratorError) -> Self {
        HookError::Risk(RiskError::from(e))
    }
}

pub type HookResult<T> = Result<T, HookError>;
