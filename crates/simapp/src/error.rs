//! App errors

use lockup_hooks::HookError;
use lockup_keeper::{ErrorKind, LockupError};
use lockup_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Ante handler rejected transaction: {0}")]
    Ante(LockupError),

    #[error("Message {index} failed: {source}")]
    Message {
        index: usize,
        #[source]
        source: LockupError,
    },

    #[error("Execution failed: {0}")]
    Execution(#[from] LockupError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<HookError> for AppError {
    fn from(e: HookError) -> Self {
        AppError::Ante(LockupError::from(e.into_risk()))
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Ante(e) | AppError::Message { source: e, .. } | AppError::Execution(e) => {
                e.kind()
            }
            AppError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
