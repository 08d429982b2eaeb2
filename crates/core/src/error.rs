//! Error types shared across the workspace.

use thiserror::Error;

/// Configuration is present but violates an invariant.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration at `{key}`: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        key: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
