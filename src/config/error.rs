//! Configuration loading errors.

use crate::dispatch::domain::DeliveryDomainError;
use crate::reference::domain::ReferenceDomainError;
use thiserror::Error;

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading or validating configuration documents.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file or directory could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path relative to the configuration directory.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A document is not valid TOML or does not match the expected shape.
    #[error("invalid {document} document: {source}")]
    Parse {
        /// Which document failed, for example `settings`.
        document: &'static str,
        /// Parser diagnostic.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// A setting is outside its accepted range.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted setting name.
        field: &'static str,
        /// What is wrong with the value.
        reason: String,
    },

    /// Route, carrier, or surcharge data failed validation.
    #[error(transparent)]
    Reference(#[from] ReferenceDomainError),

    /// A fleet identifier failed validation.
    #[error(transparent)]
    Identifier(#[from] DeliveryDomainError),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(document: &'static str, source: toml::de::Error) -> Self {
        Self::Parse {
            document,
            source: Box::new(source),
        }
    }
}
