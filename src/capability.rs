//! Optional collaborator handles
//!
//! Whether a collaborator exists is decided once, at construction. Callers
//! branch on the variant instead of null-checking throughout.

use crate::{Error, Result};

/// A collaborator that is either configured or known to be missing
#[derive(Debug, Clone)]
pub enum Capability<T> {
    Available(T),
    Unavailable { reason: String },
}

impl<T> Capability<T> {
    /// Mark a feature unavailable with a user-facing reason
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Turn a constructor result into a capability, logging why it failed
    pub fn from_result(feature: &str, result: Result<T>) -> Self {
        match result {
            Ok(client) => Self::Available(client),
            Err(e) => {
                tracing::warn!(feature, error = %e, "feature disabled");
                Self::unavailable(e.to_string())
            }
        }
    }

    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    #[must_use]
    pub const fn as_option(&self) -> Option<&T> {
        match self {
            Self::Available(client) => Some(client),
            Self::Unavailable { .. } => None,
        }
    }

    /// Borrow the client, or a configuration error carrying the reason
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the collaborator is unavailable
    pub fn get(&self) -> Result<&T> {
        match self {
            Self::Available(client) => Ok(client),
            Self::Unavailable { reason } => Err(Error::Config(reason.clone())),
        }
    }

    /// Why the collaborator is missing, if it is
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}
