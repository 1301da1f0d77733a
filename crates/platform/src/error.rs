use std::error::Error as StdError;

/// Crate-wide result type for gateway operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed gateway errors shared across the collaborator contract.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A requested community is not visible to the session.
    #[error("unknown community: {community}")]
    UnknownCommunity { community: String },

    /// Operation is currently unavailable (not connected/ready).
    #[error("gateway operation unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from the platform client.
    #[error("gateway operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    SerdeJson(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn unknown_community(community: impl std::fmt::Display) -> Self {
        Self::UnknownCommunity {
            community: community.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }
}
