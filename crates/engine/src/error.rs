use {headcount_platform::Capability, thiserror::Error};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Gateway(#[from] headcount_platform::Error),

    #[error(transparent)]
    Store(#[from] headcount_store::Error),

    /// Caller lacks a required capability. Surfaced to the requester
    /// directly; never retried.
    #[error("missing required capability: {}", .capability.label())]
    PermissionDenied { capability: Capability },
}

impl Error {
    #[must_use]
    pub fn permission_denied(capability: Capability) -> Self {
        Self::PermissionDenied { capability }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
