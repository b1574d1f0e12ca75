use thiserror::Error;

/// Identity Gate failures.
///
/// Every variant renders the same "Authentication Required" view; the split
/// only exists so logs can tell a missing header from a rejected token.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("user token header '{0}' is missing or empty")]
    MissingToken(String),

    #[error("user token rejected: {0}")]
    InvalidToken(String),

    #[error("identity provider unavailable: {0}")]
    Upstream(String),

    #[error("identity provider returned a malformed response: {0}")]
    Malformed(String),
}

/// Errors from platform lookups made after identity is established.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("platform request failed: {0}")]
    Upstream(String),

    #[error("platform returned a malformed response: {0}")]
    Malformed(String),
}

impl PlatformError {
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "user",
            id: id.into(),
        }
    }

    pub fn experience_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "experience",
            id: id.into(),
        }
    }
}

/// Rejected form transitions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("form is not ready to submit: {0}")]
    NotReady(String),

    #[error("a submission is already in progress")]
    AlreadyLoading,

    #[error("no submission is in progress")]
    NotLoading,

    #[error("{0} is not one of the preset clip counts")]
    UnknownPreset(u32),
}

/// Any failure inside the gate pipeline.
///
/// The pipeline never surfaces this to the viewer; it is folded into
/// [`crate::GateOutcome::AuthenticationRequired`] and kept for logging.
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}
