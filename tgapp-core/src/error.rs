use thiserror::Error;

/// Why a resolution pass did not produce an authenticated session.
///
/// Only the terminal reason of a pass ever reaches the caller, carried inside
/// [`crate::Session::Failed`]; intermediate reasons are absorbed by the retry loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("host unavailable")]
    HostUnavailable,

    #[error("no identity")]
    IdentityMissing,

    /// The account service does not know this identity; the caller should offer registration.
    #[error("account not found")]
    AccountNotFound,

    #[error("transient lookup failure: {0}")]
    TransientLookupFailure(String),

    #[error("all attempts exhausted")]
    AllAttemptsExhausted {
        attempts: u32,
        /// Failure reported by the final lookup.
        last: Box<SessionError>,
    },
}

impl SessionError {
    /// True when the pass ended because every lookup said "not registered".
    pub fn is_unregistered(&self) -> bool {
        match self {
            SessionError::AccountNotFound => true,
            SessionError::AllAttemptsExhausted { last, .. } => last.is_unregistered(),
            _ => false,
        }
    }
}

/// Errors returned by an [`crate::AccountService`] implementation.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("account not registered (HTTP {status})")]
    NotRegistered { status: u16 },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Maps a service failure onto the resolver taxonomy: 401/404 mean "not registered",
    /// everything else is transient.
    pub fn classify(&self) -> SessionError {
        match self {
            ServiceError::NotRegistered { .. } => SessionError::AccountNotFound,
            other => SessionError::TransientLookupFailure(other.to_string()),
        }
    }

    /// Builds the error for a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 404 => ServiceError::NotRegistered { status },
            _ => ServiceError::Http { status, body },
        }
    }
}

/// Errors raised while decoding host or backend data into core types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, ServiceError>;
