use tgapp_core::{CoreError, ServiceError};
use thiserror::Error;

/// Errors from explicit session actions (registration). Resolution itself never errors;
/// its failures are carried in [`tgapp_core::Session::Failed`].
#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Registration is only possible while the session needs registration")]
    NotAwaitingRegistration,

    #[error("Host identity unavailable")]
    HostUnavailable,

    #[error("Host exposes no user id")]
    IdentityMissing,

    #[error("Invalid registration form: {0}")]
    InvalidForm(#[from] CoreError),

    #[error("Account service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Session changed while the request was in flight")]
    Superseded,

    #[error("Session manager has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, ManagerError>;
