//! # tgapp-session
//!
//! Session resolution for the Mini-App: [`SessionResolver`] converts the host identity into a
//! terminal [`tgapp_core::Session`] with a fixed linear backoff, and [`SessionManager`] holds the
//! resolved session, handling re-login, registration, logout and teardown.

pub mod error;
pub mod manager;
pub mod resolver;
pub mod retry;
pub mod scheduler;

pub use error::{ManagerError, Result};
pub use manager::{SessionManager, SessionState};
pub use resolver::{Resolution, SessionResolver};
pub use retry::{RetryPolicy, BASE_BACKOFF_MS, MAX_ATTEMPTS};
pub use scheduler::{Liveness, Scheduler, TokioScheduler};
