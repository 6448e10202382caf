//! # tgapp-core
//!
//! Core types and traits for the Mini-App session layer: [`IdentityClaim`], [`Account`],
//! [`Session`], the [`SessionError`] taxonomy, the [`IdentityProvider`] / [`AccountService`]
//! seams, and tracing initialization. Transport-agnostic; used by tgapp-session and tgapp-api.

pub mod claim;
pub mod error;
pub mod logger;
pub mod provider;
pub mod types;

pub use claim::{init_data_from_launch, user_id_from_init_data, IdentityClaim, LAUNCH_DATA_PARAM};
pub use error::{CoreError, Result, ServiceError, SessionError};
pub use logger::{init_tracing, mask_payload};
pub use provider::{AccountService, HostIdentity, IdentityProvider};
pub use types::{clean, Account, RegistrationForm, Role, Session};
