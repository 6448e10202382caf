//! # tgapp-api
//!
//! HTTP client for the account service: [`HttpAccountService`] implements
//! [`tgapp_core::AccountService`] with reqwest, selecting the auth payload from the host claim
//! ([`select_auth_payload`]) and classifying 401/404 as "not registered". Config from env.

mod client;
mod config;
mod payload;

pub use client::{parse_account, HttpAccountService, INIT_DATA_HEADER};
pub use config::{ApiConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use payload::{select_auth_payload, PayloadSource};
