//! reqwest implementation of [`AccountService`].
//!
//! `GET {base}/auth/me` resolves the current account; `POST {base}/auth/register` creates one.
//! Both carry the selected auth payload in [`INIT_DATA_HEADER`].

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde_json::Value;
use tgapp_core::{
    mask_payload, Account, AccountService, IdentityClaim, RegistrationForm, Result, ServiceError,
};
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::payload::select_auth_payload;

/// Header the backend reads the signed init data from.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

const ME_PATH: &str = "auth/me";
const REGISTER_PATH: &str = "auth/register";
/// Envelope keys some endpoints wrap the account in.
const ENVELOPE_KEYS: [&str; 3] = ["user", "account", "data"];

/// Account service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAccountService {
    http: reqwest::Client,
    me_url: Url,
    register_url: Url,
}

impl HttpAccountService {
    /// Builds the client; validates the base URL and applies the request timeout.
    pub fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Build HTTP client")?;
        Ok(Self {
            http,
            me_url: base.join(ME_PATH)?,
            register_url: base.join(REGISTER_PATH)?,
        })
    }

    pub fn me_url(&self) -> &Url {
        &self.me_url
    }

    fn authorize(&self, request: RequestBuilder, claim: &IdentityClaim) -> RequestBuilder {
        match select_auth_payload(claim) {
            Some((payload, source)) => {
                debug!(?source, payload = %mask_payload(&payload), "auth payload selected");
                request.header(INIT_DATA_HEADER, &*payload)
            }
            None => {
                warn!("no auth payload available; sending request without it");
                request
            }
        }
    }
}

#[async_trait]
impl AccountService for HttpAccountService {
    #[instrument(skip(self, claim), fields(external_id = ?claim.external_id))]
    async fn current_account(&self, claim: &IdentityClaim) -> Result<Account> {
        let request = self.authorize(self.http.get(self.me_url.clone()), claim);
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        read_account(response).await
    }

    #[instrument(skip(self, claim, form), fields(external_id = ?claim.external_id, role = %form.role))]
    async fn register(&self, claim: &IdentityClaim, form: &RegistrationForm) -> Result<Account> {
        let request = self.authorize(self.http.post(self.register_url.clone()).json(form), claim);
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        read_account(response).await
    }
}

async fn read_account(response: reqwest::Response) -> Result<Account> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ServiceError::Network(e.to_string()))?;
    if !status.is_success() {
        debug!(status = status.as_u16(), "account service returned an error status");
        return Err(ServiceError::from_status(status.as_u16(), body));
    }
    parse_account(&body)
}

/// Decodes an account body, unwrapping a `{"user": {...}}`-style envelope if present.
pub fn parse_account(body: &str) -> Result<Account> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;
    serde_json::from_value(unwrap_envelope(value)).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if !map.contains_key("id") => {
            for key in ENVELOPE_KEYS {
                if let Some(Value::Object(inner)) = map.remove(key) {
                    return Value::Object(inner);
                }
            }
            Value::Object(map)
        }
        other => other,
    }
}
