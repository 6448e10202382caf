//! Host identity taken from the process environment, re-read on every call:
//! TG_USER_ID, TG_INIT_DATA, TG_AUTH, TG_LAUNCH_URL. With none of them set the host is absent.

use std::env;

use tgapp_core::{init_data_from_launch, user_id_from_init_data, IdentityClaim, IdentityProvider};

pub const USER_ID_VAR: &str = "TG_USER_ID";
pub const INIT_DATA_VAR: &str = "TG_INIT_DATA";
pub const ALT_AUTH_VAR: &str = "TG_AUTH";
pub const LAUNCH_URL_VAR: &str = "TG_LAUNCH_URL";

/// [`IdentityProvider`] backed by environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvIdentityProvider;

impl IdentityProvider for EnvIdentityProvider {
    fn claim(&self) -> Option<IdentityClaim> {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        let user_id = var(USER_ID_VAR);
        let init_data = var(INIT_DATA_VAR);
        let alt_auth = var(ALT_AUTH_VAR);
        let launch_query = var(LAUNCH_URL_VAR);
        if user_id.is_none() && init_data.is_none() && alt_auth.is_none() && launch_query.is_none() {
            return None;
        }

        let external_id = user_id
            .and_then(|id| id.trim().parse().ok())
            .or_else(|| init_data.as_deref().and_then(user_id_from_init_data))
            .or_else(|| {
                launch_query
                    .as_deref()
                    .and_then(init_data_from_launch)
                    .and_then(|data| user_id_from_init_data(&data))
            });

        Some(IdentityClaim {
            external_id,
            init_data,
            alt_auth,
            launch_query,
        })
    }
}
