//! Identity claim read from the host WebApp environment, and helpers for the launch
//! parameters Telegram hands to a Mini-App.

use serde_json::Value;

/// Query/fragment parameter carrying the signed init data in a launch URL.
pub const LAUNCH_DATA_PARAM: &str = "tgWebAppData";

/// What the host currently exposes about the user. Re-read on every resolution attempt:
/// the host may fill it in after the app has started.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityClaim {
    pub external_id: Option<i64>,
    /// Raw signed init data (`initData`).
    pub init_data: Option<String>,
    /// Alternate-named payload some hosts expose (`_auth`).
    pub alt_auth: Option<String>,
    /// Launch query string or URL, possibly embedding `tgWebAppData`.
    pub launch_query: Option<String>,
}

impl IdentityClaim {
    /// Claim built from raw init data; the user id is taken from its `user` field.
    pub fn from_init_data(init_data: impl Into<String>) -> Self {
        let init_data = init_data.into();
        Self {
            external_id: user_id_from_init_data(&init_data),
            init_data: Some(init_data),
            ..Self::default()
        }
    }

    /// The external id, if the host has populated a usable one.
    pub fn observed_id(&self) -> Option<i64> {
        self.external_id.filter(|id| *id != 0)
    }

    pub fn has_payload(&self) -> bool {
        [&self.init_data, &self.alt_auth, &self.launch_query]
            .iter()
            .any(|s| s.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

/// Extracts `user.id` from URL-encoded init data (`user=%7B%22id%22%3A42...`).
pub fn user_id_from_init_data(init_data: &str) -> Option<i64> {
    url::form_urlencoded::parse(init_data.as_bytes())
        .find(|(key, _)| key == "user")
        .and_then(|(_, user)| serde_json::from_str::<Value>(&user).ok())
        .and_then(|user| user.get("id").and_then(Value::as_i64))
}

/// Pulls `tgWebAppData` out of a launch URL, its fragment, or a bare query string.
pub fn init_data_from_launch(launch: &str) -> Option<String> {
    let params = match launch.split_once('#') {
        Some((_, fragment)) => fragment,
        None => launch.split_once('?').map_or(launch, |(_, query)| query),
    };
    let params = params.trim_start_matches(['?', '#']);
    url::form_urlencoded::parse(params.as_bytes())
        .find(|(key, _)| key == LAUNCH_DATA_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INIT_DATA: &str =
        "query_id=AAE&user=%7B%22id%22%3A424242%2C%22first_name%22%3A%22Ada%22%7D&auth_date=1700000000&hash=abc";

    #[test]
    fn test_user_id_from_init_data() {
        assert_eq!(user_id_from_init_data(INIT_DATA), Some(424242));
        assert_eq!(user_id_from_init_data("auth_date=1&hash=x"), None);
        assert_eq!(user_id_from_init_data("user=not-json"), None);
    }

    #[test]
    fn test_from_init_data_sets_external_id() {
        let claim = IdentityClaim::from_init_data(INIT_DATA);
        assert_eq!(claim.observed_id(), Some(424242));
        assert!(claim.has_payload());
    }

    #[test]
    fn test_observed_id_ignores_zero() {
        let claim = IdentityClaim {
            external_id: Some(0),
            ..IdentityClaim::default()
        };
        assert_eq!(claim.observed_id(), None);
        assert!(!claim.has_payload());
    }

    #[test]
    fn test_init_data_from_launch_fragment() {
        let encoded: String =
            url::form_urlencoded::byte_serialize(INIT_DATA.as_bytes()).collect();
        let url = format!(
            "https://app.example.com/#tgWebAppData={}&tgWebAppVersion=7.0",
            encoded
        );
        assert_eq!(init_data_from_launch(&url).as_deref(), Some(INIT_DATA));
    }

    #[test]
    fn test_init_data_from_launch_query_and_bare() {
        assert_eq!(
            init_data_from_launch("https://app.example.com/?tgWebAppData=a%3Db").as_deref(),
            Some("a=b")
        );
        assert_eq!(
            init_data_from_launch("tgWebAppData=x&tgWebAppPlatform=ios").as_deref(),
            Some("x")
        );
        assert_eq!(init_data_from_launch("https://app.example.com/?foo=1"), None);
        assert_eq!(init_data_from_launch("tgWebAppData="), None);
    }
}
