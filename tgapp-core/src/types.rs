//! Core types: role, account, registration form and the resolved session.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, SessionError};

/// Account role. The backend knows exactly two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "teacher" => Ok(Role::Teacher),
            "student" => Ok(Role::Student),
            _ => Err(CoreError::UnknownRole(s.to_string())),
        }
    }
}

/// Backend-owned user record, held read-through for the lifetime of a session.
///
/// Deserialization accepts both snake_case and camelCase field names (the first usable
/// spelling wins when a body carries several), ids as numbers or strings, and treats
/// placeholder strings (`""`, `"null"`, `"undefined"`, `"-"`) as absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct Account {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub role: Role,
    /// Telegram user id as echoed by the backend, if it echoes one.
    pub external_id: Option<i64>,
    pub locale: Option<String>,
    pub timezone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Keeps the service-provided external id; falls back to the locally observed one.
    pub fn with_fallback_external_id(mut self, observed: i64) -> Self {
        if self.external_id.is_none() {
            self.external_id = Some(observed);
        }
        self
    }

    /// First and last name joined, then username, then `User <id>`.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        match &self.username {
            Some(username) => format!("@{}", username),
            None => format!("User {}", self.id),
        }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

// Accepted spellings per field, in preference order.
const ID_KEYS: &[&str] = &["id", "_id", "userId", "user_id"];
const FIRST_NAME_KEYS: &[&str] = &["first_name", "firstName"];
const LAST_NAME_KEYS: &[&str] = &["last_name", "lastName"];
const USERNAME_KEYS: &[&str] = &["username", "userName"];
const ROLE_KEYS: &[&str] = &["role", "userType", "user_type"];
const EXTERNAL_ID_KEYS: &[&str] = &[
    "external_id",
    "externalId",
    "telegram_id",
    "telegramId",
    "tg_id",
    "tgId",
];
const LOCALE_KEYS: &[&str] = &["locale", "language_code", "languageCode"];
const TIMEZONE_KEYS: &[&str] = &["timezone", "timeZone", "time_zone"];
const CREATED_AT_KEYS: &[&str] = &["created_at", "createdAt"];

impl TryFrom<Map<String, Value>> for Account {
    type Error = CoreError;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = ID_KEYS
            .iter()
            .filter_map(|key| raw.get(*key))
            .find_map(value_as_text)
            .ok_or(CoreError::MissingField("id"))?;
        let role = text(&raw, ROLE_KEYS)
            .ok_or(CoreError::MissingField("role"))?
            .parse::<Role>()?;
        let external_id = match EXTERNAL_ID_KEYS
            .iter()
            .filter_map(|key| raw.get(*key))
            .find(|value| is_present(value))
        {
            Some(value) => parse_external_id(value)?,
            None => None,
        };
        let created_at = text(&raw, CREATED_AT_KEYS)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Account {
            id,
            first_name: text(&raw, FIRST_NAME_KEYS),
            last_name: text(&raw, LAST_NAME_KEYS),
            username: text(&raw, USERNAME_KEYS),
            role,
            external_id,
            locale: text(&raw, LOCALE_KEYS),
            timezone: text(&raw, TIMEZONE_KEYS),
            created_at,
        })
    }
}

const PLACEHOLDERS: [&str; 5] = ["", "null", "undefined", "none", "-"];

/// Trims and drops placeholder values the backend uses for "not set".
pub fn clean(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if PLACEHOLDERS.contains(&trimmed.to_ascii_lowercase().as_str()) {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// First string value under `keys` that is not a placeholder.
fn text(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match raw.get(*key) {
        Some(Value::String(s)) => clean(Some(s.clone())),
        _ => None,
    })
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => clean(Some(s.clone())).is_some(),
        _ => true,
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean(Some(s.clone())),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_external_id(value: &Value) -> Result<Option<i64>, CoreError> {
    let invalid = |reason: String| CoreError::InvalidField {
        field: "external_id",
        reason,
    };
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| invalid(format!("not an integer: {}", n))),
        Value::String(s) => match clean(Some(s.clone())) {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| invalid(format!("not an integer: {}", s))),
        },
        other => Err(invalid(format!("unexpected value: {}", other))),
    }
}

/// Data collected from a user whose identity has no account yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationForm {
    pub first_name: String,
    pub last_name: Option<String>,
    pub role: Role,
    pub timezone: Option<String>,
}

impl RegistrationForm {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.first_name.trim().is_empty() {
            return Err(CoreError::MissingField("first_name"));
        }
        Ok(())
    }
}

/// Terminal outcome of resolving the host identity for one page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Authenticated(Account),
    /// The identity is valid but has no account; carries the Telegram user id.
    NeedsRegistration(i64),
    Failed(SessionError),
}

impl Session {
    pub fn account(&self) -> Option<&Account> {
        match self {
            Session::Authenticated(account) => Some(account),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn failure(&self) -> Option<&SessionError> {
        match self {
            Session::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account_from(json: &str) -> Result<Account, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_account_snake_case() {
        let account = account_from(
            r#"{"id":"u1","first_name":"Ada","last_name":"Lovelace","role":"teacher","telegram_id":42,"time_zone":"Europe/London"}"#,
        )
        .unwrap();
        assert_eq!(account.id, "u1");
        assert_eq!(account.first_name.as_deref(), Some("Ada"));
        assert_eq!(account.role, Role::Teacher);
        assert_eq!(account.external_id, Some(42));
        assert_eq!(account.timezone.as_deref(), Some("Europe/London"));
    }

    #[test]
    fn test_account_camel_case_and_string_ids() {
        let account = account_from(
            r#"{"id":17,"firstName":"Bo","userType":"STUDENT","telegramId":"99","languageCode":"ru"}"#,
        )
        .unwrap();
        assert_eq!(account.id, "17");
        assert_eq!(account.role, Role::Student);
        assert_eq!(account.external_id, Some(99));
        assert_eq!(account.locale.as_deref(), Some("ru"));
    }

    #[test]
    fn test_account_placeholders_become_none() {
        let account = account_from(
            r#"{"id":"u2","first_name":"  ","last_name":"undefined","username":"null","role":"student","tg_id":"","timezone":"-"}"#,
        )
        .unwrap();
        assert!(account.first_name.is_none());
        assert!(account.last_name.is_none());
        assert!(account.username.is_none());
        assert!(account.external_id.is_none());
        assert!(account.timezone.is_none());
        assert_eq!(account.display_name(), "User u2");
    }

    #[test]
    fn test_account_tolerates_duplicate_spellings() {
        let account = account_from(
            r#"{"id":"u1","user_id":7,"role":"teacher","userType":"student","time_zone":"UTC","timezone":"Europe/Berlin","telegram_id":"","tg_id":55}"#,
        )
        .unwrap();
        assert_eq!(account.id, "u1");
        assert_eq!(account.role, Role::Teacher);
        assert_eq!(account.timezone.as_deref(), Some("Europe/Berlin"));
        assert_eq!(account.external_id, Some(55));

        let fallback = account_from(r#"{"id":"null","userId":9,"role":"student"}"#).unwrap();
        assert_eq!(fallback.id, "9");
    }

    #[test]
    fn test_account_rejects_unknown_role_and_missing_id() {
        assert!(account_from(r#"{"id":"u3","role":"admin"}"#).is_err());
        assert!(account_from(r#"{"role":"teacher"}"#).is_err());
        assert!(account_from(r#"{"id":"u4"}"#).is_err());
    }

    #[test]
    fn test_account_created_at_is_lenient() {
        let ok = account_from(r#"{"id":"u5","role":"teacher","createdAt":"2024-09-01T10:00:00Z"}"#)
            .unwrap();
        assert!(ok.created_at.is_some());
        let garbled =
            account_from(r#"{"id":"u5","role":"teacher","created_at":"yesterday"}"#).unwrap();
        assert!(garbled.created_at.is_none());
    }

    #[test]
    fn test_with_fallback_external_id() {
        let account = account_from(r#"{"id":"u1","role":"teacher"}"#).unwrap();
        assert_eq!(account.clone().with_fallback_external_id(7).external_id, Some(7));

        let echoed = account_from(r#"{"id":"u1","role":"teacher","external_id":8}"#).unwrap();
        assert_eq!(echoed.with_fallback_external_id(7).external_id, Some(8));
    }

    #[test]
    fn test_display_name_order() {
        let mut account = account_from(r#"{"id":"u1","role":"teacher","username":"ada"}"#).unwrap();
        assert_eq!(account.display_name(), "@ada");
        account.first_name = Some("Ada".into());
        assert_eq!(account.display_name(), "Ada");
        account.last_name = Some("L".into());
        assert_eq!(account.display_name(), "Ada L");
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!(" Teacher ".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!(Role::Student.to_string(), "student");
        assert!("parent".parse::<Role>().is_err());
    }

    #[test]
    fn test_registration_form_requires_first_name() {
        let form = RegistrationForm {
            first_name: " ".into(),
            last_name: None,
            role: Role::Student,
            timezone: None,
        };
        assert_eq!(form.validate(), Err(CoreError::MissingField("first_name")));
    }

    #[test]
    fn test_session_accessors() {
        let account = account_from(r#"{"id":"u1","role":"teacher"}"#).unwrap();
        let session = Session::Authenticated(account);
        assert!(session.is_authenticated());
        assert!(session.account().is_some());
        assert!(session.failure().is_none());

        let failed = Session::Failed(SessionError::IdentityMissing);
        assert_eq!(failed.failure(), Some(&SessionError::IdentityMissing));
        assert!(Session::NeedsRegistration(1).account().is_none());
    }
}
