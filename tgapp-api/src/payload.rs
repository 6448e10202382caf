//! Auth payload selection: which of the host's payload sources goes into the request header.

use std::borrow::Cow;

use tgapp_core::{init_data_from_launch, IdentityClaim};

/// Source the selected payload came from, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    InitData,
    AltAuth,
    LaunchQuery,
}

/// Picks the payload in order: raw init data, alternate-named payload, then `tgWebAppData`
/// embedded in the launch query. Blank candidates are skipped.
pub fn select_auth_payload(claim: &IdentityClaim) -> Option<(Cow<'_, str>, PayloadSource)> {
    if let Some(raw) = non_blank(&claim.init_data) {
        return Some((Cow::Borrowed(raw), PayloadSource::InitData));
    }
    if let Some(alt) = non_blank(&claim.alt_auth) {
        return Some((Cow::Borrowed(alt), PayloadSource::AltAuth));
    }
    non_blank(&claim.launch_query)
        .and_then(init_data_from_launch)
        .map(|data| (Cow::Owned(data), PayloadSource::LaunchQuery))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
