//! Seams to the outside world: the host identity provider and the remote account service.
//!
//! Both are injected into the resolver so it never reads ambient host state directly.

use std::sync::RwLock;

use async_trait::async_trait;

use crate::claim::IdentityClaim;
use crate::error::Result;
use crate::types::{Account, RegistrationForm};

/// Host environment exposing the user's platform identity.
pub trait IdentityProvider: Send + Sync {
    /// Current claim, or `None` when the host SDK itself is absent. Readable at any time;
    /// may be incomplete shortly after start.
    fn claim(&self) -> Option<IdentityClaim>;
}

/// Backend resolving an opaque auth payload to an application account.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Looks up the account for the claim's auth payload. 401/404 surface as
    /// [`crate::ServiceError::NotRegistered`].
    async fn current_account(&self, claim: &IdentityClaim) -> Result<Account>;

    /// Creates the account for an identity that has none yet.
    async fn register(&self, claim: &IdentityClaim, form: &RegistrationForm) -> Result<Account>;
}

/// In-process host slot: starts absent and can be attached, updated or detached later.
/// Used where the host is driven by our own code (tests, CLI).
#[derive(Debug, Default)]
pub struct HostIdentity {
    claim: RwLock<Option<IdentityClaim>>,
}

impl HostIdentity {
    /// A host that is not present yet.
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn present(claim: IdentityClaim) -> Self {
        Self {
            claim: RwLock::new(Some(claim)),
        }
    }

    pub fn attach(&self, claim: IdentityClaim) {
        if let Ok(mut slot) = self.claim.write() {
            *slot = Some(claim);
        }
    }

    pub fn detach(&self) {
        if let Ok(mut slot) = self.claim.write() {
            *slot = None;
        }
    }
}

impl IdentityProvider for HostIdentity {
    fn claim(&self) -> Option<IdentityClaim> {
        self.claim.read().ok().and_then(|slot| slot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_identity_lifecycle() {
        let host = HostIdentity::absent();
        assert!(host.claim().is_none());

        host.attach(IdentityClaim::default());
        assert_eq!(host.claim().and_then(|c| c.observed_id()), None);

        host.attach(IdentityClaim {
            external_id: Some(5),
            ..IdentityClaim::default()
        });
        assert_eq!(host.claim().and_then(|c| c.observed_id()), Some(5));

        host.detach();
        assert!(host.claim().is_none());
    }
}
