//! Session resolver: turns a possibly-not-yet-ready host identity into a terminal [`Session`].
//!
//! The resolver is a small state machine (`Idle → Querying → Done`, with `Waiting` between
//! failed attempts) driven by an injected [`Scheduler`]. A [`Liveness`] token is checked before
//! every transition and raced against every suspension point, so a torn-down consumer never
//! observes a late result and no further lookup is issued after cancellation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tgapp_core::{AccountService, IdentityClaim, IdentityProvider, Session, SessionError};
use tracing::{debug, info, instrument, warn};

use crate::retry::RetryPolicy;
use crate::scheduler::{Liveness, Scheduler, TokioScheduler};

/// Resolver states. `Waiting` and `Querying` are the only suspension points.
#[derive(Debug)]
enum ResolverState {
    Idle,
    Waiting { delay: Duration },
    Querying { claim: IdentityClaim, external_id: i64 },
    Done(Session),
}

/// Terminal result of one resolution pass, with bookkeeping the caller may want.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub session: Session,
    /// Attempts started, 1..=4.
    pub attempts: u32,
    /// Remote lookups issued.
    pub lookups: u32,
    /// Last external id the host exposed during the pass.
    pub external_id: Option<i64>,
    pub resolved_at: DateTime<Utc>,
}

/// Resolves the current host identity to a session with bounded retries.
#[derive(Clone)]
pub struct SessionResolver {
    provider: Arc<dyn IdentityProvider>,
    service: Arc<dyn AccountService>,
    scheduler: Arc<dyn Scheduler>,
    policy: RetryPolicy,
}

impl SessionResolver {
    /// Creates a resolver using real timers.
    pub fn new(provider: Arc<dyn IdentityProvider>, service: Arc<dyn AccountService>) -> Self {
        Self {
            provider,
            service,
            scheduler: Arc::new(TokioScheduler),
            policy: RetryPolicy::default(),
        }
    }

    /// Replaces the scheduler used for backoff delays.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs one independent resolution pass to completion.
    ///
    /// The pass owns its liveness token, so it always reaches a terminal state; an abandoned
    /// pass would report the host as gone.
    pub async fn resolve_session(&self) -> Session {
        self.resolve_with(&Liveness::new())
            .await
            .map_or(Session::Failed(SessionError::HostUnavailable), |resolution| {
                resolution.session
            })
    }

    /// Runs one independent resolution pass. Returns `None` if `liveness` was cancelled
    /// before a terminal state was reached; nothing is produced after cancellation.
    #[instrument(skip(self, liveness))]
    pub async fn resolve_with(&self, liveness: &Liveness) -> Option<Resolution> {
        let mut state = ResolverState::Idle;
        let mut attempt: u32 = 0;
        let mut lookups: u32 = 0;
        let mut external_id = None;

        loop {
            if !liveness.is_alive() {
                debug!(attempt, lookups, "step: resolution abandoned");
                return None;
            }

            state = match state {
                ResolverState::Idle => {
                    attempt += 1;
                    info!(attempt, max_attempts = self.policy.max_attempts(), "step: attempt started");
                    match self.observe_identity() {
                        Ok((claim, id)) => {
                            external_id = Some(id);
                            ResolverState::Querying {
                                claim,
                                external_id: id,
                            }
                        }
                        Err(reason) => self.after_failure(attempt, reason),
                    }
                }
                ResolverState::Querying { claim, external_id } => {
                    lookups += 1;
                    let result = tokio::select! {
                        biased;
                        _ = liveness.cancelled() => {
                            debug!(attempt, "step: lookup result discarded");
                            return None;
                        }
                        result = self.service.current_account(&claim) => result,
                    };
                    match result {
                        Ok(account) => {
                            let account = account.with_fallback_external_id(external_id);
                            info!(
                                attempt,
                                account_id = %account.id,
                                role = %account.role,
                                "step: account resolved"
                            );
                            ResolverState::Done(Session::Authenticated(account))
                        }
                        Err(err) => {
                            let reason = err.classify();
                            warn!(attempt, error = %err, "step: account lookup failed");
                            if self.policy.has_remaining(attempt) {
                                ResolverState::Waiting {
                                    delay: self.policy.delay_after(attempt),
                                }
                            } else {
                                ResolverState::Done(Session::Failed(
                                    SessionError::AllAttemptsExhausted {
                                        attempts: attempt,
                                        last: Box::new(reason),
                                    },
                                ))
                            }
                        }
                    }
                }
                ResolverState::Waiting { delay } => {
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "step: backing off");
                    tokio::select! {
                        biased;
                        _ = liveness.cancelled() => {
                            debug!(attempt, "step: backoff cancelled");
                            return None;
                        }
                        _ = self.scheduler.sleep(delay) => {}
                    }
                    ResolverState::Idle
                }
                ResolverState::Done(session) => {
                    info!(attempt, lookups, outcome = session_kind(&session), "step: resolution finished");
                    return Some(Resolution {
                        session,
                        attempts: attempt,
                        lookups,
                        external_id,
                        resolved_at: Utc::now(),
                    });
                }
            };
        }
    }

    /// Reads the host claim; fails with the reason this attempt cannot query the service.
    fn observe_identity(&self) -> Result<(IdentityClaim, i64), SessionError> {
        let claim = self.provider.claim().ok_or(SessionError::HostUnavailable)?;
        let id = claim.observed_id().ok_or(SessionError::IdentityMissing)?;
        Ok((claim, id))
    }

    fn after_failure(&self, attempt: u32, reason: SessionError) -> ResolverState {
        if self.policy.has_remaining(attempt) {
            debug!(attempt, reason = %reason, "step: identity not ready");
            ResolverState::Waiting {
                delay: self.policy.delay_after(attempt),
            }
        } else {
            warn!(attempt, reason = %reason, "step: identity never became available");
            ResolverState::Done(Session::Failed(reason))
        }
    }
}

fn session_kind(session: &Session) -> &'static str {
    match session {
        Session::Authenticated(_) => "authenticated",
        Session::NeedsRegistration(_) => "needs_registration",
        Session::Failed(_) => "failed",
    }
}
