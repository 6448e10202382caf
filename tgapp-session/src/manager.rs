//! Session manager: owns the current session for the lifetime of the app and runs the
//! resolver on start, re-login and registration.
//!
//! Every resolution runs under a generation number. Starting a new one, publishing a session
//! (resolved or registered), logging out or shutting down bumps the generation and cancels the
//! previous [`Liveness`]; only the current generation may publish, so an abandoned resolution
//! can never overwrite newer state.

use std::sync::Arc;

use tgapp_core::{AccountService, IdentityProvider, RegistrationForm, Session};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, instrument, warn};

use crate::error::{ManagerError, Result};
use crate::resolver::{Resolution, SessionResolver};
use crate::scheduler::{Liveness, Scheduler};

/// What a consumer (the view layer) can observe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing started yet.
    Idle,
    /// First resolution in progress; no session to show.
    Resolving,
    Ready(Session),
    /// Logged out: session discarded, no identity retained.
    SignedOut,
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Ready(session) => Some(session),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Control {
    generation: u64,
    liveness: Option<Liveness>,
    closed: bool,
}

impl Control {
    fn invalidate(&mut self) {
        self.generation += 1;
        if let Some(liveness) = self.liveness.take() {
            liveness.cancel();
        }
    }
}

/// Holder of the session; share it behind an `Arc` between the app and its views.
pub struct SessionManager {
    resolver: SessionResolver,
    provider: Arc<dyn IdentityProvider>,
    service: Arc<dyn AccountService>,
    control: Mutex<Control>,
    state: watch::Sender<SessionState>,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, service: Arc<dyn AccountService>) -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        Self {
            resolver: SessionResolver::new(provider.clone(), service.clone()),
            provider,
            service,
            control: Mutex::new(Control::default()),
            state,
        }
    }

    /// Replaces the scheduler the resolver uses for backoff delays.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.resolver = self.resolver.with_scheduler(scheduler);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Receiver notified on every published state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolves a fresh session. Any resolution still in flight is abandoned.
    /// Returns `None` when this resolution was itself superseded, logged out or shut down.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Option<Session> {
        let (generation, liveness) = self.begin().await?;
        let resolution = self.resolver.resolve_with(&liveness).await?;
        self.publish(generation, interpret(resolution)).await
    }

    /// Re-runs resolution. The current session stays visible until the new one is terminal.
    pub async fn relogin(&self) -> Option<Session> {
        self.start().await
    }

    /// Registers the current identity. Only valid while the session needs registration.
    #[instrument(skip(self, form), fields(role = %form.role))]
    pub async fn register(&self, form: RegistrationForm) -> Result<Session> {
        form.validate()?;
        let generation = {
            let control = self.control.lock().await;
            if control.closed {
                return Err(ManagerError::ShutDown);
            }
            if !matches!(
                self.state.borrow().session(),
                Some(Session::NeedsRegistration(_))
            ) {
                return Err(ManagerError::NotAwaitingRegistration);
            }
            control.generation
        };

        let claim = self.provider.claim().ok_or(ManagerError::HostUnavailable)?;
        let external_id = claim.observed_id().ok_or(ManagerError::IdentityMissing)?;
        let account = self
            .service
            .register(&claim, &form)
            .await?
            .with_fallback_external_id(external_id);
        info!(account_id = %account.id, "step: account registered");

        self.publish(generation, Session::Authenticated(account))
            .await
            .ok_or(ManagerError::Superseded)
    }

    /// Discards the session and abandons any resolution in flight.
    pub async fn logout(&self) {
        let mut control = self.control.lock().await;
        control.invalidate();
        self.state.send_replace(SessionState::SignedOut);
        info!(generation = control.generation, "step: logged out");
    }

    /// Teardown: pending timers and lookups are abandoned and nothing is published afterwards.
    pub async fn shutdown(&self) {
        let mut control = self.control.lock().await;
        control.invalidate();
        control.closed = true;
        debug!(generation = control.generation, "step: session manager shut down");
    }

    async fn begin(&self) -> Option<(u64, Liveness)> {
        let mut control = self.control.lock().await;
        if control.closed {
            warn!("step: start ignored after shutdown");
            return None;
        }
        control.invalidate();
        let liveness = Liveness::new();
        control.liveness = Some(liveness.clone());
        self.state.send_if_modified(|state| {
            if matches!(state, SessionState::Ready(_)) {
                false
            } else {
                *state = SessionState::Resolving;
                true
            }
        });
        debug!(generation = control.generation, "step: resolution generation started");
        Some((control.generation, liveness))
    }

    async fn publish(&self, generation: u64, session: Session) -> Option<Session> {
        let mut control = self.control.lock().await;
        if control.closed || control.generation != generation {
            debug!(
                generation,
                current = control.generation,
                "step: stale session discarded"
            );
            return None;
        }
        control.invalidate();
        self.state.send_replace(SessionState::Ready(session.clone()));
        Some(session)
    }
}

/// Exhaustion caused by "not registered" lookups means the identity is valid but has no account.
fn interpret(resolution: Resolution) -> Session {
    match (resolution.session, resolution.external_id) {
        (Session::Failed(reason), Some(external_id)) if reason.is_unregistered() => {
            Session::NeedsRegistration(external_id)
        }
        (session, _) => session,
    }
}
