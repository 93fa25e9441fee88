//! Local reflection of the hosted identity provider's session.
//!
//! The mirror is the only writer of its state. Every interactive operation
//! (startup resolution, login, register, logout) and every applied provider
//! notification opens a resolution stamped with a new generation; a result
//! whose generation is no longer current is rejected with
//! [`DomainError::StaleResolution`]. Provider notifications that arrive while
//! one of the mirror's own resolutions is in flight are dropped, since that
//! resolution already accounts for them. A notification is also dropped when
//! the provider's current session no longer agrees with it, so a sign-in
//! delivered after a logout never re-authenticates the mirror.

use crate::domain::{SnapshotStore, UserSnapshot};
use chrono::Utc;
use common::auth::{
    fabricate_test_user, test_account_role, AuthSession, IdentityProvider, SessionEvent,
    TestLoginPolicy, TEST_ACCOUNT_PASSWORD,
};
use common::domain::{
    CreateUserProfileInput, DomainError, DomainResult, GetUserInput, User, UserRepository,
    UserRole,
};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing known yet
    Unresolved,
    /// A resolution is in flight; `last_known` is shown meanwhile
    Resolving {
        generation: u64,
        last_known: Option<User>,
    },
    Authenticated(User),
    Anonymous,
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            SessionState::Resolving { last_known, .. } => last_known.as_ref(),
            SessionState::Unresolved | SessionState::Anonymous => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            SessionState::Unresolved | SessionState::Resolving { .. }
        )
    }
}

/// Contact fields prefilled on interest and donation forms
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPrefill {
    pub name: String,
    pub email: String,
}

/// Input for registering a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: UserRole,
}

struct MirrorState {
    state: SessionState,
    generation: u64,
}

pub struct SessionMirror {
    identity_provider: Arc<dyn IdentityProvider>,
    user_repository: Arc<dyn UserRepository>,
    snapshot_store: Arc<dyn SnapshotStore>,
    test_login_policy: TestLoginPolicy,
    inner: RwLock<MirrorState>,
}

impl SessionMirror {
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        user_repository: Arc<dyn UserRepository>,
        snapshot_store: Arc<dyn SnapshotStore>,
        test_login_policy: TestLoginPolicy,
    ) -> Self {
        Self {
            identity_provider,
            user_repository,
            snapshot_store,
            test_login_policy,
            inner: RwLock::new(MirrorState {
                state: SessionState::Unresolved,
                generation: 0,
            }),
        }
    }

    pub async fn state(&self) -> SessionState {
        self.inner.read().await.state.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.read().await.state.user().cloned()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.state.user().is_some()
    }

    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.state.is_loading()
    }

    pub async fn contact_prefill(&self) -> ContactPrefill {
        self.current_user()
            .await
            .map(|user| ContactPrefill {
                name: user.name,
                email: user.email,
            })
            .unwrap_or_default()
    }

    /// Subscribe to provider notifications; pass the receiver to [`Self::run_listener`]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.identity_provider.subscribe()
    }

    /// Startup resolution: show the persisted snapshot, then ask the provider.
    #[instrument(skip(self))]
    pub async fn resolve(&self) -> Option<User> {
        let generation = self.begin_resolution().await;

        if let Some(user) = self.load_snapshot().await {
            debug!(user_id = %user.id, "showing persisted user while resolving");
            self.show_last_known(generation, user).await;
        }

        self.resolve_from_provider(generation).await
    }

    /// Sign in. Designated test addresses never reach the provider.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> DomainResult<User> {
        if let Some(role) = test_account_role(email) {
            if self.test_login_policy.is_enabled(role) {
                return self.test_login(email, password, role).await;
            }
            debug!(role = %role, "test login disabled, using provider");
        }

        let generation = self.begin_resolution().await;
        let previous = self.last_known(generation).await;

        let session = match self
            .identity_provider
            .sign_in_with_password(email, password)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                self.settle(generation, previous).await;
                return Err(e);
            }
        };

        let user = match self.fetch_profile(&session).await {
            Ok(user) => user,
            Err(e) => {
                self.settle(generation, None).await;
                return Err(e);
            }
        };

        self.commit(generation, Some(user.clone())).await?;
        info!(user_id = %user.id, role = %user.role, "user logged in");
        Ok(user)
    }

    /// Create an identity and its profile row.
    ///
    /// Returns `None` when the provider created nothing yet (for example while
    /// email confirmation is pending). The mirror becomes authenticated only if
    /// the provider opened a session for the new identity.
    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn register(&self, input: RegisterInput) -> DomainResult<Option<User>> {
        let generation = self.begin_resolution().await;
        let previous = self.last_known(generation).await;

        let result = self.register_identity(&input).await;

        let outcome = match &result {
            Ok(Some(user)) => match self.identity_provider.current_session().await {
                Ok(Some(session)) if session.user.id == user.id => Some(user.clone()),
                _ => previous,
            },
            _ => previous,
        };
        self.settle(generation, outcome).await;

        if let Ok(Some(user)) = &result {
            info!(user_id = %user.id, "user registered");
        }
        result
    }

    /// Sign out. Provider failures are logged, never returned; the mirror always
    /// ends anonymous.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let generation = self.begin_resolution().await;

        if let Err(e) = self.identity_provider.sign_out().await {
            warn!(error = %e, "provider sign-out failed, clearing local session anyway");
        }

        self.settle(generation, None).await;
        info!("user logged out");
    }

    /// Apply provider notifications until `cancel` fires or the provider goes away
    pub async fn run_listener(
        &self,
        mut events: broadcast::Receiver<SessionEvent>,
        cancel: CancellationToken,
    ) {
        debug!("session listener started");
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => event,
            };

            match event {
                Ok(event) => self.apply_event(event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session notifications dropped, resynchronizing");
                    if let Some((generation, _)) = self.begin_idle_resolution().await {
                        self.resolve_from_provider(generation).await;
                    }
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!("session listener stopped");
    }

    async fn apply_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::SignedIn(session) => {
                match self.state().await {
                    SessionState::Resolving { .. } => {
                        debug!("sign-in notification covered by resolution in flight");
                        return;
                    }
                    SessionState::Authenticated(user) if user.id == session.user.id => return,
                    _ => {}
                }
                if !self.provider_holds(Some(session.user.id.as_str())).await {
                    debug!(user_id = %session.user.id, "ignoring stale sign-in notification");
                    return;
                }
                let Some((generation, prior)) = self.begin_idle_resolution().await else {
                    return;
                };
                // The provider may have moved on while the resolution was opening
                if !self.provider_holds(Some(session.user.id.as_str())).await {
                    self.abandon(generation, prior).await;
                    return;
                }
                let outcome = match self.fetch_profile(&session).await {
                    Ok(user) => Some(user),
                    Err(e) => {
                        warn!(error = %e, "could not load profile for notified session");
                        None
                    }
                };
                self.settle(generation, outcome).await;
            }
            SessionEvent::SignedOut => {
                if matches!(
                    self.state().await,
                    SessionState::Unresolved
                        | SessionState::Anonymous
                        | SessionState::Resolving { .. }
                ) {
                    return;
                }
                if !self.provider_holds(None).await {
                    debug!("ignoring stale sign-out notification");
                    return;
                }
                let Some((generation, prior)) = self.begin_idle_resolution().await else {
                    return;
                };
                if !self.provider_holds(None).await {
                    self.abandon(generation, prior).await;
                    return;
                }
                self.settle(generation, None).await;
            }
        }
    }

    /// Whether the provider's current session belongs to `user_id` (`None`: no session).
    ///
    /// An unreadable session counts as signed out.
    async fn provider_holds(&self, user_id: Option<&str>) -> bool {
        let current = match self.identity_provider.current_session().await {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "could not read provider session");
                None
            }
        };
        current.as_ref().map(|session| session.user.id.as_str()) == user_id
    }

    async fn test_login(&self, email: &str, password: &str, role: UserRole) -> DomainResult<User> {
        if password != TEST_ACCOUNT_PASSWORD {
            return Err(DomainError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let generation = self.begin_resolution().await;
        let user = fabricate_test_user(email, role, Utc::now());
        self.commit(generation, Some(user.clone())).await?;

        info!(role = %role, "test account logged in");
        Ok(user)
    }

    async fn register_identity(&self, input: &RegisterInput) -> DomainResult<Option<User>> {
        let Some(identity) = self
            .identity_provider
            .sign_up(&input.email, &input.password)
            .await?
        else {
            return Ok(None);
        };

        let user = self
            .user_repository
            .create_user_profile(CreateUserProfileInput {
                id: identity.id,
                name: input.name.clone(),
                email: input.email.clone(),
                role: input.role,
                approved: input.role == UserRole::Volunteer,
            })
            .await?;

        Ok(Some(user))
    }

    async fn resolve_from_provider(&self, generation: u64) -> Option<User> {
        let outcome = match self.identity_provider.current_session().await {
            Ok(Some(session)) => match self.fetch_profile(&session).await {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!(error = %e, "session without usable profile, treating as anonymous");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "could not read provider session");
                None
            }
        };

        self.settle(generation, outcome).await;
        self.current_user().await
    }

    async fn fetch_profile(&self, session: &AuthSession) -> DomainResult<User> {
        self.user_repository
            .get_user(GetUserInput {
                user_id: session.user.id.clone(),
            })
            .await?
            .ok_or_else(|| DomainError::UserNotFound(session.user.id.clone()))
    }

    async fn load_snapshot(&self) -> Option<User> {
        let snapshot = match self.snapshot_store.load().await {
            Ok(snapshot) => snapshot?,
            Err(e) => {
                warn!(error = %e, "could not read user snapshot");
                return None;
            }
        };

        match User::try_from(snapshot) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "discarding malformed user snapshot");
                None
            }
        }
    }

    async fn begin_resolution(&self) -> u64 {
        let mut inner = self.inner.write().await;
        inner.generation += 1;
        let last_known = inner.state.user().cloned();
        inner.state = SessionState::Resolving {
            generation: inner.generation,
            last_known,
        };
        inner.generation
    }

    /// Like `begin_resolution`, but refuses while another resolution is in flight.
    /// Also returns the state it replaced, for [`Self::abandon`].
    async fn begin_idle_resolution(&self) -> Option<(u64, SessionState)> {
        let mut inner = self.inner.write().await;
        if matches!(inner.state, SessionState::Resolving { .. }) {
            return None;
        }
        inner.generation += 1;
        let generation = inner.generation;
        let last_known = inner.state.user().cloned();
        let prior = std::mem::replace(
            &mut inner.state,
            SessionState::Resolving {
                generation,
                last_known,
            },
        );
        Some((generation, prior))
    }

    /// Drop a resolution without touching the snapshot, putting `prior` back
    async fn abandon(&self, generation: u64, prior: SessionState) {
        let mut inner = self.inner.write().await;
        if inner.generation == generation {
            inner.state = prior;
        }
    }

    async fn last_known(&self, generation: u64) -> Option<User> {
        match &self.inner.read().await.state {
            SessionState::Resolving {
                generation: current,
                last_known,
            } if *current == generation => last_known.clone(),
            _ => None,
        }
    }

    async fn show_last_known(&self, generation: u64, user: User) {
        let mut inner = self.inner.write().await;
        if let SessionState::Resolving {
            generation: current,
            last_known,
        } = &mut inner.state
        {
            if *current == generation {
                *last_known = Some(user);
            }
        }
    }

    /// Finish a resolution, persisting its outcome.
    ///
    /// Holding the write lock across the snapshot write keeps the persisted
    /// entry in step with the state.
    async fn commit(&self, generation: u64, outcome: Option<User>) -> DomainResult<()> {
        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            debug!(generation, current = inner.generation, "rejecting stale resolution");
            return Err(DomainError::StaleResolution(generation));
        }

        let persisted = match &outcome {
            Some(user) => self.snapshot_store.save(&UserSnapshot::from(user)).await,
            None => self.snapshot_store.clear().await,
        };
        if let Err(e) = persisted {
            warn!(error = %e, "could not persist user snapshot");
        }

        inner.state = match outcome {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        };
        Ok(())
    }

    /// Commit where losing to a newer resolution is expected and harmless
    async fn settle(&self, generation: u64, outcome: Option<User>) {
        let _ = self.commit(generation, outcome).await;
    }
}
