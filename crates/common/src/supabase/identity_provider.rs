use crate::auth::{AuthSession, AuthUser, IdentityProvider, SessionEvent};
use crate::domain::{DomainError, DomainResult};
use crate::supabase::{BackendError, ResponseExt, SupabaseClient};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, instrument, warn};

const SESSION_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    email: Option<String>,
}

impl From<GoTrueUser> for AuthUser {
    fn from(user: GoTrueUser) -> Self {
        AuthUser {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GoTrueSession {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
    user: GoTrueUser,
}

impl GoTrueSession {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

/// Signup answers with a session when confirmation is disabled, a bare user
/// while confirmation is pending, or an empty/obfuscated body.
fn signup_user(body: serde_json::Value, now: DateTime<Utc>) -> Option<(AuthUser, Option<AuthSession>)> {
    if body.get("access_token").is_some() {
        let session = serde_json::from_value::<GoTrueSession>(body).ok()?.into_session(now);
        return Some((session.user.clone(), Some(session)));
    }
    if body.get("id").is_some() {
        let user = serde_json::from_value::<GoTrueUser>(body).ok()?;
        return Some((user.into(), None));
    }
    None
}

/// GoTrue-backed implementation of IdentityProvider
pub struct SupabaseIdentityProvider {
    client: SupabaseClient,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SupabaseIdentityProvider {
    pub fn new(client: SupabaseClient) -> Self {
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Self {
            client,
            session: RwLock::new(None),
            events,
        }
    }

    async fn install(&self, session: AuthSession) {
        self.client
            .set_access_token(Some(session.access_token.clone()));
        *self.session.write().await = Some(session.clone());
        // No receivers is fine
        let _ = self.events.send(SessionEvent::SignedIn(session));
    }

    async fn clear(&self) {
        self.client.set_access_token(None);
        *self.session.write().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> DomainResult<AuthSession> {
        let response = self
            .client
            .auth(Method::POST, "token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password })
            .send()
            .await
            .into_backend_result()
            .await
            .map_err(|e: BackendError| DomainError::Authentication(e.message))?;

        let session = response
            .json::<GoTrueSession>()
            .await
            .map_err(|e| DomainError::SchemaMismatch("session".to_string(), e.to_string()))?
            .into_session(Utc::now());

        debug!(user_id = %session.user.id, "signed in");
        self.install(session.clone()).await;
        Ok(session)
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<Option<AuthUser>> {
        let response = self
            .client
            .auth(Method::POST, "signup")
            .json(&Credentials { email, password })
            .send()
            .await
            .into_backend_result()
            .await
            .map_err(|e: BackendError| DomainError::Authentication(e.message))?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| DomainError::SchemaMismatch("signup".to_string(), e.to_string()))?;

        match signup_user(body, Utc::now()) {
            Some((user, session)) => {
                if let Some(session) = session {
                    self.install(session).await;
                }
                debug!(user_id = %user.id, "identity created");
                Ok(Some(user))
            }
            None => {
                debug!("signup returned no identity");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> DomainResult<()> {
        let had_token = self.client.has_access_token();
        let result = if had_token {
            self.client
                .auth(Method::POST, "logout")
                .send()
                .await
                .into_backend_result()
                .await
                .map(|_| ())
        } else {
            Ok(())
        };

        // Local session is dropped even when revocation fails
        self.clear().await;

        result.map_err(|e| {
            warn!(error = %e.message, "remote sign-out failed");
            DomainError::Authentication(e.message)
        })
    }

    async fn current_session(&self) -> DomainResult<Option<AuthSession>> {
        let guard = self.session.read().await;
        let now = Utc::now();
        Ok(guard
            .as_ref()
            .filter(|s| s.expires_at.map_or(true, |at| at > now))
            .cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
