use crate::auth::{AuthSession, AuthUser, SessionEvent};
use crate::domain::DomainResult;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Hosted email/password identity provider.
///
/// Implementations publish a [`SessionEvent`] to every subscriber whenever the
/// session they hold changes, including changes caused by their own calls.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange credentials for a session. Errors carry the provider's message.
    async fn sign_in_with_password(&self, email: &str, password: &str)
        -> DomainResult<AuthSession>;

    /// Create an identity. `None` when the provider created nothing to act on
    /// yet (for example while email confirmation is pending).
    async fn sign_up(&self, email: &str, password: &str) -> DomainResult<Option<AuthUser>>;

    /// Revoke the current session
    async fn sign_out(&self) -> DomainResult<()>;

    /// Session currently held, if any
    async fn current_session(&self) -> DomainResult<Option<AuthSession>>;

    /// Subscribe to session-change notifications
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
