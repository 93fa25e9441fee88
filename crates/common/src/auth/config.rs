use crate::domain::UserRole;

/// Decides which designated test addresses may bypass the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestLoginPolicy {
    production: bool,
}

impl TestLoginPolicy {
    pub fn new(production: bool) -> Self {
        Self { production }
    }

    /// All test roles enabled
    pub fn development() -> Self {
        Self::new(false)
    }

    /// Only the admin test login survives in production
    pub fn production() -> Self {
        Self::new(true)
    }

    pub fn is_enabled(&self, role: UserRole) -> bool {
        !self.production || role == UserRole::Admin
    }
}

impl Default for TestLoginPolicy {
    fn default() -> Self {
        Self::production()
    }
}
