use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UserRole {
    Volunteer,
    Ngo,
    Admin,
}

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating the profile row that accompanies a new identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserProfileInput {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    /// Volunteers are approved at registration, NGOs wait for an admin
    pub approved: bool,
}

/// Input for getting a user by ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserInput {
    pub user_id: String,
}

/// Profile fields a user may edit; email, role and creation time are fixed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateUserProfileInput {
    pub user_id: String,
    pub name: Option<String>,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

/// Input for listing users, newest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListUsersInput {
    pub role: Option<UserRole>,
    pub approved: Option<bool>,
}

/// Input for approving an NGO account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveNgoInput {
    pub user_id: String,
}

/// Repository trait for user profile storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the profile row for a freshly registered identity
    async fn create_user_profile(&self, input: CreateUserProfileInput) -> DomainResult<User>;

    /// Get a user by ID
    async fn get_user(&self, input: GetUserInput) -> DomainResult<Option<User>>;

    async fn update_user_profile(&self, input: UpdateUserProfileInput) -> DomainResult<User>;

    async fn list_users(&self, input: ListUsersInput) -> DomainResult<Vec<User>>;

    /// Flip the approval flag of an NGO; fails with `UserNotFound` for other roles
    async fn approve_ngo(&self, input: ApproveNgoInput) -> DomainResult<User>;
}
