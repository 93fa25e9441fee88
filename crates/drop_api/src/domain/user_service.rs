use crate::domain::SessionMirror;
use common::domain::{
    ApproveNgoInput, DomainError, DomainResult, GetUserInput, ListUsersInput,
    UpdateUserProfileInput, User, UserRepository, UserRole,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Service request for editing a profile; email and role cannot change
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateProfileRequest {
    #[garde(length(min = 1))]
    pub user_id: String,
    #[garde(length(min = 1))]
    pub name: Option<String>,
    #[garde(skip)]
    pub profile_image: Option<String>,
    #[garde(skip)]
    pub location: Option<String>,
    #[garde(skip)]
    pub bio: Option<String>,
}

/// Profiles and admin moderation
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    session: Arc<SessionMirror>,
}

impl UserService {
    pub fn new(user_repository: Arc<dyn UserRepository>, session: Arc<SessionMirror>) -> Self {
        Self {
            user_repository,
            session,
        }
    }

    async fn require_admin(&self, action: &str) -> DomainResult<User> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or_else(|| DomainError::NotAuthenticated(action.to_string()))?;
        if user.role != UserRole::Admin {
            return Err(DomainError::PermissionDenied(format!(
                "only admins can {}",
                action
            )));
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    pub async fn get_profile(&self, input: GetUserInput) -> DomainResult<User> {
        self.user_repository
            .get_user(input.clone())
            .await?
            .ok_or(DomainError::UserNotFound(input.user_id))
    }

    /// Users may edit their own profile; admins may edit any
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn update_profile(&self, request: UpdateProfileRequest) -> DomainResult<User> {
        common::garde::validate_struct(&request)?;

        let editor = self
            .session
            .current_user()
            .await
            .ok_or_else(|| DomainError::NotAuthenticated("update a profile".to_string()))?;
        if editor.id != request.user_id && editor.role != UserRole::Admin {
            return Err(DomainError::PermissionDenied(
                "cannot edit another user's profile".to_string(),
            ));
        }

        let user = self
            .user_repository
            .update_user_profile(UpdateUserProfileInput {
                user_id: request.user_id,
                name: request.name,
                profile_image: request.profile_image,
                location: request.location,
                bio: request.bio,
            })
            .await?;

        debug!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    /// Newest first
    #[instrument(skip(self))]
    pub async fn list_users(&self, input: ListUsersInput) -> DomainResult<Vec<User>> {
        self.require_admin("list users").await?;
        let users = self.user_repository.list_users(input).await?;
        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    pub async fn approve_ngo(&self, input: ApproveNgoInput) -> DomainResult<User> {
        let admin = self.require_admin("approve organizations").await?;
        let user = self.user_repository.approve_ngo(input).await?;
        info!(user_id = %user.id, approved_by = %admin.id, "organization approved");
        Ok(user)
    }
}
