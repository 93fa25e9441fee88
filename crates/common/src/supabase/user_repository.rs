use crate::domain::{
    ApproveNgoInput, CreateUserProfileInput, DomainError, DomainResult, GetUserInput,
    ListUsersInput, UpdateUserProfileInput, User, UserRepository, UserRole,
};
use crate::supabase::{
    closed_enum, format_instant, read_rows, required_instant, RestQuery, SupabaseClient,
    PREFER_HEADER, RETURN_REPRESENTATION,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const USERS_TABLE: &str = "users";

const ENTITY: &str = "user";

/// Raw `users` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub profile_image: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub approved: Option<bool>,
}

impl TryFrom<UserRow> for User {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            role: closed_enum(ENTITY, "role", &row.role)?,
            created_at: required_instant(ENTITY, "created_at", &row.created_at)?,
            id: row.id,
            name: row.name,
            email: row.email,
            // Empty strings count as unset
            profile_image: row.profile_image.filter(|s| !s.is_empty()),
            location: row.location.filter(|s| !s.is_empty()),
            bio: row.bio.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Serialize)]
struct NewUserRow {
    id: String,
    name: String,
    email: String,
    role: String,
    created_at: String,
    approved: bool,
}

#[derive(Debug, Default, Serialize)]
struct UserProfilePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bio: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApprovalPatch {
    approved: bool,
}

fn first_user(rows: Vec<UserRow>) -> DomainResult<Option<User>> {
    rows.into_iter().next().map(User::try_from).transpose()
}

/// Supabase implementation of UserRepository trait
#[derive(Clone)]
pub struct SupabaseUserRepository {
    client: SupabaseClient,
}

impl SupabaseUserRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl UserRepository for SupabaseUserRepository {
    #[instrument(skip(self, input), fields(user_id = %input.id, role = %input.role))]
    async fn create_user_profile(&self, input: CreateUserProfileInput) -> DomainResult<User> {
        let payload = NewUserRow {
            id: input.id,
            name: input.name,
            email: input.email,
            role: input.role.to_string(),
            created_at: format_instant(&Utc::now()),
            approved: input.approved,
        };

        let rows: Vec<UserRow> = read_rows(
            self.client
                .rest(Method::POST, USERS_TABLE)
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&payload),
            ENTITY,
        )
        .await?;

        let user = first_user(rows)?
            .ok_or_else(|| DomainError::DataAccess("insert returned no user".to_string()))?;

        debug!(user_id = %user.id, "user profile created in store");
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    async fn get_user(&self, input: GetUserInput) -> DomainResult<Option<User>> {
        let query = RestQuery::select("*").eq("id", &input.user_id).limit(1);

        let rows: Vec<UserRow> = read_rows(
            self.client
                .rest(Method::GET, USERS_TABLE)
                .query(query.params()),
            ENTITY,
        )
        .await?;

        first_user(rows)
    }

    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    async fn update_user_profile(&self, input: UpdateUserProfileInput) -> DomainResult<User> {
        let payload = UserProfilePatch {
            name: input.name,
            profile_image: input.profile_image,
            location: input.location,
            bio: input.bio,
        };
        let query = RestQuery::filter().eq("id", &input.user_id);

        let rows: Vec<UserRow> = read_rows(
            self.client
                .rest(Method::PATCH, USERS_TABLE)
                .query(query.params())
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&payload),
            ENTITY,
        )
        .await?;

        first_user(rows)?.ok_or(DomainError::UserNotFound(input.user_id))
    }

    #[instrument(skip(self, input))]
    async fn list_users(&self, input: ListUsersInput) -> DomainResult<Vec<User>> {
        let mut query = RestQuery::select("*").order_desc("created_at");
        if let Some(role) = input.role {
            query = query.eq("role", role);
        }
        if let Some(approved) = input.approved {
            query = query.eq("approved", approved);
        }

        let rows: Vec<UserRow> = read_rows(
            self.client
                .rest(Method::GET, USERS_TABLE)
                .query(query.params()),
            ENTITY,
        )
        .await?;

        debug!(count = rows.len(), "fetched user rows");
        rows.into_iter().map(User::try_from).collect()
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    async fn approve_ngo(&self, input: ApproveNgoInput) -> DomainResult<User> {
        let query = RestQuery::filter()
            .eq("id", &input.user_id)
            .eq("role", UserRole::Ngo);

        let rows: Vec<UserRow> = read_rows(
            self.client
                .rest(Method::PATCH, USERS_TABLE)
                .query(query.params())
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&ApprovalPatch { approved: true }),
            ENTITY,
        )
        .await?;

        first_user(rows)?.ok_or(DomainError::UserNotFound(input.user_id))
    }
}
