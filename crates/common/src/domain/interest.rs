use crate::domain::result::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterestStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

/// A volunteer's expression of interest in an opportunity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
    pub id: String,
    pub user_id: String,
    pub opportunity_id: String,
    pub message: Option<String>,
    pub status: InterestStatus,
    pub created_at: DateTime<Utc>,
}

/// Opportunity fields embedded alongside a user's interests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestOpportunity {
    pub id: String,
    pub title: String,
    pub organization: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestWithOpportunity {
    pub interest: Interest,
    pub opportunity: InterestOpportunity,
}

/// Applicant fields embedded alongside an opportunity's interests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestApplicant {
    pub id: String,
    pub name: String,
    pub email: String,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestWithApplicant {
    pub interest: Interest,
    pub applicant: InterestApplicant,
}

/// Input for recording a new interest; status starts at pending
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInterestInput {
    pub user_id: String,
    pub opportunity_id: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUserInterestsInput {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOpportunityInterestsInput {
    pub opportunity_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInterestStatusInput {
    pub interest_id: String,
    pub status: InterestStatus,
}

/// Repository trait for interest storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait InterestRepository: Send + Sync {
    async fn create_interest(&self, input: CreateInterestInput) -> DomainResult<Interest>;

    async fn list_user_interests(
        &self,
        input: ListUserInterestsInput,
    ) -> DomainResult<Vec<InterestWithOpportunity>>;

    async fn list_opportunity_interests(
        &self,
        input: ListOpportunityInterestsInput,
    ) -> DomainResult<Vec<InterestWithApplicant>>;

    async fn update_interest_status(&self, input: UpdateInterestStatusInput)
        -> DomainResult<Interest>;
}
