use crate::domain::{result::DomainResult, Opportunity};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Bookmark joining a user to an opportunity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOpportunity {
    pub id: String,
    pub user_id: String,
    pub opportunity_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOpportunityInput {
    pub user_id: String,
    pub opportunity_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveSavedOpportunityInput {
    pub user_id: String,
    pub opportunity_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListSavedOpportunitiesInput {
    pub user_id: String,
}

/// Repository trait for bookmark storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait SavedOpportunityRepository: Send + Sync {
    async fn save_opportunity(&self, input: SaveOpportunityInput)
        -> DomainResult<SavedOpportunity>;

    /// Remove a bookmark; removing one that does not exist is not an error
    async fn remove_saved_opportunity(&self, input: RemoveSavedOpportunityInput)
        -> DomainResult<()>;

    /// Saved opportunities joined with their full records
    async fn list_saved_opportunities(
        &self,
        input: ListSavedOpportunitiesInput,
    ) -> DomainResult<Vec<Opportunity>>;
}
