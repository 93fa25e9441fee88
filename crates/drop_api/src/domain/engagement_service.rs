use crate::domain::SessionMirror;
use common::domain::{
    CreateInterestInput, DomainError, DomainResult, Interest, InterestRepository, InterestStatus,
    InterestWithApplicant, InterestWithOpportunity, ListOpportunityInterestsInput,
    ListSavedOpportunitiesInput, ListUserInterestsInput, Opportunity,
    RemoveSavedOpportunityInput, SaveOpportunityInput, SavedOpportunity,
    SavedOpportunityRepository, UpdateInterestStatusInput, User, UserRole,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Service request for a volunteer's interest in an opportunity
#[derive(Debug, Clone, Validate)]
pub struct ExpressInterestRequest {
    #[garde(length(min = 1))]
    pub opportunity_id: String,
    #[garde(skip)]
    pub message: Option<String>,
}

/// Service request for an organization's answer to an interest
#[derive(Debug, Clone, Validate)]
pub struct RespondToInterestRequest {
    #[garde(length(min = 1))]
    pub interest_id: String,
    #[garde(skip)]
    pub status: InterestStatus,
}

/// Bookmarks and interests of the signed-in user
pub struct EngagementService {
    saved_opportunity_repository: Arc<dyn SavedOpportunityRepository>,
    interest_repository: Arc<dyn InterestRepository>,
    session: Arc<SessionMirror>,
}

impl EngagementService {
    pub fn new(
        saved_opportunity_repository: Arc<dyn SavedOpportunityRepository>,
        interest_repository: Arc<dyn InterestRepository>,
        session: Arc<SessionMirror>,
    ) -> Self {
        Self {
            saved_opportunity_repository,
            interest_repository,
            session,
        }
    }

    async fn require_user(&self, action: &str) -> DomainResult<User> {
        self.session
            .current_user()
            .await
            .ok_or_else(|| DomainError::NotAuthenticated(action.to_string()))
    }

    async fn require_organization(&self, action: &str) -> DomainResult<User> {
        let user = self.require_user(action).await?;
        match user.role {
            UserRole::Ngo | UserRole::Admin => Ok(user),
            UserRole::Volunteer => Err(DomainError::PermissionDenied(format!(
                "only organizations can {}",
                action
            ))),
        }
    }

    #[instrument(skip(self))]
    pub async fn saved_for_user(&self) -> DomainResult<Vec<Opportunity>> {
        let user = self.require_user("view saved opportunities").await?;
        let saved = self
            .saved_opportunity_repository
            .list_saved_opportunities(ListSavedOpportunitiesInput { user_id: user.id })
            .await?;
        debug!(count = saved.len(), "listed saved opportunities");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn save(&self, opportunity_id: &str) -> DomainResult<SavedOpportunity> {
        let user = self.require_user("save an opportunity").await?;
        self.saved_opportunity_repository
            .save_opportunity(SaveOpportunityInput {
                user_id: user.id,
                opportunity_id: opportunity_id.to_string(),
            })
            .await
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, opportunity_id: &str) -> DomainResult<()> {
        let user = self.require_user("remove a saved opportunity").await?;
        self.saved_opportunity_repository
            .remove_saved_opportunity(RemoveSavedOpportunityInput {
                user_id: user.id,
                opportunity_id: opportunity_id.to_string(),
            })
            .await
    }

    #[instrument(skip(self, request), fields(opportunity_id = %request.opportunity_id))]
    pub async fn express_interest(&self, request: ExpressInterestRequest) -> DomainResult<Interest> {
        common::garde::validate_struct(&request)?;

        let user = self.require_user("express interest").await?;
        if user.role != UserRole::Volunteer {
            return Err(DomainError::PermissionDenied(
                "only volunteers can express interest".to_string(),
            ));
        }

        let interest = self
            .interest_repository
            .create_interest(CreateInterestInput {
                user_id: user.id,
                opportunity_id: request.opportunity_id,
                message: request.message,
            })
            .await?;

        debug!(interest_id = %interest.id, "interest submitted");
        Ok(interest)
    }

    #[instrument(skip(self))]
    pub async fn interests_for_user(&self) -> DomainResult<Vec<InterestWithOpportunity>> {
        let user = self.require_user("view your applications").await?;
        self.interest_repository
            .list_user_interests(ListUserInterestsInput { user_id: user.id })
            .await
    }

    #[instrument(skip(self))]
    pub async fn interests_for_opportunity(
        &self,
        opportunity_id: &str,
    ) -> DomainResult<Vec<InterestWithApplicant>> {
        self.require_organization("view applications").await?;
        self.interest_repository
            .list_opportunity_interests(ListOpportunityInterestsInput {
                opportunity_id: opportunity_id.to_string(),
            })
            .await
    }

    /// Accept or decline; an interest cannot be moved back to pending
    #[instrument(skip(self, request), fields(interest_id = %request.interest_id, status = %request.status))]
    pub async fn respond(&self, request: RespondToInterestRequest) -> DomainResult<Interest> {
        common::garde::validate_struct(&request)?;
        if request.status == InterestStatus::Pending {
            return Err(DomainError::ValidationError(
                "status: must be accepted or declined".to_string(),
            ));
        }

        self.require_organization("respond to applications").await?;

        let interest = self
            .interest_repository
            .update_interest_status(UpdateInterestStatusInput {
                interest_id: request.interest_id,
                status: request.status,
            })
            .await?;

        debug!(interest_id = %interest.id, status = %interest.status, "interest answered");
        Ok(interest)
    }
}
