use chrono::{DateTime, Utc};
use common::domain::{
    CreateOpportunityInput, DeleteOpportunityInput, DomainError, DomainResult,
    GetOpportunityInput, ListOpportunitiesInput, Opportunity, OpportunityCategory,
    OpportunityRepository, OpportunityStatus, OpportunityType, OpportunityUrgency,
    UpdateOpportunityInput,
};
use common::garde::{ensure_chronological, validate_struct};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Service request for posting a new opportunity
#[derive(Debug, Clone, Validate)]
pub struct CreateOpportunityRequest {
    #[garde(length(min = 1))]
    pub title: String,
    #[garde(length(min = 1))]
    pub description: String,
    #[garde(length(min = 1))]
    pub organization: String,
    #[garde(length(min = 1))]
    pub organization_id: String,
    #[garde(skip)]
    pub organization_logo: Option<String>,
    #[garde(skip)]
    pub opportunity_type: OpportunityType,
    #[garde(skip)]
    pub category: OpportunityCategory,
    #[garde(length(min = 1))]
    pub location: String,
    #[garde(skip)]
    pub is_remote: bool,
    #[garde(skip)]
    pub start_date: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub end_date: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub urgency: OpportunityUrgency,
    #[garde(skip)]
    pub status: Option<OpportunityStatus>,
    /// Comma-separated, as typed into the form
    #[garde(skip)]
    pub required_skills: Option<String>,
    /// Comma-separated, as typed into the form
    #[garde(skip)]
    pub items: Option<String>,
    #[garde(email)]
    pub contact_email: String,
    #[garde(skip)]
    pub contact_phone: Option<String>,
}

/// Service request for editing an opportunity; unset fields are left alone
#[derive(Debug, Clone, Default, Validate)]
pub struct UpdateOpportunityRequest {
    #[garde(length(min = 1))]
    pub opportunity_id: String,
    #[garde(length(min = 1))]
    pub title: Option<String>,
    #[garde(length(min = 1))]
    pub description: Option<String>,
    #[garde(length(min = 1))]
    pub location: Option<String>,
    #[garde(skip)]
    pub organization_logo: Option<String>,
    #[garde(skip)]
    pub opportunity_type: Option<OpportunityType>,
    #[garde(skip)]
    pub category: Option<OpportunityCategory>,
    #[garde(skip)]
    pub is_remote: Option<bool>,
    #[garde(skip)]
    pub start_date: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub end_date: Option<DateTime<Utc>>,
    #[garde(skip)]
    pub urgency: Option<OpportunityUrgency>,
    #[garde(skip)]
    pub status: Option<OpportunityStatus>,
    #[garde(skip)]
    pub required_skills: Option<String>,
    #[garde(skip)]
    pub items: Option<String>,
    #[garde(email)]
    pub contact_email: Option<String>,
    #[garde(skip)]
    pub contact_phone: Option<String>,
}

/// Split a comma-separated form field into trimmed, non-empty entries
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_optional_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(parse_list).filter(|list| !list.is_empty())
}

fn require_id(opportunity_id: &str) -> DomainResult<()> {
    if opportunity_id.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "opportunity_id: cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Domain service for fetching and managing opportunities
pub struct OpportunityService {
    opportunity_repository: Arc<dyn OpportunityRepository>,
}

impl OpportunityService {
    pub fn new(opportunity_repository: Arc<dyn OpportunityRepository>) -> Self {
        Self {
            opportunity_repository,
        }
    }

    /// Active opportunities, newest first, narrowed by server-side predicates
    #[instrument(skip(self, input))]
    pub async fn fetch_all(&self, input: ListOpportunitiesInput) -> DomainResult<Vec<Opportunity>> {
        let opportunities = self.opportunity_repository.list_opportunities(input).await?;
        debug!(count = opportunities.len(), "fetched opportunities");
        Ok(opportunities)
    }

    /// A missing record is `Ok(None)`
    #[instrument(skip(self), fields(opportunity_id = %input.opportunity_id))]
    pub async fn fetch_by_id(&self, input: GetOpportunityInput) -> DomainResult<Option<Opportunity>> {
        require_id(&input.opportunity_id)?;
        self.opportunity_repository.get_opportunity(input).await
    }

    #[instrument(skip(self, request), fields(organization_id = %request.organization_id, title = %request.title))]
    pub async fn create(&self, request: CreateOpportunityRequest) -> DomainResult<Opportunity> {
        validate_struct(&request)?;
        ensure_chronological(request.start_date, request.end_date)?;

        let input = CreateOpportunityInput {
            required_skills: parse_optional_list(request.required_skills.as_deref()),
            items: parse_optional_list(request.items.as_deref()),
            status: request.status.unwrap_or_default(),
            title: request.title,
            description: request.description,
            organization: request.organization,
            organization_id: request.organization_id,
            organization_logo: request.organization_logo,
            opportunity_type: request.opportunity_type,
            category: request.category,
            location: request.location,
            is_remote: request.is_remote,
            start_date: request.start_date,
            end_date: request.end_date,
            urgency: request.urgency,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
        };

        let opportunity = self.opportunity_repository.create_opportunity(input).await?;
        debug!(opportunity_id = %opportunity.id, "opportunity created");
        Ok(opportunity)
    }

    /// Partial update. When the patch moves only one date, the other one is
    /// read from the stored record so the pair stays in order.
    #[instrument(skip(self, request), fields(opportunity_id = %request.opportunity_id))]
    pub async fn update(&self, request: UpdateOpportunityRequest) -> DomainResult<Opportunity> {
        validate_struct(&request)?;

        let (start, end) = match (request.start_date, request.end_date) {
            (Some(_), None) | (None, Some(_)) => {
                let current = self
                    .opportunity_repository
                    .get_opportunity(GetOpportunityInput {
                        opportunity_id: request.opportunity_id.clone(),
                    })
                    .await?
                    .ok_or_else(|| DomainError::OpportunityNotFound(request.opportunity_id.clone()))?;
                (
                    request.start_date.or(current.start_date),
                    request.end_date.or(current.end_date),
                )
            }
            dates => dates,
        };
        ensure_chronological(start, end)?;

        let input = UpdateOpportunityInput {
            required_skills: request.required_skills.as_deref().map(parse_list),
            items: request.items.as_deref().map(parse_list),
            opportunity_id: request.opportunity_id,
            title: request.title,
            description: request.description,
            organization: None,
            organization_logo: request.organization_logo,
            opportunity_type: request.opportunity_type,
            category: request.category,
            location: request.location,
            is_remote: request.is_remote,
            start_date: request.start_date,
            end_date: request.end_date,
            urgency: request.urgency,
            status: request.status,
            contact_email: request.contact_email,
            contact_phone: request.contact_phone,
        };

        let opportunity = self.opportunity_repository.update_opportunity(input).await?;
        debug!(opportunity_id = %opportunity.id, "opportunity updated");
        Ok(opportunity)
    }

    /// Hard delete
    #[instrument(skip(self), fields(opportunity_id = %input.opportunity_id))]
    pub async fn delete(&self, input: DeleteOpportunityInput) -> DomainResult<()> {
        require_id(&input.opportunity_id)?;
        self.opportunity_repository.delete_opportunity(input).await?;
        debug!("opportunity deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::domain::MockOpportunityRepository;

    fn create_request() -> CreateOpportunityRequest {
        CreateOpportunityRequest {
            title: "Food Bank Sorting".to_string(),
            description: "Sort donated groceries".to_string(),
            organization: "City Food Bank".to_string(),
            organization_id: "org-7".to_string(),
            organization_logo: None,
            opportunity_type: OpportunityType::Volunteer,
            category: OpportunityCategory::Poverty,
            location: "Seattle, WA".to_string(),
            is_remote: false,
            start_date: None,
            end_date: None,
            urgency: OpportunityUrgency::Medium,
            status: None,
            required_skills: Some(" lifting, , teamwork ".to_string()),
            items: None,
            contact_email: "help@cityfoodbank.org".to_string(),
            contact_phone: None,
        }
    }

    fn stored(input: &CreateOpportunityInput) -> Opportunity {
        let now = Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap();
        Opportunity {
            id: "opp-new".to_string(),
            title: input.title.clone(),
            description: input.description.clone(),
            organization: input.organization.clone(),
            organization_id: input.organization_id.clone(),
            organization_logo: input.organization_logo.clone(),
            opportunity_type: input.opportunity_type,
            category: input.category,
            location: input.location.clone(),
            is_remote: input.is_remote,
            start_date: input.start_date,
            end_date: input.end_date,
            urgency: input.urgency,
            status: input.status,
            required_skills: input.required_skills.clone(),
            items: input.items.clone(),
            contact_email: input.contact_email.clone(),
            contact_phone: input.contact_phone.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(parse_list(" , ,"), Vec::<String>::new());
        assert_eq!(parse_optional_list(Some(" , ")), None);
        assert_eq!(parse_optional_list(None), None);
    }

    #[tokio::test]
    async fn test_create_defaults_status_and_splits_skills() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_create_opportunity()
            .withf(|input| {
                input.status == OpportunityStatus::Active
                    && input.required_skills
                        == Some(vec!["lifting".to_string(), "teamwork".to_string()])
                    && input.items.is_none()
            })
            .times(1)
            .returning(|input| Ok(stored(&input)));

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service.create(create_request()).await.unwrap();

        assert_eq!(result.id, "opp-new");
        assert_eq!(result.status, OpportunityStatus::Active);
    }

    #[tokio::test]
    async fn test_create_rejects_missing_fields_without_request() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo.expect_create_opportunity().times(0);

        let service = OpportunityService::new(Arc::new(mock_repo));
        let request = CreateOpportunityRequest {
            title: String::new(),
            contact_email: "not-an-email".to_string(),
            ..create_request()
        };

        match service.create(request).await {
            Err(DomainError::ValidationError(msg)) => {
                assert!(msg.contains("title"));
                assert!(msg.contains("contact_email"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_end_before_start() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo.expect_create_opportunity().times(0);

        let service = OpportunityService::new(Arc::new(mock_repo));
        let request = CreateOpportunityRequest {
            start_date: Some(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
            ..create_request()
        };

        assert!(matches!(
            service.create(request).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_all_propagates_store_error() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_list_opportunities()
            .times(1)
            .return_once(|_| Err(DomainError::DataAccess("connection refused".to_string())));

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service.fetch_all(ListOpportunitiesInput::default()).await;

        assert!(matches!(result, Err(DomainError::DataAccess(_))));
    }

    #[tokio::test]
    async fn test_fetch_by_id_not_found_is_none() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_get_opportunity()
            .withf(|input| input.opportunity_id == "missing")
            .times(1)
            .return_once(|_| Ok(None));

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service
            .fetch_by_id(GetOpportunityInput {
                opportunity_id: "missing".to_string(),
            })
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_sends_only_provided_fields() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_update_opportunity()
            .withf(|input| {
                input.opportunity_id == "opp-1"
                    && input.status == Some(OpportunityStatus::Completed)
                    && input.title.is_none()
                    && input.required_skills.is_none()
            })
            .times(1)
            .returning(|input| {
                let mut opp = stored(&CreateOpportunityInput {
                    title: "Existing".to_string(),
                    description: "Existing".to_string(),
                    organization: "Org".to_string(),
                    organization_id: "org-1".to_string(),
                    organization_logo: None,
                    opportunity_type: OpportunityType::Volunteer,
                    category: OpportunityCategory::Other,
                    location: "Here".to_string(),
                    is_remote: false,
                    start_date: None,
                    end_date: None,
                    urgency: OpportunityUrgency::Low,
                    status: OpportunityStatus::Active,
                    required_skills: None,
                    items: None,
                    contact_email: "org@example.org".to_string(),
                    contact_phone: None,
                });
                opp.id = input.opportunity_id;
                opp.status = input.status.unwrap_or_default();
                Ok(opp)
            });

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service
            .update(UpdateOpportunityRequest {
                opportunity_id: "opp-1".to_string(),
                status: Some(OpportunityStatus::Completed),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.status, OpportunityStatus::Completed);
    }

    fn existing_with_start(start: DateTime<Utc>) -> Opportunity {
        let mut opp = stored(&CreateOpportunityInput {
            title: "Existing".to_string(),
            description: "Existing".to_string(),
            organization: "Org".to_string(),
            organization_id: "org-1".to_string(),
            organization_logo: None,
            opportunity_type: OpportunityType::Volunteer,
            category: OpportunityCategory::Other,
            location: "Here".to_string(),
            is_remote: false,
            start_date: Some(start),
            end_date: None,
            urgency: OpportunityUrgency::Low,
            status: OpportunityStatus::Active,
            required_skills: None,
            items: None,
            contact_email: "org@example.org".to_string(),
            contact_phone: None,
        });
        opp.id = "opp-1".to_string();
        opp
    }

    #[tokio::test]
    async fn test_update_end_only_checked_against_stored_start() {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_get_opportunity()
            .withf(|input| input.opportunity_id == "opp-1")
            .times(1)
            .return_once(move |_| Ok(Some(existing_with_start(start))));
        mock_repo.expect_update_opportunity().times(0);

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service
            .update(UpdateOpportunityRequest {
                opportunity_id: "opp-1".to_string(),
                end_date: Some(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()),
                ..Default::default()
            })
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_end_only_after_stored_start_is_sent() {
        let start = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 12, 0, 0, 0).unwrap();
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo
            .expect_get_opportunity()
            .times(1)
            .return_once(move |_| Ok(Some(existing_with_start(start))));
        mock_repo
            .expect_update_opportunity()
            .withf(move |input| input.end_date == Some(end) && input.start_date.is_none())
            .times(1)
            .returning(move |_| {
                let mut opp = existing_with_start(start);
                opp.end_date = Some(end);
                Ok(opp)
            });

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service
            .update(UpdateOpportunityRequest {
                opportunity_id: "opp-1".to_string(),
                end_date: Some(end),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.end_date, Some(end));
    }

    #[tokio::test]
    async fn test_delete_requires_id() {
        let mut mock_repo = MockOpportunityRepository::new();
        mock_repo.expect_delete_opportunity().times(0);

        let service = OpportunityService::new(Arc::new(mock_repo));
        let result = service
            .delete(DeleteOpportunityInput {
                opportunity_id: "  ".to_string(),
            })
            .await;

        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }
}
