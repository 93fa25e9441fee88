use crate::domain::{
    CreateInterestInput, DomainError, DomainResult, Interest, InterestApplicant,
    InterestOpportunity, InterestRepository, InterestStatus, InterestWithApplicant,
    InterestWithOpportunity, ListOpportunityInterestsInput, ListUserInterestsInput,
    UpdateInterestStatusInput,
};
use crate::supabase::{
    closed_enum, format_instant, required_instant, BackendError, ResponseExt, RestQuery,
    SupabaseClient, PREFER_HEADER, RETURN_REPRESENTATION, read_rows,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const INTERESTS_TABLE: &str = "interests";

const ENTITY: &str = "interest";

/// Raw `interests` row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestRow {
    pub id: String,
    pub user_id: String,
    pub opportunity_id: String,
    pub message: Option<String>,
    pub status: String,
    pub created_at: String,
}

impl TryFrom<InterestRow> for Interest {
    type Error = DomainError;

    fn try_from(row: InterestRow) -> Result<Self, Self::Error> {
        Ok(Interest {
            status: closed_enum(ENTITY, "status", &row.status)?,
            created_at: required_instant(ENTITY, "created_at", &row.created_at)?,
            id: row.id,
            user_id: row.user_id,
            opportunity_id: row.opportunity_id,
            message: row.message.filter(|m| !m.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddedOpportunity {
    id: String,
    title: String,
    organization: String,
}

#[derive(Debug, Deserialize)]
struct InterestWithOpportunityRow {
    #[serde(flatten)]
    interest: InterestRow,
    opportunities: EmbeddedOpportunity,
}

#[derive(Debug, Deserialize)]
struct EmbeddedUser {
    id: String,
    name: String,
    email: String,
    profile_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct InterestWithUserRow {
    #[serde(flatten)]
    interest: InterestRow,
    users: EmbeddedUser,
}

#[derive(Debug, Serialize)]
struct NewInterestRow {
    user_id: String,
    opportunity_id: String,
    message: Option<String>,
    status: String,
    created_at: String,
}

#[derive(Debug, Serialize)]
struct StatusPatch {
    status: String,
}

/// Supabase implementation of InterestRepository trait
#[derive(Clone)]
pub struct SupabaseInterestRepository {
    client: SupabaseClient,
}

impl SupabaseInterestRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InterestRepository for SupabaseInterestRepository {
    #[instrument(skip(self, input), fields(user_id = %input.user_id, opportunity_id = %input.opportunity_id))]
    async fn create_interest(&self, input: CreateInterestInput) -> DomainResult<Interest> {
        let payload = NewInterestRow {
            user_id: input.user_id.clone(),
            opportunity_id: input.opportunity_id.clone(),
            message: input.message.filter(|m| !m.trim().is_empty()),
            status: InterestStatus::Pending.to_string(),
            created_at: format_instant(&Utc::now()),
        };

        let response = self
            .client
            .rest(Method::POST, INTERESTS_TABLE)
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&payload)
            .send()
            .await
            .into_backend_result()
            .await
            .map_err(|e: BackendError| {
                if e.is_unique_violation() {
                    DomainError::InterestAlreadyExists(
                        input.user_id.clone(),
                        input.opportunity_id.clone(),
                    )
                } else {
                    e.into()
                }
            })?;

        let rows: Vec<InterestRow> = response
            .json()
            .await
            .map_err(|e| DomainError::SchemaMismatch(ENTITY.to_string(), e.to_string()))?;

        let interest = rows
            .into_iter()
            .next()
            .map(Interest::try_from)
            .transpose()?
            .ok_or_else(|| DomainError::DataAccess("insert returned no interest".to_string()))?;

        debug!(interest_id = %interest.id, "interest recorded in store");
        Ok(interest)
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    async fn list_user_interests(
        &self,
        input: ListUserInterestsInput,
    ) -> DomainResult<Vec<InterestWithOpportunity>> {
        let query = RestQuery::select("*,opportunities(id,title,organization)")
            .eq("user_id", &input.user_id);

        let rows: Vec<InterestWithOpportunityRow> = read_rows(
            self.client
                .rest(Method::GET, INTERESTS_TABLE)
                .query(query.params()),
            ENTITY,
        )
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(InterestWithOpportunity {
                    interest: Interest::try_from(row.interest)?,
                    opportunity: InterestOpportunity {
                        id: row.opportunities.id,
                        title: row.opportunities.title,
                        organization: row.opportunities.organization,
                    },
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(opportunity_id = %input.opportunity_id))]
    async fn list_opportunity_interests(
        &self,
        input: ListOpportunityInterestsInput,
    ) -> DomainResult<Vec<InterestWithApplicant>> {
        let query = RestQuery::select("*,users(id,name,email,profile_image)")
            .eq("opportunity_id", &input.opportunity_id);

        let rows: Vec<InterestWithUserRow> = read_rows(
            self.client
                .rest(Method::GET, INTERESTS_TABLE)
                .query(query.params()),
            ENTITY,
        )
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(InterestWithApplicant {
                    interest: Interest::try_from(row.interest)?,
                    applicant: InterestApplicant {
                        id: row.users.id,
                        name: row.users.name,
                        email: row.users.email,
                        profile_image: row.users.profile_image,
                    },
                })
            })
            .collect()
    }

    #[instrument(skip(self), fields(interest_id = %input.interest_id, status = %input.status))]
    async fn update_interest_status(
        &self,
        input: UpdateInterestStatusInput,
    ) -> DomainResult<Interest> {
        let query = RestQuery::filter().eq("id", &input.interest_id);

        let rows: Vec<InterestRow> = read_rows(
            self.client
                .rest(Method::PATCH, INTERESTS_TABLE)
                .query(query.params())
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&StatusPatch {
                    status: input.status.to_string(),
                }),
            ENTITY,
        )
        .await?;

        rows.into_iter()
            .next()
            .map(Interest::try_from)
            .transpose()?
            .ok_or(DomainError::InterestNotFound(input.interest_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_opportunity_row_decodes() {
        let row: InterestWithOpportunityRow = serde_json::from_value(serde_json::json!({
            "id": "int-1",
            "user_id": "user-1",
            "opportunity_id": "opp-1",
            "message": "",
            "status": "accepted",
            "created_at": "2024-02-02T10:00:00+00:00",
            "opportunities": { "id": "opp-1", "title": "Tutor", "organization": "Read Together" }
        }))
        .unwrap();

        let interest = Interest::try_from(row.interest).unwrap();
        assert_eq!(interest.status, InterestStatus::Accepted);
        assert_eq!(interest.message, None);
        assert_eq!(row.opportunities.title, "Tutor");
    }

    #[test]
    fn test_unknown_status_is_schema_mismatch() {
        let row = InterestRow {
            id: "int-1".to_string(),
            user_id: "user-1".to_string(),
            opportunity_id: "opp-1".to_string(),
            message: None,
            status: "maybe".to_string(),
            created_at: "2024-02-02T10:00:00+00:00".to_string(),
        };
        assert!(matches!(
            Interest::try_from(row),
            Err(DomainError::SchemaMismatch(_, _))
        ));
    }
}
