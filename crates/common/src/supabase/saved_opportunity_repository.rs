use crate::domain::{
    DomainError, DomainResult, ListSavedOpportunitiesInput, Opportunity,
    RemoveSavedOpportunityInput, SaveOpportunityInput, SavedOpportunity,
    SavedOpportunityRepository,
};
use crate::supabase::{
    format_instant, read_rows, required_instant, BackendError, OpportunityRow, ResponseExt,
    RestQuery, SupabaseClient, PREFER_HEADER, RETURN_REPRESENTATION,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

pub const SAVED_OPPORTUNITIES_TABLE: &str = "saved_opportunities";

const ENTITY: &str = "saved_opportunity";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOpportunityRow {
    pub id: String,
    pub user_id: String,
    pub opportunity_id: String,
    pub created_at: String,
}

impl TryFrom<SavedOpportunityRow> for SavedOpportunity {
    type Error = DomainError;

    fn try_from(row: SavedOpportunityRow) -> Result<Self, Self::Error> {
        Ok(SavedOpportunity {
            created_at: required_instant(ENTITY, "created_at", &row.created_at)?,
            id: row.id,
            user_id: row.user_id,
            opportunity_id: row.opportunity_id,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SavedWithOpportunityRow {
    opportunities: OpportunityRow,
}

#[derive(Debug, Serialize)]
struct NewSavedOpportunityRow<'a> {
    user_id: &'a str,
    opportunity_id: &'a str,
    created_at: String,
}

/// Supabase implementation of SavedOpportunityRepository trait
#[derive(Clone)]
pub struct SupabaseSavedOpportunityRepository {
    client: SupabaseClient,
}

impl SupabaseSavedOpportunityRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SavedOpportunityRepository for SupabaseSavedOpportunityRepository {
    #[instrument(skip(self), fields(user_id = %input.user_id, opportunity_id = %input.opportunity_id))]
    async fn save_opportunity(
        &self,
        input: SaveOpportunityInput,
    ) -> DomainResult<SavedOpportunity> {
        let payload = NewSavedOpportunityRow {
            user_id: &input.user_id,
            opportunity_id: &input.opportunity_id,
            created_at: format_instant(&Utc::now()),
        };

        let response = self
            .client
            .rest(Method::POST, SAVED_OPPORTUNITIES_TABLE)
            .header(PREFER_HEADER, RETURN_REPRESENTATION)
            .json(&payload)
            .send()
            .await
            .into_backend_result()
            .await
            .map_err(|e: BackendError| {
                if e.is_unique_violation() {
                    DomainError::OpportunityAlreadySaved(
                        input.user_id.clone(),
                        input.opportunity_id.clone(),
                    )
                } else {
                    e.into()
                }
            })?;

        let rows: Vec<SavedOpportunityRow> = response
            .json()
            .await
            .map_err(|e| DomainError::SchemaMismatch(ENTITY.to_string(), e.to_string()))?;

        rows.into_iter()
            .next()
            .map(SavedOpportunity::try_from)
            .transpose()?
            .ok_or_else(|| DomainError::DataAccess("insert returned no bookmark".to_string()))
    }

    #[instrument(skip(self), fields(user_id = %input.user_id, opportunity_id = %input.opportunity_id))]
    async fn remove_saved_opportunity(
        &self,
        input: RemoveSavedOpportunityInput,
    ) -> DomainResult<()> {
        let query = RestQuery::filter()
            .eq("user_id", &input.user_id)
            .eq("opportunity_id", &input.opportunity_id);

        self.client
            .rest(Method::DELETE, SAVED_OPPORTUNITIES_TABLE)
            .query(query.params())
            .send()
            .await
            .into_backend_result()
            .await
            .map_err(DomainError::from)?;

        debug!("bookmark removed from store");
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %input.user_id))]
    async fn list_saved_opportunities(
        &self,
        input: ListSavedOpportunitiesInput,
    ) -> DomainResult<Vec<Opportunity>> {
        let query = RestQuery::select("*,opportunities(*)").eq("user_id", &input.user_id);

        let rows: Vec<SavedWithOpportunityRow> = read_rows(
            self.client
                .rest(Method::GET, SAVED_OPPORTUNITIES_TABLE)
                .query(query.params()),
            ENTITY,
        )
        .await?;

        rows.into_iter()
            .map(|row| Opportunity::try_from(row.opportunities))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saved_row_normalizes() {
        let saved = SavedOpportunity::try_from(SavedOpportunityRow {
            id: "sav-1".to_string(),
            user_id: "user-1".to_string(),
            opportunity_id: "opp-1".to_string(),
            created_at: "2024-03-03".to_string(),
        })
        .unwrap();
        assert_eq!(saved.opportunity_id, "opp-1");
    }

    #[test]
    fn test_insert_payload_shape() {
        let payload = NewSavedOpportunityRow {
            user_id: "user-1",
            opportunity_id: "opp-1",
            created_at: "2024-03-03T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["user_id"], "user-1");
        assert_eq!(json["opportunity_id"], "opp-1");
    }
}
