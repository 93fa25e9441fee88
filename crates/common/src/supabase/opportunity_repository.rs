use crate::domain::{
    CreateOpportunityInput, DeleteOpportunityInput, DomainError, DomainResult,
    GetOpportunityInput, ListOpportunitiesInput, Opportunity, OpportunityRepository,
    OpportunityStatus, UpdateOpportunityInput,
};
use crate::supabase::{
    read_rows, NewOpportunityRow, OpportunityPatch, OpportunityRow, RestQuery, SupabaseClient,
    PREFER_HEADER, RETURN_REPRESENTATION,
};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use tracing::{debug, instrument};

pub const OPPORTUNITIES_TABLE: &str = "opportunities";

/// Query for active opportunities, newest first, narrowed by the server-side predicates
pub fn list_opportunities_query(input: &ListOpportunitiesInput) -> RestQuery {
    let mut query = RestQuery::select("*")
        .eq("status", OpportunityStatus::Active)
        .order_desc("created_at");

    if let Some(category) = input.category {
        query = query.eq("category", category);
    }
    if let Some(opportunity_type) = input.opportunity_type {
        query = query.eq("type", opportunity_type);
    }
    if let Some(location) = input.location.as_deref().filter(|l| !l.is_empty()) {
        query = query.ilike_contains("location", location);
    }
    if let Some(is_remote) = input.is_remote {
        query = query.eq("is_remote", is_remote);
    }
    if let Some(urgency) = input.urgency {
        query = query.eq("urgency", urgency);
    }
    if let Some(organization_id) = input.organization_id.as_deref() {
        query = query.eq("organization_id", organization_id);
    }

    query
}

fn normalize(rows: Vec<OpportunityRow>) -> DomainResult<Vec<Opportunity>> {
    rows.into_iter().map(Opportunity::try_from).collect()
}

/// Supabase implementation of OpportunityRepository trait
#[derive(Clone)]
pub struct SupabaseOpportunityRepository {
    client: SupabaseClient,
}

impl SupabaseOpportunityRepository {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OpportunityRepository for SupabaseOpportunityRepository {
    #[instrument(skip(self, input))]
    async fn list_opportunities(
        &self,
        input: ListOpportunitiesInput,
    ) -> DomainResult<Vec<Opportunity>> {
        let query = list_opportunities_query(&input);

        let rows: Vec<OpportunityRow> = read_rows(
            self.client
                .rest(Method::GET, OPPORTUNITIES_TABLE)
                .query(query.params()),
            "opportunity",
        )
        .await?;

        debug!(count = rows.len(), "fetched opportunity rows");
        normalize(rows)
    }

    #[instrument(skip(self), fields(opportunity_id = %input.opportunity_id))]
    async fn get_opportunity(
        &self,
        input: GetOpportunityInput,
    ) -> DomainResult<Option<Opportunity>> {
        let query = RestQuery::select("*")
            .eq("id", &input.opportunity_id)
            .limit(1);

        let rows: Vec<OpportunityRow> = read_rows(
            self.client
                .rest(Method::GET, OPPORTUNITIES_TABLE)
                .query(query.params()),
            "opportunity",
        )
        .await?;

        Ok(normalize(rows)?.into_iter().next())
    }

    #[instrument(skip(self, input), fields(organization_id = %input.organization_id))]
    async fn create_opportunity(&self, input: CreateOpportunityInput) -> DomainResult<Opportunity> {
        let payload = NewOpportunityRow::new(input, Utc::now());

        let rows: Vec<OpportunityRow> = read_rows(
            self.client
                .rest(Method::POST, OPPORTUNITIES_TABLE)
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&payload),
            "opportunity",
        )
        .await?;

        let opportunity = normalize(rows)?.into_iter().next().ok_or_else(|| {
            DomainError::DataAccess("insert returned no opportunity".to_string())
        })?;

        debug!(opportunity_id = %opportunity.id, "opportunity created in store");
        Ok(opportunity)
    }

    #[instrument(skip(self, input), fields(opportunity_id = %input.opportunity_id))]
    async fn update_opportunity(&self, input: UpdateOpportunityInput) -> DomainResult<Opportunity> {
        let payload = OpportunityPatch::new(&input, Utc::now());
        let query = RestQuery::filter().eq("id", &input.opportunity_id);

        let rows: Vec<OpportunityRow> = read_rows(
            self.client
                .rest(Method::PATCH, OPPORTUNITIES_TABLE)
                .query(query.params())
                .header(PREFER_HEADER, RETURN_REPRESENTATION)
                .json(&payload),
            "opportunity",
        )
        .await?;

        normalize(rows)?
            .into_iter()
            .next()
            .ok_or(DomainError::OpportunityNotFound(input.opportunity_id))
    }

    #[instrument(skip(self), fields(opportunity_id = %input.opportunity_id))]
    async fn delete_opportunity(&self, input: DeleteOpportunityInput) -> DomainResult<()> {
        let query = RestQuery::filter().eq("id", &input.opportunity_id);

        let rows: Vec<OpportunityRow> = read_rows(
            self.client
                .rest(Method::DELETE, OPPORTUNITIES_TABLE)
                .query(query.params())
                .header(PREFER_HEADER, RETURN_REPRESENTATION),
            "opportunity",
        )
        .await?;

        if rows.is_empty() {
            return Err(DomainError::OpportunityNotFound(input.opportunity_id));
        }

        debug!(opportunity_id = %input.opportunity_id, "opportunity deleted from store");
        Ok(())
    }
}
