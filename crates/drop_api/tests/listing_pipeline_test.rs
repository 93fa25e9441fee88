use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::domain::{
    CreateOpportunityInput, DeleteOpportunityInput, DomainError, DomainResult,
    GetOpportunityInput, ListOpportunitiesInput, Opportunity, OpportunityCategory,
    OpportunityRepository, OpportunityUrgency, UpdateOpportunityInput,
};
use common::supabase::OpportunityRow;
use drop_api::domain::{
    FilterSpec, ListingLoader, ListingSource, ListingView, LoadOutcome, OpportunityService,
    FALLBACK_OPPORTUNITY_COUNT,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

fn raw_rows() -> serde_json::Value {
    json!([
        {
            "id": "opp-river",
            "title": "River Restoration",
            "description": "Plant native willows along the creek",
            "organization": "Watershed Council",
            "organization_id": "org-ws",
            "organization_logo": null,
            "type": "volunteer",
            "category": "environment",
            "location": "Boulder, CO",
            "is_remote": false,
            "start_date": null,
            "end_date": null,
            "urgency": "high",
            "status": "active",
            "required_skills": ["Shovel work"],
            "items": null,
            "contact_email": "crew@watershed.org",
            "contact_phone": null,
            "created_at": "2023-11-20T10:00:00+00:00",
            "updated_at": "2023-11-20T10:00:00+00:00"
        },
        {
            "id": "opp-clinic",
            "title": "Clinic Intake Volunteer",
            "description": "Welcome patients at the free clinic",
            "organization": "Open Door Clinic",
            "organization_id": "org-od",
            "organization_logo": null,
            "type": "volunteer",
            "category": "health",
            "location": "Boulder, CO",
            "is_remote": false,
            "start_date": "2022-12-01",
            "end_date": "2023-01-01",
            "urgency": "medium",
            "status": "active",
            "required_skills": null,
            "items": null,
            "contact_email": "staff@opendoor.org",
            "contact_phone": "303-555-0100",
            "created_at": "2022-11-01T09:00:00Z",
            "updated_at": "2022-11-02T09:00:00Z"
        },
        {
            "id": "opp-books",
            "title": "Book Donations",
            "description": "Gently used picture books for the reading room",
            "organization": "Little Readers",
            "organization_id": "org-lr",
            "organization_logo": "https://cdn.example.org/lr.png",
            "type": "donation",
            "category": "education",
            "location": "Remote",
            "is_remote": true,
            "start_date": "2024-03-15T00:00:00Z",
            "end_date": "not a date",
            "urgency": "low",
            "status": "active",
            "required_skills": null,
            "items": ["Picture books"],
            "contact_email": "books@littlereaders.org",
            "contact_phone": null,
            "created_at": "2023-12-01T12:00:00Z",
            "updated_at": "2023-12-01T12:00:00Z"
        }
    ])
}

fn normalized() -> Vec<Opportunity> {
    let rows: Vec<OpportunityRow> = serde_json::from_value(raw_rows()).unwrap();
    rows.into_iter()
        .map(|row| Opportunity::try_from(row).unwrap())
        .collect()
}

/// Serves a fixed listing; optionally holds the first list call until released
struct StubOpportunityRepository {
    opportunities: Vec<Opportunity>,
    fail: bool,
    calls: AtomicUsize,
    first_call_started: Notify,
    release_first_call: Option<Notify>,
}

impl StubOpportunityRepository {
    fn serving(opportunities: Vec<Opportunity>) -> Self {
        Self {
            opportunities,
            fail: false,
            calls: AtomicUsize::new(0),
            first_call_started: Notify::new(),
            release_first_call: None,
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::serving(Vec::new())
        }
    }

    fn gated(opportunities: Vec<Opportunity>) -> Self {
        Self {
            release_first_call: Some(Notify::new()),
            ..Self::serving(opportunities)
        }
    }
}

#[async_trait]
impl OpportunityRepository for StubOpportunityRepository {
    async fn list_opportunities(
        &self,
        _input: ListOpportunitiesInput,
    ) -> DomainResult<Vec<Opportunity>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            self.first_call_started.notify_one();
            if let Some(gate) = &self.release_first_call {
                gate.notified().await;
            }
        }
        if self.fail {
            return Err(DomainError::DataAccess("TypeError: Failed to fetch".to_string()));
        }
        Ok(self.opportunities.clone())
    }

    async fn get_opportunity(
        &self,
        input: GetOpportunityInput,
    ) -> DomainResult<Option<Opportunity>> {
        Ok(self
            .opportunities
            .iter()
            .find(|o| o.id == input.opportunity_id)
            .cloned())
    }

    async fn create_opportunity(&self, _input: CreateOpportunityInput) -> DomainResult<Opportunity> {
        Err(DomainError::PermissionDenied("read-only stub".to_string()))
    }

    async fn update_opportunity(&self, input: UpdateOpportunityInput) -> DomainResult<Opportunity> {
        Err(DomainError::OpportunityNotFound(input.opportunity_id))
    }

    async fn delete_opportunity(&self, input: DeleteOpportunityInput) -> DomainResult<()> {
        Err(DomainError::OpportunityNotFound(input.opportunity_id))
    }
}

fn loader(repo: Arc<StubOpportunityRepository>) -> Arc<ListingLoader> {
    Arc::new(ListingLoader::new(Arc::new(OpportunityService::new(repo))))
}

#[test]
fn test_normalize_then_denormalize_preserves_fields() {
    let rows: Vec<OpportunityRow> = serde_json::from_value(raw_rows()).unwrap();
    let river = rows[0].clone();

    let opportunity = Opportunity::try_from(river.clone()).unwrap();
    let back = OpportunityRow::from(&opportunity);

    assert_eq!(back.id, river.id);
    assert_eq!(back.opportunity_type, river.opportunity_type);
    assert_eq!(back.required_skills, river.required_skills);
    assert_eq!(back.contact_email, river.contact_email);
    assert_eq!(
        Opportunity::try_from(back).unwrap().created_at,
        opportunity.created_at
    );
}

#[test]
fn test_malformed_optional_date_becomes_absent() {
    let books = normalized().into_iter().find(|o| o.id == "opp-books").unwrap();
    assert!(books.start_date.is_some());
    assert_eq!(books.end_date, None);
}

#[tokio::test]
async fn test_live_listing_flows_through_filter_and_partition() {
    let loader = loader(Arc::new(StubOpportunityRepository::serving(normalized())));

    let LoadOutcome::Loaded(listing) = loader.load(ListOpportunitiesInput::default()).await else {
        panic!("single load cannot be superseded");
    };
    assert_eq!(listing.source, ListingSource::Live);

    let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut view = ListingView::new(listing);

    let default_view = view.render(&now);
    let ids: Vec<_> = default_view.active.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["opp-river", "opp-books"]);
    assert!(default_view.past.is_empty());

    view.set_filter(FilterSpec {
        show_past_events: true,
        ..Default::default()
    });
    let with_past = view.render(&now);
    assert_eq!(with_past.len(), 3);
    assert_eq!(with_past.past.len(), 1);
    assert_eq!(with_past.past[0].id, "opp-clinic");

    view.set_filter(FilterSpec {
        categories: [OpportunityCategory::Environment].into(),
        urgencies: [OpportunityUrgency::High].into(),
        location: "boulder".to_string(),
        ..Default::default()
    });
    let narrowed = view.render(&now);
    assert_eq!(narrowed.active.len(), 1);
    assert_eq!(narrowed.active[0].id, "opp-river");
}

#[tokio::test]
async fn test_failing_store_degrades_to_fallback() {
    let loader = loader(Arc::new(StubOpportunityRepository::failing()));

    match loader.load(ListOpportunitiesInput::default()).await {
        LoadOutcome::Loaded(listing) => {
            assert_eq!(listing.source, ListingSource::Fallback);
            assert_eq!(listing.opportunities.len(), FALLBACK_OPPORTUNITY_COUNT);
        }
        LoadOutcome::Superseded => panic!("single load cannot be superseded"),
    }
}

#[tokio::test]
async fn test_slow_response_is_discarded_after_newer_load() {
    let repo = Arc::new(StubOpportunityRepository::gated(normalized()));
    let loader = loader(repo.clone());

    let slow = tokio::spawn({
        let loader = loader.clone();
        async move { loader.load(ListOpportunitiesInput::default()).await }
    });
    repo.first_call_started.notified().await;

    let fresh = loader.load(ListOpportunitiesInput::default()).await;
    assert!(matches!(fresh, LoadOutcome::Loaded(_)));

    if let Some(gate) = &repo.release_first_call {
        gate.notify_one();
    }
    assert_eq!(slow.await.unwrap(), LoadOutcome::Superseded);
}
