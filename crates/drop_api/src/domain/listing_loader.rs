use crate::domain::{apply, fallback_opportunities, partition, FilterSpec, OpportunityService, Partition};
use chrono::{DateTime, TimeZone};
use common::domain::{ListOpportunitiesInput, Opportunity};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use strum::{AsRefStr, Display};
use tracing::{debug, instrument, warn};

/// Where a listing came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ListingSource {
    Live,
    /// Bundled dataset substituted after a failed fetch
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub opportunities: Vec<Opportunity>,
    pub source: ListingSource,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(Listing),
    /// A newer load was started before this one finished
    Superseded,
}

/// Loads the opportunity listing, degrading to the bundled dataset.
///
/// Each load takes a generation number; only the newest load's result is
/// delivered.
pub struct ListingLoader {
    opportunity_service: Arc<OpportunityService>,
    generation: AtomicU64,
}

impl ListingLoader {
    pub fn new(opportunity_service: Arc<OpportunityService>) -> Self {
        Self {
            opportunity_service,
            generation: AtomicU64::new(0),
        }
    }

    #[instrument(skip(self, input))]
    pub async fn load(&self, input: ListOpportunitiesInput) -> LoadOutcome {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let result = self.opportunity_service.fetch_all(input).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(generation, "discarding superseded listing");
            return LoadOutcome::Superseded;
        }

        let listing = match result {
            Ok(opportunities) => Listing {
                opportunities,
                source: ListingSource::Live,
            },
            Err(e) => {
                warn!(error = %e, "opportunity fetch failed, using fallback dataset");
                Listing {
                    opportunities: fallback_opportunities(),
                    source: ListingSource::Fallback,
                }
            }
        };

        debug!(generation, count = listing.opportunities.len(), source = %listing.source, "listing loaded");
        LoadOutcome::Loaded(listing)
    }
}

/// A loaded listing plus the filter currently applied to it
#[derive(Debug, Clone)]
pub struct ListingView {
    listing: Listing,
    spec: FilterSpec,
}

impl ListingView {
    pub fn new(listing: Listing) -> Self {
        Self {
            listing,
            spec: FilterSpec::default(),
        }
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn set_filter(&mut self, spec: FilterSpec) {
        self.spec = spec;
    }

    pub fn replace_listing(&mut self, listing: Listing) {
        self.listing = listing;
    }

    /// Filter the full set, then split it into active and past
    pub fn render<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Partition {
        partition(apply(&self.listing.opportunities, &self.spec, now), now)
    }
}
