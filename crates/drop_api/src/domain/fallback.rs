use common::domain::Opportunity;
use common::supabase::OpportunityRow;
use tracing::warn;

/// Number of records in the bundled fallback dataset
pub const FALLBACK_OPPORTUNITY_COUNT: usize = 6;

const FALLBACK_OPPORTUNITIES_JSON: &str = include_str!("fallback_opportunities.json");

/// Static opportunities shown when the live store cannot be reached.
///
/// Rows go through the same normalizer as live data.
pub fn fallback_opportunities() -> Vec<Opportunity> {
    let rows: Vec<OpportunityRow> = match serde_json::from_str(FALLBACK_OPPORTUNITIES_JSON) {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "bundled fallback dataset is unreadable");
            return Vec::new();
        }
    };

    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            Opportunity::try_from(row)
                .map_err(|e| warn!(opportunity_id = %id, error = %e, "skipping fallback record"))
                .ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{OpportunityStatus, OpportunityType};
    use std::collections::HashSet;

    #[test]
    fn test_fallback_dataset_is_complete() {
        let opportunities = fallback_opportunities();
        assert_eq!(opportunities.len(), FALLBACK_OPPORTUNITY_COUNT);

        let ids: HashSet<_> = opportunities.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids.len(), FALLBACK_OPPORTUNITY_COUNT);
        assert!(opportunities
            .iter()
            .all(|o| o.status == OpportunityStatus::Active));
    }

    #[test]
    fn test_fallback_dataset_mixes_kinds() {
        let opportunities = fallback_opportunities();
        assert!(opportunities
            .iter()
            .any(|o| o.opportunity_type == OpportunityType::Volunteer));
        assert!(opportunities
            .iter()
            .any(|o| o.opportunity_type == OpportunityType::Donation));
    }
}
