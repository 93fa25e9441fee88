use chrono::{DateTime, TimeZone};
use common::domain::Opportunity;

/// Filtered listing split around the current instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub active: Vec<Opportunity>,
    pub past: Vec<Opportunity>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.active.len() + self.past.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.past.is_empty()
    }
}

/// Split into ongoing and finished opportunities, preserving order.
///
/// Anything without an end date counts as active.
pub fn partition<Tz: TimeZone>(filtered: Vec<Opportunity>, now: &DateTime<Tz>) -> Partition {
    let (past, active): (Vec<_>, Vec<_>) = filtered
        .into_iter()
        .partition(|opp| opp.end_date.is_some_and(|end| end < *now));
    Partition { active, past }
}
