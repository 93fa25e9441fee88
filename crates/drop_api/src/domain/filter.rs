//! In-memory filtering of an opportunity listing.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use common::domain::{Opportunity, OpportunityCategory, OpportunityType, OpportunityUrgency};
use std::collections::HashSet;

/// Calendar-date bounds, both inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// User-chosen constraints narrowing a listing.
///
/// Every empty or unset field leaves the listing unrestricted on that dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pub search: String,
    pub categories: HashSet<OpportunityCategory>,
    pub types: HashSet<OpportunityType>,
    pub urgencies: HashSet<OpportunityUrgency>,
    pub location: String,
    pub remote_only: bool,
    pub date_range: DateRange,
    pub show_past_events: bool,
}

impl FilterSpec {
    pub fn is_unrestricted(&self) -> bool {
        self.search.trim().is_empty()
            && self.categories.is_empty()
            && self.types.is_empty()
            && self.urgencies.is_empty()
            && self.location.trim().is_empty()
            && !self.remote_only
            && self.date_range == DateRange::default()
            && self.show_past_events
    }
}

/// Instants the temporal rules compare against, resolved once per evaluation
struct Bounds {
    today_start: DateTime<Utc>,
    from: Option<DateTime<Utc>>,
    to_exclusive: Option<DateTime<Utc>>,
}

impl Bounds {
    fn new<Tz: TimeZone>(range: &DateRange, now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        Self {
            today_start: local_midnight(&tz, now.date_naive()),
            from: range.from.map(|d| local_midnight(&tz, d)),
            to_exclusive: range
                .to
                .and_then(|d| d.succ_opt())
                .map(|d| local_midnight(&tz, d)),
        }
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let at = NaiveDateTime::new(date, NaiveTime::MIN);
    tz.from_local_datetime(&at)
        .earliest()
        // Midnight can fall inside a DST gap
        .or_else(|| tz.from_local_datetime(&(at + Duration::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&at))
}

fn matches_search(opp: &Opportunity, needle: &str) -> bool {
    needle.is_empty()
        || opp.title.to_lowercase().contains(needle)
        || opp.description.to_lowercase().contains(needle)
        || opp.organization.to_lowercase().contains(needle)
}

fn in_set<T: Eq + std::hash::Hash>(set: &HashSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

fn within_date_range(opp: &Opportunity, bounds: &Bounds) -> bool {
    if opp.is_undated() {
        return true;
    }
    let after_from = bounds.from.map_or(true, |from| opp.effective_start() >= from);
    let before_to = bounds.to_exclusive.map_or(true, |to| opp.effective_end() < to);
    after_from && before_to
}

fn is_past_event(opp: &Opportunity, bounds: &Bounds) -> bool {
    opp.end_date
        .or(opp.start_date)
        .is_some_and(|last| last < bounds.today_start)
}

/// Keep the opportunities matching `spec`, in input order.
///
/// Calendar dates in `spec` and "today" are read in the time zone of `now`.
pub fn apply<Tz: TimeZone>(
    opportunities: &[Opportunity],
    spec: &FilterSpec,
    now: &DateTime<Tz>,
) -> Vec<Opportunity> {
    let needle = spec.search.trim().to_lowercase();
    let location = spec.location.trim().to_lowercase();
    let bounds = Bounds::new(&spec.date_range, now);

    opportunities
        .iter()
        .filter(|opp| matches_search(opp, &needle))
        .filter(|opp| in_set(&spec.categories, &opp.category))
        .filter(|opp| in_set(&spec.types, &opp.opportunity_type))
        .filter(|opp| in_set(&spec.urgencies, &opp.urgency))
        .filter(|opp| location.is_empty() || opp.location.to_lowercase().contains(&location))
        .filter(|opp| !spec.remote_only || opp.is_remote)
        .filter(|opp| within_date_range(opp, &bounds))
        .filter(|opp| spec.show_past_events || !is_past_event(opp, &bounds))
        .cloned()
        .collect()
}
