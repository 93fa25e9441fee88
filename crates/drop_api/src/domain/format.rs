use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// "Jan 5, 2024", or "N/A" when absent
pub fn format_date<Tz>(date: Option<&DateTime<Tz>>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match date {
        Some(date) => date.format("%b %-d, %Y").to_string(),
        None => "N/A".to_string(),
    }
}

pub fn format_date_range<Tz>(start: Option<&DateTime<Tz>>, end: Option<&DateTime<Tz>>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match (start, end) {
        (None, None) => "Ongoing".to_string(),
        (Some(_), None) => format!("Starting {}", format_date(start)),
        (None, Some(_)) => format!("Until {}", format_date(end)),
        (Some(_), Some(_)) => format!("{} - {}", format_date(start), format_date(end)),
    }
}

/// Cut `text` after `max_chars` characters and append "..."
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}
