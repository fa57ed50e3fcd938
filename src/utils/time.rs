use chrono::{DateTime, FixedOffset, SecondsFormat, SubsecRound, Utc};

/// Timestamp type stored on every user record
pub type Timestamp = DateTime<FixedOffset>;

/// Current time truncated to whole seconds, the precision of the file format
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(0).fixed_offset()
}

/// Format a timestamp as RFC3339 with second precision, `Z` for UTC
pub fn format_rfc3339(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp, dropping any fractional seconds
pub fn parse_rfc3339(s: &str) -> Result<Timestamp, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|ts| ts.trunc_subsecs(0))
}
