use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

/// Parses a tour date sent by a client.
///
/// Accepts RFC 3339 timestamps (`2026-11-02T09:30:00.000Z`) and bare calendar
/// dates (`2026-11-02`, read as midnight UTC).
pub fn parse_tour_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Two instants fall on the same UTC calendar day.
pub fn same_calendar_day(a: &DateTime<Utc>, b: &DateTime<Utc>) -> bool {
    a.date_naive() == b.date_naive()
}

/// `deserialize_with` helper for a single tour date.
pub fn deserialize_tour_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_tour_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

/// `deserialize_with` helper for a list of tour dates.
pub fn deserialize_tour_dates<'de, D>(deserializer: D) -> Result<Vec<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<String> = Vec::deserialize(deserializer)?;
    raw.iter()
        .map(|value| {
            parse_tour_date(value)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", value)))
        })
        .collect()
}
