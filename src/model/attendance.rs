use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// IN = arrival, OUT = departure. Stored as the string `IN`/`OUT`.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    sqlx::Type,
    ToSchema,
)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum EventKind {
    In,
    Out,
}

impl EventKind {
    /// The kind a toggle would record next.
    pub fn opposite(&self) -> Self {
        match self {
            EventKind::In => EventKind::Out,
            EventKind::Out => EventKind::In,
        }
    }
}

/// One immutable row of the attendance ledger.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceLog {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    pub event_type: EventKind,
    #[schema(example = "2026-08-06T09:00:00", format = "date-time", value_type = String)]
    pub timestamp: NaiveDateTime,
    #[schema(example = "web")]
    pub source: String,
}

/// Derived per-day aggregate, joined with the employee's display fields
/// at read time.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct DailySummaryRow {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub employee_id: u64,
    #[schema(example = "2026-08-06", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "2026-08-06T09:00:00", format = "date-time", value_type = String, nullable = true)]
    pub first_in: Option<NaiveDateTime>,
    #[schema(example = "2026-08-06T17:00:00", format = "date-time", value_type = String, nullable = true)]
    pub last_out: Option<NaiveDateTime>,
    #[schema(example = 28800)]
    pub total_duration_seconds: i64,
    #[schema(nullable = true)]
    pub notes: Option<String>,
    #[schema(example = "John Doe", nullable = true)]
    pub employee_name: Option<String>,
    #[schema(example = "EMP-001", nullable = true)]
    pub employee_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn event_kind_strings_round_trip() {
        assert_eq!(EventKind::In.to_string(), "IN");
        assert_eq!(EventKind::Out.to_string(), "OUT");
        assert_eq!(EventKind::from_str("IN").unwrap(), EventKind::In);
        assert_eq!(EventKind::from_str("OUT").unwrap(), EventKind::Out);
        assert!(EventKind::from_str("in").is_err());
    }

    #[test]
    fn event_kind_serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&EventKind::In).unwrap(), "\"IN\"");
        let kind: EventKind = serde_json::from_str("\"OUT\"").unwrap();
        assert_eq!(kind, EventKind::Out);
    }

    #[test]
    fn opposite_flips_both_ways() {
        assert_eq!(EventKind::In.opposite(), EventKind::Out);
        assert_eq!(EventKind::Out.opposite(), EventKind::In);
    }
}
