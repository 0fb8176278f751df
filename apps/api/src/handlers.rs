use std::str::FromStr;

use chrono::{DateTime, Utc};
use kasira_core::{AppError, AppResult};

pub mod approvals;
pub mod audit_log;
pub mod employees;
pub mod health;
pub mod permissions;
pub mod products;

/// Parses an optional query or body value with the domain's `FromStr`.
fn parse_optional<T>(value: Option<&str>) -> AppResult<Option<T>>
where
    T: FromStr<Err = AppError>,
{
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(T::from_str)
        .transpose()
}

/// Parses an optional RFC 3339 timestamp from the query string.
fn parse_timestamp(value: Option<&str>, field: &str) -> AppResult<Option<DateTime<Utc>>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            DateTime::parse_from_rfc3339(value)
                .map(|timestamp| timestamp.with_timezone(&Utc))
                .map_err(|error| {
                    AppError::Validation(format!("invalid {field} '{value}': {error}"))
                })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use kasira_core::AppError;
    use kasira_domain::ApprovalStatus;

    use super::{parse_optional, parse_timestamp};

    #[test]
    fn blank_filters_are_treated_as_absent() {
        let parsed = parse_optional::<ApprovalStatus>(Some("  "));

        assert!(matches!(parsed, Ok(None)));
    }

    #[test]
    fn unknown_filter_values_are_validation_errors() {
        let parsed = parse_optional::<ApprovalStatus>(Some("escalated"));

        assert!(matches!(parsed, Err(AppError::Validation(_))));
    }

    #[test]
    fn timestamps_are_normalized_to_utc() {
        let Ok(Some(parsed)) = parse_timestamp(Some("2026-03-01T10:00:00+02:00"), "date_from")
        else {
            panic!("timestamp should parse");
        };

        assert_eq!(parsed.to_rfc3339(), "2026-03-01T08:00:00+00:00");
        assert!(matches!(
            parse_timestamp(Some("yesterday"), "date_from"),
            Err(AppError::Validation(_))
        ));
    }
}
