use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Validate an IANA timezone name and return the parsed zone.
pub fn validate_timezone(timezone: &str) -> Result<Tz, CoreError> {
    Tz::from_str(timezone).map_err(|_| CoreError::InvalidTimezone(timezone.to_string()))
}

/// Map a local wall-clock time in `tz` back to a UTC instant.
///
/// Ambiguous times (DST fall-back) resolve to the earliest instant. Times that
/// do not exist (DST spring-forward gap) are moved one hour later, which lands
/// on the first valid wall-clock time after every gap in the tz database.
///
/// Returns `None` only when the result is outside chrono's representable range.
pub fn resolve_local(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = tz.from_local_datetime(&local).earliest() {
        return Some(dt.with_timezone(&Utc));
    }

    let shifted = local.checked_add_signed(Duration::hours(1))?;
    tz.from_local_datetime(&shifted)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Format a UTC instant as local time in `tz`.
pub fn format_with_timezone(datetime: DateTime<Utc>, tz: &Tz, format: &str) -> String {
    datetime.with_timezone(tz).format(format).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_validate_timezone() {
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("America/New_York").is_ok());
        assert!(matches!(
            validate_timezone("Invalid/Timezone"),
            Err(CoreError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn test_resolve_local_unambiguous() {
        let tz = validate_timezone("Europe/Berlin").unwrap();
        let resolved = resolve_local(&tz, local(2024, 1, 15, 10, 0)).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_resolve_local_spring_forward_gap() {
        // 02:30 does not exist in New York on 2024-03-10.
        let tz = validate_timezone("America/New_York").unwrap();
        let resolved = resolve_local(&tz, local(2024, 3, 10, 2, 30)).unwrap();
        assert_eq!(
            format_with_timezone(resolved, &tz, "%H:%M"),
            "03:30"
        );
    }

    #[test]
    fn test_resolve_local_fall_back_picks_earliest() {
        // 01:30 happens twice in New York on 2024-11-03; first as EDT (UTC-4).
        let tz = validate_timezone("America/New_York").unwrap();
        let resolved = resolve_local(&tz, local(2024, 11, 3, 1, 30)).unwrap();
        assert_eq!(resolved, Utc.with_ymd_and_hms(2024, 11, 3, 5, 30, 0).unwrap());
    }
}
