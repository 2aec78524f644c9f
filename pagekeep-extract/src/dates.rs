use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parse a publication timestamp as found in article metadata.
///
/// Accepts RFC 3339, RFC 2822, naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` (taken as
/// UTC) and bare dates (midnight UTC). Anything else yields `None`.
pub fn parse_published_time(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // offsets without a colon, e.g. 2024-03-01T10:00:00+0100
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc));
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    let ndt = date.and_hms_opt(0, 0, 0)?;
    Some(DateTime::<Utc>::from_naive_utc_and_offset(ndt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn rfc3339_with_offset_is_normalized_to_utc() {
        let got = parse_published_time("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap());
    }

    #[test]
    fn rfc2822_is_accepted() {
        let got = parse_published_time("Fri, 01 Mar 2024 10:00:00 GMT").unwrap();
        assert_eq!(got, Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn naive_forms_are_utc() {
        let want = Utc.with_ymd_and_hms(2023, 12, 24, 18, 30, 5).unwrap();
        assert_eq!(parse_published_time("2023-12-24T18:30:05"), Some(want));
        assert_eq!(parse_published_time("2023-12-24 18:30:05"), Some(want));
        assert_eq!(
            parse_published_time("2023-12-24"),
            Some(Utc.with_ymd_and_hms(2023, 12, 24, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_published_time(""), None);
        assert_eq!(parse_published_time("last tuesday"), None);
        assert_eq!(parse_published_time("2024-13-45"), None);
    }
}
