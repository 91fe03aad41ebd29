use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y", "%Y.%m.%d"];

/// Parses a cell into a timestamp, trying the common CSV date layouts.
///
/// Year-month values such as `2021-03` resolve to the first of the month.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    // Year-month, e.g. "2021-03"
    if value.len() == 7 {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d") {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Parses every value, returning `None` if any of them is not a timestamp.
pub fn parse_all<'a, I>(values: I) -> Option<Vec<NaiveDateTime>>
where
    I: IntoIterator<Item = &'a str>,
{
    values.into_iter().map(parse_timestamp).collect()
}

/// Days since the Unix epoch, with the time of day as a fraction.
pub fn epoch_days(timestamp: &NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp() as f64 / 86_400.0
}

/// Renders a timestamp the way it is shown on plot axes and in tables.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    if timestamp.time() == chrono::NaiveTime::MIN {
        timestamp.format("%Y-%m-%d").to_string()
    } else {
        timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(2021, 3, 14)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2021-03-14"), Some(expected));
        assert_eq!(parse_timestamp("2021/03/14"), Some(expected));
        assert_eq!(parse_timestamp("03/14/2021"), Some(expected));
        assert_eq!(parse_timestamp("14.03.2021"), Some(expected));
        assert_eq!(parse_timestamp(" 2021-03-14 "), Some(expected));
    }

    #[test]
    fn test_parse_datetime_and_year_month() {
        let stamp = parse_timestamp("2021-03-14 08:30:00").unwrap();
        assert_eq!(format_timestamp(&stamp), "2021-03-14 08:30:00");

        let month = parse_timestamp("2021-03").unwrap();
        assert_eq!(format_timestamp(&month), "2021-03-01");
    }

    #[test]
    fn test_rejects_non_dates() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("abc"), None);
        assert_eq!(parse_timestamp("42"), None);
        assert!(parse_all(["2021-01-01", "nope"]).is_none());
        assert_eq!(parse_all(["2021-01-01", "2021-01-02"]).map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_epoch_days() {
        let stamp = parse_timestamp("1970-01-03 12:00:00").unwrap();
        assert!((epoch_days(&stamp) - 2.5).abs() < 1e-12);
    }
}
