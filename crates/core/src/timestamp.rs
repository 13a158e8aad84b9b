use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y:%m:%d %H:%M:%S%:z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y:%m:%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses a metadata date string into local time. Values carrying an offset
/// are converted; naive values are taken as local wall-clock time.
pub fn parse_local_datetime(input: &str) -> Option<DateTime<Local>> {
    let normalized = input.trim().trim_end_matches('\0');
    if normalized.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(normalized) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(normalized, fmt) {
            return Some(dt.with_timezone(&Local));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(normalized, fmt) {
            // DST gaps and folds count as unparseable
            return Local.from_local_datetime(&naive).single();
        }
    }

    None
}

/// Decodes a raw ASCII tag payload (as stored in EXIF, NUL-terminated) and
/// parses it.
pub fn parse_ascii_datetime(raw: &[u8]) -> Option<DateTime<Local>> {
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    let text = std::str::from_utf8(&raw[..end]).ok()?;
    parse_local_datetime(text)
}

#[cfg(test)]
mod tests {
    use super::{parse_ascii_datetime, parse_local_datetime};
    use chrono::{Local, NaiveDate, TimeZone, Utc};

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::DateTime<Local> {
        let naive = NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|date| date.and_hms_opt(h, mi, s))
            .expect("valid date");
        Local
            .from_local_datetime(&naive)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn parses_exif_form_as_local() {
        assert_eq!(
            parse_local_datetime("2023:01:01 10:00:00"),
            Some(local(2023, 1, 1, 10, 0, 0))
        );
    }

    #[test]
    fn parses_rfc3339_utc_and_converts() {
        let expected = Utc
            .with_ymd_and_hms(2023, 1, 1, 10, 0, 0)
            .single()
            .expect("utc")
            .with_timezone(&Local);
        assert_eq!(
            parse_local_datetime("2023-01-01T10:00:00.000000Z"),
            Some(expected)
        );
    }

    #[test]
    fn parses_quicktime_compact_offset() {
        let expected = Utc
            .with_ymd_and_hms(2023, 1, 1, 1, 0, 0)
            .single()
            .expect("utc")
            .with_timezone(&Local);
        assert_eq!(
            parse_local_datetime("2023-01-01T10:00:00+0900"),
            Some(expected)
        );
    }

    #[test]
    fn parses_shell_style_us_date() {
        assert_eq!(
            parse_local_datetime("1/15/2023 10:04 PM"),
            Some(local(2023, 1, 15, 22, 4, 0))
        );
    }

    #[test]
    fn rejects_zeroed_and_garbage_values() {
        assert_eq!(parse_local_datetime("0000:00:00 00:00:00"), None);
        assert_eq!(parse_local_datetime("not a date"), None);
        assert_eq!(parse_local_datetime("   "), None);
    }

    #[test]
    fn ascii_payload_stops_at_nul() {
        assert_eq!(
            parse_ascii_datetime(b"2021:06:30 08:15:42\0garbage"),
            Some(local(2021, 6, 30, 8, 15, 42))
        );
        assert_eq!(parse_ascii_datetime(&[0xff, 0xfe]), None);
    }
}
