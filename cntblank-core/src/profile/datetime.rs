use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

enum Layout {
    /// carries a numeric UTC offset
    Zoned(&'static str),
    /// read as UTC; a zone abbreviation (`%Z`) is skipped, not resolved
    Naive(&'static str),
    /// date only, midnight UTC
    Date(&'static str),
    /// time of day only, placed on 0000-01-01
    Clock(&'static str),
    /// month, day and time without a year; the input is prefixed with year 0000
    Stamp(&'static str),
    Rfc3339,
}

// first match wins; numeric-offset forms go before their abbreviation twins
// because `%Z` would otherwise swallow a "-0700"
const LAYOUTS: &[Layout] = &[
    Layout::Naive("%a %b %e %H:%M:%S %Y"),
    Layout::Zoned("%a %b %d %H:%M:%S %z %Y"),
    Layout::Naive("%a %b %e %H:%M:%S %Z %Y"),
    Layout::Zoned("%d %b %y %H:%M %z"),
    Layout::Naive("%d %b %y %H:%M %Z"),
    Layout::Naive("%A, %d-%b-%y %H:%M:%S %Z"),
    Layout::Zoned("%a, %d %b %Y %H:%M:%S %z"),
    Layout::Naive("%a, %d %b %Y %H:%M:%S %Z"),
    Layout::Rfc3339,
    Layout::Clock("%I:%M%p"),
    Layout::Stamp("%Y %b %e %H:%M:%S%.f"),
    Layout::Date("%Y%m%d"),
    Layout::Date("%Y/%m/%d"),
    Layout::Naive("%Y/%m/%d %H:%M"),
    Layout::Date("%Y-%m-%d"),
    Layout::Naive("%Y-%m-%d %H:%M"),
    Layout::Naive("%Y-%m-%d %H:%M:%S"),
];

impl Layout {
    fn parse(&self, s: &str) -> Option<DateTime<FixedOffset>> {
        match *self {
            Layout::Zoned(fmt) => {
                let (s, fmt) = skip_weekday(s, fmt)?;
                DateTime::parse_from_str(s, fmt).ok()
            }
            Layout::Naive(fmt) => {
                let (s, fmt) = skip_weekday(s, fmt)?;
                NaiveDateTime::parse_from_str(s, fmt).ok().map(utc)
            }
            Layout::Date(fmt) => NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(utc),
            Layout::Clock(fmt) => {
                let time = NaiveTime::parse_from_str(s, fmt).ok()?;
                NaiveDate::from_ymd_opt(0, 1, 1).map(|d| utc(d.and_time(time)))
            }
            Layout::Stamp(fmt) => NaiveDateTime::parse_from_str(&format!("0000 {s}"), fmt)
                .ok()
                .map(utc),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(s).ok(),
        }
    }
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Consume a leading weekday name without checking it against the date.
/// `%a` wants the three-letter form, `%A` the full name.
fn skip_weekday<'a>(s: &'a str, fmt: &'static str) -> Option<(&'a str, &'static str)> {
    let (full, rest) = if let Some(rest) = fmt.strip_prefix("%A") {
        (true, rest)
    } else if let Some(rest) = fmt.strip_prefix("%a") {
        (false, rest)
    } else {
        return Some((s, fmt));
    };
    let end = s.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(s.len());
    let name = &s[..end];
    let known = WEEKDAYS.iter().any(|day| {
        if full {
            day.eq_ignore_ascii_case(name)
        } else {
            day[..3].eq_ignore_ascii_case(name)
        }
    });
    known.then_some((&s[end..], rest))
}

fn utc(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    naive.and_utc().fixed_offset()
}

/// Try each known layout in order and return the first exact match.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    // every layout needs at least one digit
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    LAYOUTS.iter().find_map(|layout| layout.parse(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(s: &str) -> Option<String> {
        parse_datetime(s).map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    #[test]
    fn slash_dates() {
        assert_eq!(fmt("2015/01/23").as_deref(), Some("2015-01-23 00:00:00"));
        assert_eq!(fmt("2015/1/23").as_deref(), Some("2015-01-23 00:00:00"));
        assert_eq!(fmt("2015/1/2 3:45").as_deref(), Some("2015-01-02 03:45:00"));
    }

    #[test]
    fn dash_dates() {
        assert_eq!(fmt("2015-01-23").as_deref(), Some("2015-01-23 00:00:00"));
        assert_eq!(fmt("2015-01-02 03:04").as_deref(), Some("2015-01-02 03:04:00"));
        assert_eq!(fmt("2015-01-02 03:04:05").as_deref(), Some("2015-01-02 03:04:05"));
    }

    #[test]
    fn compact_date() {
        assert_eq!(fmt("20150123").as_deref(), Some("2015-01-23 00:00:00"));
    }

    #[test]
    fn rfc3339_keeps_offset() {
        let t = parse_datetime("2015-10-29T12:30:00+09:00").unwrap();
        assert_eq!(t.offset().local_minus_utc(), 9 * 3600);
        assert_eq!(t.format("%Y-%m-%d %H:%M:%S").to_string(), "2015-10-29 12:30:00");
    }

    #[test]
    fn rfc1123_numeric_zone() {
        let t = parse_datetime("Mon, 02 Jan 2006 15:04:05 -0700").unwrap();
        assert_eq!(t.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn weekday_need_not_match_date() {
        // 2015-01-02 was a Friday
        assert_eq!(fmt("Mon Jan  2 15:04:05 2015").as_deref(), Some("2015-01-02 15:04:05"));
        assert_eq!(fmt("Fri Jan  2 15:04:05 2015").as_deref(), Some("2015-01-02 15:04:05"));
        let t = parse_datetime("Sat, 02 Jan 2015 15:04:05 -0700").unwrap();
        assert_eq!(t.offset().local_minus_utc(), -7 * 3600);
    }

    #[test]
    fn weekday_spelling_still_checked() {
        assert!(parse_datetime("Xyz Jan  2 15:04:05 2015").is_none());
        assert!(parse_datetime("Monday Jan  2 15:04:05 2015").is_none());
        assert_eq!(
            skip_weekday("Friday, 02-Jan-15", "%A, %d-%b-%y"),
            Some((", 02-Jan-15", ", %d-%b-%y"))
        );
        assert_eq!(skip_weekday("Fri, 02-Jan-15", "%A, %d-%b-%y"), None);
    }

    #[test]
    fn kitchen_time() {
        assert_eq!(fmt("3:04PM").as_deref(), Some("0000-01-01 15:04:00"));
    }

    #[test]
    fn rejects_non_dates() {
        for s in ["1", "-1", "0", "123", "-456", "987654321", "3.14", "0xff", "T", "true", "abc", "2015/13/40"] {
            assert!(parse_datetime(s).is_none(), "{s} should not parse");
        }
    }

    #[test]
    fn orders_by_instant() {
        let a = parse_datetime("2015-01-02 03:04").unwrap();
        let b = parse_datetime("2015-01-23").unwrap();
        assert!(a < b);
    }
}
