//! Timestamp formatting for the `Formatted` read modifier.
//!
//! Values are parsed with chrono and rendered with a `date()`-style format
//! string where each letter stands for one date component:
//!
//! | Char | Output | Char | Output |
//! |------|--------|------|--------|
//! | `d` | day, 2 digits | `j` | day, no padding |
//! | `D` | `Mon`..`Sun` | `l` | `Monday`..`Sunday` |
//! | `N` | ISO weekday `1`..`7` | `w` | weekday `0` (Sunday)..`6` |
//! | `S` | `st`/`nd`/`rd`/`th` | `z` | day of year from `0` |
//! | `W` | ISO week, 2 digits | `o` | ISO week-numbering year |
//! | `F` | `January`.. | `M` | `Jan`.. |
//! | `m` | month, 2 digits | `n` | month, no padding |
//! | `t` | days in month | `L` | `1` in a leap year |
//! | `Y` | year, 4 digits | `y` | year, 2 digits |
//! | `a` | `am`/`pm` | `A` | `AM`/`PM` |
//! | `g` | 12-hour, no padding | `h` | 12-hour, 2 digits |
//! | `G` | 24-hour, no padding | `H` | 24-hour, 2 digits |
//! | `i` | minutes | `s` | seconds |
//! | `v` | milliseconds | `u` | microseconds |
//! | `O` | `+0200` | `P` | `+02:00` |
//! | `U` | unix seconds | `c` | ISO 8601 |
//! | `r` | RFC 2822 | `\` | next char literally |
//!
//! Any other character is copied through.

use std::fmt::Write;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use flexorm_types::AttrValue;

/// Input layouts accepted for naive (offset-less) timestamps, read as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Interpret a value as a point in time.
///
/// Integers are unix seconds. Strings may be `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD`, RFC 3339, or `@<unix seconds>`. Everything else is `None`.
pub fn parse_timestamp(value: &AttrValue) -> Option<DateTime<FixedOffset>> {
    match value {
        AttrValue::Int(secs) => from_unix(*secs),
        AttrValue::Str(s) => parse_str(s.trim()),
        _ => None,
    }
}

/// Parse `value` as a timestamp and render it with `fmt`.
///
/// ```
/// use flexorm_model::format::format_timestamp;
///
/// let out = format_timestamp(&"2024-01-05 10:00:00".into(), "Y-m-d");
/// assert_eq!(out.as_deref(), Some("2024-01-05"));
/// ```
pub fn format_timestamp(value: &AttrValue, fmt: &str) -> Option<String> {
    parse_timestamp(value).map(|dt| render(&dt, fmt))
}

fn from_unix(secs: i64) -> Option<DateTime<FixedOffset>> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.fixed_offset())
}

fn parse_str(s: &str) -> Option<DateTime<FixedOffset>> {
    if let Some(raw) = s.strip_prefix('@') {
        return raw.parse().ok().and_then(from_unix);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, layout) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Render a timestamp with a `date()`-style format string.
pub fn render(dt: &DateTime<FixedOffset>, fmt: &str) -> String {
    let mut out = String::with_capacity(fmt.len() * 2);
    let mut chars = fmt.chars();

    while let Some(c) = chars.next() {
        let spec = match c {
            '\\' => {
                if let Some(literal) = chars.next() {
                    out.push(literal);
                }
                continue;
            }
            'd' => "%d",
            'D' => "%a",
            'j' => "%-d",
            'l' => "%A",
            'W' => "%V",
            'o' => "%G",
            'F' => "%B",
            'M' => "%b",
            'm' => "%m",
            'n' => "%-m",
            'Y' => "%Y",
            'y' => "%y",
            'a' => "%P",
            'A' => "%p",
            'g' => "%-I",
            'h' => "%I",
            'G' => "%-H",
            'H' => "%H",
            'i' => "%M",
            's' => "%S",
            'v' => "%3f",
            'u' => "%6f",
            'O' => "%z",
            'P' => "%:z",
            'c' => "%Y-%m-%dT%H:%M:%S%:z",
            'r' => "%a, %d %b %Y %H:%M:%S %z",
            'N' => {
                push(&mut out, dt.weekday().number_from_monday());
                continue;
            }
            'w' => {
                push(&mut out, dt.weekday().num_days_from_sunday());
                continue;
            }
            'z' => {
                push(&mut out, dt.ordinal0());
                continue;
            }
            'S' => {
                out.push_str(ordinal_suffix(dt.day()));
                continue;
            }
            't' => {
                push(&mut out, days_in_month(dt.year(), dt.month()));
                continue;
            }
            'L' => {
                push(&mut out, u8::from(is_leap_year(dt.year())));
                continue;
            }
            'U' => {
                push(&mut out, dt.timestamp());
                continue;
            }
            other => {
                out.push(other);
                continue;
            }
        };
        push(&mut out, dt.format(spec));
    }

    out
}

fn push(out: &mut String, value: impl std::fmt::Display) {
    // Writing into a String cannot fail.
    let _ = write!(out, "{value}");
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn is_leap_year(year: i32) -> bool {
    NaiveDate::from_ymd_opt(year, 2, 29).is_some()
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map_or(31, |d| d.day())
}
