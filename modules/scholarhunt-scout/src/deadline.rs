//! Deadline detection over extracted page text.
//!
//! Keyword scan first, date parse second: a fixed priority list of
//! deadline-indicating phrases, and a bounded window of text after each
//! match that we try to read a calendar date out of. Free-text dates on
//! scholarship pages are messy, so the grammar favors day-month-year and
//! resolves ambiguous numeric pairs toward the future — a page advertising
//! a deadline is almost always advertising one that has not passed.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Deadline-indicating phrases, highest priority first. The first phrase
/// whose window parses to a date wins.
const DEADLINE_KEYWORDS: &[&str] = &[
    "deadline",
    "closing date",
    "due date",
    "closes on",
    "applications close",
];

/// Characters of text inspected after each keyword match.
const WINDOW_CHARS: usize = 60;

static ISO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

// 15 March 2026 / 3rd Jan 2026 / 15 march
static DMY_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})(?:st|nd|rd|th)?\s+([a-z]{3,9})\.?,?\s*(\d{4})?\b")
        .expect("valid regex")
});

// March 15, 2026 / Jan 3 2026 / march 15
static MDY_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([a-z]{3,9})\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s*(\d{4})?\b")
        .expect("valid regex")
});

// 15/03/2026, 15.03.26, 03/15/2026
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2})[/.](\d{1,2})[/.](\d{2,4})\b").expect("valid regex")
});

/// Scan `text` for a deadline date. Returns `None` when no keyword is
/// present or no window near a keyword yields a parseable date. `today`
/// anchors year inference and ambiguity resolution.
pub fn detect(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.to_lowercase();

    for keyword in DEADLINE_KEYWORDS {
        for (start, _) in lower.match_indices(keyword) {
            let window: String = lower[start..].chars().take(WINDOW_CHARS).collect();
            if let Some(date) = parse_date_window(&window, today) {
                return Some(date);
            }
        }
    }

    None
}

/// Try each date shape in precedence order over one keyword window.
fn parse_date_window(window: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some(caps) = ISO_RE.captures(window) {
        let (y, m, d) = (parse_num(&caps[1]), parse_num(&caps[2]), parse_num(&caps[3]));
        if let Some(date) = NaiveDate::from_ymd_opt(y as i32, m, d) {
            return Some(date);
        }
    }

    // Iterate all matches: the first digit-word pair in a window is often
    // not a date at all ("within 5 days").
    for caps in DMY_TEXT_RE.captures_iter(window) {
        if let Some(month) = month_from_name(&caps[2]) {
            let day = parse_num(&caps[1]);
            let year = caps.get(3).map(|y| parse_num(y.as_str()) as i32);
            if let Some(date) = with_year(day, month, year, today) {
                return Some(date);
            }
        }
    }

    for caps in MDY_TEXT_RE.captures_iter(window) {
        if let Some(month) = month_from_name(&caps[1]) {
            let day = parse_num(&caps[2]);
            let year = caps.get(3).map(|y| parse_num(y.as_str()) as i32);
            if let Some(date) = with_year(day, month, year, today) {
                return Some(date);
            }
        }
    }

    if let Some(caps) = NUMERIC_RE.captures(window) {
        let (a, b) = (parse_num(&caps[1]), parse_num(&caps[2]));
        let year = normalize_year(parse_num(&caps[3]) as i32);
        return resolve_numeric(a, b, year, today);
    }

    None
}

/// Build a date from day/month with an optional explicit year. A missing
/// year means the next occurrence of that day/month on or after `today`.
fn with_year(day: u32, month: u32, year: Option<i32>, today: NaiveDate) -> Option<NaiveDate> {
    match year {
        Some(y) => NaiveDate::from_ymd_opt(y, month, day),
        None => {
            let this_year = NaiveDate::from_ymd_opt(today.year(), month, day)?;
            if this_year >= today {
                Some(this_year)
            } else {
                NaiveDate::from_ymd_opt(today.year() + 1, month, day)
            }
        }
    }
}

/// Resolve an `a/b/year` numeric pair. Day-month order is preferred; when
/// both readings are valid and the preferred one is already past while the
/// swapped one is still ahead, take the future reading.
fn resolve_numeric(a: u32, b: u32, year: i32, today: NaiveDate) -> Option<NaiveDate> {
    let dmy = NaiveDate::from_ymd_opt(year, b, a);
    let mdy = NaiveDate::from_ymd_opt(year, a, b);

    match (dmy, mdy) {
        (Some(dmy), Some(mdy)) => {
            if dmy < today && mdy >= today {
                Some(mdy)
            } else {
                Some(dmy)
            }
        }
        (Some(dmy), None) => Some(dmy),
        (None, Some(mdy)) => Some(mdy),
        (None, None) => None,
    }
}

fn normalize_year(year: i32) -> i32 {
    if year < 100 {
        2000 + year
    } else {
        year
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    let prefix: String = name.chars().take(3).collect();
    match prefix.as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

fn parse_num(s: &str) -> u32 {
    s.parse().unwrap_or(0)
}
