use std::sync::LazyLock;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use regex::Regex;

use super::types::LocatedDates;

// "21st March 2024", "5 June 2022", "1 Jan 2023"
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<day>[0-9]{1,2})(?:st|nd|rd|th)? (?P<month>[A-Za-z]+) (?P<year>[0-9]{4})")
        .expect("date pattern is valid")
});

const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("feb", 2),
    ("february", 2),
    ("mar", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("jun", 6),
    ("june", 6),
    ("jul", 7),
    ("july", 7),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("nov", 11),
    ("november", 11),
    ("dec", 12),
    ("december", 12),
];

/// Finds the certification date and optional expiry date in `text`.
///
/// The first date-like substring is the certification date and the second
/// one is the expiry date; later matches are ignored and no ordering check is
/// made between the two. A matched substring that is not a real calendar
/// date is an error.
pub fn locate_dates(text: &str) -> Result<LocatedDates> {
    let mut matches = DATE_PATTERN.find_iter(text).map(|m| m.as_str());

    let certification = matches.next().map(parse_date_phrase).transpose()?;
    let expiry = matches.next().map(parse_date_phrase).transpose()?;

    Ok(LocatedDates {
        certification,
        expiry,
    })
}

/// Parses a phrase such as `21st March 2024` into a calendar date.
pub fn parse_date_phrase(phrase: &str) -> Result<NaiveDate> {
    let caps = DATE_PATTERN
        .captures(phrase)
        .ok_or_else(|| anyhow!("'{phrase}' is not a day-month-year date"))?;

    let day: u32 = caps["day"]
        .parse()
        .with_context(|| format!("invalid day in '{phrase}'"))?;
    let year: i32 = caps["year"]
        .parse()
        .with_context(|| format!("invalid year in '{phrase}'"))?;
    let month = month_number(&caps["month"])
        .ok_or_else(|| anyhow!("unknown month '{}' in '{phrase}'", &caps["month"]))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| anyhow!("'{phrase}' is not a valid calendar date"))
}

fn month_number(name: &str) -> Option<u32> {
    let name = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, number)| *number)
}
