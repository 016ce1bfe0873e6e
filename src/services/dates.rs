//! Publication date normalization.
//!
//! Listing pages print dates in Russian, in one of two shapes:
//!
//! - `сегодня, 14:30` for announcements published today
//! - `5 марта` or `5 марта 2023` / `5 марта 23` otherwise; the year is left out
//!   for the current year
//!
//! Both are turned into an absolute timestamp in the site's fixed offset.
//! The current time is always passed in by the caller.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::{Captures, Regex};

use crate::error::{AppError, Result};

/// Genitive month names as printed after a day number.
const MONTHS: [(&str, u32); 12] = [
    ("января", 1),
    ("февраля", 2),
    ("марта", 3),
    ("апреля", 4),
    ("мая", 5),
    ("июня", 6),
    ("июля", 7),
    ("августа", 8),
    ("сентября", 9),
    ("октября", 10),
    ("ноября", 11),
    ("декабря", 12),
];

static TODAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*сегодня,\s+(?P<hour>[01][0-9]|2[0-3]):(?P<minute>[0-5][0-9])\s*$")
        .expect("today pattern is valid")
});

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<day>0?[1-9]|[12][0-9]|3[01])\s+(?P<month>\p{Cyrillic}+)(?:\s+(?P<year>\d{4}|\d{2}))?\s*$",
    )
    .expect("date pattern is valid")
});

/// A phrase recognized by one of the date grammars.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DatePhrase<'a> {
    /// `сегодня, HH:MM`
    Today { time: NaiveTime },
    /// `D month [YY|YYYY]`
    Absolute {
        day: u32,
        month: &'a str,
        year: Option<i32>,
    },
}

/// Grammars in the order they are tried.
const GRAMMARS: [fn(&str) -> Option<DatePhrase<'_>>; 2] = [match_today, match_absolute];

fn match_today(phrase: &str) -> Option<DatePhrase<'_>> {
    let caps = TODAY_PATTERN.captures(phrase)?;
    let time = NaiveTime::from_hms_opt(number(&caps, "hour")?, number(&caps, "minute")?, 0)?;
    Some(DatePhrase::Today { time })
}

fn match_absolute(phrase: &str) -> Option<DatePhrase<'_>> {
    let caps = DATE_PATTERN.captures(phrase)?;
    let year = match caps.name("year") {
        Some(m) => Some(expand_year(m.as_str())?),
        None => None,
    };
    Some(DatePhrase::Absolute {
        day: number(&caps, "day")?,
        month: caps.name("month")?.as_str(),
        year,
    })
}

fn number(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

/// Two-digit years follow the strftime `%y` pivot: 00-68 is 20xx, 69-99 is 19xx.
fn expand_year(digits: &str) -> Option<i32> {
    let year: i32 = digits.parse().ok()?;
    Some(match digits.len() {
        2 if year < 69 => 2000 + year,
        2 => 1900 + year,
        _ => year,
    })
}

/// Calendar month for a genitive month name.
pub fn month_number(token: &str) -> Option<u32> {
    let token = token.to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, number)| *number)
}

/// Turns site date phrases into timestamps.
#[derive(Debug, Clone, Copy)]
pub struct DateNormalizer {
    offset: FixedOffset,
}

impl DateNormalizer {
    /// Create a normalizer producing timestamps in `offset`.
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Normalize `phrase`, reading "today" and the current year from `now`.
    ///
    /// `now` is converted to the site offset first, so the calendar date is
    /// the one a reader of the site would see at that instant.
    pub fn normalize(&self, phrase: &str, now: DateTime<Utc>) -> Result<DateTime<FixedOffset>> {
        let today = now.with_timezone(&self.offset).date_naive();
        let parsed = GRAMMARS
            .iter()
            .find_map(|grammar| grammar(phrase))
            .ok_or_else(|| AppError::DateFormat(phrase.to_string()))?;

        let local = match parsed {
            DatePhrase::Today { time } => today.and_time(time),
            DatePhrase::Absolute { day, month, year } => {
                let month = month_number(month)
                    .ok_or_else(|| AppError::UnknownMonth(month.to_string()))?;
                let year = year.unwrap_or_else(|| today.year());
                NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| AppError::DateFormat(phrase.to_string()))?
                    .and_time(NaiveTime::MIN)
            }
        };

        self.offset
            .from_local_datetime(&local)
            .single()
            .ok_or_else(|| AppError::DateFormat(phrase.to_string()))
    }
}
