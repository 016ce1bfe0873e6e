//! Announcement data structure.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Geographic coordinates of an announcement's address.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lng)
    }
}

/// A rental announcement built from one detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Announcement {
    /// Publication time in the site's fixed offset
    pub date: DateTime<FixedOffset>,

    /// Announcement title
    pub title: String,

    /// Description text. Never populated yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Resolved address coordinates
    pub location: Location,

    /// Detail page the announcement was read from
    pub link: String,
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Date: {}", self.date.format("%d %b %y %H:%M %z"))?;
        writeln!(f, "Title: {}", self.title)?;
        write!(f, "Location: {}", self.location)
    }
}
