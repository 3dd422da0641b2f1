//! Defines [`PostDate`], the normalized calendar date of a post. Header dates
//! are written as `YYYY-MM-DD`, but nothing stops an author from writing
//! `2019-1-5`, so dates are parsed numerically rather than compared as
//! strings.

use std::fmt;

/// The normalized date of a post. Fields are declared most-significant first
/// so the derived [`Ord`] is chronological.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PostDate {
    pub year: u32,
    pub month: u32,
    pub day: u32,
}

impl PostDate {
    /// Parses a `YYYY-MM-DD`-shaped string. Exactly three non-empty,
    /// ASCII-digit components are required and together they must name a
    /// real calendar day between years 1 and 9999.
    pub fn parse(raw: &str) -> Result<PostDate> {
        let components: Vec<&str> = raw.trim().split('-').collect();
        let (year, month, day) = match components.as_slice() {
            [year, month, day] => (
                component(raw, year)?,
                component(raw, month)?,
                component(raw, day)?,
            ),
            _ => {
                return Err(Error::ComponentCount {
                    raw: raw.to_owned(),
                    found: components.len(),
                })
            }
        };

        if !(1..=9999).contains(&year)
            || chrono::NaiveDate::from_ymd_opt(year as i32, month, day).is_none()
        {
            return Err(Error::OutOfRange(raw.to_owned()));
        }

        Ok(PostDate { year, month, day })
    }

    /// A single integer that orders the same way as the date itself.
    pub fn sort_key(&self) -> u32 {
        self.year * 10000 + self.month * 100 + self.day
    }

    /// The zero-padded, four-digit year used in URLs.
    pub fn year_segment(&self) -> String {
        format!("{:04}", self.year)
    }

    /// The zero-padded, two-digit month used in URLs.
    pub fn month_segment(&self) -> String {
        format!("{:02}", self.month)
    }

    pub fn day_segment(&self) -> String {
        format!("{:02}", self.day)
    }

    /// Renders the date as an RFC 3339 timestamp at midnight UTC, suitable for
    /// `<time datetime="...">` attributes.
    pub fn iso8601(&self) -> String {
        format!("{}T00:00:00Z", self)
    }
}

impl fmt::Display for PostDate {
    /// Displays a [`PostDate`] as `YYYY-MM-DD`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.year_segment(),
            self.month_segment(),
            self.day_segment()
        )
    }
}

fn component(raw: &str, s: &str) -> Result<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidComponent {
            raw: raw.to_owned(),
            component: s.to_owned(),
        });
    }
    // all digits, so the only possible failure is overflow
    s.parse::<u32>()
        .map_err(|_| Error::OutOfRange(raw.to_owned()))
}

/// Represents the result of a date normalization.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error normalizing a header date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Returned when the date doesn't split into exactly three components on
    /// `-`.
    ComponentCount { raw: String, found: usize },

    /// Returned when a component is empty or contains anything other than
    /// ASCII digits.
    InvalidComponent { raw: String, component: String },

    /// Returned when the components are numeric but don't form a calendar
    /// date (e.g., `2019-13-01` or `2019-02-30`).
    OutOfRange(String),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ComponentCount { raw, found } => write!(
                f,
                "date `{}` has {} components, wanted YYYY-MM-DD",
                raw, found
            ),
            Error::InvalidComponent { raw, component } => write!(
                f,
                "date `{}` has non-numeric component `{}`",
                raw, component
            ),
            Error::OutOfRange(raw) => {
                write!(f, "date `{}` is not a valid calendar date", raw)
            }
        }
    }
}

impl std::error::Error for Error {}
