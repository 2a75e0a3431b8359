//! Defines [`PostDate`], the publication timestamp attached to every post.
//! Authors may supply either a bare calendar date or a date with a time of
//! day; the two render differently (see [`crate::filters`]) but sort and
//! compare on a common timeline.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A post's publication date: either a whole day or an exact moment.
#[derive(Clone, Copy, Debug)]
pub enum PostDate {
    /// A date with no time component (`2021-04-16`).
    Day(NaiveDate),

    /// A date with a time component (`2021-04-16 09:30:00`, or the same
    /// with a `T` separator).
    Moment(NaiveDateTime),
}

impl PostDate {
    pub fn year(&self) -> i32 {
        self.date().year()
    }

    pub fn month(&self) -> u32 {
        self.date().month()
    }

    pub fn day(&self) -> u32 {
        self.date().day()
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            PostDate::Day(d) => *d,
            PostDate::Moment(dt) => dt.date(),
        }
    }

    /// The English name of the date's month (`"April"`).
    pub fn month_name(&self) -> String {
        self.date().format("%B").to_string()
    }

    // Dates and moments sort on one timeline; a bare date counts as the
    // midnight opening its day.
    fn timeline(&self) -> NaiveDateTime {
        match self {
            PostDate::Day(d) => d.and_hms(0, 0, 0),
            PostDate::Moment(dt) => *dt,
        }
    }

    /// Formats the date per RFC 3339: bare dates as `YYYY-MM-DD`, moments
    /// with a trailing offset. Source files carry no zone information, so
    /// the offset defaults to `Z`.
    pub fn rfc3339(&self) -> String {
        match self {
            PostDate::Day(d) => d.format("%Y-%m-%d").to_string(),
            PostDate::Moment(dt) => dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }

    /// Formats the date for humans: `April 16, 2021`, with a 24-hour time
    /// appended for moments.
    pub fn human_readable(&self) -> String {
        match self {
            PostDate::Day(d) => d.format("%B %-d, %Y").to_string(),
            PostDate::Moment(dt) => dt.format("%B %-d, %Y %H:%M").to_string(),
        }
    }

    /// Formats the date as an abbreviated month and day with no year:
    /// `Apr 16`.
    pub fn short(&self) -> String {
        self.date().format("%b %-d").to_string()
    }
}

impl PartialEq for PostDate {
    /// Compares on the common timeline, consistent with [`Ord`]: a bare
    /// date equals the midnight moment opening the same day.
    fn eq(&self, other: &Self) -> bool {
        self.timeline() == other.timeline()
    }
}
impl Eq for PostDate {}

impl PartialOrd for PostDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PostDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timeline().cmp(&other.timeline())
    }
}

impl fmt::Display for PostDate {
    /// Round-trippable form: `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`. This is
    /// also how dates appear in template context (see the [`Serialize`]
    /// impl); the template filters parse this form back.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PostDate::Day(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            PostDate::Moment(dt) => {
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
            }
        }
    }
}

impl Serialize for PostDate {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for PostDate {
    type Err = chrono::format::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        for format in &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(PostDate::Moment(dt));
            }
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d").map(PostDate::Day)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_day() {
        let date: PostDate = "2021-04-16".parse().unwrap();
        assert_eq!(PostDate::Day(NaiveDate::from_ymd(2021, 4, 16)), date);
        assert_eq!("2021-04-16", date.to_string());
    }

    #[test]
    fn test_parse_moment() {
        for s in &["2021-04-16 09:30:00", "2021-04-16T09:30:00"] {
            let date: PostDate = s.parse().unwrap();
            assert_eq!(
                PostDate::Moment(
                    NaiveDate::from_ymd(2021, 4, 16).and_hms(9, 30, 0)
                ),
                date,
            );
        }
    }

    #[test]
    fn test_display_round_trip() {
        for s in &["2021-04-16", "2021-04-16T09:30:00"] {
            let date: PostDate = s.parse().unwrap();
            assert_eq!(date, date.to_string().parse().unwrap());
        }
    }

    #[test]
    fn test_ordering_across_kinds() {
        let day: PostDate = "2021-04-16".parse().unwrap();
        let morning: PostDate = "2021-04-16 09:30:00".parse().unwrap();
        let next: PostDate = "2021-04-17".parse().unwrap();
        assert!(day < morning);
        assert!(morning < next);
    }

    #[test]
    fn test_formats() {
        let day: PostDate = "2021-04-16".parse().unwrap();
        let moment: PostDate = "2021-04-16 09:30:00".parse().unwrap();
        assert_eq!("2021-04-16", day.rfc3339());
        assert_eq!("2021-04-16T09:30:00Z", moment.rfc3339());
        assert_eq!("April 16, 2021", day.human_readable());
        assert_eq!("April 16, 2021 09:30", moment.human_readable());
        assert_eq!("Apr 16", day.short());
        assert_eq!("April", day.month_name());
    }
}
