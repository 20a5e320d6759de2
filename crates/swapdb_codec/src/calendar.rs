//! Calendar-text rendering for date and time values.
//!
//! JSON has no date or time type. Values that implement [`CalendarText`]
//! are written as ISO-8601 text by the text codecs. Reading them back
//! yields the text, not the typed value.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Values that can render themselves as ISO-8601 calendar text.
pub trait CalendarText {
    /// Returns the ISO-8601 rendering of this value.
    fn to_calendar_text(&self) -> String;
}

/// Picks the fractional-seconds pattern for a nanosecond count.
///
/// Whole seconds carry no fraction, microsecond-aligned values carry six
/// digits and everything else carries nine.
fn time_pattern(nanos: u32) -> &'static str {
    if nanos == 0 {
        "%H:%M:%S"
    } else if nanos % 1_000 == 0 {
        "%H:%M:%S%.6f"
    } else {
        "%H:%M:%S%.9f"
    }
}

impl CalendarText for NaiveDate {
    fn to_calendar_text(&self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}

impl CalendarText for NaiveTime {
    fn to_calendar_text(&self) -> String {
        self.format(time_pattern(self.nanosecond())).to_string()
    }
}

impl CalendarText for NaiveDateTime {
    fn to_calendar_text(&self) -> String {
        format!(
            "{}T{}",
            self.date().to_calendar_text(),
            self.time().to_calendar_text()
        )
    }
}

impl<Tz> CalendarText for DateTime<Tz>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    fn to_calendar_text(&self) -> String {
        format!(
            "{}{}",
            self.naive_local().to_calendar_text(),
            self.format("%:z")
        )
    }
}

impl<T: CalendarText + ?Sized> CalendarText for &T {
    fn to_calendar_text(&self) -> String {
        (**self).to_calendar_text()
    }
}

/// Serializes a [`CalendarText`] value as its calendar text.
///
/// Use with `#[serde(serialize_with = "swapdb_codec::calendar::serialize")]`
/// on struct fields that hold dates or times.
pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: CalendarText,
    S: Serializer,
{
    serializer.serialize_str(&value.to_calendar_text())
}

/// Wrapper that serializes any [`CalendarText`] value as its calendar text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Calendar<T>(pub T);

impl<T: CalendarText> Serialize for Calendar<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize(&self.0, serializer)
    }
}

/// A date or time value held inside a [`Document`](crate::Document).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarValue {
    /// Calendar date.
    Date(NaiveDate),
    /// Wall-clock time without a date.
    Time(NaiveTime),
    /// Date and time without an offset.
    DateTime(NaiveDateTime),
    /// Date and time with a fixed UTC offset.
    Zoned(DateTime<FixedOffset>),
}

impl CalendarText for CalendarValue {
    fn to_calendar_text(&self) -> String {
        match self {
            CalendarValue::Date(d) => d.to_calendar_text(),
            CalendarValue::Time(t) => t.to_calendar_text(),
            CalendarValue::DateTime(dt) => dt.to_calendar_text(),
            CalendarValue::Zoned(dt) => dt.to_calendar_text(),
        }
    }
}

impl From<NaiveDate> for CalendarValue {
    fn from(d: NaiveDate) -> Self {
        CalendarValue::Date(d)
    }
}

impl From<NaiveTime> for CalendarValue {
    fn from(t: NaiveTime) -> Self {
        CalendarValue::Time(t)
    }
}

impl From<NaiveDateTime> for CalendarValue {
    fn from(dt: NaiveDateTime) -> Self {
        CalendarValue::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for CalendarValue {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        CalendarValue::Zoned(dt)
    }
}

impl From<DateTime<Utc>> for CalendarValue {
    fn from(dt: DateTime<Utc>) -> Self {
        CalendarValue::Zoned(dt.fixed_offset())
    }
}
