//! Typed temporal values handed back to callers.
//!
//! Every value here is immutable and owns its data. [`Temporal`] is the
//! closed set of shapes a parse can produce.

use std::fmt;

use chrono::{
    Datelike, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeDelta,
    Timelike, Utc,
};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{ParseError, Result};
use crate::timezone::Timezone;

// ── Date ────────────────────────────────────────────────────────────────────

/// A calendar date with no time and no timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Date(NaiveDate);

impl Date {
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidField`] if the components do not name a
    /// real day (month 13, February 30, ...).
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or_else(|| {
                ParseError::InvalidField(format!("no such date {year:04}-{month:02}-{day:02}"))
            })
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Time ────────────────────────────────────────────────────────────────────

/// A wall-clock time of day with microsecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Time(NaiveTime);

impl Time {
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidField`] if any component is out of range.
    pub fn new(hour: u32, minute: u32, second: u32, microsecond: u32) -> Result<Self> {
        NaiveTime::from_hms_micro_opt(hour, minute, second, microsecond)
            .map(Time)
            .ok_or_else(|| {
                ParseError::InvalidField(format!(
                    "no such time {hour:02}:{minute:02}:{second:02}.{microsecond:06}"
                ))
            })
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn second(&self) -> u32 {
        self.0.second()
    }

    pub fn microsecond(&self) -> u32 {
        self.0.nanosecond() / 1_000
    }

    pub fn naive(&self) -> NaiveTime {
        self.0
    }
}

impl From<NaiveTime> for Time {
    fn from(time: NaiveTime) -> Self {
        Time(time)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── DateTime ────────────────────────────────────────────────────────────────

/// A zoned instant: wall-clock date and time, the zone it was read in, and
/// the single UTC offset that zone had at that moment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateTime {
    local: chrono::DateTime<FixedOffset>,
    zone: Timezone,
}

impl DateTime {
    /// Combine a date and a time in `zone`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::OutOfRange`] if the wall-clock time cannot be
    /// placed on the timeline.
    pub fn new(date: Date, time: Time, zone: Timezone) -> Result<Self> {
        Self::from_naive(date.naive().and_time(time.naive()), zone)
    }

    /// Wrap a naive wall-clock datetime with a timezone.
    pub fn from_naive(naive: NaiveDateTime, zone: Timezone) -> Result<Self> {
        Ok(Self {
            local: zone.from_local_datetime(&naive)?,
            zone,
        })
    }

    /// Express a UTC instant in `zone`.
    pub fn from_instant(instant: chrono::DateTime<Utc>, zone: Timezone) -> Self {
        Self {
            local: zone.from_utc_datetime(&instant.naive_utc()),
            zone,
        }
    }

    /// The current instant from the system clock, expressed in `zone`.
    pub fn now(zone: Timezone) -> Self {
        Self::from_instant(Utc::now(), zone)
    }

    /// The same instant seen from another zone.
    pub fn in_timezone(&self, zone: Timezone) -> Self {
        Self::from_instant(self.instant(), zone)
    }

    pub fn date(&self) -> Date {
        Date(self.local.date_naive())
    }

    pub fn time(&self) -> Time {
        Time(self.local.time())
    }

    pub fn year(&self) -> i32 {
        self.local.year()
    }

    pub fn month(&self) -> u32 {
        self.local.month()
    }

    pub fn day(&self) -> u32 {
        self.local.day()
    }

    pub fn hour(&self) -> u32 {
        self.local.hour()
    }

    pub fn minute(&self) -> u32 {
        self.local.minute()
    }

    pub fn second(&self) -> u32 {
        self.local.second()
    }

    pub fn microsecond(&self) -> u32 {
        self.local.nanosecond() / 1_000
    }

    pub fn timezone(&self) -> Timezone {
        self.zone
    }

    /// The UTC offset in force at this instant.
    pub fn offset(&self) -> FixedOffset {
        *self.local.offset()
    }

    pub fn instant(&self) -> chrono::DateTime<Utc> {
        self.local.with_timezone(&Utc)
    }

    pub fn naive_local(&self) -> NaiveDateTime {
        self.local.naive_local()
    }

    pub fn as_chrono(&self) -> chrono::DateTime<FixedOffset> {
        self.local
    }

    /// Calendar-aware addition.
    ///
    /// Fields are applied in the order years, months, weeks, days, hours,
    /// minutes, seconds, microseconds. Years and months move the date as one
    /// combined month shift, clamping the day to the end of the target month
    /// once. Calendar fields move the wall clock and the
    /// result is re-resolved in this zone; the remaining fields move the
    /// absolute instant.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::OutOfRange`] if the result leaves the supported
    /// calendar range.
    pub fn add(&self, duration: &Duration) -> Result<Self> {
        self.shift(duration, 1)
    }

    /// Calendar-aware subtraction; mirror image of [`DateTime::add`].
    pub fn subtract(&self, duration: &Duration) -> Result<Self> {
        self.shift(duration, -1)
    }

    fn shift(&self, duration: &Duration, sign: i64) -> Result<Self> {
        let mut local = self.local;

        if duration.has_calendar_part() {
            let months = duration
                .years
                .checked_mul(12)
                .and_then(|m| m.checked_add(duration.months))
                .ok_or_else(|| range_error(duration.years, "years"))?;
            let mut wall = self.local.naive_local();
            wall = shift_months(wall, months, sign)?;
            wall = checked_add(wall, delta(duration.weeks, sign, "weeks", TimeDelta::try_weeks)?)?;
            wall = checked_add(wall, delta(duration.days, sign, "days", TimeDelta::try_days)?)?;
            local = self.zone.from_local_datetime(&wall)?;
        }

        let exact = [
            delta(duration.hours, sign, "hours", TimeDelta::try_hours)?,
            delta(duration.minutes, sign, "minutes", TimeDelta::try_minutes)?,
            delta(duration.seconds, sign, "seconds", TimeDelta::try_seconds)?,
            delta(duration.microseconds, sign, "microseconds", |us| {
                Some(TimeDelta::microseconds(us))
            })?,
        ]
        .into_iter()
        .try_fold(TimeDelta::zero(), |acc, d| acc.checked_add(&d))
        .ok_or_else(|| ParseError::OutOfRange("time part of duration overflows".to_string()))?;

        let utc = checked_add(local.naive_utc(), exact)?;
        Ok(Self {
            local: self.zone.from_utc_datetime(&utc),
            zone: self.zone,
        })
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.local.to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }
}

impl Serialize for DateTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("DateTime", 2)?;
        state.serialize_field("datetime", &self.to_string())?;
        state.serialize_field("timezone", &self.zone)?;
        state.end()
    }
}

fn range_error(amount: i64, unit: &str) -> ParseError {
    ParseError::OutOfRange(format!("{amount} {unit} exceeds the supported range"))
}

fn delta(
    amount: i64,
    sign: i64,
    unit: &str,
    build: fn(i64) -> Option<TimeDelta>,
) -> Result<TimeDelta> {
    amount
        .checked_mul(sign)
        .and_then(build)
        .ok_or_else(|| range_error(amount, unit))
}

fn checked_add(wall: NaiveDateTime, delta: TimeDelta) -> Result<NaiveDateTime> {
    wall.checked_add_signed(delta)
        .ok_or_else(|| ParseError::OutOfRange(format!("{wall} shifted by {delta}")))
}

fn shift_months(wall: NaiveDateTime, months: i64, sign: i64) -> Result<NaiveDateTime> {
    if months == 0 {
        return Ok(wall);
    }
    let signed = months
        .checked_mul(sign)
        .ok_or_else(|| range_error(months, "months"))?;
    let magnitude =
        u32::try_from(signed.unsigned_abs()).map_err(|_| range_error(months, "months"))?;
    let shifted = if signed >= 0 {
        wall.checked_add_months(Months::new(magnitude))
    } else {
        wall.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or_else(|| range_error(months, "months"))
}

// ── Duration ────────────────────────────────────────────────────────────────

/// A calendar-aware span.
///
/// `days` excludes whole weeks and `seconds` excludes whole minutes, so no
/// part of the span is counted twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Duration {
    pub years: i64,
    pub months: i64,
    pub weeks: i64,
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub microseconds: i64,
}

impl Duration {
    pub fn is_zero(&self) -> bool {
        *self == Duration::default()
    }

    fn has_calendar_part(&self) -> bool {
        self.years != 0 || self.months != 0 || self.weeks != 0 || self.days != 0
    }
}

impl fmt::Display for Duration {
    /// ISO 8601 rendering, e.g. `P1Y2M`, `PT1H30M`, `PT0.5S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        f.write_str("P")?;
        for (amount, unit) in [
            (self.years, 'Y'),
            (self.months, 'M'),
            (self.weeks, 'W'),
            (self.days, 'D'),
        ] {
            if amount != 0 {
                write!(f, "{amount}{unit}")?;
            }
        }
        let total_micros = i128::from(self.seconds) * 1_000_000 + i128::from(self.microseconds);
        if self.hours == 0 && self.minutes == 0 && total_micros == 0 {
            return Ok(());
        }
        f.write_str("T")?;
        if self.hours != 0 {
            write!(f, "{}H", self.hours)?;
        }
        if self.minutes != 0 {
            write!(f, "{}M", self.minutes)?;
        }
        if total_micros != 0 {
            let sign = if total_micros < 0 { "-" } else { "" };
            let abs = total_micros.unsigned_abs();
            let (whole, frac) = (abs / 1_000_000, abs % 1_000_000);
            if frac == 0 {
                write!(f, "{sign}{whole}S")?;
            } else {
                let frac = format!("{frac:06}");
                write!(f, "{sign}{whole}.{}S", frac.trim_end_matches('0'))?;
            }
        }
        Ok(())
    }
}

// ── Interval ────────────────────────────────────────────────────────────────

/// A span between two zoned instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    start: DateTime,
    end: DateTime,
}

impl Interval {
    pub fn new(start: DateTime, end: DateTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> &DateTime {
        &self.start
    }

    pub fn end(&self) -> &DateTime {
        &self.end
    }

    /// True when the end lies before the start, as produced by a negative
    /// relative span.
    pub fn is_inverted(&self) -> bool {
        self.end.instant() < self.start.instant()
    }

    /// Exact elapsed time from start to end.
    pub fn elapsed(&self) -> TimeDelta {
        self.end.instant() - self.start.instant()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start, self.end)
    }
}

// ── Temporal ────────────────────────────────────────────────────────────────

/// The value produced by a parse: exactly one of five shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Temporal {
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    Duration(Duration),
    Interval(Interval),
}

impl Temporal {
    pub fn kind(&self) -> &'static str {
        match self {
            Temporal::Date(_) => "date",
            Temporal::Time(_) => "time",
            Temporal::DateTime(_) => "datetime",
            Temporal::Duration(_) => "duration",
            Temporal::Interval(_) => "interval",
        }
    }

    pub fn as_date(&self) -> Option<&Date> {
        match self {
            Temporal::Date(date) => Some(date),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<&Time> {
        match self {
            Temporal::Time(time) => Some(time),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Temporal::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Temporal::Duration(duration) => Some(duration),
            _ => None,
        }
    }

    pub fn as_interval(&self) -> Option<&Interval> {
        match self {
            Temporal::Interval(interval) => Some(interval),
            _ => None,
        }
    }
}

impl fmt::Display for Temporal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Temporal::Date(date) => date.fmt(f),
            Temporal::Time(time) => time.fmt(f),
            Temporal::DateTime(dt) => dt.fmt(f),
            Temporal::Duration(duration) => duration.fmt(f),
            Temporal::Interval(interval) => interval.fmt(f),
        }
    }
}

impl From<Date> for Temporal {
    fn from(date: Date) -> Self {
        Temporal::Date(date)
    }
}

impl From<Time> for Temporal {
    fn from(time: Time) -> Self {
        Temporal::Time(time)
    }
}

impl From<DateTime> for Temporal {
    fn from(dt: DateTime) -> Self {
        Temporal::DateTime(dt)
    }
}

impl From<Duration> for Temporal {
    fn from(duration: Duration) -> Self {
        Temporal::Duration(duration)
    }
}

impl From<Interval> for Temporal {
    fn from(interval: Interval) -> Self {
        Temporal::Interval(interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime {
        DateTime::new(
            Date::new(y, mo, d).unwrap(),
            Time::new(h, mi, s, 0).unwrap(),
            Timezone::UTC,
        )
        .unwrap()
    }

    fn zoned(name: &str, y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime {
        DateTime::new(
            Date::new(y, mo, d).unwrap(),
            Time::new(h, mi, 0, 0).unwrap(),
            name.parse().unwrap(),
        )
        .unwrap()
    }

    // ── constructors ────────────────────────────────────────────────────

    #[test]
    fn test_date_rejects_month_13() {
        let err = Date::new(2021, 13, 1).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField(_)), "got: {err}");
    }

    #[test]
    fn test_date_rejects_february_30() {
        assert!(Date::new(2021, 2, 30).is_err());
        assert!(Date::new(2024, 2, 29).is_ok());
    }

    #[test]
    fn test_time_rejects_hour_25() {
        let err = Time::new(25, 0, 0, 0).unwrap_err();
        assert!(err.to_string().contains("Invalid field"), "got: {err}");
    }

    #[test]
    fn test_time_microsecond_roundtrip() {
        let time = Time::new(10, 20, 30, 123_456).unwrap();
        assert_eq!(time.microsecond(), 123_456);
        assert_eq!(time.to_string(), "10:20:30.123456");
    }

    #[test]
    fn test_datetime_accessors() {
        let dt = zoned("Europe/Paris", 2026, 7, 14, 9, 45);
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.month(), 7);
        assert_eq!(dt.day(), 14);
        assert_eq!(dt.hour(), 9);
        assert_eq!(dt.minute(), 45);
        assert_eq!(dt.offset().local_minus_utc(), 7200);
        assert_eq!(dt.instant().to_rfc3339(), "2026-07-14T07:45:00+00:00");
        assert_eq!(dt.to_string(), "2026-07-14T09:45:00+02:00");
    }

    #[test]
    fn test_datetime_in_timezone_keeps_instant() {
        let dt = utc(2026, 3, 15, 14, 0, 0);
        let ny = dt.in_timezone("America/New_York".parse().unwrap());
        assert_eq!(ny.instant(), dt.instant());
        assert_eq!(ny.hour(), 10);
    }

    // ── add / subtract ──────────────────────────────────────────────────

    #[test]
    fn test_add_month_from_first_of_month() {
        let dt = utc(2021, 1, 1, 0, 0, 0);
        let one_month = Duration {
            months: 1,
            ..Default::default()
        };
        assert_eq!(dt.add(&one_month).unwrap(), utc(2021, 2, 1, 0, 0, 0));
    }

    #[test]
    fn test_add_month_clamps_to_month_end() {
        let dt = utc(2021, 1, 31, 12, 0, 0);
        let one_month = Duration {
            months: 1,
            ..Default::default()
        };
        assert_eq!(dt.add(&one_month).unwrap(), utc(2021, 2, 28, 12, 0, 0));
    }

    #[test]
    fn test_years_and_months_clamp_once() {
        // Feb 29 + 13 months lands on Mar 29; there is no stop at Feb 28.
        let dt = utc(2020, 2, 29, 0, 0, 0);
        let span = Duration {
            years: 1,
            months: 1,
            ..Default::default()
        };
        assert_eq!(dt.add(&span).unwrap(), utc(2021, 3, 29, 0, 0, 0));
        assert_eq!(dt.subtract(&span).unwrap(), utc(2019, 1, 29, 0, 0, 0));
    }

    #[test]
    fn test_years_alone_clamp_leap_day() {
        let dt = utc(2020, 2, 29, 0, 0, 0);
        let one_year = Duration {
            years: 1,
            ..Default::default()
        };
        assert_eq!(dt.add(&one_year).unwrap(), utc(2021, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_months_applied_before_days() {
        let dt = utc(2021, 1, 30, 0, 0, 0);
        let span = Duration {
            months: 1,
            days: 1,
            ..Default::default()
        };
        // Jan 30 → Feb 28 → Mar 1
        assert_eq!(dt.add(&span).unwrap(), utc(2021, 3, 1, 0, 0, 0));
    }

    #[test]
    fn test_subtract_mirrors_add() {
        let dt = utc(2021, 3, 31, 6, 0, 0);
        let span = Duration {
            months: 1,
            hours: 6,
            ..Default::default()
        };
        assert_eq!(dt.subtract(&span).unwrap(), utc(2021, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_add_full_breakdown() {
        let dt = utc(2021, 1, 1, 0, 0, 0);
        let span = Duration {
            years: 1,
            months: 2,
            weeks: 1,
            days: 3,
            hours: 4,
            minutes: 5,
            seconds: 6,
            microseconds: 7,
        };
        let end = dt.add(&span).unwrap();
        assert_eq!(end.to_string(), "2022-03-11T04:05:06.000007+00:00");
    }

    #[test]
    fn test_add_day_keeps_wall_clock_across_dst() {
        // March 8, 2026: US spring forward. One day later is still 09:00 local.
        let dt = zoned("America/New_York", 2026, 3, 7, 9, 0);
        let one_day = Duration {
            days: 1,
            ..Default::default()
        };
        let next = dt.add(&one_day).unwrap();
        assert_eq!(next.to_string(), "2026-03-08T09:00:00-04:00");
    }

    #[test]
    fn test_add_hours_is_absolute_across_dst() {
        let dt = zoned("America/New_York", 2026, 3, 7, 9, 0);
        let day_of_hours = Duration {
            hours: 24,
            ..Default::default()
        };
        let next = dt.add(&day_of_hours).unwrap();
        assert_eq!(next.to_string(), "2026-03-08T10:00:00-04:00");
    }

    #[test]
    fn test_add_out_of_range() {
        let dt = utc(2021, 1, 1, 0, 0, 0);
        let huge = Duration {
            years: i64::MAX,
            ..Default::default()
        };
        let err = dt.add(&huge).unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange(_)), "got: {err}");
    }

    // ── Duration display ────────────────────────────────────────────────

    #[test]
    fn test_duration_display() {
        let span = Duration {
            years: 1,
            months: 2,
            ..Default::default()
        };
        assert_eq!(span.to_string(), "P1Y2M");
        assert_eq!(Duration::default().to_string(), "PT0S");

        let fractional = Duration {
            hours: 1,
            seconds: 2,
            microseconds: 500_000,
            ..Default::default()
        };
        assert_eq!(fractional.to_string(), "PT1H2.5S");
    }

    // ── Interval / Temporal ─────────────────────────────────────────────

    #[test]
    fn test_interval_inversion_and_elapsed() {
        let a = utc(2021, 1, 1, 0, 0, 0);
        let b = utc(2021, 1, 2, 0, 0, 0);
        assert!(!Interval::new(a, b).is_inverted());
        assert!(Interval::new(b, a).is_inverted());
        assert_eq!(Interval::new(a, b).elapsed(), TimeDelta::days(1));
        assert_eq!(
            Interval::new(a, b).to_string(),
            "2021-01-01T00:00:00+00:00/2021-01-02T00:00:00+00:00"
        );
    }

    #[test]
    fn test_temporal_serializes_tagged() {
        let value = Temporal::from(Date::new(2021, 5, 3).unwrap());
        let json = serde_json::to_value(value).unwrap();
        assert_eq!(json, serde_json::json!({ "date": "2021-05-03" }));

        let value = Temporal::from(utc(2021, 5, 3, 10, 0, 0));
        let json = serde_json::to_value(value).unwrap();
        assert_eq!(
            json["date_time"]["datetime"],
            serde_json::json!("2021-05-03T10:00:00+00:00")
        );
        assert_eq!(json["date_time"]["timezone"], serde_json::json!("UTC"));
    }
}
