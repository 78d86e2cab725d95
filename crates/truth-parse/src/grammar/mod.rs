//! The grammar seam: text in, loosely-typed parse result out.
//!
//! A [`Grammar`] only recognises shapes. It hands back raw field records
//! that have not been validated; building real values out of them (and
//! rejecting month 13) is the job of the typed constructors in
//! [`crate::value`], driven by [`crate::classify`].
//!
//! [`Iso8601Grammar`] is the grammar used by [`crate::parse`]. Any other
//! implementation, including a plain closure, can be plugged into
//! [`crate::Classifier::new`].

mod iso8601;
mod lenient;

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::options::ParseOptions;
use crate::timezone::Timezone;
use crate::value::Duration;

const MICROS_PER_SECOND: i128 = 1_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Turns text into a [`GenericParse`].
pub trait Grammar {
    /// # Errors
    ///
    /// Implementations return [`ParseError::InvalidSyntax`] for text they do
    /// not recognise.
    fn parse(&self, text: &str, options: &ParseOptions) -> Result<GenericParse>;
}

impl<F> Grammar for F
where
    F: Fn(&str, &ParseOptions) -> Result<GenericParse>,
{
    fn parse(&self, text: &str, options: &ParseOptions) -> Result<GenericParse> {
        self(text, options)
    }
}

// ── Raw records ─────────────────────────────────────────────────────────────

/// Calendar fields as written in the text, not yet validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRecord {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

/// Wall-clock fields as written in the text, not yet validated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRecord {
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
}

/// A zone designator found in the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneRecord {
    /// `Z`, `UTC`, `GMT`.
    Utc,
    /// A numeric offset, in seconds east of UTC.
    Offset(i32),
    /// A zone name, looked up in the IANA database on resolution.
    Named(String),
}

impl ZoneRecord {
    /// # Errors
    ///
    /// Returns [`ParseError::UnresolvedTimezone`] for unknown names and
    /// offsets of a day or more.
    pub fn resolve(&self) -> Result<Timezone> {
        match self {
            ZoneRecord::Utc => Ok(Timezone::UTC),
            ZoneRecord::Offset(seconds) => Timezone::fixed(*seconds),
            ZoneRecord::Named(name) => name.parse(),
        }
    }
}

/// A date and wall time, with the zone designator if the text had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTimeRecord {
    pub date: DateRecord,
    pub time: TimeRecord,
    pub zone: Option<ZoneRecord>,
}

impl DateTimeRecord {
    /// Midnight on `date`, no zone.
    pub fn midnight(date: DateRecord) -> Self {
        Self {
            date,
            time: TimeRecord::default(),
            zone: None,
        }
    }
}

// ── GenericDuration ─────────────────────────────────────────────────────────

/// A calendar-aware span in the grammar's own encoding.
///
/// Years and months are kept apart; everything from weeks down is held as
/// whole days, sub-day seconds, and microseconds, all sharing one sign.
/// Weeks, hours and minutes are read back out of that normalised form, so
/// [`GenericDuration::remaining_days`] and
/// [`GenericDuration::remaining_seconds`] never repeat what
/// [`GenericDuration::weeks`] and [`GenericDuration::minutes`] already count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenericDuration {
    years: i64,
    months: i64,
    days: i64,
    seconds: i64,
    microseconds: i64,
}

impl GenericDuration {
    /// Build from individual components; fixed-length parts are normalised.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::OutOfRange`] if the day count overflows.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        years: i64,
        months: i64,
        weeks: i64,
        days: i64,
        hours: i64,
        minutes: i64,
        seconds: i64,
        microseconds: i64,
    ) -> Result<Self> {
        let total_seconds = ((i128::from(weeks) * 7 + i128::from(days)) * i128::from(SECONDS_PER_DAY))
            + i128::from(hours) * 3600
            + i128::from(minutes) * 60
            + i128::from(seconds);
        Self::from_parts(
            years,
            months,
            total_seconds * MICROS_PER_SECOND + i128::from(microseconds),
        )
    }

    /// Build from years, months, and a fixed-length span in microseconds.
    pub(crate) fn from_parts(years: i64, months: i64, fixed_micros: i128) -> Result<Self> {
        let micros_per_day = i128::from(SECONDS_PER_DAY) * MICROS_PER_SECOND;
        let days = i64::try_from(fixed_micros / micros_per_day).map_err(|_| {
            ParseError::OutOfRange(format!("{fixed_micros} microseconds is too long a span"))
        })?;
        let rest = fixed_micros % micros_per_day;
        // |rest| < one day, so both casts are lossless.
        Ok(Self {
            years,
            months,
            days,
            seconds: (rest / MICROS_PER_SECOND) as i64,
            microseconds: (rest % MICROS_PER_SECOND) as i64,
        })
    }

    pub fn years(&self) -> i64 {
        self.years
    }

    pub fn months(&self) -> i64 {
        self.months
    }

    /// All whole days, weeks included.
    pub fn days(&self) -> i64 {
        self.days
    }

    pub fn weeks(&self) -> i64 {
        self.days / 7
    }

    /// Days left over after whole weeks.
    pub fn remaining_days(&self) -> i64 {
        self.days % 7
    }

    pub fn hours(&self) -> i64 {
        self.seconds / 3600
    }

    pub fn minutes(&self) -> i64 {
        self.seconds % 3600 / 60
    }

    /// All sub-day seconds, hours and minutes included.
    pub fn seconds(&self) -> i64 {
        self.seconds
    }

    /// Seconds left over after whole minutes.
    pub fn remaining_seconds(&self) -> i64 {
        self.seconds % 60
    }

    pub fn microseconds(&self) -> i64 {
        self.microseconds
    }
}

impl From<GenericDuration> for Duration {
    fn from(d: GenericDuration) -> Self {
        Duration {
            years: d.years(),
            months: d.months(),
            weeks: d.weeks(),
            days: d.remaining_days(),
            hours: d.hours(),
            minutes: d.minutes(),
            seconds: d.remaining_seconds(),
            microseconds: d.microseconds(),
        }
    }
}

// ── GenericInterval / GenericParse ──────────────────────────────────────────

/// An interval as written: two of start, end and duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericInterval {
    pub start: Option<DateTimeRecord>,
    pub end: Option<DateTimeRecord>,
    pub duration: Option<GenericDuration>,
}

/// The loosely-typed output of a [`Grammar`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericParse {
    DateTime(DateTimeRecord),
    Date(DateRecord),
    Time(TimeRecord),
    Duration(GenericDuration),
    /// A grammar that already builds the public [`Duration`] type.
    PublicDuration(Duration),
    Interval(GenericInterval),
    /// A shape the grammar produced but this crate has no value for.
    Unrecognized(String),
}

impl GenericParse {
    pub fn kind(&self) -> &str {
        match self {
            GenericParse::DateTime(_) => "datetime",
            GenericParse::Date(_) => "date",
            GenericParse::Time(_) => "time",
            GenericParse::Duration(_) | GenericParse::PublicDuration(_) => "duration",
            GenericParse::Interval(_) => "interval",
            GenericParse::Unrecognized(kind) => kind,
        }
    }
}

// ── Iso8601Grammar ──────────────────────────────────────────────────────────

/// ISO 8601 dates, times, date-times, durations and intervals, with an
/// optional lenient fallback for common non-ISO forms.
///
/// Unless `exact` is set, a bare date is widened to midnight on that date
/// and a bare time to that time on today's date (taken from the `now`
/// override when there is one).
#[derive(Debug, Clone, Copy, Default)]
pub struct Iso8601Grammar;

impl Grammar for Iso8601Grammar {
    fn parse(&self, text: &str, options: &ParseOptions) -> Result<GenericParse> {
        let parsed = match iso8601::parse(text) {
            Ok(parsed) => parsed,
            Err(ParseError::InvalidSyntax(reason)) if !options.strict => {
                debug!(%reason, "ISO 8601 rejected input, trying lenient forms");
                lenient::parse(text, options.day_first)?
            }
            Err(err) => return Err(err),
        };

        if options.exact {
            return Ok(parsed);
        }
        Ok(match parsed {
            GenericParse::Date(date) => GenericParse::DateTime(DateTimeRecord::midnight(date)),
            GenericParse::Time(time) => {
                let today = options.today();
                GenericParse::DateTime(DateTimeRecord {
                    date: DateRecord {
                        year: today.year(),
                        month: today.month(),
                        day: today.day(),
                    },
                    time,
                    zone: None,
                })
            }
            other => other,
        })
    }
}

fn syntax(text: &str, reason: &str) -> ParseError {
    ParseError::InvalidSyntax(format!("'{text}': {reason}"))
}
