//! Timezone model for parsed values.
//!
//! A [`Timezone`] is either an IANA zone from `chrono-tz` or a fixed UTC
//! offset taken verbatim from the input text. Wall-clock instants are always
//! resolved to a single offset; nothing downstream sees an ambiguous local
//! time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone};
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

use crate::error::{ParseError, Result};

/// A resolved timezone: a named IANA zone or a fixed offset from UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timezone {
    /// An IANA zone such as `Europe/Paris`. `UTC` is represented here too.
    Named(Tz),
    /// A fixed offset such as `+05:30`, usually lifted from the parsed text.
    Fixed(FixedOffset),
}

impl Timezone {
    pub const UTC: Timezone = Timezone::Named(Tz::UTC);

    /// Build a fixed-offset zone from seconds east of UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnresolvedTimezone`] when the offset is a full
    /// day or more.
    pub fn fixed(seconds: i32) -> Result<Self> {
        FixedOffset::east_opt(seconds)
            .map(Timezone::Fixed)
            .ok_or_else(|| {
                ParseError::UnresolvedTimezone(format!(
                    "offset of {seconds} seconds is out of range"
                ))
            })
    }

    /// The IANA name, or the `±HH:MM` rendering for fixed offsets.
    pub fn name(&self) -> String {
        match self {
            Timezone::Named(tz) => tz.name().to_string(),
            Timezone::Fixed(offset) => format_utc_offset(offset.local_minus_utc()),
        }
    }

    /// Attach this zone to a wall-clock datetime.
    ///
    /// Ambiguous wall-clock times (DST fall-back) resolve to the earlier
    /// instant. Times that fall in a DST gap are read with the offset in
    /// force before the transition, which moves them forward by the gap.
    pub fn from_local_datetime(&self, local: &NaiveDateTime) -> Result<DateTime<FixedOffset>> {
        match self {
            Timezone::Fixed(offset) => offset
                .from_local_datetime(local)
                .single()
                .ok_or_else(|| out_of_range(local)),
            Timezone::Named(tz) => match tz.from_local_datetime(local) {
                LocalResult::Single(dt) => Ok(dt.fixed_offset()),
                LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
                LocalResult::None => {
                    let probe = local
                        .checked_sub_signed(TimeDelta::days(1))
                        .ok_or_else(|| out_of_range(local))?;
                    let before = tz.offset_from_utc_datetime(&probe).fix();
                    let utc = local
                        .checked_sub_signed(TimeDelta::seconds(i64::from(
                            before.local_minus_utc(),
                        )))
                        .ok_or_else(|| out_of_range(local))?;
                    Ok(tz.from_utc_datetime(&utc).fixed_offset())
                }
            },
        }
    }

    /// Express a UTC instant in this zone.
    pub fn from_utc_datetime(&self, utc: &NaiveDateTime) -> DateTime<FixedOffset> {
        match self {
            Timezone::Fixed(offset) => offset.from_utc_datetime(utc),
            Timezone::Named(tz) => tz.from_utc_datetime(utc).fixed_offset(),
        }
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self::UTC
    }
}

impl FromStr for Timezone {
    type Err = ParseError;

    /// Accepts `UTC`, `Z`, numeric offsets (`+05:30`, `-0800`, `+02`) and
    /// IANA names.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "Z" || s.eq_ignore_ascii_case("utc") {
            return Ok(Self::UTC);
        }
        if s.starts_with('+') || s.starts_with('-') {
            let seconds = parse_offset_seconds(s)
                .ok_or_else(|| ParseError::UnresolvedTimezone(format!("'{s}'")))?;
            return Timezone::fixed(seconds);
        }
        s.parse::<Tz>()
            .map(Timezone::Named)
            .map_err(|_| ParseError::UnresolvedTimezone(format!("'{s}'")))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for Timezone {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl From<Tz> for Timezone {
    fn from(tz: Tz) -> Self {
        Timezone::Named(tz)
    }
}

impl From<FixedOffset> for Timezone {
    fn from(offset: FixedOffset) -> Self {
        Timezone::Fixed(offset)
    }
}

/// Format an offset in seconds as `±HH:MM`.
pub(crate) fn format_utc_offset(offset_secs: i32) -> String {
    let sign = if offset_secs >= 0 { "+" } else { "-" };
    let abs_secs = offset_secs.unsigned_abs();
    let hours = abs_secs / 3600;
    let minutes = (abs_secs % 3600) / 60;
    format!("{sign}{hours:02}:{minutes:02}")
}

/// Parse `±HH`, `±HHMM` or `±HH:MM` into seconds east of UTC.
pub(crate) fn parse_offset_seconds(s: &str) -> Option<i32> {
    if !s.is_ascii() {
        return None;
    }
    let (sign, rest) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.len() {
        2 => (rest, "00"),
        4 => (&rest[..2], &rest[2..]),
        5 if rest.as_bytes()[2] == b':' => (&rest[..2], &rest[3..]),
        _ => return None,
    };
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

fn out_of_range(local: &NaiveDateTime) -> ParseError {
    ParseError::OutOfRange(format!("cannot place {local} on the timeline"))
}
