//! Strict ISO 8601 recognition.
//!
//! Supported shapes: calendar, ordinal and week dates (basic and extended),
//! times with optional seconds fraction and offset, date-times joined by `T`
//! or a space, `PnYnMnWnDTnHnMnS` durations, and `/`-separated intervals.

use chrono::{Datelike, NaiveDate, Weekday};

use super::{
    syntax, DateRecord, DateTimeRecord, GenericDuration, GenericInterval, GenericParse,
    TimeRecord, ZoneRecord, MICROS_PER_SECOND, SECONDS_PER_DAY,
};
use crate::error::{ParseError, Result};
use crate::timezone::parse_offset_seconds;

const MAX_FRACTION_DIGITS: usize = 9;

pub(super) fn parse(text: &str) -> Result<GenericParse> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(syntax(text, "empty input"));
    }
    if !trimmed.is_ascii() {
        return Err(syntax(text, "unexpected non-ASCII character"));
    }

    if let Some((left, right)) = trimmed.split_once('/') {
        return parse_interval(trimmed, left, right).map(GenericParse::Interval);
    }
    if trimmed.starts_with('P') {
        return parse_duration(trimmed).map(GenericParse::Duration);
    }
    parse_point(trimmed)
}

// ── Dates, times, date-times ────────────────────────────────────────────────

fn parse_point(text: &str) -> Result<GenericParse> {
    if let Some(rest) = text.strip_prefix('T') {
        return parse_bare_time(text, rest);
    }
    if let Some(idx) = text.find(['T', ' ']) {
        let date = parse_date(text, &text[..idx])?;
        let (time, zone) = parse_time(text, &text[idx + 1..])?;
        return Ok(GenericParse::DateTime(DateTimeRecord { date, time, zone }));
    }
    if text.contains(':') {
        return parse_bare_time(text, text);
    }
    parse_date(text, text).map(GenericParse::Date)
}

fn parse_bare_time(text: &str, s: &str) -> Result<GenericParse> {
    match parse_time(text, s)? {
        (time, None) => Ok(GenericParse::Time(time)),
        (_, Some(_)) => Err(syntax(text, "a time without a date cannot carry an offset")),
    }
}

fn parse_date(text: &str, s: &str) -> Result<DateRecord> {
    if let Some(pos) = s.find('W') {
        return parse_week_date(text, s, pos);
    }
    let b = s.as_bytes();
    match (s.len(), s.contains('-')) {
        (4, false) => Ok(DateRecord {
            year: number(text, s)?,
            month: 1,
            day: 1,
        }),
        (7, true) if b[4] == b'-' => Ok(DateRecord {
            year: number(text, &s[..4])?,
            month: number(text, &s[5..])?,
            day: 1,
        }),
        (8, true) if b[4] == b'-' => ordinal_date(text, &s[..4], &s[5..]),
        (10, true) if b[4] == b'-' && b[7] == b'-' => Ok(DateRecord {
            year: number(text, &s[..4])?,
            month: number(text, &s[5..7])?,
            day: number(text, &s[8..])?,
        }),
        (7, false) => ordinal_date(text, &s[..4], &s[4..]),
        (8, false) => Ok(DateRecord {
            year: number(text, &s[..4])?,
            month: number(text, &s[4..6])?,
            day: number(text, &s[6..])?,
        }),
        _ => Err(syntax(text, "unrecognised date")),
    }
}

fn ordinal_date(text: &str, year: &str, ordinal: &str) -> Result<DateRecord> {
    let year: i32 = number(text, year)?;
    let ordinal: u32 = number(text, ordinal)?;
    NaiveDate::from_yo_opt(year, ordinal)
        .map(record_from)
        .ok_or_else(|| ParseError::InvalidField(format!("no day {ordinal} in year {year}")))
}

fn parse_week_date(text: &str, s: &str, pos: usize) -> Result<DateRecord> {
    let (year_part, rest) = (&s[..pos], &s[pos + 1..]);
    let extended = year_part.ends_with('-');
    let year_digits = year_part.trim_end_matches('-');
    if year_digits.len() != 4 {
        return Err(syntax(text, "week dates need a four-digit year"));
    }
    let year: i32 = number(text, year_digits)?;

    let (week, day) = match (extended, rest.len()) {
        (_, 2) => (rest, "1"),
        (true, 4) if rest.as_bytes()[2] == b'-' => (&rest[..2], &rest[3..]),
        (false, 3) => (&rest[..2], &rest[2..]),
        _ => return Err(syntax(text, "malformed week date")),
    };
    let week: u32 = number(text, week)?;
    let day: u32 = number(text, day)?;

    let weekday = match day {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        7 => Weekday::Sun,
        _ => {
            return Err(ParseError::InvalidField(format!(
                "weekday {day} is not in 1..=7"
            )))
        }
    };
    NaiveDate::from_isoywd_opt(year, week, weekday)
        .map(record_from)
        .ok_or_else(|| ParseError::InvalidField(format!("no week {week} in year {year}")))
}

fn record_from(date: NaiveDate) -> DateRecord {
    DateRecord {
        year: date.year(),
        month: date.month(),
        day: date.day(),
    }
}

/// Parse a time of day with an optional trailing zone designator.
pub(super) fn parse_time(text: &str, s: &str) -> Result<(TimeRecord, Option<ZoneRecord>)> {
    let (body, zone) = split_zone(text, s)?;
    let (clock, fraction) = match body.find(['.', ',']) {
        Some(i) => (&body[..i], Some(&body[i + 1..])),
        None => (body, None),
    };

    let b = clock.as_bytes();
    let (hour, minute, second) = match (clock.len(), clock.contains(':')) {
        (2, false) => (clock, "00", "00"),
        (4, false) => (&clock[..2], &clock[2..], "00"),
        (6, false) => (&clock[..2], &clock[2..4], &clock[4..]),
        (5, true) if b[2] == b':' => (&clock[..2], &clock[3..], "00"),
        (8, true) if b[2] == b':' && b[5] == b':' => (&clock[..2], &clock[3..5], &clock[6..]),
        _ => return Err(syntax(text, "unrecognised time")),
    };

    let microsecond = match fraction {
        None => 0,
        Some(digits) if matches!(clock.len(), 6 | 8) => {
            // Bounded by one second's worth of microseconds.
            scaled_fraction(text, digits, MICROS_PER_SECOND)? as u32
        }
        Some(_) => return Err(syntax(text, "only seconds may carry a fraction")),
    };

    Ok((
        TimeRecord {
            hour: number(text, hour)?,
            minute: number(text, minute)?,
            second: number(text, second)?,
            microsecond,
        },
        zone,
    ))
}

fn split_zone<'a>(text: &str, s: &'a str) -> Result<(&'a str, Option<ZoneRecord>)> {
    if let Some(body) = s.strip_suffix('Z') {
        return Ok((body, Some(ZoneRecord::Utc)));
    }
    match s.find(['+', '-']) {
        Some(i) => {
            let seconds = parse_offset_seconds(&s[i..])
                .ok_or_else(|| syntax(text, "malformed UTC offset"))?;
            Ok((&s[..i], Some(ZoneRecord::Offset(seconds))))
        }
        None => Ok((s, None)),
    }
}

// ── Durations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Years,
    Months,
    Weeks,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn micros(self) -> i128 {
        let seconds = match self {
            Unit::Weeks => 7 * SECONDS_PER_DAY,
            Unit::Days => SECONDS_PER_DAY,
            Unit::Hours => 3600,
            Unit::Minutes => 60,
            Unit::Seconds => 1,
            Unit::Years | Unit::Months => 0,
        };
        i128::from(seconds) * MICROS_PER_SECOND
    }
}

const DATE_DESIGNATORS: [(u8, Unit); 4] = [
    (b'Y', Unit::Years),
    (b'M', Unit::Months),
    (b'W', Unit::Weeks),
    (b'D', Unit::Days),
];

const TIME_DESIGNATORS: [(u8, Unit); 3] = [
    (b'H', Unit::Hours),
    (b'M', Unit::Minutes),
    (b'S', Unit::Seconds),
];

struct Component<'a> {
    unit: Unit,
    whole: i64,
    fraction: Option<&'a str>,
}

fn parse_duration(text: &str) -> Result<GenericDuration> {
    let body = text
        .strip_prefix('P')
        .ok_or_else(|| syntax(text, "durations start with 'P'"))?;
    let (date_part, time_part) = match body.split_once('T') {
        Some((_, "")) => return Err(syntax(text, "'T' must be followed by a time component")),
        Some((date, time)) => (date, Some(time)),
        None => (body, None),
    };

    let mut components = Vec::new();
    scan_components(text, date_part, &DATE_DESIGNATORS, &mut components)?;
    if let Some(time) = time_part {
        scan_components(text, time, &TIME_DESIGNATORS, &mut components)?;
    }
    if components.is_empty() {
        return Err(syntax(text, "duration has no components"));
    }

    let last = components.len() - 1;
    let (mut years, mut months, mut fixed) = (0i64, 0i64, 0i128);
    for (i, component) in components.iter().enumerate() {
        if component.fraction.is_some() {
            if i != last {
                return Err(syntax(text, "only the last component may have a fraction"));
            }
            if matches!(component.unit, Unit::Years | Unit::Months) {
                return Err(syntax(text, "fractional years and months are not supported"));
            }
        }
        match component.unit {
            Unit::Years => years = component.whole,
            Unit::Months => months = component.whole,
            unit => {
                fixed += i128::from(component.whole) * unit.micros();
                if let Some(digits) = component.fraction {
                    fixed += scaled_fraction(text, digits, unit.micros())?;
                }
            }
        }
    }
    GenericDuration::from_parts(years, months, fixed)
}

fn scan_components<'a>(
    text: &str,
    part: &'a str,
    designators: &[(u8, Unit)],
    out: &mut Vec<Component<'a>>,
) -> Result<()> {
    let mut rest = part;
    let mut next_allowed = 0;
    while !rest.is_empty() {
        let end = rest
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| syntax(text, "number without a unit designator"))?;
        let (amount, tail) = rest.split_at(end);
        let designator = tail.as_bytes()[0];
        let idx = designators
            .iter()
            .position(|(d, _)| *d == designator)
            .ok_or_else(|| {
                syntax(
                    text,
                    &format!("unexpected designator '{}'", designator as char),
                )
            })?;
        if idx < next_allowed {
            return Err(syntax(text, "designators repeated or out of order"));
        }
        next_allowed = idx + 1;

        let (whole, fraction) = match amount.find(['.', ',']) {
            Some(i) => (&amount[..i], Some(&amount[i + 1..])),
            None => (amount, None),
        };
        out.push(Component {
            unit: designators[idx].1,
            whole: number(text, whole)?,
            fraction,
        });
        rest = &tail[1..];
    }
    Ok(())
}

// ── Intervals ───────────────────────────────────────────────────────────────

fn parse_interval(text: &str, left: &str, right: &str) -> Result<GenericInterval> {
    if left.is_empty() || right.is_empty() {
        return Err(syntax(text, "an interval needs two parts"));
    }
    match (left.starts_with('P'), right.starts_with('P')) {
        (true, true) => Err(syntax(text, "an interval cannot be two durations")),
        (true, false) => Ok(GenericInterval {
            start: None,
            end: Some(parse_endpoint(right)?),
            duration: Some(parse_duration(left)?),
        }),
        (false, true) => Ok(GenericInterval {
            start: Some(parse_endpoint(left)?),
            end: None,
            duration: Some(parse_duration(right)?),
        }),
        (false, false) => Ok(GenericInterval {
            start: Some(parse_endpoint(left)?),
            end: Some(parse_endpoint(right)?),
            duration: None,
        }),
    }
}

fn parse_endpoint(text: &str) -> Result<DateTimeRecord> {
    match parse_point(text)? {
        GenericParse::DateTime(record) => Ok(record),
        GenericParse::Date(date) => Ok(DateTimeRecord::midnight(date)),
        _ => Err(syntax(text, "interval endpoints need a date")),
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn number<T: std::str::FromStr>(text: &str, digits: &str) -> Result<T> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(syntax(text, &format!("expected digits, found '{digits}'")));
    }
    digits
        .parse()
        .map_err(|_| syntax(text, &format!("number '{digits}' is too large")))
}

/// `0.<digits>` of `unit`, truncated.
fn scaled_fraction(text: &str, digits: &str, unit: i128) -> Result<i128> {
    if digits.len() > MAX_FRACTION_DIGITS {
        return Err(syntax(text, "fraction has too many digits"));
    }
    let value: i128 = number(text, digits)?;
    // digits.len() <= 9, so the cast is lossless.
    Ok(value * unit / 10i128.pow(digits.len() as u32))
}
