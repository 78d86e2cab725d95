//! Fallback recognition for common non-ISO date-times.
//!
//! Only consulted when `strict` is off. Accepts a numeric or month-name date,
//! optionally followed by a time (24-hour, or 12-hour with `am`/`pm`) and a
//! zone designator.

use super::iso8601::parse_time;
use super::{syntax, DateRecord, DateTimeRecord, GenericParse, TimeRecord, ZoneRecord};
use crate::error::{ParseError, Result};
use crate::timezone::parse_offset_seconds;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

pub(super) fn parse(text: &str, day_first: bool) -> Result<GenericParse> {
    if !text.is_ascii() {
        return Err(syntax(text, "unexpected non-ASCII character"));
    }
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    let (date, consumed) = parse_date_tokens(&tokens, day_first)
        .ok_or_else(|| syntax(text, "no recognisable date"))?;
    let rest = &tokens[consumed..];
    if rest.is_empty() {
        return Ok(GenericParse::Date(date));
    }

    let (time, mut zone, rest) = parse_time_tokens(text, rest)?;
    match rest {
        [] => {}
        [token] if zone.is_none() => zone = Some(zone_token(text, token)?),
        _ => return Err(syntax(text, "unexpected trailing text")),
    }
    Ok(GenericParse::DateTime(DateTimeRecord { date, time, zone }))
}

fn parse_date_tokens(tokens: &[&str], day_first: bool) -> Option<(DateRecord, usize)> {
    if let Some(date) = numeric_date(tokens.first()?, day_first) {
        return Some((date, 1));
    }
    match tokens {
        [day, month, year, ..] if month_number(month).is_some() => Some((
            DateRecord {
                year: year_number(year)?,
                month: month_number(month)?,
                day: day_number(day)?,
            },
            3,
        )),
        [month, day, year, ..] if month_number(month).is_some() => Some((
            DateRecord {
                year: year_number(year)?,
                month: month_number(month)?,
                day: day_number(day)?,
            },
            3,
        )),
        _ => None,
    }
}

/// `YYYY/MM/DD`, or `NN/NN/YYYY` resolved by `day_first`. `.` and `-` work
/// as separators too.
fn numeric_date(token: &str, day_first: bool) -> Option<DateRecord> {
    let separator = token.chars().find(|c| !c.is_ascii_digit())?;
    if !matches!(separator, '/' | '.' | '-') {
        return None;
    }
    let parts: Vec<&str> = token.split(separator).collect();
    let [a, b, c] = parts.as_slice() else {
        return None;
    };
    if ![a, b, c]
        .iter()
        .all(|p| !p.is_empty() && p.bytes().all(|byte| byte.is_ascii_digit()))
    {
        return None;
    }
    let (year, month, day) = if a.len() == 4 {
        (a, b, c)
    } else if c.len() == 4 {
        if day_first {
            (c, b, a)
        } else {
            (c, a, b)
        }
    } else {
        return None;
    };
    Some(DateRecord {
        year: year.parse().ok()?,
        month: month.parse().ok()?,
        day: day.parse().ok()?,
    })
}

fn month_number(token: &str) -> Option<u32> {
    let token = token.trim_end_matches('.').to_ascii_lowercase();
    if token.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|name| name.starts_with(&token))
        .map(|idx| idx as u32 + 1)
}

fn day_number(token: &str) -> Option<u32> {
    let lower = token.to_ascii_lowercase();
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| lower.strip_suffix(suffix))
        .unwrap_or(&lower);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn year_number(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

/// A time token, optionally followed by a separate `am`/`pm` token.
fn parse_time_tokens<'a>(
    text: &str,
    tokens: &'a [&'a str],
) -> Result<(TimeRecord, Option<ZoneRecord>, &'a [&'a str])> {
    let first = tokens[0].to_ascii_lowercase();
    let (clock, meridiem, consumed) = if let Some(clock) = first.strip_suffix("am") {
        (clock.to_string(), Some(false), 1)
    } else if let Some(clock) = first.strip_suffix("pm") {
        (clock.to_string(), Some(true), 1)
    } else {
        match tokens.get(1).map(|t| t.to_ascii_lowercase()).as_deref() {
            Some("am") => (first.clone(), Some(false), 2),
            Some("pm") => (first.clone(), Some(true), 2),
            _ => (first.clone(), None, 1),
        }
    };

    // parse_time expects the ISO zone designator in upper case.
    let clock = match clock.strip_suffix('z') {
        Some(body) => format!("{body}Z"),
        None => clock,
    };
    let padded = if clock.find(|c: char| !c.is_ascii_digit()) == Some(1) || clock.len() == 1 {
        format!("0{clock}")
    } else {
        clock
    };
    let (mut time, zone) = parse_time(text, &padded)?;

    if let Some(pm) = meridiem {
        if !(1..=12).contains(&time.hour) {
            return Err(ParseError::InvalidField(format!(
                "hour {} is not a 12-hour clock value",
                time.hour
            )));
        }
        time.hour = match (time.hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (hour, false) => hour,
            (hour, true) => hour + 12,
        };
    }
    Ok((time, zone, &tokens[consumed..]))
}

fn zone_token(text: &str, token: &str) -> Result<ZoneRecord> {
    if ["z", "utc", "gmt"].contains(&token.to_ascii_lowercase().as_str()) {
        return Ok(ZoneRecord::Utc);
    }
    if token.starts_with('+') || token.starts_with('-') {
        return parse_offset_seconds(token)
            .map(ZoneRecord::Offset)
            .ok_or_else(|| syntax(text, "malformed UTC offset"));
    }
    if token.contains('/') {
        return Ok(ZoneRecord::Named(token.to_string()));
    }
    Err(syntax(text, &format!("unrecognised zone '{token}'")))
}
