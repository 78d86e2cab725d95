//! Classification and reconstruction of grammar output.
//!
//! The [`Classifier`] special-cases the literal `"now"`, otherwise runs its
//! [`Grammar`] and turns the [`GenericParse`] into a typed [`Temporal`]:
//! building values through their validating constructors, applying the
//! default timezone to offset-less input, and computing the missing endpoint
//! of relative intervals.

use tracing::debug;

use crate::error::{ParseError, Result};
use crate::grammar::{DateTimeRecord, GenericInterval, GenericParse, Grammar, Iso8601Grammar};
use crate::options::ParseOptions;
use crate::value::{Date, DateTime, Duration, Interval, Temporal, Time};

/// The literal that stands for the current instant.
pub const NOW: &str = "now";

/// Runs a [`Grammar`] and reconstructs typed values from its output.
#[derive(Debug, Clone, Default)]
pub struct Classifier<G = Iso8601Grammar> {
    grammar: G,
}

impl<G: Grammar> Classifier<G> {
    pub fn new(grammar: G) -> Self {
        Self { grammar }
    }

    /// Parse `text` into one of the five temporal shapes.
    ///
    /// `"now"` bypasses the grammar and yields `options.now`, or the clock
    /// read in `options.tz`.
    ///
    /// # Errors
    ///
    /// [`ParseError::UnsupportedResult`] when the grammar produces a shape
    /// with no typed counterpart. Grammar, constructor, timezone and
    /// arithmetic errors pass through unchanged.
    pub fn classify(&self, text: &str, options: &ParseOptions) -> Result<Temporal> {
        if text == NOW {
            debug!(override_set = options.now.is_some(), "resolved literal now");
            return Ok(Temporal::DateTime(options.current()));
        }
        let parsed = self.grammar.parse(text, options)?;
        debug!(kind = parsed.kind(), "grammar matched");
        reconstruct(parsed, options)
    }
}

/// Build the typed value for a grammar result.
pub fn reconstruct(parsed: GenericParse, options: &ParseOptions) -> Result<Temporal> {
    match parsed {
        GenericParse::DateTime(record) => zoned(&record, options).map(Temporal::DateTime),
        GenericParse::Date(record) => {
            Date::new(record.year, record.month, record.day).map(Temporal::Date)
        }
        GenericParse::Time(record) => Time::new(
            record.hour,
            record.minute,
            record.second,
            record.microsecond,
        )
        .map(Temporal::Time),
        GenericParse::Duration(duration) => Ok(Temporal::Duration(Duration::from(duration))),
        GenericParse::PublicDuration(duration) => Ok(Temporal::Duration(duration)),
        GenericParse::Interval(interval) => {
            reconstruct_interval(interval, options).map(Temporal::Interval)
        }
        GenericParse::Unrecognized(kind) => Err(ParseError::UnsupportedResult(format!(
            "no typed value for grammar result '{kind}'"
        ))),
    }
}

/// Resolve a record to a zoned instant. An offset in the text wins;
/// otherwise `options.tz` applies.
fn zoned(record: &DateTimeRecord, options: &ParseOptions) -> Result<DateTime> {
    let date = Date::new(record.date.year, record.date.month, record.date.day)?;
    let time = Time::new(
        record.time.hour,
        record.time.minute,
        record.time.second,
        record.time.microsecond,
    )?;
    let zone = match &record.zone {
        Some(designator) => designator.resolve()?,
        None => options.tz,
    };
    DateTime::new(date, time, zone)
}

fn reconstruct_interval(interval: GenericInterval, options: &ParseOptions) -> Result<Interval> {
    match interval {
        GenericInterval {
            start: Some(start),
            duration: Some(duration),
            ..
        } => {
            debug!(tz = %options.tz, "interval from start and duration");
            let start = zoned(&start, options)?;
            let end = start.add(&Duration::from(duration))?;
            Ok(Interval::new(start, end))
        }
        GenericInterval {
            end: Some(end),
            duration: Some(duration),
            ..
        } => {
            debug!(tz = %options.tz, "interval from duration and end");
            let end = zoned(&end, options)?;
            let start = end.subtract(&Duration::from(duration))?;
            Ok(Interval::new(start, end))
        }
        GenericInterval {
            start: Some(start),
            end: Some(end),
            duration: None,
        } => Ok(Interval::new(zoned(&start, options)?, zoned(&end, options)?)),
        _ => Err(ParseError::UnsupportedResult(
            "interval needs two of start, end and duration".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{DateRecord, GenericDuration, TimeRecord, ZoneRecord};
    use crate::timezone::Timezone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime {
        DateTime::new(
            Date::new(y, mo, d).unwrap(),
            Time::new(h, mi, s, 0).unwrap(),
            Timezone::UTC,
        )
        .unwrap()
    }

    fn record(y: i32, mo: u32, d: u32, h: u32, zone: Option<ZoneRecord>) -> DateTimeRecord {
        DateTimeRecord {
            date: DateRecord {
                year: y,
                month: mo,
                day: d,
            },
            time: TimeRecord {
                hour: h,
                ..Default::default()
            },
            zone,
        }
    }

    fn classify(text: &str, options: &ParseOptions) -> Result<Temporal> {
        Classifier::new(Iso8601Grammar).classify(text, options)
    }

    // ── "now" ───────────────────────────────────────────────────────────

    #[test]
    fn test_now_returns_override() {
        let pinned = utc(2026, 2, 18, 14, 30, 0);
        let options = ParseOptions::default().with_now(pinned);
        assert_eq!(classify("now", &options).unwrap(), Temporal::DateTime(pinned));
    }

    #[test]
    fn test_now_bypasses_grammar() {
        let grammar = |_: &str, _: &ParseOptions| -> Result<GenericParse> {
            Err(ParseError::InvalidSyntax("grammar should not run".into()))
        };
        let pinned = utc(2026, 2, 18, 14, 30, 0);
        let options = ParseOptions::default().with_now(pinned);
        let value = Classifier::new(grammar).classify("now", &options).unwrap();
        assert_eq!(value, Temporal::DateTime(pinned));
    }

    #[test]
    fn test_now_without_override_uses_clock_in_tz() {
        let tz: Timezone = "Asia/Tokyo".parse().unwrap();
        let before = chrono::Utc::now();
        let value = classify("now", &ParseOptions::default().with_tz(tz)).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!(dt.timezone(), tz);
        assert!(dt.instant() >= before);
    }

    #[test]
    fn test_now_is_matched_literally() {
        // Only the exact literal is special; anything else goes to the grammar.
        assert!(classify("Now", &ParseOptions::default()).is_err());
        assert!(classify(" now", &ParseOptions::default()).is_err());
    }

    // ── tag dispatch ────────────────────────────────────────────────────

    #[test]
    fn test_datetime_explicit_offset_beats_default_tz() {
        let options = ParseOptions::default().with_tz("Europe/Paris".parse().unwrap());
        let value = classify("2021-05-03T10:00:00+05:30", &options).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!(dt.timezone(), Timezone::fixed(19_800).unwrap());
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn test_datetime_z_is_utc() {
        let options = ParseOptions::default().with_tz("Europe/Paris".parse().unwrap());
        let value = classify("2021-05-03T10:00:00Z", &options).unwrap();
        assert_eq!(value, Temporal::DateTime(utc(2021, 5, 3, 10, 0, 0)));
    }

    #[test]
    fn test_datetime_without_offset_uses_default_tz() {
        let tz: Timezone = "America/New_York".parse().unwrap();
        let value = classify("2021-05-03T10:00:00", &ParseOptions::default().with_tz(tz)).unwrap();
        let dt = value.as_datetime().unwrap();
        assert_eq!(dt.timezone(), tz);
        assert_eq!(dt.to_string(), "2021-05-03T10:00:00-04:00");
    }

    #[test]
    fn test_datetime_without_offset_or_tz_is_utc() {
        let value = classify("2021-05-03T10:00:00", &ParseOptions::default()).unwrap();
        assert_eq!(value.as_datetime().unwrap().timezone(), Timezone::UTC);
    }

    #[test]
    fn test_exact_date() {
        let options = ParseOptions::default().with_exact(true);
        let value = classify("2021-05-03", &options).unwrap();
        assert_eq!(value, Temporal::Date(Date::new(2021, 5, 3).unwrap()));
    }

    #[test]
    fn test_exact_time() {
        let options = ParseOptions::default().with_exact(true);
        let value = classify("10:20:30.25", &options).unwrap();
        assert_eq!(value, Temporal::Time(Time::new(10, 20, 30, 250_000).unwrap()));
    }

    #[test]
    fn test_non_exact_time_lands_on_now_date() {
        let pinned = utc(2026, 2, 18, 8, 0, 0);
        let options = ParseOptions::default().with_now(pinned);
        let value = classify("10:20", &options).unwrap();
        assert_eq!(value, Temporal::DateTime(utc(2026, 2, 18, 10, 20, 0)));
    }

    #[test]
    fn test_duration_relabelled() {
        let value = classify("P1Y2M", &ParseOptions::default()).unwrap();
        assert_eq!(
            value,
            Temporal::Duration(Duration {
                years: 1,
                months: 2,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_public_duration_passes_through() {
        let duration = Duration {
            weeks: 2,
            seconds: 61,
            ..Default::default()
        };
        let value = reconstruct(GenericParse::PublicDuration(duration), &ParseOptions::default())
            .unwrap();
        assert_eq!(value, Temporal::Duration(duration));
    }

    #[test]
    fn test_unrecognized_is_unsupported() {
        let err = reconstruct(
            GenericParse::Unrecognized("recurrence".into()),
            &ParseOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedResult(_)), "got: {err}");
        assert!(err.to_string().contains("recurrence"));
    }

    #[test]
    fn test_invalid_field_propagates() {
        let err = classify("2021-13-01T00:00:00", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidField(_)), "got: {err}");
    }

    #[test]
    fn test_unresolved_offset_propagates() {
        let err = classify("2021-01-01T00:00:00+25:00", &ParseOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedTimezone(_)), "got: {err}");
    }

    // ── intervals ───────────────────────────────────────────────────────

    #[test]
    fn test_interval_start_plus_duration() {
        let value = classify("2021-01-01/P1M", &ParseOptions::default()).unwrap();
        assert_eq!(
            value,
            Temporal::Interval(Interval::new(
                utc(2021, 1, 1, 0, 0, 0),
                utc(2021, 2, 1, 0, 0, 0)
            ))
        );
    }

    #[test]
    fn test_interval_duration_before_end() {
        let value = classify("P1M/2021-03-31T00:00:00Z", &ParseOptions::default()).unwrap();
        let interval = value.as_interval().unwrap();
        assert_eq!(*interval.start(), utc(2021, 2, 28, 0, 0, 0));
        assert_eq!(*interval.end(), utc(2021, 3, 31, 0, 0, 0));
    }

    #[test]
    fn test_interval_duration_before_offsetless_end_uses_default_tz() {
        let tz: Timezone = "America/New_York".parse().unwrap();
        let options = ParseOptions::default().with_tz(tz);
        let value = classify("P1DT2H/2021-03-15T01:00:00", &options).unwrap();
        let interval = value.as_interval().unwrap();
        assert_eq!(interval.end().timezone(), tz);
        assert_eq!(interval.end().to_string(), "2021-03-15T01:00:00-04:00");
        // One wall-clock day back lands before the spring-forward change, then
        // two absolute hours back.
        assert_eq!(interval.start().timezone(), tz);
        assert_eq!(interval.start().to_string(), "2021-03-13T23:00:00-05:00");
    }

    #[test]
    fn test_interval_start_and_end_resolved_independently() {
        let options = ParseOptions::default().with_tz("Europe/Paris".parse().unwrap());
        let value = classify("2021-01-01T00:00:00/2021-01-02T00:00:00Z", &options).unwrap();
        let interval = value.as_interval().unwrap();
        assert_eq!(interval.start().timezone().name(), "Europe/Paris");
        assert_eq!(interval.end().timezone(), Timezone::UTC);
    }

    #[test]
    fn test_interval_endpoint_offset_beats_default_tz() {
        let options = ParseOptions::default().with_tz("Europe/Paris".parse().unwrap());
        let value = classify("2021-01-01T00:00:00-05:00/PT1H", &options).unwrap();
        let interval = value.as_interval().unwrap();
        assert_eq!(interval.start().timezone(), Timezone::fixed(-18_000).unwrap());
        assert_eq!(interval.end().to_string(), "2021-01-01T01:00:00-05:00");
    }

    #[test]
    fn test_interval_field_order_across_month_end() {
        // Jan 31 + 1 month clamps to Feb 28, then + 1 day → Mar 1.
        let value = classify("2021-01-31/P1M1D", &ParseOptions::default()).unwrap();
        let interval = value.as_interval().unwrap();
        assert_eq!(*interval.end(), utc(2021, 3, 1, 0, 0, 0));
    }

    #[test]
    fn test_interval_start_wins_when_all_three_present() {
        let interval = GenericInterval {
            start: Some(record(2021, 1, 1, 0, None)),
            end: Some(record(2030, 1, 1, 0, None)),
            duration: Some(GenericDuration::new(0, 0, 0, 1, 0, 0, 0, 0).unwrap()),
        };
        let value = reconstruct(GenericParse::Interval(interval), &ParseOptions::default()).unwrap();
        assert_eq!(*value.as_interval().unwrap().end(), utc(2021, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_interval_missing_parts_is_unsupported() {
        let interval = GenericInterval {
            start: Some(record(2021, 1, 1, 0, None)),
            end: None,
            duration: None,
        };
        let err = reconstruct(GenericParse::Interval(interval), &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedResult(_)));
    }

    #[test]
    fn test_custom_grammar_output_is_reconstructed() {
        let grammar = |_: &str, _: &ParseOptions| -> Result<GenericParse> {
            Ok(GenericParse::DateTime(record(
                2021,
                6,
                1,
                9,
                Some(ZoneRecord::Named("Asia/Tokyo".into())),
            )))
        };
        let value = Classifier::new(grammar)
            .classify("first of june, nine", &ParseOptions::default())
            .unwrap();
        assert_eq!(value.to_string(), "2021-06-01T09:00:00+09:00");
    }
}
