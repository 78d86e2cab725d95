//! # truth-parse
//!
//! Turn free-form temporal text into strongly-typed values.
//!
//! `"2021-05-03T10:00:00Z"`, `"now"`, `"P1Y2M"` and `"2021-01-01/P1M"` each
//! come back as exactly one of [`Date`], [`Time`], [`DateTime`],
//! [`Duration`] or [`Interval`], wrapped in [`Temporal`]. Offset-less input
//! is placed in the configured default zone, and intervals written as one
//! endpoint plus a duration are rebuilt with calendar-aware arithmetic.
//!
//! ## Modules
//!
//! - [`classify`]: `"now"` handling, tag dispatch, interval reconstruction
//! - [`grammar`]: the grammar seam and the default ISO 8601 grammar
//! - [`value`]: the typed values and their calendar arithmetic
//! - [`timezone`]: IANA zones and fixed offsets
//! - [`options`]: per-call configuration
//! - [`error`]: Error types
//!
//! ```
//! use truth_parse::{parse, ParseOptions, Temporal};
//!
//! let value = parse("2021-01-01/P1M", &ParseOptions::default()).unwrap();
//! let Temporal::Interval(interval) = value else { unreachable!() };
//! assert_eq!(interval.end().to_string(), "2021-02-01T00:00:00+00:00");
//! ```

pub mod classify;
pub mod error;
pub mod grammar;
pub mod options;
pub mod timezone;
pub mod value;

use tracing::debug;

pub use classify::{reconstruct, Classifier, NOW};
pub use error::{ParseError, Result};
pub use grammar::{
    DateRecord, DateTimeRecord, GenericDuration, GenericInterval, GenericParse, Grammar,
    Iso8601Grammar, TimeRecord, ZoneRecord,
};
pub use options::ParseOptions;
pub use timezone::Timezone;
pub use value::{Date, DateTime, Duration, Interval, Temporal, Time};

/// Parse `text` with the default ISO 8601 grammar.
///
/// # Errors
///
/// See [`Classifier::classify`].
pub fn parse(text: &str, options: &ParseOptions) -> Result<Temporal> {
    parse_with(Iso8601Grammar, text, options)
}

/// Parse `text` with a caller-supplied grammar.
pub fn parse_with<G: Grammar>(grammar: G, text: &str, options: &ParseOptions) -> Result<Temporal> {
    debug!(
        text,
        tz = %options.tz,
        now_override = options.now.is_some(),
        exact = options.exact,
        strict = options.strict,
        "parsing temporal text"
    );
    Classifier::new(grammar).classify(text, options)
}
