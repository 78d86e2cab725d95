//! Per-call configuration for parsing.

use crate::timezone::Timezone;
use crate::value::{Date, DateTime};

/// Options recognised by [`crate::parse`].
///
/// There is no global state: every default lives here and is passed
/// explicitly with each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Zone applied to input that carries no offset of its own.
    pub tz: Timezone,
    /// The instant `"now"` stands for. `None` reads the system clock.
    pub now: Option<DateTime>,
    /// Keep bare dates and times as [`Date`] / [`crate::Time`] instead of
    /// widening them to date-times.
    pub exact: bool,
    /// Accept only ISO 8601. When false, common non-ISO forms are tried
    /// after ISO parsing fails.
    pub strict: bool,
    /// Read `NN/NN/YYYY` as day/month/year in non-strict mode.
    pub day_first: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tz: Timezone::UTC,
            now: None,
            exact: false,
            strict: true,
            day_first: false,
        }
    }
}

impl ParseOptions {
    pub fn with_tz(mut self, tz: Timezone) -> Self {
        self.tz = tz;
        self
    }

    pub fn with_now(mut self, now: DateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = exact;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_day_first(mut self, day_first: bool) -> Self {
        self.day_first = day_first;
        self
    }

    /// The `now` override, or the clock read in `tz`.
    pub fn current(&self) -> DateTime {
        self.now.unwrap_or_else(|| DateTime::now(self.tz))
    }

    /// Today's date as seen from [`ParseOptions::current`].
    pub fn today(&self) -> Date {
        self.current().date()
    }
}
