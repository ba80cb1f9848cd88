//! Interval (duration) values.
//!
//! [`Interval`] is a signed elapsed time with nanosecond resolution. Its
//! canonical text form is the compact duration literal (`1h2m3s`, `1.5s`,
//! `250ms`), which is what gets written to the database, to JSON and to
//! plain text. Reading accepts that literal as well as the clock forms
//! PostgreSQL prints for day/time intervals (`03:04:05`, `2 days 03:04:05`).
//!
//! Year and month components are not representable.

use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CodecError, Result};

const NANOSECOND: u64 = 1;
const MICROSECOND: u64 = 1_000 * NANOSECOND;
const MILLISECOND: u64 = 1_000 * MICROSECOND;
const SECOND: u64 = 1_000 * MILLISECOND;
const MINUTE: u64 = 60 * SECOND;
const HOUR: u64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR as i64;

/// Declared database type of a scalar interval column.
pub const INTERVAL_TYPE: &str = "interval";

/// A signed elapsed time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    nanos: i64,
}

impl Interval {
    /// The zero-length interval.
    pub const ZERO: Self = Self { nanos: 0 };

    /// Creates an interval from a nanosecond count.
    #[must_use]
    pub const fn from_nanos(nanos: i64) -> Self {
        Self { nanos }
    }

    /// Creates an interval from whole seconds, saturating at the
    /// nanosecond range.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self {
            nanos: secs.saturating_mul(SECOND as i64),
        }
    }

    /// Adds two intervals, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, rhs: Self) -> Option<Self> {
        match self.nanos.checked_add(rhs.nanos) {
            Some(nanos) => Some(Self { nanos }),
            None => None,
        }
    }

    /// Subtracts two intervals, returning `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, rhs: Self) -> Option<Self> {
        match self.nanos.checked_sub(rhs.nanos) {
            Some(nanos) => Some(Self { nanos }),
            None => None,
        }
    }

    /// Returns the interval length in nanoseconds.
    #[must_use]
    pub const fn as_nanos(self) -> i64 {
        self.nanos
    }

    /// Returns the interval as a [`TimeDelta`].
    #[must_use]
    pub fn as_time_delta(self) -> TimeDelta {
        TimeDelta::nanoseconds(self.nanos)
    }

    /// Parses any supported interval representation.
    ///
    /// See [`parse_interval`].
    pub fn parse(s: &str) -> Result<Self> {
        parse_interval(s)
    }

    /// Parses the compact duration literal only (`1h2m3s`, `-1.5ms`, `0`).
    pub fn parse_compact(s: &str) -> Result<Self> {
        parse_compact(s).ok_or_else(|| CodecError::Format(s.to_string()))
    }

    /// Decodes a raw database value. `None` (SQL NULL) stays `None`.
    pub fn decode_wire(raw: Option<&[u8]>) -> Result<Option<Self>> {
        raw.map(|bytes| parse_interval(std::str::from_utf8(bytes)?))
            .transpose()
    }

    /// Encodes the interval as its canonical database literal.
    #[must_use]
    pub fn encode_wire(&self) -> String {
        self.to_string()
    }

    /// Returns the column type this value maps to for a dialect.
    ///
    /// Only PostgreSQL has a native interval type.
    #[must_use]
    pub fn db_data_type(dialect: &str) -> Option<&'static str> {
        (dialect == "postgres").then_some(INTERVAL_TYPE)
    }
}

impl From<TimeDelta> for Interval {
    /// Converts a [`TimeDelta`], saturating at the nanosecond range.
    fn from(delta: TimeDelta) -> Self {
        let nanos = delta.num_nanoseconds().unwrap_or(if delta < TimeDelta::zero() {
            i64::MIN
        } else {
            i64::MAX
        });
        Self { nanos }
    }
}

impl From<Interval> for TimeDelta {
    fn from(interval: Interval) -> Self {
        interval.as_time_delta()
    }
}

// Operators saturate; use `checked_add`/`checked_sub` to detect overflow.
impl Add for Interval {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_add(rhs.nanos))
    }
}

impl Sub for Interval {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::from_nanos(self.nanos.saturating_sub(rhs.nanos))
    }
}

impl Neg for Interval {
    type Output = Self;

    fn neg(self) -> Self {
        Self::from_nanos(self.nanos.saturating_neg())
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut u = self.nanos.unsigned_abs();
        if u == 0 {
            return f.write_str("0s");
        }

        let body = if u < SECOND {
            // Sub-second values switch to smaller units, like 1.2ms.
            let (unit, precision) = if u < MICROSECOND {
                ("ns", 0)
            } else if u < MILLISECOND {
                ("µs", 3)
            } else {
                ("ms", 6)
            };
            let (whole, frac) = split_fraction(u, precision);
            format!("{whole}{frac}{unit}")
        } else {
            let (secs, frac) = split_fraction(u, 9);
            u = secs / 60;
            let mut body = format!("{}{frac}s", secs % 60);
            if u > 0 {
                body = format!("{}m{body}", u % 60);
                u /= 60;
                if u > 0 {
                    body = format!("{u}h{body}");
                }
            }
            body
        };

        if self.nanos < 0 {
            f.write_str("-")?;
        }
        f.write_str(&body)
    }
}

impl FromStr for Interval {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        parse_interval(s)
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_interval(&s).map_err(serde::de::Error::custom)
    }
}

/// Parses an interval string into an [`Interval`].
///
/// Accepted forms, tried in order:
/// 1. the empty string (zero),
/// 2. the compact duration literal (`1h2m3s`),
/// 3. `N days HH:MM:SS` (also `N day`),
/// 4. a bare `HH:MM:SS` clock.
///
/// Clock fields are exactly two digits; seconds may carry a fraction.
pub fn parse_interval(input: &str) -> Result<Interval> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(Interval::ZERO);
    }

    if let Some(interval) = parse_compact(s) {
        return Ok(interval);
    }

    let unsupported = || CodecError::Format(input.to_string());
    let tokens: Vec<&str> = s.split_whitespace().collect();
    let (days, clock) = match tokens.as_slice() {
        [count, unit, clock] if matches!(*unit, "days" | "day") => {
            let days: i64 = count.parse().map_err(|_| unsupported())?;
            (days, *clock)
        }
        [clock] => (0, *clock),
        _ => return Err(unsupported()),
    };

    let clock = parse_clock(clock).ok_or_else(unsupported)?;
    days.checked_mul(DAY)
        .and_then(|d| d.checked_add(clock))
        .map(Interval::from_nanos)
        .ok_or_else(unsupported)
}

/// Parses `HH:MM:SS[.fffffffff]` into nanoseconds.
fn parse_clock(s: &str) -> Option<i64> {
    let bytes = s.as_bytes();
    if bytes.len() < 8 || bytes[2] != b':' || bytes[5] != b':' {
        return None;
    }

    let two_digits = |at: usize| -> Option<u64> {
        let (a, b) = (bytes[at], bytes[at + 1]);
        (a.is_ascii_digit() && b.is_ascii_digit()).then(|| u64::from((a - b'0') * 10 + (b - b'0')))
    };
    let hours = two_digits(0).filter(|h| *h < 24)?;
    let minutes = two_digits(3).filter(|m| *m < 60)?;
    let seconds = two_digits(6).filter(|s| *s < 60)?;

    let mut nanos = hours * HOUR + minutes * MINUTE + seconds * SECOND;

    let rest = &s[8..];
    if !rest.is_empty() {
        let digits = rest.strip_prefix('.')?;
        if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let frac: u64 = digits.parse().ok()?;
        nanos += frac * 10u64.pow(9 - digits.len() as u32);
    }

    i64::try_from(nanos).ok()
}

/// Parses the compact literal `[-+]?([0-9]*(\.[0-9]*)?unit)+`, or `0`.
fn parse_compact(input: &str) -> Option<Interval> {
    let (negative, mut s) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };
    if s == "0" {
        return Some(Interval::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total: u64 = 0;
    while !s.is_empty() {
        let first = s.as_bytes()[0];
        if !(first == b'.' || first.is_ascii_digit()) {
            return None;
        }

        // Integer part.
        let int_len = s.bytes().take_while(u8::is_ascii_digit).count();
        let whole: u64 = if int_len > 0 { s[..int_len].parse().ok()? } else { 0 };
        s = &s[int_len..];

        // Fractional part.
        let mut frac: u64 = 0;
        let mut scale: f64 = 1.0;
        let mut frac_len = 0;
        if let Some(rest) = s.strip_prefix('.') {
            frac_len = rest.bytes().take_while(u8::is_ascii_digit).count();
            for digit in rest[..frac_len].bytes() {
                if frac > (u64::MAX - 9) / 10 {
                    // Further digits can't change the value.
                    continue;
                }
                frac = frac * 10 + u64::from(digit - b'0');
                scale *= 10.0;
            }
            s = &rest[frac_len..];
        }
        if int_len == 0 && frac_len == 0 {
            return None;
        }

        let unit_len = s
            .char_indices()
            .find(|(_, c)| *c == '.' || c.is_ascii_digit())
            .map_or(s.len(), |(i, _)| i);
        if unit_len == 0 {
            return None;
        }
        let unit = match &s[..unit_len] {
            "ns" => NANOSECOND,
            "us" | "µs" | "μs" => MICROSECOND,
            "ms" => MILLISECOND,
            "s" => SECOND,
            "m" => MINUTE,
            "h" => HOUR,
            _ => return None,
        };
        s = &s[unit_len..];

        let mut value = whole.checked_mul(unit)?;
        if frac > 0 {
            value = value.checked_add((frac as f64 * (unit as f64 / scale)) as u64)?;
        }
        total = total.checked_add(value)?;
    }

    if negative {
        if total > 1 << 63 {
            return None;
        }
        Some(Interval::from_nanos((total as i64).wrapping_neg()))
    } else {
        i64::try_from(total).ok().map(Interval::from_nanos)
    }
}

/// Splits `v` into `v / 10^precision` and a `.ddd` fraction without
/// trailing zeros (empty when the fraction is zero).
fn split_fraction(v: u64, precision: u32) -> (u64, String) {
    if precision == 0 {
        return (v, String::new());
    }
    let scale = 10u64.pow(precision);
    let frac = v % scale;
    if frac == 0 {
        return (v / scale, String::new());
    }
    let digits = format!("{frac:0width$}", width = precision as usize);
    (v / scale, format!(".{}", digits.trim_end_matches('0')))
}
