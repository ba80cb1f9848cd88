//! Element kinds for [`PgArray`](crate::PgArray).
//!
//! An [`ElementKind`] describes how one array element is parsed, formatted
//! and ordered. The array codec itself is written once against this trait;
//! quoting rules live here as data ([`ElementKind::QUOTED`]) rather than in
//! per-type code.

use std::cmp::Ordering;
use std::fmt::Debug;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::interval::{Interval, parse_interval};

/// Describes a single array element type.
pub trait ElementKind: 'static {
    /// In-memory element type.
    type Value: Clone + PartialEq + Debug + Serialize + DeserializeOwned;

    /// Declared PostgreSQL array type (e.g. `integer[]`).
    const WIRE_TYPE: &'static str;

    /// Name of the array type exported by this crate (e.g. `Int32Array`).
    const ARRAY_TYPE: &'static str;

    /// PostgreSQL array type names (`pg_type.typname`) a column of this
    /// kind may be decoded from.
    const PG_ARRAY_TYPES: &'static [&'static str];

    /// Whether elements are double-quoted in the wire literal.
    const QUOTED: bool;

    /// Parses one wire element (already unquoted and unescaped).
    fn parse_wire(raw: &str) -> Result<Self::Value, String>;

    /// Formats one element for the wire literal, before quoting.
    fn format_wire(value: &Self::Value) -> String;

    /// Parses one element of the plain-text form.
    fn parse_text(raw: &str) -> Result<Self::Value, String> {
        Self::parse_wire(raw.trim())
    }

    /// Formats one element for the plain-text form.
    fn format_text(value: &Self::Value) -> String {
        Self::format_wire(value)
    }

    /// Serializes one element for the structured encoding.
    fn serialize_value<S: Serializer>(
        value: &Self::Value,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.serialize(serializer)
    }

    /// Deserializes one element of the structured encoding.
    fn deserialize_value<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        Self::Value::deserialize(deserializer)
    }

    /// Total order used by [`PgArray::sort`](crate::PgArray::sort).
    fn compare(a: &Self::Value, b: &Self::Value) -> Ordering;
}

/// `boolean[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bool;

impl ElementKind for Bool {
    type Value = bool;

    const WIRE_TYPE: &'static str = "boolean[]";
    const ARRAY_TYPE: &'static str = "BoolArray";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_bool"];
    const QUOTED: bool = false;

    fn parse_wire(raw: &str) -> Result<bool, String> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "t" | "true" => Ok(true),
            "f" | "false" => Ok(false),
            _ => Err("invalid boolean value".to_string()),
        }
    }

    fn format_wire(value: &bool) -> String {
        (if *value { "t" } else { "f" }).to_string()
    }

    fn format_text(value: &bool) -> String {
        value.to_string()
    }

    fn compare(a: &bool, b: &bool) -> Ordering {
        a.cmp(b)
    }
}

/// `integer[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int32;

impl ElementKind for Int32 {
    type Value = i32;

    const WIRE_TYPE: &'static str = "integer[]";
    const ARRAY_TYPE: &'static str = "Int32Array";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_int4"];
    const QUOTED: bool = false;

    fn parse_wire(raw: &str) -> Result<i32, String> {
        raw.trim().parse().map_err(|e| format!("{e}"))
    }

    fn format_wire(value: &i32) -> String {
        value.to_string()
    }

    fn compare(a: &i32, b: &i32) -> Ordering {
        a.cmp(b)
    }
}

/// `bigint[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Int64;

impl ElementKind for Int64 {
    type Value = i64;

    const WIRE_TYPE: &'static str = "bigint[]";
    const ARRAY_TYPE: &'static str = "Int64Array";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_int8"];
    const QUOTED: bool = false;

    fn parse_wire(raw: &str) -> Result<i64, String> {
        raw.trim().parse().map_err(|e| format!("{e}"))
    }

    fn format_wire(value: &i64) -> String {
        value.to_string()
    }

    fn compare(a: &i64, b: &i64) -> Ordering {
        a.cmp(b)
    }
}

/// `double precision[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Float64;

impl ElementKind for Float64 {
    type Value = f64;

    const WIRE_TYPE: &'static str = "double precision[]";
    const ARRAY_TYPE: &'static str = "Float64Array";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_float8"];
    const QUOTED: bool = false;

    fn parse_wire(raw: &str) -> Result<f64, String> {
        // Rust accepts `NaN`, `inf` and `Infinity` in any case.
        raw.trim().parse().map_err(|e| format!("{e}"))
    }

    /// Shortest representation that parses back to the same value.
    fn format_wire(value: &f64) -> String {
        if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            (if value.is_sign_negative() { "-Infinity" } else { "Infinity" }).to_string()
        } else {
            value.to_string()
        }
    }

    /// JSON has no non-finite numbers; those travel as their wire spelling.
    fn serialize_value<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(&Self::format_wire(value))
        }
    }

    fn deserialize_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FloatDoc {
            Number(f64),
            Text(String),
        }

        match FloatDoc::deserialize(deserializer)? {
            FloatDoc::Number(value) => Ok(value),
            FloatDoc::Text(raw) => {
                Self::parse_wire(&raw).map_err(<D::Error as serde::de::Error>::custom)
            }
        }
    }

    fn compare(a: &f64, b: &f64) -> Ordering {
        a.total_cmp(b)
    }
}

/// `text[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Text;

impl ElementKind for Text {
    type Value = String;

    const WIRE_TYPE: &'static str = "text[]";
    const ARRAY_TYPE: &'static str = "StringArray";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_text", "_varchar", "_bpchar", "_name"];
    const QUOTED: bool = true;

    fn parse_wire(raw: &str) -> Result<String, String> {
        Ok(raw.to_string())
    }

    fn format_wire(value: &String) -> String {
        value.clone()
    }

    // Text elements keep surrounding whitespace.
    fn parse_text(raw: &str) -> Result<String, String> {
        Ok(raw.to_string())
    }

    fn compare(a: &String, b: &String) -> Ordering {
        a.cmp(b)
    }
}

/// `timestamptz[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timestamp;

impl Timestamp {
    /// PostgreSQL `timestamptz` output format; offset may be `+00` or `+05:30`.
    const PG_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.f%#z";
    const PG_NAIVE_FORMAT: &'static str = "%Y-%m-%d %H:%M:%S%.f";

    fn parse_any(raw: &str) -> Result<DateTime<Utc>, String> {
        let raw = raw.trim();
        DateTime::parse_from_str(raw, Self::PG_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|_| {
                // Values of `timestamp without time zone` columns.
                NaiveDateTime::parse_from_str(raw, Self::PG_NAIVE_FORMAT).map(|dt| dt.and_utc())
            })
            .map_err(|e| format!("parsing time failed: {e}"))
    }
}

impl ElementKind for Timestamp {
    type Value = DateTime<Utc>;

    const WIRE_TYPE: &'static str = "timestamptz[]";
    const ARRAY_TYPE: &'static str = "TimestampArray";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_timestamptz", "_timestamp"];
    const QUOTED: bool = true;

    fn parse_wire(raw: &str) -> Result<DateTime<Utc>, String> {
        Self::parse_any(raw)
    }

    fn format_wire(value: &DateTime<Utc>) -> String {
        value.format("%Y-%m-%d %H:%M:%S%.f+00").to_string()
    }

    fn format_text(value: &DateTime<Utc>) -> String {
        value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn compare(a: &DateTime<Utc>, b: &DateTime<Utc>) -> Ordering {
        a.cmp(b)
    }
}

/// `uuid[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UuidKind;

impl ElementKind for UuidKind {
    type Value = Uuid;

    const WIRE_TYPE: &'static str = "uuid[]";
    const ARRAY_TYPE: &'static str = "UuidArray";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_uuid"];
    const QUOTED: bool = true;

    fn parse_wire(raw: &str) -> Result<Uuid, String> {
        Uuid::parse_str(raw.trim()).map_err(|e| e.to_string())
    }

    fn format_wire(value: &Uuid) -> String {
        value.hyphenated().to_string()
    }

    fn compare(a: &Uuid, b: &Uuid) -> Ordering {
        a.cmp(b)
    }
}

/// `interval[]` elements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalKind;

impl ElementKind for IntervalKind {
    type Value = Interval;

    const WIRE_TYPE: &'static str = "interval[]";
    const ARRAY_TYPE: &'static str = "IntervalArray";
    const PG_ARRAY_TYPES: &'static [&'static str] = &["_interval"];
    const QUOTED: bool = true;

    fn parse_wire(raw: &str) -> Result<Interval, String> {
        parse_interval(raw).map_err(|e| e.to_string())
    }

    fn format_wire(value: &Interval) -> String {
        value.to_string()
    }

    fn compare(a: &Interval, b: &Interval) -> Ordering {
        a.cmp(b)
    }
}
