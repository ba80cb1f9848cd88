//! Generic PostgreSQL array codec.
//!
//! [`PgArray<K>`] is an ordered sequence of `K::Value` that may be *absent*
//! (SQL `NULL`) as well as empty. It round-trips through three encodings:
//!
//! | encoding   | absent | empty | example                    |
//! |------------|--------|-------|----------------------------|
//! | wire       | `NULL` | `{}`  | `{"a","b"}`, `{1,2}`       |
//! | structured | `null` | `[]`  | `["a","b"]`, `[1,2]`       |
//! | text       | `""`   | `""`  | `a,b`, `1,2`               |
//!
//! The text form cannot tell absent from empty: both encode to the empty
//! string, which decodes as empty.

use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::element::{
    Bool, ElementKind, Float64, Int32, Int64, IntervalKind, Text, Timestamp, UuidKind,
};
use crate::error::{CodecError, Result};
use crate::literal;

/// `boolean[]` column value.
pub type BoolArray = PgArray<Bool>;
/// `integer[]` column value.
pub type Int32Array = PgArray<Int32>;
/// `bigint[]` column value.
pub type Int64Array = PgArray<Int64>;
/// `double precision[]` column value.
pub type Float64Array = PgArray<Float64>;
/// `text[]` column value.
pub type StringArray = PgArray<Text>;
/// `timestamptz[]` column value.
pub type TimestampArray = PgArray<Timestamp>;
/// `uuid[]` column value.
pub type UuidArray = PgArray<UuidKind>;
/// `interval[]` column value.
pub type IntervalArray = PgArray<IntervalKind>;

/// A nullable, ordered array of `K` elements.
pub struct PgArray<K: ElementKind> {
    items: Option<Vec<K::Value>>,
    kind: PhantomData<K>,
}

impl<K: ElementKind> PgArray<K> {
    /// Creates an absent (NULL) array.
    #[must_use]
    pub const fn absent() -> Self {
        Self {
            items: None,
            kind: PhantomData,
        }
    }

    /// Creates a present, empty array.
    #[must_use]
    pub const fn empty() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Creates a present array holding `items`.
    #[must_use]
    pub const fn from_vec(items: Vec<K::Value>) -> Self {
        Self {
            items: Some(items),
            kind: PhantomData,
        }
    }

    /// Returns the declared PostgreSQL type (e.g. `integer[]`).
    #[must_use]
    pub const fn declared_type() -> &'static str {
        K::WIRE_TYPE
    }

    /// Returns the column type this array maps to for a dialect.
    ///
    /// Only PostgreSQL has native array columns.
    #[must_use]
    pub fn db_data_type(dialect: &str) -> Option<&'static str> {
        (dialect == "postgres").then_some(K::WIRE_TYPE)
    }

    /// Returns `true` if the array is NULL.
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.items.is_none()
    }

    /// Returns `true` if the array has no elements (absent or empty).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Number of elements; zero when absent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Elements as a slice; empty when absent.
    #[must_use]
    pub fn as_slice(&self) -> &[K::Value] {
        self.items.as_deref().unwrap_or_default()
    }

    /// Iterates over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, K::Value> {
        self.as_slice().iter()
    }

    /// Consumes the array, returning `None` when absent.
    #[must_use]
    pub fn into_option(self) -> Option<Vec<K::Value>> {
        self.items
    }

    /// Consumes the array, returning its elements (empty when absent).
    #[must_use]
    pub fn into_vec(self) -> Vec<K::Value> {
        self.items.unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Wire encoding
    // ------------------------------------------------------------------

    /// Decodes a raw database value. `None` is SQL NULL.
    pub fn decode_wire(raw: Option<&[u8]>) -> Result<Self> {
        match raw {
            None => Ok(Self::absent()),
            Some(bytes) => Self::from_wire(std::str::from_utf8(bytes)?),
        }
    }

    /// Decodes a textual database value. `None` is SQL NULL.
    pub fn decode_wire_str(raw: Option<&str>) -> Result<Self> {
        raw.map_or_else(|| Ok(Self::absent()), Self::from_wire)
    }

    /// Decodes a non-NULL array literal such as `{1,2,3}`.
    pub fn from_wire(literal: &str) -> Result<Self> {
        let elements = literal::split(literal)
            .map_err(|e| CodecError::element(K::WIRE_TYPE, e.index, e.raw, e.message))?;

        let mut items = Vec::with_capacity(elements.len());
        for (index, element) in elements.into_iter().enumerate() {
            if !element.quoted && element.text.eq_ignore_ascii_case("null") {
                return Err(CodecError::element(
                    K::WIRE_TYPE,
                    index,
                    element.text,
                    "NULL elements are not supported",
                ));
            }
            let value = K::parse_wire(&element.text).map_err(|message| {
                CodecError::element(K::WIRE_TYPE, index, &element.text, message)
            })?;
            items.push(value);
        }
        Ok(Self::from_vec(items))
    }

    /// Encodes the array as a database literal.
    ///
    /// Returns `None` for an absent array; the caller binds SQL NULL.
    #[must_use]
    pub fn encode_wire(&self) -> Option<String> {
        let items = self.items.as_ref()?;
        Some(literal::join(items.iter().map(|value| {
            let text = K::format_wire(value);
            if K::QUOTED {
                literal::quote(&text)
            } else {
                text
            }
        })))
    }

    // ------------------------------------------------------------------
    // Structured encoding
    // ------------------------------------------------------------------

    /// Encodes the array as a JSON document (`null` when absent).
    pub fn encode_structured(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decodes the array from a JSON document.
    pub fn decode_structured(doc: &serde_json::Value) -> Result<Self> {
        Ok(Self::deserialize(doc)?)
    }

    // ------------------------------------------------------------------
    // Text encoding
    // ------------------------------------------------------------------

    /// Encodes the elements comma-joined, without braces or quotes.
    #[must_use]
    pub fn encode_text(&self) -> String {
        self.iter().map(K::format_text).collect::<Vec<_>>().join(",")
    }

    /// Encodes a possibly missing array; `None` becomes the empty string.
    #[must_use]
    pub fn encode_text_nullable(value: Option<&Self>) -> String {
        value.map(Self::encode_text).unwrap_or_default()
    }

    /// Decodes the comma-joined text form. The empty string is an empty
    /// array, never an absent one.
    pub fn decode_text(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::empty());
        }
        s.split(',')
            .enumerate()
            .map(|(index, part)| {
                K::parse_text(part)
                    .map_err(|message| CodecError::element(K::WIRE_TYPE, index, part, message))
            })
            .collect::<Result<Vec<_>>>()
            .map(Self::from_vec)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    /// Returns `true` if `value` is one of the elements.
    #[must_use]
    pub fn contains(&self, value: &K::Value) -> bool {
        self.as_slice().contains(value)
    }

    /// Position of the first element equal to `value`.
    #[must_use]
    pub fn index_of(&self, value: &K::Value) -> Option<usize> {
        self.iter().position(|x| x == value)
    }

    /// Drops later duplicates, keeping first-occurrence order.
    #[must_use]
    pub fn unique(&self) -> Self {
        let Some(items) = &self.items else {
            return Self::absent();
        };
        let mut seen = HashSet::with_capacity(items.len());
        Self::from_vec(
            items
                .iter()
                .filter(|value| seen.insert(K::format_wire(value)))
                .cloned()
                .collect(),
        )
    }

    /// Keeps the elements matching `predicate`, in order.
    #[must_use]
    pub fn filter(&self, mut predicate: impl FnMut(&K::Value) -> bool) -> Self {
        match &self.items {
            None => Self::absent(),
            Some(items) => Self::from_vec(items.iter().filter(|v| predicate(v)).cloned().collect()),
        }
    }

    /// Returns a new array with `values` added at the end.
    ///
    /// The receiver is left untouched; appending to an absent array yields
    /// a present one.
    #[must_use]
    pub fn append(&self, values: impl IntoIterator<Item = K::Value>) -> Self {
        let mut items = self.as_slice().to_vec();
        items.extend(values);
        Self::from_vec(items)
    }

    /// Same length and pairwise-equal elements. Absent equals empty.
    #[must_use]
    pub fn equals(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }

    /// Sorts the elements in place using the kind's ordering (stable).
    pub fn sort(&mut self) {
        if let Some(items) = &mut self.items {
            items.sort_by(K::compare);
        }
    }
}

impl<K: ElementKind> Clone for PgArray<K> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            kind: PhantomData,
        }
    }
}

impl<K: ElementKind> fmt::Debug for PgArray<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(K::ARRAY_TYPE).field(&self.items).finish()
    }
}

/// Structural equality: absent and empty differ. See [`PgArray::equals`].
impl<K: ElementKind> PartialEq for PgArray<K> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<K: ElementKind> Default for PgArray<K> {
    fn default() -> Self {
        Self::absent()
    }
}

impl<K: ElementKind> From<Vec<K::Value>> for PgArray<K> {
    fn from(items: Vec<K::Value>) -> Self {
        Self::from_vec(items)
    }
}

impl<K: ElementKind> From<Option<Vec<K::Value>>> for PgArray<K> {
    fn from(items: Option<Vec<K::Value>>) -> Self {
        Self {
            items,
            kind: PhantomData,
        }
    }
}

impl<K: ElementKind> FromIterator<K::Value> for PgArray<K> {
    fn from_iter<I: IntoIterator<Item = K::Value>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<'a, K: ElementKind> IntoIterator for &'a PgArray<K> {
    type Item = &'a K::Value;
    type IntoIter = std::slice::Iter<'a, K::Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: ElementKind> fmt::Display for PgArray<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode_text())
    }
}

impl<K: ElementKind> FromStr for PgArray<K> {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode_text(s)
    }
}

impl<K: ElementKind> Serialize for PgArray<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.items {
            Some(items) => serializer.collect_seq(items.iter().map(ElementRef::<K>::new)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de, K: ElementKind> Deserialize<'de> for PgArray<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let docs = Option::<Vec<ElementDoc<K>>>::deserialize(deserializer)?;
        let items = docs.map(|docs| docs.into_iter().map(|doc| doc.value).collect());
        Ok(Self::from(items))
    }
}

/// Borrowed element serialized through [`ElementKind::serialize_value`].
struct ElementRef<'a, K: ElementKind> {
    value: &'a K::Value,
    kind: PhantomData<K>,
}

impl<'a, K: ElementKind> ElementRef<'a, K> {
    const fn new(value: &'a K::Value) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }
}

impl<K: ElementKind> Serialize for ElementRef<'_, K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        K::serialize_value(self.value, serializer)
    }
}

/// Owned element deserialized through [`ElementKind::deserialize_value`].
struct ElementDoc<K: ElementKind> {
    value: K::Value,
    kind: PhantomData<K>,
}

impl<'de, K: ElementKind> Deserialize<'de> for ElementDoc<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(Self {
            value: K::deserialize_value(deserializer)?,
            kind: PhantomData,
        })
    }
}
