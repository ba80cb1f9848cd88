//! PostgreSQL array and interval value types for generated models.
//!
//! `oxide-pgtypes` provides the column value types that
//! [`oxide-modelgen`](https://docs.rs/oxide-modelgen) emits for PostgreSQL
//! array and interval columns. Every type round-trips through three
//! encodings:
//!
//! - **Wire** - the database literal (`{1,2,3}`, `{"a","b"}`, `1h30m0s`)
//! - **Structured** - a JSON document via `serde`
//! - **Text** - a comma-joined form for form fields and query strings
//!
//! Arrays distinguish *absent* (SQL `NULL`) from *empty* (`{}`) in the wire
//! and structured encodings.
//!
//! # Example
//!
//! ```rust
//! use oxide_pgtypes::{Int64Array, Interval, StringArray};
//!
//! let tags = StringArray::from_wire(r#"{"rust","sql"}"#).unwrap();
//! assert!(tags.contains(&"sql".to_string()));
//! assert_eq!(tags.encode_text(), "rust,sql");
//!
//! let ids = Int64Array::absent();
//! assert_eq!(ids.encode_wire(), None);
//!
//! let wait: Interval = "2 days 01:00:00".parse().unwrap();
//! assert_eq!(wait.to_string(), "49h0m0s");
//! ```
//!
//! # Database bindings
//!
//! Every type implements `sqlx::{Type, Encode, Decode}` for both supported
//! databases, so generated models derive `sqlx::FromRow` for either:
//!
//! - **PostgreSQL** - native arrays and `interval` over the binary protocol
//! - **SQLite** - no native array or interval types; both are stored as
//!   TEXT holding the wire form

pub mod array;
pub mod element;
pub mod error;
pub mod interval;
mod literal;
mod postgres;
mod sqlite;

pub use array::{
    BoolArray, Float64Array, Int32Array, Int64Array, IntervalArray, PgArray, StringArray,
    TimestampArray, UuidArray,
};
pub use element::ElementKind;
pub use error::{CodecError, Result};
pub use interval::{parse_interval, Interval, INTERVAL_TYPE};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::array::{
        BoolArray, Float64Array, Int32Array, Int64Array, IntervalArray, PgArray, StringArray,
        TimestampArray, UuidArray,
    };
    pub use crate::error::{CodecError, Result};
    pub use crate::interval::Interval;
}
