//! `sqlx` bindings for SQLite.
//!
//! SQLite has no array or interval column types, so both are stored as TEXT
//! in their wire form: arrays as `{...}` literals and intervals as compact
//! duration strings. An absent [`PgArray`] binds and reads back as `NULL`.

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteArgumentValue, SqliteTypeInfo, SqliteValueRef};
use sqlx::{Decode, Encode, Type, ValueRef};

use crate::array::PgArray;
use crate::element::ElementKind;
use crate::interval::Interval;

impl<K: ElementKind> Type<Sqlite> for PgArray<K> {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q, K: ElementKind> Encode<'q, Sqlite> for PgArray<K> {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        match self.encode_wire() {
            Some(literal) => <String as Encode<'q, Sqlite>>::encode(literal, buf),
            None => Ok(IsNull::Yes),
        }
    }
}

impl<'r, K: ElementKind> Decode<'r, Sqlite> for PgArray<K> {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Self::absent());
        }
        let literal = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Self::from_wire(literal)?)
    }
}

impl Type<Sqlite> for Interval {
    fn type_info() -> SqliteTypeInfo {
        <String as Type<Sqlite>>::type_info()
    }

    fn compatible(ty: &SqliteTypeInfo) -> bool {
        <String as Type<Sqlite>>::compatible(ty)
    }
}

impl<'q> Encode<'q, Sqlite> for Interval {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<SqliteArgumentValue<'q>>,
    ) -> Result<IsNull, BoxDynError> {
        <String as Encode<'q, Sqlite>>::encode(self.encode_wire(), buf)
    }
}

impl<'r> Decode<'r, Sqlite> for Interval {
    fn decode(value: SqliteValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Err("unexpected NULL interval; decode into Option<Interval>".into());
        }
        let text = <&str as Decode<'r, Sqlite>>::decode(value)?;
        Ok(Interval::parse(text)?)
    }
}
