//! `sqlx` bindings for PostgreSQL.
//!
//! Arrays travel as native PostgreSQL arrays through sqlx's binary array
//! codec; an absent [`PgArray`] binds and reads back as `NULL`. Intervals
//! map onto [`PgInterval`]. Month components have no fixed length and are
//! rejected, as is sub-microsecond precision when binding.

use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::{PgArgumentBuffer, PgHasArrayType, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type, ValueRef};

use crate::array::PgArray;
use crate::element::ElementKind;
use crate::error::CodecError;
use crate::interval::Interval;

const MICROS_PER_DAY: i64 = 86_400_000_000;

impl<K> Type<Postgres> for PgArray<K>
where
    K: ElementKind,
    K::Value: PgHasArrayType,
{
    fn type_info() -> PgTypeInfo {
        <K::Value as PgHasArrayType>::array_type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        K::PG_ARRAY_TYPES
            .iter()
            .any(|&name| *ty == PgTypeInfo::with_name(name))
    }
}

impl<'q, K> Encode<'q, Postgres> for PgArray<K>
where
    K: ElementKind,
    K::Value: Encode<'q, Postgres> + Type<Postgres> + PgHasArrayType,
{
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        if self.is_absent() {
            return Ok(IsNull::Yes);
        }
        <&[K::Value] as Encode<'q, Postgres>>::encode_by_ref(&self.as_slice(), buf)
    }
}

impl<'r, K> Decode<'r, Postgres> for PgArray<K>
where
    K: ElementKind,
    K::Value: for<'a> Decode<'a, Postgres> + Type<Postgres>,
{
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        if value.is_null() {
            return Ok(Self::absent());
        }
        let items = <Vec<K::Value> as Decode<'r, Postgres>>::decode(value)?;
        Ok(Self::from(items))
    }
}

impl TryFrom<Interval> for PgInterval {
    type Error = CodecError;

    fn try_from(interval: Interval) -> Result<Self, CodecError> {
        let nanos = interval.as_nanos();
        if nanos % 1_000 != 0 {
            return Err(CodecError::Unrepresentable(format!(
                "{interval} has sub-microsecond precision"
            )));
        }
        Ok(Self {
            months: 0,
            days: 0,
            microseconds: nanos / 1_000,
        })
    }
}

impl TryFrom<PgInterval> for Interval {
    type Error = CodecError;

    fn try_from(value: PgInterval) -> Result<Self, CodecError> {
        if value.months != 0 {
            return Err(CodecError::Unrepresentable(format!(
                "{} month(s) have no fixed length",
                value.months
            )));
        }
        i64::from(value.days)
            .checked_mul(MICROS_PER_DAY)
            .and_then(|micros| micros.checked_add(value.microseconds))
            .and_then(|micros| micros.checked_mul(1_000))
            .map(Self::from_nanos)
            .ok_or_else(|| {
                CodecError::Unrepresentable(format!(
                    "{} days {}us overflows the nanosecond range",
                    value.days, value.microseconds
                ))
            })
    }
}

impl Type<Postgres> for Interval {
    fn type_info() -> PgTypeInfo {
        <PgInterval as Type<Postgres>>::type_info()
    }
}

impl PgHasArrayType for Interval {
    fn array_type_info() -> PgTypeInfo {
        <PgInterval as PgHasArrayType>::array_type_info()
    }
}

impl Encode<'_, Postgres> for Interval {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        let interval = PgInterval::try_from(*self)?;
        <PgInterval as Encode<'_, Postgres>>::encode_by_ref(&interval, buf)
    }
}

impl<'r> Decode<'r, Postgres> for Interval {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let interval = <PgInterval as Decode<'r, Postgres>>::decode(value)?;
        Ok(Self::try_from(interval)?)
    }
}
