use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime};
use tiberius::xml::XmlData;
use tiberius::{ColumnData, IntoSql, numeric::Numeric};

use crate::binder::{NativeParameter, ParameterHooks};
use crate::error::DalError;
use crate::types::{DalValue, DbType, Decimal};

/// A parameter bound for SQL Server.
#[derive(Debug, Clone, PartialEq)]
pub struct MssqlParameter {
    name: String,
    db_type: DbType,
    /// Informational only: tiberius declares `nvarchar` lengths from the value itself.
    size: Option<usize>,
    value: DalValue,
}

impl Default for MssqlParameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            db_type: DbType::String,
            size: None,
            value: DalValue::Null,
        }
    }
}

impl MssqlParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    /// Length of a string parameter in UTF-16 code units, at least one.
    ///
    /// Kept for logging and inspection; it is not sent to the server.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        self.size
    }

    #[must_use]
    pub fn value(&self) -> &DalValue {
        &self.value
    }
}

impl NativeParameter for MssqlParameter {
    fn set_db_type(&mut self, db_type: DbType) {
        self.db_type = db_type;
    }

    fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    fn set_value(&mut self, value: DalValue) {
        self.value = value;
    }
}

/// A NULL typed after the parameter's declared type, so the server sees the right column type.
fn typed_null(db_type: DbType) -> ColumnData<'static> {
    match db_type {
        DbType::Byte => ColumnData::U8(None),
        DbType::SByte | DbType::Int16 => ColumnData::I16(None),
        DbType::UInt16 | DbType::Int32 => ColumnData::I32(None),
        DbType::UInt32 | DbType::Int64 => ColumnData::I64(None),
        DbType::UInt64 | DbType::Decimal => ColumnData::Numeric(None),
        DbType::Single => ColumnData::F32(None),
        DbType::Double => ColumnData::F64(None),
        DbType::Boolean => ColumnData::Bit(None),
        DbType::String | DbType::StringFixedLength => ColumnData::String(None),
        DbType::Binary => ColumnData::Binary(None),
        DbType::Guid => ColumnData::Guid(None),
        DbType::DateTime => ColumnData::DateTime2(None),
        DbType::DateTimeOffset => ColumnData::DateTimeOffset(None),
        DbType::Xml => ColumnData::Xml(None),
    }
}

impl<'a> IntoSql<'a> for MssqlParameter {
    fn into_sql(self) -> ColumnData<'a> {
        match self.value {
            DalValue::Null => typed_null(self.db_type),
            DalValue::U8(v) => ColumnData::U8(Some(v)),
            DalValue::I8(v) => ColumnData::I16(Some(i16::from(v))),
            DalValue::I16(v) => ColumnData::I16(Some(v)),
            DalValue::U16(v) => ColumnData::I32(Some(i32::from(v))),
            DalValue::I32(v) => ColumnData::I32(Some(v)),
            DalValue::U32(v) => ColumnData::I64(Some(i64::from(v))),
            DalValue::I64(v) => ColumnData::I64(Some(v)),
            DalValue::U64(v) => ColumnData::Numeric(Some(Numeric::new_with_scale(i128::from(v), 0))),
            DalValue::F32(v) => ColumnData::F32(Some(v)),
            DalValue::F64(v) => ColumnData::F64(Some(v)),
            DalValue::Decimal(d) => {
                ColumnData::Numeric(Some(Numeric::new_with_scale(d.mantissa(), d.scale())))
            }
            DalValue::Bool(v) => ColumnData::Bit(Some(v)),
            DalValue::Text(s) => ColumnData::String(Some(Cow::Owned(s))),
            DalValue::Char(c) => ColumnData::String(Some(Cow::Owned(c.to_string()))),
            DalValue::Bytes(b) => ColumnData::Binary(Some(Cow::Owned(b))),
            DalValue::Guid(g) => ColumnData::Guid(Some(g)),
            DalValue::DateTime(dt) => dt.into_sql(),
            DalValue::DateTimeOffset(dt) => dt.into_sql(),
            DalValue::Xml(s) => ColumnData::Xml(Some(Cow::Owned(XmlData::new(s)))),
        }
    }
}

/// Earliest value of the SQL Server `datetime` type.
#[must_use]
pub fn min_sql_datetime() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1753, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Binding hooks for SQL Server.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerHooks;

/// `numeric(38, s)` holds at most 38 digits with `s < 38`.
fn fits_numeric(d: &Decimal) -> bool {
    d.scale() <= MAX_NUMERIC_SCALE && d.mantissa().unsigned_abs() < 10_u128.pow(38)
}

const MAX_NUMERIC_SCALE: u8 = 37;

impl ParameterHooks for SqlServerHooks {
    type Parameter = MssqlParameter;

    fn new_parameter(&self) -> MssqlParameter {
        MssqlParameter::default()
    }

    fn map_value(&self, db_type: DbType, value: Option<&DalValue>) -> Result<DalValue, DalError> {
        match value {
            None => Ok(DalValue::Null),
            Some(DalValue::DateTime(dt)) if db_type == DbType::DateTime => {
                match min_sql_datetime() {
                    Some(min) if *dt < min => Ok(DalValue::DateTime(min)),
                    _ => Ok(DalValue::DateTime(*dt)),
                }
            }
            Some(DalValue::Decimal(d)) if !fits_numeric(d) => Err(DalError::ParameterError(
                format!("decimal {d} exceeds SQL Server numeric range (38 digits, scale at most 37)"),
            )),
            Some(v) => Ok(v.clone()),
        }
    }

    fn customize_parameter(
        &self,
        parameter: &mut MssqlParameter,
        _db_type: DbType,
        value: Option<&DalValue>,
    ) {
        parameter.size = match value {
            Some(DalValue::Text(s)) => Some(s.encode_utf16().count().max(1)),
            _ => None,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_parameters;
    use crate::params::{DalParameter, ParameterList};
    use crate::types::SemanticType;

    fn bind_one(param: DalParameter) -> MssqlParameter {
        let mut list = ParameterList::new();
        list.add(param).unwrap();
        bind_parameters(&SqlServerHooks, &list).unwrap().remove(0)
    }

    #[test]
    fn string_size_counts_utf16_units_with_floor_of_one() {
        assert_eq!(bind_one(DalParameter::with_value("s", "")).size(), Some(1));
        assert_eq!(bind_one(DalParameter::with_value("s", "abc")).size(), Some(3));
        assert_eq!(bind_one(DalParameter::with_value("s", "a😀")).size(), Some(3));
        assert_eq!(bind_one(DalParameter::with_value("n", 4_i32)).size(), None);
    }

    #[test]
    fn unsigned_and_small_signed_widen() {
        let col = bind_one(DalParameter::with_value("v", 70_000_u32)).into_sql();
        assert!(matches!(col, ColumnData::I64(Some(70_000))));
        let col = bind_one(DalParameter::with_value("v", -3_i8)).into_sql();
        assert!(matches!(col, ColumnData::I16(Some(-3))));
        let col = bind_one(DalParameter::with_value("v", u64::MAX)).into_sql();
        match col {
            ColumnData::Numeric(Some(n)) => assert_eq!(n.value(), i128::from(u64::MAX)),
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    #[test]
    fn nulls_carry_the_declared_type() {
        let col = bind_one(DalParameter::null("g", SemanticType::Guid)).into_sql();
        assert!(matches!(col, ColumnData::Guid(None)));
        let col = bind_one(DalParameter::null("d", SemanticType::DateTime)).into_sql();
        assert!(matches!(col, ColumnData::DateTime2(None)));
        let col = bind_one(DalParameter::null("b", SemanticType::nullable(SemanticType::Bool)))
            .into_sql();
        assert!(matches!(col, ColumnData::Bit(None)));
    }

    #[test]
    fn early_datetimes_clamp_to_sql_minimum() {
        let early = NaiveDate::from_ymd_opt(1700, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let bound = bind_one(DalParameter::with_value("when", early));
        assert_eq!(bound.value(), &DalValue::DateTime(min_sql_datetime().unwrap()));

        let later = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        assert_eq!(bind_one(DalParameter::with_value("when", later)).value(), &DalValue::DateTime(later));
    }

    #[test]
    fn decimals_beyond_numeric_precision_fail_the_bind() {
        let bind = |d: Decimal| {
            let mut list = ParameterList::new();
            list.add_value("d", d).unwrap();
            bind_parameters(&SqlServerHooks, &list)
        };

        let tiny: Decimal = "0.000000000000000000000000000000000000001".parse().unwrap();
        assert_eq!(tiny.scale(), 39);
        assert!(matches!(bind(tiny), Err(DalError::ParameterError(_))));

        let wide = Decimal::new(10_i128.pow(38), 0);
        assert!(matches!(bind(wide), Err(DalError::ParameterError(_))));
        assert!(matches!(bind(Decimal::new(-(10_i128.pow(38)), 2)), Err(DalError::ParameterError(_))));

        let edge = Decimal::new(10_i128.pow(38) - 1, 37);
        let col = bind(edge).unwrap().remove(0).into_sql();
        assert!(matches!(col, ColumnData::Numeric(Some(n)) if n.scale() == 37));
    }
}
