use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, Value, ValueRef};

use crate::binder::{NativeParameter, ParameterHooks};
use crate::error::DalError;
use crate::types::{DalValue, DbType};

/// A parameter bound for `SQLite`.
///
/// `SQLite` columns have storage classes rather than types; the declared
/// [`DbType`] is kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct SqliteParameter {
    name: String,
    db_type: DbType,
    value: DalValue,
}

impl Default for SqliteParameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            db_type: DbType::String,
            value: DalValue::Null,
        }
    }
}

impl SqliteParameter {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn db_type(&self) -> DbType {
        self.db_type
    }

    #[must_use]
    pub fn value(&self) -> &DalValue {
        &self.value
    }
}

impl NativeParameter for SqliteParameter {
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

fn out_of_range(value: u64) -> DalError {
    DalError::ParameterError(format!(
        "unsigned value {value} does not fit a SQLite INTEGER"
    ))
}

impl ToSql for SqliteParameter {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match &self.value {
            DalValue::Null => Value::Null,
            DalValue::U8(v) => Value::Integer(i64::from(*v)),
            DalValue::I8(v) => Value::Integer(i64::from(*v)),
            DalValue::I16(v) => Value::Integer(i64::from(*v)),
            DalValue::U16(v) => Value::Integer(i64::from(*v)),
            DalValue::I32(v) => Value::Integer(i64::from(*v)),
            DalValue::U32(v) => Value::Integer(i64::from(*v)),
            DalValue::I64(v) => Value::Integer(*v),
            DalValue::U64(v) => Value::Integer(
                i64::try_from(*v)
                    .map_err(|_| rusqlite::Error::ToSqlConversionFailure(Box::new(out_of_range(*v))))?,
            ),
            DalValue::F32(v) => Value::Real(f64::from(*v)),
            DalValue::F64(v) => Value::Real(*v),
            DalValue::Bool(v) => Value::Integer(i64::from(*v)),
            DalValue::Decimal(d) => Value::Text(d.to_string()),
            DalValue::Char(c) => Value::Text(c.to_string()),
            DalValue::Guid(g) => Value::Text(g.to_string()),
            DalValue::DateTime(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
            DalValue::DateTimeOffset(dt) => Value::Text(dt.format("%F %T%.f%:z").to_string()),
            DalValue::Text(s) | DalValue::Xml(s) => {
                return Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())));
            }
            DalValue::Bytes(b) => return Ok(ToSqlOutput::Borrowed(ValueRef::Blob(b))),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Read a column value back into a [`DalValue`].
#[must_use]
pub fn value_ref_to_dal(value: ValueRef<'_>) -> DalValue {
    match value {
        ValueRef::Null => DalValue::Null,
        ValueRef::Integer(i) => DalValue::I64(i),
        ValueRef::Real(f) => DalValue::F64(f),
        ValueRef::Text(t) => DalValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => DalValue::Bytes(b.to_vec()),
    }
}

/// Binding hooks for `SQLite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteHooks;

impl ParameterHooks for SqliteHooks {
    type Parameter = SqliteParameter;

    fn new_parameter(&self) -> SqliteParameter {
        SqliteParameter::default()
    }

    fn map_value(&self, _db_type: DbType, value: Option<&DalValue>) -> Result<DalValue, DalError> {
        match value {
            None => Ok(DalValue::Null),
            Some(DalValue::U64(v)) if i64::try_from(*v).is_err() => Err(out_of_range(*v)),
            Some(v) => Ok(v.clone()),
        }
    }
}
