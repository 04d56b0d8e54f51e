use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use tiberius::{ColumnData, FromSql, Query};

use super::config::MssqlClient;
use super::params::MssqlParameter;
use crate::error::DalError;
use crate::translation::translate_named_parameters;
use crate::types::{DalValue, Decimal};

/// Build a query with every parameter bound in order.
///
/// `@name` references are rewritten to the positional placeholders tiberius sends.
pub fn bind_query(sql: &str, params: Vec<MssqlParameter>) -> Query<'static> {
    let names: Vec<&str> = params.iter().map(MssqlParameter::name).collect();
    let text = translate_named_parameters(sql, &names).into_owned();

    let mut query = Query::new(text);
    for param in params {
        query.bind(param);
    }
    query
}

/// Run a statement, discarding any rows it produces.
///
/// # Errors
/// Returns `DalError::MssqlError` with the server's error.
pub async fn execute(
    client: &mut MssqlClient,
    sql: &str,
    params: Vec<MssqlParameter>,
) -> Result<(), DalError> {
    bind_query(sql, params).execute(client).await?;
    Ok(())
}

/// First column of the first row, `None` when no row came back.
///
/// # Errors
/// Returns `DalError::MssqlError` with the server's error, or
/// `DalError::ExecutionError` if the column cannot be converted.
pub async fn scalar(
    client: &mut MssqlClient,
    sql: &str,
    params: Vec<MssqlParameter>,
) -> Result<Option<DalValue>, DalError> {
    let stream = bind_query(sql, params).query(client).await?;
    let Some(row) = stream.into_row().await? else {
        return Ok(None);
    };
    match row.into_iter().next() {
        Some(column) => column_to_value(&column).map(Some),
        None => Ok(None),
    }
}

fn temporal<'a, T: FromSql<'a>>(column: &'a ColumnData<'static>) -> Result<Option<T>, DalError> {
    T::from_sql(column).map_err(|e| {
        DalError::ExecutionError(format!("SQL Server value conversion error: {e}"))
    })
}

/// Convert one returned column into a [`DalValue`].
///
/// # Errors
/// Returns `DalError::ExecutionError` if a temporal value cannot be decoded.
pub fn column_to_value(column: &ColumnData<'static>) -> Result<DalValue, DalError> {
    let value = match column {
        ColumnData::U8(v) => v.map(DalValue::U8),
        ColumnData::I16(v) => v.map(DalValue::I16),
        ColumnData::I32(v) => v.map(DalValue::I32),
        ColumnData::I64(v) => v.map(DalValue::I64),
        ColumnData::F32(v) => v.map(DalValue::F32),
        ColumnData::F64(v) => v.map(DalValue::F64),
        ColumnData::Bit(v) => v.map(DalValue::Bool),
        ColumnData::String(v) => v.as_ref().map(|s| DalValue::Text(s.to_string())),
        ColumnData::Guid(v) => v.map(DalValue::Guid),
        ColumnData::Binary(v) => v.as_ref().map(|b| DalValue::Bytes(b.to_vec())),
        ColumnData::Numeric(v) => v
            .as_ref()
            .map(|n| DalValue::Decimal(Decimal::new(n.value(), n.scale()))),
        ColumnData::Xml(v) => v
            .as_ref()
            .map(|x| DalValue::Xml(x.clone().into_owned().into_string())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            temporal::<NaiveDateTime>(column)?.map(DalValue::DateTime)
        }
        ColumnData::Date(_) => temporal::<NaiveDate>(column)?
            .map(|d| DalValue::DateTime(d.and_time(NaiveTime::MIN))),
        ColumnData::Time(_) => {
            temporal::<NaiveTime>(column)?.map(|t| DalValue::Text(t.to_string()))
        }
        ColumnData::DateTimeOffset(_) => {
            temporal::<DateTime<FixedOffset>>(column)?.map(DalValue::DateTimeOffset)
        }
    };
    Ok(value.unwrap_or(DalValue::Null))
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;

    #[test]
    fn nulls_of_any_type_read_back_as_null() {
        assert_eq!(column_to_value(&ColumnData::I32(None)).unwrap(), DalValue::Null);
        assert_eq!(column_to_value(&ColumnData::String(None)).unwrap(), DalValue::Null);
        assert_eq!(column_to_value(&ColumnData::DateTime2(None)).unwrap(), DalValue::Null);
    }

    #[test]
    fn converts_plain_columns() {
        assert_eq!(column_to_value(&ColumnData::I64(Some(7))).unwrap(), DalValue::I64(7));
        assert_eq!(
            column_to_value(&ColumnData::String(Some(Cow::Borrowed("hi")))).unwrap(),
            DalValue::Text("hi".into())
        );
        let numeric = tiberius::numeric::Numeric::new_with_scale(12345, 2);
        assert_eq!(
            column_to_value(&ColumnData::Numeric(Some(numeric))).unwrap(),
            DalValue::Decimal(Decimal::new(12345, 2))
        );
    }

    #[test]
    fn datetime_round_trips_through_column_data() {
        use tiberius::IntoSql;

        let dt = NaiveDate::from_ymd_opt(2024, 2, 29)
            .unwrap()
            .and_hms_milli_opt(13, 14, 15, 500)
            .unwrap();
        let column: ColumnData<'static> = dt.into_sql();
        assert_eq!(column_to_value(&column).unwrap(), DalValue::DateTime(dt));
    }
}
