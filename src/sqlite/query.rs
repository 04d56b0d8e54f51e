use rusqlite::{Batch, Connection, Statement};

use super::params::{SqliteParameter, value_ref_to_dal};
use crate::error::DalError;
use crate::types::DalValue;

const SIGILS: [char; 3] = ['@', ':', '$'];

/// Bind every parameter the statement references, under any sigil.
fn bind_statement(stmt: &mut Statement<'_>, params: &[SqliteParameter]) -> Result<(), DalError> {
    if stmt.parameter_count() == 0 {
        return Ok(());
    }
    for param in params {
        for sigil in SIGILS {
            let placeholder = format!("{sigil}{}", param.name());
            if let Some(index) = stmt.parameter_index(&placeholder)? {
                stmt.raw_bind_parameter(index, param)?;
            }
        }
    }
    Ok(())
}

/// Run every statement of `sql` in order.
///
/// With `want_scalar`, returns the first column of the first row of the first
/// statement that produces columns; `Some(None)` means that statement returned no row.
fn run_statements(
    conn: &Connection,
    sql: &str,
    params: &[SqliteParameter],
    want_scalar: bool,
) -> Result<Option<Option<DalValue>>, DalError> {
    let mut batch = Batch::new(conn, sql);
    let mut scalar = None;

    while let Some(mut stmt) = batch.next()? {
        bind_statement(&mut stmt, params)?;
        let capture = want_scalar && scalar.is_none() && stmt.column_count() > 0;

        let mut rows = stmt.raw_query();
        if capture {
            let first = match rows.next()? {
                Some(row) => Some(value_ref_to_dal(row.get_ref(0)?)),
                None => None,
            };
            scalar = Some(first);
        }
        while rows.next()?.is_some() {}
    }
    Ok(scalar)
}

/// Execute one or more statements, discarding any rows.
///
/// # Errors
/// Returns `DalError::SqliteError` for the first failing statement; earlier ones
/// have already run.
pub fn execute(conn: &Connection, sql: &str, params: &[SqliteParameter]) -> Result<(), DalError> {
    run_statements(conn, sql, params, false).map(|_| ())
}

/// Execute one or more statements and return the scalar result.
///
/// # Errors
/// Same as [`execute`].
pub fn scalar(
    conn: &Connection,
    sql: &str,
    params: &[SqliteParameter],
) -> Result<Option<DalValue>, DalError> {
    run_statements(conn, sql, params, true).map(Option::flatten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::bind_parameters;
    use crate::params::ParameterList;
    use crate::sqlite::params::SqliteHooks;

    fn bound(list: &ParameterList) -> Vec<SqliteParameter> {
        bind_parameters(&SqliteHooks, list).unwrap()
    }

    #[test]
    fn binds_by_name_under_each_sigil() {
        let conn = Connection::open_in_memory().unwrap();
        let mut list = ParameterList::new();
        list.add_value("@a", 2_i32).unwrap();
        list.add_value("b", 3_i32).unwrap();

        let value = scalar(&conn, "SELECT @a * :b + $a", &bound(&list)).unwrap();
        assert_eq!(value, Some(DalValue::I64(8)));
    }

    #[test]
    fn scalar_comes_from_first_statement_with_columns() {
        let conn = Connection::open_in_memory().unwrap();
        let sql = "CREATE TABLE t(x INTEGER); INSERT INTO t VALUES (4); SELECT x FROM t; SELECT 99;";
        assert_eq!(scalar(&conn, sql, &[]).unwrap(), Some(DalValue::I64(4)));
    }

    #[test]
    fn no_row_and_null_row_differ() {
        let conn = Connection::open_in_memory().unwrap();
        execute(&conn, "CREATE TABLE t(x INTEGER)", &[]).unwrap();
        assert_eq!(scalar(&conn, "SELECT x FROM t", &[]).unwrap(), None);
        assert_eq!(scalar(&conn, "SELECT NULL", &[]).unwrap(), Some(DalValue::Null));
    }

    #[test]
    fn failing_statement_stops_the_batch() {
        let conn = Connection::open_in_memory().unwrap();
        let err = execute(
            &conn,
            "CREATE TABLE t(x INTEGER); INSERT INTO missing VALUES (1); INSERT INTO t VALUES (1);",
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, DalError::SqliteError(_)));
        assert_eq!(scalar(&conn, "SELECT COUNT(*) FROM t", &[]).unwrap(), Some(DalValue::I64(0)));
    }
}
