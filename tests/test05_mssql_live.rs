#![cfg(feature = "mssql")]
//! Runs against a real server when `TESTING_MSSQL_CONNECTION` holds an ADO.NET
//! connection string, e.g.
//! `Server=tcp:localhost,1433;User Id=sa;Password=...;TrustServerCertificate=true`.

use chrono::NaiveDate;
use sql_dal::prelude::*;

fn live_dal() -> Option<SqlServerDal> {
    std::env::var("TESTING_MSSQL_CONNECTION")
        .ok()
        .map(SqlServerDal::new)
}

fn unique_table(prefix: &str) -> String {
    format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
}

#[tokio::test]
async fn insert_count_and_rollback() -> Result<(), DalError> {
    let Some(dal) = live_dal() else {
        return Ok(());
    };
    let settings = ExecutionSettings::default();
    let table = unique_table("dal_people");

    dal.check_connection_or_validate(true).await?;
    assert!(dal.is_connection_valid(dal.connection_string(), &settings).await);

    dal.execute_non_query(
        &format!("CREATE TABLE {table}(id INT IDENTITY PRIMARY KEY, name NVARCHAR(50) NOT NULL, born DATETIME NULL)"),
        &settings,
        None,
    )
    .await?;

    let mut params = ParameterList::new();
    params.add_value("@name", "alice")?;
    params.add_value(
        "@born",
        NaiveDate::from_ymd_opt(1700, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )?;
    dal.execute_non_query(
        &format!("INSERT INTO {table}(name, born) VALUES (@name, @born)"),
        &settings,
        Some(&params),
    )
    .await?;

    let mut lookup = ParameterList::new();
    lookup.add_value("name", "alice")?;
    let count = dal
        .execute_scalar(
            &format!("SELECT COUNT(*) FROM {table} WHERE name = @name AND born = '1753-01-01'"),
            &settings,
            Some(&lookup),
        )
        .await?;
    assert_eq!(count, Some(DalValue::I32(1)));

    // The second insert violates NOT NULL, so the first must be rolled back too.
    let err = dal
        .execute_non_query(
            &format!("INSERT INTO {table}(name) VALUES ('bob'); INSERT INTO {table}(name) VALUES (NULL);"),
            &settings,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err.original(), DalError::MssqlError(_)), "{err}");
    let total = dal
        .execute_scalar(&format!("SELECT COUNT(*) FROM {table}"), &settings, None)
        .await?;
    assert_eq!(total, Some(DalValue::I32(1)));

    let empty = dal
        .execute_scalar(&format!("SELECT name FROM {table} WHERE 1 = 0"), &settings, None)
        .await?;
    assert_eq!(empty, None);

    dal.execute_non_query(&format!("DROP TABLE {table}"), &settings, None)
        .await?;
    Ok(())
}

#[tokio::test]
async fn long_running_statement_times_out() -> Result<(), DalError> {
    let Some(dal) = live_dal() else {
        return Ok(());
    };
    let err = dal
        .execute_non_query("WAITFOR DELAY '00:00:05'", &ExecutionSettings::new(true, 1), None)
        .await
        .unwrap_err();
    assert!(err.is_timeout(), "{err}");
    Ok(())
}
