use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::{Acquire, PgPool, Postgres, Transaction};

use crate::error::Result;
use crate::export::schema::{ColumnValue, ExportPlan, ExportRecord};
use crate::models::Submission;

/// SQLSTATE `duplicate_table`.
const DUPLICATE_TABLE: &str = "42P07";
/// SQLSTATE `unique_violation`, raised on the type catalog when two
/// transactions create the same table concurrently.
const UNIQUE_VIOLATION: &str = "23505";

/// Persist a record into the table of its form, creating the table first
/// if needed.
///
/// Table creation and the insert share one transaction: either the row is
/// written into an existing or newly created table, or nothing persists.
/// Rows are appended; exporting the same record twice yields two rows.
/// Returns the number of rows inserted.
#[tracing::instrument(skip(pool, record), fields(record_id = %record.id, form_id = %record.form_id))]
pub async fn export_record(pool: &PgPool, record: &ExportRecord) -> Result<u64> {
    tracing::info!("persisting record id: {}", record.id);

    let plan = ExportPlan::build(record)?;
    let ddl = plan.ddl();
    let (insert_sql, params) = plan.insert();

    let mut tx = pool.begin().await?;

    tracing::info!(table = plan.table(), "table: {ddl}");
    ensure_table(&mut tx, &ddl).await?;

    tracing::info!("record: {insert_sql}");
    let mut query = sqlx::query(&insert_sql);
    for value in &params {
        query = bind_value(query, value);
    }
    let affected = query.execute(&mut *tx).await?.rows_affected();

    tx.commit().await?;

    tracing::info!("{affected} records affected");
    Ok(affected)
}

/// Export the payload of a stored submission.
pub async fn export_submission(pool: &PgPool, submission: &Submission) -> Result<u64> {
    let record = ExportRecord::from_submission(submission)?;
    export_record(pool, &record).await
}

/// Run the create-table statement inside a savepoint.
///
/// A concurrent creator winning the race surfaces as one of two errors;
/// both roll back only the savepoint and count as the table being present.
async fn ensure_table(tx: &mut Transaction<'_, Postgres>, ddl: &str) -> Result<()> {
    let mut savepoint = tx.begin().await?;
    match sqlx::query(ddl).execute(&mut *savepoint).await {
        Ok(_) => {
            savepoint.commit().await?;
            Ok(())
        }
        Err(e) if is_concurrent_create(&e) => {
            tracing::debug!(error = %e, "table created concurrently");
            savepoint.rollback().await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn is_concurrent_create(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == DUPLICATE_TABLE || code == UNIQUE_VIOLATION)
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q ColumnValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        ColumnValue::Null => query.bind(None::<String>),
        ColumnValue::Text(s) => query.bind(s.as_str()),
        ColumnValue::Integer(i) => query.bind(*i),
        ColumnValue::Decimal(d) => query.bind(*d),
        ColumnValue::Boolean(b) => query.bind(*b),
        ColumnValue::Timestamp(ts) => query.bind(*ts),
    }
}
