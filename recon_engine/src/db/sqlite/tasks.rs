use chrono::{NaiveDate, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::TaskUpdate},
    db_types::{NewTask, ReconciliationTask, TaskStatus, TaskType},
};

const TASK_COLUMNS: &str = "id, task_id, task_type, status, task_date, start_time, end_time, total_records, \
                            matched_records, unmatched_records, error_message, created_at, updated_at";

fn task_from_row(row: &SqliteRow) -> Result<ReconciliationTask, SqliteDatabaseError> {
    let task_type = row
        .try_get::<String, _>("task_type")?
        .parse::<TaskType>()
        .map_err(|e| SqliteDatabaseError::QueryError(e.to_string()))?;
    let status = row
        .try_get::<String, _>("status")?
        .parse::<TaskStatus>()
        .map_err(|e| SqliteDatabaseError::QueryError(e.to_string()))?;
    Ok(ReconciliationTask {
        id: row.try_get("id")?,
        task_id: row.try_get("task_id")?,
        task_type,
        status,
        task_date: row.try_get("task_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        total_records: row.try_get("total_records")?,
        matched_records: row.try_get("matched_records")?,
        unmatched_records: row.try_get("unmatched_records")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub async fn insert_task(
    task: NewTask,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationTask, SqliteDatabaseError> {
    let task_id = task.task_id.clone();
    let result = sqlx::query(
        r#"INSERT INTO reconciliation_tasks (task_id, task_type, status, task_date) VALUES ($1, $2, $3, $4)"#,
    )
    .bind(&task.task_id)
    .bind(task.task_type.to_string())
    .bind(TaskStatus::Pending.to_string())
    .bind(task.task_date)
    .execute(&mut *conn)
    .await;
    match result {
        Ok(_) => (),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(SqliteDatabaseError::DuplicateTask(task_id))
        },
        Err(e) => return Err(SqliteDatabaseError::from(e)),
    }
    fetch_task_by_task_id(&task_id, conn).await?.ok_or(SqliteDatabaseError::TaskNotFound(task_id))
}

pub async fn fetch_task_by_task_id(
    task_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<ReconciliationTask>, SqliteDatabaseError> {
    let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM reconciliation_tasks WHERE task_id = $1"))
        .bind(task_id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(task_from_row).transpose()
}

pub async fn fetch_tasks_by_date_range(
    start: NaiveDate,
    end: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<Vec<ReconciliationTask>, SqliteDatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {TASK_COLUMNS} FROM reconciliation_tasks WHERE task_date >= $1 AND task_date <= $2 ORDER BY \
         task_date, id"
    ))
    .bind(start)
    .bind(end)
    .fetch_all(conn)
    .await?;
    rows.iter().map(task_from_row).collect()
}

pub async fn has_active_task(conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM reconciliation_tasks WHERE status IN ($1, $2)",
    )
    .bind(TaskStatus::Pending.to_string())
    .bind(TaskStatus::Running.to_string())
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

/// Applies the update to the task row, enforcing the monotonic status lifecycle. A status the current state cannot
/// transition to is rejected with [`SqliteDatabaseError::InvalidStatusTransition`].
pub async fn update_task(
    task_id: &str,
    update: TaskUpdate,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationTask, SqliteDatabaseError> {
    let current = fetch_task_by_task_id(task_id, &mut *conn)
        .await?
        .ok_or_else(|| SqliteDatabaseError::TaskNotFound(task_id.to_string()))?;
    if update.is_empty() {
        return Ok(current);
    }
    if let Some(next) = update.status {
        if !current.status.can_transition_to(next) {
            return Err(SqliteDatabaseError::InvalidStatusTransition {
                task_id: task_id.to_string(),
                from: current.status,
                to: next,
            });
        }
    }
    let status = update.status.unwrap_or(current.status);
    let start_time = update.start_time.or(current.start_time);
    let end_time = update.end_time.or(current.end_time);
    let total = update.total_records.unwrap_or(current.total_records);
    let matched = update.matched_records.unwrap_or(current.matched_records);
    let unmatched = update.unmatched_records.unwrap_or(current.unmatched_records);
    let error_message = update.error_message.or(current.error_message);
    sqlx::query(
        r#"UPDATE reconciliation_tasks
           SET status = $1, start_time = $2, end_time = $3, total_records = $4, matched_records = $5,
               unmatched_records = $6, error_message = $7, updated_at = $8
           WHERE task_id = $9"#,
    )
    .bind(status.to_string())
    .bind(start_time)
    .bind(end_time)
    .bind(total)
    .bind(matched)
    .bind(unmatched)
    .bind(error_message)
    .bind(Utc::now())
    .bind(task_id)
    .execute(&mut *conn)
    .await?;
    fetch_task_by_task_id(task_id, conn).await?.ok_or_else(|| SqliteDatabaseError::TaskNotFound(task_id.to_string()))
}
