use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::{
    db::{sqlite::SqliteDatabaseError, traits::ResolvedFields},
    db_types::{Discrepancy, DiscrepancyStatus, DiscrepancyType, NewDiscrepancy, SourceSystem},
};

const DISCREPANCY_COLUMNS: &str = "id, task_id, discrepancy_type, source_system, record_id, record_details, status, \
                                   resolution_notes, resolved_by, resolved_at, created_at";

fn discrepancy_from_row(row: &SqliteRow) -> Result<Discrepancy, SqliteDatabaseError> {
    let discrepancy_type = match row.try_get::<String, _>("discrepancy_type")?.as_str() {
        "Missing" => DiscrepancyType::Missing,
        "Mismatch" => DiscrepancyType::Mismatch,
        "Extra" => DiscrepancyType::Extra,
        s => return Err(SqliteDatabaseError::QueryError(format!("Invalid discrepancy type: {s}"))),
    };
    let source_system = match row.try_get::<String, _>("source_system")?.as_str() {
        "Internal" => SourceSystem::Internal,
        "Provider" => SourceSystem::Provider,
        s => return Err(SqliteDatabaseError::QueryError(format!("Invalid source system: {s}"))),
    };
    let status = match row.try_get::<String, _>("status")?.as_str() {
        "Unresolved" => DiscrepancyStatus::Unresolved,
        "Resolved" => DiscrepancyStatus::Resolved,
        s => return Err(SqliteDatabaseError::QueryError(format!("Invalid discrepancy status: {s}"))),
    };
    let record_details = serde_json::from_str(row.try_get::<String, _>("record_details")?.as_str())
        .map_err(|e| SqliteDatabaseError::MalformedPayload(e.to_string()))?;
    Ok(Discrepancy {
        id: row.try_get("id")?,
        task_id: row.try_get("task_id")?,
        discrepancy_type,
        source_system,
        record_id: row.try_get("record_id")?,
        record_details,
        status,
        resolution_notes: row.try_get("resolution_notes")?,
        resolved_by: row.try_get("resolved_by")?,
        resolved_at: row.try_get("resolved_at")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Inserts the batch within the caller's transaction. Returns the number of rows written.
pub async fn insert_batch(
    discrepancies: &[NewDiscrepancy],
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let mut inserted = 0u64;
    for d in discrepancies {
        let details = d.record_details.to_string();
        sqlx::query(
            r#"INSERT INTO reconciliation_discrepancies
               (task_id, discrepancy_type, source_system, record_id, record_details, status)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(&d.task_id)
        .bind(d.discrepancy_type.to_string())
        .bind(d.source_system.to_string())
        .bind(&d.record_id)
        .bind(details)
        .bind(DiscrepancyStatus::Unresolved.to_string())
        .execute(&mut *conn)
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

pub async fn fetch_for_task(
    task_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Discrepancy>, SqliteDatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {DISCREPANCY_COLUMNS} FROM reconciliation_discrepancies WHERE task_id = $1 ORDER BY id"
    ))
    .bind(task_id)
    .fetch_all(conn)
    .await?;
    rows.iter().map(discrepancy_from_row).collect()
}

pub async fn fetch_unresolved(conn: &mut SqliteConnection) -> Result<Vec<Discrepancy>, SqliteDatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {DISCREPANCY_COLUMNS} FROM reconciliation_discrepancies WHERE status = $1 ORDER BY id"
    ))
    .bind(DiscrepancyStatus::Unresolved.to_string())
    .fetch_all(conn)
    .await?;
    rows.iter().map(discrepancy_from_row).collect()
}

pub async fn fetch_by_id(
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Discrepancy>, SqliteDatabaseError> {
    let row = sqlx::query(&format!("SELECT {DISCREPANCY_COLUMNS} FROM reconciliation_discrepancies WHERE id = $1"))
        .bind(id)
        .fetch_optional(conn)
        .await?;
    row.as_ref().map(discrepancy_from_row).transpose()
}

/// First-writer-wins resolve. The guard on `Unresolved` makes a replay (or a lost race) report `false` instead of
/// overwriting the original resolution.
pub async fn resolve(
    id: i64,
    fields: ResolvedFields,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"UPDATE reconciliation_discrepancies
           SET status = $1, resolution_notes = $2, resolved_by = $3, resolved_at = $4
           WHERE id = $5 AND status = $6"#,
    )
    .bind(DiscrepancyStatus::Resolved.to_string())
    .bind(&fields.resolution_notes)
    .bind(&fields.resolved_by)
    .bind(fields.resolved_at)
    .bind(id)
    .bind(DiscrepancyStatus::Unresolved.to_string())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_resolved_before(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        "DELETE FROM reconciliation_discrepancies WHERE status = $1 AND resolved_at IS NOT NULL AND resolved_at < $2",
    )
    .bind(DiscrepancyStatus::Resolved.to_string())
    .bind(cutoff)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}
