use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewReport, ReconciliationReport, ReportType},
};

const REPORT_COLUMNS: &str = "id, task_id, report_type, report_data, generated_at";

fn report_from_row(row: &SqliteRow) -> Result<ReconciliationReport, SqliteDatabaseError> {
    let report_type = match row.try_get::<String, _>("report_type")?.as_str() {
        "Summary" => ReportType::Summary,
        "Detail" => ReportType::Detail,
        s => return Err(SqliteDatabaseError::QueryError(format!("Invalid report type: {s}"))),
    };
    let report_data = serde_json::from_str(row.try_get::<String, _>("report_data")?.as_str())
        .map_err(|e| SqliteDatabaseError::MalformedPayload(e.to_string()))?;
    Ok(ReconciliationReport {
        id: row.try_get("id")?,
        task_id: row.try_get("task_id")?,
        report_type,
        report_data,
        generated_at: row.try_get("generated_at")?,
    })
}

pub async fn insert_report(
    report: NewReport,
    conn: &mut SqliteConnection,
) -> Result<ReconciliationReport, SqliteDatabaseError> {
    let row = sqlx::query(
        r#"INSERT INTO reconciliation_reports (task_id, report_type, report_data)
           VALUES ($1, $2, $3) RETURNING id"#,
    )
    .bind(&report.task_id)
    .bind(report.report_type.to_string())
    .bind(report.report_data.to_string())
    .fetch_one(&mut *conn)
    .await?;
    let id: i64 = row.try_get("id")?;
    let row = sqlx::query(&format!("SELECT {REPORT_COLUMNS} FROM reconciliation_reports WHERE id = $1"))
        .bind(id)
        .fetch_one(conn)
        .await?;
    report_from_row(&row)
}

pub async fn fetch_for_task(
    task_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<ReconciliationReport>, SqliteDatabaseError> {
    let rows = sqlx::query(&format!(
        "SELECT {REPORT_COLUMNS} FROM reconciliation_reports WHERE task_id = $1 ORDER BY id"
    ))
    .bind(task_id)
    .fetch_all(conn)
    .await?;
    rows.iter().map(report_from_row).collect()
}

pub async fn delete_before(cutoff: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query("DELETE FROM reconciliation_reports WHERE generated_at < $1")
        .bind(cutoff)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
