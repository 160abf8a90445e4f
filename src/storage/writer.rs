use crate::error::{AppError, AppResult};
use crate::types::RequestRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use deadpool_sqlite::Pool;
use rusqlite::params;

/// Fixed-width RFC 3339 so stored timestamps order lexicographically.
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Write captured requests with their queries and responses in a single
/// transaction. Existing rows with the same ids are replaced.
pub async fn write_requests(pool: &Pool, records: Vec<RequestRecord>) -> AppResult<usize> {
    if records.is_empty() {
        return Ok(0);
    }

    let conn = pool
        .get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))?;

    let written = conn
        .interact(move |conn| {
            let tx = conn.transaction()?;

            {
                let mut clear_queries =
                    tx.prepare_cached("DELETE FROM sql_queries WHERE request_id = ?1")?;
                let mut clear_response =
                    tx.prepare_cached("DELETE FROM responses WHERE request_id = ?1")?;
                let mut upsert_request = tx.prepare_cached(
                    "INSERT INTO requests (id, path, view_name, method, start_time, time_taken)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT (id) DO UPDATE SET
                        path       = excluded.path,
                        view_name  = excluded.view_name,
                        method     = excluded.method,
                        start_time = excluded.start_time,
                        time_taken = excluded.time_taken",
                )?;
                let mut insert_query = tx.prepare_cached(
                    "INSERT INTO sql_queries (id, request_id, query, time_taken, seq)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                let mut insert_response = tx.prepare_cached(
                    "INSERT INTO responses (id, request_id, status_code) VALUES (?1, ?2, ?3)",
                )?;

                for r in &records {
                    upsert_request.execute(params![
                        r.id,
                        r.path,
                        r.view_name,
                        r.method,
                        encode_timestamp(&r.start_time),
                        r.time_taken,
                    ])?;
                    clear_queries.execute([&r.id])?;
                    clear_response.execute([&r.id])?;

                    for (seq, q) in r.queries.iter().enumerate() {
                        insert_query.execute(params![q.id, r.id, q.query, q.time_taken, seq as i64])?;
                    }
                    if let Some(resp) = &r.response {
                        insert_response.execute(params![resp.id, r.id, resp.status_code])?;
                    }
                }
            }

            tx.commit()?;
            Ok::<_, rusqlite::Error>(records.len())
        })
        .await??;

    tracing::debug!(count = written, "wrote request batch");
    Ok(written)
}

/// Tables holding captured telemetry, children before parents.
const TELEMETRY_TABLES: [&str; 3] = ["sql_queries", "responses", "requests"];

/// Delete every captured request with its queries and response. Selection
/// state is left alone. Returns the tables that were cleared.
pub async fn clear_requests(pool: &Pool) -> AppResult<Vec<&'static str>> {
    let conn = pool
        .get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))?;

    let deleted = conn
        .interact(|conn| {
            let tx = conn.transaction()?;
            let mut deleted = 0usize;
            for table in TELEMETRY_TABLES {
                deleted += tx.execute(&format!("DELETE FROM {table}"), [])?;
            }
            tx.commit()?;
            Ok::<_, rusqlite::Error>(deleted)
        })
        .await??;

    tracing::info!(rows = deleted, "cleared captured requests");
    Ok(TELEMETRY_TABLES.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::selection::{SelectionStore, SqliteSelectionStore};
    use crate::storage::loader::{load_requests, LoadOptions};
    use crate::storage::sqlite::{create_pool, init_pool};
    use crate::types::{QueryRecord, ResponseRecord};
    use chrono::TimeZone;
    use serde_json::json;

    fn request(id: &str) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            path: "/orders/".to_string(),
            view_name: "orders".to_string(),
            method: "GET".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap(),
            time_taken: Some(12.0),
            queries: vec![QueryRecord {
                id: format!("{id}-q0"),
                request_id: id.to_string(),
                query: "SELECT 1".to_string(),
                time_taken: Some(0.5),
            }],
            response: Some(ResponseRecord {
                id: format!("{id}-resp"),
                request_id: id.to_string(),
                status_code: Some(200),
            }),
        }
    }

    #[tokio::test]
    async fn test_clear_requests_empties_telemetry_only() {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseConfig {
            path: dir.path().join("telemetry.db"),
            pool_size: 2,
        };
        let pool = create_pool(&db).unwrap();
        init_pool(&pool).await.unwrap();
        assert_eq!(write_requests(&pool, vec![request("a"), request("b")]).await.unwrap(), 2);

        let store = SqliteSelectionStore::open(&db.path).unwrap();
        let mut state = crate::selection::SelectionState::new();
        state.insert("show", json!(10));
        store.save("request_filters:s", &state).unwrap();

        let cleared = clear_requests(&pool).await.unwrap();
        assert_eq!(cleared, vec!["sql_queries", "responses", "requests"]);

        let opts = LoadOptions {
            max_requests: 100,
            window_hours: None,
            now: Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap(),
        };
        assert!(load_requests(&pool, &opts).await.unwrap().is_empty());
        assert_eq!(store.get("request_filters:s").unwrap(), state);

        // Clearing an empty database is fine.
        assert_eq!(clear_requests(&pool).await.unwrap().len(), 3);
    }
}
