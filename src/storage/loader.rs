use crate::error::{AppError, AppResult};
use crate::storage::writer::encode_timestamp;
use crate::types::{QueryRecord, RequestRecord, ResponseRecord};
use chrono::{DateTime, TimeDelta, Utc};
use deadpool_sqlite::Pool;
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};
use std::collections::HashMap;

/// Bounds on the batch handed to the analytics core.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub max_requests: usize,
    /// Only load requests started within this many hours of `now`.
    pub window_hours: Option<u64>,
    pub now: DateTime<Utc>,
}

const REQUEST_COLUMNS: &str = "r.id, r.path, r.view_name, r.method, r.start_time, r.time_taken,
     s.id, s.status_code";

fn parse_timestamp(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn map_request(row: &Row<'_>) -> rusqlite::Result<RequestRecord> {
    let id: String = row.get(0)?;
    let response_id: Option<String> = row.get(6)?;
    let response = response_id.map(|rid| -> rusqlite::Result<ResponseRecord> {
        Ok(ResponseRecord {
            id: rid,
            request_id: id.clone(),
            status_code: row.get(7)?,
        })
    });
    Ok(RequestRecord {
        path: row.get(1)?,
        view_name: row.get(2)?,
        method: row.get(3)?,
        start_time: parse_timestamp(4, row.get(4)?)?,
        time_taken: row.get(5)?,
        queries: Vec::new(),
        response: response.transpose()?,
        id,
    })
}

/// Request ids bound per child-row query, well under SQLite's host parameter
/// limit.
const ATTACH_CHUNK: usize = 500;

/// Attach each request's queries, in capture order.
fn attach_queries(conn: &Connection, requests: &mut [RequestRecord]) -> rusqlite::Result<()> {
    let index: HashMap<String, usize> = requests
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    let mut grouped: Vec<Vec<QueryRecord>> = vec![Vec::new(); requests.len()];
    for chunk in requests.chunks(ATTACH_CHUNK) {
        let placeholders = (1..=chunk.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, request_id, query, time_taken FROM sql_queries
             WHERE request_id IN ({placeholders})
             ORDER BY request_id, seq"
        );
        let ids: Vec<&dyn ToSql> = chunk.iter().map(|r| &r.id as &dyn ToSql).collect();

        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(ids.as_slice(), |row| {
            Ok(QueryRecord {
                id: row.get(0)?,
                request_id: row.get(1)?,
                query: row.get(2)?,
                time_taken: row.get(3)?,
            })
        })?;
        for row in rows {
            let q = row?;
            if let Some(&i) = index.get(&q.request_id) {
                grouped[i].push(q);
            }
        }
    }
    for (request, queries) in requests.iter_mut().zip(grouped) {
        request.queries = queries;
    }
    Ok(())
}

/// Load the most recent requests, newest first, with their queries and
/// responses.
pub async fn load_requests(pool: &Pool, opts: &LoadOptions) -> AppResult<Vec<RequestRecord>> {
    let conn = pool
        .get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))?;

    let since = opts
        .window_hours
        .and_then(|h| i64::try_from(h).ok())
        .and_then(TimeDelta::try_hours)
        .and_then(|w| opts.now.checked_sub_signed(w))
        .map(|ts| encode_timestamp(&ts));
    let limit = i64::try_from(opts.max_requests).unwrap_or(i64::MAX);

    let records = conn
        .interact(move |conn| {
            let mut sql = format!(
                "SELECT {REQUEST_COLUMNS}
                 FROM requests r LEFT JOIN responses s ON s.request_id = r.id
                 WHERE 1=1"
            );
            let mut bind_values: Vec<Box<dyn ToSql>> = Vec::new();

            if let Some(since) = since {
                sql.push_str(&format!(" AND r.start_time >= ?{}", bind_values.len() + 1));
                bind_values.push(Box::new(since));
            }

            sql.push_str(&format!(
                " ORDER BY r.start_time DESC, r.id LIMIT ?{}",
                bind_values.len() + 1
            ));
            bind_values.push(Box::new(limit));

            let params_ref: Vec<&dyn ToSql> = bind_values.iter().map(|b| b.as_ref()).collect();

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_ref.as_slice(), map_request)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            attach_queries(conn, &mut records)?;
            Ok::<_, rusqlite::Error>(records)
        })
        .await??;

    tracing::info!(count = records.len(), "loaded request batch");
    Ok(records)
}

/// Load a single request with its queries and response.
pub async fn load_request(pool: &Pool, id: String) -> AppResult<Option<RequestRecord>> {
    let conn = pool
        .get()
        .await
        .map_err(|e| AppError::Internal(format!("pool error: {e}")))?;

    let record = conn
        .interact(move |conn| {
            let sql = format!(
                "SELECT {REQUEST_COLUMNS}
                 FROM requests r LEFT JOIN responses s ON s.request_id = r.id
                 WHERE r.id = ?1"
            );
            let mut stmt = conn.prepare(&sql)?;
            let mut rows = stmt.query_map([&id], map_request)?;
            let Some(row) = rows.next() else {
                return Ok(None);
            };
            let mut found = [row?];
            attach_queries(conn, &mut found)?;
            let [record] = found;
            Ok::<_, rusqlite::Error>(Some(record))
        })
        .await??;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::sqlite::{create_pool, init_pool};
    use crate::storage::writer::write_requests;
    use chrono::TimeZone;

    fn request(id: &str, hour: u32, queries: usize, status: Option<u16>) -> RequestRecord {
        RequestRecord {
            id: id.to_string(),
            path: format!("/items/{id}"),
            view_name: "items".to_string(),
            method: "GET".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 6, 15, hour, 0, 0).unwrap(),
            time_taken: Some(10.0 * f64::from(hour)),
            queries: (0..queries)
                .map(|i| QueryRecord {
                    id: format!("{id}-q{i}"),
                    request_id: id.to_string(),
                    query: format!("SELECT * FROM item WHERE id = {i}"),
                    time_taken: Some(1.5),
                })
                .collect(),
            response: status.map(|code| ResponseRecord {
                id: format!("{id}-resp"),
                request_id: id.to_string(),
                status_code: Some(code),
            }),
        }
    }

    async fn seeded_pool(dir: &tempfile::TempDir) -> Pool {
        let pool = create_pool(&DatabaseConfig {
            path: dir.path().join("telemetry.db"),
            pool_size: 2,
        })
        .unwrap();
        init_pool(&pool).await.unwrap();
        write_requests(
            &pool,
            vec![
                request("a", 8, 3, Some(200)),
                request("b", 10, 0, None),
                request("c", 12, 1, Some(500)),
            ],
        )
        .await
        .unwrap();
        pool
    }

    fn opts(max_requests: usize, window_hours: Option<u64>) -> LoadOptions {
        LoadOptions {
            max_requests,
            window_hours,
            now: Utc.with_ymd_and_hms(2025, 6, 15, 13, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_load_newest_first_with_children() {
        let dir = tempfile::tempdir().unwrap();
        let pool = seeded_pool(&dir).await;

        let records = load_requests(&pool, &opts(100, None)).await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);

        let a = &records[2];
        assert_eq!(a.num_queries(), 3);
        assert_eq!(a.queries[0].id, "a-q0");
        assert_eq!(a.queries[2].id, "a-q2");
        assert_eq!(a.status_code(), Some(200));
        assert_eq!(a.db_time(), Some(4.5));
        assert!(records[1].response.is_none());
    }

    #[tokio::test]
    async fn test_load_respects_limit_and_window() {
        let dir = tempfile::tempdir().unwrap();
        let pool = seeded_pool(&dir).await;

        let limited = load_requests(&pool, &opts(2, None)).await.unwrap();
        assert_eq!(limited.len(), 2);
        assert_eq!(limited[0].id, "c");

        let windowed = load_requests(&pool, &opts(100, Some(4))).await.unwrap();
        let ids: Vec<&str> = windowed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn test_load_batch_larger_than_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let pool = create_pool(&DatabaseConfig {
            path: dir.path().join("telemetry.db"),
            pool_size: 2,
        })
        .unwrap();
        init_pool(&pool).await.unwrap();

        let total = ATTACH_CHUNK * 2 + 7;
        let records: Vec<RequestRecord> = (0..total)
            .map(|i| {
                let mut r = request(&format!("r{i:05}"), 8, 2, Some(200));
                r.start_time += TimeDelta::seconds(i as i64);
                r
            })
            .collect();
        write_requests(&pool, records).await.unwrap();

        let loaded = load_requests(&pool, &opts(total + 100, None)).await.unwrap();
        assert_eq!(loaded.len(), total);
        assert!(loaded.iter().all(|r| r.num_queries() == 2));
        assert_eq!(loaded[0].id, format!("r{:05}", total - 1));
        assert_eq!(loaded[0].queries[0].request_id, loaded[0].id);
    }

    #[tokio::test]
    async fn test_load_single_request() {
        let dir = tempfile::tempdir().unwrap();
        let pool = seeded_pool(&dir).await;

        let c = load_request(&pool, "c".to_string()).await.unwrap().unwrap();
        assert_eq!(c.num_queries(), 1);
        assert_eq!(c.status_code(), Some(500));
        assert!(load_request(&pool, "zzz".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewrite_replaces_children() {
        let dir = tempfile::tempdir().unwrap();
        let pool = seeded_pool(&dir).await;

        write_requests(&pool, vec![request("a", 8, 1, Some(404))]).await.unwrap();
        let a = load_request(&pool, "a".to_string()).await.unwrap().unwrap();
        assert_eq!(a.num_queries(), 1);
        assert_eq!(a.status_code(), Some(404));
    }
}
