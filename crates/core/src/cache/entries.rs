//! Cache entry CRUD operations.
//!
//! Each write is a single UPSERT statement, so a stored response is either
//! fully present or absent; readers never observe a half-written entry.

use super::connection::CacheDb;
use super::hash::compute_request_key;
use crate::Error;
use crate::http::{ResponseData, WorkerRequest};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response and the generation that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key_hash: String,
    pub generation: String,
    pub method: String,
    pub url: String,
    pub response: ResponseData,
    pub stored_at: String,
}

const SELECT_COLUMNS: &str = "SELECT key_hash, generation, method, url, final_url, status_code, headers_json, body, stored_at
     FROM cache_entries";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(CacheEntry, String)> {
    let headers_json: String = row.get(6)?;
    let body: Vec<u8> = row.get(7)?;
    let status: i64 = row.get(5)?;
    let entry = CacheEntry {
        key_hash: row.get(0)?,
        generation: row.get(1)?,
        method: row.get(2)?,
        url: row.get(3)?,
        response: ResponseData {
            url: row.get(4)?,
            status: status.clamp(0, u16::MAX as i64) as u16,
            headers: Vec::new(),
            body: Bytes::from(body),
        },
        stored_at: row.get(8)?,
    };
    Ok((entry, headers_json))
}

fn decode(row: (CacheEntry, String)) -> Result<CacheEntry, Error> {
    let (mut entry, headers_json) = row;
    entry.response.headers = serde_json::from_str(&headers_json)
        .map_err(|e| Error::CorruptEntry(format!("{}: bad headers: {e}", entry.url)))?;
    Ok(entry)
}

impl CacheDb {
    /// Store a response for `request` under `generation`.
    ///
    /// Overwrites any entry for the same key in the same generation. Entries
    /// for that key under other generations are left alone.
    pub async fn put_entry(
        &self, generation: &str, request: &WorkerRequest, response: &ResponseData,
    ) -> Result<CacheEntry, Error> {
        let url = request.url.to_string();
        let entry = CacheEntry {
            key_hash: compute_request_key(&request.method, &url),
            generation: generation.to_string(),
            method: request.method.clone(),
            url,
            response: response.clone(),
            stored_at: Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true),
        };
        let headers_json = serde_json::to_string(&entry.response.headers)
            .map_err(|e| Error::InvalidInput(format!("unserializable headers: {e}")))?;

        let row = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (
                        generation, key_hash, method, url, final_url,
                        status_code, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(generation, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        final_url = excluded.final_url,
                        status_code = excluded.status_code,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &row.generation,
                        &row.key_hash,
                        &row.method,
                        &row.url,
                        &row.response.url,
                        row.response.status as i64,
                        &headers_json,
                        row.response.body.to_vec(),
                        &row.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::debug!(generation = %entry.generation, url = %entry.url, "stored cache entry");
        Ok(entry)
    }

    /// Find the best stored entry for a request, regardless of generation.
    ///
    /// An entry owned by `preferred_generation` wins; otherwise the most
    /// recently stored entry for the key is returned.
    pub async fn match_request(
        &self, request: &WorkerRequest, preferred_generation: &str,
    ) -> Result<Option<CacheEntry>, Error> {
        let key_hash = compute_request_key(&request.method, request.url.as_str());
        self.match_key(&key_hash, preferred_generation).await
    }

    /// Key-level variant of [`CacheDb::match_request`].
    pub async fn match_key(&self, key_hash: &str, preferred_generation: &str) -> Result<Option<CacheEntry>, Error> {
        let key_hash = key_hash.to_string();
        let preferred = preferred_generation.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(CacheEntry, String)>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "{SELECT_COLUMNS} WHERE key_hash = ?1
                     ORDER BY (generation = ?2) DESC, stored_at DESC
                     LIMIT 1"
                ))?;
                match stmt.query_row(params![key_hash, preferred], row_to_entry) {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(decode).transpose()
    }

    /// All entries owned by `generation`, ordered by URL.
    pub async fn list_entries(&self, generation: &str) -> Result<Vec<CacheEntry>, Error> {
        let generation = generation.to_string();
        let rows = self
            .conn
            .call(move |conn| -> Result<Vec<(CacheEntry, String)>, Error> {
                let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE generation = ?1 ORDER BY url"))?;
                let rows = stmt
                    .query_map(params![generation], row_to_entry)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(decode).collect()
    }

    /// Total number of stored entries across every generation.
    pub async fn count_entries(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(path: &str) -> WorkerRequest {
        WorkerRequest::get(Url::parse("https://exhibit.example").unwrap().join(path).unwrap())
    }

    fn response(body: &'static str) -> ResponseData {
        ResponseData {
            url: "https://exhibit.example/".into(),
            status: 200,
            headers: vec![("content-type".into(), "text/plain".into())],
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/index.html");

        let stored = db.put_entry("app-v1", &req, &response("hello")).await.unwrap();
        let fetched = db.match_key(&stored.key_hash, "app-v1").await.unwrap().unwrap();

        assert_eq!(fetched, stored);
        assert_eq!(fetched.response.body, Bytes::from_static(b"hello"));
        assert_eq!(fetched.response.content_type(), Some("text/plain"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_key("nonexistent", "app-v1").await.unwrap().is_none());
        assert!(db.match_request(&request("/x"), "app-v1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_in_place() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/data/songs.json");

        db.put_entry("app-v1", &req, &response("old")).await.unwrap();
        db.put_entry("app-v1", &req, &response("new")).await.unwrap();

        assert_eq!(db.count_entries().await.unwrap(), 1);
        let entry = db.match_request(&req, "app-v1").await.unwrap().unwrap();
        assert_eq!(entry.response.body, Bytes::from_static(b"new"));
    }

    #[tokio::test]
    async fn test_match_prefers_requested_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("/app.js");

        db.put_entry("app-v2", &req, &response("v2")).await.unwrap();
        db.put_entry("app-v1", &req, &response("v1")).await.unwrap();

        let entry = db.match_request(&req, "app-v2").await.unwrap().unwrap();
        assert_eq!(entry.generation, "app-v2");

        // No entry in the preferred generation: newest wins.
        let entry = db.match_request(&req, "app-v3").await.unwrap().unwrap();
        assert_eq!(entry.generation, "app-v1");
    }

    #[tokio::test]
    async fn test_list_entries_by_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("app-v1", &request("/b.css"), &response("b")).await.unwrap();
        db.put_entry("app-v1", &request("/a.css"), &response("a")).await.unwrap();
        db.put_entry("app-v2", &request("/c.css"), &response("c")).await.unwrap();

        let urls: Vec<String> = db
            .list_entries("app-v1")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.url)
            .collect();
        assert_eq!(urls, vec!["https://exhibit.example/a.css", "https://exhibit.example/b.css"]);
    }
}
