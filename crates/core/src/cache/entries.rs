//! Stored request/response entries.
//!
//! Entries are written whole and never patched: a second write for the same
//! identity in the same store replaces the row.

use super::connection::CacheDb;
use super::hash::compute_cache_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// The identity a response is cached under: method plus absolute URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RequestIdentity {
    pub method: String,
    pub url: String,
}

impl RequestIdentity {
    pub fn new(method: &str, url: impl Into<String>) -> Self {
        Self { method: method.to_ascii_uppercase(), url: url.into() }
    }

    /// Shorthand for a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn cache_key(&self) -> String {
        compute_cache_key(&self.method, &self.url)
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// An immutable snapshot of a response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, headers: Vec<(String, String)>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// 2xx status.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// First header value matching `name`, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A cached entry as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub store: String,
    pub request: RequestIdentity,
    pub response: ResponseSnapshot,
    pub stored_at: String,
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(StoredEntry, String)> {
    let headers_json: String = row.get(5)?;
    let entry = StoredEntry {
        store: row.get(0)?,
        request: RequestIdentity { method: row.get(1)?, url: row.get(2)? },
        response: ResponseSnapshot { status: row.get(3)?, headers: Vec::new(), body: row.get(4)? },
        stored_at: row.get(6)?,
    };
    Ok((entry, headers_json))
}

fn decode(found: Option<(StoredEntry, String)>) -> Result<Option<StoredEntry>, Error> {
    match found {
        Some((mut entry, headers_json)) => {
            entry.response.headers = serde_json::from_str(&headers_json)?;
            Ok(Some(entry))
        }
        None => Ok(None),
    }
}

impl CacheDb {
    /// Write a response under `request` in `store`, creating the store if needed.
    ///
    /// Replaces any existing entry for the same identity.
    pub async fn put_entry(
        &self, store: &str, request: &RequestIdentity, response: &ResponseSnapshot,
    ) -> Result<(), Error> {
        let store = store.to_string();
        let request = request.clone();
        let response = response.clone();
        let headers_json = serde_json::to_string(&response.headers)?;
        let now = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at, seq)
                     VALUES (?1, ?2, (SELECT COALESCE(MAX(seq), 0) + 1 FROM cache_stores))",
                    params![store, now],
                )?;
                tx.execute(
                    "INSERT INTO cache_entries (
                        store_name, key_hash, method, url, status_code, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status_code = excluded.status_code,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        request.cache_key(),
                        request.method,
                        request.url,
                        response.status,
                        headers_json,
                        response.body,
                        now,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up `request` in one store only.
    pub async fn match_entry(&self, store: &str, request: &RequestIdentity) -> Result<Option<StoredEntry>, Error> {
        let store = store.to_string();
        let key = request.cache_key();
        let found = self
            .conn
            .call(move |conn| -> Result<Option<(StoredEntry, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT store_name, method, url, status_code, body, headers_json, stored_at
                     FROM cache_entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;
                match stmt.query_row(params![store, key], row_to_entry) {
                    Ok(found) => Ok(Some(found)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        decode(found)
    }

    /// Look up `request` across every store, oldest store first.
    pub async fn match_any(&self, request: &RequestIdentity) -> Result<Option<StoredEntry>, Error> {
        let key = request.cache_key();
        let found = self
            .conn
            .call(move |conn| -> Result<Option<(StoredEntry, String)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.store_name, e.method, e.url, e.status_code, e.body, e.headers_json, e.stored_at
                     FROM cache_entries e
                     JOIN cache_stores s ON s.name = e.store_name
                     WHERE e.key_hash = ?1
                     ORDER BY s.seq ASC
                     LIMIT 1",
                )?;
                match stmt.query_row(params![key], row_to_entry) {
                    Ok(found) => Ok(Some(found)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;
        decode(found)
    }

    /// URLs of every entry in `store`, sorted.
    pub async fn entry_urls(&self, store: &str) -> Result<Vec<String>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM cache_entries WHERE store_name = ?1 ORDER BY url ASC")?;
                let urls = stmt
                    .query_map(params![store], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    pub async fn entry_count(&self, store: &str) -> Result<u64, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM cache_entries WHERE store_name = ?1",
                    params![store],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wasm_response(body: &[u8]) -> ResponseSnapshot {
        ResponseSnapshot::new(200, vec![("Content-Type".into(), "application/wasm".into())], body)
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = RequestIdentity::get("https://site.test/game/index.wasm");
        let response = wasm_response(&[0x00, 0x61, 0x73, 0x6d]);

        db.put_entry("v1", &request, &response).await.unwrap();

        let entry = db.match_entry("v1", &request).await.unwrap().unwrap();
        assert_eq!(entry.store, "v1");
        assert_eq!(entry.request, request);
        assert_eq!(entry.response, response);
        assert_eq!(entry.response.header("content-type"), Some("application/wasm"));
    }

    #[tokio::test]
    async fn test_put_creates_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &RequestIdentity::get("https://site.test/"), &wasm_response(b"x"))
            .await
            .unwrap();
        assert!(db.has_store("v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = RequestIdentity::get("https://site.test/play.html");

        db.put_entry("v1", &request, &ResponseSnapshot::new(200, vec![], "old"))
            .await
            .unwrap();
        db.put_entry("v1", &request, &ResponseSnapshot::new(200, vec![], "new"))
            .await
            .unwrap();

        let entry = db.match_entry("v1", &request).await.unwrap().unwrap();
        assert_eq!(entry.response.body, b"new");
        assert_eq!(db.entry_count("v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_is_exact() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_entry("v1", &RequestIdentity::get("https://site.test/game/"), &wasm_response(b"x"))
            .await
            .unwrap();

        let other = RequestIdentity::get("https://site.test/game/index.wasm");
        assert!(db.match_entry("v1", &other).await.unwrap().is_none());

        let head = RequestIdentity::new("HEAD", "https://site.test/game/");
        assert!(db.match_entry("v1", &head).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_match_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = RequestIdentity::get("https://site.test/js/main.js");
        db.open_store("v1").await.unwrap();
        db.open_store("v2").await.unwrap();
        db.put_entry("v2", &request, &ResponseSnapshot::new(200, vec![], "two"))
            .await
            .unwrap();
        db.put_entry("v1", &request, &ResponseSnapshot::new(200, vec![], "one"))
            .await
            .unwrap();

        let entry = db.match_any(&request).await.unwrap().unwrap();
        assert_eq!(entry.store, "v1");
        assert_eq!(entry.response.body, b"one");
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let request = RequestIdentity::get("https://site.test/css/style.css");
        db.put_entry("v1", &request, &ResponseSnapshot::new(200, vec![], "body{}"))
            .await
            .unwrap();

        db.delete_store("v1").await.unwrap();

        assert!(db.match_any(&request).await.unwrap().is_none());
        assert_eq!(db.entry_count("v1").await.unwrap(), 0);
    }

    #[test]
    fn test_identity_normalizes_method() {
        let request = RequestIdentity::new("get", "https://site.test/");
        assert_eq!(request.method, "GET");
        assert_eq!(request.to_string(), "GET https://site.test/");
    }

    #[test]
    fn test_response_is_ok() {
        assert!(ResponseSnapshot::new(204, vec![], "").is_ok());
        assert!(!ResponseSnapshot::new(404, vec![], "").is_ok());
        assert!(!ResponseSnapshot::new(304, vec![], "").is_ok());
    }
}
