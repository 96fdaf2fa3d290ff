//! Entry CRUD operations.
//!
//! Implements [`CacheStorage`] for the SQLite backend.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};
use tokio_rusqlite::params;
use url::Url;

use super::CacheStorage;
use super::connection::CacheDb;
use super::key::{canonical_url, request_key};
use crate::{Error, Headers, Request, Response};

/// A fully encoded row, ready to be written without further fallible work.
#[derive(Debug, Clone)]
struct EntryRow {
    cache_key: String,
    method: String,
    url: String,
    status: i64,
    status_text: Option<String>,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn encode(request: &Request, response: &Response) -> Result<Self, Error> {
        Ok(Self {
            cache_key: request_key(request),
            method: request.method.clone(),
            url: canonical_url(&request.url).to_string(),
            status: i64::from(response.status),
            status_text: response.status_text.clone(),
            headers_json: serde_json::to_string(&response.headers)?,
            body: response.body.to_vec(),
        })
    }
}

fn decode(status: i64, status_text: Option<String>, headers_json: &str, body: Vec<u8>) -> Result<Response, Error> {
    let status = u16::try_from(status).map_err(|_| Error::Serialization(format!("status {status} out of range")))?;
    let headers: Headers = serde_json::from_str(headers_json)?;
    Ok(Response { status, status_text, headers, body: Bytes::from(body) })
}

fn ensure_store(conn: &rusqlite::Connection, name: &str, now: &str) -> Result<(), rusqlite::Error> {
    conn.execute("INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)", params![name, now])?;
    Ok(())
}

fn upsert_entry(conn: &rusqlite::Connection, name: &str, row: &EntryRow, now: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO entries (
            store_name, cache_key, method, url, status, status_text, headers_json, body, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ON CONFLICT(store_name, cache_key) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            status_text = excluded.status_text,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            name,
            &row.cache_key,
            &row.method,
            &row.url,
            row.status,
            &row.status_text,
            &row.headers_json,
            &row.body,
            now,
        ],
    )?;
    Ok(())
}

type RawEntry = (i64, Option<String>, String, Vec<u8>);

fn raw_entry(row: &rusqlite::Row<'_>) -> Result<RawEntry, rusqlite::Error> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_store(conn, &name, &now)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn lookup(&self, name: &str, request: &Request) -> Result<Option<Response>, Error> {
        let name = name.to_string();
        let key = request_key(request);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let found = conn
                    .query_row(
                        "SELECT status, status_text, headers_json, body
                         FROM entries WHERE store_name = ?1 AND cache_key = ?2",
                        params![name, key],
                        raw_entry,
                    )
                    .optional()?;
                Ok(found)
            })
            .await
            .map_err(Error::from)?;

        raw.map(|(status, text, headers, body)| decode(status, text, &headers, body))
            .transpose()
    }

    async fn lookup_any(&self, request: &Request) -> Result<Option<Response>, Error> {
        let key = request_key(request);
        let raw = self
            .conn
            .call(move |conn| -> Result<Option<RawEntry>, Error> {
                let found = conn
                    .query_row(
                        "SELECT e.status, e.status_text, e.headers_json, e.body
                         FROM entries e JOIN stores s ON s.name = e.store_name
                         WHERE e.cache_key = ?1
                         ORDER BY s.rowid ASC
                         LIMIT 1",
                        params![key],
                        raw_entry,
                    )
                    .optional()?;
                Ok(found)
            })
            .await
            .map_err(Error::from)?;

        raw.map(|(status, text, headers, body)| decode(status, text, &headers, body))
            .transpose()
    }

    async fn put(&self, name: &str, request: &Request, response: &Response) -> Result<(), Error> {
        let name = name.to_string();
        let row = EntryRow::encode(request, response)?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                upsert_entry(&tx, &name, &row, &now)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn put_all(&self, name: &str, entries: &[(Request, Response)]) -> Result<(), Error> {
        let name = name.to_string();
        let rows = entries
            .iter()
            .map(|(req, resp)| EntryRow::encode(req, resp))
            .collect::<Result<Vec<_>, _>>()?;
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_store(&tx, &name, &now)?;
                for row in &rows {
                    upsert_entry(&tx, &name, row, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str, request: &Request) -> Result<bool, Error> {
        let name = name.to_string();
        let key = request_key(request);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE store_name = ?1 AND cache_key = ?2",
                    params![name, key],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, name: &str) -> Result<Vec<Url>, Error> {
        let name = name.to_string();
        let urls = self
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT url FROM entries WHERE store_name = ?1 ORDER BY stored_at ASC, url ASC")?;
                let urls = stmt
                    .query_map(params![name], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)?;

        urls.iter()
            .map(|u| Url::parse(u).map_err(|e| Error::InvalidUrl(format!("{u}: {e}"))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(s: &str) -> Request {
        Request::get(Url::parse(s).unwrap())
    }

    fn response(body: &'static str) -> Response {
        Response::new(200)
            .with_status_text("OK")
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    #[tokio::test]
    async fn test_put_and_lookup() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/app.css");
        let resp = response("body { }");

        db.put("runtime-v1", &req, &resp).await.unwrap();

        let found = db.lookup("runtime-v1", &req).await.unwrap().unwrap();
        assert_eq!(found, resp);
    }

    #[tokio::test]
    async fn test_lookup_missing_store_is_miss() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.lookup("runtime-v1", &request("https://example.com/")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_wholesale() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/schedule.json");

        db.put("runtime-v1", &req, &response("old").with_header("X-Old", "1"))
            .await
            .unwrap();
        db.put("runtime-v1", &req, &response("new")).await.unwrap();

        let found = db.lookup("runtime-v1", &req).await.unwrap().unwrap();
        assert_eq!(found.body, Bytes::from_static(b"new"));
        assert!(found.headers.get("x-old").is_none());
        assert_eq!(db.keys("runtime-v1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/");
        db.put("precache-v1", &req, &response("shell")).await.unwrap();

        assert!(db.lookup("runtime-v1", &req).await.unwrap().is_none());
        assert!(db.lookup("precache-v1", &req).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_lookup_any_prefers_oldest_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/index.html");
        db.put("precache-v1", &req, &response("precached")).await.unwrap();
        db.put("runtime-v1", &req, &response("runtime")).await.unwrap();

        let found = db.lookup_any(&req).await.unwrap().unwrap();
        assert_eq!(found.body, Bytes::from_static(b"precached"));
    }

    #[tokio::test]
    async fn test_put_all_commits_every_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entries = vec![
            (request("https://example.com/"), response("root")),
            (request("https://example.com/index.html"), response("index")),
        ];

        db.put_all("precache-v1", &entries).await.unwrap();

        let keys = db.keys("precache-v1").await.unwrap();
        assert_eq!(keys.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/logo.png");
        db.put("runtime-v1", &req, &response("png")).await.unwrap();

        assert!(db.delete("runtime-v1", &req).await.unwrap());
        assert!(!db.delete("runtime-v1", &req).await.unwrap());
        assert!(db.lookup("runtime-v1", &req).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let req = request("https://example.com/");
        db.put("runtime-v0", &req, &response("old")).await.unwrap();

        assert!(db.delete_store("runtime-v0").await.unwrap());
        assert!(!db.delete_store("runtime-v0").await.unwrap());
        assert!(db.lookup_any(&req).await.unwrap().is_none());
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_names_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("precache-v1").await.unwrap();
        db.open("runtime-v1").await.unwrap();
        db.open("precache-v1").await.unwrap();

        let names = db.store_names().await.unwrap();
        assert_eq!(names, vec!["precache-v1".to_string(), "runtime-v1".to_string()]);
    }

    #[tokio::test]
    async fn test_open_rejects_empty_name() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(matches!(db.open("").await, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_keys_drop_fragment() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("runtime-v1", &request("https://example.com/docs#intro"), &response("docs"))
            .await
            .unwrap();

        let keys = db.keys("runtime-v1").await.unwrap();
        assert_eq!(keys[0].as_str(), "https://example.com/docs");
    }
}
