//! Resource Cache Buckets
//!
//! Cached responses live in named, versioned buckets keyed by full request
//! URL. One bucket corresponds to one deployed cache version; the worker's
//! activate phase deletes every bucket that does not carry the current
//! version tag. Hit/miss counters are kept for diagnostics.

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{ClientError, Result};

use super::fetch::ResourceResponse;

/// Lookup counters for one opened bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hit_count: u64,
    pub miss_count: u64,
}

/// A named bucket of URL-keyed responses
#[derive(Debug, Clone)]
pub struct ResourceCache {
    pool: SqlitePool,
    bucket: String,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl ResourceCache {
    /// Open (and create if needed) the bucket `bucket` in the cache file at
    /// `path`. Accepts the same path forms as the local store.
    pub async fn open(path: &str, bucket: &str) -> Result<Self> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{}", path)
        };
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?
            .create_if_missing(true);
        // The single connection is pinned: an in-memory bucket lives only
        // as long as its connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS resource_cache (
                bucket TEXT NOT NULL,
                url TEXT NOT NULL,
                status INTEGER NOT NULL,
                content_type TEXT NOT NULL,
                body BLOB NOT NULL,
                stored_ms INTEGER NOT NULL,
                PRIMARY KEY (bucket, url)
            )",
        )
        .execute(&pool)
        .await
        .map_err(|e| ClientError::storage_unavailable(e.to_string()))?;

        Ok(Self {
            pool,
            bucket: bucket.to_string(),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Name of this bucket
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Store a copy of `response` under its URL, replacing any previous copy
    pub async fn put(&self, response: &ResourceResponse) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO resource_cache
             (bucket, url, status, content_type, body, stored_ms)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&self.bucket)
        .bind(&response.url)
        .bind(response.status as i64)
        .bind(&response.content_type)
        .bind(&response.body)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;
        debug!("cached {} in {}", response.url, self.bucket);
        Ok(())
    }

    /// Look up the cached response for an exact URL
    pub async fn match_url(&self, url: &str) -> Result<Option<ResourceResponse>> {
        let row = sqlx::query(
            "SELECT status, content_type, body FROM resource_cache
             WHERE bucket = ? AND url = ?",
        )
        .bind(&self.bucket)
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(ResourceResponse {
                    url: url.to_string(),
                    status: row.get::<i64, _>(0) as u16,
                    content_type: row.get(1),
                    body: row.get(2),
                    opaque: false,
                }))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Names of every bucket present in the cache file
    pub async fn bucket_names(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT bucket FROM resource_cache ORDER BY bucket")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    /// Drop every entry of the named bucket
    pub async fn delete_bucket(&self, name: &str) -> Result<()> {
        sqlx::query("DELETE FROM resource_cache WHERE bucket = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of entries in this bucket
    pub async fn len(&self) -> Result<u64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM resource_cache WHERE bucket = ?")
            .bind(&self.bucket)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0 as u64)
    }

    /// Whether this bucket holds no entries
    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hit_count: self.hits.load(Ordering::Relaxed),
            miss_count: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(url: &str) -> ResourceResponse {
        ResourceResponse {
            url: url.to_string(),
            status: 200,
            content_type: "text/html".to_string(),
            body: b"<html></html>".to_vec(),
            opaque: false,
        }
    }

    #[tokio::test]
    async fn test_put_then_match() {
        let cache = ResourceCache::open("sqlite::memory:", "v1").await.unwrap();
        cache.put(&response("/app/index.html")).await.unwrap();

        let hit = cache.match_url("/app/index.html").await.unwrap().unwrap();
        assert_eq!(hit.body, b"<html></html>");
        assert!(cache.match_url("/app/missing.html").await.unwrap().is_none());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hit_count: 1,
                miss_count: 1
            }
        );
    }

    #[tokio::test]
    async fn test_put_replaces_by_url() {
        let cache = ResourceCache::open("sqlite::memory:", "v1").await.unwrap();
        cache.put(&response("/app/index.html")).await.unwrap();

        let mut fresher = response("/app/index.html");
        fresher.body = b"<html>v2</html>".to_vec();
        cache.put(&fresher).await.unwrap();

        assert_eq!(cache.len().await.unwrap(), 1);
        let hit = cache.match_url("/app/index.html").await.unwrap().unwrap();
        assert_eq!(hit.body, b"<html>v2</html>");
    }

    #[tokio::test]
    async fn test_buckets_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();

        let v1 = ResourceCache::open(path, "tienda-cache-v1").await.unwrap();
        v1.put(&response("/app/index.html")).await.unwrap();
        let v2 = ResourceCache::open(path, "tienda-cache-v2").await.unwrap();

        assert!(v2.match_url("/app/index.html").await.unwrap().is_none());
        assert_eq!(
            v2.bucket_names().await.unwrap(),
            vec!["tienda-cache-v1".to_string()]
        );

        v2.delete_bucket("tienda-cache-v1").await.unwrap();
        assert!(v1.is_empty().await.unwrap());
    }
}
