//! # Resource Cache Worker
//!
//! Keeps the application shell usable with no network. The worker owns a
//! versioned bucket of cached responses and mediates every resource fetch:
//!
//! - **Install**: best-effort priming of the shell manifest into the
//!   current bucket. A manifest entry that fails to fetch is skipped, not
//!   fatal.
//! - **Activate**: stale buckets from previous versions are deleted and the
//!   worker starts controlling fetches.
//! - **Fetch**: navigations are served network-first with a cached
//!   fallback chain ending at the offline page; images and other assets
//!   are served cache-first, with a placeholder image when an image can
//!   neither be fetched nor found in the cache.
//! - **Push / notification click**: push payloads are turned into
//!   displayable notifications, and clicks focus an already-open app
//!   window instead of always opening a new one.
//!
//! The event loop form ([`spawn`]) runs the worker on its own task and
//! serves requests over an mpsc channel, mirroring how the install,
//! activate and fetch phases arrive as discrete events from the host.

mod cache;
mod fetch;

pub use cache::{CacheStats, ResourceCache};
pub use fetch::{FetchError, Fetcher, HttpFetcher, RequestKind, ResourceRequest, ResourceResponse};

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{DisplayNotification, PushPayload};

/// What the host should do after a notification click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Bring this already-open window to the front
    Focus(String),
    /// No window under the app root is open; open one at this URL
    OpenWindow(String),
}

/// The shell cache worker
pub struct CacheWorker<F: Fetcher> {
    fetcher: F,
    cache: ResourceCache,
    config: AppConfig,
    controlling: AtomicBool,
}

impl<F: Fetcher> CacheWorker<F> {
    /// Create a worker over an already-opened bucket. The bucket name is
    /// expected to be `config.cache_version`.
    pub fn new(fetcher: F, cache: ResourceCache, config: AppConfig) -> Self {
        Self {
            fetcher,
            cache,
            config,
            controlling: AtomicBool::new(false),
        }
    }

    /// Open the bucket named by `config.cache_version` and build a worker
    pub async fn open(fetcher: F, cache_path: &str, config: AppConfig) -> Result<Self> {
        let cache = ResourceCache::open(cache_path, &config.cache_version).await?;
        Ok(Self::new(fetcher, cache, config))
    }

    /// Whether activation has completed and fetches are being controlled
    pub fn is_controlling(&self) -> bool {
        self.controlling.load(Ordering::Relaxed)
    }

    /// Prime the shell manifest into the current bucket. Entries that fail
    /// to fetch or come back uncacheable are skipped. Returns how many
    /// entries were cached.
    pub async fn install(&self) -> Result<usize> {
        info!(bucket = %self.cache.bucket(), "cache worker installing");
        let mut primed = 0usize;
        for url in &self.config.shell_manifest {
            match self.fetcher.fetch(&ResourceRequest::asset(url.clone())).await {
                Ok(response) if response.is_cacheable() => {
                    self.cache.put(&response).await?;
                    primed += 1;
                }
                Ok(response) => {
                    warn!(url = %url, status = response.status, "skipping uncacheable shell entry");
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "failed to prime shell entry");
                }
            }
        }
        info!(primed, total = self.config.shell_manifest.len(), "shell manifest primed");
        Ok(primed)
    }

    /// Delete buckets from previous versions and start controlling fetches.
    /// Returns the names of the deleted buckets.
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.cache.bucket_names().await? {
            if name != self.config.cache_version {
                info!(bucket = %name, "deleting stale cache bucket");
                self.cache.delete_bucket(&name).await?;
                deleted.push(name);
            }
        }
        self.controlling.store(true, Ordering::Relaxed);
        info!(bucket = %self.cache.bucket(), "cache worker active");
        Ok(deleted)
    }

    /// Serve one resource request. `None` means the worker has nothing to
    /// serve and the failure surfaces to the caller.
    pub async fn handle_fetch(&self, request: &ResourceRequest) -> Result<Option<ResourceResponse>> {
        match request.kind {
            RequestKind::Navigation => self.fetch_navigation(request).await,
            RequestKind::Image | RequestKind::Asset => self.fetch_asset(request).await,
        }
    }

    /// Network-first: a live response always wins and refreshes the cache;
    /// only an unreachable network falls back to the cached copy, then the
    /// offline page.
    async fn fetch_navigation(&self, request: &ResourceRequest) -> Result<Option<ResourceResponse>> {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.cache.put(&response).await?;
                }
                Ok(Some(response))
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "navigation offline, serving cache");
                if let Some(cached) = self.cache.match_url(&request.url).await? {
                    return Ok(Some(cached));
                }
                self.cache.match_url(&self.config.offline_page_url()).await
            }
        }
    }

    /// Cache-first: a cached copy short-circuits the network entirely
    async fn fetch_asset(&self, request: &ResourceRequest) -> Result<Option<ResourceResponse>> {
        if let Some(cached) = self.cache.match_url(&request.url).await? {
            return Ok(Some(cached));
        }
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                if response.is_cacheable() {
                    self.cache.put(&response).await?;
                }
                Ok(Some(response))
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "asset unreachable");
                if request.kind == RequestKind::Image {
                    Ok(Some(ResourceResponse::placeholder_image(&request.url)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Turn a push payload into the notification the host should show
    pub fn handle_push(&self, payload: &PushPayload) -> DisplayNotification {
        let shown = payload.display();
        debug!(title = %shown.title, tag = %shown.tag, "push received");
        shown
    }

    /// Decide what a notification click should do given the URLs of the
    /// currently open app windows: focus the first one already under the
    /// asset root, otherwise open a new window at the root.
    pub fn handle_notification_click(&self, open_clients: &[String]) -> ClickAction {
        for url in open_clients {
            if url.starts_with(&self.config.asset_root) {
                return ClickAction::Focus(url.clone());
            }
        }
        ClickAction::OpenWindow(self.config.asset_root.clone())
    }
}

/// An event delivered to a spawned worker task
pub enum WorkerEvent {
    Install(oneshot::Sender<Result<usize>>),
    Activate(oneshot::Sender<Result<Vec<String>>>),
    Fetch(ResourceRequest, oneshot::Sender<Result<Option<ResourceResponse>>>),
    Push(PushPayload, oneshot::Sender<DisplayNotification>),
    NotificationClick(Vec<String>, oneshot::Sender<ClickAction>),
}

/// Run the worker on its own task, serving [`WorkerEvent`]s until every
/// sender is dropped.
pub fn spawn<F>(worker: CacheWorker<F>) -> mpsc::Sender<WorkerEvent>
where
    F: Fetcher + 'static,
{
    let (tx, mut rx) = mpsc::channel::<WorkerEvent>(32);
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                WorkerEvent::Install(reply) => {
                    let _ = reply.send(worker.install().await);
                }
                WorkerEvent::Activate(reply) => {
                    let _ = reply.send(worker.activate().await);
                }
                WorkerEvent::Fetch(request, reply) => {
                    let _ = reply.send(worker.handle_fetch(&request).await);
                }
                WorkerEvent::Push(payload, reply) => {
                    let _ = reply.send(worker.handle_push(&payload));
                }
                WorkerEvent::NotificationClick(clients, reply) => {
                    let _ = reply.send(worker.handle_notification_click(&clients));
                }
            }
        }
        debug!("cache worker event loop stopped");
    });
    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Scripted fetcher: each URL maps to a fixed outcome, and every call
    /// is counted.
    struct ScriptedFetcher {
        outcomes: Mutex<HashMap<String, std::result::Result<ResourceResponse, String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedFetcher {
        fn new() -> Self {
            Self {
                outcomes: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn serve(self, url: &str, status: u16, body: &str) -> Self {
            self.outcomes.lock().unwrap().insert(
                url.to_string(),
                Ok(ResourceResponse {
                    url: url.to_string(),
                    status,
                    content_type: "text/html".to_string(),
                    body: body.as_bytes().to_vec(),
                    opaque: false,
                }),
            );
            self
        }

        fn unreachable(self, url: &str) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .insert(url.to_string(), Err("connection refused".to_string()));
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(
            &self,
            request: &ResourceRequest,
        ) -> std::result::Result<ResourceResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            match self.outcomes.lock().unwrap().get(&request.url) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(e)) => Err(FetchError(e.clone())),
                None => Err(FetchError("no script for url".to_string())),
            }
        }
    }

    fn test_config(manifest: Vec<&str>) -> AppConfig {
        AppConfig::builder()
            .api_base_url("http://localhost:3000/api")
            .shell_manifest(manifest.into_iter().map(String::from).collect())
            .build()
            .unwrap()
    }

    async fn worker(
        fetcher: ScriptedFetcher,
        config: AppConfig,
    ) -> CacheWorker<ScriptedFetcher> {
        let cache = ResourceCache::open("sqlite::memory:", &config.cache_version)
            .await
            .unwrap();
        CacheWorker::new(fetcher, cache, config)
    }

    #[tokio::test]
    async fn test_install_skips_failed_entries() {
        let fetcher = ScriptedFetcher::new()
            .serve("/app/index.html", 200, "<html>index</html>")
            .serve("/app/css/styles.css", 404, "not found")
            .unreachable("/app/img/512.png");
        let worker = worker(
            fetcher,
            test_config(vec!["/app/index.html", "/app/css/styles.css", "/app/img/512.png"]),
        )
        .await;

        let primed = worker.install().await.unwrap();
        assert_eq!(primed, 1);
        assert!(worker.cache.match_url("/app/index.html").await.unwrap().is_some());
        assert!(worker.cache.match_url("/app/css/styles.css").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activate_deletes_stale_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");
        let path = path.to_str().unwrap();
        let config = test_config(vec![]);

        // A leftover bucket from a previous deployment
        let stale = ResourceCache::open(path, "tienda-cache-v0").await.unwrap();
        stale
            .put(&ResourceResponse {
                url: "/app/index.html".to_string(),
                status: 200,
                content_type: "text/html".to_string(),
                body: b"old".to_vec(),
                opaque: false,
            })
            .await
            .unwrap();
        drop(stale);

        let cache = ResourceCache::open(path, &config.cache_version).await.unwrap();
        let worker = CacheWorker::new(ScriptedFetcher::new(), cache, config);
        assert!(!worker.is_controlling());
        let deleted = worker.activate().await.unwrap();
        assert_eq!(deleted, vec!["tienda-cache-v0".to_string()]);
        assert!(worker.is_controlling());
        assert!(worker.cache.bucket_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_navigation_prefers_live_response() {
        let fetcher = ScriptedFetcher::new().serve("/app/index.html", 200, "<html>live</html>");
        let worker = worker(fetcher, test_config(vec![])).await;

        let served = worker
            .handle_fetch(&ResourceRequest::navigation("/app/index.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.body, b"<html>live</html>");
        // The live response was also cached
        assert!(worker.cache.match_url("/app/index.html").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_navigation_falls_back_to_cache_then_offline_page() {
        let fetcher = ScriptedFetcher::new()
            .unreachable("/app/pages/admin/dashboard.html")
            .unreachable("/app/pages/admin/pedidos.html");
        let worker = worker(fetcher, test_config(vec![])).await;
        worker
            .cache
            .put(&ResourceResponse {
                url: "/app/pages/admin/dashboard.html".to_string(),
                status: 200,
                content_type: "text/html".to_string(),
                body: b"cached dashboard".to_vec(),
                opaque: false,
            })
            .await
            .unwrap();
        worker
            .cache
            .put(&ResourceResponse {
                url: "/app/offline.html".to_string(),
                status: 200,
                content_type: "text/html".to_string(),
                body: b"offline page".to_vec(),
                opaque: false,
            })
            .await
            .unwrap();

        let cached = worker
            .handle_fetch(&ResourceRequest::navigation("/app/pages/admin/dashboard.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.body, b"cached dashboard");

        let fallback = worker
            .handle_fetch(&ResourceRequest::navigation("/app/pages/admin/pedidos.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fallback.body, b"offline page");
    }

    #[tokio::test]
    async fn test_asset_cache_hit_skips_network() {
        let fetcher = ScriptedFetcher::new();
        let worker = worker(fetcher, test_config(vec![])).await;
        worker
            .cache
            .put(&ResourceResponse {
                url: "/app/css/styles.css".to_string(),
                status: 200,
                content_type: "text/css".to_string(),
                body: b"body{}".to_vec(),
                opaque: false,
            })
            .await
            .unwrap();

        let served = worker
            .handle_fetch(&ResourceRequest::asset("/app/css/styles.css"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.body, b"body{}");
        assert_eq!(worker.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_image_gets_placeholder() {
        let fetcher = ScriptedFetcher::new().unreachable("/app/img/512.png");
        let image_worker = worker(fetcher, test_config(vec![])).await;

        let served = image_worker
            .handle_fetch(&ResourceRequest::image("/app/img/512.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.content_type, "image/svg+xml");

        // A non-image asset with no cached copy yields nothing
        let fetcher = ScriptedFetcher::new().unreachable("/app/js/app.js");
        let asset_worker = worker(fetcher, test_config(vec![])).await;
        let served = asset_worker
            .handle_fetch(&ResourceRequest::asset("/app/js/app.js"))
            .await
            .unwrap();
        assert!(served.is_none());
    }

    #[tokio::test]
    async fn test_error_pages_are_not_cached() {
        let fetcher = ScriptedFetcher::new().serve("/app/missing.html", 404, "not found");
        let worker = worker(fetcher, test_config(vec![])).await;

        let served = worker
            .handle_fetch(&ResourceRequest::navigation("/app/missing.html"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(served.status, 404);
        assert!(worker.cache.match_url("/app/missing.html").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notification_click_focuses_open_window() {
        let config = test_config(vec![]);
        let root = config.asset_root.clone();
        let worker = worker(ScriptedFetcher::new(), config).await;

        let action = worker.handle_notification_click(&[
            "https://example.com/other".to_string(),
            format!("{}pages/repartidor/inicio.html", root),
        ]);
        assert_eq!(
            action,
            ClickAction::Focus(format!("{}pages/repartidor/inicio.html", root))
        );

        let action = worker.handle_notification_click(&[]);
        assert_eq!(action, ClickAction::OpenWindow(root));
    }

    #[tokio::test]
    async fn test_event_loop_serves_fetches() {
        let fetcher = ScriptedFetcher::new().serve("/app/index.html", 200, "<html>ok</html>");
        let worker = worker(fetcher, test_config(vec!["/app/index.html"])).await;
        let tx = spawn(worker);

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkerEvent::Install(reply_tx)).await.unwrap();
        assert_eq!(reply_rx.await.unwrap().unwrap(), 1);

        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(WorkerEvent::Fetch(
            ResourceRequest::navigation("/app/index.html"),
            reply_tx,
        ))
        .await
        .unwrap();
        let served = reply_rx.await.unwrap().unwrap().unwrap();
        assert_eq!(served.body, b"<html>ok</html>");
    }
}
