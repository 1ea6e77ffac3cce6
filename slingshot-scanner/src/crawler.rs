//! The bounded-concurrency crawl engine.
//!
//! A fixed pool of workers cooperates over one shared frontier of
//! discovered-but-unfetched folder paths. Each worker pops a path, fetches
//! its JSON dump, records the node, enqueues newly discovered folders and
//! downloads discovered assets inline. The pool terminates only when the
//! frontier is empty AND no worker has work in flight, so late discoveries
//! from slow siblings are never lost.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};

use futures::future::join_all;
use reqwest::{Client, Proxy};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::{self, ChildKind, Classification};
use crate::download::AssetSink;
use crate::error::{NodeError, Result, ScanError};
use crate::path;
use crate::tree::{
    ContentTree, CrawlStats, Node, NodeKind, NodeRecord, RecordKind, RequestRecord, StatCounters,
};

/// Called with every completed request; feeds live console output.
pub type EventCallback = Arc<dyn Fn(RequestRecord) + Send + Sync>;

pub const DEFAULT_CONCURRENCY: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Transport and pool configuration for one crawler.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub concurrency: usize,
    pub timeout: Duration,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub insecure: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            insecure: false,
        }
    }
}

/// Everything a finished crawl hands to the reporters.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub tree: Node,
    pub stats: CrawlStats,
    pub records: Vec<RequestRecord>,
    pub elapsed: Duration,
}

pub struct Crawler {
    client: Client,
    concurrency: usize,
    sink: Option<Arc<dyn AssetSink>>,
    event_callback: Option<EventCallback>,
    cancel: Arc<AtomicBool>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .connect_timeout(config.timeout / 2)
            .pool_max_idle_per_host(50)
            .redirect(reqwest::redirect::Policy::limited(5));

        if config.insecure {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(proxy) = &config.proxy {
            let proxy = Proxy::all(proxy)
                .map_err(|e| ScanError::InvalidUrl(format!("invalid proxy URL: {e}")))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            client: builder.build()?,
            concurrency: config.concurrency.max(1),
            sink: None,
            event_callback: None,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn AssetSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn with_event_callback(mut self, callback: EventCallback) -> Self {
        self.event_callback = Some(callback);
        self
    }

    /// Flag checked at every dequeue; setting it drains the crawl.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Crawl the repository tree under `root_url`.
    pub async fn crawl(&self, root_url: &str) -> Result<CrawlOutcome> {
        let parsed = Url::parse(root_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{root_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{root_url}: unsupported scheme '{}'",
                parsed.scheme()
            )));
        }

        info!(
            "starting crawl of {} with {} workers",
            root_url, self.concurrency
        );
        let started = Instant::now();

        let state = Arc::new(CrawlState {
            base: root_url.trim_end_matches('/').to_string(),
            client: self.client.clone(),
            tree: ContentTree::new("/"),
            frontier: Mutex::new(VecDeque::new()),
            visited: StdMutex::new(HashSet::new()),
            in_flight: AtomicUsize::new(0),
            stats: StatCounters::default(),
            records: StdMutex::new(Vec::new()),
            sink: self.sink.clone(),
            event_callback: self.event_callback.clone(),
            cancel: self.cancel.clone(),
        });

        // Seed the frontier with the repository root.
        {
            let root = state.tree.root_path().to_string();
            claim(&state, &root);
            state.frontier.lock().await.push_back(root);
        }

        let workers: Vec<_> = (0..self.concurrency)
            .map(|worker_id| {
                let state = state.clone();
                tokio::spawn(worker_loop(worker_id, state))
            })
            .collect();
        for joined in join_all(workers).await {
            joined?;
        }

        let stats = state.stats.snapshot();
        let records = state.records.lock().expect("records lock poisoned").clone();
        let tree = state.tree.snapshot();
        info!(
            "crawl complete: {} requests, {} folders, {} assets, {} errors",
            stats.requests, stats.folders, stats.assets, stats.errors
        );

        Ok(CrawlOutcome {
            tree,
            stats,
            records,
            elapsed: started.elapsed(),
        })
    }
}

/// Shared crawl state, one instance per crawl, owned jointly by the workers.
struct CrawlState {
    base: String,
    client: Client,
    tree: ContentTree,
    frontier: Mutex<VecDeque<String>>,
    visited: StdMutex<HashSet<String>>,
    in_flight: AtomicUsize,
    stats: StatCounters,
    records: StdMutex<Vec<RequestRecord>>,
    sink: Option<Arc<dyn AssetSink>>,
    event_callback: Option<EventCallback>,
    cancel: Arc<AtomicBool>,
}

async fn worker_loop(worker_id: usize, state: Arc<CrawlState>) {
    debug!("worker {} started", worker_id);
    loop {
        if state.cancel.load(Ordering::SeqCst) {
            state.frontier.lock().await.clear();
        }

        let next = {
            let mut frontier = state.frontier.lock().await;
            match frontier.pop_front() {
                Some(repo_path) => {
                    // Claimed under the queue lock so an empty-queue
                    // observation can never race this dequeue.
                    state.in_flight.fetch_add(1, Ordering::SeqCst);
                    Some(repo_path)
                }
                None => None,
            }
        };

        let Some(repo_path) = next else {
            let frontier = state.frontier.lock().await;
            if frontier.is_empty() && state.in_flight.load(Ordering::SeqCst) == 0 {
                break;
            }
            drop(frontier);
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        };

        process_path(&state, &repo_path).await;
        state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
    debug!("worker {} finished", worker_id);
}

/// Fetch one folder dump, record the node, fan out its children.
async fn process_path(state: &Arc<CrawlState>, repo_path: &str) {
    let url = dump_url(&state.base, repo_path);
    debug!("fetching {}", url);
    state.stats.requests.fetch_add(1, Ordering::Relaxed);

    let (status, content_type, body) = match fetch(&state.client, &url).await {
        Ok(response) => response,
        Err(error) => {
            warn!("fetch failed for {}: {}", url, error);
            record_failure(state, repo_path, &url, NodeKind::Unknown, None, 0, error);
            return;
        }
    };
    let size = body.len() as u64;

    match classify::classify(status, &body) {
        Classification::Error { status } => {
            record_failure(
                state,
                repo_path,
                &url,
                NodeKind::Unknown,
                Some(status),
                size,
                NodeError::Http(status),
            );
        }
        Classification::Unknown { reason } => {
            state.stats.unknown.fetch_add(1, Ordering::Relaxed);
            record_failure(
                state,
                repo_path,
                &url,
                NodeKind::Unknown,
                Some(status),
                size,
                NodeError::Parse(reason),
            );
        }
        Classification::Asset => {
            state.stats.assets.fetch_add(1, Ordering::Relaxed);
            state.tree.record(
                repo_path,
                NodeRecord {
                    kind: NodeKind::Asset,
                    status: Some(status),
                    size_bytes: Some(size),
                    content_type,
                    ..Default::default()
                },
            );
            emit(state, RecordKind::Asset, &url, Some(status), size, None);
        }
        Classification::Folder { children } => {
            state.stats.folders.fetch_add(1, Ordering::Relaxed);
            state.tree.record(
                repo_path,
                NodeRecord {
                    kind: NodeKind::Folder,
                    status: Some(status),
                    size_bytes: Some(size),
                    content_type,
                    ..Default::default()
                },
            );
            emit(state, RecordKind::Folder, &url, Some(status), size, None);

            for child in children {
                let child_path = path::join(repo_path, &child.name);
                match child.kind {
                    ChildKind::Folder => {
                        if claim(state, &child_path) {
                            state.frontier.lock().await.push_back(child_path);
                        }
                    }
                    ChildKind::Asset => {
                        if claim(state, &child_path) {
                            download_asset(state, &child_path, child.primary_type).await;
                        }
                    }
                    ChildKind::Unknown => {
                        if claim(state, &child_path) {
                            state.stats.unknown.fetch_add(1, Ordering::Relaxed);
                            state.tree.record(
                                &child_path,
                                NodeRecord {
                                    kind: NodeKind::Unknown,
                                    primary_type: child.primary_type,
                                    ..Default::default()
                                },
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Fetch one asset payload, recording it and handing it to the sink.
async fn download_asset(state: &Arc<CrawlState>, repo_path: &str, primary_type: Option<String>) {
    let url = asset_url(&state.base, repo_path);
    debug!("downloading {}", url);
    state.stats.requests.fetch_add(1, Ordering::Relaxed);

    let (status, content_type, body) = match fetch(&state.client, &url).await {
        Ok(response) => response,
        Err(error) => {
            warn!("download failed for {}: {}", url, error);
            record_failure(state, repo_path, &url, NodeKind::Asset, None, 0, error);
            return;
        }
    };
    let size = body.len() as u64;

    if !(200..300).contains(&status) {
        record_failure(
            state,
            repo_path,
            &url,
            NodeKind::Asset,
            Some(status),
            size,
            NodeError::Http(status),
        );
        return;
    }

    state.stats.assets.fetch_add(1, Ordering::Relaxed);
    state.stats.bytes_downloaded.fetch_add(size, Ordering::Relaxed);
    let mut record = NodeRecord {
        kind: NodeKind::Asset,
        status: Some(status),
        size_bytes: Some(size),
        content_type,
        primary_type,
        ..Default::default()
    };

    let mut message = None;
    let mut failed = None;
    if let Some(sink) = &state.sink {
        match sink.store(repo_path, &body) {
            Ok(local) => {
                message = Some(format!("saved to {}", local.display()));
                record.downloaded_to = Some(local.display().to_string());
            }
            Err(e) => {
                warn!("sink rejected {}: {}", repo_path, e);
                state.stats.errors.fetch_add(1, Ordering::Relaxed);
                let error = NodeError::Download(e.to_string());
                record.error = Some(error.clone());
                failed = Some(error);
            }
        }
    }

    state.tree.record(repo_path, record);
    match failed {
        Some(error) => emit(
            state,
            RecordKind::Error,
            &url,
            Some(status),
            size,
            Some(error.to_string()),
        ),
        None => emit(state, RecordKind::Asset, &url, Some(status), size, message),
    }
}

async fn fetch(
    client: &Client,
    url: &str,
) -> std::result::Result<(u16, Option<String>, Vec<u8>), NodeError> {
    let response = client.get(url).send().await.map_err(fetch_error)?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.split(';').next().unwrap_or(ct).trim().to_string());
    let body = response.bytes().await.map_err(fetch_error)?.to_vec();
    Ok((status, content_type, body))
}

fn fetch_error(error: reqwest::Error) -> NodeError {
    if error.is_timeout() {
        NodeError::Timeout
    } else {
        NodeError::Connection(error.to_string())
    }
}

/// Check-and-set on the visited set; true means the caller owns the path.
fn claim(state: &CrawlState, repo_path: &str) -> bool {
    state
        .visited
        .lock()
        .expect("visited lock poisoned")
        .insert(repo_path.to_string())
}

fn record_failure(
    state: &CrawlState,
    repo_path: &str,
    url: &str,
    kind: NodeKind,
    status: Option<u16>,
    size: u64,
    error: NodeError,
) {
    state.stats.errors.fetch_add(1, Ordering::Relaxed);
    state.tree.record(
        repo_path,
        NodeRecord {
            kind,
            status,
            size_bytes: Some(size),
            error: Some(error.clone()),
            ..Default::default()
        },
    );
    emit(
        state,
        RecordKind::Error,
        url,
        status,
        size,
        Some(error.to_string()),
    );
}

fn emit(
    state: &CrawlState,
    kind: RecordKind,
    url: &str,
    status: Option<u16>,
    size: u64,
    message: Option<String>,
) {
    let record = RequestRecord {
        timestamp: chrono::Utc::now().to_rfc3339(),
        kind,
        url: url.to_string(),
        status,
        size_bytes: size,
        message,
    };
    state
        .records
        .lock()
        .expect("records lock poisoned")
        .push(record.clone());
    if let Some(callback) = &state.event_callback {
        callback(record);
    }
}

fn dump_url(base: &str, repo_path: &str) -> String {
    if repo_path == "/" {
        format!("{base}/.1.json")
    } else {
        format!("{base}{repo_path}/.1.json")
    }
}

fn asset_url(base: &str, repo_path: &str) -> String {
    format!("{base}{repo_path}")
}
