//! The in-memory content tree shared by all crawl workers, plus the flat
//! request log and the crawl counters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::NodeError;
use crate::path;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Folder,
    Asset,
    #[default]
    Unknown,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Folder => "folder",
            NodeKind::Asset => "asset",
            NodeKind::Unknown => "unknown",
        }
    }
}

/// Row kind in the flat request log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Folder,
    Asset,
    Error,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Folder => "folder",
            RecordKind::Asset => "asset",
            RecordKind::Error => "error",
        }
    }
}

/// One row of the flat request log, appended as each request completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestRecord {
    pub timestamp: String,
    pub kind: RecordKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An owned snapshot of one discovered node and its subtree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub path: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloaded_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<NodeError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    /// Last path segment; the root reports its full path.
    pub fn name(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((_, name)) if !name.is_empty() => name,
            _ => &self.path,
        }
    }
}

/// What a worker learned about one node.
#[derive(Debug, Clone, Default)]
pub struct NodeRecord {
    pub kind: NodeKind,
    pub status: Option<u16>,
    pub size_bytes: Option<u64>,
    pub content_type: Option<String>,
    pub primary_type: Option<String>,
    pub downloaded_to: Option<String>,
    pub error: Option<NodeError>,
}

#[derive(Debug, Default)]
struct Entry {
    record: NodeRecord,
    children: Vec<String>,
}

/// Path-keyed node table built concurrently by the crawl workers.
///
/// `record` is the only mutator; the caller's visited-set claim guarantees
/// it runs at most once per path, so each node is linked under its parent
/// exactly once. `snapshot` is safe at any point during the crawl and
/// yields a per-node consistent view.
pub struct ContentTree {
    root: String,
    inner: Mutex<HashMap<String, Entry>>,
}

impl ContentTree {
    pub fn new(root: &str) -> Self {
        let root = path::normalize(root);
        let mut nodes = HashMap::new();
        nodes.insert(root.clone(), Entry::default());
        Self {
            root,
            inner: Mutex::new(nodes),
        }
    }

    pub fn root_path(&self) -> &str {
        &self.root
    }

    /// Record a node's outcome, linking it under its parent on first sight.
    pub fn record(&self, node_path: &str, record: NodeRecord) {
        let node_path = path::normalize(node_path);
        let mut nodes = self.inner.lock().expect("tree lock poisoned");
        if node_path != self.root {
            let parent = path::parent(&node_path);
            let entry = nodes.entry(parent).or_default();
            if !entry.children.contains(&node_path) {
                entry.children.push(node_path.clone());
            }
        }
        nodes.entry(node_path).or_default().record = record;
    }

    /// Build an owned tree rooted at the crawl root.
    pub fn snapshot(&self) -> Node {
        let nodes = self.inner.lock().expect("tree lock poisoned");
        build_node(&nodes, &self.root)
    }
}

fn build_node(nodes: &HashMap<String, Entry>, node_path: &str) -> Node {
    let empty = Entry::default();
    let entry = nodes.get(node_path).unwrap_or(&empty);
    let record = &entry.record;
    Node {
        path: node_path.to_string(),
        kind: record.kind,
        status: record.status,
        size_bytes: record.size_bytes,
        content_type: record.content_type.clone(),
        primary_type: record.primary_type.clone(),
        downloaded_to: record.downloaded_to.clone(),
        error: record.error.clone(),
        children: entry
            .children
            .iter()
            .map(|child| build_node(nodes, child))
            .collect(),
    }
}

/// Lock-free counters every worker bumps as it goes.
#[derive(Debug, Default)]
pub struct StatCounters {
    pub folders: AtomicUsize,
    pub assets: AtomicUsize,
    pub unknown: AtomicUsize,
    pub errors: AtomicUsize,
    pub requests: AtomicUsize,
    pub bytes_downloaded: AtomicU64,
}

impl StatCounters {
    pub fn snapshot(&self) -> CrawlStats {
        CrawlStats {
            folders: self.folders.load(Ordering::Relaxed),
            assets: self.assets.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            requests: self.requests.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the crawl counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlStats {
    pub folders: usize,
    pub assets: usize,
    pub unknown: usize,
    pub errors: usize,
    pub requests: usize,
    pub bytes_downloaded: u64,
}
