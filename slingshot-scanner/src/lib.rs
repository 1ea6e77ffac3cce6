pub mod classify;
pub mod crawler;
pub mod download;
pub mod error;
pub mod path;
pub mod tree;

pub use crawler::{CrawlOutcome, Crawler, CrawlerConfig, EventCallback};
pub use download::{AssetSink, DirSink};
pub use error::{NodeError, ScanError};
pub use tree::{ContentTree, CrawlStats, Node, NodeKind, RecordKind, RequestRecord};
