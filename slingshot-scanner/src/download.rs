//! Sink boundary for persisting discovered asset payloads.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Destination for asset payloads. Implementations must be shareable across
/// crawl workers; a failed store is reported on the owning node only.
pub trait AssetSink: Send + Sync {
    /// Persist one payload under its repository path; returns the local
    /// path written.
    fn store(&self, repo_path: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Writes payloads under a root directory, mirroring the repository
/// hierarchy.
pub struct DirSink {
    root: PathBuf,
}

impl DirSink {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSink for DirSink {
    fn store(&self, repo_path: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let mut local = self.root.clone();
        for segment in repo_path.split('/').filter(|s| !s.is_empty()) {
            // Repository names come from a remote server; never let them
            // walk out of the sink root.
            if segment == "." || segment == ".." {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("refusing traversal segment in {repo_path}"),
                ));
            }
            local.push(segment);
        }
        if local == self.root {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "empty repository path",
            ));
        }
        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&local, bytes)?;
        debug!("wrote {} bytes to {}", bytes.len(), local.display());
        Ok(local)
    }
}
