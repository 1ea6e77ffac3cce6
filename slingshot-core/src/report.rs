// Report generation from a finished crawl session

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use slingshot_scanner::{Node, RequestRecord};

use crate::crawl::CrawlSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Tree,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "tree" | "txt" => Some(ReportFormat::Tree),
            _ => None,
        }
    }

    pub fn file_name(&self, timestamp: &str) -> String {
        match self {
            ReportFormat::Json => format!("structure_{timestamp}.json"),
            ReportFormat::Csv => format!("results_{timestamp}.csv"),
            ReportFormat::Tree => format!("tree_{timestamp}.txt"),
        }
    }

    pub fn render(&self, session: &CrawlSession) -> Result<String> {
        match self {
            ReportFormat::Json => generate_structure_json(&session.outcome.tree),
            ReportFormat::Csv => Ok(generate_results_csv(&session.outcome.records)),
            ReportFormat::Tree => Ok(generate_tree_text(&session.outcome.tree)),
        }
    }
}

/// Hierarchical JSON dump mirroring the discovered tree.
pub fn generate_structure_json(root: &Node) -> Result<String> {
    serde_json::to_string_pretty(root).context("failed to serialize structure")
}

/// Flat per-request CSV log.
pub fn generate_results_csv(records: &[RequestRecord]) -> String {
    let mut csv = String::from("timestamp,kind,status,size,url,message\n");
    for record in records {
        let status = record
            .status
            .map(|s| s.to_string())
            .unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            csv_field(&record.timestamp),
            record.kind.as_str(),
            status,
            record.size_bytes,
            csv_field(&record.url),
            csv_field(record.message.as_deref().unwrap_or("")),
        ));
    }
    csv
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// ASCII tree rendering of the discovered hierarchy.
pub fn generate_tree_text(root: &Node) -> String {
    let mut out = format!("{} ({})\n", root.path, node_label(root));
    render_children(&root.children, "", &mut out);
    out
}

fn render_children(children: &[Node], prefix: &str, out: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        let connector = if is_last { "└── " } else { "├── " };
        out.push_str(&format!(
            "{prefix}{connector}{} ({})\n",
            child.name(),
            node_label(child)
        ));

        let extension = if is_last { "    " } else { "│   " };
        render_children(&child.children, &format!("{prefix}{extension}"), out);
    }
}

fn node_label(node: &Node) -> String {
    match (&node.primary_type, &node.error) {
        (_, Some(error)) => error.to_string(),
        (Some(primary_type), None) => primary_type.clone(),
        (None, None) => node.kind.as_str().to_string(),
    }
}

/// Combined document with metadata, stats, structure and the request log.
pub fn generate_detailed_json(session: &CrawlSession) -> Result<String> {
    let document = serde_json::json!({
        "meta": {
            "generator": "slingshot",
            "version": env!("CARGO_PKG_VERSION"),
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "session_id": session.session_id,
            "target": session.target,
        },
        "stats": {
            "folders": session.outcome.stats.folders,
            "assets": session.outcome.stats.assets,
            "unknown": session.outcome.stats.unknown,
            "errors": session.outcome.stats.errors,
            "requests": session.outcome.stats.requests,
            "bytes_downloaded": session.outcome.stats.bytes_downloaded,
            "duration_secs": session.outcome.elapsed.as_secs_f64(),
        },
        "structure": session.outcome.tree,
        "results": session.outcome.records,
    });

    serde_json::to_string_pretty(&document).context("failed to serialize report")
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Timestamp slug used in default output filenames.
pub fn timestamp_slug() -> String {
    chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Write the three default reports into `dir`; returns the written paths.
pub fn write_default_reports(session: &CrawlSession, dir: &Path) -> Result<Vec<PathBuf>> {
    let timestamp = timestamp_slug();
    let mut written = Vec::new();

    for format in [ReportFormat::Json, ReportFormat::Csv, ReportFormat::Tree] {
        let target = dir.join(format.file_name(&timestamp));
        let content = format.render(session)?;
        save_report(&content, &target)
            .with_context(|| format!("failed to write {}", target.display()))?;
        written.push(target);
    }

    Ok(written)
}

/// Write the combined document to an explicit path.
pub fn write_detailed_report(session: &CrawlSession, path: &Path) -> Result<()> {
    let content = generate_detailed_json(session)?;
    save_report(&content, path).with_context(|| format!("failed to write {}", path.display()))
}
