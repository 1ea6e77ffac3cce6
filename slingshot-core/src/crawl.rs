//! Crawl orchestration: wires the scanner's engine to the console.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use slingshot_scanner::crawler::{DEFAULT_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use slingshot_scanner::{
    CrawlOutcome, Crawler, CrawlerConfig, DirSink, EventCallback, RequestRecord,
};
use uuid::Uuid;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub url: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub proxy: Option<String>,
    pub insecure: bool,
    pub download_dir: Option<PathBuf>,
    pub show_progress: bool,
}

impl CrawlOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            insecure: false,
            download_dir: None,
            show_progress: true,
        }
    }
}

/// One finished crawl plus its report identity.
pub struct CrawlSession {
    pub session_id: String,
    pub target: String,
    pub outcome: CrawlOutcome,
}

/// Execute a crawl with the given options, streaming a live per-request
/// feed to the console while it runs.
pub async fn execute_crawl(options: CrawlOptions) -> Result<CrawlSession> {
    let CrawlOptions {
        url,
        concurrency,
        timeout_secs,
        user_agent,
        proxy,
        insecure,
        download_dir,
        show_progress,
    } = options;

    let mut crawler = Crawler::new(CrawlerConfig {
        concurrency,
        timeout: Duration::from_secs(timeout_secs),
        user_agent,
        proxy,
        insecure,
    })
    .context("failed to build crawler")?;

    if let Some(dir) = download_dir {
        let sink = DirSink::new(&dir)
            .with_context(|| format!("failed to create download directory {}", dir.display()))?;
        crawler = crawler.with_sink(Arc::new(sink));
    }

    // One spinner with running counts; finished request lines stream above it.
    let progress_bar = if show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    if let Some(pb) = progress_bar.clone() {
        let count_clone = processed_count.clone();
        let callback: EventCallback = Arc::new(move |record: RequestRecord| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            pb.println(format_record_line(&record));
            pb.set_message(format!("Crawling... {} requests", count));
        });
        crawler = crawler.with_event_callback(callback);
    }

    // Ctrl-c flips the engine's cancel flag; the crawl drains and whatever
    // was found still gets reported.
    let cancel = crawler.cancel_handle();
    let pb_for_signal = progress_bar.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
            if let Some(pb) = pb_for_signal {
                pb.println("[!] interrupt received, draining crawl".yellow().to_string());
            }
        }
    });

    let outcome = crawler.crawl(&url).await.context("crawl failed")?;

    if let Some(pb) = &progress_bar {
        pb.finish_with_message(format!(
            "Crawl complete! {} requests",
            outcome.stats.requests
        ));
    }

    Ok(CrawlSession {
        session_id: Uuid::new_v4().to_string(),
        target: url,
        outcome,
    })
}

/// One live console line per completed request, ffuf-style.
pub fn format_record_line(record: &RequestRecord) -> String {
    let status = match record.status {
        Some(status) => {
            let text = format!("{status:3}");
            match status {
                200..=299 => text.green().to_string(),
                300..=399 => text.cyan().to_string(),
                400..=499 => text.yellow().to_string(),
                500..=599 => text.red().to_string(),
                _ => text,
            }
        }
        None => "ERR".red().to_string(),
    };
    let kind = format!("[{:<7}]", record.kind.as_str().to_uppercase());
    let size = format_size(record.size_bytes);

    match &record.message {
        Some(message) => format!(
            "{kind} {status} | Size: {size:>10} | {} | {message}",
            record.url
        ),
        None => format!("{kind} {status} | Size: {size:>10} | {}", record.url),
    }
}

/// Summary block printed once the crawl finishes.
pub fn generate_crawl_summary(session: &CrawlSession) -> String {
    let stats = &session.outcome.stats;
    let duration = session.outcome.elapsed.as_secs_f64();
    let req_per_sec = if duration > 0.0 {
        stats.requests as f64 / duration
    } else {
        0.0
    };

    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str("Crawl Complete\n");
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    report.push_str(&format!("Target:          {}\n", session.target));
    report.push_str(&format!("Session:         {}\n", session.session_id));
    report.push_str(&format!("Requests:        {}\n", stats.requests));
    report.push_str(&format!("Folders Found:   {}\n", stats.folders));
    report.push_str(&format!("Assets Found:    {}\n", stats.assets));
    report.push_str(&format!("Unknown Nodes:   {}\n", stats.unknown));
    report.push_str(&format!("Errors:          {}\n", stats.errors));
    report.push_str(&format!(
        "Total Data:      {}\n",
        format_size(stats.bytes_downloaded)
    ));
    report.push_str(&format!("Duration:        {:.2}s\n", duration));
    report.push_str(&format!("Requests/sec:    {:.2}\n", req_per_sec));
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

    report
}

/// Human-readable byte count.
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = size as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TB")
}
