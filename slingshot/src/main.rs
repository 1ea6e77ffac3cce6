use clap::ArgMatches;
use commands::command_argument_builder;
use slingshot_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_summary};
use slingshot_core::{print_banner, report};
use std::path::PathBuf;
use url::Url;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        None => {}
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url = sub_matches.get_one::<Url>("url").expect("url is required");
    let proxy = sub_matches.get_one::<String>("proxy").cloned();
    let download_dir = sub_matches
        .get_one::<String>("download-dir")
        .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()));
    let output_file = sub_matches
        .get_one::<String>("output")
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()));
    let concurrency = *sub_matches
        .get_one::<usize>("concurrency")
        .expect("has default");
    let timeout_secs = *sub_matches.get_one::<u64>("timeout").expect("has default");
    let user_agent = sub_matches
        .get_one::<String>("user-agent")
        .expect("has default")
        .clone();
    let insecure = sub_matches.get_flag("insecure");

    if !quiet {
        println!("Target:     {}", url);
        println!("Proxy:      {}", proxy.as_deref().unwrap_or("none"));
        println!("Workers:    {}", concurrency);
        println!("Timeout:    {}s", timeout_secs);
        println!(
            "Downloads:  {}\n",
            download_dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "disabled".to_string())
        );
    }

    let options = CrawlOptions {
        url: url.as_str().to_string(),
        concurrency,
        timeout_secs,
        user_agent,
        proxy,
        insecure,
        download_dir,
        show_progress: !quiet,
    };

    let session = match execute_crawl(options).await {
        Ok(session) => session,
        Err(e) => {
            eprintln!("[!] Crawl failed: {e:#}");
            std::process::exit(1);
        }
    };

    println!("\n{}", generate_crawl_summary(&session));

    match report::write_default_reports(&session, std::path::Path::new(".")) {
        Ok(written) => {
            for path in written {
                println!("[+] Saved {}", path.display());
            }
        }
        Err(e) => eprintln!("[!] Failed to write reports: {e:#}"),
    }

    if let Some(output_file) = output_file {
        match report::write_detailed_report(&session, &output_file) {
            Ok(()) => println!("[+] Saved detailed output to {}", output_file.display()),
            Err(e) => eprintln!("[!] Failed to write {}: {e:#}", output_file.display()),
        }
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
