use crate::CLAP_STYLING;
use clap::{arg, command};
use slingshot_scanner::crawler::DEFAULT_USER_AGENT;
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("slingshot")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("slingshot")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Recursively enumerate a Sling/AEM content tree through the JSON dump \
                selector, optionally mirroring discovered assets to disk.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Base URL to crawl (e.g. https://example.com)")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(-p --"proxy" <URL>)
                        .required(false)
                        .help("HTTP proxy for all requests (e.g. http://127.0.0.1:8080)"),
                )
                .arg(
                    arg!(-d --"download-dir" <PATH>)
                        .required(false)
                        .help("Directory to mirror discovered assets into"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Write a combined JSON document (stats, structure, results)"),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("100"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("30"),
                )
                .arg(
                    arg!(-a --"user-agent" <STRING>)
                        .required(false)
                        .help("User-Agent header")
                        .default_value(DEFAULT_USER_AGENT),
                )
                .arg(
                    arg!(-k --"insecure")
                        .required(false)
                        .help("Skip TLS certificate verification (like curl -k)")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
