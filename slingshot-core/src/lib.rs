pub mod crawl;
pub mod report;

use colored::Colorize;

const BANNER: &str = r#"
     _ _                 _           _
 ___| (_)_ __   __ _ ___| |__   ___ | |_
/ __| | | '_ \ / _` / __| '_ \ / _ \| __|
\__ \ | | | | | (_| \__ \ | | | (_) | |_
|___/_|_|_| |_|\__, |___/_| |_|\___/ \__|
               |___/
"#;

pub fn print_banner() {
    println!("{}", BANNER.cyan());
    println!(
        "  {} v{} - Sling/AEM JCR content tree crawler",
        "slingshot".bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("  {}\n", "For authorized security testing only.".dimmed());
}
