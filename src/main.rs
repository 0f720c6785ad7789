// src/main.rs
// =============================================================================
// This is the entry point of our application.
//
// What happens here:
// 1. Set up logging (RUST_LOG controls the level, default: info)
// 2. Parse command-line arguments using clap
// 3. Dispatch to the subcommand: scan one page, or serve the HTTP API
// 4. Exit with proper code (0 = all images fine, 1 = issues found, 2 = error)
// =============================================================================

mod cli;
mod config;
mod crawler;
mod error;
mod models;
mod server;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands, CrawlerArgs};
use crawler::Crawler;
use models::{CrawlReport, CrawlRequest, ImageRecord, ImageRole, SizeOverride};

#[actix_web::main]
async fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every image passed
//   Ok(1) = at least one image has issues
//   Ok(2) = the page itself could not be crawled
//   Err = unexpected error
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            url,
            role,
            target,
            overrides,
            json,
            crawler,
        } => handle_scan(url, role, target, overrides, json, &crawler).await,
        Commands::Serve {
            host,
            port,
            production,
            static_dir,
            crawler,
        } => {
            let crawler = Crawler::new(crawler.to_config())?;
            let options = server::ServerOptions {
                host,
                port,
                production,
                static_dir,
            };
            server::run_server(crawler, options).await?;
            Ok(0)
        }
    }
}

// Handles the 'scan' subcommand
async fn handle_scan(
    url: String,
    role: ImageRole,
    target: String,
    overrides: Vec<SizeOverride>,
    json: bool,
    args: &CrawlerArgs,
) -> Result<i32> {
    let crawler = Crawler::new(args.to_config())?;
    let mut request = CrawlRequest::new(url, role);
    request.target_container = target;
    request.overrides = overrides;

    if !json {
        println!("🔍 Scanning {} for {} images", request.url, request.role);
    }

    let report = crawler.crawl(&request).await;
    print_report(&report, json)?;

    if report.error.is_some() {
        Ok(2)
    } else if report.issue_count() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Prints the report either as a table or JSON
fn print_report(report: &CrawlReport, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(report)?;
        println!("{}", json_output);
    } else if let Some(error) = &report.error {
        println!("❌ {}", error);
    } else {
        print_table(&report.images);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(images: &[ImageRecord]) {
    if images.is_empty() {
        println!("⚠️  No images found");
        return;
    }

    println!(
        "{:<60} {:<11} {:<7} {:>8} {:<9} {}",
        "URL", "SIZE", "FORMAT", "KB", "TYPE", "ISSUES"
    );
    println!("{}", "=".repeat(120));

    for image in images {
        // Truncate URL if too long for display
        let url_display = if image.url.chars().count() > 57 {
            format!("{}...", image.url.chars().take(57).collect::<String>())
        } else {
            image.url.clone()
        };

        let first_issue = image.issues.first().map(String::as_str).unwrap_or("✅ OK");
        println!(
            "{:<60} {:<11} {:<7} {:>8} {:<9} {}",
            url_display,
            format!("{}x{}", image.width, image.height),
            image.format,
            image.file_size / 1024,
            image.role.to_string(),
            first_issue
        );

        // Remaining issues go on their own lines under the first one
        for issue in image.issues.iter().skip(1) {
            println!("{:>99} {}", "", issue);
        }

        if let Some(sources) = &image.responsive_sources {
            for source in sources {
                let condition = match (source.media.as_str(), source.mime_type.as_str()) {
                    ("", "") => "(always)".to_string(),
                    (media, "") => media.to_string(),
                    ("", mime_type) => mime_type.to_string(),
                    (media, mime_type) => format!("{} {}", media, mime_type),
                };
                for variant in &source.sources {
                    println!(
                        "   ↳ {:<55} {:<11} {:<7} {}",
                        variant.url,
                        format!("{}x{}", variant.width, variant.height),
                        variant.format,
                        condition
                    );
                }
            }
        }
    }

    println!();

    let ok_count = images.iter().filter(|image| image.is_ok()).count();
    println!("📊 Summary:");
    println!("   ✅ OK: {}", ok_count);
    println!("   ❌ With issues: {}", images.len() - ok_count);
    println!("   📋 Total: {}", images.len());
}
