// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! crawlgraph CLI
//!
//! Crawls a web application over HTTP and prints the discovered state graph.

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};

use crawlgraph::{CrawlConfig, CrawlResult, Crawler, ExplorationOrder};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("crawlgraph=info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return ExitCode::from(1);
    }

    match args[1].as_str() {
        "crawl" => {
            let options = match CrawlOptions::parse(&args[2..]) {
                Ok(options) => options,
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    eprintln!("Usage: crawlgraph crawl <url> [OPTIONS]");
                    return ExitCode::from(1);
                }
            };
            crawl(options).await
        }
        "--help" | "-h" | "help" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "--version" | "-v" | "version" => {
            println!("crawlgraph {}", crawlgraph::VERSION);
            ExitCode::SUCCESS
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            ExitCode::from(1)
        }
    }
}

fn print_usage() {
    println!(
        r#"crawlgraph - Concurrent state-flow crawler

USAGE:
    crawlgraph <COMMAND> [OPTIONS]

COMMANDS:
    crawl <url>     Explore an application and print its state graph
    help            Show this help message
    version         Show version information

CRAWL OPTIONS:
    --max-states N      Stop after N distinct states
    --max-depth N       Do not fire actions on paths longer than N
    --browsers N        Number of concurrent browsers (default 1)
    --max-time SECS     Stop after SECS seconds
    --order bfs|dfs     Exploration order (default bfs)
    --config FILE       Load settings from a JSON file
    --json              Print the graph and report as JSON

EXAMPLES:
    crawlgraph crawl https://example.com --browsers 4 --max-states 200
    crawlgraph crawl https://example.com --config crawl.json --json

Set RUST_LOG=crawlgraph=debug for per-action logs.
"#
    );
}

struct CrawlOptions {
    config: CrawlConfig,
    json: bool,
}

impl CrawlOptions {
    fn parse(args: &[String]) -> anyhow::Result<Self> {
        let mut url = None;
        let mut config_file = None;
        let mut overrides: Vec<(&str, &str)> = Vec::new();
        let mut json = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--json" => json = true,
                "--config" => {
                    config_file = Some(iter.next().context("--config needs a file")?);
                }
                flag @ ("--max-states" | "--max-depth" | "--browsers" | "--max-time"
                | "--order") => {
                    let value = iter
                        .next()
                        .with_context(|| format!("{} needs a value", flag))?;
                    overrides.push((flag, value.as_str()));
                }
                other if other.starts_with("--") => bail!("unknown option {}", other),
                other => {
                    if url.replace(other.to_string()).is_some() {
                        bail!("more than one url given");
                    }
                }
            }
        }

        let mut config = match config_file {
            Some(path) => CrawlConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path))?,
            None => CrawlConfig::default(),
        };
        if let Some(url) = url {
            config.url = url;
        }

        for (flag, value) in overrides {
            match flag {
                "--max-states" => config.max_states = Some(parse_number(flag, value)?),
                "--max-depth" => config.max_depth = Some(parse_number(flag, value)?),
                "--browsers" => config.concurrent_browsers = parse_number(flag, value)?,
                "--max-time" => {
                    config.max_run_time = Some(Duration::from_secs(parse_number(flag, value)?))
                }
                "--order" => config.order = value.parse::<ExplorationOrder>()?,
                _ => bail!("unknown option {}", flag),
            }
        }

        if config.url.is_empty() {
            bail!("no url given");
        }
        config.validate()?;

        Ok(Self { config, json })
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> anyhow::Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} expects a number, got '{}'", flag, value))
}

async fn crawl(options: CrawlOptions) -> ExitCode {
    if !options.json {
        println!("Crawling: {}", options.config.url);
    }

    let crawler = match Crawler::builder(options.config).build() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            return ExitCode::from(1);
        }
    };

    match crawler.run().await {
        Ok(result) if options.json => match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to serialize result: {}", e);
                ExitCode::from(1)
            }
        },
        Ok(result) => {
            print_result(&result);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Crawl failed: {}", e);
            ExitCode::from(1)
        }
    }
}

fn print_result(result: &CrawlResult) {
    println!("\n=== States ({}) ===", result.graph.state_count());
    for state in &result.graph.states {
        println!("  {:<10} depth {}  {}", state.name(), state.depth(), state.url());
    }

    println!("\n=== Transitions ({}) ===", result.graph.transition_count());
    for transition in result.graph.transitions.iter().take(50) {
        println!("  {}", transition);
    }
    if result.graph.transition_count() > 50 {
        println!("  ... and {} more", result.graph.transition_count() - 50);
    }

    println!("\n=== Summary ===");
    println!("{}", result.report);
}
