use std::path::{Path, PathBuf};

use axum::http::Method;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use strangler_gateway::lifecycle::startup;
use strangler_gateway::routing::{RouteRule, RouteTable, Split, SplitDecider};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspect the strangler gateway route table", long_about = None)]
struct Cli {
    /// TOML configuration file; the environment preset is used without it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the compiled route table in evaluation order
    Routes,
    /// Show which rule a request path matches
    Explain {
        path: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
    },
    /// Sample split decisions for a path
    Simulate {
        path: String,
        #[arg(short, long, default_value_t = 10_000)]
        samples: usize,
    },
    /// Probe a running gateway's health endpoint
    Health {
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,
    },
}

#[derive(Serialize)]
struct RuleSummary<'a> {
    name: &'a str,
    pattern: String,
    primary: &'a str,
    secondary: Option<&'a str>,
    migration_percent: Option<u8>,
    rewrite: String,
}

impl<'a> From<&'a RouteRule> for RuleSummary<'a> {
    fn from(rule: &'a RouteRule) -> Self {
        Self {
            name: &rule.name,
            pattern: rule.matcher.pattern(),
            primary: &rule.primary.label,
            secondary: rule.migration.as_ref().map(|m| m.origin.label.as_str()),
            migration_percent: rule.migration.as_ref().map(|m| m.percent),
            rewrite: format!("{:?}", rule.rewrite),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Health { url } => probe_health(&url).await?,
        Commands::Routes => {
            let (table, splitter) = compile(config_path)?;
            let rules: Vec<RuleSummary> = table
                .rules()
                .iter()
                .chain(table.fallback())
                .map(RuleSummary::from)
                .collect();
            print_json(&json!({
                "migration_enabled": splitter.is_enabled(),
                "rules": rules,
            }))?;
        }
        Commands::Explain { path, method } => {
            let (table, _) = compile(config_path)?;
            let method: Method = method.to_uppercase().parse()?;
            match table.lookup(&method, &path) {
                Ok(matched) => print_json(&json!({
                    "path": path,
                    "rule": RuleSummary::from(matched.rule),
                    "subpath": matched.subpath,
                }))?,
                Err(e) if path == "/" => println!("{e}; GET / answers with the informational text"),
                Err(e) => println!("{e}; the gateway answers 404"),
            }
        }
        Commands::Simulate { path, samples } => {
            let (table, splitter) = compile(config_path)?;
            let method = Method::GET;
            let mut counts = std::collections::BTreeMap::<String, usize>::new();
            let mut secondary = 0usize;
            for _ in 0..samples {
                let decision = table.resolve(&method, &path, &splitter)?;
                if decision.split == Some(Split::Secondary) {
                    secondary += 1;
                }
                *counts.entry(decision.service_label().to_string()).or_default() += 1;
            }
            print_json(&json!({
                "path": path,
                "samples": samples,
                "migration_enabled": splitter.is_enabled(),
                "secondary_share": if samples == 0 { 0.0 } else { secondary as f64 / samples as f64 },
                "by_service": counts,
            }))?;
        }
    }

    Ok(())
}

fn compile(path: Option<&Path>) -> Result<(RouteTable, SplitDecider), Box<dyn std::error::Error>> {
    let config = startup::load(path)?;
    let table = RouteTable::from_config(&config)?;
    Ok((table, SplitDecider::new(config.migration.enabled)))
}

async fn probe_health(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let res = reqwest::get(format!("{}/health", url.trim_end_matches('/'))).await?;
    let status = res.status();
    let body = res.text().await?;
    if status.is_success() {
        println!("{status}: {body}");
    } else {
        eprintln!("Error: health endpoint returned status {status}");
        eprintln!("Response: {body}");
        std::process::exit(1);
    }
    Ok(())
}

fn print_json(value: &serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
