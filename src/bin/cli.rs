//! Hookscope CLI
//!
//! Command-line interface for a running Hookscope server:
//! - Search captured webhooks
//! - Browse entries
//! - Try JSONPath expressions
//! - Check status and statistics

use anyhow::{bail, Context};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use hookscope::api::dto::{EntriesResponse, EntryDto, JsonPathResponse, SearchResponse};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hookscope-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search and inspect webhooks captured by a Hookscope server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL
    #[arg(long, default_value = "http://localhost:8080", global = true)]
    pub server_url: String,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search captured entries
    Search {
        /// Free-text words (any word may match)
        text: Vec<String>,
        /// Exact HTTP method ("all" for any)
        #[arg(short, long)]
        method: Option<String>,
        /// Path segment substring
        #[arg(short, long)]
        path: Option<String>,
        /// Client IP substring
        #[arg(long)]
        ip: Option<String>,
        /// JSONPath that must be truthy, e.g. $.order.id
        #[arg(short, long)]
        json_path: Option<String>,
        /// Lower time bound: RFC 3339 or relative (30m, 2h, 1d ago)
        #[arg(long)]
        since: Option<String>,
        /// Upper time bound: RFC 3339 or relative
        #[arg(long)]
        until: Option<String>,
        /// Maximum entries to print
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// List entries in arrival order
    Entries {
        #[arg(long, default_value = "0")]
        offset: usize,
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show one entry in full
    Show {
        /// Entry ID
        id: usize,
    },

    /// Evaluate a JSONPath expression
    Jsonpath {
        /// Expression, e.g. $.data.object.id
        expression: String,
        /// Evaluate against this entry's payload
        #[arg(short, long, conflicts_with = "value")]
        entry: Option<usize>,
        /// Evaluate against this JSON document
        #[arg(short, long)]
        value: Option<String>,
    },

    /// Send a test webhook
    Send {
        /// Path to post to, e.g. /hooks/test
        path: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "POST")]
        method: String,
        /// Request body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Show index, cache and traffic statistics
    Stats,

    /// Show server status
    Status,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let json_output = cli.format == "json";

    match cli.command {
        Commands::Search {
            text,
            method,
            path,
            ip,
            json_path,
            since,
            until,
            limit,
        } => {
            let now = Utc::now();
            let body = serde_json::json!({
                "searchText": text.join(" "),
                "method": method.unwrap_or_default(),
                "path": path.unwrap_or_default(),
                "ip": ip.unwrap_or_default(),
                "jsonPath": json_path.unwrap_or_default(),
                "timeFrom": since.map(|s| parse_time(&s, now)).transpose()?,
                "timeTo": until.map(|s| parse_time(&s, now)).transpose()?,
                "include_entries": true,
                "limit": limit,
            });

            let response = client
                .post(format!("{}/api/v1/search", cli.server_url))
                .json(&body)
                .send()
                .await?;
            let response = check(response).await?;
            let result: SearchResponse = response.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_entries(result.entries.as_deref().unwrap_or_default());
                println!();
                println!(
                    "{} of {} entries match ({} µs)",
                    result.visible_count, result.total, result.meta.execution_time_us
                );
            }
        }

        Commands::Entries { offset, limit } => {
            let response = client
                .get(format!("{}/api/v1/entries", cli.server_url))
                .query(&[("offset", offset), ("limit", limit)])
                .send()
                .await?;
            let page: EntriesResponse = check(response).await?.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else if page.entries.is_empty() {
                println!("No entries captured yet.");
                println!();
                println!("Send one with:");
                println!("  hookscope-cli send /hooks/test -d '{{\"hello\": \"world\"}}'");
            } else {
                print_entries(&page.entries);
                println!();
                println!("Showing {} from offset {} of {}", page.entries.len(), page.offset, page.total);
            }
        }

        Commands::Show { id } => {
            let response = client
                .get(format!("{}/api/v1/entries/{}", cli.server_url, id))
                .send()
                .await?;
            let entry: EntryDto = check(response).await?.json().await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }

        Commands::Jsonpath {
            expression,
            entry,
            value,
        } => {
            let value = value
                .map(|v| serde_json::from_str::<serde_json::Value>(&v))
                .transpose()
                .context("--value is not valid JSON")?;
            if value.is_none() && entry.is_none() {
                bail!("pass either --entry <id> or --value <json>");
            }

            let body = serde_json::json!({
                "expression": expression,
                "entry_id": entry,
                "value": value,
            });
            let response = client
                .post(format!("{}/api/v1/jsonpath", cli.server_url))
                .json(&body)
                .send()
                .await?;
            let result: JsonPathResponse = check(response).await?.json().await?;

            match result.result {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => println!("(no match)"),
            }
            if !json_output {
                println!("truthy: {}", result.truthy);
            }
        }

        Commands::Send { path, method, data } => {
            let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
                .context("invalid HTTP method")?;
            let path = if path.starts_with('/') { path } else { format!("/{}", path) };

            let mut request = client.request(method, format!("{}{}", cli.server_url, path));
            if let Some(data) = data {
                request = request
                    .header("Content-Type", "application/json")
                    .body(data);
            }

            let result: serde_json::Value = check(request.send().await?).await?.json().await?;
            println!("Captured as entry {}", result["id"]);
        }

        Commands::Stats => {
            let response = client
                .get(format!("{}/api/v1/stats", cli.server_url))
                .send()
                .await?;
            let stats: serde_json::Value = check(response).await?.json().await?;

            if json_output {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }

        Commands::Status => {
            let response = client
                .get(format!("{}/health", cli.server_url))
                .send()
                .await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Hookscope v{}", health["version"].as_str().unwrap_or("?"));
                    println!();
                    println!("Status: {}", health["status"].as_str().unwrap_or("unknown"));
                    println!("Entries: {}", health["entries"].as_u64().unwrap_or(0));
                    println!(
                        "Live clients: {}",
                        health["websocket_connections"].as_u64().unwrap_or(0)
                    );
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => bail!("server returned error: {}", resp.status()),
                Err(e) => {
                    eprintln!("Cannot connect to Hookscope at {}", cli.server_url);
                    eprintln!();
                    eprintln!("Make sure the server is running:");
                    eprintln!("  cargo run --bin hookscope");
                    return Err(e.into());
                }
            }
        }

        Commands::Config { output } => {
            let config = hookscope::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

/// Fail with the server's error body on a non-2xx response
async fn check(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    bail!("request failed ({}): {}", status, text)
}

/// RFC 3339 timestamp, or a relative offset into the past (30s, 15m, 2h, 7d)
fn parse_time(s: &str, now: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // "30s", "15m", "2h", "7d", optionally followed by "ago"
    let re = regex::Regex::new(r"^(\d+)\s*([smhd])(?:\s*ago)?$")?;
    let s = s.trim().to_lowercase();
    let Some(caps) = re.captures(&s) else {
        bail!("invalid time: {}. Use RFC 3339 or 30s, 15m, 2h, 7d", s);
    };

    let amount: i64 = caps[1]
        .parse()
        .with_context(|| format!("time offset out of range: {}", s))?;
    let offset = match &caps[2] {
        "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        unit => bail!("invalid time unit: {}", unit),
    };

    match offset.and_then(|offset| now.checked_sub_signed(offset)) {
        Some(time) => Ok(time),
        None => bail!("time offset out of range: {}", s),
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

fn print_entries(entries: &[EntryDto]) {
    println!(
        "{:<6} {:<20} {:<8} {:<16} {}",
        "ID", "Time", "Method", "Client", "Path"
    );
    println!("{}", "-".repeat(80));

    for dto in entries {
        println!(
            "{:<6} {:<20} {:<8} {:<16} {}",
            dto.id,
            dto.entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            dto.entry.method,
            dto.entry.client_ip,
            dto.entry.path
        );
    }
}

fn print_stats(stats: &serde_json::Value) {
    println!("Entries: {}", stats["entries"].as_u64().unwrap_or(0));
    println!();
    println!("Index:");
    for key in ["methods", "path_segments", "ips", "terms"] {
        println!("  {:<14} {}", key, stats["index"][key].as_u64().unwrap_or(0));
    }
    println!();
    println!("Caches:");
    println!(
        "  results:  {} cached, {} hits, {} evaluations",
        stats["result_cache_entries"].as_u64().unwrap_or(0),
        stats["result_cache_hits"].as_u64().unwrap_or(0),
        stats["evaluations"].as_u64().unwrap_or(0)
    );
    println!(
        "  jsonpath: {} cached, {} hits",
        stats["jsonpath_cache_entries"].as_u64().unwrap_or(0),
        stats["jsonpath_cache_hits"].as_u64().unwrap_or(0)
    );
    println!();
    println!("Traffic:");
    if let Some(counts) = stats["traffic"]["method_counts"].as_object() {
        for (method, count) in counts {
            println!("  {:<8} {}", method, count);
        }
    }
    println!(
        "  avg payload: {:.1} bytes",
        stats["traffic"]["average_payload_bytes"].as_f64().unwrap_or(0.0)
    );
}
