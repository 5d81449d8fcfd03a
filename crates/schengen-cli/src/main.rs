//! `schengen` CLI — check stay histories against the 90/180-day rule.
//!
//! Stays are read as a JSON array of
//! `{"country", "entry", "exit"?, "id"?, "notes"?}` objects with `YYYY-MM-DD`
//! dates. A stay without `exit` is still ongoing.
//!
//! ## Usage
//!
//! ```sh
//! # Compliance snapshot as of today (stdin → stdout)
//! cat stays.json | schengen status
//!
//! # Snapshot as of a fixed date, as JSON
//! schengen status -i stays.json --today 2024-03-30 --json
//!
//! # Earliest day with allowance to spare
//! schengen next-entry -i stays.json
//!
//! # Validate a planned trip
//! schengen plan -i stays.json --entry 2024-07-01 --exit 2024-07-14 --country PT
//!
//! # Days per calendar month
//! schengen monthly -i stays.json --from 2024-01-01 --to 2024-12-31
//!
//! # Usage statistics over many histories
//! schengen usage -i histories.json --format csv
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

use schengen_engine::{
    ClientMetadata, ComplianceResult, ExportFormat, MonthlyBreakdown, NextEntryResult, Rule, Stay,
    TripValidationResult, UsageRecorder,
};

#[derive(Parser)]
#[command(
    name = "schengen",
    version,
    about = "Check stays against the 90 days in any 180 days rule"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Input JSON file (reads from stdin if omitted)
    #[arg(short, long, global = true)]
    input: Option<String>,

    /// Reference date, YYYY-MM-DD (defaults to the local calendar date)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show days used and remaining as of the reference date
    Status,
    /// Find the next date with allowance available
    NextEntry,
    /// Validate a planned trip
    Plan {
        /// First day of the trip
        #[arg(long)]
        entry: NaiveDate,
        /// Last day of the trip
        #[arg(long)]
        exit: NaiveDate,
        /// Country of entry
        #[arg(long, default_value = "XX")]
        country: String,
    },
    /// Break usage down by calendar month
    Monthly {
        /// First day of the range
        #[arg(long)]
        from: NaiveDate,
        /// Last day of the range
        #[arg(long)]
        to: NaiveDate,
    },
    /// Evaluate many histories and export anonymized usage statistics
    Usage {
        /// Export format: json (summary) or csv (raw snapshots)
        #[arg(long, default_value = "json")]
        format: ExportFormat,
    },
}

/// One history in the `usage` input file.
#[derive(Deserialize)]
struct HistoryInput {
    #[serde(default = "default_timezone")]
    timezone: String,
    stays: Vec<Stay>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let rule = Rule::default();
    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    let input = read_input(cli.input.as_deref())?;
    tracing::debug!(%today, bytes = input.len(), "read input");

    match cli.command {
        Commands::Status => {
            let stays = parse_stays(&input)?;
            let result = rule.compliance(&stays, today);
            emit(cli.json, &result, || render_status(&result, &rule))?;
        }
        Commands::NextEntry => {
            let stays = parse_stays(&input)?;
            let result = rule.next_possible_entry(&stays, today);
            emit(cli.json, &result, || render_next_entry(&result))?;
        }
        Commands::Plan {
            entry,
            exit,
            country,
        } => {
            let stays = parse_stays(&input)?;
            let result = rule
                .validate_trip(&stays, entry, exit, &country)
                .context("Failed to validate planned trip")?;
            emit(cli.json, &result, || render_plan(&result))?;
        }
        Commands::Monthly { from, to } => {
            let stays = parse_stays(&input)?;
            let breakdown = schengen_engine::monthly_breakdown(&stays, from, to, today)
                .context("Failed to build monthly breakdown")?;
            emit(cli.json, &breakdown, || render_monthly(&breakdown))?;
        }
        Commands::Usage { format } => {
            let histories: Vec<HistoryInput> =
                serde_json::from_str(&input).context("Failed to parse histories JSON")?;
            let mut recorder = UsageRecorder::with_random_session();
            let now = Utc::now();
            for history in histories {
                let result = rule.compliance(&history.stays, today);
                let client = ClientMetadata {
                    timezone: history.timezone,
                    user_agent: None,
                };
                recorder.record(&result, client, now);
            }
            tracing::info!(snapshots = recorder.len(), %format, "exporting usage");
            let out = recorder
                .export(format)
                .context("Failed to export usage statistics")?;
            print!("{}", out);
            if !out.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_stays(input: &str) -> Result<Vec<Stay>> {
    serde_json::from_str(input).context("Failed to parse stays JSON")
}

/// Print `value` as pretty JSON, or the text rendering when `json` is false.
fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print!("{}", text());
    }
    Ok(())
}

fn render_status(result: &ComplianceResult, rule: &Rule) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Window:         {} .. {}\n",
        result.lookback_window.start, result.lookback_window.end
    ));
    out.push_str(&format!(
        "Days used:      {} / {}\n",
        result.days_used,
        rule.max_days()
    ));
    out.push_str(&format!("Days remaining: {}\n", result.days_remaining));
    if result.is_compliant {
        out.push_str("Status:         compliant\n");
    } else {
        out.push_str(&format!(
            "Status:         NOT compliant ({} days over)\n",
            result.days_over(rule)
        ));
    }
    for stay in &result.relevant_stays {
        let exit = stay
            .original_exit
            .map(|d| d.to_string())
            .unwrap_or_else(|| "ongoing".to_string());
        out.push_str(&format!(
            "  {} {} .. {}: {} days in window\n",
            stay.country, stay.original_entry, exit, stay.days_in_window
        ));
    }
    out
}

fn render_next_entry(result: &NextEntryResult) -> String {
    match (result.next_possible_entry, result.days_until_entry) {
        (Some(date), Some(days)) => format!(
            "Next possible entry: {} (in {} days, {} days available)\n",
            date, days, result.days_available
        ),
        _ => format!(
            "{}\n",
            result
                .error
                .as_deref()
                .unwrap_or("No possible entry date found")
        ),
    }
}

fn render_plan(result: &TripValidationResult) -> String {
    let mut out = String::new();
    out.push_str(&format!("Trip length:        {} days\n", result.trip_duration));
    out.push_str(&format!(
        "Available on entry: {} days\n",
        result.days_available_on_entry
    ));
    out.push_str(&format!(
        "Used after exit:    {} days\n",
        result.days_used_on_exit
    ));
    out.push_str(if result.is_valid {
        "Verdict:            OK\n"
    } else {
        "Verdict:            NOT ALLOWED\n"
    });
    for message in result.warning_messages() {
        out.push_str(&format!("  warning: {}\n", message));
    }
    out
}

fn render_monthly(breakdown: &MonthlyBreakdown) -> String {
    let mut out = String::new();
    for (month, usage) in breakdown.iter() {
        out.push_str(&format!("{}  {:>3} days\n", month, usage.total_days));
    }
    out.push_str(&format!("Total    {:>3} days\n", breakdown.total_days()));
    out
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
