//! workshop-pulse - workshop tracking dashboard
//!
//! Loads manual workshops and AI usage from JSON files, optionally reads a
//! calendar, and prints the dashboard.

mod report;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use workshop_pulse_core::calendar::{
    convert_calendar_events, CalendarSource, GoogleCalendarClient, RawCalendarEvent,
    StaticCalendarSource,
};
use workshop_pulse_core::{
    open_store, AiUsageLedger, ChartRange, Clock, Config, DashboardRequest, DashboardService,
    FixedClock, NewAiUsage, NewWorkshop, SystemClock, UuidGenerator, WorkshopRegistry,
};

/// Token handed to a file-backed calendar source, which ignores it
const FIXTURE_TOKEN: &str = "fixture";

#[derive(Parser)]
#[command(name = "workshop-pulse")]
#[command(about = "Workshop statistics, trends and AI usage")]
#[command(version)]
struct Args {
    /// Config file (defaults to ~/.config/workshop-pulse/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Pin "now" to an RFC 3339 timestamp
    #[arg(long, global = true)]
    now: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the full dashboard
    Stats {
        /// JSON array of workshops to create before computing
        #[arg(long)]
        workshops: Option<PathBuf>,

        /// JSON array of AI usage entries to log before computing
        #[arg(long)]
        usage: Option<PathBuf>,

        /// JSON array of calendar events to use as the calendar
        #[arg(long, conflicts_with = "access_token")]
        events: Option<PathBuf>,

        /// Google Calendar access token
        #[arg(long, env = "WORKSHOP_PULSE_ACCESS_TOKEN")]
        access_token: Option<String>,

        /// Chart range: week, month or year
        #[arg(long, default_value = "week")]
        range: ChartRange,

        /// Calendar fetch budget in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Price one AI call
    Cost {
        model: String,
        prompt_tokens: u64,
        completion_tokens: u64,
    },

    /// Convert calendar events to workshop records
    Convert {
        /// JSON array of calendar events
        #[arg(long)]
        events: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Config::load().context("failed to load configuration")?,
    };

    let _log_guard =
        workshop_pulse_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let clock = clock_from(args.now.as_deref())?;
    tracing::info!(now = %clock.now(), "workshop-pulse starting");

    match args.command {
        Command::Stats {
            workshops,
            usage,
            events,
            access_token,
            range,
            timeout_ms,
        } => {
            let request = DashboardRequest {
                access_token: access_token
                    .or_else(|| events.as_ref().map(|_| FIXTURE_TOKEN.to_string())),
                range,
                fetch_timeout: timeout_ms.map(Duration::from_millis),
            };
            let sources = Sources {
                workshops,
                usage,
                events,
            };
            run_stats(&config, clock, sources, &request, args.json).await
        }
        Command::Cost {
            model,
            prompt_tokens,
            completion_tokens,
        } => {
            let table = config.pricing.table();
            let cost = table.calculate_cost(&model, prompt_tokens, completion_tokens);
            let matched = table.lookup(&model).map(|(key, _)| key.to_string());
            if args.json {
                let value = serde_json::json!({
                    "model": model,
                    "matched": matched,
                    "promptTokens": prompt_tokens,
                    "completionTokens": completion_tokens,
                    "cost": cost,
                });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!(
                    "{} ({}): ${:.6}",
                    model,
                    matched.as_deref().unwrap_or("default rate"),
                    cost
                );
            }
            Ok(())
        }
        Command::Convert { events } => {
            let raw: Vec<RawCalendarEvent> = read_json(&events)?;
            let workshops = convert_calendar_events(&raw, clock.now());
            if args.json {
                println!("{}", serde_json::to_string_pretty(&workshops)?);
            } else {
                report::print_workshops(&workshops);
            }
            Ok(())
        }
    }
}

/// Input files for the `stats` command
struct Sources {
    workshops: Option<PathBuf>,
    usage: Option<PathBuf>,
    events: Option<PathBuf>,
}

async fn run_stats(
    config: &Config,
    clock: Arc<dyn Clock>,
    sources: Sources,
    request: &DashboardRequest,
    json: bool,
) -> Result<()> {
    let store = open_store(config).context("failed to open workshop store")?;
    let ids = Arc::new(UuidGenerator);

    let registry = WorkshopRegistry::new(store.clone(), clock.clone(), ids.clone());
    if let Some(path) = &sources.workshops {
        let inputs: Vec<NewWorkshop> = read_json(path)?;
        for (i, input) in inputs.into_iter().enumerate() {
            registry
                .create(input)
                .with_context(|| format!("invalid workshop #{} in {}", i + 1, path.display()))?;
        }
    }

    let ledger = Arc::new(AiUsageLedger::new(
        config.store.usage_capacity,
        config.pricing.table(),
        clock.clone(),
        ids,
    ));
    if let Some(path) = &sources.usage {
        let entries: Vec<NewAiUsage> = read_json(path)?;
        for (i, entry) in entries.into_iter().enumerate() {
            ledger
                .log(entry)
                .with_context(|| format!("invalid usage entry #{} in {}", i + 1, path.display()))?;
        }
    }

    let mut service = DashboardService::new(store, ledger, clock, config.calendar.clone());
    if let Some(source) = calendar_source(config, sources.events.as_deref(), request)? {
        service = service.with_calendar(source);
    }

    let stats = service
        .dashboard(request)
        .await
        .context("failed to compute dashboard")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        report::print_dashboard(&stats);
    }
    Ok(())
}

fn calendar_source(
    config: &Config,
    events: Option<&Path>,
    request: &DashboardRequest,
) -> Result<Option<Arc<dyn CalendarSource>>> {
    if let Some(path) = events {
        let raw: Vec<RawCalendarEvent> = read_json(path)?;
        return Ok(Some(Arc::new(StaticCalendarSource::new(raw))));
    }
    if request.access_token.is_some() {
        let client = GoogleCalendarClient::new(&config.calendar)
            .context("failed to create calendar client")?;
        return Ok(Some(Arc::new(client)));
    }
    Ok(None)
}

fn clock_from(now: Option<&str>) -> Result<Arc<dyn Clock>> {
    Ok(match now {
        Some(raw) => {
            let at = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("invalid --now timestamp: {}", raw))?;
            Arc::new(FixedClock(at.with_timezone(&Utc)))
        }
        None => Arc::new(SystemClock),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
}
