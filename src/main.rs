mod repl;
mod setup;

use anyhow::Result;
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use worklog_core::{dates, AgentLoop, Config, Source, ToolRegistry};
use worklog_report::{render_day, render_projects, render_range};
use worklog_sources::{fetch_range, LinearClient};

/// Sources shown by the summary commands. Chat and issue activity are
/// reachable through the assistant instead, so unconfigured optional
/// services don't produce warnings on every summary.
const SUMMARY_SOURCES: [Source; 3] = [Source::Calendar, Source::Browser, Source::Commits];

#[derive(Parser)]
#[command(
    name = "worklog",
    about = "Track your daily work across calendar, browser, commits, chat, and issues",
    version
)]
struct Cli {
    /// Date to show the summary for (YYYY-MM-DD, DD/MM/YYYY, or MM/DD/YYYY)
    #[arg(short, long, global = true)]
    date: Option<String>,

    /// Show yesterday's summary
    #[arg(short, long, global = true)]
    yesterday: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the summary for a specific day (default)
    Day {
        /// Date (YYYY-MM-DD, DD/MM/YYYY, or MM/DD/YYYY)
        date: Option<String>,
    },

    /// Show a week's summary
    Week {
        /// Week number (e.g. '35' or '2026-W35')
        week: Option<String>,
    },

    /// Show a month's summary
    Month {
        /// Month (e.g. 'march', '3', or '2026-03')
        month: Option<String>,
    },

    /// Chat with the worklog assistant
    Chat {
        /// Run a single query instead of the interactive session
        #[arg(short, long)]
        query: Option<String>,

        /// Override the model name
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List issue tracker projects grouped by state
    Projects {
        /// Include completed and canceled projects
        #[arg(long)]
        all: bool,
    },

    /// Configure service credentials interactively
    Setup,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "worklog=info,warn".into()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::load()?;

    match cli.command {
        Some(Commands::Day { date }) => {
            let date = resolve_date(date.or(cli.date), cli.yesterday)?;
            day_summary(&config, date).await?;
        }
        Some(Commands::Week { week }) => {
            let anchor = match week {
                Some(w) => dates::parse_week(&w)?,
                None => Local::now().date_naive(),
            };
            let (start, end) = dates::week_range(anchor);
            let title = format!(
                "Week {} Summary, {}",
                start.date().iso_week().week(),
                start.date().iso_week().year()
            );
            range_summary(&config, &title, start.date(), end.date()).await?;
        }
        Some(Commands::Month { month }) => {
            let anchor = match month {
                Some(m) => dates::parse_month(&m)?,
                None => Local::now().date_naive(),
            };
            let (start, end) = dates::month_range(anchor);
            let title = format!("{} Summary", start.date().format("%B %Y"));
            range_summary(&config, &title, start.date(), end.date()).await?;
        }
        Some(Commands::Chat { query, model }) => {
            chat(config, query, model).await?;
        }
        Some(Commands::Projects { all }) => {
            projects(&config, all).await?;
        }
        Some(Commands::Setup) => {
            setup::run(config).await?;
        }
        Some(Commands::Config { action }) => {
            handle_config_command(action, &config)?;
        }
        None => {
            let date = resolve_date(cli.date, cli.yesterday)?;
            day_summary(&config, date).await?;
        }
    }

    Ok(())
}

fn resolve_date(date: Option<String>, yesterday: bool) -> Result<NaiveDate> {
    let today = Local::now().date_naive();
    Ok(match date {
        Some(d) => dates::parse_date(&d)?,
        None if yesterday => today - Duration::days(1),
        None => today,
    })
}

async fn day_summary(config: &Config, date: NaiveDate) -> Result<()> {
    config.require_configured()?;

    println!("Fetching data for {}...", date.format("%Y-%m-%d"));
    let (start, end) = dates::day_range(date);
    let data = fetch_range(config, &SUMMARY_SOURCES, start, end).await;
    print!("{}", render_day(date, &data));
    Ok(())
}

async fn range_summary(config: &Config, title: &str, start: NaiveDate, end: NaiveDate) -> Result<()> {
    config.require_configured()?;

    println!(
        "Fetching data for {} to {}...",
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d")
    );
    let (range_start, _) = dates::day_range(start);
    let (_, range_end) = dates::day_range(end);
    let data = fetch_range(config, &SUMMARY_SOURCES, range_start, range_end).await;
    print!("{}", render_range(title, start, end, &data));
    Ok(())
}

async fn chat(mut config: Config, query: Option<String>, model: Option<String>) -> Result<()> {
    if !config.is_ai_configured() {
        anyhow::bail!("AI provider API key not configured. Run 'worklog setup' to add it.");
    }
    if !config.is_configured() {
        println!("Warning: data sources not fully configured; some questions may go unanswered.");
        println!("Run 'worklog setup' to configure them.");
    }
    if let Some(model) = model {
        config.provider.model = model;
    }

    let mut registry = ToolRegistry::new();
    worklog_tools::register_all(&mut registry, &config);
    let registry = Arc::new(registry);

    tracing::debug!(
        "loaded {} tools, model: {}, endpoint: {}",
        registry.len(),
        config.provider.model,
        config.provider.api_base,
    );

    match query {
        Some(query) => {
            let agent = AgentLoop::new(config.provider.clone(), registry);
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let transcript = agent
                .run(&[worklog_core::types::Message::user(query)], tx)
                .await?;
            // Single-query mode only prints the final text.
            while rx.try_recv().is_ok() {}
            if let Some(message) = transcript.last() {
                println!("{}", message.content);
            }
            Ok(())
        }
        None => repl::run(config, registry).await,
    }
}

async fn projects(config: &Config, all: bool) -> Result<()> {
    let client = LinearClient::from_config(config)?;
    let projects = client.projects(None, all).await?;
    print!("{}", render_projects(&projects, all));
    Ok(())
}

fn handle_config_command(action: Option<ConfigAction>, config: &Config) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        Some(ConfigAction::Init) => {
            let path = Config::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", Config::default_path().display());
        }
    }
    Ok(())
}
