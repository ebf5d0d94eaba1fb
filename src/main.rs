//! Vitalboard CLI
//!
//! Command-line front end for the vital-sign dashboard:
//! - Render every panel once
//! - Show a single metric as a table or JSON
//! - Watch the dashboard refresh on an interval
//! - Generate a default config file

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vitalboard::config::{generate_default_config, Config, LoggingConfig};
use vitalboard::{
    parse_date, AuthenticatedRequester, Dashboard, MetricKind, MetricPanel, PaginatedFetcher,
    Period, RefreshOutcome, Selection, TimeRange,
};

#[derive(Parser)]
#[command(name = "vitalboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vital-sign dashboard for a paginated health backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long, global = true)]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Refresh every panel once and print them
    Dashboard {
        #[command(flatten)]
        selection: SelectionArgs,
    },

    /// Show a single metric
    Show {
        /// Metric (heart_rate, spo2, sleep, stress, hrv, blood_pressure, steps, daily_activity)
        metric: String,
        #[command(flatten)]
        selection: SelectionArgs,
        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Refresh the dashboard on an interval
    Watch {
        #[command(flatten)]
        selection: SelectionArgs,
        /// Seconds between refreshes
        #[arg(short, long, default_value = "60")]
        interval: u64,
        /// Stop after this many refreshes
        #[arg(short = 'n', long)]
        iterations: Option<u32>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// User and time range shared by the data commands
#[derive(Args)]
pub struct SelectionArgs {
    /// User id (default: dashboard.default_user)
    #[arg(short, long)]
    pub user: Option<String>,
    /// Period (today, week, month)
    #[arg(short, long, conflicts_with_all = ["from", "to"])]
    pub period: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
}

impl SelectionArgs {
    fn resolve(&self, config: &Config) -> anyhow::Result<Selection> {
        let user_id = self
            .user
            .clone()
            .or_else(|| config.dashboard.default_user.clone());

        let range = if self.from.is_some() || self.to.is_some() {
            let from = self.from.as_deref().map(parse_cli_date).transpose()?;
            let to = self.to.as_deref().map(parse_cli_date).transpose()?;
            match TimeRange::from_bounds(from, to) {
                Some(range) => range,
                None => bail!("--from must not be after --to"),
            }
        } else {
            let period = match self.period.as_deref() {
                Some(p) => p.parse::<Period>().map_err(anyhow::Error::msg)?,
                None => config.default_period(),
            };
            period.time_range()
        };

        Ok(Selection::new(user_id, Some(range)))
    }
}

fn parse_cli_date(s: &str) -> anyhow::Result<chrono::NaiveDate> {
    parse_date(s).with_context(|| format!("invalid date '{}'", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                std::fs::write(path, content)
                    .with_context(|| format!("failed to write {:?}", path))?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = cli.base_url {
        config.backend.base_url = url;
    }

    init_logging(&config.logging);
    tracing::debug!(base_url = %config.backend.base_url, "vitalboard v{}", env!("CARGO_PKG_VERSION"));

    let fetcher = build_fetcher(&config)?;

    match cli.command {
        Commands::Dashboard { selection } => {
            let selection = selection.resolve(&config)?;
            let dashboard = build_dashboard(&config, fetcher);

            print_header(&selection);
            dashboard.set_selection(selection).await;
            for view in dashboard.views() {
                println!("{}", view);
            }
            println!();
            println!("{}", dashboard.summary());
        }

        Commands::Show {
            metric,
            selection,
            format,
        } => {
            let kind: MetricKind = metric.parse().map_err(anyhow::Error::msg)?;
            let selection = selection.resolve(&config)?;
            let options = config.dashboard_options();
            let panel = MetricPanel::new(kind, fetcher)
                .cache(options.cache_ttl, options.clock)
                .formatter(options.formatter);

            let outcome = panel.refresh(&selection).await;
            let view = panel.view();
            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&view)?),
                _ => {
                    print_header(&selection);
                    println!("{}", view);
                }
            }

            if let RefreshOutcome::Failed(err) = outcome {
                return Err(err).with_context(|| format!("failed to load {}", kind));
            }
        }

        Commands::Watch {
            selection,
            interval,
            iterations,
        } => {
            let selection = selection.resolve(&config)?;
            let dashboard = build_dashboard(&config, fetcher);
            watch(&dashboard, selection, interval, iterations).await;
            dashboard.unmount();
        }

        // Handled before config load
        Commands::Config { .. } => {}
    }

    Ok(())
}

async fn watch(dashboard: &Dashboard, selection: Selection, interval: u64, iterations: Option<u32>) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval.max(1)));
    let mut round = 0u32;
    let mut selection = Some(selection);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping watch");
                break;
            }
        }

        let outcomes = match selection.take() {
            Some(selection) => {
                print_header(&selection);
                dashboard.set_selection(selection).await
            }
            None => dashboard.refresh_all().await,
        };
        round += 1;

        let cached = outcomes
            .iter()
            .filter(|(_, o)| *o == RefreshOutcome::CacheHit)
            .count();
        let failed = outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RefreshOutcome::Failed(_)))
            .count();
        tracing::info!(round, cached, failed, "refresh complete");

        println!("--- refresh {} ({} from cache, {} failed)", round, cached, failed);
        for view in dashboard.views() {
            println!("{}", view);
        }
        println!("{}", dashboard.summary());

        if iterations.is_some_and(|n| round >= n) {
            break;
        }
    }
}

fn build_fetcher(config: &Config) -> anyhow::Result<Arc<PaginatedFetcher>> {
    let requester = AuthenticatedRequester::new(config.requester_config())
        .context("failed to build HTTP client")?;
    Ok(Arc::new(PaginatedFetcher::new(
        Arc::new(requester),
        config.fetcher_config(),
    )))
}

fn build_dashboard(config: &Config, fetcher: Arc<PaginatedFetcher>) -> Dashboard {
    Dashboard::with_metrics(fetcher, &config.dashboard.metrics, config.dashboard_options())
}

fn print_header(selection: &Selection) {
    println!(
        "{} | {}",
        selection.user_id.as_deref().unwrap_or("default user"),
        selection.range.clone().unwrap_or_default()
    );
    println!("{}", "=".repeat(48));
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vitalboard={}", config.level).into());
    let registry = tracing_subscriber::registry().with(filter);

    if config.format == "json" {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
