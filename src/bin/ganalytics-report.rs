use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ganalytics::config::Config;
use ganalytics::period::PeriodSelector;
use ganalytics::query::Extras;
use ganalytics::{Analytics, AnalyticsClientFactory, ReportKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ganalytics-report")]
#[command(about = "Run Google Analytics reports from the command line", long_about = None)]
struct Cli {
    /// Use a delegated user access token instead of the configured credentials
    #[arg(long, global = true)]
    access_token: Option<String>,

    /// Override GA_VIEW_ID
    #[arg(long, global = true)]
    view_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PeriodArgs {
    /// Named period (today, this_week, last_days, year_to_date, ...)
    #[arg(long)]
    period: Option<String>,
    #[arg(long)]
    days: Option<u32>,
    #[arg(long)]
    months: Option<u32>,
    #[arg(long)]
    years: Option<u32>,
    /// Custom range start (YYYY-MM-DD), requires --end
    #[arg(long)]
    start: Option<NaiveDate>,
    /// Custom range end (YYYY-MM-DD), requires --start
    #[arg(long)]
    end: Option<NaiveDate>,
}

impl From<PeriodArgs> for PeriodSelector {
    fn from(args: PeriodArgs) -> Self {
        PeriodSelector {
            period: args.period,
            days: args.days,
            months: args.months,
            years: args.years,
            start: args.start,
            end: args.end,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named report and print it as JSON
    Report {
        /// Report name, e.g. top_browsers
        name: String,
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long)]
        max_results: Option<u32>,
    },
    /// Run a raw query and print the flattened rows as JSON
    Query {
        /// Metric name without the ga: prefix (repeatable)
        #[arg(long = "metric", required = true)]
        metrics: Vec<String>,
        /// Dimension name without the ga: prefix (repeatable)
        #[arg(long = "dimension")]
        dimensions: Vec<String>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        max_results: Option<u32>,
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// List the available report names
    List,
}

fn build_analytics(access_token: Option<String>, view_id: Option<String>) -> Result<Analytics> {
    let config = Config::from_env()?;
    let client = match access_token {
        Some(token) => AnalyticsClientFactory::create_for_token(&config, token)?,
        None => AnalyticsClientFactory::create_for_config(&config)?,
    };

    let mut analytics = Analytics::new(client, config.analytics.view_id.clone());
    if let Some(view_id) = view_id {
        analytics.set_view_id(view_id);
    }
    Ok(analytics)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let Cli {
        access_token,
        view_id,
        command,
    } = Cli::parse();

    match command {
        Commands::List => {
            for kind in ReportKind::ALL {
                println!("{}", kind);
            }
        }
        Commands::Report {
            name,
            period,
            max_results,
        } => {
            let kind: ReportKind = name.parse()?;
            let period = PeriodSelector::from(period).resolve()?;
            let analytics = build_analytics(access_token, view_id)?;
            let report = analytics.fetch_report(kind, period, max_results).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Query {
            metrics,
            dimensions,
            sort_by,
            max_results,
            period,
        } => {
            let period = PeriodSelector::from(period).resolve()?;
            let analytics = build_analytics(access_token, view_id)?;
            let rows = analytics
                .perform_query(
                    period,
                    metrics,
                    dimensions,
                    sort_by.as_deref(),
                    max_results,
                    Extras::new(),
                )
                .await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
