use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use nestegg::api::{AppState, run_http_server};
use nestegg::config::AppConfig;
use nestegg::core::{ProjectionInput, future_value, project, summarize};
use nestegg::history::{
    HistoryService, HistoryStore, MemoryHistoryStore, PostgresHistoryStore,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "nestegg",
    about = "Compound-interest projections with saved history",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the web calculator and JSON API
    Serve {
        #[arg(long, help = "Overrides server.port from configuration")]
        port: Option<u16>,
        #[arg(long, help = "Path to a TOML configuration file")]
        config: Option<PathBuf>,
    },
    /// Print a year-by-year projection
    Project {
        #[arg(long, default_value_t = 10_000.0, help = "Initial balance")]
        initial: f64,
        #[arg(long, default_value_t = 500.0, help = "Monthly contribution")]
        monthly: f64,
        #[arg(
            long,
            default_value_t = 8.0,
            allow_negative_numbers = true,
            help = "Expected annual return in percent, e.g. 8"
        )]
        rate: f64,
        #[arg(long, default_value_t = 20, help = "Horizon in years")]
        years: u32,
        #[arg(long, help = "Print the series as JSON")]
        json: bool,
    },
    /// Create the history table and indexes if they are missing
    Setup {
        #[arg(long, help = "Path to a TOML configuration file")]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { port, config } => serve(port, config).await,
        Command::Project {
            initial,
            monthly,
            rate,
            years,
            json,
        } => print_projection(initial, monthly, rate, years, json),
        Command::Setup { config } => setup(config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    // Keeps any subscriber that is already installed.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn HistoryStore>, BoxError> {
    match config.database.postgres() {
        Some(pg) => Ok(Arc::new(PostgresHistoryStore::connect(&pg).await?)),
        None => {
            tracing::warn!("no database.url configured; saved calculations are kept in memory");
            Ok(Arc::new(MemoryHistoryStore::new()))
        }
    }
}

async fn serve(port: Option<u16>, config_path: Option<PathBuf>) -> Result<(), BoxError> {
    let mut config = AppConfig::load(config_path.as_deref())?;
    init_tracing(&config.log.filter);
    if let Some(port) = port {
        config.server.port = port;
    }
    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        identity_header = %config.identity.header,
        "Configuration loaded"
    );

    let history = HistoryService::new(open_store(&config).await?);
    if config.database.ensure_schema_on_start {
        history.ensure_schema().await?;
    }

    let state = Arc::new(AppState::new(history, &config.identity.header)?);
    run_http_server(&config.server, state).await?;
    Ok(())
}

async fn setup(config_path: Option<PathBuf>) -> Result<(), BoxError> {
    let config = AppConfig::load(config_path.as_deref())?;
    init_tracing(&config.log.filter);

    let Some(pg) = config.database.postgres() else {
        return Err("database.url (or DATABASE_URL) must be set to run setup".into());
    };
    let store = PostgresHistoryStore::connect(&pg).await?;
    store.ensure_schema().await?;
    store.close().await;
    println!("calculations table and indexes are ready");
    Ok(())
}

fn print_projection(
    initial: f64,
    monthly: f64,
    rate: f64,
    years: u32,
    json: bool,
) -> Result<(), BoxError> {
    let input = ProjectionInput::new(initial, monthly, rate, years)?;
    let series = project(&input);

    if json {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    println!(
        "{:>4}  {:>16}  {:>16}  {:>16}",
        "year", "balance", "contributions", "earnings"
    );
    for point in series.points() {
        println!(
            "{:>4}  {:>16.0}  {:>16.0}  {:>16.0}",
            point.year_index, point.balance, point.contributions, point.earnings
        );
    }

    let summary = summarize(&series);
    println!();
    println!("Final balance:        {:.0}", summary.final_balance);
    println!("Total contributions:  {:.0}", summary.total_contributions);
    println!("Total earnings:       {:.0}", summary.total_earnings);
    if let Some(roi) = summary.return_on_contributions_percent {
        println!("Return on contributions: {roi:.1}%");
    }
    println!("Closed-form check:    {:.2}", future_value(&input));
    Ok(())
}
