use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

use terra_cli::output::{write_countries, write_country, write_status};
use terra_cli::{exit_code, Command, Config, OutputFormat, SortArg};
use terra_client::{CountriesClient, ExchangeRateClient};
use terra_core::{AppError, CountryQuery, CountryService, DbConfig};
use terra_db::CountryRepository;

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for exports)
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {}", e);
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<AppError>() {
                Some(app) => error!("{}", app.user_message()),
                None => error!("{:#}", e),
            }
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    // Database connection
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(DbConfig::default().max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    let repo = Arc::new(CountryRepository::new(pool));
    let mut out = io::stdout();

    match &config.command {
        Command::Migrate => {
            repo.migrate().await?;
            info!("Migrations applied");
        }
        Command::Refresh => {
            let service = build_service(&config, repo)?;
            let summary = service.refresh().await?;
            writeln!(out, "\nRefresh complete\n")?;
            writeln!(out, "  Processed:         {}", summary.processed_count)?;
            writeln!(
                out,
                "  Created / updated: {} / {}",
                summary.stats.created, summary.stats.updated
            )?;
            writeln!(out, "  Skipped:           {}", summary.stats.skipped)?;
            writeln!(out, "  Total countries:   {}", summary.metadata.total_countries)?;
            writeln!(out, "  Last refreshed:    {}", summary.metadata.last_refreshed_at)?;
            writeln!(out)?;
        }
        Command::List {
            region,
            currency,
            sort,
            format,
        } => {
            let service = build_service(&config, repo)?;
            let query = build_query(region.as_deref(), currency.as_deref(), *sort);
            let countries = service.list_countries(&query).await?;
            if *format != OutputFormat::Table {
                info!("Exporting {} countries", countries.len());
            }
            write_countries(&mut out, &countries, *format)?;
        }
        Command::Show { name, json } => {
            let service = build_service(&config, repo)?;
            let country = service.get_country(name).await?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&country)?)?;
            } else {
                write_country(&mut out, &country)?;
            }
        }
        Command::Delete { name } => {
            let service = build_service(&config, repo)?;
            let metadata = service.delete_country(name).await?;
            writeln!(
                out,
                "Deleted {}. {} countries remain.",
                name, metadata.total_countries
            )?;
        }
        Command::Status => {
            let service = build_service(&config, repo)?;
            let metadata = service.status().await?;
            write_status(&mut out, &metadata)?;
        }
    }

    Ok(())
}

/// Wires the HTTP sources and the repository into a service.
fn build_service(config: &Config, repo: Arc<CountryRepository>) -> anyhow::Result<CountryService> {
    let sources = config.sources()?;
    let http = sources.http();
    debug!(
        "Sources: {} and {} (timeout {}s)",
        sources.countries_url, sources.exchange_rates_url, sources.timeout_secs
    );

    let countries = CountriesClient::new(&sources.countries_url, &http)?;
    let rates = ExchangeRateClient::new(&sources.exchange_rates_url, &http)?;
    Ok(CountryService::new(Arc::new(countries), Arc::new(rates), repo))
}

fn build_query(region: Option<&str>, currency: Option<&str>, sort: Option<SortArg>) -> CountryQuery {
    let mut query = CountryQuery::new();
    if let Some(region) = region {
        query = query.region(region);
    }
    if let Some(currency) = currency {
        query = query.currency(currency);
    }
    if let Some(sort) = sort {
        query = query.sort(sort.into());
    }
    query
}
