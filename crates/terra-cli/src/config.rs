use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use terra_core::{load_sources_config, AppError, SortKey, SourcesConfig};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "terra")]
#[command(
    author,
    version,
    about = "Country data pipeline: merges country and exchange rate sources into PostgreSQL"
)]
#[command(after_help = "Examples:
  terra migrate
  terra refresh
  terra list --region africa --sort gdp_desc
  terra list --format csv > countries.csv
  terra show nigeria
  terra status")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Country list endpoint (overrides sources.toml)
    #[arg(long, env = "COUNTRIES_API_URL")]
    pub countries_url: Option<String>,

    /// Exchange rate endpoint (overrides sources.toml)
    #[arg(long, env = "EXCHANGE_API_URL")]
    pub exchange_rates_url: Option<String>,

    /// Timeout for each source fetch, in seconds (overrides sources.toml)
    #[arg(long, env = "HTTP_TIMEOUT_SECS", value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Custom path to sources.toml configuration file
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Resolves source settings: built-in defaults, then the config file,
    /// then flags and environment variables.
    pub fn sources(&self) -> Result<SourcesConfig, AppError> {
        let file = load_sources_config(self.config.as_deref())?;
        Ok(self.apply_overrides(file))
    }

    fn apply_overrides(&self, mut sources: SourcesConfig) -> SourcesConfig {
        if let Some(url) = &self.countries_url {
            sources.countries_url = url.clone();
        }
        if let Some(url) = &self.exchange_rates_url {
            sources.exchange_rates_url = url.clone();
        }
        if let Some(secs) = self.timeout {
            sources.timeout_secs = secs;
        }
        sources
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch both sources and upsert every country
    Refresh,
    /// List stored countries
    #[command(after_help = "Examples:
  terra list --region europe
  terra list --currency eur --sort population_desc
  terra list --format jsonl > countries.jsonl")]
    List {
        /// Filter by region (case-insensitive)
        #[arg(short, long)]
        region: Option<String>,
        /// Filter by currency code (case-insensitive)
        #[arg(short = 'C', long)]
        currency: Option<String>,
        /// Sort order
        #[arg(short, long)]
        sort: Option<SortArg>,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
    /// Show one country by name (case-insensitive)
    Show {
        name: String,
        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete one country by name (case-insensitive)
    Delete { name: String },
    /// Show the refresh metadata
    Status,
    /// Apply database migrations
    Migrate,
}

/// Sort orders, spelled the way API clients send them
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    #[value(name = "gdp_asc")]
    GdpAsc,
    #[value(name = "gdp_desc")]
    GdpDesc,
    #[value(name = "population_asc")]
    PopulationAsc,
    #[value(name = "population_desc")]
    PopulationDesc,
    #[value(name = "name_asc")]
    NameAsc,
    #[value(name = "name_desc")]
    NameDesc,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::GdpAsc => SortKey::GdpAsc,
            SortArg::GdpDesc => SortKey::GdpDesc,
            SortArg::PopulationAsc => SortKey::PopulationAsc,
            SortArg::PopulationDesc => SortKey::PopulationDesc,
            SortArg::NameAsc => SortKey::NameAsc,
            SortArg::NameDesc => SortKey::NameDesc,
        }
    }
}

/// Supported output formats for `list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminals
    Table,
    /// Standard JSON array format
    Json,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
    /// CSV format (comma-separated values)
    Csv,
}
