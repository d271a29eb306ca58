use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Sets the level of tracing.
    ///
    /// Without a level, progress is shown as progress bars instead.
    #[arg(short, long, global = true)]
    pub trace: Option<TraceLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a stock database from the current NASDAQ & NYSE listings.
    Init {
        /// Working directory; results logs are written under `<DIRECTORY>/output`.
        directory: PathBuf,

        /// Name of the database on the `SSIEVE_URL` server.
        name: String,

        /// Also fetch prices, dividends & statements for every listed symbol.
        #[arg(short, long)]
        populate: bool,

        #[command(flatten)]
        delay: DelayArgs,
    },

    /// Update an initialised stock database: symbol changes, new listings, recent prices.
    Daily {
        /// Working directory; results logs are written under `<DIRECTORY>/output`.
        directory: PathBuf,

        /// Name of the database on the `SSIEVE_URL` server.
        name: String,

        #[command(flatten)]
        delay: DelayArgs,
    },

    /// Print the most recent yearly movement of an economic indicator.
    Movement {
        /// Series id (FRED), or dataset code (Quandl), e.g. `FMAC/HPI`.
        product: String,

        /// Where the indicator is published.
        #[arg(short, long, value_enum)]
        source: IndicatorSource,
    },

    /// Count the features (e.g. roads) touching each parcel.
    Parcels {
        /// GeoJSON FeatureCollection of parcels, each with a `parcel` id property.
        parcels: PathBuf,

        /// GeoJSON FeatureCollection of features to join against.
        features: PathBuf,

        /// Parcels joined per batch.
        #[arg(short, long, default_value_t = 1000)]
        batch: usize,

        /// Feature property holding the name(s) to count; `;` separates several names.
        #[arg(long)]
        name_col: String,

        /// Feature property that makes a match distinct.
        #[arg(long)]
        address_col: String,
    },
}

/// Random pause between symbols, in seconds.
#[derive(Args, Debug, Clone, Copy)]
pub struct DelayArgs {
    /// Shortest pause.
    #[arg(long, default_value_t = 4)]
    pub min_delay: u64,

    /// Longest pause (exclusive).
    #[arg(long, default_value_t = 10)]
    pub max_delay: u64,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
#[clap(rename_all = "UPPERCASE")]
pub enum TraceLevel {
    DEBUG,
    ERROR,
    INFO,
    TRACE,
    WARN,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum IndicatorSource {
    /// Federal Reserve Economic Data; requires `FRED_API`.
    Fred,

    /// Quandl datasets; `QUANDL_API` is optional.
    Quandl,
}
