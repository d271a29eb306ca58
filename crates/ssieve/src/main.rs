mod cli;
mod daily;
mod init;
mod movement;
mod parcels;

// remote imports
use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, DelayArgs, TraceLevel};
use dotenv::var;
use ssieve_spider::stock::daily::Throttle;
use std::path::Path;
use std::time::Duration;
use tracing::{subscriber, trace, Level};
use tracing_subscriber::FmtSubscriber;

////////////////////////////////////////////////////////////////////////////

// preproccess the trace level
fn preprocess(trace_level: Level) -> anyhow::Result<()> {
    let my_subscriber = FmtSubscriber::builder()
        .with_max_level(trace_level)
        .finish();
    subscriber::set_global_default(my_subscriber).context("failed to set the tracing subscriber")?;
    Ok(())
}

/// `SSIEVE_URL` joined with the database `name`; the name must be a plain identifier.
pub(crate) fn database_url(name: &str) -> anyhow::Result<String> {
    let plain = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !plain {
        bail!("{name:?} is not a plain database name; use letters, digits, '_' or '-'");
    }
    let server = var("SSIEVE_URL").context("environment variable SSIEVE_URL is not set")?;
    Ok(format!("{}/{name}", server.trim_end_matches('/')))
}

pub(crate) fn check_directory(directory: &Path) -> anyhow::Result<()> {
    if !directory.is_dir() {
        bail!(
            "{} is not a directory; check the path and try again",
            directory.display()
        );
    }
    Ok(())
}

impl DelayArgs {
    pub(crate) fn throttle(&self) -> anyhow::Result<Throttle> {
        Ok(Throttle::new(
            Duration::from_secs(self.min_delay),
            Duration::from_secs(self.max_delay),
        )?)
    }
}

////////////////////////////////////////////////////////////////////////////

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // set the trace level
    if let Some(trace_level) = cli.trace {
        preprocess(match trace_level {
            TraceLevel::DEBUG => Level::DEBUG,
            TraceLevel::ERROR => Level::ERROR,
            TraceLevel::INFO => Level::INFO,
            TraceLevel::TRACE => Level::TRACE,
            TraceLevel::WARN => Level::WARN,
        })?;
    }
    trace!("command line input recorded: {cli:?}");

    // if no trace level provided, use tui
    let tui = cli.trace.is_none();

    // read cli inputs
    use cli::Commands::*;
    match cli.command {
        // `ssieve init <DIRECTORY> <NAME> [--populate]`
        Init {
            directory,
            name,
            populate,
            delay,
        } => init::run(&directory, &name, populate, delay.throttle()?, tui).await?,

        // `ssieve daily <DIRECTORY> <NAME>`
        Daily {
            directory,
            name,
            delay,
        } => daily::run(&directory, &name, delay.throttle()?, tui).await?,

        // `ssieve movement <PRODUCT> --source <fred|quandl>`
        Movement { product, source } => movement::run(&product, source).await?,

        // `ssieve parcels <PARCELS> <FEATURES> --name-col <C> --address-col <C>`
        Parcels {
            parcels,
            features,
            batch,
            name_col,
            address_col,
        } => parcels::run(&parcels, &features, batch, &name_col, &address_col).await?,
    }

    Ok(())
}
