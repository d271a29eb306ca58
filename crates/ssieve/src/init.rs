use colored::Colorize;
use ssieve_spider::fs::{results_path, ResultsLog, RunKind};
use ssieve_spider::sources::Sources;
use ssieve_spider::stock::daily::{self, Throttle};
use ssieve_spider::stock::db::{DbState, StockDb};
use ssieve_spider::stock::{listing, Exchange, Symbol, Ticker};
use ssieve_spider::tui::Progress;
use std::path::Path;
use tracing::{error, info};

/// Initialise the database `name`: schema, ticker universe and, with `populate`, every
/// symbol's history. Results are logged under `<directory>/output/initialize`.
pub(crate) async fn run(
    directory: &Path,
    name: &str,
    populate: bool,
    throttle: Throttle,
    tui: bool,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    crate::check_directory(directory)?;
    let url = crate::database_url(name)?;

    let started = chrono::Local::now();
    if tui {
        println!(
            "\n{} {}\n",
            "Stock data collection started:".bold(),
            started.format("%I:%M:%S")
        );
    }
    let mut log = ResultsLog::new();
    log.line(format!("Start time: {}", started.format("%Y:%B:%d:%I:%M:%S")));

    // 1. connect
    let (mut db, state) = StockDb::connect(&url).await?;
    log.line(match state {
        DbState::New => format!("new db started: {name}"),
        DbState::Existing => format!("existing db ready: {name}"),
    });

    // 2. current listings
    let http_client = ssieve_spider::std_client_build()?;
    let sources = Sources::default();
    let listings = listing::fetch_all_current(&http_client, &sources, &Exchange::ALL).await?;
    log.line(format!("{} symbols currently listed", listings.len()));

    // 3. schema & the ticker universe
    db.create_schema().await?;
    let created = listing::create_symbols_table(&mut db, &listings)
        .await
        .map_err(|err| {
            error!("failed to create the symbols table, error({err})");
            err
        })?;
    log.line(format!("Created stock.tickers with {created} symbols"));

    // 4. every symbol's history
    if populate {
        let tickers: Vec<Ticker> = listings.iter().map(Symbol::ticker).collect();
        let progress = Progress::new(tickers.len(), "populating symbols", tui)?;
        let report =
            daily::populate_symbols(&mut db, &http_client, &sources, &tickers, &throttle, &progress)
                .await;
        progress.finish();
        log.section(report);
    }

    // 5. log & close
    let path = results_path(directory, RunKind::Initialize, started.date_naive());
    log.line(format!(
        "End time: {}",
        chrono::Local::now().format("%Y:%B:%d:%I:%M:%S")
    ));
    log.write(&path).await?;
    db.close().await?;

    info!("initialised {name}, time elapsed: {:?}", time.elapsed());
    if tui {
        println!(
            "{} {}",
            "Completed initialization:".green().bold(),
            chrono::Local::now().format("%I:%M:%S")
        );
        println!("\nWrote results to: {}\n", path.display());
    }
    Ok(())
}
