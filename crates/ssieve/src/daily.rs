use colored::Colorize;
use ssieve_spider::fs::{results_path, ResultsLog, RunKind};
use ssieve_spider::sources::Sources;
use ssieve_spider::stock::daily::{self, Throttle, TickerUpdate};
use ssieve_spider::stock::{changes, listing, Exchange, StockDb, Symbol, Ticker};
use ssieve_spider::tui::Progress;
use std::path::Path;
use tracing::{error, info, warn};

/// Bring the database `name` up to date with the exchanges. Results are logged under
/// `<directory>/output/daily`.
///
/// 1. connect, and check the database has been initialised
/// 2. fetch the current NASDAQ & NYSE listings
/// 3. apply ticker symbol changes
/// 4. append recent prices of every symbol still listed
/// 5. add newly listed symbols to `stock.tickers`
/// 6. fetch the history of the new symbols
/// 7. log results & close
pub(crate) async fn run(directory: &Path, name: &str, throttle: Throttle, tui: bool) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    crate::check_directory(directory)?;
    let url = crate::database_url(name)?;
    let started = chrono::Local::now();
    let mut log = ResultsLog::new();

    // 1.
    let (mut db, _) = StockDb::connect(&url).await?;
    db.require_table("stock.tickers").await.map_err(|err| {
        error!("{name} has not been initialised, error({err})");
        err
    })?;
    log.line(format!("existing db ready: {name}"));

    // 2.
    let http_client = ssieve_spider::std_client_build()?;
    let sources = Sources::default();
    let listings = listing::fetch_all_current(&http_client, &sources, &Exchange::ALL).await?;

    // 3.
    match changes::fetch_symbol_changes(&http_client, &sources).await {
        Ok(symbol_changes) => match changes::rename_symbols(&mut db, &symbol_changes).await {
            Ok(outcome) => log.section(outcome.messages()),
            Err(err) => {
                warn!("symbol renames rolled back, error({err})");
                log.line(format!("Symbol changes failed: {err}"));
            }
        },
        Err(err) => {
            warn!("symbol changes skipped, error({err})");
            log.line(format!("Symbol changes skipped: {err}"));
        }
    }

    // 4.
    let stored = db.tickers().await?;
    let diff = daily::compare_listings(&stored, &listings);
    info!(
        "{} continuing, {} new, {} delisted symbols",
        diff.continuing.len(),
        diff.added.len(),
        diff.removed.len()
    );
    let progress = Progress::new(diff.continuing.len(), "updating prices", tui)?;
    let report = daily::refresh_prices(
        &mut db,
        &http_client,
        &sources,
        &diff.continuing,
        &throttle,
        &progress,
    )
    .await;
    progress.finish();
    log.section(report);

    // 5.
    let update = daily::update_tickers_table(&mut db, &diff.added).await?;
    log.line(update.to_string());

    // 6.
    if let TickerUpdate::Added { .. } = update {
        let new: Vec<Ticker> = diff.added.iter().map(Symbol::ticker).collect();
        let progress = Progress::new(new.len(), "populating new symbols", tui)?;
        let report =
            daily::populate_symbols(&mut db, &http_client, &sources, &new, &throttle, &progress).await;
        progress.finish();
        log.section(report);
    }
    if !diff.removed.is_empty() {
        log.section(
            diff.removed
                .iter()
                .map(|ticker| format!("{ticker} is no longer listed")),
        );
    }

    // 7.
    let path = results_path(directory, RunKind::Daily, started.date_naive());
    log.write(&path).await?;
    db.close().await?;

    info!("daily update of {name} finished, time elapsed: {:?}", time.elapsed());
    if tui {
        println!(
            "{} Check the results at {}",
            "Finished daily updates.".green().bold(),
            path.display()
        );
    }
    Ok(())
}
