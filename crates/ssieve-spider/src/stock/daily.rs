use super::dividends::{self, DividendHistory};
use super::financials::{self, ReportCategory};
use super::listing::Listing;
use super::prices::{self, CommitMode, PriceHistory};
use super::{sql, StockDb, Symbol, Ticker};
use crate::api;
use crate::http::*;
use crate::sources::Sources;
use crate::tui::Progress;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Years of dividend history requested for a new symbol; more than Morningstar holds returns
/// all of it.
pub const DIVIDEND_YEARS: u32 = 10;

/// A fresh listing compared with the stored ticker universe; the three parts are disjoint.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListingDiff {
    /// Listed now and stored already, in listing order.
    pub continuing: Vec<Ticker>,
    /// Listed now but not stored, in listing order.
    pub added: Vec<Listing>,
    /// Stored but no longer listed, in stored order.
    pub removed: Vec<Ticker>,
}

/// Split the fresh listing against the stored tickers: continuing = fresh ∩ stored,
/// added = fresh \ stored, removed = stored \ fresh. Symbols are compared alone; a continuing
/// ticker takes its exchange from the fresh listing.
pub fn compare_listings(stored: &[Ticker], fresh: &[Listing]) -> ListingDiff {
    let stored_symbols: HashSet<&str> = stored.iter().map(|t| t.symbol.as_str()).collect();
    let fresh_symbols: HashSet<&str> = fresh.iter().map(|l| l.symbol.as_str()).collect();

    let mut diff = ListingDiff::default();
    for listing in fresh {
        if stored_symbols.contains(listing.symbol.as_str()) {
            diff.continuing.push(listing.ticker());
        } else {
            diff.added.push(listing.clone());
        }
    }
    diff.removed = stored
        .iter()
        .filter(|ticker| !fresh_symbols.contains(ticker.symbol.as_str()))
        .cloned()
        .collect();
    diff
}

/// What adding listings to `stock.tickers` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickerUpdate {
    Added { added: usize, ignored: usize },
    NothingToAdd,
}

impl fmt::Display for TickerUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added { added, ignored: 0 } => write!(f, "Added {added} records."),
            Self::Added { added, ignored } => {
                write!(f, "Added {added} records and ignored {ignored} records.")
            }
            Self::NothingToAdd => f.write_str("No new records to add."),
        }
    }
}

/// Add the listings not yet in `stock.tickers`; listings already stored are ignored.
pub async fn update_tickers_table(db: &mut StockDb, new: &[Listing]) -> crate::Result<TickerUpdate> {
    let stored: HashSet<String> = db.tickers().await?.into_iter().map(|t| t.symbol).collect();
    let (ignored, to_add): (Vec<&Listing>, Vec<&Listing>) =
        new.iter().partition(|listing| stored.contains(&listing.symbol));
    if to_add.is_empty() {
        return Ok(TickerUpdate::NothingToAdd);
    }

    let to_add: Vec<Listing> = to_add.into_iter().cloned().collect();
    api::insert_rows(db.client_mut(), sql::INSERT_TICKER, &to_add).await?;
    let update = TickerUpdate::Added {
        added: to_add.len(),
        ignored: ignored.len(),
    };
    info!("stock.tickers: {update}");
    Ok(update)
}

/// The prices a stored symbol is missing.
#[derive(Clone, Debug, PartialEq)]
pub enum RefreshOutcome {
    /// The symbol has no stored price history to append to.
    NotTracked,
    /// Morningstar has no prices for the symbol.
    NoHistory,
    /// Nothing newer than the last stored day.
    UpToDate,
    /// The days after the last stored day.
    Fresh(PriceHistory),
}

/// Fetch the price history of a tracked ticker and keep the days after its last stored day.
pub async fn recent_price_info(
    db: &StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &Ticker,
) -> crate::Result<RefreshOutcome> {
    let Some(last) = db.last_price_date(&ticker.symbol).await? else {
        return Ok(RefreshOutcome::NotTracked);
    };

    let Some(history) =
        prices::fetch_price_history(http_client, sources, &ticker.symbol, ticker.exchange).await?
    else {
        return Ok(RefreshOutcome::NoHistory);
    };

    let fresh = prices::newer_than(history, last);
    Ok(match fresh.is_empty() {
        true => RefreshOutcome::UpToDate,
        false => RefreshOutcome::Fresh(fresh),
    })
}

/// Random pause between network calls, drawn from `[min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Throttle {
    pub min: Duration,
    pub max: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(4),
            max: Duration::from_secs(10),
        }
    }
}

impl Throttle {
    pub fn new(min: Duration, max: Duration) -> crate::Result<Self> {
        if min > max {
            return Err(crate::Error::InvalidArgument(format!(
                "throttle minimum {min:?} is above its maximum {max:?}"
            )));
        }
        Ok(Self { min, max })
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self {
            min: Duration::ZERO,
            max: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        if self.min >= self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..self.max)
    }

    pub async fn pause(&self) {
        let delay = self.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y:%B:%d:%I:%M:%S").to_string()
}

/// Append the missing days to every ticker's stored price history, one ticker at a time with
/// a throttle pause before each.
///
/// A failing ticker is logged and reported, and the loop moves on. Returns one report line
/// per ticker, between a start & end time line.
pub async fn refresh_prices(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    tickers: &[Ticker],
    throttle: &Throttle,
    progress: &Progress,
) -> Vec<String> {
    let time = std::time::Instant::now();
    let mut report = Vec::with_capacity(tickers.len() + 2);
    report.push(format!("Start time: {}", timestamp()));

    for ticker in tickers {
        throttle.pause().await;
        debug!("getting recent price history for {ticker}");

        let (ok, msg) = match refresh_one(db, http_client, sources, ticker).await {
            Ok(done) => done,
            Err(err) => {
                warn!("failed to refresh {ticker}, error({err})");
                (false, format!("Failed to refresh {}: {err}", ticker.symbol))
            }
        };
        progress.record(ok);
        report.push(msg);
    }

    report.push(format!("End time: {}", timestamp()));
    debug!(
        "refreshed {} tickers. {}",
        tickers.len(),
        crate::time_elapsed(time)
    );
    report
}

// commit the missing days of one ticker; reports whether it counts as a success
async fn refresh_one(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &Ticker,
) -> crate::Result<(bool, String)> {
    let symbol = &ticker.symbol;
    Ok(match recent_price_info(db, http_client, sources, ticker).await? {
        RefreshOutcome::Fresh(history) => {
            let n = prices::commit_price_history(db, &history, CommitMode::Daily).await?;
            (true, format!("Committed {n} new prices for {symbol}"))
        }
        RefreshOutcome::UpToDate => (
            true,
            format!("You already have the latest pricing info for {symbol}"),
        ),
        RefreshOutcome::NoHistory => (false, format!("No price history available for {symbol}")),
        RefreshOutcome::NotTracked => (
            false,
            format!("{symbol} is not in the price history table yet"),
        ),
    })
}

/// Fetch & store everything about new tickers: their full price history, their dividends,
/// and all six statements. One throttle pause precedes each ticker.
///
/// Each part is stored independently; a part that fails, or is already stored, is reported
/// and the rest still go ahead.
pub async fn populate_symbols(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    tickers: &[Ticker],
    throttle: &Throttle,
    progress: &Progress,
) -> Vec<String> {
    let time = std::time::Instant::now();
    let mut report = Vec::with_capacity(tickers.len() * 8 + 2);
    report.push(format!("Start time: {}", timestamp()));

    for ticker in tickers {
        throttle.pause().await;
        info!("populating {ticker}");

        let mut ok = true;
        let mut note = |part: &str, outcome: crate::Result<Option<u64>>| {
            let msg = match outcome {
                Ok(Some(n)) => format!("{}: committed {n} {part} rows", ticker.symbol),
                Ok(None) => format!("{}: no {part} available", ticker.symbol),
                Err(err) => {
                    error!("{ticker}: {part} failed, error({err})");
                    ok = false;
                    format!("{}: {part} failed: {err}", ticker.symbol)
                }
            };
            report.push(msg);
        };

        let outcome = populate_prices(db, http_client, sources, ticker).await;
        note("price history", outcome);

        let outcome = populate_dividends(db, http_client, sources, ticker).await;
        note("dividend", outcome);

        for category in ReportCategory::ALL {
            let outcome = populate_report(db, http_client, sources, ticker, category).await;
            note(&category.to_string(), outcome);
        }

        progress.record(ok);
    }

    report.push(format!("End time: {}", timestamp()));
    debug!(
        "populated {} tickers. {}",
        tickers.len(),
        crate::time_elapsed(time)
    );
    report
}

async fn populate_prices(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &Ticker,
) -> crate::Result<Option<u64>> {
    let history: Option<PriceHistory> =
        prices::fetch_price_history(http_client, sources, &ticker.symbol, ticker.exchange).await?;
    match history {
        Some(history) => Ok(Some(
            prices::commit_price_history(db, &history, CommitMode::Initial).await?,
        )),
        None => Ok(None),
    }
}

async fn populate_dividends(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &Ticker,
) -> crate::Result<Option<u64>> {
    let history: Option<DividendHistory> =
        dividends::fetch_dividend_history(http_client, sources, ticker, DIVIDEND_YEARS).await?;
    match history {
        Some(history) => Ok(Some(dividends::commit_dividends(db, &history).await?)),
        None => Ok(None),
    }
}

async fn populate_report(
    db: &mut StockDb,
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &Ticker,
    category: ReportCategory,
) -> crate::Result<Option<u64>> {
    match financials::fetch_report(http_client, sources, ticker, category).await? {
        Some(report) => Ok(Some(financials::commit_report(db, &report).await?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::Exchange;

    fn listing(symbol: &str, exchange: Exchange) -> Listing {
        Listing {
            symbol: symbol.to_string(),
            name: format!("{symbol} Inc."),
            exchange,
            last_sale: 1.0,
            market_cap: None,
            market_cap_unit: None,
            ipo_year: None,
            sector: None,
            industry: None,
        }
    }

    fn symbols<'a, I: IntoIterator<Item = &'a str>>(iter: I) -> Vec<&'a str> {
        iter.into_iter().collect()
    }

    #[test]
    fn diff_splits_three_ways() {
        let stored = [
            Ticker::new("A", Exchange::Nasdaq),
            Ticker::new("B", Exchange::Nasdaq),
            Ticker::new("C", Exchange::Nyse),
        ];
        let fresh = [
            listing("B", Exchange::Nasdaq),
            listing("C", Exchange::Nyse),
            listing("D", Exchange::Nyse),
        ];
        let diff = compare_listings(&stored, &fresh);

        assert_eq!(symbols(diff.continuing.iter().map(|t| t.symbol.as_str())), ["B", "C"]);
        assert_eq!(symbols(diff.added.iter().map(|l| l.symbol.as_str())), ["D"]);
        assert_eq!(symbols(diff.removed.iter().map(|t| t.symbol.as_str())), ["A"]);
    }

    #[test]
    fn diff_parts_are_disjoint_and_cover_both_sides() {
        let stored: Vec<Ticker> = ["A", "C", "E", "G", "H"]
            .iter()
            .map(|s| Ticker::new(*s, Exchange::Nasdaq))
            .collect();
        let fresh: Vec<Listing> = ["B", "C", "D", "E", "F", "H"]
            .iter()
            .map(|s| listing(s, Exchange::Nyse))
            .collect();
        let diff = compare_listings(&stored, &fresh);

        let continuing: HashSet<_> = diff.continuing.iter().map(|t| t.symbol.as_str()).collect();
        let added: HashSet<_> = diff.added.iter().map(|l| l.symbol.as_str()).collect();
        let removed: HashSet<_> = diff.removed.iter().map(|t| t.symbol.as_str()).collect();

        assert!(continuing.is_disjoint(&added));
        assert!(continuing.is_disjoint(&removed));
        assert!(added.is_disjoint(&removed));
        assert_eq!(continuing.len() + added.len(), fresh.len());
        assert_eq!(continuing.len() + removed.len(), stored.len());

        // the fresh listing decides the exchange
        assert!(diff.continuing.iter().all(|t| t.exchange == Exchange::Nyse));
    }

    #[test]
    fn diff_of_empty_store_adds_everything() {
        let fresh = [listing("A", Exchange::Nasdaq)];
        let diff = compare_listings(&[], &fresh);
        assert!(diff.continuing.is_empty());
        assert_eq!(diff.added, fresh);
        assert!(diff.removed.is_empty());
    }

    #[test]
    fn ticker_update_messages() {
        let both = TickerUpdate::Added { added: 3, ignored: 2 };
        assert_eq!(both.to_string(), "Added 3 records and ignored 2 records.");
        let only = TickerUpdate::Added { added: 3, ignored: 0 };
        assert_eq!(only.to_string(), "Added 3 records.");
        assert_eq!(TickerUpdate::NothingToAdd.to_string(), "No new records to add.");
    }

    #[test]
    fn throttle_stays_in_bounds() {
        let throttle = Throttle::default();
        for _ in 0..200 {
            let delay = throttle.delay();
            assert!(delay >= Duration::from_secs(4) && delay < Duration::from_secs(10));
        }

        let fixed = Throttle::new(Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        assert_eq!(fixed.delay(), Duration::from_secs(1));
        assert_eq!(Throttle::none().delay(), Duration::ZERO);

        assert!(Throttle::new(Duration::from_secs(5), Duration::from_secs(1)).is_err());
    }
}
