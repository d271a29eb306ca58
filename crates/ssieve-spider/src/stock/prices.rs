use super::{sql, Exchange, StockDb};
use crate::api::{self, Row};
use crate::http::*;
use crate::sources::Sources;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio_postgres::types::ToSql;
use tracing::{debug, error, trace, warn};

/// One trading day of a symbol.
#[derive(Clone, Debug, PartialEq)]
pub struct Price {
    pub symbol: String,
    pub dated: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// `None` when Morningstar's volume could not be read.
    pub volume: Option<i64>,
}

impl Row for Price {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.symbol,
            &self.dated,
            &self.open,
            &self.high,
            &self.low,
            &self.close,
            &self.volume,
        ]
    }
}

/// A symbol's daily prices, oldest first.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceHistory {
    pub symbol: String,
    pub prices: Vec<Price>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.prices.last().map(|price| price.dated)
    }
}

/// How a price history meets what is already stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitMode {
    /// A first, full history: refused when the symbol already has prices.
    Initial,
    /// Appending to a stored history: days already stored are skipped.
    Daily,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Open")]
    open: String,
    #[serde(rename = "High")]
    high: String,
    #[serde(rename = "Low")]
    low: String,
    #[serde(rename = "Close")]
    close: String,
    #[serde(rename = "Volume")]
    volume: String,
}

/// Parse Morningstar's price export; the first line is a title, the header is on the second.
///
/// Dates come as `%m/%d/%Y`. Volumes carry thousands separators, and an unreadable volume is
/// kept as `None` rather than failing the row. A day with an unreadable open, high, low or
/// close (blank, `--`) is dropped.
pub fn parse_price_history(text: &str, symbol: &str) -> crate::Result<PriceHistory> {
    let body = text
        .split_once('\n')
        .map(|(_, body)| body)
        .ok_or_else(|| crate::Error::malformed("price history", "no header line"))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let mut prices = Vec::new();
    for record in reader.deserialize::<RawPrice>() {
        let raw = record?;
        let dated = NaiveDate::parse_from_str(&raw.date, "%m/%d/%Y")?;
        let ohlc = [&raw.open, &raw.high, &raw.low, &raw.close].map(|cell| price_cell(cell));
        let [Some(open), Some(high), Some(low), Some(close)] = ohlc else {
            warn!("{symbol} {dated}: unreadable prices {ohlc:?}, day dropped");
            continue;
        };
        prices.push(Price {
            symbol: symbol.to_string(),
            dated,
            open,
            high,
            low,
            close,
            volume: raw.volume.replace(',', "").parse().ok(),
        });
    }
    prices.sort_by_key(|price| price.dated);

    Ok(PriceHistory {
        symbol: symbol.to_string(),
        prices,
    })
}

fn price_cell(cell: &str) -> Option<f64> {
    cell.replace(',', "").parse().ok()
}

/// Fetch the 10 year daily price history of a ticker.
///
/// `Ok(None)` when Morningstar has no history for it: an empty payload, or a header and no
/// rows (funds, suspended or very new listings).
pub async fn fetch_price_history(
    http_client: &HttpClient,
    sources: &Sources,
    symbol: &str,
    exchange: Exchange,
) -> crate::Result<Option<PriceHistory>> {
    let time = std::time::Instant::now();
    let url = sources.price_history_url(symbol, exchange);

    trace!("fetching price history of {symbol}");
    let text = super::get_text(http_client, &url).await.map_err(|err| {
        error!("failed to fetch price history of {symbol}, error({err})");
        err
    })?;
    if text.trim().is_empty() {
        debug!("no price history for {symbol}");
        return Ok(None);
    }

    let history = parse_price_history(&text, symbol).map_err(|err| {
        error!("failed to parse price history of {symbol}, error({err})");
        err
    })?;
    debug!(
        "{symbol} price history fetched, {} days. {}",
        history.len(),
        crate::time_elapsed(time)
    );
    Ok(Some(history).filter(|history| !history.is_empty()))
}

/// Keep only the prices strictly after `last`.
pub fn newer_than(history: PriceHistory, last: NaiveDate) -> PriceHistory {
    PriceHistory {
        symbol: history.symbol,
        prices: history
            .prices
            .into_iter()
            .filter(|price| price.dated > last)
            .collect(),
    }
}

/// Store a price history; returns the number of days written.
pub async fn commit_price_history(
    db: &mut StockDb,
    history: &PriceHistory,
    mode: CommitMode,
) -> crate::Result<u64> {
    if mode == CommitMode::Initial && db.price_history_exists(&history.symbol).await? {
        return Err(crate::Error::AlreadyExists(format!(
            "price history for {}",
            history.symbol
        )));
    }
    let inserted = api::insert_rows(db.client_mut(), sql::INSERT_PRICE, &history.prices).await?;
    debug!("{}: {inserted} prices committed", history.symbol);
    Ok(inserted)
}
