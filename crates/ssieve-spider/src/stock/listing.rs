use super::{sql, Exchange, StockDb, Symbol};
use crate::api::{self, Row};
use crate::http::*;
use crate::sources::Sources;
use serde::Deserialize;
use std::collections::HashSet;
use tokio_postgres::types::ToSql;
use tracing::{debug, error, info, trace};

/// One company of an exchange's company list.
#[derive(Clone, Debug, PartialEq)]
pub struct Listing {
    pub symbol: String,
    pub name: String,
    pub exchange: Exchange,
    /// Last sale price, rounded to cents.
    pub last_sale: f64,
    /// Market capitalisation in `market_cap_unit`s, e.g. 1.2 (B).
    pub market_cap: Option<f64>,
    pub market_cap_unit: Option<String>,
    pub ipo_year: Option<i32>,
    pub sector: Option<String>,
    pub industry: Option<String>,
}

impl Symbol for Listing {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

impl Row for Listing {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.symbol,
            &self.name,
            exchange_param(self.exchange),
            &self.last_sale,
            &self.market_cap,
            &self.market_cap_unit,
            &self.ipo_year,
            &self.sector,
            &self.industry,
        ]
    }
}

fn exchange_param(exchange: Exchange) -> &'static (dyn ToSql + Sync) {
    match exchange {
        Exchange::Nasdaq => &"NASDAQ",
        Exchange::Nyse => &"NYSE",
    }
}

// NASDAQ.com company list columns; "Summary Quote" and the unnamed trailing column are ignored.
#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "LastSale")]
    last_sale: String,
    #[serde(rename = "MarketCap")]
    market_cap: String,
    #[serde(rename = "IPOyear", default)]
    ipo_year: String,
    #[serde(rename = "Sector", default)]
    sector: String,
    #[serde(rename = "industry", alias = "Industry", default)]
    industry: String,
}

/// Parse one exchange's company list CSV.
///
/// Rows without a numeric last sale are dropped (nothing is trading), as are rows with an
/// empty symbol. Whitespace is removed from symbols, and symbols are de-duplicated keeping the
/// first row.
pub fn parse_stock_list(text: &str, exchange: Exchange) -> crate::Result<Vec<Listing>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut listings = Vec::new();
    for record in reader.deserialize::<RawListing>() {
        let raw = record?;

        let symbol: String = raw.symbol.split_whitespace().collect();
        if symbol.is_empty() {
            continue;
        }
        let Ok(last_sale) = raw.last_sale.parse::<f64>() else {
            trace!("{symbol}: no last sale ({:?}), dropped", raw.last_sale);
            continue;
        };
        let (market_cap, market_cap_unit) = split_market_cap(&raw.market_cap);

        listings.push(Listing {
            symbol,
            name: raw.name,
            exchange,
            last_sale: (last_sale * 100.0).round() / 100.0,
            market_cap,
            market_cap_unit,
            ipo_year: raw.ipo_year.parse().ok(),
            sector: not_available(raw.sector),
            industry: not_available(raw.industry),
        });
    }

    Ok(dedup_by_symbol(listings))
}

/// `"$1.23B"` -> `(Some(1.23), Some("B"))`; `"n/a"` -> `(None, None)`.
fn split_market_cap(raw: &str) -> (Option<f64>, Option<String>) {
    let unit: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | '.' | '0'..='9'))
        .collect();
    let number: String = raw.chars().filter(|c| !matches!(c, '$' | 'M' | 'B')).collect();

    match number.parse::<f64>() {
        Ok(cap) => (Some(cap), Some(unit).filter(|unit| !unit.is_empty())),
        Err(_) => (None, None),
    }
}

fn not_available(field: String) -> Option<String> {
    match field.as_str() {
        "" | "n/a" => None,
        _ => Some(field),
    }
}

fn dedup_by_symbol(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen = HashSet::new();
    listings
        .into_iter()
        .filter(|listing| seen.insert(listing.symbol.clone()))
        .collect()
}

/// Download and parse the company list of one exchange.
pub async fn fetch_stock_list(
    http_client: &HttpClient,
    sources: &Sources,
    exchange: Exchange,
) -> crate::Result<Vec<Listing>> {
    let time = std::time::Instant::now();
    let url = sources.stock_list_url(exchange);

    trace!("fetching {exchange} company list");
    let text = super::get_text(http_client, &url).await.map_err(|err| {
        error!("failed to fetch {exchange} company list, error({err})");
        err
    })?;
    let listings = parse_stock_list(&text, exchange)?;

    debug!(
        "{exchange} company list fetched, {} companies. {}",
        listings.len(),
        crate::time_elapsed(time)
    );
    Ok(listings)
}

/// Every company currently listed on `exchanges`, in exchange order; a symbol listed on two
/// exchanges keeps its first.
pub async fn fetch_all_current(
    http_client: &HttpClient,
    sources: &Sources,
    exchanges: &[Exchange],
) -> crate::Result<Vec<Listing>> {
    let mut listings = Vec::new();
    for exchange in exchanges {
        listings.extend(fetch_stock_list(http_client, sources, *exchange).await?);
    }
    let listings = dedup_by_symbol(listings);
    info!("{} companies currently listed", listings.len());
    Ok(listings)
}

/// Create `stock.tickers` and fill it with `listings`.
///
/// Refuses with [`crate::Error::AlreadyExists`] when the table is already there; use
/// [`super::daily::update_tickers_table`] to add to an existing universe.
pub async fn create_symbols_table(db: &mut StockDb, listings: &[Listing]) -> crate::Result<u64> {
    if db.table_exists("stock.tickers").await? {
        return Err(crate::Error::AlreadyExists("table stock.tickers".to_string()));
    }
    db.client().batch_execute(sql::CREATE_TICKERS).await?;
    let inserted = api::insert_rows(db.client_mut(), sql::INSERT_TICKER, listings).await?;
    info!("stock.tickers created with {inserted} symbols");
    Ok(inserted)
}
