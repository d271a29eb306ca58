use super::html::{self, Table};
use super::urls::DividendTable;
use super::{sql, StockDb, Symbol};
use crate::api::{self, Row};
use crate::http::*;
use crate::sources::Sources;
use chrono::NaiveDate;
use tokio_postgres::types::ToSql;
use tracing::{debug, error, trace};

/// Currency of an amount without a currency prefix.
pub const DEFAULT_CURRENCY: &str = "USD";

/// One cash dividend, past or upcoming.
#[derive(Clone, Debug, PartialEq)]
pub struct Dividend {
    pub symbol: String,
    pub ex_dividend: NaiveDate,
    pub declared: Option<NaiveDate>,
    pub record: Option<NaiveDate>,
    pub payable: Option<NaiveDate>,
    pub dividend_type: String,
    /// `None` for amounts that are not a plain number, e.g. a split ratio.
    pub amount: Option<f64>,
    pub currency: String,
}

impl Row for Dividend {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![
            &self.symbol,
            &self.ex_dividend,
            &self.declared,
            &self.record,
            &self.payable,
            &self.dividend_type,
            &self.amount,
            &self.currency,
        ]
    }
}

/// A symbol's dividends: the past table, then any upcoming ones.
#[derive(Clone, Debug, PartialEq)]
pub struct DividendHistory {
    pub symbol: String,
    pub dividends: Vec<Dividend>,
}

// column positions of a Morningstar dividend table
struct Columns {
    ex_dividend: usize,
    declared: usize,
    record: usize,
    payable: usize,
    dividend_type: usize,
    amount: usize,
}

impl Columns {
    fn find(table: &Table) -> crate::Result<Self> {
        let column = |name: &str| {
            table.column(name).ok_or_else(|| {
                crate::Error::malformed("dividend table", format!("no {name:?} column"))
            })
        };
        Ok(Self {
            ex_dividend: column("Ex-Dividend")?,
            declared: column("Declaration")?,
            record: column("Record")?,
            payable: column("Payable")?,
            dividend_type: column("Type")?,
            amount: column("Amount")?,
        })
    }
}

/// Parse one Morningstar dividend table (past or upcoming).
///
/// `Ok(None)` when the page holds no table, or a table with no dividend rows.
pub fn parse_dividend_table(html: &str, symbol: &str) -> crate::Result<Option<Vec<Dividend>>> {
    let Some(table) = html::tables(html).into_iter().next() else {
        return Ok(None);
    };
    if table.rows.iter().all(|row| row.len() < table.header.len()) {
        return Ok(None);
    }
    let cols = Columns::find(&table)?;

    let mut dividends = Vec::new();
    // "no dividend" notices span the whole table in one cell
    for row in table.rows.iter().filter(|row| row.len() >= table.header.len()) {
        let ex_dividend = parse_date(&row[cols.ex_dividend])?.ok_or_else(|| {
            crate::Error::malformed("dividend table", format!("{symbol}: no ex-dividend date"))
        })?;
        let (amount, currency) = split_amount(&row[cols.amount]);
        dividends.push(Dividend {
            symbol: symbol.to_string(),
            ex_dividend,
            declared: parse_date(&row[cols.declared])?,
            record: parse_date(&row[cols.record])?,
            payable: parse_date(&row[cols.payable])?,
            dividend_type: row[cols.dividend_type].clone(),
            amount,
            currency,
        });
    }
    Ok(Some(dividends))
}

// Morningstar marks a missing date with an em dash
fn parse_date(cell: &str) -> crate::Result<Option<NaiveDate>> {
    if !cell.starts_with(|c: char| c.is_ascii_digit()) {
        return Ok(None);
    }
    Ok(Some(NaiveDate::parse_from_str(cell, "%m/%d/%Y")?))
}

/// `"$0.7300"` -> `(Some(0.73), "USD")`; `"CAD 0.2500"` -> `(Some(0.25), "CAD")`.
fn split_amount(cell: &str) -> (Option<f64>, String) {
    let currency: String = cell.chars().take_while(char::is_ascii_uppercase).collect();
    let amount: String = cell[currency.len()..]
        .chars()
        .filter(|c| *c != '$' && !c.is_whitespace())
        .collect();
    let currency = if currency.is_empty() {
        DEFAULT_CURRENCY.to_string()
    } else {
        currency
    };
    (amount.parse().ok(), currency)
}

/// Fetch the past & upcoming dividends of a ticker, covering `years` years.
///
/// `Ok(None)` when the ticker has no dividend history; upcoming dividends alone do not make
/// a history.
pub async fn fetch_dividend_history<S: Symbol>(
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &S,
    years: u32,
) -> crate::Result<Option<DividendHistory>> {
    let time = std::time::Instant::now();
    let symbol = ticker.symbol();

    let mut tables = Vec::with_capacity(2);
    for table in [DividendTable::History, DividendTable::Upcoming] {
        trace!("fetching {table:?} dividends of {symbol}");
        let url = sources.dividend_url(table, symbol, ticker.exchange(), years);
        let text = super::get_text(http_client, &url).await.map_err(|err| {
            error!("failed to fetch dividends of {symbol}, error({err})");
            err
        })?;
        tables.push(parse_dividend_table(&text, symbol)?);
    }

    let mut tables = tables.into_iter();
    let Some(Some(mut dividends)) = tables.next() else {
        debug!("no dividend history for {symbol}");
        return Ok(None);
    };
    if let Some(Some(upcoming)) = tables.next() {
        dividends.extend(upcoming);
    }

    debug!(
        "{symbol} dividends fetched, {} dividends. {}",
        dividends.len(),
        crate::time_elapsed(time)
    );
    Ok(Some(DividendHistory {
        symbol: symbol.to_string(),
        dividends,
    }))
}

/// Store a dividend history; refused when the symbol already has dividends.
pub async fn commit_dividends(db: &mut StockDb, history: &DividendHistory) -> crate::Result<u64> {
    if db.dividend_history_exists(&history.symbol).await? {
        return Err(crate::Error::AlreadyExists(format!(
            "dividend history for {}",
            history.symbol
        )));
    }
    let inserted =
        api::insert_rows(db.client_mut(), sql::INSERT_DIVIDEND, &history.dividends).await?;
    debug!("{}: {inserted} dividends committed", history.symbol);
    Ok(inserted)
}
