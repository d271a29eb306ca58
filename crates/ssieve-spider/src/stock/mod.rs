mod html;
mod sql;
mod urls;

/// The database access layer: one connection, existence predicates, and the fixed schema.
pub mod db;

/// NASDAQ & NYSE company lists; the ticker universe.
pub mod listing;

/// 10 year daily price histories, from Morningstar.
pub mod prices;

/// Cash dividend histories (past & upcoming), from Morningstar.
pub mod dividends;

/// 10-K & 10-Q income, balance and cashflow statements, from Morningstar.
pub mod financials;

/// Ticker symbol changes, from NASDAQ.com.
pub mod changes;

/// The daily update: diff the ticker universe, refresh prices symbol by symbol.
pub mod daily;

pub use db::StockDb;

use std::fmt;
use std::str::FromStr;

/// The exchanges the ticker universe is drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exchange {
    Nasdaq,
    Nyse,
}

impl Exchange {
    pub const ALL: [Exchange; 2] = [Exchange::Nasdaq, Exchange::Nyse];

    /// Morningstar's exchange prefix for a ticker, e.g. `XNAS:AAPL`.
    pub fn morningstar_prefix(&self) -> &'static str {
        match self {
            Self::Nasdaq => "XNAS:",
            Self::Nyse => "XNYS:",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nasdaq => f.write_str("NASDAQ"),
            Self::Nyse => f.write_str("NYSE"),
        }
    }
}

impl FromStr for Exchange {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NASDAQ" => Ok(Self::Nasdaq),
            "NYSE" => Ok(Self::Nyse),
            _ => Err(crate::Error::InvalidArgument(format!(
                "unknown exchange {s:?}; expected NASDAQ or NYSE"
            ))),
        }
    }
}

/// A member of the ticker universe: a symbol and the exchange it trades on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ticker {
    pub symbol: String,
    pub exchange: Exchange,
}

impl Ticker {
    pub fn new(symbol: impl Into<String>, exchange: Exchange) -> Self {
        Self {
            symbol: symbol.into(),
            exchange,
        }
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.symbol, self.exchange)
    }
}

/// Anything keyed by a ticker symbol.
pub trait Symbol {
    fn symbol(&self) -> &str;
    fn exchange(&self) -> Exchange;

    fn ticker(&self) -> Ticker {
        Ticker::new(self.symbol(), self.exchange())
    }
}

impl Symbol for Ticker {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn exchange(&self) -> Exchange {
        self.exchange
    }
}

/// GET `url` and read the body as text; a non-2xx status is an error.
pub(crate) async fn get_text(http_client: &crate::http::HttpClient, url: &str) -> crate::Result<String> {
    tracing::trace!("GET {url}");
    let text = http_client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_round_trips_through_text() {
        for exchange in Exchange::ALL {
            assert_eq!(exchange.to_string().parse::<Exchange>().unwrap(), exchange);
        }
        assert_eq!(" nyse ".parse::<Exchange>().unwrap(), Exchange::Nyse);
        assert!("LSE".parse::<Exchange>().is_err());
    }
}
