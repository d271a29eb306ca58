/// Base URLs of every external endpoint the spiders read from.
///
/// The defaults point at the live services; the URL templates themselves are built in the
/// modules that consume them.
#[derive(Clone, Debug)]
pub struct Sources {
    /// NASDAQ.com company list download (CSV), per exchange.
    pub stock_list: String,
    /// NASDAQ.com ticker symbol change history (HTML).
    pub symbol_changes: String,
    /// Morningstar 10 year price history export (CSV).
    pub prices: String,
    /// Morningstar 10-K/10-Q statement export (CSV).
    pub reports: String,
    /// Morningstar key ratios export (CSV).
    pub key_ratios: String,
    /// Morningstar dividend tables (HTML); the table type is appended as a path segment.
    pub dividends: String,
    /// FRED series observations (JSON).
    pub fred: String,
    /// Quandl datasets (JSON); the product code is appended as a path segment.
    pub quandl: String,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            stock_list: "https://old.nasdaq.com/screening/companies-by-name.aspx".to_string(),
            symbol_changes: "https://old.nasdaq.com/markets/stocks/symbol-change-history.aspx"
                .to_string(),
            prices: "http://performance.morningstar.com/perform/Performance/stock/exportStockPrice.action"
                .to_string(),
            reports: "http://financials.morningstar.com/ajax/ReportProcess4CSV.html".to_string(),
            key_ratios: "http://financials.morningstar.com/ajax/exportKR2CSV.html".to_string(),
            dividends: "http://performance.morningstar.com/perform/Performance/stock".to_string(),
            fred: "https://api.stlouisfed.org/fred/series/observations".to_string(),
            quandl: "https://www.quandl.com/api/v3/datasets".to_string(),
        }
    }
}

impl Sources {
    /// Point every endpoint at one host, keeping the live paths; used against mock servers.
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            stock_list: format!("{host}/screening/companies-by-name.aspx"),
            symbol_changes: format!("{host}/markets/stocks/symbol-change-history.aspx"),
            prices: format!("{host}/perform/Performance/stock/exportStockPrice.action"),
            reports: format!("{host}/ajax/ReportProcess4CSV.html"),
            key_ratios: format!("{host}/ajax/exportKR2CSV.html"),
            dividends: format!("{host}/perform/Performance/stock"),
            fred: format!("{host}/fred/series/observations"),
            quandl: format!("{host}/api/v3/datasets"),
        }
    }
}
