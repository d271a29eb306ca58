use super::financials::ReportCategory;
use super::Exchange;
use crate::sources::Sources;

/// Which of the two Morningstar dividend tables to request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DividendTable {
    Upcoming,
    History,
}

impl DividendTable {
    fn action(&self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming-dividends",
            Self::History => "dividend-history",
        }
    }
}

impl Sources {
    /// NASDAQ.com company list download, as CSV.
    pub fn stock_list_url(&self, exchange: Exchange) -> String {
        let exchange = match exchange {
            Exchange::Nasdaq => "nasdaq",
            Exchange::Nyse => "nyse",
        };
        format!(
            "{base}?letter=0&exchange={exchange}&render=download",
            base = self.stock_list
        )
    }

    /// Morningstar's 10 year daily price history of one ticker, as CSV.
    pub fn price_history_url(&self, symbol: &str, exchange: Exchange) -> String {
        format!(
            "{base}?t={prefix}{symbol}&pd=10y&freq=d&sd=&ed=&pg=0&culture=en-US&cur=USD",
            base = self.prices,
            prefix = exchange.morningstar_prefix(),
        )
    }

    /// Morningstar's 5 year (or 5 quarter) statement of one ticker, as CSV.
    pub fn report_url(&self, symbol: &str, exchange: Exchange, category: ReportCategory) -> String {
        format!(
            "{base}?&t={prefix}{symbol}&region=usa&culture=en-US&cur=&reportType={report}\
            &period={period}&dataType=A&order=asc&columnYear=5&curYearPart=1st5year&rounding=3\
            &view=raw&denominatorView=raw&number=3",
            base = self.reports,
            prefix = exchange.morningstar_prefix(),
            report = category.statement.code(),
            period = category.period.months(),
        )
    }

    /// Morningstar's 10 year key ratios of one ticker, as CSV.
    pub fn key_ratios_url(&self, symbol: &str, exchange: Exchange) -> String {
        format!(
            "{base}?&callback=?&t={prefix}{symbol}&region=usa&culture=en-US&cur=&order=asc",
            base = self.key_ratios,
            prefix = exchange.morningstar_prefix(),
        )
    }

    /// One of Morningstar's dividend tables of one ticker, covering `years` years, as HTML.
    pub(crate) fn dividend_url(
        &self,
        table: DividendTable,
        symbol: &str,
        exchange: Exchange,
        years: u32,
    ) -> String {
        format!(
            "{base}/{action}.action?&t={prefix}{symbol}&region=usa&culture=en-US&ops=clear&y={years}",
            base = self.dividends,
            action = table.action(),
            prefix = exchange.morningstar_prefix(),
        )
    }

    /// NASDAQ.com ticker symbol change history, as HTML.
    pub fn symbol_changes_url(&self) -> String {
        self.symbol_changes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock::financials::{Period, Statement};

    #[test]
    fn builds_live_urls() {
        let sources = Sources::default();

        assert_eq!(
            sources.stock_list_url(Exchange::Nyse),
            "https://old.nasdaq.com/screening/companies-by-name.aspx?letter=0&exchange=nyse&render=download"
        );
        assert_eq!(
            sources.price_history_url("MMM", Exchange::Nyse),
            "http://performance.morningstar.com/perform/Performance/stock/exportStockPrice.action\
            ?t=XNYS:MMM&pd=10y&freq=d&sd=&ed=&pg=0&culture=en-US&cur=USD"
        );
        assert_eq!(
            sources.dividend_url(DividendTable::History, "DUK", Exchange::Nyse, 10),
            "http://performance.morningstar.com/perform/Performance/stock/dividend-history.action\
            ?&t=XNYS:DUK&region=usa&culture=en-US&ops=clear&y=10"
        );
    }

    #[test]
    fn report_url_carries_category() {
        let sources = Sources::default();
        let category = ReportCategory::new(Statement::Balance, Period::Quarterly);
        let url = sources.report_url("ANDA", Exchange::Nasdaq, category);
        assert!(url.starts_with("http://financials.morningstar.com/ajax/ReportProcess4CSV.html?&t=XNAS:ANDA"));
        assert!(url.contains("&reportType=bs&period=3&"));
        assert!(url.ends_with("&number=3"));

        assert_eq!(
            sources.key_ratios_url("GPRO", Exchange::Nasdaq),
            "http://financials.morningstar.com/ajax/exportKR2CSV.html\
            ?&callback=?&t=XNAS:GPRO&region=usa&culture=en-US&cur=&order=asc"
        );
    }
}
