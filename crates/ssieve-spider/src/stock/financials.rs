use super::{sql, StockDb, Symbol};
use crate::api::{self, Row};
use crate::http::*;
use crate::sources::Sources;
use std::fmt;
use tokio_postgres::types::ToSql;
use tracing::{debug, error, trace};

/// The three statements of a 10-K/10-Q filing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Statement {
    Income,
    Balance,
    Cashflow,
}

impl Statement {
    /// Morningstar's `reportType`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Income => "is",
            Self::Balance => "bs",
            Self::Cashflow => "cf",
        }
    }

    /// Label of the line item column.
    pub fn item_label(&self) -> &'static str {
        match self {
            Self::Income => "Income item",
            Self::Balance => "Balance item",
            Self::Cashflow => "Cashflow item",
        }
    }
}

/// Length of the fiscal periods a statement covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Period {
    /// 10-Q, 3 months.
    Quarterly,
    /// 10-K, 12 months.
    Annual,
}

impl Period {
    pub fn months(&self) -> u8 {
        match self {
            Self::Quarterly => 3,
            Self::Annual => 12,
        }
    }
}

/// A statement × period classification; each has its own table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ReportCategory {
    pub statement: Statement,
    pub period: Period,
}

impl ReportCategory {
    pub const ALL: [ReportCategory; 6] = [
        Self::new(Statement::Income, Period::Quarterly),
        Self::new(Statement::Income, Period::Annual),
        Self::new(Statement::Balance, Period::Quarterly),
        Self::new(Statement::Balance, Period::Annual),
        Self::new(Statement::Cashflow, Period::Quarterly),
        Self::new(Statement::Cashflow, Period::Annual),
    ];

    pub const fn new(statement: Statement, period: Period) -> Self {
        Self { statement, period }
    }

    pub fn table(&self) -> &'static str {
        match (self.statement, self.period) {
            (Statement::Income, Period::Quarterly) => "stock.ten_q_income",
            (Statement::Income, Period::Annual) => "stock.ten_k_income",
            (Statement::Balance, Period::Quarterly) => "stock.ten_q_balance",
            (Statement::Balance, Period::Annual) => "stock.ten_k_balance",
            (Statement::Cashflow, Period::Quarterly) => "stock.ten_q_cashflow",
            (Statement::Cashflow, Period::Annual) => "stock.ten_k_cashflow",
        }
    }
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let form = match self.period {
            Period::Quarterly => "10-Q",
            Period::Annual => "10-K",
        };
        write!(f, "{form} {}", self.statement.code().to_uppercase())
    }
}

/// One line of a statement, with a value per fiscal period.
#[derive(Clone, Debug, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// A statement of one symbol: fiscal periods as columns, line items as rows.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialReport {
    pub symbol: String,
    pub category: ReportCategory,
    /// Column label of the line items, e.g. `Income item`.
    pub item_label: &'static str,
    /// Fiscal period labels, e.g. `2017-09` or `TTM`.
    pub periods: Vec<String>,
    pub items: Vec<LineItem>,
}

/// One (line item, period) cell of a report, as stored.
struct ReportCell<'a> {
    symbol: &'a str,
    line_item: &'a str,
    fiscal_period: &'a str,
    val: f64,
}

impl Row for ReportCell<'_> {
    fn params(&self) -> Vec<&(dyn ToSql + Sync)> {
        vec![&self.symbol, &self.line_item, &self.fiscal_period, &self.val]
    }
}

impl FinancialReport {
    /// The report in long form; section headings and empty cells are left out.
    fn cells(&self) -> Vec<ReportCell<'_>> {
        self.items
            .iter()
            .flat_map(|item| {
                item.values
                    .iter()
                    .zip(&self.periods)
                    .filter_map(move |(val, period)| {
                        val.map(|val| ReportCell {
                            symbol: &self.symbol,
                            line_item: &item.name,
                            fiscal_period: period,
                            val,
                        })
                    })
            })
            .collect()
    }
}

/// Parse a Morningstar statement export; the first line is a title, the header on the second.
///
/// The first header column must name the fiscal year (`Fiscal year ends in ...`); it becomes
/// the line item column. Columns without a single value are removed.
pub fn parse_report(text: &str, symbol: &str, category: ReportCategory) -> crate::Result<FinancialReport> {
    let body = text
        .split_once('\n')
        .map(|(_, body)| body)
        .ok_or_else(|| crate::Error::malformed("financial report", "no header line"))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut records = reader.records();

    let header = records
        .next()
        .ok_or_else(|| crate::Error::malformed("financial report", "no header line"))??;
    match header.get(0) {
        Some(first) if first.contains("Fiscal") => {}
        first => {
            return Err(crate::Error::malformed(
                "financial report",
                format!("{symbol} {category}: first column does not name the fiscal year, got {first:?}"),
            ))
        }
    }
    let mut periods: Vec<String> = header.iter().skip(1).map(str::to_string).collect();

    let mut items = Vec::new();
    for record in records {
        let record = record?;
        let Some(name) = record.get(0).filter(|name| !name.is_empty()) else {
            continue;
        };
        let values = (1..=periods.len())
            .map(|i| record.get(i).and_then(|cell| cell.parse::<f64>().ok()))
            .collect();
        items.push(LineItem {
            name: name.to_string(),
            values,
        });
    }

    // drop the columns that are empty all the way down
    let keep: Vec<bool> = (0..periods.len())
        .map(|i| items.iter().any(|item: &LineItem| item.values[i].is_some()))
        .collect();
    let mut flags = keep.iter();
    periods.retain(|_| *flags.next().unwrap_or(&false));
    for item in &mut items {
        let mut flags = keep.iter();
        item.values.retain(|_| *flags.next().unwrap_or(&false));
    }

    trace!("{symbol} {category}: {} items over {} periods", items.len(), periods.len());
    Ok(FinancialReport {
        symbol: symbol.to_string(),
        category,
        item_label: category.statement.item_label(),
        periods,
        items,
    })
}

/// Fetch one statement of a ticker; `Ok(None)` when Morningstar sends an empty payload.
pub async fn fetch_report<S: Symbol>(
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &S,
    category: ReportCategory,
) -> crate::Result<Option<FinancialReport>> {
    let time = std::time::Instant::now();
    let symbol = ticker.symbol();
    let url = sources.report_url(symbol, ticker.exchange(), category);

    trace!("fetching {category} report of {symbol}");
    let text = super::get_text(http_client, &url).await.map_err(|err| {
        error!("failed to fetch {category} report of {symbol}, error({err})");
        err
    })?;
    if text.trim().is_empty() {
        debug!("no {category} report for {symbol}");
        return Ok(None);
    }

    let report = parse_report(&text, symbol, category)?;
    debug!("{symbol} {category} report fetched. {}", crate::time_elapsed(time));
    Ok(Some(report))
}

/// Store a report in its category's table; refused when the symbol already has one there.
pub async fn commit_report(db: &mut StockDb, report: &FinancialReport) -> crate::Result<u64> {
    if db
        .financial_history_exists(&report.symbol, report.category)
        .await?
    {
        return Err(crate::Error::AlreadyExists(format!(
            "{} report for {}",
            report.category, report.symbol
        )));
    }
    let statement = sql::insert_report(report.category.table());
    let inserted = api::insert_rows(db.client_mut(), &statement, &report.cells()).await?;
    debug!(
        "{}: {inserted} {} cells committed",
        report.symbol, report.category
    );
    Ok(inserted)
}

/// One row of the key ratios export, under the section heading it appears in.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyRatio {
    pub section: String,
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Morningstar's key ratios of one symbol: 10 fiscal years and the trailing twelve months.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyRatios {
    pub symbol: String,
    pub periods: Vec<String>,
    pub ratios: Vec<KeyRatio>,
}

/// Parse a Morningstar key ratios export.
///
/// Two title lines (the second names the first section) come before the period header.
/// Further sections open with a heading line, or a heading repeating the period header;
/// numbers may carry thousands separators. `Ok(None)` when there is no header or no ratio.
pub fn parse_key_ratios(text: &str, symbol: &str) -> crate::Result<Option<KeyRatios>> {
    let mut lines = text.splitn(3, '\n');
    let (Some(_title), Some(first_section), Some(body)) = (lines.next(), lines.next(), lines.next())
    else {
        return Ok(None);
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());
    let mut records = reader.records();

    let Some(header) = records.next() else {
        return Ok(None);
    };
    let periods: Vec<String> = header?.iter().skip(1).map(str::to_string).collect();
    if periods.is_empty() {
        return Ok(None);
    }

    let mut section = first_section.trim().to_string();
    let mut ratios = Vec::new();
    for record in records {
        let record = record?;
        let name = record.get(0).unwrap_or_default();
        let rest: Vec<&str> = record.iter().skip(1).collect();

        let heading = rest.iter().all(|cell| cell.is_empty())
            || (rest.len() >= periods.len() && periods.iter().zip(&rest).all(|(p, cell)| p == cell));
        if heading {
            if !name.is_empty() {
                section = name.to_string();
            }
            continue;
        }
        if name.is_empty() {
            continue;
        }

        ratios.push(KeyRatio {
            section: section.clone(),
            name: name.to_string(),
            values: (0..periods.len())
                .map(|i| rest.get(i).and_then(|cell| cell.replace(',', "").parse().ok()))
                .collect(),
        });
    }

    if ratios.is_empty() {
        return Ok(None);
    }
    trace!("{symbol}: {} key ratios over {} periods", ratios.len(), periods.len());
    Ok(Some(KeyRatios {
        symbol: symbol.to_string(),
        periods,
        ratios,
    }))
}

/// Fetch the key ratios of a ticker; `Ok(None)` when Morningstar has no financial information
/// for it (an empty or unreadable payload).
pub async fn fetch_key_ratios<S: Symbol>(
    http_client: &HttpClient,
    sources: &Sources,
    ticker: &S,
) -> crate::Result<Option<KeyRatios>> {
    let time = std::time::Instant::now();
    let symbol = ticker.symbol();
    let url = sources.key_ratios_url(symbol, ticker.exchange());

    trace!("fetching key ratios of {symbol}");
    let text = super::get_text(http_client, &url).await.map_err(|err| {
        error!("failed to fetch key ratios of {symbol}, error({err})");
        err
    })?;

    let ratios = match parse_key_ratios(&text, symbol) {
        Ok(ratios) => ratios,
        Err(err) => {
            debug!("unreadable key ratios for {symbol}, error({err})");
            None
        }
    };
    match &ratios {
        Some(_) => debug!("{symbol} key ratios fetched. {}", crate::time_elapsed(time)),
        None => debug!("no available financial information for {symbol}"),
    }
    Ok(ratios)
}

#[cfg(test)]
mod tests {
    use super::*;

    const INCOME: &str = "\
Apple Inc (AAPL) Income Statement,,,,,,,
Fiscal year ends in September. USD in millions except per share data.,2013-09,2014-09,2015-09,2016-09,2017-09,TTM,
Revenue,170910,182795,233715,215639,229234,239176,
Cost of revenue,106606,112258,140089,131376,141048,147254,
Operating expenses,,,,,,,
Research and development,4475,6041,8067,10045,11581,,
Earnings per share,,,,,,,
Basic,5.72,6.49,9.28,8.35,9.27,9.70,
";

    fn annual_income() -> ReportCategory {
        ReportCategory::new(Statement::Income, Period::Annual)
    }

    #[test]
    fn parses_statement() {
        let report = parse_report(INCOME, "AAPL", annual_income()).unwrap();
        assert_eq!(report.item_label, "Income item");
        // the trailing empty column is gone
        assert_eq!(
            report.periods,
            ["2013-09", "2014-09", "2015-09", "2016-09", "2017-09", "TTM"]
        );
        assert_eq!(report.items.len(), 6);
        assert_eq!(report.items[0].name, "Revenue");
        assert_eq!(report.items[0].values[5], Some(239176.0));
        assert!(report.items[2].values.iter().all(Option::is_none));
        assert_eq!(report.items[3].values[5], None);
    }

    #[test]
    fn long_form_skips_empty_cells() {
        let report = parse_report(INCOME, "AAPL", annual_income()).unwrap();
        let cells = report.cells();
        // 3 full rows of 6, and 5 R&D values
        assert_eq!(cells.len(), 3 * 6 + 5);
        assert_eq!(cells[0].line_item, "Revenue");
        assert_eq!(cells[0].fiscal_period, "2013-09");
        assert!(cells.iter().all(|cell| cell.symbol == "AAPL"));
    }

    #[test]
    fn first_column_must_name_the_fiscal_year() {
        let text = "title\nPeriod,2016,2017\nRevenue,1,2\n";
        assert!(matches!(
            parse_report(text, "X", annual_income()),
            Err(crate::Error::Malformed { .. })
        ));
    }

    const KEY_RATIOS: &str = "\
Growth Profitability and Financial Ratios for GoPro Inc
Financials
,2014-12,2015-12,2016-12,TTM
Revenue USD Mil,\"1,394\",\"1,620\",\"1,185\",\"1,180\"
Gross Margin %,45.0,41.7,38.9,

Key Ratios -> Profitability
Margins % of Sales,2014-12,2015-12,2016-12,TTM
Revenue,100.00,100.00,100.00,100.00
COGS,55.0,58.3,61.1,62.0
";

    #[test]
    fn parses_key_ratios_by_section() {
        let ratios = parse_key_ratios(KEY_RATIOS, "GPRO").unwrap().unwrap();
        assert_eq!(ratios.periods, ["2014-12", "2015-12", "2016-12", "TTM"]);
        assert_eq!(ratios.ratios.len(), 4);

        let revenue = &ratios.ratios[0];
        assert_eq!(revenue.section, "Financials");
        assert_eq!(revenue.values[0], Some(1394.0));
        assert_eq!(ratios.ratios[1].values[3], None);

        let cogs = &ratios.ratios[3];
        assert_eq!(cogs.section, "Margins % of Sales");
        assert_eq!(cogs.name, "COGS");
        assert_eq!(cogs.values[3], Some(62.0));
    }

    #[test]
    fn no_key_ratios() {
        assert_eq!(parse_key_ratios("", "X").unwrap(), None);
        assert_eq!(parse_key_ratios("title\nFinancials\n", "X").unwrap(), None);
        assert_eq!(
            parse_key_ratios("title\nFinancials\n,2016-12,TTM\n", "X").unwrap(),
            None
        );
    }

    #[test]
    fn categories_map_to_tables() {
        let tables: std::collections::HashSet<_> =
            ReportCategory::ALL.iter().map(ReportCategory::table).collect();
        assert_eq!(tables.len(), 6);
        assert_eq!(
            ReportCategory::new(Statement::Cashflow, Period::Quarterly).to_string(),
            "10-Q CF"
        );
    }
}
