//////////////////////////////////////////////////////////////////
// schema
//////////////////////////////////////////////////////////////////

pub(crate) static CREATE_SCHEMA: &str = "CREATE SCHEMA IF NOT EXISTS stock";

/// `stock.prices` is the append-only table of daily prices; one row per symbol per day.
pub(crate) static CREATE_PRICES: &str = "
    CREATE TABLE IF NOT EXISTS stock.prices (
        symbol      VARCHAR NOT NULL,
        dated       DATE NOT NULL,
        opening     DOUBLE PRECISION NOT NULL,
        high        DOUBLE PRECISION NOT NULL,
        low         DOUBLE PRECISION NOT NULL,
        closing     DOUBLE PRECISION NOT NULL,
        volume      BIGINT,
        PRIMARY KEY (symbol, dated)
    )
";

/// `stock.dividends` holds past & upcoming cash dividends.
pub(crate) static CREATE_DIVIDENDS: &str = "
    CREATE TABLE IF NOT EXISTS stock.dividends (
        symbol          VARCHAR NOT NULL,
        ex_dividend     DATE NOT NULL,
        declared        DATE,
        record          DATE,
        payable         DATE,
        dividend_type   VARCHAR NOT NULL,
        amount          DOUBLE PRECISION,
        currency        VARCHAR NOT NULL,
        PRIMARY KEY (symbol, ex_dividend, dividend_type)
    )
";

/// The ticker universe; only ever created by the initialisation run, so its presence marks an
/// initialised database.
pub(crate) static CREATE_TICKERS: &str = "
    CREATE TABLE stock.tickers (
        symbol          VARCHAR PRIMARY KEY,
        name            VARCHAR NOT NULL,
        exchange        VARCHAR NOT NULL,
        last_sale       DOUBLE PRECISION NOT NULL,
        market_cap      DOUBLE PRECISION,
        market_cap_unit VARCHAR,
        ipo_year        INTEGER,
        sector          VARCHAR,
        industry        VARCHAR
    )
";

/// The 10-K/10-Q statement tables share one long-form layout. Line item names repeat within a
/// statement (e.g. "Basic" under both EPS and share counts), so rows carry no unique key.
pub(crate) fn create_report(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            symbol          VARCHAR NOT NULL,
            line_item       VARCHAR NOT NULL,
            fiscal_period   VARCHAR NOT NULL,
            val             DOUBLE PRECISION NOT NULL
        )"
    )
}

pub(crate) fn index_report(table: &str) -> String {
    let name = table.trim_start_matches("stock.");
    format!("CREATE INDEX IF NOT EXISTS {name}_symbol ON {table} (symbol)")
}

/// Every table a ticker symbol appears in.
pub(crate) static TABLES: [&str; 9] = [
    "stock.tickers",
    "stock.prices",
    "stock.dividends",
    "stock.ten_q_income",
    "stock.ten_k_income",
    "stock.ten_q_balance",
    "stock.ten_k_balance",
    "stock.ten_q_cashflow",
    "stock.ten_k_cashflow",
];

//////////////////////////////////////////////////////////////////
// tickers
//////////////////////////////////////////////////////////////////

pub(crate) static INSERT_TICKER: &str = "
    INSERT INTO stock.tickers
        (symbol, name, exchange, last_sale, market_cap, market_cap_unit, ipo_year, sector, industry)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
    ON CONFLICT (symbol) DO NOTHING
";

pub(crate) static SELECT_TICKERS: &str = "
    SELECT symbol, exchange
    FROM stock.tickers
    ORDER BY symbol
";

pub(crate) static SYMBOL_EXISTS: &str = "
    SELECT EXISTS (SELECT 1 FROM stock.tickers WHERE symbol = $1)
";

//////////////////////////////////////////////////////////////////
// prices
//////////////////////////////////////////////////////////////////

pub(crate) static INSERT_PRICE: &str = "
    INSERT INTO stock.prices (symbol, dated, opening, high, low, closing, volume)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    ON CONFLICT (symbol, dated) DO NOTHING
";

pub(crate) static PRICE_HISTORY_EXISTS: &str = "
    SELECT EXISTS (SELECT 1 FROM stock.prices WHERE symbol = $1)
";

pub(crate) static LAST_PRICE_DATE: &str = "
    SELECT MAX(dated)
    FROM stock.prices
    WHERE symbol = $1
";

//////////////////////////////////////////////////////////////////
// dividends
//////////////////////////////////////////////////////////////////

pub(crate) static INSERT_DIVIDEND: &str = "
    INSERT INTO stock.dividends
        (symbol, ex_dividend, declared, record, payable, dividend_type, amount, currency)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    ON CONFLICT (symbol, ex_dividend, dividend_type) DO NOTHING
";

pub(crate) static DIVIDEND_HISTORY_EXISTS: &str = "
    SELECT EXISTS (SELECT 1 FROM stock.dividends WHERE symbol = $1)
";

//////////////////////////////////////////////////////////////////
// financial reports
//////////////////////////////////////////////////////////////////

pub(crate) fn insert_report(table: &str) -> String {
    format!(
        "INSERT INTO {table} (symbol, line_item, fiscal_period, val)
        VALUES ($1, $2, $3, $4)"
    )
}

pub(crate) fn report_exists(table: &str) -> String {
    format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE symbol = $1)")
}

//////////////////////////////////////////////////////////////////
// housekeeping
//////////////////////////////////////////////////////////////////

pub(crate) static TABLE_EXISTS: &str = "
    SELECT EXISTS (
        SELECT 1
        FROM information_schema.tables
        WHERE table_schema = $1 AND table_name = $2
    )
";

pub(crate) static SCHEMA_EXISTS: &str = "
    SELECT EXISTS (
        SELECT 1
        FROM information_schema.schemata
        WHERE schema_name = $1
    )
";

/// Rename `$2` to `$1`, leaving the table alone when it already holds `$1`.
pub(crate) fn rename_symbol(table: &str) -> String {
    format!(
        "UPDATE {table} SET symbol = $1 WHERE symbol = $2 \
        AND NOT EXISTS (SELECT 1 FROM {table} WHERE symbol = $1)"
    )
}
