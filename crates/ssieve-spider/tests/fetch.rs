use chrono::NaiveDate;
use mockito::{Matcher, Server};
use ssieve_spider::econ::{movement, ApiKeys, Source};
use ssieve_spider::sources::Sources;
use ssieve_spider::stock::financials::{self, Period, ReportCategory, Statement};
use ssieve_spider::stock::{changes, dividends, listing, prices, Exchange, Ticker};

// Every fetch routine against a mock of the live endpoints.

fn client() -> reqwest::Client {
    ssieve_spider::std_client_build().unwrap()
}

#[tokio::test]
async fn fetch_all_current_listings() {
    let mut server = Server::new_async().await;
    let nasdaq = server
        .mock("GET", "/screening/companies-by-name.aspx")
        .match_query(Matcher::UrlEncoded("exchange".into(), "nasdaq".into()))
        .with_body(
            "Symbol,Name,LastSale,MarketCap,IPOyear,Sector,industry,Summary Quote,\n\
            AAPL,Apple Inc.,174.25,$893.1B,1980,Technology,Computer Manufacturing,x,\n\
            DUAL,Dual Listed Corp.,10.00,$1.1B,n/a,Finance,Banks,x,\n",
        )
        .create_async()
        .await;
    let nyse = server
        .mock("GET", "/screening/companies-by-name.aspx")
        .match_query(Matcher::UrlEncoded("exchange".into(), "nyse".into()))
        .with_body(
            "Symbol,Name,LastSale,MarketCap,IPOyear,Sector,industry,Summary Quote,\n\
            MMM,3M Company,190.10,$110.2B,n/a,Health Care,Medical,x,\n\
            DUAL,Dual Listed Corp.,10.00,$1.1B,n/a,Finance,Banks,x,\n",
        )
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let listings = listing::fetch_all_current(&client(), &sources, &Exchange::ALL)
        .await
        .unwrap();

    let tickers: Vec<(&str, Exchange)> = listings
        .iter()
        .map(|l| (l.symbol.as_str(), l.exchange))
        .collect();
    assert_eq!(
        tickers,
        [
            ("AAPL", Exchange::Nasdaq),
            ("DUAL", Exchange::Nasdaq),
            ("MMM", Exchange::Nyse)
        ]
    );
    nasdaq.assert_async().await;
    nyse.assert_async().await;
}

#[tokio::test]
async fn fetch_price_history() {
    let mut server = Server::new_async().await;
    let found = server
        .mock("GET", "/perform/Performance/stock/exportStockPrice.action")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("t".into(), "XNYS:MMM".into()),
            Matcher::UrlEncoded("pd".into(), "10y".into()),
        ]))
        .with_body(
            "\"XNYS:MMM Historical Prices\"\n\
            Date,Open,High,Low,Close,Volume\n\
            01/02/2018,235.78,237.02,234.05,235.40,\"2,009,426\"\n\
            01/03/2018,236.00,237.93,235.02,237.71,\"1,678,765\"\n",
        )
        .create_async()
        .await;
    let empty = server
        .mock("GET", "/perform/Performance/stock/exportStockPrice.action")
        .match_query(Matcher::UrlEncoded("t".into(), "XNAS:FUND".into()))
        .with_body("")
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let history = prices::fetch_price_history(&client(), &sources, "MMM", Exchange::Nyse)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last_date(), NaiveDate::from_ymd_opt(2018, 1, 3));

    let none = prices::fetch_price_history(&client(), &sources, "FUND", Exchange::Nasdaq)
        .await
        .unwrap();
    assert!(none.is_none());

    found.assert_async().await;
    empty.assert_async().await;
}

#[tokio::test]
async fn server_errors_are_errors() {
    let mut server = Server::new_async().await;
    let _down = server
        .mock("GET", "/perform/Performance/stock/exportStockPrice.action")
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let result = prices::fetch_price_history(&client(), &sources, "MMM", Exchange::Nyse).await;
    assert!(matches!(result, Err(ssieve_spider::Error::Http(_))));
}

const DIVIDEND_HEADER: &str = "<tr><th>Ex-Dividend Date</th><th>Declaration Date</th>\
    <th>Record Date</th><th>Payable Date</th><th>Dividend Type</th><th>Amount</th></tr>";

#[tokio::test]
async fn fetch_dividend_history() {
    let mut server = Server::new_async().await;
    let past = server
        .mock("GET", "/perform/Performance/stock/dividend-history.action")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("t".into(), "XNYS:DUK".into()),
            Matcher::UrlEncoded("y".into(), "10".into()),
        ]))
        .with_body(format!(
            "<table>{DIVIDEND_HEADER}\
            <tr><td>02/14/2019</td><td>01/03/2019</td><td>02/15/2019</td><td>03/18/2019</td><td>Cash</td><td>$0.9275</td></tr>\
            </table>"
        ))
        .create_async()
        .await;
    let upcoming = server
        .mock("GET", "/perform/Performance/stock/upcoming-dividends.action")
        .match_query(Matcher::UrlEncoded("t".into(), "XNYS:DUK".into()))
        .with_body(format!(
            "<table>{DIVIDEND_HEADER}\
            <tr><td>05/16/2019</td><td>05/02/2019</td><td>05/17/2019</td><td>06/17/2019</td><td>Cash</td><td>$0.9275</td></tr>\
            </table>"
        ))
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let duke = Ticker::new("DUK", Exchange::Nyse);
    let history = dividends::fetch_dividend_history(&client(), &sources, &duke, 10)
        .await
        .unwrap()
        .unwrap();

    // past first, then upcoming
    let dates: Vec<_> = history.dividends.iter().map(|d| d.ex_dividend).collect();
    assert_eq!(
        dates,
        [
            NaiveDate::from_ymd_opt(2019, 2, 14).unwrap(),
            NaiveDate::from_ymd_opt(2019, 5, 16).unwrap()
        ]
    );
    past.assert_async().await;
    upcoming.assert_async().await;
}

#[tokio::test]
async fn no_past_dividends_is_no_history() {
    let mut server = Server::new_async().await;
    let _past = server
        .mock("GET", "/perform/Performance/stock/dividend-history.action")
        .match_query(Matcher::Any)
        .with_body(format!(
            "<table>{DIVIDEND_HEADER}<tr><td colspan=\"6\">No dividend</td></tr></table>"
        ))
        .create_async()
        .await;
    let _upcoming = server
        .mock("GET", "/perform/Performance/stock/upcoming-dividends.action")
        .match_query(Matcher::Any)
        .with_body(format!(
            "<table>{DIVIDEND_HEADER}\
            <tr><td>05/16/2019</td><td>—</td><td>—</td><td>—</td><td>Cash</td><td>$0.10</td></tr>\
            </table>"
        ))
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let growth = Ticker::new("GRWTH", Exchange::Nasdaq);
    let history = dividends::fetch_dividend_history(&client(), &sources, &growth, 10)
        .await
        .unwrap();
    assert!(history.is_none());
}

#[tokio::test]
async fn fetch_report() {
    let mut server = Server::new_async().await;
    let income = server
        .mock("GET", "/ajax/ReportProcess4CSV.html")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("t".into(), "XNAS:AAPL".into()),
            Matcher::UrlEncoded("reportType".into(), "is".into()),
            Matcher::UrlEncoded("period".into(), "12".into()),
        ]))
        .with_body(
            "Apple Inc (AAPL) Income Statement\n\
            Fiscal year ends in September. USD in millions.,2016-09,2017-09,TTM\n\
            Revenue,215639,229234,239176\n",
        )
        .create_async()
        .await;
    let empty = server
        .mock("GET", "/ajax/ReportProcess4CSV.html")
        .match_query(Matcher::UrlEncoded("reportType".into(), "cf".into()))
        .with_body("")
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let apple = Ticker::new("AAPL", Exchange::Nasdaq);

    let annual = ReportCategory::new(Statement::Income, Period::Annual);
    let report = financials::fetch_report(&client(), &sources, &apple, annual)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.periods, ["2016-09", "2017-09", "TTM"]);
    assert_eq!(report.items[0].values[2], Some(239176.0));

    let cashflow = ReportCategory::new(Statement::Cashflow, Period::Quarterly);
    let none = financials::fetch_report(&client(), &sources, &apple, cashflow)
        .await
        .unwrap();
    assert!(none.is_none());

    income.assert_async().await;
    empty.assert_async().await;
}

#[tokio::test]
async fn fetch_key_ratios() {
    let mut server = Server::new_async().await;
    let found = server
        .mock("GET", "/ajax/exportKR2CSV.html")
        .match_query(Matcher::UrlEncoded("t".into(), "XNAS:GPRO".into()))
        .with_body(
            "Growth Profitability and Financial Ratios for GoPro Inc\n\
            Financials\n\
            ,2015-12,2016-12,TTM\n\
            Revenue USD Mil,\"1,620\",\"1,185\",\"1,180\"\n\
            Gross Margin %,41.7,38.9,\n",
        )
        .create_async()
        .await;
    let empty = server
        .mock("GET", "/ajax/exportKR2CSV.html")
        .match_query(Matcher::UrlEncoded("t".into(), "XNYS:SPY".into()))
        .with_body("")
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let gopro = Ticker::new("GPRO", Exchange::Nasdaq);
    let ratios = financials::fetch_key_ratios(&client(), &sources, &gopro)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ratios.periods, ["2015-12", "2016-12", "TTM"]);
    assert_eq!(ratios.ratios[0].values[0], Some(1620.0));

    let fund = Ticker::new("SPY", Exchange::Nyse);
    let none = financials::fetch_key_ratios(&client(), &sources, &fund).await.unwrap();
    assert!(none.is_none());

    found.assert_async().await;
    empty.assert_async().await;
}

#[tokio::test]
async fn fetch_symbol_changes() {
    let mut server = Server::new_async().await;
    let _changes = server
        .mock("GET", "/markets/stocks/symbol-change-history.aspx")
        .with_body(
            "<table><tr><th>Old Symbol</th><th>New Symbol</th><th>Date Effective</th></tr>\
            <tr><td>FB</td><td>META</td><td>06/09/2022</td></tr></table>",
        )
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let changes = changes::fetch_symbol_changes(&client(), &sources).await.unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!((changes[0].old.as_str(), changes[0].new.as_str()), ("FB", "META"));
}

#[tokio::test]
async fn recent_fred_movement() {
    let mut server = Server::new_async().await;
    let fred = server
        .mock("GET", "/fred/series/observations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("series_id".into(), "CSUSHPISA".into()),
            Matcher::UrlEncoded("api_key".into(), "secret".into()),
        ]))
        .with_body(
            r#"{ "observations": [
                { "date": "2020-01-01", "value": "10.0" },
                { "date": "2025-06-01", "value": "50.0" },
                { "date": "2026-01-01", "value": "100.0" },
                { "date": "2026-02-01", "value": "." },
                { "date": "2026-04-01", "value": "102.5" },
                { "date": "2026-07-01", "value": "101.25" }
            ] }"#,
        )
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let keys = ApiKeys {
        fred: Some("secret".to_string()),
        quandl: None,
    };
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let latest = movement::recent_movement(&client(), &sources, &keys, "CSUSHPISA", Source::Fred, today)
        .await
        .unwrap();
    assert_eq!(latest, 1.25);
    fred.assert_async().await;

    // no key, no request
    let keys = ApiKeys {
        fred: None,
        quandl: None,
    };
    let result =
        movement::recent_movement(&client(), &sources, &keys, "CSUSHPISA", Source::Fred, today).await;
    assert!(matches!(result, Err(ssieve_spider::Error::MissingEnv("FRED_API"))));
}

#[tokio::test]
async fn recent_quandl_movement() {
    let mut server = Server::new_async().await;
    let quandl = server
        .mock("GET", "/api/v3/datasets/FMAC/FIX30YR.json")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("start_date".into(), "2024-10-19".into()),
            Matcher::UrlEncoded("end_date".into(), "2026-10-19".into()),
        ]))
        .with_body(
            r#"{ "dataset": {
                "column_names": ["Date", "Points", "US Interest Rate"],
                "data": [
                    ["2026-09-03", 0.5, 6.25],
                    ["2026-03-05", 0.6, 6.5],
                    ["2025-12-04", 0.7, 7.0]
                ]
            } }"#,
        )
        .create_async()
        .await;

    let sources = Sources::with_host(&server.url());
    let keys = ApiKeys {
        fred: None,
        quandl: None,
    };
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    let latest = movement::recent_movement(&client(), &sources, &keys, "FMAC/FIX30YR", Source::Quandl, today)
        .await
        .unwrap();
    assert_eq!(latest, -0.25);
    quandl.assert_async().await;
}
