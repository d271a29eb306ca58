use super::{parse_iso_date, DateWindow, IndicatorPoint, IndicatorSeries};
use crate::http::*;
use crate::sources::Sources;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, trace};

/// Products whose value column is not the first one after the date.
fn value_column(product: &str) -> Option<&'static str> {
    match product {
        "FMAC/FIX30YR" => Some("US Interest Rate"),
        "FMAC/HPI" => Some("United States seasonaly adjusted"),
        _ => None,
    }
}

/// Fetch a Quandl product over `window`, reduced to its value column.
pub async fn fetch_indicator(
    http_client: &HttpClient,
    sources: &Sources,
    product: &str,
    window: &DateWindow,
    api_key: Option<&str>,
) -> crate::Result<IndicatorSeries> {
    let dataset = fetch_dataset(http_client, sources, product, window, api_key).await?;
    select_column(&dataset, value_column(product))
}

/// GET the raw dataset of `product` (e.g. `FMAC/HPI`), limited to `window`.
pub async fn fetch_dataset(
    http_client: &HttpClient,
    sources: &Sources,
    product: &str,
    window: &DateWindow,
    api_key: Option<&str>,
) -> crate::Result<Dataset> {
    let time = std::time::Instant::now();
    let mut url = format!(
        "{base}/{product}.json?start_date={start}&end_date={end}",
        base = sources.quandl,
        start = window.start.format("%Y-%m-%d"),
        end = window.end.format("%Y-%m-%d"),
    );
    if let Some(key) = api_key {
        url.push_str(&format!("&api_key={key}"));
    }

    trace!("fetching Quandl dataset {product}");
    let response: DatasetResponse = http_client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|err| {
            error!("failed to fetch Quandl dataset {product}, error({err})");
            err
        })?
        .json()
        .await?;

    debug!(
        "fetched Quandl.{product}, {} rows. {}",
        response.dataset.data.len(),
        crate::time_elapsed(time)
    );
    Ok(response.dataset)
}

/// Reduce a dataset to one value column, renamed `Value`.
///
/// With no `column` named, the first column after the date is used. Rows with a null value are
/// dropped.
pub fn select_column(dataset: &Dataset, column: Option<&str>) -> crate::Result<IndicatorSeries> {
    if dataset.column_names.len() < 2 {
        return Err(crate::Error::malformed(
            "Quandl dataset",
            format!("expected a date and a value column, got {:?}", dataset.column_names),
        ));
    }

    let idx = match column {
        Some(name) => dataset
            .column_names
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| {
                crate::Error::malformed(
                    "Quandl dataset",
                    format!("column {name:?} not in {:?}", dataset.column_names),
                )
            })?,
        None => 1,
    };

    let mut points = Vec::with_capacity(dataset.data.len());
    for row in &dataset.data {
        let date = match row.first() {
            Some(Value::String(date)) => parse_iso_date(date)?,
            other => {
                return Err(crate::Error::malformed(
                    "Quandl dataset",
                    format!("expected a date string, got {other:?}"),
                ))
            }
        };
        match row.get(idx) {
            Some(Value::Number(n)) => {
                let value = n.as_f64().ok_or_else(|| {
                    crate::Error::malformed("Quandl dataset", format!("{n} is not a float"))
                })?;
                points.push(IndicatorPoint { date, value });
            }
            Some(Value::Null) | None => continue,
            Some(other) => {
                return Err(crate::Error::malformed(
                    "Quandl dataset",
                    format!("expected a number on {date}, got {other}"),
                ))
            }
        }
    }

    Ok(IndicatorSeries::new(points))
}

//////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
struct DatasetResponse {
    dataset: Dataset,
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
    column_names: Vec<String>,
    data: Vec<Vec<Value>>,
}
