use super::{parse_iso_date, DateWindow, IndicatorPoint, IndicatorSeries};
use crate::http::*;
use crate::sources::Sources;
use serde::Deserialize;
use tracing::{debug, error, trace};

/// Fetch a FRED series and format it like a Quandl index: a date-indexed `Value` column,
/// limited to `window` when one is given.
pub async fn fetch_indicator(
    http_client: &HttpClient,
    sources: &Sources,
    series_id: &str,
    api_key: &str,
    window: Option<&DateWindow>,
) -> crate::Result<IndicatorSeries> {
    let observations = fetch_observations(http_client, sources, series_id, api_key).await?;
    format_like_quandl(&observations, window)
}

/// GET the raw observations of `series_id`.
pub async fn fetch_observations(
    http_client: &HttpClient,
    sources: &Sources,
    series_id: &str,
    api_key: &str,
) -> crate::Result<Observations> {
    let time = std::time::Instant::now();
    let url = format!(
        "{base}?series_id={series_id}&api_key={api_key}&file_type=json",
        base = sources.fred
    );

    trace!("fetching FRED data {series_id}");
    let observations: Observations = http_client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|err| {
            error!("failed to fetch FRED series {series_id}, error({err})");
            err
        })?
        .json()
        .await?;

    debug!(
        "fetched FRED.{series_id}, {} observations. {}",
        observations.inner.len(),
        crate::time_elapsed(time)
    );
    Ok(observations)
}

/// Limit the observations to their date & value, drop the missing values, and index them by
/// date.
pub fn format_like_quandl(
    observations: &Observations,
    window: Option<&DateWindow>,
) -> crate::Result<IndicatorSeries> {
    let mut points = Vec::with_capacity(observations.inner.len());
    for cell in &observations.inner {
        // FRED marks a missing value with "."
        let value = cell.value.trim();
        if value.is_empty() || value == "." {
            continue;
        }

        let date = parse_iso_date(&cell.dated)?;
        let value = value.parse::<f64>().map_err(|err| {
            crate::Error::malformed("FRED observation", format!("{value:?} on {date}: {err}"))
        })?;
        points.push(IndicatorPoint { date, value });
    }

    let series = IndicatorSeries::new(points);
    Ok(match window {
        Some(window) => series.within(window),
        None => series,
    })
}

//////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Deserialize)]
pub struct Observations {
    #[serde(rename = "observations")]
    inner: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    #[serde(rename = "date")]
    dated: String,
    value: String,
}
