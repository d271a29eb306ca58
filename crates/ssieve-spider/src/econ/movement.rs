use super::{fred, quandl, ApiKeys, DateWindow, IndicatorSeries, Source};
use crate::http::HttpClient;
use crate::sources::Sources;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Movement of the index within each calendar year: the sum of the differences between
/// consecutive observations of that year.
///
/// A year with a single observation moved by 0.0.
pub fn periodic_movement(series: &IndicatorSeries) -> BTreeMap<i32, f64> {
    let mut movement = BTreeMap::new();
    let mut previous: Option<(i32, f64)> = None;
    for point in &series.points {
        let year = point.date.year();
        let entry = movement.entry(year).or_insert(0.0);
        if let Some((prev_year, prev_value)) = previous {
            if prev_year == year {
                *entry += point.value - prev_value;
            }
        }
        previous = Some((year, point.value));
    }
    movement
}

/// Difference of each observation to the next one, keyed by the observation's year.
///
/// The last observation has no successor, so its movement is `None`.
pub fn annual_movement(series: &IndicatorSeries) -> Vec<(i32, Option<f64>)> {
    let points = &series.points;
    points
        .iter()
        .enumerate()
        .map(|(i, point)| {
            let next = points.get(i + 1).map(|next| point.value - next.value);
            (point.date.year(), next)
        })
        .collect()
}

/// The most recent year's movement of `product`, rounded to 3 decimals.
///
/// Looks back 730 days from `today`. A product with no observations in that period (no
/// longer tracked, or no longer published) moved by 0.0.
pub async fn recent_movement(
    http_client: &HttpClient,
    sources: &Sources,
    keys: &ApiKeys,
    product: &str,
    source: Source,
    today: NaiveDate,
) -> crate::Result<f64> {
    let window = DateWindow::trailing_two_years(today);
    info!("fetching {product} from {source:?}, {} to {}", window.start, window.end);

    let series = match source {
        Source::Quandl => {
            quandl::fetch_indicator(http_client, sources, product, &window, keys.quandl.as_deref())
                .await?
        }
        Source::Fred => {
            let key = keys
                .fred
                .as_deref()
                .ok_or(crate::Error::MissingEnv("FRED_API"))?;
            fred::fetch_indicator(http_client, sources, product, key, Some(&window)).await?
        }
    };

    let latest = latest_movement(&series);
    debug!("{product} latest movement: {latest}");
    Ok(latest)
}

/// The last year's periodic movement, rounded to 3 decimals; 0.0 for an empty series.
pub fn latest_movement(series: &IndicatorSeries) -> f64 {
    periodic_movement(series)
        .into_iter()
        .next_back()
        .map(|(_, movement)| (movement * 1000.0).round() / 1000.0)
        .unwrap_or(0.0)
}
