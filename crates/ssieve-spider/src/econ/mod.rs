//! Economic indicator series, reshaped into a date-indexed `Value` column.

/// Observations from the [FRED API](https://fred.stlouisfed.org/docs/api/fred/series_observations.html).
pub mod fred;

/// Per-year index movements, and the most recent year's movement of a product.
pub mod movement;

/// Datasets from the [Quandl API](https://docs.data.nasdaq.com/docs/time-series).
pub mod quandl;

use chrono::NaiveDate;
use std::str::FromStr;

/// One observation of an indicator.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// An indicator indexed by date, ascending; the single data column is `Value`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IndicatorSeries {
    pub points: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Build a series, sorting the points by date.
    pub fn new(mut points: Vec<IndicatorPoint>) -> Self {
        points.sort_by_key(|p| p.date);
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Keep only points inside `window`.
    pub fn within(self, window: &DateWindow) -> Self {
        Self {
            points: self
                .points
                .into_iter()
                .filter(|p| window.contains(p.date))
                .collect(),
        }
    }
}

/// Inclusive date range an indicator is limited to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::Result<Self> {
        if start > end {
            return Err(crate::Error::InvalidArgument(format!(
                "window start {start} is after its end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// The 730 days up to and including `today`.
    pub fn trailing_two_years(today: NaiveDate) -> Self {
        Self {
            start: today - chrono::Duration::days(730),
            end: today,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Where an indicator product is published.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    Fred,
    Quandl,
}

impl FromStr for Source {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "fred" => Ok(Self::Fred),
            "quandl" => Ok(Self::Quandl),
            _ => Err(crate::Error::InvalidArgument(format!(
                "unrecognised source {s:?}; should be either quandl or fred"
            ))),
        }
    }
}

/// API keys for the indicator sources, read from `FRED_API` and `QUANDL_API`.
#[derive(Clone, Debug, Default)]
pub struct ApiKeys {
    pub fred: Option<String>,
    pub quandl: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        use crate::http::var;
        Self {
            fred: var("FRED_API").ok(),
            quandl: var("QUANDL_API").ok(),
        }
    }
}

/// Parse an ISO `yyyy-mm-dd` date.
pub(crate) fn parse_iso_date(date: &str) -> crate::Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")?)
}
