use super::frame::GeoFrame;
use chrono::{Duration, NaiveDate};
use std::collections::{HashMap, HashSet};

/// Column holding the parcel id in joined frames.
pub const PARCEL_COL: &str = "parcel";

/// Count, for each parcel in `search`, the features a spatial join matched to it.
///
/// Matches are made distinct by `address_col` first (a feature can be joined more than once
/// through different geometries); each remaining `name_col` value then counts once per
/// `;`-separated name, e.g. `"Elm Ave; Pine Ave"` counts as 2. Parcels come out in their
/// first-seen order in `search`, with 0 for parcels nothing matched. A joined row without the
/// parcel id column is an error.
pub fn count_for_spatial_join<S: AsRef<str>>(
    search: &[S],
    joined: &GeoFrame,
    name_col: &str,
    address_col: &str,
) -> crate::Result<Vec<(String, usize)>> {
    if let Some(i) = joined.rows.iter().position(|row| row.text(PARCEL_COL).is_none()) {
        return Err(crate::Error::malformed(
            "joined parcels",
            format!("row {i} has no {PARCEL_COL:?} column"),
        ));
    }

    let mut counts = Vec::new();
    let mut seen = HashSet::new();
    for parcel in search.iter().map(AsRef::as_ref) {
        if !seen.insert(parcel) {
            continue;
        }

        let mut addresses = HashSet::new();
        let mut count = 0;
        for row in joined
            .rows
            .iter()
            .filter(|row| row.text(PARCEL_COL).as_deref() == Some(parcel))
        {
            let address = row.text(address_col).ok_or_else(|| {
                crate::Error::malformed("joined parcels", format!("no {address_col:?} column"))
            })?;
            if !addresses.insert(address) {
                continue;
            }
            let name = row.text(name_col).ok_or_else(|| {
                crate::Error::malformed("joined parcels", format!("no {name_col:?} column"))
            })?;
            count += name.split(';').count();
        }
        counts.push((parcel.to_string(), count));
    }
    Ok(counts)
}

/// One recorded sale of a parcel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParcelSale {
    pub parcel: String,
    pub sale_date: NaiveDate,
}

/// Time between each sale and the parcel's previous sale, aligned with `sales`.
///
/// The earliest sale of a parcel, and a parcel sold only once, have no interval.
pub fn date_intervals_by_parcel(sales: &[ParcelSale]) -> Vec<Option<Duration>> {
    let mut intervals = vec![None; sales.len()];

    let mut by_parcel: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, sale) in sales.iter().enumerate() {
        by_parcel.entry(sale.parcel.as_str()).or_default().push(idx);
    }

    for mut idxs in by_parcel.into_values() {
        if idxs.len() < 2 {
            continue;
        }
        // newest first
        idxs.sort_by(|a, b| sales[*b].sale_date.cmp(&sales[*a].sale_date));
        for pair in idxs.windows(2) {
            intervals[pair[0]] = Some(sales[pair[0]].sale_date - sales[pair[1]].sale_date);
        }
    }
    intervals
}
