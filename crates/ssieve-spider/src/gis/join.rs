use super::frame::{GeoFrame, GeoRow, Properties, BUFFER_COL};
use super::parcels::PARCEL_COL;
use geo::Intersects;
use std::collections::HashSet;
use tracing::{debug, trace};

/// Spatially join each parcel with every feature its geometry intersects.
///
/// A parcel carrying a buffered geometry in [`BUFFER_COL`] is matched on that geometry; the
/// buffer column itself is not carried into the output.
///
/// Parcels are processed `batch` rows at a time to bound the size of each intermediate
/// result. Every output row keeps the parcel's geometry, with the parcel's and the feature's
/// properties side by side; a column present in both frames is suffixed `_left` (parcel) and
/// `_right` (feature), except the parcel id column, which keeps its name on the parcel side
/// (a feature's own `parcel` becomes `parcel_right`). Rows come out in parcel order, then
/// feature order, so the result is the same for every batch size.
pub fn spatial_join(parcels: &GeoFrame, features: &GeoFrame, batch: usize) -> crate::Result<GeoFrame> {
    if batch == 0 {
        return Err(crate::Error::InvalidArgument(
            "spatial join batch size must be at least 1".to_string(),
        ));
    }
    let time = std::time::Instant::now();

    let clashes = clashing_columns(parcels, features);
    let mut joined = GeoFrame::default();
    for (n, chunk) in parcels.rows.chunks(batch).enumerate() {
        let mut partial: Vec<GeoRow> = Vec::new();
        for parcel in chunk {
            let matcher = parcel.match_geometry()?;
            for feature in features
                .rows
                .iter()
                .filter(|feature| matcher.intersects(&feature.geometry))
            {
                partial.push(GeoRow {
                    geometry: parcel.geometry.clone(),
                    properties: merge(&parcel.properties, &feature.properties, &clashes),
                });
            }
        }
        trace!("batch {n}: {} parcels, {} joined rows", chunk.len(), partial.len());
        joined.rows.append(&mut partial);
    }

    debug!(
        "joined {} parcels against {} features into {} rows. {}",
        parcels.len(),
        features.len(),
        joined.len(),
        crate::time_elapsed(time)
    );
    Ok(joined)
}

/// Property columns present in both frames.
fn clashing_columns(left: &GeoFrame, right: &GeoFrame) -> HashSet<String> {
    let columns = |frame: &GeoFrame| -> HashSet<String> {
        frame
            .rows
            .iter()
            .flat_map(|row| row.properties.keys().cloned())
            .collect()
    };
    let left = columns(left);
    columns(right)
        .into_iter()
        .filter(|col| left.contains(col))
        .collect()
}

fn merge(left: &Properties, right: &Properties, clashes: &HashSet<String>) -> Properties {
    let mut out = Properties::new();
    for (side, suffix) in [(left, "_left"), (right, "_right")] {
        for (key, value) in side {
            if suffix == "_left" && key == BUFFER_COL {
                continue;
            }
            let keep_id = suffix == "_left" && key == PARCEL_COL;
            let key = if clashes.contains(key) && !keep_id {
                format!("{key}{suffix}")
            } else {
                key.clone()
            };
            out.insert(key, value.clone());
        }
    }
    out
}
