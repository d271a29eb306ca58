use colored::Colorize;
use ssieve_spider::fs::read_text;
use ssieve_spider::gis::{self, parcels::PARCEL_COL};
use std::path::Path;
use tracing::{debug, info};

/// Join the parcels against the features and print, per parcel, how many features touch it.
pub(crate) async fn run(
    parcels: &Path,
    features: &Path,
    batch: usize,
    name_col: &str,
    address_col: &str,
) -> anyhow::Result<()> {
    let time = std::time::Instant::now();
    let parcels = gis::convert_geojson(&read_text(parcels).await?)?;
    let features = gis::convert_geojson(&read_text(features).await?)?;
    debug!("{} parcels, {} features", parcels.len(), features.len());

    let search: Vec<String> = parcels
        .rows
        .iter()
        .filter_map(|row| row.text(PARCEL_COL))
        .collect();
    if search.len() < parcels.len() {
        anyhow::bail!("every parcel needs a {PARCEL_COL:?} property");
    }

    let joined = gis::spatial_join(&parcels, &features, batch)?;
    let counts = gis::count_for_spatial_join(&search, &joined, name_col, address_col)?;

    println!("{}", format!("{PARCEL_COL}\t{name_col}").bold());
    for (parcel, count) in counts {
        println!("{parcel}\t{count}");
    }
    info!("parcels counted, time elapsed: {:?}", time.elapsed());
    Ok(())
}
