//! Parcel & feature GeoJSON, reshaped into frames of geometry + flat properties.

/// GeoJSON FeatureCollections into [`GeoFrame`]s.
pub mod frame;

/// Chunked "intersects" join of parcels against features.
pub mod join;

/// Per-parcel helpers over joined frames and sale records.
pub mod parcels;

pub use frame::{convert_geojson, convert_selected, GeoFrame, GeoRow, Properties};
pub use join::spatial_join;
pub use parcels::{count_for_spatial_join, date_intervals_by_parcel, ParcelSale};
