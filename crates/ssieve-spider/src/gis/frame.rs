use geojson::{Feature, FeatureCollection, GeoJson};
use serde_json::Value;
use std::borrow::Cow;
use tracing::trace;

/// Flat property columns of a row, keyed by column name.
pub type Properties = serde_json::Map<String, Value>;

/// Property holding a buffered parcel geometry (a GeoJSON geometry object); when present,
/// joins match features against it instead of the row's own geometry.
pub const BUFFER_COL: &str = "buff_dist";

/// One feature: its geometry, and its properties as flat columns.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoRow {
    pub geometry: geo::Geometry<f64>,
    pub properties: Properties,
}

impl GeoRow {
    /// Property `col` rendered as a string (strings unquoted); `None` when absent.
    pub fn text(&self, col: &str) -> Option<String> {
        self.properties.get(col).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The geometry joins match against: the buffered geometry when the row has one.
    pub fn match_geometry(&self) -> crate::Result<Cow<'_, geo::Geometry<f64>>> {
        match self.properties.get(BUFFER_COL) {
            Some(value) => {
                let buffered = geojson::Geometry::from_json_value(value.clone())?;
                Ok(Cow::Owned(geo::Geometry::<f64>::try_from(buffered.value)?))
            }
            None => Ok(Cow::Borrowed(&self.geometry)),
        }
    }
}

/// A frame of geometries with property columns; row order is the feature order of the
/// source collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeoFrame {
    pub rows: Vec<GeoRow>,
}

impl GeoFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Convert a GeoJSON FeatureCollection into a [`GeoFrame`], with every property as a column.
///
/// Nested property objects are flattened into dotted column names, e.g.
/// `{"owner": {"name": "X"}}` becomes the column `owner.name`. A top-level [`BUFFER_COL`]
/// geometry is kept whole.
pub fn convert_geojson(text: &str) -> crate::Result<GeoFrame> {
    let collection = parse_collection(text)?;
    let rows = collection
        .features
        .into_iter()
        .map(|feature| {
            let (geometry, properties) = split_feature(feature)?;
            let mut flat = Properties::new();
            flatten_into(&mut flat, None, properties.unwrap_or_default());
            Ok(GeoRow {
                geometry,
                properties: flat,
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    trace!("converted {} features", rows.len());
    Ok(GeoFrame { rows })
}

/// Convert a GeoJSON FeatureCollection into a [`GeoFrame`], keeping only the property columns
/// named in `cols`. A feature missing one of `cols` is an error.
pub fn convert_selected<S: AsRef<str>>(text: &str, cols: &[S]) -> crate::Result<GeoFrame> {
    let collection = parse_collection(text)?;
    let rows = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(i, feature)| {
            let (geometry, properties) = split_feature(feature)?;
            let mut properties = properties.unwrap_or_default();
            let mut selected = Properties::new();
            for col in cols {
                let col = col.as_ref();
                let value = properties.remove(col).ok_or_else(|| {
                    crate::Error::malformed("GeoJSON feature", format!("feature {i} has no property {col:?}"))
                })?;
                selected.insert(col.to_string(), value);
            }
            Ok(GeoRow {
                geometry,
                properties: selected,
            })
        })
        .collect::<crate::Result<Vec<_>>>()?;

    Ok(GeoFrame { rows })
}

fn parse_collection(text: &str) -> crate::Result<FeatureCollection> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) => Err(crate::Error::malformed(
            "GeoJSON",
            "expected a FeatureCollection, got a Feature",
        )),
        GeoJson::Geometry(_) => Err(crate::Error::malformed(
            "GeoJSON",
            "expected a FeatureCollection, got a Geometry",
        )),
    }
}

fn split_feature(feature: Feature) -> crate::Result<(geo::Geometry<f64>, Option<Properties>)> {
    let geometry = feature
        .geometry
        .ok_or_else(|| crate::Error::malformed("GeoJSON feature", "feature has no geometry"))?;
    let geometry = geo::Geometry::<f64>::try_from(geometry.value)?;
    Ok((geometry, feature.properties))
}

fn flatten_into(out: &mut Properties, prefix: Option<&str>, properties: Properties) {
    for (key, value) in properties {
        let key = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key,
        };
        match value {
            Value::Object(nested) if !(prefix.is_none() && key == BUFFER_COL) => {
                flatten_into(out, Some(&key), nested)
            }
            value => {
                out.insert(key, value);
            }
        }
    }
}
