use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

use crate::options::ExportOptions;
use crate::waypoint::Waypoint;

/// Convert places to a GeoJSON FeatureCollection of Points, keeping the
/// iteration order.
pub fn to_feature_collection<'a, I>(places: I, opts: &ExportOptions) -> FeatureCollection
where
    I: IntoIterator<Item = &'a Waypoint>,
{
    let features = places
        .into_iter()
        .map(|place| place_to_feature(place, opts))
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

fn place_to_feature(place: &Waypoint, opts: &ExportOptions) -> Feature {
    // GeoJSON positions are [lon, lat]
    let geometry = Geometry::new(Value::Point(vec![place.longitude(), place.latitude()]));

    let mut props = Map::new();
    props.insert("name".to_string(), JsonValue::String(place.name().to_string()));
    props.insert(
        "sequence".to_string(),
        JsonValue::Number(place.sequence_index().into()),
    );

    if opts.include_distance && place.has_distance() {
        if let Some(n) = serde_json::Number::from_f64(place.distance) {
            props.insert("distance".to_string(), JsonValue::Number(n));
        }
    }

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}
