//! GeoJSON for map layers: the path as a line plus start and end markers.

use geo_types::LineString;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde_json::json;

use crate::{bounds::Bounds, sample::Sample};

pub fn feature_collection(samples: &[Sample]) -> FeatureCollection {
    let mut features = Vec::new();

    if samples.len() >= 2 {
        let line: LineString = samples.iter().map(Sample::point).collect();
        let mut properties = JsonObject::new();
        properties.insert("role".into(), json!("path"));
        properties.insert("points".into(), json!(samples.len()));
        features.push(feature(Value::from(&line), properties));
    }

    if let (Some(first), Some(last)) = (samples.first(), samples.last()) {
        features.push(marker(first, "start"));
        features.push(marker(last, "end"));
    }

    FeatureCollection {
        bbox: bbox(samples),
        features,
        foreign_members: None,
    }
}

fn marker(sample: &Sample, role: &str) -> Feature {
    let mut properties = JsonObject::new();
    properties.insert("role".into(), json!(role));
    properties.insert("time".into(), json!(sample.time));
    properties.insert("timestamp".into(), json!(sample.timestamp));
    if let Some(odometer) = sample.odometer {
        properties.insert("odometer".into(), json!(odometer));
    }
    feature(Value::from(&sample.point()), properties)
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

// GeoJSON bbox order is [west, south, east, north]
fn bbox(samples: &[Sample]) -> Option<Vec<f64>> {
    let (first, rest) = samples.split_first()?;
    let mut bounds = Bounds::from_point(first.latitude, first.longitude);
    for s in rest {
        bounds.add(s.latitude, s.longitude);
    }
    let ((min_lat, min_lng), (max_lat, max_lng)) = bounds.corners();
    Some(vec![min_lng, min_lat, max_lng, max_lat])
}
