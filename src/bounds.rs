use geo::Point;
use serde::{Deserialize, Serialize, Serializer};

/// Axis-aligned lat/lng box. Points are stored as (x = lng, y = lat).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    max: Point,
    min: Point,
}

impl Bounds {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            max: Point::new(max_lng, max_lat),
            min: Point::new(min_lng, min_lat),
        }
    }

    pub fn from_point(lat: f64, lng: f64) -> Self {
        let p = Point::new(lng, lat);
        Self { max: p, min: p }
    }

    /// Grows the box to cover the coordinate, returns whether it expanded.
    pub fn add(&mut self, lat: f64, lng: f64) -> bool {
        let mut expanded = false;
        if lng > self.max.x() {
            self.max.set_x(lng);
            expanded = true;
        } else if lng < self.min.x() {
            self.min.set_x(lng);
            expanded = true;
        }
        if lat > self.max.y() {
            self.max.set_y(lat);
            expanded = true;
        } else if lat < self.min.y() {
            self.min.set_y(lat);
            expanded = true;
        }
        expanded
    }

    /// `((min_lat, min_lng), (max_lat, max_lng))`
    pub fn corners(&self) -> ((f64, f64), (f64, f64)) {
        (
            (self.min.y(), self.min.x()),
            (self.max.y(), self.max.x()),
        )
    }

    pub fn center(&self) -> Point {
        (self.min + self.max) / 2.0
    }

    pub fn is_point(&self) -> bool {
        self.min == self.max
    }
}

// serialized the way map libraries take a viewport: [[lat, lng], [lat, lng]]
impl Serialize for Bounds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ((min_lat, min_lng), (max_lat, max_lng)) = self.corners();
        [[min_lat, min_lng], [max_lat, max_lng]].serialize(serializer)
    }
}

/// Named-field form used in the config file.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct BoundsConfig {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl Default for BoundsConfig {
    // Kharkiv, where the bundled track was recorded
    fn default() -> Self {
        Self {
            min_lat: 49.9,
            min_lng: 36.2,
            max_lat: 50.0,
            max_lng: 36.4,
        }
    }
}

impl From<BoundsConfig> for Bounds {
    fn from(value: BoundsConfig) -> Self {
        Bounds::new(value.min_lat, value.min_lng, value.max_lat, value.max_lng)
    }
}
