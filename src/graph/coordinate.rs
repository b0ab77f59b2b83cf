//! Geographic coordinates and conservative range boxes.

use serde::{Deserialize, Serialize};

/// Mean equatorial Earth radius in kilometres used for destination points.
pub const EARTH_RADIUS_KM: f64 = 6378.1;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Longitude in degrees.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from longitude and latitude (in that order).
    pub const fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Great-circle destination reached from `self` after travelling
    /// `distance_m` metres along the initial `bearing` (radians, clockwise from north).
    pub fn destination(&self, bearing: f64, distance_m: f64) -> Self {
        let angular = (distance_m / 1000.0) / EARTH_RADIUS_KM;
        let lat0 = self.latitude.to_radians();
        let lng0 = self.longitude.to_radians();

        let lat = (lat0.sin() * angular.cos() + lat0.cos() * angular.sin() * bearing.cos()).asin();
        let lng = lng0
            + (bearing.sin() * angular.sin() * lat0.cos()).atan2(angular.cos() - lat0.sin() * lat.sin());

        Self::new(lng.to_degrees(), lat.to_degrees())
    }

    /// Axis-aligned box enclosing the destination points at the four cardinal
    /// bearings. This is a superset of the true circle of radius `radius_m`.
    pub fn bounding_box(&self, radius_m: f64) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        for bearing in [0.0_f64, 90.0, 180.0, 270.0] {
            bbox.include(self.destination(bearing.to_radians(), radius_m));
        }
        bbox
    }
}

/// Closed longitude/latitude rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge.
    pub min_lng: f64,
    /// Southern edge.
    pub min_lat: f64,
    /// Eastern edge.
    pub max_lng: f64,
    /// Northern edge.
    pub max_lat: f64,
}

impl BoundingBox {
    /// An inverted box that contains nothing until a point is included.
    pub const fn empty() -> Self {
        Self {
            min_lng: f64::MAX,
            min_lat: f64::MAX,
            max_lng: f64::MIN,
            max_lat: f64::MIN,
        }
    }

    /// Grows the box to cover `point`.
    pub fn include(&mut self, point: Coordinate) {
        self.min_lng = self.min_lng.min(point.longitude);
        self.max_lng = self.max_lng.max(point.longitude);
        self.min_lat = self.min_lat.min(point.latitude);
        self.max_lat = self.max_lat.max(point.latitude);
    }

    /// Returns `true` if `point` lies inside or on the edge of the box.
    pub fn contains(&self, point: Coordinate) -> bool {
        point.longitude >= self.min_lng
            && point.longitude <= self.max_lng
            && point.latitude >= self.min_lat
            && point.latitude <= self.max_lat
    }
}
