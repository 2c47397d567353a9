use serde::{Deserialize, Serialize};

/// A WGS84 position, serialized as `[lng, lat]` like every GeoJSON and
/// mapbox-gl coordinate pair.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        p.to_array()
    }
}

/// Axis-aligned lon/lat box, serialized as `[west, south, east, north]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct LngLatBounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl LngLatBounds {
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    pub fn contains(&self, p: LngLat) -> bool {
        p.lng >= self.west && p.lng <= self.east && p.lat >= self.south && p.lat <= self.north
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.west, self.south, self.east, self.north]
    }

    /// Comma-joined `west,south,east,north`, the form query strings expect.
    pub fn to_query_value(self) -> String {
        format!("{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl From<[f64; 4]> for LngLatBounds {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<LngLatBounds> for [f64; 4] {
    fn from(b: LngLatBounds) -> Self {
        b.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::{LngLat, LngLatBounds};

    #[test]
    fn bounds_contains_interior_and_edges() {
        let b = LngLatBounds::new(144.0, -38.0, 145.0, -37.0);
        assert!(b.contains(LngLat::new(144.5, -37.5)));
        assert!(b.contains(LngLat::new(144.0, -38.0)));
        assert!(!b.contains(LngLat::new(143.9, -37.5)));
        assert!(!b.contains(LngLat::new(144.5, -36.9)));
    }

    #[test]
    fn query_value_keeps_wsen_order() {
        let b = LngLatBounds::new(144.439004, -37.857166, 144.829723, -37.4645);
        assert_eq!(b.to_query_value(), "144.439004,-37.857166,144.829723,-37.4645");
    }

    #[test]
    fn serializes_as_plain_arrays() {
        let p = LngLat::new(144.9, -37.8);
        assert_eq!(serde_json::to_string(&p).unwrap(), "[144.9,-37.8]");
        let b: LngLatBounds = serde_json::from_str("[1.0,2.0,3.0,4.0]").unwrap();
        assert_eq!(b, LngLatBounds::new(1.0, 2.0, 3.0, 4.0));
    }
}
