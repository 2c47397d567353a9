//! Geocoding wire format.
//!
//! The service answers with a GeoJSON-style feature collection. Only the
//! fields the search box uses are modelled; everything else is ignored.

use foundation::LngLat;
use serde::{Deserialize, Serialize};

use crate::SearchError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocodeResponse {
    #[serde(default)]
    pub features: Vec<GeocodeFeature>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeFeature {
    /// Full display name, e.g. "12 Station St, Melton, Victoria 3337, Australia".
    pub place_name: String,
    pub geometry: PointGeometry,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointGeometry {
    pub coordinates: LngLat,
}

impl GeocodeResponse {
    pub fn from_json_str(text: &str) -> Result<Self, SearchError> {
        serde_json::from_str(text).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::GeocodeResponse;
    use foundation::LngLat;

    #[test]
    fn parses_feature_collection_and_ignores_extra_fields() {
        let text = r#"{
            "type": "FeatureCollection",
            "query": ["melton"],
            "features": [{
                "id": "place.1",
                "type": "Feature",
                "place_name": "Melton, Victoria, Australia",
                "relevance": 1,
                "center": [144.58, -37.68],
                "geometry": {"type": "Point", "coordinates": [144.58, -37.68]}
            }],
            "attribution": "x"
        }"#;
        let r = GeocodeResponse::from_json_str(text).unwrap();
        assert_eq!(r.features.len(), 1);
        assert_eq!(r.features[0].place_name, "Melton, Victoria, Australia");
        assert_eq!(r.features[0].geometry.coordinates, LngLat::new(144.58, -37.68));
    }

    #[test]
    fn missing_features_is_an_empty_result() {
        let r = GeocodeResponse::from_json_str(r#"{"type":"FeatureCollection"}"#).unwrap();
        assert!(r.features.is_empty());
    }

    #[test]
    fn error_payloads_are_decode_errors() {
        assert!(GeocodeResponse::from_json_str("<html>").is_err());
        assert!(GeocodeResponse::from_json_str(r#"{"features":[{"place_name":1}]}"#).is_err());
    }
}
