use foundation::LngLatBounds;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::layer::{LayerDescriptor, LayerId};
use crate::symbology::{Expression, Visibility};

/// A raster tile feed as the renderer's `addSource` expects it.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSource {
    pub tiles: Vec<String>,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub bounds: LngLatBounds,
}

impl RasterSource {
    pub fn to_json(&self) -> Value {
        json!({
            "type": "raster",
            "tiles": self.tiles,
            "minzoom": self.min_zoom,
            "maxzoom": self.max_zoom,
            "bounds": self.bounds.to_array(),
        })
    }
}

/// Aerial imagery overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AerialConfig {
    pub layer_id: String,
    pub source_id: String,
    /// Tile URL with `{z}/{x}/{y}` placeholders and an `{apikey}` placeholder.
    pub tile_template: String,
    pub api_key: String,
    pub bounds: LngLatBounds,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub fade_base: f64,
    pub fade_start_zoom: f64,
    pub fade_end_zoom: f64,
}

impl Default for AerialConfig {
    fn default() -> Self {
        Self {
            layer_id: "Nearmap_Layer".to_string(),
            source_id: "Nearmap_Source".to_string(),
            tile_template: "https://api.nearmap.com/tiles/v3/Vert/{z}/{x}/{y}.png?apikey={apikey}"
                .to_string(),
            api_key: String::new(),
            bounds: LngLatBounds::new(
                144.4667201638995,
                -37.81836486637397,
                144.78127999196013,
                -37.54203040304009,
            ),
            min_zoom: 16,
            max_zoom: 22,
            fade_base: 1.5,
            fade_start_zoom: 15.0,
            fade_end_zoom: 17.0,
        }
    }
}

impl AerialConfig {
    pub fn tile_url(&self) -> String {
        self.tile_template.replace("{apikey}", &self.api_key)
    }

    pub fn descriptor(&self) -> LayerDescriptor {
        LayerDescriptor {
            id: LayerId::new(self.layer_id.clone()),
            source_id: self.source_id.clone(),
            source: RasterSource {
                tiles: vec![self.tile_url()],
                min_zoom: self.min_zoom,
                max_zoom: self.max_zoom,
                bounds: self.bounds,
            },
            opacity: Expression::ZoomExponential {
                base: self.fade_base,
                stops: vec![(self.fade_start_zoom, 0.0), (self.fade_end_zoom, 1.0)],
            },
            visibility: Visibility::Visible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AerialConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn tile_url_substitutes_key_only() {
        let cfg = AerialConfig {
            api_key: "k123".to_string(),
            ..AerialConfig::default()
        };
        assert_eq!(
            cfg.tile_url(),
            "https://api.nearmap.com/tiles/v3/Vert/{z}/{x}/{y}.png?apikey=k123"
        );
    }

    #[test]
    fn source_json_carries_fixed_zoom_range_and_bounds() {
        let d = AerialConfig::default().descriptor();
        let src = d.source_json();
        assert_eq!(src["type"], json!("raster"));
        assert_eq!(src["minzoom"], json!(16));
        assert_eq!(src["maxzoom"], json!(22));
        assert_eq!(
            src["bounds"],
            json!([144.4667201638995, -37.81836486637397, 144.78127999196013, -37.54203040304009])
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: AerialConfig = serde_json::from_str(r#"{"api_key":"abc"}"#).unwrap();
        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.min_zoom, 16);
        assert_eq!(cfg.layer_id, "Nearmap_Layer");
    }
}
