use serde_json::{Value, json};

use crate::raster::RasterSource;
use crate::symbology::{Expression, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A raster layer together with the source it draws from.
///
/// Style swaps throw away every source and layer, so the descriptor carries
/// everything needed to recreate both.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerDescriptor {
    pub id: LayerId,
    pub source_id: String,
    pub source: RasterSource,
    pub opacity: Expression,
    pub visibility: Visibility,
}

impl LayerDescriptor {
    pub fn source_json(&self) -> Value {
        self.source.to_json()
    }

    pub fn layer_json(&self) -> Value {
        json!({
            "id": self.id.as_str(),
            "source": self.source_id,
            "type": "raster",
            "paint": {
                "raster-opacity": self.opacity.to_json(),
            },
            "layout": {
                "visibility": self.visibility.as_str(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::raster::AerialConfig;

    #[test]
    fn aerial_layer_json_matches_renderer_shape() {
        let d = AerialConfig::default().descriptor();
        assert_eq!(
            d.layer_json(),
            json!({
                "id": "Nearmap_Layer",
                "source": "Nearmap_Source",
                "type": "raster",
                "paint": {
                    "raster-opacity": ["interpolate", ["exponential", 1.5], ["zoom"], 15.0, 0.0, 17.0, 1.0],
                },
                "layout": { "visibility": "visible" },
            })
        );
    }
}
