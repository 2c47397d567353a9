use foundation::LngLat;
use layers::StyleHost;
use serde::{Deserialize, Serialize};

/// The map instance as the style controller sees it.
pub trait MapSurface: StyleHost {
    /// Whether the current style has finished loading.
    fn is_style_loaded(&self) -> bool;
    /// Replaces the whole style. Every source and layer is discarded and a
    /// load signal follows asynchronously.
    fn set_style(&mut self, url: &str);
}

/// Initial camera.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraOptions {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            center: LngLat::new(144.6261962, -37.712486),
            zoom: 11.5,
            pitch: 40.0,
            bearing: 5.0,
        }
    }
}

/// Rewrites outgoing tile requests before the renderer issues them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestTransform {
    /// Tile requests whose URL contains this are given `referrer_policy`.
    pub host: String,
    pub referrer_policy: String,
}

impl Default for RequestTransform {
    fn default() -> Self {
        Self {
            host: "https://api.nearmap.com".to_string(),
            referrer_policy: "origin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedRequest<'a> {
    pub url: &'a str,
    pub referrer_policy: Option<&'a str>,
}

impl RequestTransform {
    pub fn apply<'a>(&'a self, url: &'a str, resource_type: &str) -> TransformedRequest<'a> {
        let matches = resource_type == "Tile" && !self.host.is_empty() && url.contains(&self.host);
        TransformedRequest {
            url,
            referrer_policy: matches.then_some(self.referrer_policy.as_str()),
        }
    }
}
