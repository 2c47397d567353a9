use layers::AerialConfig;
use prefs::ThemePreference;
use search::GeocodeConfig;
use serde::{Deserialize, Serialize};
use theming::{CameraOptions, RequestTransform, StyleTable};
use wasm_bindgen::JsValue;

/// Name of the optional page-level override object.
pub const CONFIG_GLOBAL: &str = "__metroMapConfig";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading window.__metroMapConfig failed: {0}")]
    Js(String),
    #[error("window.__metroMapConfig is not valid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Id of the element the map renders into.
    pub container: String,
    pub access_token: String,
    pub camera: CameraOptions,
    pub navigation_position: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: "map".to_string(),
            access_token: String::new(),
            camera: CameraOptions::default(),
            navigation_position: "bottom-right".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub map: MapConfig,
    pub styles: StyleTable,
    pub aerial: AerialConfig,
    pub geocode: GeocodeConfig,
    pub transform: RequestTransform,
    /// Used when no preference has been stored yet.
    pub default_theme: ThemePreference,
    pub style_load_timeout_ms: u32,
    pub notice_duration_ms: u32,
    /// Prepended to the `theme` storage key.
    pub storage_prefix: String,
    /// `tracing_subscriber::EnvFilter` directives.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            styles: StyleTable::default(),
            aerial: AerialConfig::default(),
            geocode: GeocodeConfig::default(),
            transform: RequestTransform::default(),
            default_theme: ThemePreference::Auto,
            style_load_timeout_ms: 10_000,
            notice_duration_ms: 4_000,
            storage_prefix: String::new(),
            log_filter: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Parses a (possibly partial) override on top of the defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: AppConfig = serde_json::from_str(text)?;
        Ok(cfg.normalized())
    }

    /// The geocoder shares the map token unless it was given its own.
    fn normalized(mut self) -> Self {
        if self.geocode.access_token.is_empty() {
            self.geocode.access_token = self.map.access_token.clone();
        }
        self
    }

    /// Names of credentials that are still empty.
    pub fn missing_keys(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.map.access_token.is_empty() {
            out.push("map.access_token");
        }
        if self.aerial.api_key.is_empty() {
            out.push("aerial.api_key");
        }
        out
    }
}

/// Reads `window.__metroMapConfig`, falling back to defaults when the page
/// does not define it.
pub fn load(window: &web_sys::Window) -> Result<AppConfig, ConfigError> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|e| ConfigError::Js(format!("{e:?}")))?;
    if value.is_undefined() || value.is_null() {
        return Ok(AppConfig::default().normalized());
    }
    let text = js_sys::JSON::stringify(&value).map_err(|e| ConfigError::Js(format!("{e:?}")))?;
    AppConfig::from_json_str(&String::from(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_override_is_the_default() {
        let cfg = AppConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.default_theme, ThemePreference::Auto);
        assert_eq!(cfg.style_load_timeout_ms, 10_000);
        assert_eq!(cfg.map.camera.zoom, 11.5);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let cfg = AppConfig::from_json_str(
            r#"{
                "map": {"access_token": "pk.x", "camera": {"zoom": 13}},
                "aerial": {"api_key": "nm"},
                "default_theme": "dark",
                "log_filter": "debug"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.map.container, "map");
        assert_eq!(cfg.map.camera.zoom, 13.0);
        assert_eq!(cfg.map.camera.pitch, 40.0);
        assert_eq!(cfg.aerial.min_zoom, 16);
        assert_eq!(cfg.default_theme, ThemePreference::Dark);
        assert_eq!(cfg.log_filter, "debug");
        assert!(cfg.missing_keys().is_empty());
    }

    #[test]
    fn geocoder_inherits_map_token() {
        let cfg = AppConfig::from_json_str(r#"{"map": {"access_token": "pk.x"}}"#).unwrap();
        assert_eq!(cfg.geocode.access_token, "pk.x");

        let own = AppConfig::from_json_str(
            r#"{"map": {"access_token": "pk.x"}, "geocode": {"access_token": "pk.g"}}"#,
        )
        .unwrap();
        assert_eq!(own.geocode.access_token, "pk.g");
    }

    #[test]
    fn reports_missing_credentials() {
        assert_eq!(
            AppConfig::default().missing_keys(),
            vec!["map.access_token", "aerial.api_key"]
        );
    }

    #[test]
    fn rejects_bad_theme() {
        assert!(AppConfig::from_json_str(r#"{"default_theme": "sepia"}"#).is_err());
    }
}
