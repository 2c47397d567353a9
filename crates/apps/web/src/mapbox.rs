//! Bindings for the global `mapboxgl` object and the map surface built on it.

use foundation::LngLat;
use layers::{HostError, StyleHost, Visibility};
use search::{SearchError, SearchHost};
use serde_json::{Value, json};
use theming::{MapSurface, RequestTransform};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::config::MapConfig;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl)]
    pub type Map;

    #[wasm_bindgen(constructor, catch, js_namespace = mapboxgl)]
    fn new(options: &JsValue) -> Result<Map, JsValue>;

    #[wasm_bindgen(method, js_name = isStyleLoaded)]
    fn is_style_loaded(this: &Map) -> JsValue;

    #[wasm_bindgen(method, js_name = setStyle)]
    fn set_style(this: &Map, style: &str);

    #[wasm_bindgen(method, js_name = getStyle)]
    fn get_style(this: &Map) -> JsValue;

    #[wasm_bindgen(method, js_name = getLayer)]
    fn get_layer(this: &Map, id: &str) -> JsValue;

    #[wasm_bindgen(method, js_name = getSource)]
    fn get_source(this: &Map, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = addSource)]
    fn add_source(this: &Map, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = addLayer)]
    fn add_layer(this: &Map, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeLayer)]
    fn remove_layer(this: &Map, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeSource)]
    fn remove_source(this: &Map, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = setLayoutProperty)]
    fn set_layout_property(this: &Map, layer: &str, name: &str, value: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = flyTo)]
    fn fly_to(this: &Map, options: &JsValue);

    #[wasm_bindgen(method, catch, js_name = addControl)]
    fn add_control(this: &Map, control: &JsValue, position: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Map, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method)]
    pub fn once(this: &Map, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method)]
    pub fn off(this: &Map, event: &str, listener: &js_sys::Function);
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl)]
    type NavigationControl;

    #[wasm_bindgen(constructor, catch, js_namespace = mapboxgl)]
    fn new() -> Result<NavigationControl, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = mapboxgl)]
    pub type Marker;

    #[wasm_bindgen(constructor, catch, js_namespace = mapboxgl)]
    fn new() -> Result<Marker, JsValue>;

    #[wasm_bindgen(method, js_name = setLngLat)]
    fn set_lng_lat(this: &Marker, lng_lat: &JsValue);

    #[wasm_bindgen(method, js_name = addTo)]
    fn add_to(this: &Marker, map: &Map);

    #[wasm_bindgen(method)]
    fn remove(this: &Marker);
}

/// Best-effort text for a thrown JS value.
pub fn js_error_text(err: &JsValue) -> String {
    if let Some(e) = err.dyn_ref::<js_sys::Error>() {
        return String::from(e.message());
    }
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn to_js(value: &Value) -> Result<JsValue, JsValue> {
    js_sys::JSON::parse(&value.to_string())
}

fn renderer_error(err: JsValue) -> HostError {
    HostError::Renderer(js_error_text(&err))
}

/// Sets `key` on a plain options object built here.
fn set_field(obj: &js_sys::Object, key: &str, value: &JsValue) {
    if let Err(err) = js_sys::Reflect::set(obj, &JsValue::from_str(key), value) {
        tracing::debug!(key, err = %js_error_text(&err), "option not set");
    }
}

fn lng_lat_js(p: LngLat) -> JsValue {
    let arr = js_sys::Array::new();
    arr.push(&JsValue::from_f64(p.lng));
    arr.push(&JsValue::from_f64(p.lat));
    arr.into()
}

/// `transformRequest` callback: `(url, resourceType) => { url, referrerPolicy? }`.
fn transform_request_fn(transform: RequestTransform) -> JsValue {
    let cb = Closure::<dyn Fn(JsValue, JsValue) -> JsValue>::new(move |url: JsValue, kind: JsValue| {
        let url = url.as_string().unwrap_or_default();
        let kind = kind.as_string().unwrap_or_default();
        let out = transform.apply(&url, &kind);
        let obj = js_sys::Object::new();
        set_field(&obj, "url", &JsValue::from_str(out.url));
        if let Some(policy) = out.referrer_policy {
            set_field(&obj, "referrerPolicy", &JsValue::from_str(policy));
        }
        obj.into()
    });
    // Lives as long as the map.
    cb.into_js_value()
}

/// The page's single mapbox-gl map.
pub struct MapboxSurface {
    map: Map,
}

impl std::fmt::Debug for MapboxSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapboxSurface").finish_non_exhaustive()
    }
}

impl MapboxSurface {
    pub fn create(
        config: &MapConfig,
        style_url: &str,
        transform: RequestTransform,
    ) -> Result<Self, JsValue> {
        let camera = &config.camera;
        let options = to_js(&json!({
            "container": config.container,
            "accessToken": config.access_token,
            "style": style_url,
            "center": camera.center,
            "zoom": camera.zoom,
            "pitch": camera.pitch,
            "bearing": camera.bearing,
        }))?;
        js_sys::Reflect::set(&options, &"transformRequest".into(), &transform_request_fn(transform))?;
        let map = Map::new(&options)?;
        tracing::info!(container = %config.container, style = style_url, "map created");
        Ok(Self { map })
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn add_navigation_control(&self, position: &str) -> Result<(), JsValue> {
        let control = NavigationControl::new()?;
        self.map.add_control(&control, position)
    }

    /// A field of the serialized style, or `undefined` while no style is set.
    fn style_field(&self, name: &str) -> JsValue {
        let style = self.map.get_style();
        if !style.is_object() {
            return JsValue::UNDEFINED;
        }
        js_sys::Reflect::get(&style, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
    }
}

impl StyleHost for MapboxSurface {
    fn layer_ids(&self) -> Vec<String> {
        let layers = self.style_field("layers");
        let Some(layers) = layers.dyn_ref::<js_sys::Array>() else {
            return Vec::new();
        };
        layers
            .iter()
            .filter_map(|l| js_sys::Reflect::get(&l, &"id".into()).ok())
            .filter_map(|id| id.as_string())
            .collect()
    }

    fn source_ids(&self) -> Vec<String> {
        let sources = self.style_field("sources");
        let Some(sources) = sources.dyn_ref::<js_sys::Object>() else {
            return Vec::new();
        };
        js_sys::Object::keys(sources)
            .iter()
            .filter_map(|k| k.as_string())
            .collect()
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.map.get_layer(id).is_undefined()
    }

    fn has_source(&self, id: &str) -> bool {
        !self.map.get_source(id).is_undefined()
    }

    fn add_source(&mut self, id: &str, source: &Value) -> Result<(), HostError> {
        let source = to_js(source).map_err(renderer_error)?;
        self.map.add_source(id, &source).map_err(renderer_error)
    }

    fn add_layer(&mut self, layer: &Value) -> Result<(), HostError> {
        let layer = to_js(layer).map_err(renderer_error)?;
        self.map.add_layer(&layer).map_err(renderer_error)
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), HostError> {
        self.map.remove_layer(id).map_err(renderer_error)
    }

    fn remove_source(&mut self, id: &str) -> Result<(), HostError> {
        self.map.remove_source(id).map_err(renderer_error)
    }

    fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<(), HostError> {
        self.map
            .set_layout_property(id, "visibility", &JsValue::from_str(visibility.as_str()))
            .map_err(renderer_error)
    }
}

impl MapSurface for MapboxSurface {
    fn is_style_loaded(&self) -> bool {
        // `undefined` before the first style is attached.
        self.map.is_style_loaded().is_truthy()
    }

    fn set_style(&mut self, url: &str) {
        self.map.set_style(url);
    }
}

impl SearchHost for MapboxSurface {
    type Marker = Marker;

    fn add_marker(&mut self, at: LngLat) -> Result<Marker, SearchError> {
        let marker = Marker::new().map_err(|e| SearchError::Marker(js_error_text(&e)))?;
        marker.set_lng_lat(&lng_lat_js(at));
        marker.add_to(&self.map);
        Ok(marker)
    }

    fn remove_marker(&mut self, marker: Marker) {
        marker.remove();
    }

    fn fly_to(&mut self, center: LngLat, zoom: f64) {
        let obj = js_sys::Object::new();
        set_field(&obj, "center", &lng_lat_js(center));
        set_field(&obj, "zoom", &JsValue::from_f64(zoom));
        self.map.fly_to(&obj);
    }
}
