//! Browser entry point for the metro map.

use std::sync::atomic::{AtomicBool, Ordering};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

mod app;
mod config;
mod dom;
mod logging;
mod mapbox;

pub use config::{AppConfig, ConfigError, MapConfig};

// Guard against double initialization during hot reload.
static INITIALIZED: AtomicBool = AtomicBool::new(false);

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let (config, config_err) = match config::load(&window) {
        Ok(cfg) => (cfg, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::init(&config.log_filter);
    if let Some(err) = config_err {
        tracing::warn!(%err, "falling back to default configuration");
    }
    for key in config.missing_keys() {
        tracing::warn!(key, "credential not configured");
    }

    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.ready_state() != "loading" {
        return app::mount(window, config);
    }
    let mount_later = Closure::once_into_js(move || {
        if let Err(err) = app::mount(window, config) {
            tracing::error!(err = %mapbox::js_error_text(&err), "map front-end failed to start");
        }
    });
    document.add_event_listener_with_callback("DOMContentLoaded", mount_later.unchecked_ref())
}
