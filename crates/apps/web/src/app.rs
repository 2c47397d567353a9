//! Browser event wiring.
//!
//! All state lives in one [`App`] behind `Rc<RefCell<_>>`. Every listener
//! holds a handle to it and borrows it for the duration of a single event;
//! follow-up work that registers new listeners runs after the borrow ends.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use foundation::Generation;
use gloo_net::http::Request;
use layers::{LayerRegistry, LegendVisibility};
use prefs::{
    InMemoryPreferenceStore, LocalStoragePreferenceStore, MediaQueryColorScheme, PreferenceStore,
    Preferences, PrefsError, ThemePreference,
};
use runtime::Notice;
use search::{
    GeocodeRequest, GeocodeResponse, InputAction, ResponseOutcome, SearchError, SearchSession,
};
use theming::{
    FailureOutcome, LoadFailure, LoadHooks, LoadOutcome, LoadWatch, MapSurface,
    StyleSwitchController, SwitchStep, ThemeBinding, ThemeChrome, ViewMode,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{
    AbortController, AbortSignal, Element, Event, EventTarget, HtmlElement, HtmlInputElement, Window,
};

use crate::config::AppConfig;
use crate::dom::{LEGEND_KEY_SELECTOR, PageDom, SUGGESTION_CLASS};
use crate::mapbox::{Map, MapboxSurface, Marker, js_error_text};

const STYLE_LOAD: &str = "style.load";

type Shared = Rc<RefCell<App>>;

/// A one-shot callback owned on the Rust side; dropping it frees it.
type Callback = Closure<dyn FnMut()>;

/// `localStorage` when the browser allows it, memory otherwise.
#[derive(Debug)]
enum PageStore {
    Local(LocalStoragePreferenceStore),
    Memory(InMemoryPreferenceStore),
}

impl PageStore {
    fn new(prefix: &str) -> Self {
        match LocalStoragePreferenceStore::new(prefix) {
            Ok(s) => PageStore::Local(s),
            Err(err) => {
                tracing::warn!(%err, "localStorage unavailable; theme choice will not persist");
                PageStore::Memory(InMemoryPreferenceStore::new())
            }
        }
    }
}

impl PreferenceStore for PageStore {
    fn read(&self, key: &str) -> Result<Option<String>, PrefsError> {
        match self {
            PageStore::Local(s) => s.read(key),
            PageStore::Memory(s) => s.read(key),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        match self {
            PageStore::Local(s) => s.write(key, value),
            PageStore::Memory(s) => s.write(key, value),
        }
    }
}

/// `style.load` listeners on the map, timeouts on the window.
struct MapLoadHooks<'a> {
    app: &'a Weak<RefCell<App>>,
    map: &'a Map,
    window: &'a Window,
    timeout_ms: i32,
}

impl LoadHooks for MapLoadHooks<'_> {
    type Listener = Callback;
    type Timer = (Option<i32>, Callback);

    fn listen(&mut self, generation: Generation) -> Callback {
        let cb = once_callback(self.app, move |app| on_style_loaded(app, generation));
        self.map.once(STYLE_LOAD, cb.as_ref().unchecked_ref());
        cb
    }

    fn start_timer(&mut self, generation: Generation) -> (Option<i32>, Callback) {
        let cb = once_callback(self.app, move |app| {
            fail_load(app, generation, LoadFailure::TimedOut);
        });
        let handle = match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                self.timeout_ms,
            ) {
            Ok(handle) => Some(handle),
            Err(err) => {
                tracing::warn!(err = %js_error_text(&err), "style load timeout not armed");
                None
            }
        };
        (handle, cb)
    }

    fn unlisten(&mut self, listener: Callback) {
        self.map.off(STYLE_LOAD, listener.as_ref().unchecked_ref());
    }

    fn cancel_timer(&mut self, (handle, _cb): (Option<i32>, Callback)) {
        if let Some(handle) = handle {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

pub struct App {
    this: Weak<RefCell<App>>,
    window: Window,
    surface: MapboxSurface,
    controller: StyleSwitchController,
    binding: ThemeBinding<PageStore, MediaQueryColorScheme>,
    search: SearchSession<Marker>,
    dom: PageDom,
    style_timeout_ms: i32,
    notice_ms: i32,
    loads: LoadWatch<Callback, (Option<i32>, Callback)>,
    continuation: Option<Callback>,
    in_flight: Option<AbortController>,
    notice_timer: Option<(i32, Callback)>,
}

impl App {
    fn with_load_hooks<R>(
        &mut self,
        f: impl FnOnce(&mut LoadWatch<Callback, (Option<i32>, Callback)>, &mut MapLoadHooks<'_>) -> R,
    ) -> R {
        let mut hooks = MapLoadHooks {
            app: &self.this,
            map: self.surface.map(),
            window: &self.window,
            timeout_ms: self.style_timeout_ms,
        };
        f(&mut self.loads, &mut hooks)
    }

    fn settle_load(&mut self, generation: Generation) -> bool {
        self.with_load_hooks(|loads, hooks| loads.settle(hooks, generation))
    }

    fn abort_search(&mut self) {
        if let Some(c) = self.in_flight.take() {
            c.abort();
        }
    }

    fn render_suggestions(&self) {
        if let Err(err) = self.dom.render_suggestions(self.search.panel()) {
            tracing::warn!(err = %js_error_text(&err), "could not render suggestions");
        }
    }

    /// Newest pending notice across components; older ones are dropped.
    fn take_notice(&mut self) -> Option<Notice> {
        let mut all = self.controller.drain_notices();
        all.extend(self.search.drain_notices());
        all.pop()
    }
}

fn clamp_ms(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

pub fn mount(window: Window, config: AppConfig) -> Result<(), JsValue> {
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let mut dom = PageDom::query(&document)?;

    let prefs = Preferences::new(
        PageStore::new(&config.storage_prefix),
        MediaQueryColorScheme,
        config.default_theme,
    );
    let binding = ThemeBinding::new(prefs, ViewMode::from_toggle(dom.view_toggle_active()));
    dom.set_button_states(&binding.button_states());
    dom.apply_palette(&binding.palette());

    let registry = LayerRegistry::new(vec![config.aerial.descriptor()]);
    let legend = LegendVisibility::new(dom.legend_layer_ids());
    let mut controller = StyleSwitchController::new(config.styles.clone(), registry, legend);
    let ticket = controller.attach(binding.key());

    let surface =
        MapboxSurface::create(&config.map, &ticket.selection.url, config.transform.clone())?;
    if let Err(err) = surface.add_navigation_control(&config.map.navigation_position) {
        tracing::warn!(err = %js_error_text(&err), "navigation control not added");
    }

    let generation = ticket.generation;
    tracing::debug!(%generation, url = %ticket.selection.url, "waiting for initial style");
    let app = Rc::new_cyclic(|this| {
        RefCell::new(App {
            this: this.clone(),
            window,
            surface,
            controller,
            binding,
            search: SearchSession::new(config.geocode.clone()),
            dom,
            style_timeout_ms: clamp_ms(config.style_load_timeout_ms),
            notice_ms: clamp_ms(config.notice_duration_ms),
            loads: LoadWatch::new(),
            continuation: None,
            in_flight: None,
            notice_timer: None,
        })
    });

    bind_map_errors(&app);
    bind_theme_controls(&app)?;
    bind_search(&app)?;
    bind_legend(&app)?;
    arm_load(&app, generation, true);
    Ok(())
}

fn listen<F>(target: &EventTarget, event: &str, app: &Shared, mut handler: F) -> Result<(), JsValue>
where
    F: FnMut(&Shared, &Event) + 'static,
{
    let app = Rc::clone(app);
    let cb = Closure::<dyn FnMut(Event)>::new(move |ev: Event| handler(&app, &ev));
    target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
    // Page-lifetime listener.
    cb.forget();
    Ok(())
}

/// A one-shot callback that runs `f` against the app if it still exists.
/// The caller keeps it alive until it fires or is cancelled.
fn once_callback<F>(app: &Weak<RefCell<App>>, f: F) -> Callback
where
    F: FnOnce(&Shared) + 'static,
{
    let weak = app.clone();
    Closure::once(move || {
        if let Some(app) = weak.upgrade() {
            f(&app);
        }
    })
}

fn bind_map_errors(app: &Shared) {
    let weak = Rc::downgrade(app);
    let cb = Closure::<dyn FnMut(JsValue)>::new(move |ev: JsValue| {
        let err = js_sys::Reflect::get(&ev, &"error".into())
            .ok()
            .filter(|e| !e.is_undefined())
            .unwrap_or(ev);
        let message = js_error_text(&err);
        tracing::warn!(err = %message, "map error");
        if let Some(app) = weak.upgrade() {
            on_map_error(&app, message);
        }
    });
    app.borrow().surface.map().on("error", cb.as_ref().unchecked_ref());
    cb.forget();
}

/// An error while a style is still loading fails that load.
fn on_map_error(app: &Shared, message: String) {
    // Errors raised synchronously from our own map calls arrive mid-borrow;
    // those calls report through their own results.
    let generation = match app.try_borrow() {
        Ok(a) if !a.surface.is_style_loaded() => a.loads.generation(),
        _ => None,
    };
    if let Some(generation) = generation {
        fail_load(app, generation, LoadFailure::Error(message));
    }
}

fn bind_theme_controls(app: &Shared) -> Result<(), JsValue> {
    let (buttons, toggle) = {
        let a = app.borrow();
        (a.dom.theme_buttons().to_vec(), a.dom.view_toggle().cloned())
    };
    for (pref, button) in buttons {
        listen(&button, "click", app, move |app, _| on_theme_click(app, pref))?;
    }
    if let Some(toggle) = toggle {
        listen(&toggle, "click", app, |app, _| on_view_toggle(app))?;
    }
    Ok(())
}

fn bind_search(app: &Shared) -> Result<(), JsValue> {
    let (input, panel) = {
        let a = app.borrow();
        (a.dom.address().clone(), a.dom.suggestions().clone())
    };
    listen(&input, "input", app, |app, _| on_address_input(app))?;
    listen(&panel, "click", app, on_suggestion_click)?;
    listen(&panel, "mouseover", app, |app, ev| on_suggestion_hover(app, ev, true))?;
    listen(&panel, "mouseout", app, |app, ev| on_suggestion_hover(app, ev, false))?;
    Ok(())
}

fn bind_legend(app: &Shared) -> Result<(), JsValue> {
    let document = app.borrow().dom.document().clone();
    listen(&document, "change", app, on_legend_change)
}

fn drive(app: &Shared, step: SwitchStep) {
    match step {
        SwitchStep::Started(ticket) => {
            tracing::debug!(generation = %ticket.generation, url = %ticket.selection.url, "waiting for style load");
            arm_load(app, ticket.generation, true);
        }
        SwitchStep::Deferred {
            arm_continuation: true,
        } => arm_continuation(app),
        SwitchStep::Deferred { .. } | SwitchStep::Queued | SwitchStep::Unchanged => {}
    }
}

/// Arms the load listener, and the timeout when asked, for `generation`,
/// replacing whatever was armed for an earlier one.
fn arm_load(app: &Shared, generation: Generation, with_timeout: bool) {
    app.borrow_mut()
        .with_load_hooks(|loads, hooks| loads.arm(hooks, generation, with_timeout));
}

fn arm_continuation(app: &Shared) {
    let mut a = app.borrow_mut();
    let resume = once_callback(&a.this, on_continuation);
    a.surface.map().once(STYLE_LOAD, resume.as_ref().unchecked_ref());
    a.continuation = Some(resume);
}

fn on_continuation(app: &Shared) {
    let step = {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        a.continuation = None;
        a.controller.resume(&mut a.surface)
    };
    drive(app, step);
    flush_notices(app);
}

fn on_style_loaded(app: &Shared, generation: Generation) {
    let follow_up = {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        a.settle_load(generation);
        match a
            .controller
            .on_style_loaded(&mut a.surface, &mut a.dom, generation)
        {
            LoadOutcome::Ready { follow_up, .. } => follow_up,
            LoadOutcome::Stale => None,
        }
    };
    if let Some(step) = follow_up {
        drive(app, step);
    }
    flush_notices(app);
}

/// The load for `generation` timed out or the map reported an error.
fn fail_load(app: &Shared, generation: Generation, failure: LoadFailure) {
    let outcome = {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        a.controller
            .on_style_failed(&mut a.surface, generation, failure)
    };
    match outcome {
        FailureOutcome::Fallback(ticket) => {
            tracing::debug!(generation = %ticket.generation, url = %ticket.selection.url, "waiting for fallback style");
            arm_load(app, ticket.generation, true);
        }
        // The map keeps loading the abandoned style; adopt it if it lands.
        FailureOutcome::Abandoned => arm_load(app, generation, false),
        FailureOutcome::Stale => {}
    }
    flush_notices(app);
}

fn on_theme_click(app: &Shared, pref: ThemePreference) {
    let step = {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        let step = a
            .binding
            .on_theme_click(pref, &mut a.controller, &mut a.surface);
        a.dom.set_button_states(&a.binding.button_states());
        step
    };
    drive(app, step);
    flush_notices(app);
}

fn on_view_toggle(app: &Shared) {
    let step = {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        let active = a.dom.flip_view_toggle();
        a.binding
            .on_view_toggle(active, &mut a.controller, &mut a.surface)
    };
    drive(app, step);
    flush_notices(app);
}

fn on_address_input(app: &Shared) {
    let action = {
        let mut a = app.borrow_mut();
        a.abort_search();
        let query = a.dom.address().value();
        let action = a.search.on_input(&query);
        if action == InputAction::Hide {
            a.render_suggestions();
        }
        action
    };
    if let InputAction::Fetch(request) = action {
        start_geocode(app, request);
    }
}

fn start_geocode(app: &Shared, request: GeocodeRequest) {
    let controller = match AbortController::new() {
        Ok(c) => Some(c),
        Err(err) => {
            tracing::debug!(err = %js_error_text(&err), "AbortController unavailable");
            None
        }
    };
    let signal = controller.as_ref().map(AbortController::signal);
    app.borrow_mut().in_flight = controller;

    let weak = Rc::downgrade(app);
    spawn_local(async move {
        let result = fetch_geocode(&request.url, signal.as_ref()).await;
        let Some(app) = weak.upgrade() else {
            return;
        };
        {
            let mut a = app.borrow_mut();
            if a.search.on_response(request.id, result) == ResponseOutcome::Stale {
                return;
            }
            a.in_flight = None;
            a.render_suggestions();
        }
        flush_notices(&app);
    });
}

async fn fetch_geocode(
    url: &str,
    signal: Option<&AbortSignal>,
) -> Result<GeocodeResponse, SearchError> {
    let resp = Request::get(url)
        .abort_signal(signal)
        .send()
        .await
        .map_err(|e| SearchError::Transport(e.to_string()))?;
    if !resp.ok() {
        return Err(SearchError::Http {
            status: resp.status(),
        });
    }
    let text = resp
        .text()
        .await
        .map_err(|e| SearchError::Transport(e.to_string()))?;
    GeocodeResponse::from_json_str(&text)
}

/// The suggestion row an event happened in.
fn suggestion_row(ev: &Event) -> Option<HtmlElement> {
    ev.target()?
        .dyn_into::<Element>()
        .ok()?
        .closest(&format!(".{SUGGESTION_CLASS}"))
        .ok()??
        .dyn_into::<HtmlElement>()
        .ok()
}

fn on_suggestion_click(app: &Shared, ev: &Event) {
    let Some(index) = suggestion_row(ev)
        .and_then(|row| row.get_attribute("data-index"))
        .and_then(|i| i.parse::<usize>().ok())
    else {
        return;
    };
    {
        let mut guard = app.borrow_mut();
        let a = &mut *guard;
        a.abort_search();
        match a.search.select(&mut a.surface, index) {
            Ok(Some(at)) => {
                a.dom.clear_address();
                tracing::debug!(lng = at.lng, lat = at.lat, "flying to search result");
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(%err, "search result not marked"),
        }
        a.render_suggestions();
    }
    flush_notices(app);
}

fn on_suggestion_hover(app: &Shared, ev: &Event, hovered: bool) {
    if let Some(row) = suggestion_row(ev) {
        app.borrow().dom.set_row_hover(&row, hovered);
    }
}

fn on_legend_change(app: &Shared, ev: &Event) {
    let Some(input) = ev
        .target()
        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
    else {
        return;
    };
    let Some(layer_id) = input
        .closest(LEGEND_KEY_SELECTOR)
        .ok()
        .flatten()
        .and_then(|key| key.get_attribute("data-layer"))
    else {
        return;
    };
    let visible = input.checked();
    let mut guard = app.borrow_mut();
    let a = &mut *guard;
    if let Err(err) = a
        .controller
        .set_layer_visible(&mut a.surface, &layer_id, visible)
    {
        tracing::warn!(%err, layer = %layer_id, "legend toggle not applied");
    }
}

/// Shows the newest notice, if any, and schedules it to be hidden.
fn flush_notices(app: &Shared) {
    let Some(notice) = app.borrow_mut().take_notice() else {
        return;
    };
    let mut guard = app.borrow_mut();
    let a = &mut *guard;
    a.dom.show_notice(&notice.message);
    if let Some((handle, _hide)) = a.notice_timer.take() {
        a.window.clear_timeout_with_handle(handle);
    }
    let hide = once_callback(&a.this, |app| {
        let mut a = app.borrow_mut();
        a.notice_timer = None;
        a.dom.hide_notice();
    });
    match a
        .window
        .set_timeout_with_callback_and_timeout_and_arguments_0(
            hide.as_ref().unchecked_ref(),
            a.notice_ms,
        ) {
        Ok(handle) => a.notice_timer = Some((handle, hide)),
        Err(err) => tracing::debug!(err = %js_error_text(&err), "notice stays until replaced"),
    }
}
