//! Page elements the app reads from and draws into.

use std::str::FromStr;

use prefs::ThemePreference;
use search::{SuggestionPanel, SuggestionRow};
use theming::{ThemeChrome, ThemePalette};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement};

use crate::mapbox::js_error_text;

pub const ADDRESS_INPUT_ID: &str = "address";
pub const SUGGESTIONS_ID: &str = "suggestions";
pub const LEGEND_ID: &str = "map-legend";
pub const NOTICE_ID: &str = "map-notice";
pub const VIEW_TOGGLE_ID: &str = "suburbWardToggle";
pub const THEME_BUTTON_ATTR: &str = "data-bs-theme-value";
pub const LEGEND_KEY_SELECTOR: &str = ".legend-key[data-layer]";
pub const SUGGESTION_CLASS: &str = "suggestion-item";
const ACTIVE_CLASS: &str = "active";

fn by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} has an unexpected element type")))
}

fn query_all(document: &Document, selector: &str) -> Result<Vec<Element>, JsValue> {
    let list = document.query_selector_all(selector)?;
    Ok((0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|n| n.dyn_into::<Element>().ok())
        .collect())
}

fn set_styles(el: &HtmlElement, props: &[(&str, &str)]) {
    let style = el.style();
    for (name, value) in props {
        if let Err(err) = style.set_property(name, value) {
            tracing::trace!(property = *name, err = %js_error_text(&err), "style property rejected");
        }
    }
}

pub struct PageDom {
    document: Document,
    root: Option<HtmlElement>,
    address: HtmlInputElement,
    suggestions: HtmlElement,
    legend: Option<HtmlElement>,
    notice: Option<HtmlElement>,
    view_toggle: Option<Element>,
    theme_buttons: Vec<(ThemePreference, Element)>,
    palette: Option<ThemePalette>,
}

impl PageDom {
    /// The search input and suggestion panel are required; everything else
    /// is optional and skipped when absent.
    pub fn query(document: &Document) -> Result<Self, JsValue> {
        let theme_buttons = query_all(document, &format!("[{THEME_BUTTON_ATTR}]"))?
            .into_iter()
            .filter_map(|el| {
                let raw = el.get_attribute(THEME_BUTTON_ATTR)?;
                match ThemePreference::from_str(&raw) {
                    Ok(pref) => Some((pref, el)),
                    Err(_) => {
                        tracing::warn!(value = %raw, "ignoring theme button with unknown value");
                        None
                    }
                }
            })
            .collect();
        Ok(Self {
            document: document.clone(),
            root: document
                .document_element()
                .and_then(|el| el.dyn_into::<HtmlElement>().ok()),
            address: by_id(document, ADDRESS_INPUT_ID)?,
            suggestions: by_id(document, SUGGESTIONS_ID)?,
            legend: by_id(document, LEGEND_ID).ok(),
            notice: by_id(document, NOTICE_ID).ok(),
            view_toggle: document.get_element_by_id(VIEW_TOGGLE_ID),
            theme_buttons,
            palette: None,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn address(&self) -> &HtmlInputElement {
        &self.address
    }

    pub fn suggestions(&self) -> &HtmlElement {
        &self.suggestions
    }

    pub fn view_toggle(&self) -> Option<&Element> {
        self.view_toggle.as_ref()
    }

    pub fn theme_buttons(&self) -> &[(ThemePreference, Element)] {
        &self.theme_buttons
    }

    pub fn view_toggle_active(&self) -> bool {
        self.view_toggle
            .as_ref()
            .is_some_and(|el| el.class_list().contains(ACTIVE_CLASS))
    }

    /// Flips the toggle's active class and returns the new state.
    pub fn flip_view_toggle(&self) -> bool {
        match &self.view_toggle {
            Some(el) => el.class_list().toggle(ACTIVE_CLASS).unwrap_or(false),
            None => false,
        }
    }

    /// Layer ids named by the legend keys, in document order.
    pub fn legend_layer_ids(&self) -> Vec<String> {
        query_all(&self.document, LEGEND_KEY_SELECTOR)
            .unwrap_or_default()
            .iter()
            .filter_map(|el| el.get_attribute("data-layer"))
            .collect()
    }

    pub fn set_button_states(&self, states: &[(ThemePreference, bool)]) {
        for (pref, el) in &self.theme_buttons {
            let active = states.iter().any(|(p, on)| p == pref && *on);
            if let Err(err) = el.class_list().toggle_with_force(ACTIVE_CLASS, active) {
                tracing::debug!(button = pref.as_str(), err = %js_error_text(&err), "button highlight not updated");
            }
        }
    }

    pub fn clear_address(&self) {
        self.address.set_value("");
    }

    /// Rebuilds the suggestion list from `panel`.
    pub fn render_suggestions(&self, panel: &SuggestionPanel) -> Result<(), JsValue> {
        self.suggestions.set_inner_html("");
        if !panel.is_visible() {
            set_styles(&self.suggestions, &[("display", "none")]);
            return Ok(());
        }
        for (index, row) in panel.rows().iter().enumerate() {
            let item = self.suggestion_element(index, row)?;
            self.suggestions.append_child(&item)?;
        }
        set_styles(&self.suggestions, &[("display", "block")]);
        Ok(())
    }

    fn suggestion_element(&self, index: usize, row: &SuggestionRow) -> Result<HtmlElement, JsValue> {
        let item = self
            .document
            .create_element("div")?
            .dyn_into::<HtmlElement>()
            .map_err(|_| JsValue::from_str("div is not an HtmlElement"))?;
        item.set_class_name(SUGGESTION_CLASS);
        item.set_attribute("data-index", &index.to_string())?;
        item.set_text_content(Some(&row.label));
        set_styles(
            &item,
            &[
                ("cursor", "pointer"),
                ("padding", "5px"),
                ("border-bottom", "1px solid #ddd"),
                ("transition", "background-color 0.2s, color 0.2s"),
            ],
        );
        if row.rounded_top {
            set_styles(
                &item,
                &[("border-top-left-radius", "8px"), ("border-top-right-radius", "8px")],
            );
        }
        if row.rounded_bottom {
            set_styles(
                &item,
                &[("border-bottom-left-radius", "8px"), ("border-bottom-right-radius", "8px")],
            );
        }
        self.color_row(&item, false);
        Ok(item)
    }

    fn color_row(&self, item: &HtmlElement, hovered: bool) {
        let Some(palette) = self.palette else {
            return;
        };
        let colors = palette.suggestion;
        let background = if hovered {
            colors.hover_background
        } else {
            colors.background
        };
        set_styles(item, &[("background-color", background), ("color", colors.text)]);
    }

    pub fn set_row_hover(&self, item: &HtmlElement, hovered: bool) {
        self.color_row(item, hovered);
    }

    fn recolor_rows(&self) {
        let Ok(rows) = query_all(&self.document, &format!("#{SUGGESTIONS_ID} .{SUGGESTION_CLASS}")) else {
            return;
        };
        for row in rows {
            if let Ok(item) = row.dyn_into::<HtmlElement>() {
                self.color_row(&item, false);
            }
        }
    }

    pub fn show_notice(&self, text: &str) {
        match &self.notice {
            Some(el) => {
                el.set_text_content(Some(text));
                set_styles(el, &[("display", "block")]);
            }
            None => tracing::warn!(notice = text, "no #map-notice element to show notice in"),
        }
    }

    pub fn hide_notice(&self) {
        if let Some(el) = &self.notice {
            set_styles(el, &[("display", "none")]);
        }
    }
}

impl ThemeChrome for PageDom {
    fn apply_palette(&mut self, palette: &ThemePalette) {
        if let Some(root) = &self.root {
            set_styles(root, &palette.css_vars);
        }
        if let Some(legend) = &self.legend {
            set_styles(
                legend,
                &[
                    ("background-color", palette.legend_background),
                    ("color", palette.legend_text),
                ],
            );
        }
        self.palette = Some(*palette);
        self.recolor_rows();
    }
}
