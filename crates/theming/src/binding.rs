use prefs::{ColorSchemeProbe, PreferenceStore, Preferences, ResolvedTheme, ThemePreference};
use runtime::NoticeKind;

use crate::controller::{StyleSwitchController, SwitchStep};
use crate::palette::{ThemePalette, palette_for};
use crate::selection::{StyleKey, ViewMode};
use crate::surface::MapSurface;

/// State behind the theme buttons and the suburb/ward toggle.
#[derive(Debug)]
pub struct ThemeBinding<S, P> {
    prefs: Preferences<S, P>,
    active: ThemePreference,
    view: ViewMode,
}

impl<S: PreferenceStore, P: ColorSchemeProbe> ThemeBinding<S, P> {
    /// Starts from the persisted preference.
    pub fn new(prefs: Preferences<S, P>, view: ViewMode) -> Self {
        let active = prefs.load_theme();
        Self {
            prefs,
            active,
            view,
        }
    }

    /// The button that should carry the "active" highlight.
    pub fn active(&self) -> ThemePreference {
        self.active
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    pub fn resolved(&self) -> ResolvedTheme {
        self.prefs.resolve_theme(self.active)
    }

    pub fn key(&self) -> StyleKey {
        StyleKey::new(self.resolved(), self.view)
    }

    /// Page colours for the resolved theme, before any style has loaded.
    pub fn palette(&self) -> ThemePalette {
        palette_for(self.resolved())
    }

    /// Highlight state for every theme button.
    pub fn button_states(&self) -> [(ThemePreference, bool); 3] {
        ThemePreference::ALL.map(|p| (p, p == self.active))
    }

    /// A theme button was clicked. `auto` is resolved right away, the raw
    /// choice is persisted and the controller switches to the resolved theme.
    pub fn on_theme_click<M: MapSurface + ?Sized>(
        &mut self,
        pref: ThemePreference,
        controller: &mut StyleSwitchController,
        surface: &mut M,
    ) -> SwitchStep {
        let resolved = self.prefs.resolve_theme(pref);
        self.active = pref;
        if let Err(err) = self.prefs.save_theme(pref) {
            tracing::warn!(%err, theme = pref.as_str(), "theme preference not saved");
            controller.notices_mut().emit(
                NoticeKind::PreferenceUnavailable,
                "Your theme choice could not be saved",
            );
        }
        controller.request_switch(surface, StyleKey::new(resolved, self.view))
    }

    /// The suburb/ward toggle changed; `active` is its new state.
    pub fn on_view_toggle<M: MapSurface + ?Sized>(
        &mut self,
        active: bool,
        controller: &mut StyleSwitchController,
        surface: &mut M,
    ) -> SwitchStep {
        self.view = ViewMode::from_toggle(active);
        controller.request_switch(surface, self.key())
    }
}
