//! Theme preference persistence.
//!
//! One string key holds the raw `light` / `dark` / `auto` choice. `auto` is
//! stored as-is and only turned into a concrete theme when read, by asking
//! the operating system's color scheme.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Storage key for the theme preference.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    Auto,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::Auto,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::Auto => "auto",
        }
    }
}

impl FromStr for ThemePreference {
    type Err = PrefsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "auto" => Ok(ThemePreference::Auto),
            other => Err(PrefsError::Corrupt(format!("unknown theme `{other}`"))),
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A theme the renderer can actually draw.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl ResolvedTheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvedTheme::Light => "light",
            ResolvedTheme::Dark => "dark",
        }
    }

    pub fn is_dark(self) -> bool {
        self == ResolvedTheme::Dark
    }
}

impl From<ResolvedTheme> for ThemePreference {
    fn from(t: ResolvedTheme) -> Self {
        match t {
            ResolvedTheme::Light => ThemePreference::Light,
            ResolvedTheme::Dark => ThemePreference::Dark,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrefsError {
    #[error("browser storage unavailable")]
    StorageUnavailable,
    #[error("preference storage corrupt: {0}")]
    Corrupt(String),
    #[error("preference storage error: {0}")]
    Io(String),
}

/// Key/value persistence for user preferences.
pub trait PreferenceStore {
    fn read(&self, key: &str) -> Result<Option<String>, PrefsError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// Source of the operating system's light/dark choice.
pub trait ColorSchemeProbe {
    fn prefers_dark(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: &str) -> Self {
        let mut s = Self::new();
        s.values.insert(key.to_string(), value.to_string());
        s
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn read(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Probe with a fixed answer; used where no media query exists.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedColorScheme(pub ResolvedTheme);

impl ColorSchemeProbe for FixedColorScheme {
    fn prefers_dark(&self) -> bool {
        self.0.is_dark()
    }
}

/// Theme preference access on top of a store and an OS probe.
#[derive(Debug)]
pub struct Preferences<S, P> {
    store: S,
    probe: P,
    default: ThemePreference,
}

impl<S: PreferenceStore, P: ColorSchemeProbe> Preferences<S, P> {
    /// `default` is used whenever nothing valid has been persisted yet.
    pub fn new(store: S, probe: P, default: ThemePreference) -> Self {
        Self {
            store,
            probe,
            default,
        }
    }

    pub fn default_theme(&self) -> ThemePreference {
        self.default
    }

    pub fn system_theme(&self) -> ResolvedTheme {
        if self.probe.prefers_dark() {
            ResolvedTheme::Dark
        } else {
            ResolvedTheme::Light
        }
    }

    /// The persisted raw preference. Absent, unreadable and malformed values
    /// all fall back to the default.
    pub fn load_theme(&self) -> ThemePreference {
        match self.store.read(THEME_KEY) {
            Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(%err, "ignoring stored theme");
                self.default
            }),
            Ok(None) => self.default,
            Err(err) => {
                tracing::warn!(%err, "theme preference unreadable");
                self.default
            }
        }
    }

    pub fn resolve_theme(&self, pref: ThemePreference) -> ResolvedTheme {
        match pref {
            ThemePreference::Light => ResolvedTheme::Light,
            ThemePreference::Dark => ResolvedTheme::Dark,
            ThemePreference::Auto => self.system_theme(),
        }
    }

    /// Persists the raw value; `auto` stays `auto`.
    pub fn save_theme(&mut self, pref: ThemePreference) -> Result<(), PrefsError> {
        self.store.write(THEME_KEY, pref.as_str())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(target_arch = "wasm32")]
mod wasm_storage {
    use super::{ColorSchemeProbe, PreferenceStore, PrefsError};

    const DARK_QUERY: &str = "(prefers-color-scheme: dark)";

    /// `window.localStorage`, optionally namespaced by a key prefix.
    #[derive(Debug)]
    pub struct LocalStoragePreferenceStore {
        storage: web_sys::Storage,
        key_prefix: String,
    }

    impl LocalStoragePreferenceStore {
        pub fn new(key_prefix: impl Into<String>) -> Result<Self, PrefsError> {
            Ok(Self {
                storage: window_local_storage()?,
                key_prefix: key_prefix.into(),
            })
        }

        fn full_key(&self, key: &str) -> String {
            format!("{}{}", self.key_prefix, key)
        }
    }

    impl PreferenceStore for LocalStoragePreferenceStore {
        fn read(&self, key: &str) -> Result<Option<String>, PrefsError> {
            self.storage
                .get_item(&self.full_key(key))
                .map_err(|e| PrefsError::Io(format!("get_item failed: {:?}", e)))
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
            self.storage
                .set_item(&self.full_key(key), value)
                .map_err(|e| PrefsError::Io(format!("set_item failed: {:?}", e)))
        }
    }

    /// Reads `(prefers-color-scheme: dark)` on every call.
    #[derive(Debug, Default, Copy, Clone)]
    pub struct MediaQueryColorScheme;

    impl ColorSchemeProbe for MediaQueryColorScheme {
        fn prefers_dark(&self) -> bool {
            web_sys::window()
                .and_then(|w| w.match_media(DARK_QUERY).ok().flatten())
                .map(|mql| mql.matches())
                .unwrap_or(false)
        }
    }

    fn window_local_storage() -> Result<web_sys::Storage, PrefsError> {
        let win = web_sys::window().ok_or(PrefsError::StorageUnavailable)?;
        win.local_storage()
            .map_err(|e| PrefsError::Io(format!("localStorage error: {:?}", e)))?
            .ok_or(PrefsError::StorageUnavailable)
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_storage::{LocalStoragePreferenceStore, MediaQueryColorScheme};

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct LocalStoragePreferenceStore;

#[cfg(not(target_arch = "wasm32"))]
impl LocalStoragePreferenceStore {
    pub fn new(_key_prefix: impl Into<String>) -> Result<Self, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PreferenceStore for LocalStoragePreferenceStore {
    fn read(&self, _key: &str) -> Result<Option<String>, PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }

    fn write(&mut self, _key: &str, _value: &str) -> Result<(), PrefsError> {
        Err(PrefsError::StorageUnavailable)
    }
}

/// Outside a browser there is no media query; light is reported.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, Copy, Clone)]
pub struct MediaQueryColorScheme;

#[cfg(not(target_arch = "wasm32"))]
impl ColorSchemeProbe for MediaQueryColorScheme {
    fn prefers_dark(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn read(&self, _key: &str) -> Result<Option<String>, PrefsError> {
            Err(PrefsError::StorageUnavailable)
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), PrefsError> {
            Err(PrefsError::StorageUnavailable)
        }
    }

    fn prefs(
        store: InMemoryPreferenceStore,
        os: ResolvedTheme,
    ) -> Preferences<InMemoryPreferenceStore, FixedColorScheme> {
        Preferences::new(store, FixedColorScheme(os), ThemePreference::Auto)
    }

    #[test]
    fn absent_value_uses_default() {
        let p = prefs(InMemoryPreferenceStore::new(), ResolvedTheme::Light);
        assert_eq!(p.load_theme(), ThemePreference::Auto);

        let p = Preferences::new(
            InMemoryPreferenceStore::new(),
            FixedColorScheme(ResolvedTheme::Light),
            ThemePreference::Dark,
        );
        assert_eq!(p.load_theme(), ThemePreference::Dark);
    }

    #[test]
    fn malformed_or_unreadable_value_uses_default() {
        let p = prefs(
            InMemoryPreferenceStore::with_value(THEME_KEY, "sepia"),
            ResolvedTheme::Light,
        );
        assert_eq!(p.load_theme(), ThemePreference::Auto);

        let p = Preferences::new(BrokenStore, FixedColorScheme(ResolvedTheme::Dark), ThemePreference::Light);
        assert_eq!(p.load_theme(), ThemePreference::Light);
    }

    #[test]
    fn auto_resolves_through_os_scheme() {
        let p = prefs(
            InMemoryPreferenceStore::with_value(THEME_KEY, "auto"),
            ResolvedTheme::Dark,
        );
        let pref = p.load_theme();
        assert_eq!(pref, ThemePreference::Auto);
        assert_eq!(p.resolve_theme(pref), ResolvedTheme::Dark);
    }

    #[test]
    fn explicit_values_resolve_to_themselves() {
        let p = prefs(InMemoryPreferenceStore::new(), ResolvedTheme::Dark);
        assert_eq!(p.resolve_theme(ThemePreference::Light), ResolvedTheme::Light);
        assert_eq!(p.resolve_theme(ThemePreference::Dark), ResolvedTheme::Dark);
    }

    #[test]
    fn save_keeps_raw_auto() {
        let mut p = prefs(InMemoryPreferenceStore::new(), ResolvedTheme::Dark);
        p.save_theme(ThemePreference::Auto).unwrap();
        assert_eq!(p.store().read(THEME_KEY).unwrap().as_deref(), Some("auto"));
        assert_eq!(p.load_theme(), ThemePreference::Auto);
    }

    #[test]
    fn save_surfaces_storage_errors() {
        let mut p = Preferences::new(BrokenStore, FixedColorScheme(ResolvedTheme::Dark), ThemePreference::Auto);
        assert_eq!(p.save_theme(ThemePreference::Dark), Err(PrefsError::StorageUnavailable));
    }

    #[test]
    fn parse_is_case_insensitive_and_trimmed() {
        assert_eq!(" Dark ".parse::<ThemePreference>().unwrap(), ThemePreference::Dark);
        assert!("".parse::<ThemePreference>().is_err());
        for p in ThemePreference::ALL {
            assert_eq!(p.as_str().parse::<ThemePreference>().unwrap(), p);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let v: ThemePreference = serde_json::from_str("\"light\"").unwrap();
        assert_eq!(v, ThemePreference::Light);
        assert_eq!(serde_json::to_string(&ResolvedTheme::Dark).unwrap(), "\"dark\"");
    }
}
