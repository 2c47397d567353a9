use prefs::ResolvedTheme;
use serde::{Deserialize, Serialize};

/// Which administrative boundaries the basemap shows.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Suburb,
    Ward,
}

impl ViewMode {
    /// The view toggle is "active" when wards are shown.
    pub fn from_toggle(active: bool) -> Self {
        if active { ViewMode::Ward } else { ViewMode::Suburb }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Suburb => "suburb",
            ViewMode::Ward => "ward",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct StyleKey {
    pub theme: ResolvedTheme,
    pub view: ViewMode,
}

impl StyleKey {
    pub const fn new(theme: ResolvedTheme, view: ViewMode) -> Self {
        Self { theme, view }
    }
}

/// A style URL together with the key it was chosen for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSelection {
    pub key: StyleKey,
    pub url: String,
}

/// The four basemap styles, one per theme and view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleTable {
    pub light_suburb: String,
    pub light_ward: String,
    pub dark_suburb: String,
    pub dark_ward: String,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            light_suburb: "mapbox://styles/meltongisdev/cltp6z6ie01dk01raewq8b9ch".to_string(),
            light_ward: "mapbox://styles/meltongisdev/cm4iz1afz00fm01ra3eipas3p".to_string(),
            dark_suburb: "mapbox://styles/meltongisdev/cm64liz5n007d01stag4m8pee".to_string(),
            dark_ward: "mapbox://styles/meltongisdev/cm71evb1b00gt01sl24jh79e9".to_string(),
        }
    }
}

impl StyleTable {
    pub fn url(&self, key: StyleKey) -> &str {
        match (key.theme, key.view) {
            (ResolvedTheme::Light, ViewMode::Suburb) => &self.light_suburb,
            (ResolvedTheme::Light, ViewMode::Ward) => &self.light_ward,
            (ResolvedTheme::Dark, ViewMode::Suburb) => &self.dark_suburb,
            (ResolvedTheme::Dark, ViewMode::Ward) => &self.dark_ward,
        }
    }

    pub fn select(&self, key: StyleKey) -> StyleSelection {
        StyleSelection {
            key,
            url: self.url(key).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{StyleKey, StyleTable, ViewMode};
    use prefs::ResolvedTheme;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn arb_key() -> impl Strategy<Value = StyleKey> {
        (any::<bool>(), any::<bool>()).prop_map(|(dark, ward)| {
            StyleKey::new(
                if dark { ResolvedTheme::Dark } else { ResolvedTheme::Light },
                ViewMode::from_toggle(ward),
            )
        })
    }

    #[test]
    fn every_key_maps_to_a_distinct_style() {
        let table = StyleTable::default();
        let mut seen = HashSet::new();
        for theme in [ResolvedTheme::Light, ResolvedTheme::Dark] {
            for view in [ViewMode::Suburb, ViewMode::Ward] {
                seen.insert(table.url(StyleKey::new(theme, view)).to_string());
            }
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn view_toggle_active_means_ward() {
        assert_eq!(ViewMode::from_toggle(true), ViewMode::Ward);
        assert_eq!(ViewMode::from_toggle(false), ViewMode::Suburb);
    }

    #[test]
    fn known_urls() {
        let table = StyleTable::default();
        assert_eq!(
            table.url(StyleKey::new(ResolvedTheme::Dark, ViewMode::Ward)),
            "mapbox://styles/meltongisdev/cm71evb1b00gt01sl24jh79e9"
        );
        assert_eq!(
            table.url(StyleKey::new(ResolvedTheme::Light, ViewMode::Suburb)),
            "mapbox://styles/meltongisdev/cltp6z6ie01dk01raewq8b9ch"
        );
    }

    proptest! {
        #[test]
        fn selection_is_deterministic_and_in_table(key in arb_key()) {
            let table = StyleTable::default();
            let a = table.select(key);
            let b = table.select(key);
            prop_assert_eq!(&a, &b);
            let all = [&table.light_suburb, &table.light_ward, &table.dark_suburb, &table.dark_ward];
            prop_assert_eq!(all.iter().filter(|u| ***u == a.url).count(), 1);
        }
    }
}
