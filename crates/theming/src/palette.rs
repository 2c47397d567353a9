use prefs::ResolvedTheme;

/// Page chrome colors that follow the map theme.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ThemePalette {
    pub theme: ResolvedTheme,
    /// CSS custom properties set on the document element.
    pub css_vars: [(&'static str, &'static str); 3],
    pub legend_background: &'static str,
    pub legend_text: &'static str,
    pub suggestion: SuggestionColors,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SuggestionColors {
    pub background: &'static str,
    pub text: &'static str,
    pub hover_background: &'static str,
}

pub fn palette_for(theme: ResolvedTheme) -> ThemePalette {
    match theme {
        ResolvedTheme::Dark => ThemePalette {
            theme,
            css_vars: [
                ("--search-bar-bg-light", "#333"),
                ("--search-bar-text-light", "white"),
                ("--search-bar-border-light", "#444"),
            ],
            legend_background: "rgba(0, 0, 0, 0.7)",
            legend_text: "white",
            suggestion: SuggestionColors {
                background: "#707070",
                text: "#fff",
                hover_background: "#444",
            },
        },
        ResolvedTheme::Light => ThemePalette {
            theme,
            css_vars: [
                ("--search-bar-bg-light", "white"),
                ("--search-bar-text-light", "black"),
                ("--search-bar-border-light", "#ccc"),
            ],
            legend_background: "rgba(255, 255, 255, 0.7)",
            legend_text: "black",
            suggestion: SuggestionColors {
                background: "white",
                text: "#000",
                hover_background: "#f0f0f0",
            },
        },
    }
}

/// Receives the palette whenever a style finishes loading.
pub trait ThemeChrome {
    fn apply_palette(&mut self, palette: &ThemePalette);
}

#[cfg(test)]
mod tests {
    use super::palette_for;
    use prefs::ResolvedTheme;

    #[test]
    fn palettes_set_the_same_variables() {
        let dark = palette_for(ResolvedTheme::Dark);
        let light = palette_for(ResolvedTheme::Light);
        let names = |p: &super::ThemePalette| p.css_vars.map(|(n, _)| n);
        assert_eq!(names(&dark), names(&light));
        assert_ne!(dark.css_vars, light.css_vars);
    }

    #[test]
    fn legend_contrast_follows_theme() {
        assert_eq!(palette_for(ResolvedTheme::Dark).legend_text, "white");
        assert_eq!(palette_for(ResolvedTheme::Light).legend_text, "black");
    }
}
