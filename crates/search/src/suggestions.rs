use foundation::LngLat;

use crate::protocol::GeocodeFeature;

/// One clickable entry under the search box.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionRow {
    pub label: String,
    pub position: LngLat,
    /// First row gets the panel's top corners rounded.
    pub rounded_top: bool,
    /// Last row gets the bottom corners rounded.
    pub rounded_bottom: bool,
}

/// Contents and visibility of the suggestion list.
#[derive(Debug, Default)]
pub struct SuggestionPanel {
    rows: Vec<SuggestionRow>,
    visible: bool,
}

impl SuggestionPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[SuggestionRow] {
        &self.rows
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn row(&self, index: usize) -> Option<&SuggestionRow> {
        self.rows.get(index)
    }

    /// Replaces the rows with the first `cap` features. An empty result
    /// hides the panel.
    pub fn show(&mut self, features: &[GeocodeFeature], cap: usize) {
        let n = features.len().min(cap);
        self.rows = features[..n]
            .iter()
            .enumerate()
            .map(|(i, f)| SuggestionRow {
                label: f.place_name.clone(),
                position: f.geometry.coordinates,
                rounded_top: i == 0,
                rounded_bottom: i + 1 == n,
            })
            .collect();
        self.visible = n > 0;
    }

    pub fn hide(&mut self) {
        self.rows.clear();
        self.visible = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PointGeometry;

    fn feature(name: &str, lng: f64) -> GeocodeFeature {
        GeocodeFeature {
            place_name: name.to_string(),
            geometry: PointGeometry {
                coordinates: LngLat::new(lng, -37.7),
            },
        }
    }

    #[test]
    fn rounds_outer_corners_only() {
        let mut p = SuggestionPanel::new();
        p.show(&[feature("a", 144.1), feature("b", 144.2), feature("c", 144.3)], 10);
        let flags: Vec<_> = p.rows().iter().map(|r| (r.rounded_top, r.rounded_bottom)).collect();
        assert_eq!(flags, vec![(true, false), (false, false), (false, true)]);
        assert!(p.is_visible());
    }

    #[test]
    fn single_row_is_rounded_on_both_ends() {
        let mut p = SuggestionPanel::new();
        p.show(&[feature("only", 144.0)], 10);
        assert!(p.rows()[0].rounded_top && p.rows()[0].rounded_bottom);
    }

    #[test]
    fn caps_rows_and_rounds_the_last_kept_one() {
        let features: Vec<_> = (0..15).map(|i| feature(&format!("f{i}"), 144.0 + i as f64 * 0.01)).collect();
        let mut p = SuggestionPanel::new();
        p.show(&features, 10);
        assert_eq!(p.rows().len(), 10);
        assert!(p.rows()[9].rounded_bottom);
        assert_eq!(p.rows()[9].label, "f9");
    }

    #[test]
    fn empty_result_hides() {
        let mut p = SuggestionPanel::new();
        p.show(&[feature("a", 144.0)], 10);
        p.show(&[], 10);
        assert!(!p.is_visible());
        assert!(p.rows().is_empty());
    }
}
