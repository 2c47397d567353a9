use std::collections::BTreeMap;

use crate::registry::{HostError, StyleHost};
use crate::symbology::Visibility;

/// Per-layer visibility chosen in the legend.
///
/// A style swap resets layout properties, so the map is re-applied after
/// every load. Layers the current style does not contain are skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegendVisibility {
    states: BTreeMap<String, bool>,
}

impl LegendVisibility {
    /// Every listed layer starts visible.
    pub fn new<I, S>(layer_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            states: layer_ids.into_iter().map(|id| (id.into(), true)).collect(),
        }
    }

    pub fn is_visible(&self, id: &str) -> Option<bool> {
        self.states.get(id).copied()
    }

    pub fn set(&mut self, id: &str, visible: bool) {
        self.states.insert(id.to_string(), visible);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.states.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Pushes the remembered visibility onto whichever layers exist. Returns
    /// how many layers were updated.
    pub fn apply<H: StyleHost + ?Sized>(&self, host: &mut H) -> Result<usize, HostError> {
        let mut applied = 0;
        for (id, visible) in self.iter() {
            if host.has_layer(id) {
                host.set_visibility(id, Visibility::from_visible(visible))?;
                applied += 1;
            }
        }
        Ok(applied)
    }
}
