use std::collections::BTreeMap;

use serde_json::Value;

use crate::layer::LayerDescriptor;
use crate::symbology::Visibility;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("layer `{0}` already exists")]
    DuplicateLayer(String),
    #[error("source `{0}` already exists")]
    DuplicateSource(String),
    #[error("layer `{0}` does not exist")]
    MissingLayer(String),
    #[error("source `{0}` does not exist")]
    MissingSource(String),
    #[error("source `{source_id}` is still used by layer `{layer_id}`")]
    SourceInUse { source_id: String, layer_id: String },
    #[error("renderer rejected the call: {0}")]
    Renderer(String),
}

/// The mutable half of a rendered style: its sources and layers.
pub trait StyleHost {
    /// Layer ids in draw order.
    fn layer_ids(&self) -> Vec<String>;
    fn source_ids(&self) -> Vec<String>;
    fn has_layer(&self, id: &str) -> bool;
    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, source: &Value) -> Result<(), HostError>;
    fn add_layer(&mut self, layer: &Value) -> Result<(), HostError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), HostError>;
    fn remove_source(&mut self, id: &str) -> Result<(), HostError>;
    fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<(), HostError>;
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Teardown {
    pub layers: usize,
    pub sources: usize,
}

/// The set of custom layers the application owns on top of a basemap style.
#[derive(Debug, Clone, Default)]
pub struct LayerRegistry {
    descriptors: Vec<LayerDescriptor>,
}

impl LayerRegistry {
    pub fn new(descriptors: Vec<LayerDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[LayerDescriptor] {
        &self.descriptors
    }

    /// Removes every layer, then every source, currently in the style.
    ///
    /// Entries that have already vanished are skipped.
    pub fn remove_all<H: StyleHost + ?Sized>(&self, host: &mut H) -> Result<Teardown, HostError> {
        let mut out = Teardown::default();
        for id in host.layer_ids() {
            if host.has_layer(&id) {
                host.remove_layer(&id)?;
                out.layers += 1;
            }
        }
        for id in host.source_ids() {
            if host.has_source(&id) {
                host.remove_source(&id)?;
                out.sources += 1;
            }
        }
        tracing::debug!(layers = out.layers, sources = out.sources, "style torn down");
        Ok(out)
    }

    /// Adds the source and then the layer of every descriptor that is not
    /// already present. Returns how many layers were added.
    pub fn add_all<H: StyleHost + ?Sized>(&self, host: &mut H) -> Result<usize, HostError> {
        let mut added = 0;
        for d in &self.descriptors {
            if !host.has_source(&d.source_id) {
                host.add_source(&d.source_id, &d.source_json())?;
            }
            if !host.has_layer(d.id.as_str()) {
                host.add_layer(&d.layer_json())?;
                added += 1;
            }
        }
        tracing::debug!(added, "custom layers applied");
        Ok(added)
    }

    /// True when every owned source and layer is present in `host`.
    pub fn is_applied<H: StyleHost + ?Sized>(&self, host: &H) -> bool {
        self.descriptors
            .iter()
            .all(|d| host.has_source(&d.source_id) && host.has_layer(d.id.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct HostedLayer {
    id: String,
    source: Option<String>,
    visibility: Visibility,
}

/// Style host kept entirely in memory, with the renderer's referential rules.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStyleHost {
    sources: BTreeMap<String, Value>,
    layers: Vec<HostedLayer>,
}

impl InMemoryStyleHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops everything, as a full style replacement does.
    pub fn clear(&mut self) {
        self.sources.clear();
        self.layers.clear();
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Count of layers with the given id; anything above one is a duplicate.
    pub fn count_layer(&self, id: &str) -> usize {
        self.layers.iter().filter(|l| l.id == id).count()
    }

    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.layers.iter().find(|l| l.id == id).map(|l| l.visibility)
    }

    pub fn source(&self, id: &str) -> Option<&Value> {
        self.sources.get(id)
    }
}

impl StyleHost for InMemoryStyleHost {
    fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    fn source_ids(&self) -> Vec<String> {
        self.sources.keys().cloned().collect()
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layers.iter().any(|l| l.id == id)
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: &Value) -> Result<(), HostError> {
        if self.sources.contains_key(id) {
            return Err(HostError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source.clone());
        Ok(())
    }

    fn add_layer(&mut self, layer: &Value) -> Result<(), HostError> {
        let id = layer["id"]
            .as_str()
            .ok_or_else(|| HostError::Renderer("layer without id".to_string()))?;
        if self.has_layer(id) {
            return Err(HostError::DuplicateLayer(id.to_string()));
        }
        let source = layer["source"].as_str().map(str::to_string);
        if let Some(src) = &source {
            if !self.sources.contains_key(src) {
                return Err(HostError::MissingSource(src.clone()));
            }
        }
        let visibility = match layer["layout"]["visibility"].as_str() {
            Some("none") => Visibility::None,
            _ => Visibility::Visible,
        };
        self.layers.push(HostedLayer {
            id: id.to_string(),
            source,
            visibility,
        });
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), HostError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return Err(HostError::MissingLayer(id.to_string()));
        }
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> Result<(), HostError> {
        if let Some(user) = self
            .layers
            .iter()
            .find(|l| l.source.as_deref() == Some(id))
        {
            return Err(HostError::SourceInUse {
                source_id: id.to_string(),
                layer_id: user.id.clone(),
            });
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| HostError::MissingSource(id.to_string()))
    }

    fn set_visibility(&mut self, id: &str, visibility: Visibility) -> Result<(), HostError> {
        let layer = self
            .layers
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| HostError::MissingLayer(id.to_string()))?;
        layer.visibility = visibility;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{HostError, InMemoryStyleHost, LayerRegistry, StyleHost};
    use crate::raster::AerialConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn basemap() -> InMemoryStyleHost {
        let mut host = InMemoryStyleHost::new();
        host.add_source("composite", &json!({"type": "vector"})).unwrap();
        host.add_layer(&json!({"id": "background", "type": "background"}))
            .unwrap();
        host.add_layer(&json!({"id": "suburbs", "source": "composite", "type": "line"}))
            .unwrap();
        host
    }

    fn registry() -> LayerRegistry {
        LayerRegistry::new(vec![AerialConfig::default().descriptor()])
    }

    #[test]
    fn source_in_use_cannot_be_removed() {
        let mut host = basemap();
        assert_eq!(
            host.remove_source("composite"),
            Err(HostError::SourceInUse {
                source_id: "composite".to_string(),
                layer_id: "suburbs".to_string(),
            })
        );
    }

    #[test]
    fn remove_all_drops_layers_before_sources() {
        let reg = registry();
        let mut host = basemap();
        reg.add_all(&mut host).unwrap();

        let t = reg.remove_all(&mut host).unwrap();
        assert_eq!(t.layers, 3);
        assert_eq!(t.sources, 2);
        assert_eq!(host.layer_count(), 0);
        assert_eq!(host.source_count(), 0);
    }

    #[test]
    fn remove_all_on_empty_style_is_a_no_op() {
        let reg = registry();
        let mut host = InMemoryStyleHost::new();
        let t = reg.remove_all(&mut host).unwrap();
        assert_eq!((t.layers, t.sources), (0, 0));
    }

    #[test]
    fn add_all_is_idempotent() {
        let reg = registry();
        let mut host = basemap();
        assert_eq!(reg.add_all(&mut host).unwrap(), 1);
        assert_eq!(reg.add_all(&mut host).unwrap(), 0);
        assert_eq!(host.count_layer("Nearmap_Layer"), 1);
        assert!(host.has_source("Nearmap_Source"));
        assert!(reg.is_applied(&host));
    }

    #[test]
    fn add_all_after_source_survived_reuses_it() {
        let reg = registry();
        let mut host = InMemoryStyleHost::new();
        let d = &reg.descriptors()[0];
        host.add_source(&d.source_id, &d.source_json()).unwrap();

        assert_eq!(reg.add_all(&mut host).unwrap(), 1);
        assert_eq!(host.source_count(), 1);
    }
}
