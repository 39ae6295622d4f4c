use tracing::debug;

use super::{Capabilities, MusicSource};

/// Display data for one registered source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub selected: bool,
    pub capabilities: Capabilities,
}

/// All registered sources plus the id of the selected one.
///
/// The selected id may name a source that is not registered (stale config)
/// or one that is currently disabled; lookups then yield `None`.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Box<dyn MusicSource>>,
    selected: String,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source, replacing any source with the same id.
    pub fn register(&mut self, source: Box<dyn MusicSource>) {
        if let Some(pos) = self.sources.iter().position(|s| s.id() == source.id()) {
            debug!(source = source.id(), "replacing registered source");
            self.sources[pos] = source;
        } else {
            self.sources.push(source);
        }
    }

    pub fn set_selected(&mut self, id: impl Into<String>) {
        self.selected = id.into();
    }

    pub fn selected_id(&self) -> &str {
        &self.selected
    }

    /// The selected source, if it exists and is enabled.
    pub fn selected_source(&mut self) -> Option<&mut dyn MusicSource> {
        let selected = self.selected.as_str();
        let source = self.sources.iter_mut().find(|s| s.id() == selected)?;
        if !source.enabled() {
            return None;
        }
        Some(&mut **source)
    }

    #[cfg(test)]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut dyn MusicSource> {
        let source = self.sources.iter_mut().find(|s| s.id() == id)?;
        Some(&mut **source)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn summaries(&self) -> Vec<SourceSummary> {
        self.sources
            .iter()
            .map(|s| SourceSummary {
                id: s.id().to_string(),
                name: s.name().to_string(),
                enabled: s.enabled(),
                selected: s.id() == self.selected,
                capabilities: s.capabilities(),
            })
            .collect()
    }
}
