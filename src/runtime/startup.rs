use tracing::{info, warn};

use crate::config::Settings;
use crate::output::{CoverArt, CoverHandler, FileOutputs, NoCover};
use crate::query::QueryThread;
use crate::source::SourceRegistry;
use crate::source::folder::FolderSource;
use crate::source::mpris::MprisSource;

/// Every built-in source, with `selected` as the one to poll.
pub fn build_registry(settings: &Settings, selected: &str) -> SourceRegistry {
    let mut registry = SourceRegistry::new();
    registry.register(Box::new(MprisSource::from_settings(&settings.sources.mpris)));
    registry.register(Box::new(FolderSource::new(settings.sources.folder.clone())));
    registry.set_selected(selected);
    registry
}

pub fn build_outputs(settings: &Settings) -> FileOutputs {
    FileOutputs::new(settings.outputs.clone(), settings.query.placeholder.clone())
}

pub fn build_covers(settings: &Settings) -> Box<dyn CoverHandler> {
    match &settings.cover.path {
        Some(path) => {
            let covers = CoverArt::new(path.clone(), settings.cover.placeholder.clone());
            info!(path = %covers.path().display(), "cover art enabled");
            Box::new(covers)
        }
        None => {
            if settings.query.download_cover {
                warn!("query.download_cover is set but cover.path is not; covers are skipped");
            }
            Box::new(NoCover)
        }
    }
}

/// Wire settings into a query thread. `source_override` wins over
/// `query.selected_source`.
pub fn build_query(settings: &Settings, source_override: Option<&str>) -> QueryThread {
    let selected = source_override.unwrap_or(&settings.query.selected_source);
    let registry = build_registry(settings, selected);
    let outputs = build_outputs(settings);
    if outputs.is_empty() {
        warn!("no [[outputs]] configured; snapshots are only shown in the monitor");
    }
    info!(
        source = selected,
        outputs = outputs.len(),
        sources = registry.len(),
        "query thread configured"
    );
    QueryThread::new(
        registry,
        Box::new(outputs),
        build_covers(settings),
        settings.query.query_settings(),
    )
}
