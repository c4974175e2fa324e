use std::sync::Arc;

use crate::config::{ProbeSettings, SourceRegistry, UpstreamSettings};
use crate::detail::DetailService;
use crate::episodes::EpisodeValidator;
use crate::probe::{HttpProbe, LivenessProbe};
use crate::search::SearchAggregator;
use crate::upstream::{CmsCatalog, VideoCatalog};

/// Shared, read-only services behind every request.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SourceRegistry>,
    pub aggregator: Arc<SearchAggregator>,
    pub detail: Arc<DetailService>,
}

impl AppState {
    pub fn new(
        registry: SourceRegistry,
        catalog: Arc<dyn VideoCatalog>,
        probe: Arc<dyn LivenessProbe>,
        settings: &ProbeSettings,
    ) -> Self {
        let registry = Arc::new(registry);
        let aggregator = SearchAggregator::new(Arc::clone(&catalog), Arc::clone(&probe), settings);
        let validator = EpisodeValidator::new(probe, settings);
        let detail = DetailService::new(Arc::clone(&registry), catalog, validator);
        Self {
            registry,
            aggregator: Arc::new(aggregator),
            detail: Arc::new(detail),
        }
    }

    /// Real HTTP probe and CMS catalog, tuned from the environment.
    pub fn from_env(registry: SourceRegistry) -> anyhow::Result<Self> {
        let probe_settings = ProbeSettings::from_env();
        let upstream_settings = UpstreamSettings::from_env();
        tracing::info!(?probe_settings, ?upstream_settings, "service settings");

        let probe: Arc<dyn LivenessProbe> = Arc::new(HttpProbe::new(probe_settings.clone())?);
        let catalog: Arc<dyn VideoCatalog> = Arc::new(CmsCatalog::new(&upstream_settings)?);
        Ok(Self::new(registry, catalog, probe, &probe_settings))
    }
}
