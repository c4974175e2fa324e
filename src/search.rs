//! Multi-source search: fan out, collect, check availability, filter, respond.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument as _;

use crate::config::ProbeSettings;
use crate::formats::{
    SearchResponse, SearchResultSet, SourceAvailabilityResult, SourceConfig, SourceResults,
    VideoSummary, now_millis,
};
use crate::probe::LivenessProbe;
use crate::sources::{
    NO_VIDEOS_ERROR, SourceAvailabilityChecker, SourceSample, filter_by_available_sources,
};
use crate::upstream::VideoCatalog;

pub struct SearchAggregator {
    catalog: Arc<dyn VideoCatalog>,
    checker: SourceAvailabilityChecker,
}

impl SearchAggregator {
    pub fn new(
        catalog: Arc<dyn VideoCatalog>,
        probe: Arc<dyn LivenessProbe>,
        settings: &ProbeSettings,
    ) -> Self {
        Self {
            catalog,
            checker: SourceAvailabilityChecker::new(probe, settings),
        }
    }

    /// One concurrent search call per source. Failures become empty sets carrying the error.
    pub async fn dispatch(
        &self,
        query: &str,
        sources: &[SourceConfig],
        page: u32,
    ) -> Vec<SearchResultSet> {
        let calls = sources.iter().map(|source| async move {
            let started = Instant::now();
            let outcome = self.catalog.search(source, query, page).await;
            let response_time_ms = started.elapsed().as_millis() as u64;
            match outcome {
                Ok(mut videos) => {
                    for video in &mut videos {
                        video.source.clone_from(&source.id);
                    }
                    tracing::debug!(source_id = %source.id, count = videos.len(), elapsed_ms = response_time_ms, "source search done");
                    SearchResultSet {
                        source: source.id.clone(),
                        videos,
                        response_time_ms,
                        error: None,
                    }
                }
                Err(err) => {
                    tracing::warn!(source_id = %source.id, elapsed_ms = response_time_ms, error = %format!("{err:#}"), "source search failed");
                    SearchResultSet {
                        source: source.id.clone(),
                        videos: Vec::new(),
                        response_time_ms,
                        error: Some(format!("{err:#}")),
                    }
                }
            }
        });
        futures::future::join_all(calls).await
    }

    pub async fn search(&self, query: &str, sources: &[SourceConfig], page: u32) -> SearchResponse {
        let span = tracing::info_span!(
            "search",
            request_id = %uuid::Uuid::new_v4(),
            query,
            page,
        );
        self.run(query, sources, page).instrument(span).await
    }

    async fn run(&self, query: &str, sources: &[SourceConfig], page: u32) -> SearchResponse {
        let page = page.max(1);
        let sources = &distinct_sources(sources);
        let names = sources
            .iter()
            .map(|s| (s.id.as_str(), s.name.as_str()))
            .collect::<HashMap<_, _>>();

        tracing::debug!(stage = "dispatched", sources = sources.len());
        let result_sets = self.dispatch(query, sources, page).await;
        tracing::debug!(stage = "collected");

        let samples = sampling_inputs(&result_sets, &names, self.checker.sample_size());
        tracing::info!(sources = samples.len(), "checking source availability");
        let probed = self.checker.check_multiple_sources(&samples).await;
        let available_count = probed.iter().filter(|v| v.is_available).count();
        tracing::info!(
            available = available_count,
            total = probed.len(),
            "{available_count} out of {} sources are available",
            probed.len()
        );
        tracing::debug!(stage = "availability_checked");

        let all_videos = result_sets
            .iter()
            .flat_map(|set| set.videos.iter().cloned())
            .collect::<Vec<_>>();
        let kept = filter_by_available_sources(all_videos, &probed);
        let total_results = kept.len();
        let grouped = regroup(kept, &probed, &result_sets);
        tracing::debug!(stage = "filtered", total_results);

        let source_availability = merge_verdicts(&result_sets, probed, &names);
        tracing::debug!(stage = "responded");

        SearchResponse {
            success: true,
            query: query.to_owned(),
            page,
            available_sources: grouped.len(),
            sources: grouped,
            total_results,
            total_sources: source_availability.len(),
            source_availability,
        }
    }
}

/// First occurrence of each source id wins; one dispatch and one verdict per id.
fn distinct_sources(sources: &[SourceConfig]) -> Vec<SourceConfig> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .filter(|s| seen.insert(s.id.as_str()))
        .cloned()
        .collect()
}

fn sampling_inputs(
    result_sets: &[SearchResultSet],
    names: &HashMap<&str, &str>,
    sample_size: usize,
) -> Vec<SourceSample> {
    result_sets
        .iter()
        .filter(|set| !set.videos.is_empty())
        .map(|set| SourceSample {
            source_id: set.source.clone(),
            source_name: display_name(names, &set.source),
            videos: set.videos.iter().take(sample_size).cloned().collect(),
        })
        .collect()
}

fn display_name(names: &HashMap<&str, &str>, id: &str) -> String {
    names.get(id).copied().unwrap_or(id).to_owned()
}

/// Rebuilds per-source groups keyed by source id, in verdict order.
fn regroup(
    videos: Vec<VideoSummary>,
    verdicts: &[SourceAvailabilityResult],
    result_sets: &[SearchResultSet],
) -> Vec<SourceResults> {
    let mut by_source: HashMap<String, Vec<_>> = HashMap::new();
    for video in videos {
        by_source.entry(video.source.clone()).or_default().push(video);
    }
    let response_times = result_sets
        .iter()
        .map(|set| (set.source.as_str(), set.response_time_ms))
        .collect::<HashMap<_, _>>();

    verdicts
        .iter()
        .filter(|v| v.is_available)
        .map(|v| SourceResults {
            source: v.source_id.clone(),
            results: by_source.remove(&v.source_id).unwrap_or_default(),
            response_time: response_times
                .get(v.source_id.as_str())
                .copied()
                .unwrap_or_default(),
        })
        .collect()
}

/// One verdict per dispatched source: probed ones as checked, empty ones as
/// "no videos", failed ones carrying the upstream error.
fn merge_verdicts(
    result_sets: &[SearchResultSet],
    probed: Vec<SourceAvailabilityResult>,
    names: &HashMap<&str, &str>,
) -> Vec<SourceAvailabilityResult> {
    let mut probed = probed
        .into_iter()
        .map(|v| (v.source_id.clone(), v))
        .collect::<HashMap<_, _>>();

    result_sets
        .iter()
        .map(|set| {
            probed
                .remove(&set.source)
                .unwrap_or_else(|| SourceAvailabilityResult {
                    source_id: set.source.clone(),
                    source_name: display_name(names, &set.source),
                    is_available: false,
                    sample_url: None,
                    error: Some(
                        set.error
                            .clone()
                            .unwrap_or_else(|| NO_VIDEOS_ERROR.to_owned()),
                    ),
                    checked_at: now_millis(),
                })
        })
        .collect()
}
