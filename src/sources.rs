//! Per-request source liveness, inferred from a few sample videos.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::config::ProbeSettings;
use crate::formats::{SourceAvailabilityResult, VideoSummary, now_millis};
use crate::playlist::first_playable_url;
use crate::probe::{LivenessProbe, LivenessProbeResult};

pub const NO_VIDEOS_ERROR: &str = "No videos found";
pub const ALL_SAMPLES_FAILED_ERROR: &str = "All sample videos failed to load";

/// Accepting one sample settles the source as available; later samples are skipped.
pub type SampleAcceptPolicy = fn(&LivenessProbeResult) -> bool;

pub fn accept_reachable_sample(result: &LivenessProbeResult) -> bool {
    result.is_reachable
}

#[derive(Debug, Clone)]
pub struct SourceSample {
    pub source_id: String,
    pub source_name: String,
    pub videos: Vec<VideoSummary>,
}

pub struct SourceAvailabilityChecker {
    probe: Arc<dyn LivenessProbe>,
    sample_size: usize,
    accept: SampleAcceptPolicy,
}

impl SourceAvailabilityChecker {
    pub fn new(probe: Arc<dyn LivenessProbe>, settings: &ProbeSettings) -> Self {
        Self {
            probe,
            sample_size: settings.source_sample_size,
            accept: accept_reachable_sample,
        }
    }

    pub fn with_policy(mut self, accept: SampleAcceptPolicy) -> Self {
        self.accept = accept;
        self
    }

    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Probes sample videos one after another until one is accepted.
    pub async fn check_source_availability(&self, sample: &SourceSample) -> SourceAvailabilityResult {
        let started = Instant::now();
        if sample.videos.is_empty() {
            return verdict(sample, false, None, Some(NO_VIDEOS_ERROR));
        }

        for video in sample.videos.iter().take(self.sample_size) {
            let Some(url) = first_playable_url(&video.play_url) else {
                tracing::debug!(source_id = %sample.source_id, video_id = %video.id, "sample video has no usable url");
                continue;
            };

            let result = self.probe.probe(&url).await;
            if (self.accept)(&result) {
                tracing::info!(
                    source_id = %sample.source_id,
                    source_name = %sample.source_name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "source available"
                );
                return verdict(sample, true, Some(url), None);
            }
        }

        tracing::info!(
            source_id = %sample.source_id,
            source_name = %sample.source_name,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "source unavailable"
        );
        verdict(sample, false, None, Some(ALL_SAMPLES_FAILED_ERROR))
    }

    /// Checks every source concurrently; output order follows input order.
    pub async fn check_multiple_sources(
        &self,
        samples: &[SourceSample],
    ) -> Vec<SourceAvailabilityResult> {
        futures::future::join_all(samples.iter().map(|s| self.check_source_availability(s))).await
    }
}

fn verdict(
    sample: &SourceSample,
    is_available: bool,
    sample_url: Option<String>,
    error: Option<&str>,
) -> SourceAvailabilityResult {
    SourceAvailabilityResult {
        source_id: sample.source_id.clone(),
        source_name: sample.source_name.clone(),
        is_available,
        sample_url,
        error: error.map(str::to_owned),
        checked_at: now_millis(),
    }
}

pub fn available_source_ids(verdicts: &[SourceAvailabilityResult]) -> HashSet<&str> {
    verdicts
        .iter()
        .filter(|v| v.is_available)
        .map(|v| v.source_id.as_str())
        .collect()
}

/// Drops every video whose source was not judged available, probed or not.
pub fn filter_by_available_sources(
    videos: Vec<VideoSummary>,
    verdicts: &[SourceAvailabilityResult],
) -> Vec<VideoSummary> {
    let available = available_source_ids(verdicts);
    videos
        .into_iter()
        .filter(|v| available.contains(v.source.as_str()))
        .collect()
}
