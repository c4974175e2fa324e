//! Sampled playability check for a video's episode list.
//!
//! Probing every episode of a season is too slow, so only the first few
//! format-valid episodes are probed and the verdict is generalised to the
//! rest. A mid-season dead link can slip through; that is accepted.

use std::sync::Arc;

use crate::config::ProbeSettings;
use crate::formats::{EpisodeCandidate, ValidatedEpisode};
use crate::probe::{LivenessProbe, LivenessProbeResult, is_manifest_url, is_valid_url_format};
use crate::queue::ProbeQueue;

/// Turns the sampled probe results into a verdict for the whole list.
pub type SampleVerdictPolicy = fn(&[LivenessProbeResult]) -> bool;

/// Decides a single format-valid episode given the sample verdict.
pub type EpisodeKeepPolicy = fn(&EpisodeCandidate, bool) -> bool;

/// Any reachable sample vouches for the whole list.
pub fn any_sample_reachable(samples: &[LivenessProbeResult]) -> bool {
    samples.iter().any(|r| r.is_reachable)
}

/// HLS manifests are kept regardless of the samples; they validate at play time.
pub fn keep_when_sampled_or_manifest(episode: &EpisodeCandidate, samples_ok: bool) -> bool {
    samples_ok || is_manifest_url(&episode.url)
}

pub struct EpisodeValidator {
    probe: Arc<dyn LivenessProbe>,
    probe_concurrency: usize,
    sample_size: usize,
    sample_policy: SampleVerdictPolicy,
    keep_policy: EpisodeKeepPolicy,
}

impl EpisodeValidator {
    pub fn new(probe: Arc<dyn LivenessProbe>, settings: &ProbeSettings) -> Self {
        Self {
            probe,
            probe_concurrency: settings.episode_probe_concurrency,
            sample_size: settings.episode_sample_size,
            sample_policy: any_sample_reachable,
            keep_policy: keep_when_sampled_or_manifest,
        }
    }

    pub fn with_policies(
        mut self,
        sample_policy: SampleVerdictPolicy,
        keep_policy: EpisodeKeepPolicy,
    ) -> Self {
        self.sample_policy = sample_policy;
        self.keep_policy = keep_policy;
        self
    }

    /// Flags every episode; format-invalid urls are rejected without a probe.
    pub async fn filter_valid_episodes(
        &self,
        episodes: &[EpisodeCandidate],
    ) -> Vec<ValidatedEpisode> {
        let format_valid = episodes
            .iter()
            .filter(|ep| is_valid_url_format(&ep.url))
            .collect::<Vec<_>>();

        if format_valid.is_empty() {
            return episodes.iter().map(|ep| flag(ep, false)).collect();
        }

        let mut samples = format_valid.clone();
        samples.sort_by_key(|ep| ep.index);
        samples.truncate(self.sample_size.max(1));

        // Each call gets its own cap; concurrent requests never share permits.
        let queue = ProbeQueue::new(self.probe_concurrency);
        let results = queue
            .run_all(samples.iter().map(|ep| self.probe.probe(&ep.url)))
            .await;
        let samples_ok = (self.sample_policy)(&results);

        tracing::debug!(
            episodes = episodes.len(),
            format_valid = format_valid.len(),
            sampled = results.len(),
            samples_ok,
            "episode samples probed"
        );

        episodes
            .iter()
            .map(|ep| {
                let valid = is_valid_url_format(&ep.url) && (self.keep_policy)(ep, samples_ok);
                flag(ep, valid)
            })
            .collect()
    }

    /// Only the episodes judged playable, in their original order.
    pub async fn playable_episodes(&self, episodes: &[EpisodeCandidate]) -> Vec<EpisodeCandidate> {
        self.filter_valid_episodes(episodes)
            .await
            .into_iter()
            .filter(|ep| ep.is_valid)
            .map(EpisodeCandidate::from)
            .collect()
    }
}

fn flag(ep: &EpisodeCandidate, is_valid: bool) -> ValidatedEpisode {
    ValidatedEpisode {
        index: ep.index,
        name: ep.name.clone(),
        url: ep.url.clone(),
        is_valid,
    }
}
