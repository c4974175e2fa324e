use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::formats::SourceConfig;

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_PROBE_RETRIES: u32 = 2;
pub const DEFAULT_PROBE_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_EPISODE_SAMPLE_SIZE: usize = 3;
pub const DEFAULT_EPISODE_PROBE_CONCURRENCY: usize = 5;
pub const DEFAULT_SOURCE_SAMPLE_SIZE: usize = 3;
/// Upper bound for both episode and source sample sizes.
pub const MAX_SAMPLE_SIZE: usize = 3;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 10;

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Tunables for liveness probing and sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    pub timeout: Duration,
    /// Additional attempts after the first one.
    pub retries: u32,
    pub retry_delay: Duration,
    pub episode_sample_size: usize,
    pub episode_probe_concurrency: usize,
    pub source_sample_size: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            retries: DEFAULT_PROBE_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_PROBE_RETRY_DELAY_MS),
            episode_sample_size: DEFAULT_EPISODE_SAMPLE_SIZE,
            episode_probe_concurrency: DEFAULT_EPISODE_PROBE_CONCURRENCY,
            source_sample_size: DEFAULT_SOURCE_SAMPLE_SIZE,
        }
    }
}

impl ProbeSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`. Sample sizes are capped at
    /// [`MAX_SAMPLE_SIZE`] so checks stay sampled, never exhaustive.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let sample_size = |key: &str, default: usize| {
            parse_var::<usize>(&lookup, key)
                .filter(|v| *v > 0)
                .map(|v| v.min(MAX_SAMPLE_SIZE))
                .unwrap_or(default)
        };
        Self {
            timeout: parse_var::<u64>(&lookup, "VODPROBE_PROBE_TIMEOUT_MS")
                .filter(|v| *v > 0)
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            retries: parse_var(&lookup, "VODPROBE_PROBE_RETRIES").unwrap_or(defaults.retries),
            retry_delay: parse_var::<u64>(&lookup, "VODPROBE_PROBE_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
            episode_sample_size: sample_size(
                "VODPROBE_EPISODE_SAMPLE_SIZE",
                defaults.episode_sample_size,
            ),
            episode_probe_concurrency: parse_var::<usize>(
                &lookup,
                "VODPROBE_EPISODE_PROBE_CONCURRENCY",
            )
            .filter(|v| *v > 0)
            .unwrap_or(defaults.episode_probe_concurrency),
            source_sample_size: sample_size(
                "VODPROBE_SOURCE_SAMPLE_SIZE",
                defaults.source_sample_size,
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            user_agent: BROWSER_USER_AGENT.to_owned(),
        }
    }
}

impl UpstreamSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            timeout: parse_var::<u64>(&lookup, "VODPROBE_UPSTREAM_TIMEOUT_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            user_agent: defaults.user_agent,
        }
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
struct SourcesFile {
    sources: Vec<SourceConfig>,
}

/// Static id -> source lookup, loaded once at start-up.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<SourceConfig>,
}

impl SourceRegistry {
    pub fn new(sources: Vec<SourceConfig>) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            if source.id.trim().is_empty() {
                anyhow::bail!("source id must not be empty (name: {})", source.name);
            }
            if !seen.insert(source.id.as_str()) {
                anyhow::bail!("duplicate source id: {}", source.id);
            }
        }
        Ok(Self { sources })
    }

    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let file: SourcesFile = serde_yaml::from_str(yaml).context("parse sources yaml")?;
        Self::new(file.sources)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("read sources file: {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("load sources: {}", path.display()))
    }

    pub fn get(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn all(&self) -> &[SourceConfig] {
        &self.sources
    }

    /// Enabled sources ordered by priority (declaration order breaks ties).
    pub fn enabled(&self) -> Vec<SourceConfig> {
        let mut out = self
            .sources
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect::<Vec<_>>();
        out.sort_by_key(|s| s.priority);
        out
    }

    /// Resolves ids to enabled configs in first-seen order. Unknown,
    /// disabled and repeated ids are dropped.
    pub fn resolve(&self, ids: &[String]) -> Vec<SourceConfig> {
        let mut seen = HashSet::new();
        ids.iter()
            .filter_map(|id| self.get(id.trim()))
            .filter(|s| s.enabled && seen.insert(s.id.as_str()))
            .cloned()
            .collect()
    }

    /// Display name for a source id, falling back to the id itself.
    pub fn display_name(&self, id: &str) -> String {
        self.get(id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| id.to_owned())
    }
}
