use serde::{Deserialize, Serialize};

/// One upstream provider as declared in the sources file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceConfig {
    pub id: String,
    pub name: String,
    /// Base CMS endpoint used for search (and detail unless `detail_url` is set).
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail_url: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub priority: i32,
}

fn default_enabled() -> bool {
    true
}

impl SourceConfig {
    pub fn detail_endpoint(&self) -> &str {
        self.detail_url.as_deref().unwrap_or(&self.api_url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    /// Id of the source this summary was fetched from.
    pub source: String,
    /// Provider encoded episode blob (`name$url#name$url$$$...`).
    #[serde(default)]
    pub play_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EpisodeCandidate {
    pub index: usize,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedEpisode {
    pub index: usize,
    pub name: String,
    pub url: String,
    pub is_valid: bool,
}

impl From<ValidatedEpisode> for EpisodeCandidate {
    fn from(ep: ValidatedEpisode) -> Self {
        Self {
            index: ep.index,
            name: ep.name,
            url: ep.url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetail {
    #[serde(flatten)]
    pub summary: VideoSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    pub episodes: Vec<EpisodeCandidate>,
}

/// Outcome of one source's search call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultSet {
    pub source: String,
    pub videos: Vec<VideoSummary>,
    pub response_time_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceAvailabilityResult {
    pub source_id: String,
    pub source_name: String,
    pub is_available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix epoch milliseconds.
    pub checked_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceResults {
    pub source: String,
    pub results: Vec<VideoSummary>,
    pub response_time: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub page: u32,
    pub sources: Vec<SourceResults>,
    pub total_results: usize,
    pub available_sources: usize,
    pub total_sources: usize,
    pub source_availability: Vec<SourceAvailabilityResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetailResponse {
    pub success: bool,
    pub data: VideoDetail,
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
