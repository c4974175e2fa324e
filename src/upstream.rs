//! Clients for the third-party catalog APIs that back each source.

use anyhow::Context as _;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::Deserialize;
use url::Url;

use crate::config::UpstreamSettings;
use crate::formats::{SourceConfig, VideoDetail, VideoSummary};
use crate::playlist::{PlaylistParse, parse_play_url};

#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn search(
        &self,
        source: &SourceConfig,
        query: &str,
        page: u32,
    ) -> anyhow::Result<Vec<VideoSummary>>;

    async fn detail(&self, source: &SourceConfig, id: &str) -> anyhow::Result<VideoDetail>;

    /// Detail lookup against an arbitrary API base, outside the registry.
    async fn detail_custom(&self, api_base: &str, id: &str) -> anyhow::Result<VideoDetail>;
}

/// Speaks the `?ac=detail` JSON dialect shared by most CMS video sites.
#[derive(Debug, Clone)]
pub struct CmsCatalog {
    client: reqwest::Client,
    user_agent: String,
}

impl CmsCatalog {
    pub fn new(settings: &UpstreamSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("build upstream http client")?;
        Ok(Self {
            client,
            user_agent: settings.user_agent.clone(),
        })
    }

    async fn fetch_list(&self, url: Url) -> anyhow::Result<Vec<CmsVideo>> {
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("upstream returned HTTP {status} for {url}");
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("read body of {url}"))?;
        let parsed: CmsListResponse =
            serde_json::from_str(&body).with_context(|| format!("parse catalog json from {url}"))?;
        let entries = parsed
            .list
            .ok_or_else(|| anyhow::anyhow!("catalog response from {url} has no list"))?;

        // One malformed entry must not sink the rest of the page.
        let total = entries.len();
        let videos = entries
            .into_iter()
            .enumerate()
            .filter_map(|(position, entry)| match serde_json::from_value::<CmsVideo>(entry) {
                Ok(video) => Some(video),
                Err(err) => {
                    tracing::debug!(%url, position, error = %err, "skipped malformed catalog entry");
                    None
                }
            })
            .collect::<Vec<_>>();
        if videos.len() < total {
            tracing::debug!(%url, kept = videos.len(), total, "catalog list partially parsed");
        }
        Ok(videos)
    }

    async fn fetch_detail(
        &self,
        endpoint: &str,
        source_id: &str,
        id: &str,
    ) -> anyhow::Result<VideoDetail> {
        let url = endpoint_url(endpoint, &[("ac", "detail"), ("ids", id)])?;
        let video = self
            .fetch_list(url)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("video not found: {id}"))?;
        Ok(video.into_detail(source_id))
    }
}

#[async_trait]
impl VideoCatalog for CmsCatalog {
    async fn search(
        &self,
        source: &SourceConfig,
        query: &str,
        page: u32,
    ) -> anyhow::Result<Vec<VideoSummary>> {
        let page = page.max(1).to_string();
        let url = endpoint_url(
            &source.api_url,
            &[("ac", "detail"), ("wd", query), ("pg", &page)],
        )?;
        let list = self.fetch_list(url).await?;
        Ok(list
            .into_iter()
            .map(|video| video.into_summary(&source.id))
            .collect())
    }

    async fn detail(&self, source: &SourceConfig, id: &str) -> anyhow::Result<VideoDetail> {
        self.fetch_detail(source.detail_endpoint(), &source.id, id)
            .await
    }

    async fn detail_custom(&self, api_base: &str, id: &str) -> anyhow::Result<VideoDetail> {
        self.fetch_detail(api_base, api_base, id).await
    }
}

fn endpoint_url(endpoint: &str, params: &[(&str, &str)]) -> anyhow::Result<Url> {
    let mut url =
        Url::parse(endpoint.trim()).with_context(|| format!("parse api url: {endpoint}"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        anyhow::bail!("api url must be http/https: {endpoint}");
    }
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

#[derive(Debug, Deserialize)]
struct CmsListResponse {
    #[serde(default)]
    list: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Self::Int(v) => v.to_string(),
            Self::Float(v) => v.to_string(),
            Self::Text(v) => v,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CmsVideo {
    vod_id: Scalar,
    #[serde(default)]
    vod_name: Option<Scalar>,
    #[serde(default)]
    vod_pic: Option<String>,
    #[serde(default)]
    vod_play_url: Option<String>,
    #[serde(default)]
    vod_year: Option<Scalar>,
    #[serde(default)]
    vod_remarks: Option<Scalar>,
    #[serde(default)]
    type_name: Option<Scalar>,
    #[serde(default)]
    vod_content: Option<Scalar>,
    #[serde(default)]
    vod_actor: Option<Scalar>,
    #[serde(default)]
    vod_director: Option<Scalar>,
    #[serde(default)]
    vod_area: Option<Scalar>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn text(value: Option<Scalar>) -> Option<String> {
    non_empty(value.map(Scalar::into_text))
}

impl CmsVideo {
    fn into_summary(self, source_id: &str) -> VideoSummary {
        self.split(source_id).0
    }

    fn into_detail(self, source_id: &str) -> VideoDetail {
        let (summary, extra) = self.split(source_id);
        let parsed = parse_play_url(&summary.play_url);
        if let PlaylistParse::Partial { skipped, .. } = &parsed {
            tracing::debug!(source_id, video_id = %summary.id, skipped, "skipped malformed episode segments");
        }
        VideoDetail {
            description: extra.description,
            actors: extra.actors,
            director: extra.director,
            area: extra.area,
            episodes: parsed.into_episodes(),
            summary,
        }
    }

    fn split(self, source_id: &str) -> (VideoSummary, DetailExtras) {
        let summary = VideoSummary {
            id: self.vod_id.into_text(),
            title: text(self.vod_name).unwrap_or_default(),
            poster: non_empty(self.vod_pic),
            source: source_id.to_owned(),
            play_url: self.vod_play_url.unwrap_or_default(),
            year: text(self.vod_year),
            remarks: text(self.vod_remarks),
            category: text(self.type_name),
        };
        let extras = DetailExtras {
            description: text(self.vod_content),
            actors: text(self.vod_actor),
            director: text(self.vod_director),
            area: text(self.vod_area),
        };
        (summary, extras)
    }
}

struct DetailExtras {
    description: Option<String>,
    actors: Option<String>,
    director: Option<String>,
    area: Option<String>,
}
