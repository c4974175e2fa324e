use std::sync::Arc;

use serde::Deserialize;

use crate::config::SourceRegistry;
use crate::episodes::EpisodeValidator;
use crate::error::ApiError;
use crate::formats::VideoDetail;
use crate::upstream::VideoCatalog;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    /// API base that bypasses the source registry.
    #[serde(default)]
    pub custom_api: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub struct DetailService {
    registry: Arc<SourceRegistry>,
    catalog: Arc<dyn VideoCatalog>,
    validator: EpisodeValidator,
}

impl DetailService {
    pub fn new(
        registry: Arc<SourceRegistry>,
        catalog: Arc<dyn VideoCatalog>,
        validator: EpisodeValidator,
    ) -> Self {
        Self {
            registry,
            catalog,
            validator,
        }
    }

    /// Fetches a video and keeps only the episodes judged playable.
    pub async fn fetch(&self, request: &DetailRequest) -> Result<VideoDetail, ApiError> {
        let id = present(&request.id)
            .ok_or_else(|| ApiError::client_input("Missing video ID parameter"))?;

        let fetched = match present(&request.custom_api) {
            Some(api_base) => self.catalog.detail_custom(api_base, id).await,
            None => {
                let source_id = present(&request.source)
                    .ok_or_else(|| ApiError::client_input("Missing source parameter"))?;
                let source = self
                    .registry
                    .get(source_id)
                    .ok_or_else(|| ApiError::client_input("Invalid source ID"))?;
                self.catalog.detail(source, id).await
            }
        };

        let mut detail = fetched.map_err(|err| {
            tracing::error!(video_id = id, error = %format!("{err:#}"), "detail fetch failed");
            ApiError::upstream(&err)
        })?;

        let total = detail.episodes.len();
        let playable = self.validator.playable_episodes(&detail.episodes).await;
        tracing::info!(
            video_id = id,
            source_id = %detail.summary.source,
            playable = playable.len(),
            total,
            "validated episodes"
        );

        if playable.is_empty() {
            return Err(ApiError::NoPlayableContent);
        }
        detail.episodes = playable;
        Ok(detail)
    }
}
