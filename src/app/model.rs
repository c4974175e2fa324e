use serde::Deserialize;

use crate::config::SourceRegistry;
use crate::error::ApiError;
use crate::formats::SourceConfig;

/// `GET /api/search` query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub query: Option<String>,
    /// Comma separated source ids; all enabled sources when absent.
    pub sources: Option<String>,
    pub page: Option<String>,
}

/// `POST /api/search` body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub page: Option<u32>,
}

/// A search that passed input validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSearch {
    pub query: String,
    pub sources: Vec<SourceConfig>,
    pub page: u32,
}

impl SearchQuery {
    pub fn validate(self, registry: &SourceRegistry) -> Result<ValidatedSearch, ApiError> {
        let query = self
            .q
            .filter(|q| !q.trim().is_empty())
            .or(self.query)
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ApiError::client_input("Missing query parameter"))?;

        let sources = match self.sources.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let ids = raw.split(',').map(str::to_owned).collect::<Vec<_>>();
                registry.resolve(&ids)
            }
            _ => registry.enabled(),
        };

        let page = self
            .page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .filter(|p| *p > 0)
            .unwrap_or(1);

        finish(query, sources, page)
    }
}

impl SearchRequest {
    pub fn validate(self, registry: &SourceRegistry) -> Result<ValidatedSearch, ApiError> {
        let query = self
            .query
            .map(|q| q.trim().to_owned())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ApiError::client_input("Invalid or missing query parameter"))?;

        let ids = self
            .sources
            .filter(|ids| !ids.is_empty())
            .ok_or_else(|| ApiError::client_input("At least one source must be specified"))?;

        finish(query, registry.resolve(&ids), self.page.unwrap_or(1).max(1))
    }
}

fn finish(
    query: String,
    sources: Vec<SourceConfig>,
    page: u32,
) -> Result<ValidatedSearch, ApiError> {
    if sources.is_empty() {
        return Err(ApiError::client_input("No valid sources found"));
    }
    Ok(ValidatedSearch {
        query,
        sources,
        page,
    })
}
