use thiserror::Error;

pub const NO_PLAYABLE_EPISODES: &str =
    "No playable episodes found from this source. Please try another source.";

/// Request-level failures. Per-source and per-probe failures never reach
/// this type; they only exclude the source or episode they belong to.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    ClientInput(String),

    #[error("No playable episodes found from this source. Please try another source.")]
    NoPlayableContent,

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn client_input(message: impl Into<String>) -> Self {
        Self::ClientInput(message.into())
    }

    pub fn upstream(err: &anyhow::Error) -> Self {
        Self::Upstream(format!("{err:#}"))
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::ClientInput(_) => 400,
            Self::NoPlayableContent => 404,
            Self::Upstream(_) | Self::Internal(_) => 500,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}
