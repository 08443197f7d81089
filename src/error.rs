use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchupError {
    #[error("matchup must look like `LAL vs DAL`, got `{0}`")]
    Malformed(String),
    #[error("unknown team abbreviation `{0}`")]
    UnknownTeam(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API_SPORTS_KEY is not set")]
    MissingKey,
    #[error("http {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api-sports error: {message}")]
    Envelope { message: String, throttled: bool },
    #[error("stats api unavailable after {attempts} attempts: {last}")]
    Unavailable { attempts: u32, last: String },
}

impl ApiError {
    /// Timeouts, throttling (HTTP 429 or a quota envelope) and server-side failures are
    /// worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::MissingKey | ApiError::Unavailable { .. } => false,
            ApiError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ApiError::Envelope { throttled, .. } => *throttled,
            ApiError::Transport(err) => err.is_timeout() || err.is_connect() || err.is_request(),
        }
    }
}

/// Raised when too many per-player fetches fail for the slip to mean anything.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{failed} of {total} player fetches failed, first: {first}")]
pub struct PlayerFetchError {
    pub failed: usize,
    pub total: usize,
    pub first: String,
}
