// error.rs
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by models and the executor behind them.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied value failed its attribute's type check, or a
    /// required identifier was missing.
    #[error("The value for {attribute} is invalid.")]
    Validation { attribute: String },

    /// Input handed to `create`/`update` did not serialize to an object.
    #[error("input must serialize to a JSON object")]
    InputShape,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(attribute: impl Into<String>) -> Self {
        Error::Validation {
            attribute: attribute.into(),
        }
    }

    /// HTTP status for callers that bridge to a request/response boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation { .. } | Error::InputShape => 400,
            Error::Database(_) | Error::Json(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::InputShape => "INPUT_SHAPE",
            Error::Database(_) => "DATABASE_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() == 400
    }
}
