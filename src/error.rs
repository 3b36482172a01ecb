use crate::tmdb::TmdbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub const MISSING_KEY_MESSAGE: &str =
    "TMDB API key is not configured. Set TMDB_API_KEY in the environment or .env file.";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    Configuration(String),

    #[error("TMDB request failed: {0}")]
    Provider(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Favorites storage error: {0}")]
    Storage(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl CatalogError {
    pub fn missing_api_key() -> Self {
        CatalogError::Configuration(MISSING_KEY_MESSAGE.to_string())
    }
}

impl From<anyhow::Error> for CatalogError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast_ref::<TmdbError>() {
            Some(TmdbError::MissingApiKey) => CatalogError::missing_api_key(),
            Some(e) if e.is_not_found() => CatalogError::NotFound(format!("{:#}", err)),
            _ => CatalogError::Provider(format!("{:#}", err)),
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = match &self {
            CatalogError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Provider(_) => StatusCode::BAD_GATEWAY,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CatalogError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
