//! Render error types and their HTTP mapping

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::manifest::ManifestError;
use crate::utils::escape_html;

/// Errors that abort a single render
#[derive(Error, Debug)]
pub enum RenderError {
    /// Manifest could not be obtained
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// A page's data fetch failed
    #[error("prefetch for page '{page}' failed: {source}")]
    Prefetch {
        page: String,
        #[source]
        source: anyhow::Error,
    },

    /// Initial state could not be serialized
    #[error("failed to serialize initial state: {0}")]
    State(#[from] serde_json::Error),
}

impl RenderError {
    pub fn status(&self) -> StatusCode {
        match self {
            RenderError::Manifest(ManifestError::NotReady) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        let status = self.status();
        error!("Render failed ({}): {}", status, self);

        let body = format!(
            "<!DOCTYPE html><html><head><title>{}</title></head><body><h1>{}</h1><pre>{}</pre></body></html>",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Error"),
            escape_html(&self.to_string())
        );

        (status, Html(body)).into_response()
    }
}
