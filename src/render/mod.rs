//! Server-side rendering pipeline
//!
//! A request goes through two phases:
//! 1. the page renders its body and records head metadata into a [`Head`]
//! 2. the full document is composed from that output, the manifest's asset
//!    tags and the serialized request state
//!
//! The head is only complete once the body has rendered, so the two phases
//! cannot be merged.

mod document;
mod error;
mod head;

use std::sync::Arc;

use axum::http::StatusCode;
use tracing::debug;

use crate::manifest::ManifestSource;
use crate::pages::{Page, Routes};
use crate::state::{State, Store};

pub use document::{compose_document, DocumentOptions, INITIAL_STATE_GLOBAL};
pub use error::RenderError;
pub use head::Head;

/// Output of the first render phase
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub body: String,
    pub head: Head,
}

/// Phase 1: render a page against a hydrated state snapshot
pub fn render_page(page: &dyn Page, state: &State) -> Rendered {
    let mut head = Head::new();
    let body = page.render(state, &mut head);
    Rendered { body, head }
}

/// A finished document and the status to serve it with
#[derive(Debug)]
pub struct RenderedDocument {
    pub status: StatusCode,
    pub html: String,
}

/// Per-request render pipeline
pub struct Renderer {
    routes: Arc<Routes>,
    initial_state: State,
    manifest: ManifestSource,
    options: DocumentOptions,
}

impl Renderer {
    pub fn new(
        routes: Arc<Routes>,
        initial_state: State,
        manifest: ManifestSource,
        options: DocumentOptions,
    ) -> Self {
        Self {
            routes,
            initial_state,
            manifest,
            options,
        }
    }

    /// Render the document for a request path
    pub async fn render(&self, path: &str) -> Result<RenderedDocument, RenderError> {
        let manifest = self.manifest.load()?;
        let (status, page) = self.routes.resolve(path);
        debug!("Rendering {} with page '{}'", path, page.name());

        let mut store = Store::new(self.initial_state.clone());
        page.prefetch(&mut store)
            .await
            .map_err(|source| RenderError::Prefetch {
                page: page.name().to_string(),
                source,
            })?;
        let state = store.into_state();

        let rendered = render_page(page.as_ref(), &state);
        let html = compose_document(&rendered, &manifest, &state, &self.options)?;

        Ok(RenderedDocument { status, html })
    }
}
