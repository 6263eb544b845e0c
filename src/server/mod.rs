//! HTTP servers
//!
//! - the app server renders pages for every request path
//! - the asset server (development only) serves compiled assets and the
//!   HMR WebSocket
//!
//! In production the app server also serves the compiled assets itself.

mod hmr;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    handler::Handler,
    http::Uri,
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::render::Renderer;

pub use hmr::{client_script, HmrMessage, HMR_PATH};

/// Shared app server state
pub struct AppState {
    renderer: Renderer,
}

/// Shared asset server state
pub struct AssetState {
    /// HMR broadcast channel
    hmr_tx: broadcast::Sender<HmrMessage>,
}

/// Compiled assets and the URL prefix they are served under
#[derive(Debug, Clone)]
pub struct AssetMount {
    pub public_path: String,
    pub dir: PathBuf,
}

/// Router for the server-rendered app.
///
/// With an asset mount, files under the public path are served from disk
/// and every other path is rendered.
pub fn app_router(renderer: Renderer, assets: Option<AssetMount>) -> Router {
    let state = Arc::new(AppState { renderer });

    let router = match assets {
        Some(mount) if mount.public_path.starts_with('/') => {
            let prefix = mount.public_path.trim_end_matches('/');
            if prefix.is_empty() {
                let render = render_page.with_state(state.clone());
                Router::new().fallback_service(ServeDir::new(&mount.dir).fallback(render))
            } else {
                Router::new()
                    .nest_service(prefix, ServeDir::new(&mount.dir))
                    .fallback(render_page)
                    .with_state(state)
            }
        }
        Some(mount) => {
            warn!(
                "Public path {} is not local, assets will not be served",
                mount.public_path
            );
            Router::new().fallback(render_page).with_state(state)
        }
        None => Router::new().fallback(render_page).with_state(state),
    };

    router.layer(TraceLayer::new_for_http())
}

/// Router for the development asset server
pub fn asset_router(mount: AssetMount, hmr_tx: broadcast::Sender<HmrMessage>) -> Router {
    let state = Arc::new(AssetState { hmr_tx });
    let prefix = mount.public_path.trim_end_matches('/').to_string();

    let router = Router::new()
        .route(HMR_PATH, get(hmr::hmr_websocket))
        .with_state(state);

    let router = if prefix.is_empty() || !prefix.starts_with('/') {
        router.fallback_service(ServeDir::new(&mount.dir))
    } else {
        router.nest_service(&prefix, ServeDir::new(&mount.dir))
    };

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve a router until the process exits
pub async fn serve(router: Router, host: &str, port: u16, label: &str) -> Result<()> {
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {} server to {}:{}", label, host, port))?;
    let addr: SocketAddr = listener.local_addr()?;

    info!("{} server listening on http://{}", label, addr);

    axum::serve(listener, router).await?;

    Ok(())
}

/// Render the page for the request path
async fn render_page(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    match state.renderer.render(uri.path()).await {
        Ok(doc) => (doc.status, Html(doc.html)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ChunkAssets, ChunkMap, LiveManifest, Manifest, ManifestSource};
    use crate::pages::{HomePage, Routes};
    use crate::render::DocumentOptions;
    use crate::state::{State as AppData, User};
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn renderer(source: ManifestSource) -> Renderer {
        let routes = Routes::new().route("/", Arc::new(HomePage));
        let initial = AppData {
            users: vec![User { name: "Joe".to_string() }],
            posts: Vec::new(),
        };
        Renderer::new(Arc::new(routes), initial, source, DocumentOptions::default())
    }

    async fn get(router: Router, path: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_renders_with_live_manifest() {
        let live = LiveManifest::new();
        let mut chunks = ChunkMap::new();
        chunks.insert("main", ChunkAssets::Single("main.js".to_string()));
        live.publish(Manifest::new("/static/", chunks));

        let router = app_router(renderer(ManifestSource::Live(live)), None);
        let (status, body) = get(router, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<li>Joe</li>"));
        assert!(body.contains(r#"<script src="/static/main.js"></script>"#));
    }

    #[tokio::test]
    async fn test_not_ready_is_unavailable() {
        let router = app_router(renderer(ManifestSource::Live(LiveManifest::new())), None);
        let (status, _) = get(router, "/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_missing_manifest_file_is_reported_per_request() {
        let dir = tempfile::tempdir().unwrap();
        let source = ManifestSource::Disk(dir.path().join("webpack-stats.json"));
        let router = app_router(renderer(source), None);

        let (status, body) = get(router.clone(), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("run `dace build` first"));

        // the server keeps answering once the build exists
        std::fs::write(
            dir.path().join("webpack-stats.json"),
            r#"{"publicPath": "/static/", "assetsByChunkName": {}}"#,
        )
        .unwrap();
        let (status, _) = get(router, "/").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_production_serves_assets_under_public_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.js"), "console.log(1)").unwrap();
        std::fs::write(
            dir.path().join("webpack-stats.json"),
            r#"{"publicPath": "/static/", "assetsByChunkName": {"main": "main.js"}}"#,
        )
        .unwrap();

        let source = ManifestSource::Disk(dir.path().join("webpack-stats.json"));
        let mount = AssetMount {
            public_path: "/static/".to_string(),
            dir: dir.path().to_path_buf(),
        };
        let router = app_router(renderer(source), Some(mount));

        let (status, body) = get(router.clone(), "/static/main.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "console.log(1)");

        let (status, body) = get(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<li>Joe</li>"));
    }

    #[tokio::test]
    async fn test_root_public_path_falls_back_to_render() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body{}").unwrap();
        std::fs::write(
            dir.path().join("webpack-stats.json"),
            r#"{"publicPath": "/", "assetsByChunkName": {"app": "app.css"}}"#,
        )
        .unwrap();

        let source = ManifestSource::Disk(dir.path().join("webpack-stats.json"));
        let mount = AssetMount {
            public_path: "/".to_string(),
            dir: dir.path().to_path_buf(),
        };
        let router = app_router(renderer(source), Some(mount));

        let (_, body) = get(router.clone(), "/app.css").await;
        assert_eq!(body, "body{}");

        let (status, body) = get(router, "/missing-page").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.contains(r#"<link rel="stylesheet" href="/app.css"/>"#));
    }

    #[tokio::test]
    async fn test_asset_router_serves_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("main.css"), "a{}").unwrap();
        let (tx, _) = broadcast::channel(16);

        let mount = AssetMount {
            public_path: "/static/".to_string(),
            dir: dir.path().to_path_buf(),
        };
        let (status, body) = get(asset_router(mount, tx), "/static/main.css").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "a{}");
    }
}
