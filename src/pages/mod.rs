//! Page components
//!
//! A page is a plain value: an optional `prefetch` step that receives the
//! request store's dispatch capability, and a `render` step that receives
//! the hydrated state snapshot and writes its head metadata. Data sources
//! are passed to page constructors.

mod home;
mod posts;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::http::StatusCode;

use crate::config::Config;
use crate::render::Head;
use crate::state::{Dispatch, State};
use crate::utils::escape_html;

pub use home::HomePage;
pub use posts::{JsonFilePosts, PostSource, PostsPage, StaticPosts};

/// Page trait - implement this to add a server-rendered page
#[async_trait]
pub trait Page: Send + Sync {
    /// Page name for logging and error messages
    fn name(&self) -> &str;

    /// Fetch data and dispatch it into the request store before rendering
    async fn prefetch(&self, _dispatch: &mut dyn Dispatch) -> Result<()> {
        Ok(())
    }

    /// Render body markup from a state snapshot
    fn render(&self, state: &State, head: &mut Head) -> String;
}

/// Fallback for paths with no route
pub struct NotFoundPage;

impl Page for NotFoundPage {
    fn name(&self) -> &str {
        "not-found"
    }

    fn render(&self, _state: &State, head: &mut Head) -> String {
        head.title("Not Found");
        layout("<h3>Page not found</h3>")
    }
}

/// Shared page chrome
pub fn layout(content: &str) -> String {
    format!(
        r#"<div class="layout"><nav><a href="/">Home</a> | <a href="/posts">Posts</a></nav><main>{}</main></div>"#,
        content
    )
}

/// Render an escaped list
pub fn list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    let items: String = items
        .into_iter()
        .map(|item| format!("<li>{}</li>", escape_html(item)))
        .collect();
    format!("<ul>{}</ul>", items)
}

/// Exact-path route table
pub struct Routes {
    routes: Vec<(String, Arc<dyn Page>)>,
    not_found: Arc<dyn Page>,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            not_found: Arc::new(NotFoundPage),
        }
    }
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in pages, with the posts page reading the configured mock data
    pub fn standard(config: &Config) -> Self {
        let posts: Arc<dyn PostSource> = match config.mock_posts_path() {
            Some(path) => Arc::new(JsonFilePosts::new(path)),
            None => Arc::new(StaticPosts::default()),
        };

        Self::new()
            .route("/", Arc::new(HomePage))
            .route("/posts", Arc::new(PostsPage::new(posts)))
    }

    pub fn route(mut self, path: &str, page: Arc<dyn Page>) -> Self {
        self.routes.push((normalize(path).to_string(), page));
        self
    }

    pub fn not_found(mut self, page: Arc<dyn Page>) -> Self {
        self.not_found = page;
        self
    }

    /// Page for a request path, with the status it should be served with
    pub fn resolve(&self, path: &str) -> (StatusCode, Arc<dyn Page>) {
        let path = normalize(path);
        self.routes
            .iter()
            .find(|(route, _)| route == path)
            .map(|(_, page)| (StatusCode::OK, page.clone()))
            .unwrap_or_else(|| (StatusCode::NOT_FOUND, self.not_found.clone()))
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or("");
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes() -> Routes {
        Routes::new()
            .route("/", Arc::new(HomePage))
            .route("/posts/", Arc::new(PostsPage::new(Arc::new(StaticPosts::default()))))
    }

    #[test]
    fn test_resolve_exact_paths() {
        let routes = routes();

        let (status, page) = routes.resolve("/");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.name(), "home");

        let (status, page) = routes.resolve("/posts");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page.name(), "posts");
    }

    #[test]
    fn test_resolve_ignores_trailing_slash_and_query() {
        let routes = routes();
        assert_eq!(routes.resolve("/posts/?page=2").1.name(), "posts");
        assert_eq!(routes.resolve("").1.name(), "home");
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let (status, page) = routes().resolve("/missing");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(page.name(), "not-found");
    }

    #[test]
    fn test_list_escapes_items() {
        assert_eq!(list(["a", "<b>"]), "<ul><li>a</li><li>&lt;b&gt;</li></ul>");
    }
}
