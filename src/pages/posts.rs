//! Posts list page and the data sources it can fetch from

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::render::Head;
use crate::state::{Action, Dispatch, RawPost, State};

use super::{layout, list, Page};

/// Where the posts page gets its records
#[async_trait]
pub trait PostSource: Send + Sync {
    async fn fetch_posts(&self) -> Result<Vec<RawPost>>;
}

/// Fixed records, used when no mock file is configured
#[derive(Debug, Clone, Default)]
pub struct StaticPosts {
    posts: Vec<(u64, String)>,
}

impl StaticPosts {
    pub fn new(posts: Vec<(u64, String)>) -> Self {
        Self { posts }
    }
}

#[async_trait]
impl PostSource for StaticPosts {
    async fn fetch_posts(&self) -> Result<Vec<RawPost>> {
        Ok(self
            .posts
            .iter()
            .map(|(id, title)| RawPost {
                id: *id,
                title: title.clone(),
                extra: serde_json::Map::new(),
            })
            .collect())
    }
}

/// Mock API response read from a JSON file on every fetch
#[derive(Debug, Clone)]
pub struct JsonFilePosts {
    path: PathBuf,
}

/// Either a `{ "data": [...] }` envelope or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum PostsDocument {
    Envelope { data: Vec<RawPost> },
    List(Vec<RawPost>),
}

impl JsonFilePosts {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PostSource for JsonFilePosts {
    async fn fetch_posts(&self) -> Result<Vec<RawPost>> {
        debug!("Fetching posts from {}", self.path.display());

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read mock posts: {}", self.path.display()))?;
        let document: PostsDocument = serde_json::from_str(&content)
            .with_context(|| format!("Invalid mock posts: {}", self.path.display()))?;

        Ok(match document {
            PostsDocument::Envelope { data } => data,
            PostsDocument::List(data) => data,
        })
    }
}

/// List of posts, prefetched from the injected source
pub struct PostsPage {
    source: Arc<dyn PostSource>,
}

impl PostsPage {
    pub fn new(source: Arc<dyn PostSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Page for PostsPage {
    fn name(&self) -> &str {
        "posts"
    }

    async fn prefetch(&self, dispatch: &mut dyn Dispatch) -> Result<()> {
        let posts = self.source.fetch_posts().await?;
        dispatch.dispatch(Action::PostsFetched(posts));
        Ok(())
    }

    fn render(&self, state: &State, head: &mut Head) -> String {
        head.title("Posts");

        let posts = list(state.posts.iter().map(|post| post.title.as_str()));
        layout(&format!("<h3>Protected list of posts</h3>{}", posts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Store;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_prefetch_then_render() {
        let source = StaticPosts::new(vec![(1, "First".to_string()), (2, "Second".to_string())]);
        let page = PostsPage::new(Arc::new(source));

        let mut store = Store::new(State::default());
        page.prefetch(&mut store).await.unwrap();

        let mut head = Head::new();
        let body = page.render(store.state(), &mut head);
        assert!(body.contains("<ul><li>First</li><li>Second</li></ul>"));
        assert_eq!(head.get_title(), Some("Posts"));
    }

    #[tokio::test]
    async fn test_json_file_envelope_and_list() {
        let dir = tempfile::tempdir().unwrap();

        let envelope = dir.path().join("envelope.json");
        std::fs::write(&envelope, r#"{"data": [{"id": 7, "title": "t", "body": "b"}]}"#).unwrap();
        let posts = JsonFilePosts::new(envelope).fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, 7);

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, r#"[{"id": 1, "title": "a"}, {"id": 2, "title": "b"}]"#).unwrap();
        let posts = JsonFilePosts::new(bare).fetch_posts().await.unwrap();
        assert_eq!(posts.len(), 2);
    }

    #[tokio::test]
    async fn test_json_file_missing() {
        let source = JsonFilePosts::new(PathBuf::from("/definitely/missing/posts.json"));
        let err = source.fetch_posts().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read mock posts"));
    }
}
