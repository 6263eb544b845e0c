//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::state::User;

/// Project metadata configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Default document title when a page sets none
    #[serde(default)]
    pub title: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output directory
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// URL prefix the built assets are served under
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Manifest filename, written inside the output directory
    #[serde(default = "default_manifest")]
    pub manifest: String,

    /// Hash assets for cache busting
    #[serde(default = "default_true")]
    pub hash: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            public_path: default_public_path(),
            manifest: default_manifest(),
            hash: true,
        }
    }
}

fn default_output_dir() -> String {
    "dist".to_string()
}

fn default_public_path() -> String {
    "/static/".to_string()
}

fn default_manifest() -> String {
    "webpack-stats.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Development server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevConfig {
    /// App server port; the asset server listens on the next port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Enable hot reload notifications
    #[serde(default = "default_true")]
    pub hmr: bool,

    /// Glob patterns the watcher ignores, relative to the project root
    #[serde(default)]
    pub watch_ignore: Vec<String>,
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            hmr: true,
            watch_ignore: Vec::new(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "localhost".to_string()
}

/// Initial state every request-scoped store starts from
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub users: Vec<User>,

    /// Names dispatched as `AddUser` into each new store
    #[serde(default)]
    pub seed_users: Vec<String>,
}

/// Mock data used by the built-in pages
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// JSON file the posts page fetches from
    #[serde(default)]
    pub posts: Option<String>,
}
