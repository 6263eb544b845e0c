//! Configuration handling for Dace
//!
//! Parses and manages dace.toml configuration files.

mod schema;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::debug;

pub use schema::*;

/// Environment variable overriding `dev.port`
pub const PORT_ENV: &str = "DACE_PORT";

/// Environment variable forcing the run mode
pub const MODE_ENV: &str = "DACE_ENV";

/// Whether the manifest comes from a live compiler or from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Mode forced through `DACE_ENV`, falling back to the given default
    pub fn from_env_or(default: Mode) -> Mode {
        match std::env::var(MODE_ENV).ok().as_deref().and_then(Mode::parse) {
            Some(mode) => mode,
            None => default,
        }
    }

    fn parse(value: &str) -> Option<Mode> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Some(Mode::Development),
            "production" | "prod" => Some(Mode::Production),
            _ => None,
        }
    }

    pub fn is_dev(self) -> bool {
        self == Mode::Development
    }
}

/// Entry chunks in the order they appear in dace.toml
#[derive(Debug, Clone, Default)]
pub struct Entries(Vec<(String, Vec<String>)>);

impl Entries {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, files)| (name.as_str(), files.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<'de> Deserialize<'de> for Entries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = Entries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of chunk names to lists of source files")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Entries, A::Error> {
                let mut entries = Vec::new();
                while let Some((name, files)) = access.next_entry::<String, Vec<String>>()? {
                    entries.push((name, files));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Project metadata
    pub project: ProjectConfig,

    /// Client entry chunks
    #[serde(default)]
    pub entries: Entries,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Development server settings
    #[serde(default)]
    pub dev: DevConfig,

    /// Initial request state
    #[serde(default)]
    pub state: StateConfig,

    /// Mock data sources
    #[serde(default)]
    pub mock: MockConfig,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut config = Self::parse(&content, root)?;
        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text for a project rooted at `root`
    pub fn parse(content: &str, root: PathBuf) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse dace.toml")?;
        config.root = root;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.dev.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} must be a port number, got '{}'", PORT_ENV, port))?;
            debug!("Port overridden from {}: {}", PORT_ENV, self.dev.port);
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            anyhow::bail!("At least one entry must be specified in dace.toml");
        }

        for (name, files) in self.entries.iter() {
            if files.is_empty() {
                anyhow::bail!("Entry '{}' lists no source files", name);
            }
            for file in files {
                let full_path = self.root.join(file);
                if !full_path.is_file() {
                    anyhow::bail!(
                        "Entry '{}' points to non-existent file: {}",
                        name,
                        full_path.display()
                    );
                }
            }
        }

        if !self.output.public_path.ends_with('/') {
            anyhow::bail!(
                "output.public_path must end with '/', got '{}'",
                self.output.public_path
            );
        }

        Ok(())
    }

    /// Get the absolute output directory path
    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output.dir)
    }

    /// Absolute path of the production manifest
    pub fn manifest_path(&self) -> PathBuf {
        self.output_dir().join(&self.output.manifest)
    }

    /// Entries with their source files resolved against the root
    pub fn entry_paths(&self) -> Vec<(String, Vec<PathBuf>)> {
        self.entries
            .iter()
            .map(|(name, files)| {
                (
                    name.to_string(),
                    files.iter().map(|f| self.root.join(f)).collect(),
                )
            })
            .collect()
    }

    /// Absolute path of the mock posts file, if configured
    pub fn mock_posts_path(&self) -> Option<PathBuf> {
        self.mock.posts.as_ref().map(|p| self.root.join(p))
    }
}
