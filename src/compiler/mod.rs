//! Asset compiler
//!
//! Emits one file per (entry chunk, file extension) into the output
//! directory and describes the result as [`Stats`], whose manifest part is
//! what the document renderer consumes.

mod watch;

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::chunks::is_hot_update;
use crate::config::Config;
use crate::manifest::{ChunkAssets, ChunkMap, Manifest};
use crate::utils::{display_path, hash_content, output_filename};

pub use watch::{Rebuild, WatchOptions};

/// An emitted output file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmittedAsset {
    pub name: String,
    pub size: usize,
}

/// Result of one compilation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub hash: String,
    pub public_path: String,
    pub assets_by_chunk_name: ChunkMap,
    pub assets: Vec<EmittedAsset>,
    pub errors: Vec<String>,
    /// Milliseconds spent compiling
    pub time: u64,
}

impl Stats {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The part of the stats the renderer needs
    pub fn to_manifest(&self) -> Manifest {
        Manifest::new(self.public_path.clone(), self.assets_by_chunk_name.clone())
    }
}

/// Write stats to the configured manifest path
pub fn emit_manifest(config: &Config, stats: &Stats) -> Result<PathBuf> {
    let path = config.manifest_path();
    let json = serde_json::to_string_pretty(stats)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("Wrote manifest {}", display_path(&config.root, &path));
    Ok(path)
}

/// The asset compiler
pub struct Compiler {
    /// Project configuration
    config: Arc<Config>,

    /// Emit hot-update artifacts for chunks that changed since last time
    hot: bool,

    /// Content hash of the last emitted JS per chunk
    previous_js: HashMap<String, String>,

    /// Files each chunk emitted in the last compilation
    previous_outputs: HashMap<String, Vec<String>>,
}

impl Compiler {
    /// Create a new compiler instance
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            hot: false,
            previous_js: HashMap::new(),
            previous_outputs: HashMap::new(),
        }
    }

    /// Enable hot-update artifacts on incremental rebuilds
    pub fn with_hot_updates(mut self, hot: bool) -> Self {
        self.hot = hot;
        self
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Remove everything inside the output directory
    pub fn clean(&self) -> Result<()> {
        let output_dir = self.config.output_dir();
        let escapes_root = Path::new(&self.config.output.dir)
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        let inside_root =
            output_dir.starts_with(&self.config.root) && output_dir != self.config.root;
        if escapes_root || !inside_root {
            anyhow::bail!(
                "Refusing to clean output directory outside the project: {}",
                output_dir.display()
            );
        }

        if output_dir.exists() {
            debug!("Cleaning {}", output_dir.display());
            fs::remove_dir_all(&output_dir)
                .with_context(|| format!("Failed to clean {}", output_dir.display()))?;
        }
        Ok(())
    }

    /// Compile every entry chunk
    pub fn compile(&mut self) -> Result<Stats> {
        let start = Instant::now();
        let output_dir = self.config.output_dir();

        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        self.remove_hot_updates(&output_dir)?;

        let mut assets_by_chunk_name = ChunkMap::new();
        let mut assets = Vec::new();
        let mut errors = Vec::new();

        for (chunk, files) in self.config.entry_paths() {
            let groups = match self.read_chunk_sources(&chunk, &files) {
                Ok(groups) => groups,
                Err(e) => {
                    warn!("{:#}", e);
                    errors.push(format!("{:#}", e));
                    continue;
                }
            };

            let mut chunk_files = Vec::new();
            let mut hot_updates = Vec::new();

            for (ext, content) in groups {
                let content_hash = hash_content(content.as_bytes());
                let name_hash = self.config.output.hash.then_some(content_hash.as_str());
                let filename = output_filename(&chunk, name_hash, &ext);

                self.write_asset(&output_dir, &filename, &content, &mut assets)?;
                chunk_files.push(filename);

                if ext == "js" {
                    if let Some(update) = self.hot_update(&chunk, &content_hash) {
                        self.write_asset(&output_dir, &update, &content, &mut assets)?;
                        hot_updates.push(update);
                    }
                    self.previous_js.insert(chunk.clone(), content_hash);
                }
            }

            self.remove_superseded(&output_dir, &chunk, &chunk_files)?;
            chunk_files.extend(hot_updates);
            assets_by_chunk_name.insert(chunk, ChunkAssets::from(chunk_files));
        }

        let names: Vec<&str> = assets.iter().map(|a: &EmittedAsset| a.name.as_str()).collect();
        let hash = hash_content(names.join("\n").as_bytes());

        let stats = Stats {
            hash,
            public_path: self.config.output.public_path.clone(),
            assets_by_chunk_name,
            assets,
            errors,
            time: start.elapsed().as_millis() as u64,
        };

        info!(
            "Compiled {} asset(s) in {}ms ({} error(s))",
            stats.assets.len(),
            stats.time,
            stats.errors.len()
        );

        Ok(stats)
    }

    /// Write the stats document the production server reads its manifest from
    pub fn emit_manifest(&self, stats: &Stats) -> Result<PathBuf> {
        emit_manifest(&self.config, stats)
    }

    /// Read a chunk's sources grouped by extension, in first-appearance order
    fn read_chunk_sources(&self, chunk: &str, files: &[PathBuf]) -> Result<Vec<(String, String)>> {
        let mut groups: Vec<(String, String)> = Vec::new();

        for file in files {
            let ext = file
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .with_context(|| {
                    format!(
                        "Entry '{}': {} has no file extension",
                        chunk,
                        display_path(&self.config.root, file)
                    )
                })?;

            let source = fs::read_to_string(file).with_context(|| {
                format!(
                    "Entry '{}': cannot read {}",
                    chunk,
                    display_path(&self.config.root, file)
                )
            })?;

            match groups.iter_mut().find(|(existing, _)| *existing == ext) {
                Some((_, content)) => {
                    content.push('\n');
                    content.push_str(&source);
                }
                None => groups.push((ext, source)),
            }
        }

        Ok(groups)
    }

    /// Name of the hot-update artifact for a changed chunk, if one is due
    fn hot_update(&self, chunk: &str, content_hash: &str) -> Option<String> {
        if !self.hot {
            return None;
        }
        match self.previous_js.get(chunk) {
            Some(previous) if previous != content_hash => {
                Some(format!("{}.{}.hot-update.js", chunk, previous))
            }
            _ => None,
        }
    }

    fn write_asset(
        &self,
        output_dir: &Path,
        filename: &str,
        content: &str,
        assets: &mut Vec<EmittedAsset>,
    ) -> Result<()> {
        let path = output_dir.join(filename);
        fs::write(&path, content)
            .with_context(|| format!("Failed to write asset: {}", path.display()))?;
        assets.push(EmittedAsset {
            name: filename.to_string(),
            size: content.len(),
        });
        Ok(())
    }

    /// Delete what the chunk emitted last time but no longer does.
    ///
    /// Chunks that fail to compile keep their previous files.
    fn remove_superseded(
        &mut self,
        output_dir: &Path,
        chunk: &str,
        current: &[String],
    ) -> Result<()> {
        let previous = self
            .previous_outputs
            .insert(chunk.to_string(), current.to_vec())
            .unwrap_or_default();

        for name in previous.iter().filter(|name| !current.contains(name)) {
            let path = output_dir.join(name);
            if path.is_file() {
                debug!("Removing superseded {}", name);
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
            }
        }
        Ok(())
    }

    /// Hot-update artifacts only live for one compilation
    fn remove_hot_updates(&self, output_dir: &Path) -> Result<()> {
        for entry in WalkDir::new(output_dir).max_depth(1).into_iter().filter_map(|e| e.ok()) {
            let stale = entry.file_type().is_file()
                && entry.file_name().to_str().map(is_hot_update).unwrap_or(false);
            if stale {
                fs::remove_file(entry.path()).with_context(|| {
                    format!("Failed to remove {}", entry.path().display())
                })?;
            }
        }
        Ok(())
    }
}
