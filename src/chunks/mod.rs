//! Chunk resolution
//!
//! Turns a build manifest into the ordered list of `<script>` and
//! `<link rel="stylesheet">` references a rendered document needs.
//!
//! Only filenames listed inside a sequence are checked for hot-update
//! artifacts. A chunk recorded as a single filename is included whenever
//! its extension matches, even if it looks like a hot-update file.

use std::fmt;

use crate::manifest::{ChunkAssets, Manifest};
use crate::utils::escape_html;

/// Substring marking transient incremental-rebuild output
pub const HOT_UPDATE_MARKER: &str = ".hot-update.";

/// How an asset is injected into the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Script,
    Stylesheet,
}

impl AssetKind {
    /// Anything ending in `js` is a script, everything else a stylesheet
    pub fn for_filename(filename: &str) -> Self {
        if filename.ends_with("js") {
            AssetKind::Script
        } else {
            AssetKind::Stylesheet
        }
    }
}

/// A resolved asset ready for injection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub url: String,
}

impl AssetRef {
    pub fn new(public_path: &str, filename: &str) -> Self {
        Self {
            kind: AssetKind::for_filename(filename),
            url: format!("{}{}", public_path, filename),
        }
    }

    /// HTML tag for this asset
    pub fn to_tag(&self) -> String {
        let url = escape_html(&self.url);
        match self.kind {
            AssetKind::Script => format!(r#"<script src="{}"></script>"#, url),
            AssetKind::Stylesheet => format!(r#"<link rel="stylesheet" href="{}"/>"#, url),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_tag())
    }
}

/// Check whether a filename is a hot-update artifact
pub fn is_hot_update(filename: &str) -> bool {
    filename.contains(HOT_UPDATE_MARKER)
}

/// Resolve the assets with the given extension, in manifest order
pub fn resolve_chunks(manifest: &Manifest, extension: &str) -> Vec<AssetRef> {
    let public_path = manifest.public_path.as_str();

    manifest
        .assets_by_chunk_name
        .iter()
        .fold(Vec::new(), |mut refs, (_, assets)| {
            match assets {
                ChunkAssets::Many(files) => refs.extend(
                    files
                        .iter()
                        .filter(|file| !is_hot_update(file))
                        .filter(|file| file.ends_with(extension))
                        .map(|file| AssetRef::new(public_path, file)),
                ),
                ChunkAssets::Single(file) => {
                    if file.ends_with(extension) {
                        refs.push(AssetRef::new(public_path, file));
                    }
                }
            }
            refs
        })
}

/// Render resolved assets as consecutive tags
pub fn render_tags(refs: &[AssetRef]) -> String {
    refs.iter().map(AssetRef::to_tag).collect()
}
