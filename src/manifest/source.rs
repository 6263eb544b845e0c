//! Where a render request gets its manifest from

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::{Manifest, ManifestError};

/// Latest manifest published by a watching compiler
#[derive(Debug, Clone, Default)]
pub struct LiveManifest {
    inner: Arc<RwLock<Option<Manifest>>>,
}

impl LiveManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current manifest after a finished compilation
    pub fn publish(&self, manifest: Manifest) {
        *self.inner.write() = Some(manifest);
    }

    /// Snapshot of the current manifest, if any compilation has finished
    pub fn current(&self) -> Option<Manifest> {
        self.inner.read().clone()
    }
}

/// Manifest provider selected by the run mode
#[derive(Debug, Clone)]
pub enum ManifestSource {
    /// Development: in-memory stats of the live compiler
    Live(LiveManifest),

    /// Production: JSON file written by `dace build`
    Disk(PathBuf),
}

impl ManifestSource {
    /// Obtain the manifest for one render
    pub fn load(&self) -> Result<Manifest, ManifestError> {
        match self {
            ManifestSource::Live(live) => live.current().ok_or(ManifestError::NotReady),
            ManifestSource::Disk(path) => {
                debug!("Reading manifest {}", path.display());
                Manifest::load(path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{ChunkAssets, ChunkMap};

    #[test]
    fn test_live_source_before_first_compilation() {
        let source = ManifestSource::Live(LiveManifest::new());
        assert!(matches!(source.load(), Err(ManifestError::NotReady)));
    }

    #[test]
    fn test_live_source_sees_latest_publish() {
        let live = LiveManifest::new();
        let source = ManifestSource::Live(live.clone());

        let mut chunks = ChunkMap::new();
        chunks.insert("main", ChunkAssets::Single("main.1111.js".to_string()));
        live.publish(Manifest::new("/", chunks.clone()));

        chunks.insert("main", ChunkAssets::Single("main.2222.js".to_string()));
        live.publish(Manifest::new("/", chunks));

        let manifest = source.load().unwrap();
        assert_eq!(
            manifest.assets_by_chunk_name.get("main"),
            Some(&ChunkAssets::Single("main.2222.js".to_string()))
        );
    }

    #[test]
    fn test_disk_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = ManifestSource::Disk(dir.path().join("missing.json"));
        assert!(matches!(source.load(), Err(ManifestError::NotFound { .. })));
    }
}
