//! Build manifest handling
//!
//! The manifest describes what a compilation emitted: the public path the
//! assets are served from and the files produced for every named chunk.
//! It is read once per render and never cached.

mod source;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use source::{LiveManifest, ManifestSource};

/// Errors raised while obtaining a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Production manifest file is absent
    #[error("manifest not found: {}, run `dace build` first", path.display())]
    NotFound { path: PathBuf },

    /// Manifest file exists but could not be read
    #[error("failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest content does not match the expected shape
    #[error("invalid manifest {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    /// Development mode: the compiler has not finished its first pass
    #[error("no compilation has finished yet, waiting for the compiler")]
    NotReady,
}

/// Files emitted for a single chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChunkAssets {
    Single(String),
    Many(Vec<String>),
}

impl ChunkAssets {
    /// All filenames, in emission order
    pub fn files(&self) -> Vec<&str> {
        match self {
            ChunkAssets::Single(file) => vec![file.as_str()],
            ChunkAssets::Many(files) => files.iter().map(String::as_str).collect(),
        }
    }
}

impl From<Vec<String>> for ChunkAssets {
    /// A chunk that emitted exactly one file is recorded as a plain filename.
    fn from(mut files: Vec<String>) -> Self {
        if files.len() == 1 {
            ChunkAssets::Single(files.remove(0))
        } else {
            ChunkAssets::Many(files)
        }
    }
}

/// Chunk name to emitted files, keeping the order of the source document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkMap(Vec<(String, ChunkAssets)>);

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a chunk. A replaced chunk keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, assets: ChunkAssets) {
        let name = name.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = assets,
            None => self.0.push((name, assets)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ChunkAssets> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, assets)| assets)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ChunkAssets)> {
        self.0.iter().map(|(name, assets)| (name.as_str(), assets))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, ChunkAssets)> for ChunkMap {
    fn from_iter<I: IntoIterator<Item = (K, ChunkAssets)>>(iter: I) -> Self {
        let mut map = ChunkMap::new();
        for (name, assets) in iter {
            map.insert(name, assets);
        }
        map
    }
}

impl Serialize for ChunkMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, assets) in &self.0 {
            map.serialize_entry(name, assets)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ChunkMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ChunkMapVisitor;

        impl<'de> Visitor<'de> for ChunkMapVisitor {
            type Value = ChunkMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of chunk names to a filename or a list of filenames")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ChunkMap, A::Error> {
                let mut map = ChunkMap::new();
                while let Some((name, assets)) = access.next_entry::<String, ChunkAssets>()? {
                    map.insert(name, assets);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ChunkMapVisitor)
    }
}

/// Build output description consumed by the document renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub public_path: String,
    pub assets_by_chunk_name: ChunkMap,
}

impl Manifest {
    pub fn new(public_path: impl Into<String>, assets_by_chunk_name: ChunkMap) -> Self {
        Self {
            public_path: public_path.into(),
            assets_by_chunk_name,
        }
    }

    /// Parse a manifest document. Unknown fields (compiler stats) are ignored.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|source| ManifestError::Parse {
            origin: "<inline>".to_string(),
            source,
        })
    }

    /// Read a manifest file from disk
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        if !path.exists() {
            return Err(ManifestError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_document_order() {
        let manifest = Manifest::from_json(
            r#"{
                "publicPath": "/static/",
                "assetsByChunkName": {
                    "vendor": "vendor.css",
                    "main": ["main.js", "main.css"],
                    "admin": ["admin.js"]
                }
            }"#,
        )
        .unwrap();

        let names: Vec<&str> = manifest.assets_by_chunk_name.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["vendor", "main", "admin"]);
        assert_eq!(
            manifest.assets_by_chunk_name.get("vendor"),
            Some(&ChunkAssets::Single("vendor.css".to_string()))
        );
    }

    #[test]
    fn test_extra_stats_fields_are_ignored() {
        let manifest = Manifest::from_json(
            r#"{"hash": "abc", "errors": [], "publicPath": "/", "assetsByChunkName": {}}"#,
        )
        .unwrap();
        assert!(manifest.assets_by_chunk_name.is_empty());
    }

    #[test]
    fn test_malformed_entry_is_rejected() {
        let err = Manifest::from_json(r#"{"publicPath": "/", "assetsByChunkName": {"main": 3}}"#)
            .unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));

        let err = Manifest::from_json(r#"{"assetsByChunkName": {}}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webpack-stats.json");

        let err = Manifest::load(&path).unwrap_err();
        assert!(matches!(err, ManifestError::NotFound { .. }));
        assert!(err.to_string().contains("run `dace build` first"));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webpack-stats.json");
        fs::write(&path, r#"{"publicPath": "/s/", "assetsByChunkName": {"main": "main.js"}}"#)
            .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.public_path, "/s/");
        assert_eq!(manifest.assets_by_chunk_name.len(), 1);
    }

    #[test]
    fn test_serialize_keeps_order() {
        let map: ChunkMap = vec![
            ("b", ChunkAssets::Single("b.js".to_string())),
            ("a", ChunkAssets::Many(vec!["a.js".to_string(), "a.css".to_string()])),
        ]
        .into_iter()
        .collect();
        let json = serde_json::to_string(&Manifest::new("/", map)).unwrap();
        assert_eq!(
            json,
            r#"{"publicPath":"/","assetsByChunkName":{"b":"b.js","a":["a.js","a.css"]}}"#
        );
    }

    #[test]
    fn test_single_file_chunk_collapses() {
        assert_eq!(
            ChunkAssets::from(vec!["main.js".to_string()]),
            ChunkAssets::Single("main.js".to_string())
        );
        assert_eq!(
            ChunkAssets::from(vec!["a.js".to_string(), "a.css".to_string()]).files(),
            vec!["a.js", "a.css"]
        );
    }
}
