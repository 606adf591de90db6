//! Bulk URL source manifests

use std::io;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

use super::format::ResponseFormat;

/// Conventional manifest file name loaded at start-up
pub const DEFAULT_MANIFEST_FILE: &str = "fundament.json";

/// A single URL source: where to fetch and how to decode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlSourceSpec {
    pub format: ResponseFormat,
    pub url: Url,
}

impl UrlSourceSpec {
    pub fn new(url: Url, format: ResponseFormat) -> Self {
        Self { format, url }
    }
}

/// Named URL sources, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceManifest {
    sources: IndexMap<String, UrlSourceSpec>,
}

impl SourceManifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON manifest
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a JSON manifest from disk
    ///
    /// A missing file is not an error and yields `None`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => Self::from_json_str(&json).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No source manifest found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Add or replace a named source
    pub fn insert(&mut self, name: impl Into<String>, spec: UrlSourceSpec) {
        self.sources.insert(name.into(), spec);
    }

    /// Iterate over `(name, spec)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &UrlSourceSpec)> {
        self.sources.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn get(&self, name: &str) -> Option<&UrlSourceSpec> {
        self.sources.get(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::error::FundamentError;

    const MANIFEST: &str = r#"{
        "kaffe": { "format": "json", "url": "http://www.example.com/kaffe.json" },
        "menu":  { "format": "plist", "url": "http://www.example.com/menu.plist" }
    }"#;

    #[test]
    fn test_parse_manifest_keeps_order() {
        let manifest = SourceManifest::from_json_str(MANIFEST).unwrap();

        let names: Vec<&str> = manifest.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["kaffe", "menu"]);

        let menu = manifest.get("menu").unwrap();
        assert_eq!(menu.format, ResponseFormat::Plist);
        assert_eq!(menu.url.as_str(), "http://www.example.com/menu.plist");
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = SourceManifest::from_json_str(
            r#"{ "x": { "format": "yaml", "url": "http://example.com" } }"#,
        );

        assert!(matches!(result, Err(FundamentError::Manifest(_))));
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceManifest::from_path(dir.path().join(DEFAULT_MANIFEST_FILE)).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MANIFEST.as_bytes()).unwrap();

        let manifest = SourceManifest::from_path(file.path()).unwrap().unwrap();
        assert_eq!(manifest.len(), 2);
    }
}
