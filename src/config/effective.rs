//! Effective configuration with provenance
//!
//! Resolution reads the two conventional files concurrently, adapts each
//! into a partial option layer, merges the layers with explicit options on
//! top and validates the result.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::merge::merge_layers;
use super::schema::{parse_config, Config, ValidationError};
use super::sources::{
    load_compiler_config, load_manifest, ConfigSource, SourceDocument, COMPILER_CONFIG_FILE,
    MANIFEST_FILE,
};

/// Resolved configuration plus the layers it was built from
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    /// The validated configuration
    pub config: Config,

    /// The merged option layers before validation
    pub merged: Value,

    /// Contributing layers in precedence order (lowest first)
    pub sources: Vec<ConfigSource>,
}

impl EffectiveConfig {
    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Get a merged option value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.merged;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }
}

/// Resolves transform configuration for one project root.
#[derive(Debug, Clone)]
pub struct Resolver {
    root: PathBuf,
}

impl Default for Resolver {
    /// Resolve against the working directory.
    fn default() -> Self {
        Self::new(".")
    }
}

impl Resolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn compiler_config_path(&self) -> PathBuf {
        self.root.join(COMPILER_CONFIG_FILE)
    }

    /// Resolve the configuration.
    ///
    /// Missing or unparsable source files are treated as absent. Only a
    /// schema violation in the merged options is an error.
    pub async fn resolve(&self, explicit: Option<Value>) -> Result<Config, ValidationError> {
        Ok(self.resolve_effective(explicit).await?.config)
    }

    /// Resolve the configuration, keeping the merged layers and their sources.
    pub async fn resolve_effective(
        &self,
        explicit: Option<Value>,
    ) -> Result<EffectiveConfig, ValidationError> {
        // Settle both reads; one failing never affects the other.
        let (manifest, compiler_config) =
            tokio::join!(load_manifest(&self.root), load_compiler_config(&self.root));

        let explicit = explicit.map(|document| SourceDocument {
            source: ConfigSource::explicit(),
            document,
        });

        // Lowest precedence first.
        let documents: Vec<SourceDocument> = [manifest.ok(), compiler_config.ok(), explicit]
            .into_iter()
            .flatten()
            .collect();

        let layers = documents.iter().map(SourceDocument::options).collect::<Vec<_>>();
        let sources = documents.into_iter().map(|doc| doc.source).collect::<Vec<_>>();

        let merged = merge_layers(layers);
        let config = parse_config(&merged)?;

        debug!(
            root = %self.root.display(),
            sources = sources.len(),
            "resolved transform config"
        );

        Ok(EffectiveConfig {
            config,
            merged,
            sources,
        })
    }
}

/// Resolve the configuration against the working directory.
pub async fn resolve(explicit: Option<Value>) -> Result<Config, ValidationError> {
    Resolver::default().resolve(explicit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{Compress, CompressOption, JsxRuntime};
    use crate::config::sources::ConfigOrigin;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn test_resolve_with_no_sources() {
        let dir = TempDir::new().unwrap();

        let effective = Resolver::new(dir.path()).resolve_effective(None).await.unwrap();

        assert_eq!(effective.config, Config::default());
        assert!(effective.sources.is_empty());
        assert_eq!(effective.merged, json!({}));
    }

    #[tokio::test]
    async fn test_resolve_with_explicit_override() {
        let dir = TempDir::new().unwrap();
        let explicit = json!({"codegen": {"compress": "whitespace"}});

        let config = Resolver::new(dir.path())
            .resolve(Some(explicit))
            .await
            .unwrap();

        assert_eq!(
            config.codegen.compress,
            Compress::Level(CompressOption::Whitespace)
        );
        assert!(config.codegen.source_map);
    }

    #[tokio::test]
    async fn test_compiler_config_feeds_react_options() {
        let dir = TempDir::new().unwrap();
        write(&dir, COMPILER_CONFIG_FILE, r#"{"compilerOptions": {"jsx": "react"}}"#);

        let config = Resolver::new(dir.path()).resolve(None).await.unwrap();

        assert!(config.react.jsx_plugin);
        assert_eq!(config.react.runtime, JsxRuntime::Classic);
    }

    #[tokio::test]
    async fn test_sources_tracked_in_precedence_order() {
        let dir = TempDir::new().unwrap();
        write(&dir, MANIFEST_FILE, r#"{"name": "app"}"#);
        write(&dir, COMPILER_CONFIG_FILE, r#"{"compilerOptions": {"jsx": "react-jsx"}}"#);

        let effective = Resolver::new(dir.path())
            .resolve_effective(Some(json!({})))
            .await
            .unwrap();

        let origins: Vec<_> = effective.sources.iter().map(|s| s.origin).collect();
        assert_eq!(
            origins,
            vec![
                ConfigOrigin::Manifest,
                ConfigOrigin::CompilerConfig,
                ConfigOrigin::Explicit
            ]
        );
        assert!(effective.sources[0].digest.is_some());
        assert!(effective.sources[2].path.is_none());
        assert_eq!(effective.get("react.runtime"), Some(&json!("automatic")));
    }

    #[tokio::test]
    async fn test_broken_manifest_does_not_hide_compiler_config() {
        let dir = TempDir::new().unwrap();
        write(&dir, MANIFEST_FILE, "{ not json");
        write(&dir, COMPILER_CONFIG_FILE, r#"{"compilerOptions": {"jsx": "preserve"}}"#);

        let effective = Resolver::new(dir.path()).resolve_effective(None).await.unwrap();

        assert_eq!(effective.sources.len(), 1);
        assert_eq!(effective.sources[0].origin, ConfigOrigin::CompilerConfig);
        assert!(!effective.config.react.jsx_plugin);
    }

    #[tokio::test]
    async fn test_validation_error_propagates() {
        let dir = TempDir::new().unwrap();

        let err = Resolver::new(dir.path())
            .resolve(Some(json!({"react": {"jsxPlugin": "yes"}})))
            .await
            .unwrap_err();

        assert_eq!(err.path, "react.jsxPlugin");
        assert_eq!(err.received, json!("yes"));
    }

    #[tokio::test]
    async fn test_to_json_reports_config_and_sources() {
        let dir = TempDir::new().unwrap();
        write(&dir, COMPILER_CONFIG_FILE, r#"{"compilerOptions": {"jsx": "react"}}"#);

        let effective = Resolver::new(dir.path()).resolve_effective(None).await.unwrap();
        let rendered: Value = serde_json::from_str(&effective.to_json().unwrap()).unwrap();

        assert_eq!(
            rendered["config"],
            json!({
                "react": {"jsxPlugin": true, "runtime": 0},
                "codegen": {"compress": 0, "sourceMap": true}
            })
        );
        assert_eq!(rendered["merged"]["react"]["runtime"], json!("classic"));
        assert_eq!(rendered["sources"][0]["origin"], json!("compiler_config"));
        assert_eq!(
            rendered["sources"][0]["path"],
            json!(dir.path().join(COMPILER_CONFIG_FILE).to_string_lossy())
        );
    }

    #[test]
    fn test_paths_follow_root() {
        let resolver = Resolver::new("/work/app");

        assert_eq!(resolver.manifest_path(), PathBuf::from("/work/app/package.json"));
        assert_eq!(
            resolver.compiler_config_path(),
            PathBuf::from("/work/app/tsconfig.json")
        );
        assert_eq!(Resolver::default().root(), Path::new("."));
    }
}
