//! Foreign option sources
//!
//! Reads the package manifest and the TypeScript compiler config from a
//! project root and translates the few fields they carry into partial
//! transform options. Every failure here degrades to "no contribution".

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Package manifest, read from the project root.
pub const MANIFEST_FILE: &str = "package.json";

/// TypeScript compiler config, read from the project root.
pub const COMPILER_CONFIG_FILE: &str = "tsconfig.json";

/// `compilerOptions.jsx` mode that leaves JSX untouched.
const JSX_PRESERVE: &str = "preserve";

/// `compilerOptions.jsx` mode that selects the classic runtime.
const JSX_CLASSIC: &str = "react";

/// Origin of an option layer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigOrigin {
    Manifest,
    CompilerConfig,
    Explicit,
}

/// A contributing option layer with provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConfigSource {
    /// Origin of this layer
    pub origin: ConfigOrigin,

    /// File path (None for explicit options)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for explicit options)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

impl ConfigSource {
    pub fn explicit() -> Self {
        Self {
            origin: ConfigOrigin::Explicit,
            path: None,
            digest: None,
        }
    }
}

/// Why a source document could not be used. Never leaves the resolver.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// A parsed source document and where it came from
#[derive(Debug, Clone)]
pub(crate) struct SourceDocument {
    pub source: ConfigSource,
    pub document: Value,
}

impl SourceDocument {
    /// The partial options this document contributes.
    pub fn options(&self) -> Value {
        match self.source.origin {
            ConfigOrigin::Manifest => manifest_options(&self.document),
            ConfigOrigin::CompilerConfig => compiler_config_options(&self.document),
            ConfigOrigin::Explicit => self.document.clone(),
        }
    }
}

/// Read and parse `package.json` under `root`.
pub(crate) async fn load_manifest(root: &Path) -> Result<SourceDocument, SourceError> {
    let path = root.join(MANIFEST_FILE);
    load_document(path, ConfigOrigin::Manifest, |text| {
        serde_json::from_str(text).map_err(|e| SourceError::Parse(e.to_string()))
    })
    .await
}

/// Read and parse `tsconfig.json` under `root`, tolerating comments and
/// trailing commas.
pub(crate) async fn load_compiler_config(root: &Path) -> Result<SourceDocument, SourceError> {
    let path = root.join(COMPILER_CONFIG_FILE);
    load_document(path, ConfigOrigin::CompilerConfig, |text| {
        json5::from_str(text).map_err(|e| SourceError::Parse(e.to_string()))
    })
    .await
}

async fn load_document<F>(
    path: PathBuf,
    origin: ConfigOrigin,
    parse: F,
) -> Result<SourceDocument, SourceError>
where
    F: FnOnce(&str) -> Result<Value, SourceError>,
{
    let bytes = tokio::fs::read(&path).await?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| SourceError::Parse(format!("Invalid UTF-8: {}", e)))?;
    let document = parse(contents.trim_start_matches('\u{feff}'))?;

    debug!(?origin, path = %path.display(), %digest, "loaded option source");

    Ok(SourceDocument {
        source: ConfigSource {
            origin,
            path: Some(path.to_string_lossy().to_string()),
            digest: Some(digest),
        },
        document,
    })
}

/// Options contributed by the package manifest.
///
/// The manifest carries no transform options yet, so every manifest (well
/// formed or not) contributes an empty layer.
pub fn manifest_options(_manifest: &Value) -> Value {
    empty()
}

/// Options contributed by the compiler config's `compilerOptions.jsx`.
///
/// - absent or null `jsx`, or a malformed document: nothing
/// - `"preserve"`: JSX plugin off
/// - any other value, including non-strings: JSX plugin on
/// - `"react"` selects the classic runtime, every other value automatic
pub fn compiler_config_options(compiler_config: &Value) -> Value {
    let Some(jsx) = compiler_config
        .get("compilerOptions")
        .filter(|options| options.is_object())
        .and_then(|options| options.get("jsx"))
        .filter(|jsx| !jsx.is_null())
    else {
        return empty();
    };
    let jsx = jsx.as_str();

    let runtime = if jsx == Some(JSX_CLASSIC) {
        "classic"
    } else {
        "automatic"
    };

    json!({
        "react": {
            "jsxPlugin": jsx != Some(JSX_PRESERVE),
            "runtime": runtime,
        }
    })
}

fn empty() -> Value {
    Value::Object(Map::new())
}
