//! Cache key derivation for transformed sources
//!
//! A transformed file may be reused only while every input that shaped it is
//! unchanged: the resolved config, the two conventional option files, the
//! source text and its path.
//!
//! cache_key = SHA-256 hex digest of JCS(cache_key_inputs)

use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::{Config, COMPILER_CONFIG_FILE, MANIFEST_FILE};

/// Files whose contents invalidate cached output, relative to the project root.
pub const CACHE_KEY_FILES: [&str; 2] = [MANIFEST_FILE, COMPILER_CONFIG_FILE];

/// Cache key errors
#[derive(Debug, thiserror::Error)]
pub enum CacheKeyError {
    #[error("JCS serialization failed: {0}")]
    JcsError(String),
}

impl Config {
    /// Stable string form of the config (RFC 8785 JCS).
    pub fn fingerprint(&self) -> Result<String, CacheKeyError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(self)
            .map_err(|e| CacheKeyError::JcsError(e.to_string()))?;
        String::from_utf8(jcs_bytes).map_err(|e| CacheKeyError::JcsError(e.to_string()))
    }
}

/// Snapshot of one cache-relevant file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheFile {
    /// Path relative to the project root
    pub path: String,

    /// SHA-256 of the file bytes, None when unreadable
    pub sha256: Option<String>,
}

impl CacheFile {
    async fn snapshot(root: &Path, name: &str) -> Self {
        // The name still counts when the file cannot be read.
        let sha256 = tokio::fs::read(root.join(name))
            .await
            .ok()
            .map(|bytes| sha256_hex(&bytes));
        Self {
            path: name.to_string(),
            sha256,
        }
    }
}

#[derive(Serialize)]
struct CacheKeyInputs<'a> {
    files: &'a [CacheFile],
    values: &'a [String],
    source_path: String,
    source_sha256: String,
}

/// Derives per-file cache keys for one resolved config.
#[derive(Debug, Clone)]
pub struct CacheKeyFactory {
    root: PathBuf,
    files: Vec<CacheFile>,
    values: Vec<String>,
}

impl CacheKeyFactory {
    /// Snapshot the cache-relevant files under `root` and the config.
    pub async fn new(root: impl Into<PathBuf>, config: &Config) -> Result<Self, CacheKeyError> {
        let root = root.into();
        let [manifest, compiler_config] = CACHE_KEY_FILES;
        let (manifest, compiler_config) = tokio::join!(
            CacheFile::snapshot(&root, manifest),
            CacheFile::snapshot(&root, compiler_config)
        );
        let files = vec![manifest, compiler_config];

        Ok(Self {
            root,
            files,
            values: vec![config.fingerprint()?],
        })
    }

    pub fn files(&self) -> &[CacheFile] {
        &self.files
    }

    /// Compute the cache key for one source file.
    ///
    /// Paths under the project root are keyed relative to it, so moving the
    /// checkout does not invalidate the cache.
    pub fn cache_key(
        &self,
        source_text: &str,
        source_path: &Path,
    ) -> Result<String, CacheKeyError> {
        let relative = source_path.strip_prefix(&self.root).unwrap_or(source_path);

        let inputs = CacheKeyInputs {
            files: &self.files,
            values: &self.values,
            source_path: relative.to_string_lossy().replace('\\', "/"),
            source_sha256: sha256_hex(source_text.as_bytes()),
        };

        let jcs_bytes = serde_json_canonicalizer::to_vec(&inputs)
            .map_err(|e| CacheKeyError::JcsError(e.to_string()))?;
        Ok(sha256_hex(&jcs_bytes))
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
