//! Transformer factory
//!
//! Resolves the config once, then hands it to an opaque transform engine for
//! every file. The engine itself is supplied by the caller.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache_key::{CacheKeyError, CacheKeyFactory};
use crate::config::{Config, Resolver, ValidationError};

/// Encoded source map (v3), the shape Jest expects from a transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub file: Option<String>,
    pub names: Vec<String>,
    pub source_root: Option<String>,
    pub sources: Vec<Option<String>>,
    pub sources_content: Option<Vec<Option<String>>>,
    pub version: u32,
    pub ignore_list: Option<Vec<u32>>,
    pub mappings: String,
}

/// Output of one transform call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOutput {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
}

/// A source-to-source transform engine.
pub trait Transform {
    type Error: std::error::Error + Send + Sync + 'static;

    fn transform(
        &self,
        path: &Path,
        source_text: &str,
        config: &Config,
    ) -> Result<TransformOutput, Self::Error>;
}

/// Errors raised while creating a transformer
#[derive(Debug, thiserror::Error)]
pub enum TransformerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ValidationError),

    #[error("Cache key error: {0}")]
    CacheKey(#[from] CacheKeyError),
}

/// A transform engine bound to one resolved config.
#[derive(Debug, Clone)]
pub struct Transformer<T> {
    engine: T,
    config: Config,
    cache_keys: CacheKeyFactory,
}

impl<T: Transform> Transformer<T> {
    /// Resolve the config for `root` and bind `engine` to it.
    ///
    /// Fails only when the merged options violate the schema; that is a
    /// configuration error for the whole run, not for a single file.
    pub async fn create(
        engine: T,
        root: impl Into<PathBuf>,
        explicit: Option<Value>,
    ) -> Result<Self, TransformerError> {
        let resolver = Resolver::new(root);
        let config = resolver.resolve(explicit).await?;
        let cache_keys = CacheKeyFactory::new(resolver.root(), &config).await?;

        Ok(Self {
            engine,
            config,
            cache_keys,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Instrumentation is left to the host.
    pub fn can_instrument(&self) -> bool {
        false
    }

    pub fn cache_key(
        &self,
        source_text: &str,
        source_path: &Path,
    ) -> Result<String, CacheKeyError> {
        self.cache_keys.cache_key(source_text, source_path)
    }

    /// Transform one file with the resolved config.
    pub fn process(
        &self,
        source_text: &str,
        source_path: &Path,
    ) -> Result<TransformOutput, T::Error> {
        let mut output = self
            .engine
            .transform(source_path, source_text, &self.config)?;
        if !self.config.codegen.source_map {
            output.source_map = None;
        }
        Ok(output)
    }
}
