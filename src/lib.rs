//! oxc-jest - transform configuration for the oxc Jest transformer
//!
//! This crate resolves the options a Jest transform runs with from the
//! project's package.json, its tsconfig.json and caller-supplied options,
//! and derives the cache keys that depend on them.

pub mod cache_key;
pub mod config;
pub mod transform;

pub use cache_key::{CacheKeyError, CacheKeyFactory};
pub use config::{resolve, Config, EffectiveConfig, Options, Resolver, ValidationError};
pub use transform::{Transform, TransformOutput, Transformer, TransformerError};
