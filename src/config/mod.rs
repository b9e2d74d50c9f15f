//! Transform configuration resolution
//!
//! Option layers are merged in precedence order:
//! 1. Package manifest (package.json)
//! 2. Compiler config (tsconfig.json)
//! 3. Explicit caller options
//!
//! and the result is validated against the schema, with defaults for
//! anything left unset.

mod effective;
mod merge;
mod schema;
mod sources;

pub use effective::{resolve, EffectiveConfig, Resolver};
pub use merge::{deep_merge, merge_layers};
pub use schema::{
    parse_config, validate, CodegenConfig, CodegenOptions, Compress, CompressInput,
    CompressOption, Config, Expected, InvalidCode, JsxRuntime, Options, ReactConfig,
    ReactOptions, ValidatedOptions, ValidationError, COMPRESS_NAMES, ROOT_PATH, RUNTIME_NAMES,
};
pub use sources::{
    compiler_config_options, manifest_options, ConfigOrigin, ConfigSource, COMPILER_CONFIG_FILE,
    MANIFEST_FILE,
};
