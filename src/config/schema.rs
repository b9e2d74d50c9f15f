//! Transform configuration schema
//!
//! The merged option layers are checked in two phases:
//! 1. `validate` walks the merged JSON, rejecting wrong shapes and values
//!    outside an enumeration while keeping the caller's spelling
//! 2. `ValidatedOptions::coerce` maps names to their integer codes and
//!    fills every unset field with its default
//!
//! Errors always cite the pre-coercion value.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path reported when the merged document itself is not an object.
pub const ROOT_PATH: &str = "(root)";

/// Accepted spellings for `react.runtime`.
pub const RUNTIME_NAMES: &[&str] = &["automatic", "classic"];

/// Accepted spellings for `codegen.compress` (besides a boolean).
pub const COMPRESS_NAMES: &[&str] = &["none", "whitespace", "fold"];

const REACT: &str = "react";
const CODEGEN: &str = "codegen";

// =============================================================================

/// How JSX is compiled. Encoded as an integer in the resolved config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JsxRuntime {
    Classic = 0,
    #[default]
    Automatic = 1,
}

impl JsxRuntime {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "automatic" => Some(Self::Automatic),
            "classic" => Some(Self::Classic),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Automatic => "automatic",
            Self::Classic => "classic",
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<JsxRuntime> for u8 {
    fn from(runtime: JsxRuntime) -> Self {
        runtime.code()
    }
}

impl TryFrom<u8> for JsxRuntime {
    type Error = InvalidCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Classic),
            1 => Ok(Self::Automatic),
            code => Err(InvalidCode {
                kind: "JsxRuntime",
                code,
                allowed: "0 or 1",
            }),
        }
    }
}

/// Minification level. Encoded as an integer in the resolved config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum CompressOption {
    #[default]
    None = 0,
    Whitespace = 1,
    Fold = 2,
}

impl CompressOption {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "whitespace" => Some(Self::Whitespace),
            "fold" => Some(Self::Fold),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Whitespace => "whitespace",
            Self::Fold => "fold",
        }
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn is_none(self) -> bool {
        matches!(self, Self::None)
    }

    pub const fn is_some(self) -> bool {
        matches!(self, Self::Whitespace | Self::Fold)
    }
}

impl From<bool> for CompressOption {
    fn from(value: bool) -> Self {
        if value {
            Self::Whitespace
        } else {
            Self::None
        }
    }
}

impl From<CompressOption> for u8 {
    fn from(option: CompressOption) -> Self {
        option.code()
    }
}

impl TryFrom<u8> for CompressOption {
    type Error = InvalidCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Whitespace),
            2 => Ok(Self::Fold),
            code => Err(InvalidCode {
                kind: "CompressOption",
                code,
                allowed: "0, 1, or 2",
            }),
        }
    }
}

/// `codegen.compress` is either a plain boolean or a level.
///
/// A boolean stays a boolean in the resolved config; use [`Compress::level`]
/// when a level is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Compress {
    Flag(bool),
    Level(CompressOption),
}

impl Compress {
    pub fn level(self) -> CompressOption {
        match self {
            Self::Flag(flag) => CompressOption::from(flag),
            Self::Level(level) => level,
        }
    }

    fn to_input_value(self) -> Value {
        match self {
            Self::Flag(flag) => Value::Bool(flag),
            Self::Level(level) => Value::from(level.name()),
        }
    }
}

impl Default for Compress {
    fn default() -> Self {
        Self::Level(CompressOption::None)
    }
}

impl From<bool> for Compress {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<CompressOption> for Compress {
    fn from(level: CompressOption) -> Self {
        Self::Level(level)
    }
}

/// An integer code outside an enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid {kind} value `{code}`: must be {allowed}.")]
pub struct InvalidCode {
    kind: &'static str,
    code: u8,
    allowed: &'static str,
}

// =============================================================================

/// Fully resolved transform configuration.
///
/// Every field is populated; this is what the transform engine and the
/// cache key see.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Config {
    pub react: ReactConfig,
    pub codegen: CodegenConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactConfig {
    /// Run the JSX transform at all
    pub jsx_plugin: bool,
    pub runtime: JsxRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodegenConfig {
    pub compress: Compress,
    pub source_map: bool,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            compress: Compress::default(),
            source_map: true,
        }
    }
}

// =============================================================================

/// Typed partial options for Rust callers.
///
/// Converts into the JSON layer the resolver merges, using enum names rather
/// than codes and omitting unset fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
    pub react: Option<ReactOptions>,
    pub codegen: Option<CodegenOptions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactOptions {
    pub jsx_plugin: Option<bool>,
    pub runtime: Option<JsxRuntime>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodegenOptions {
    pub compress: Option<Compress>,
    pub source_map: Option<bool>,
}

impl From<Options> for Value {
    fn from(options: Options) -> Self {
        let mut root = Map::new();

        if let Some(react) = options.react {
            let mut group = Map::new();
            if let Some(jsx_plugin) = react.jsx_plugin {
                group.insert("jsxPlugin".to_string(), Value::Bool(jsx_plugin));
            }
            if let Some(runtime) = react.runtime {
                group.insert("runtime".to_string(), Value::from(runtime.name()));
            }
            root.insert(REACT.to_string(), Value::Object(group));
        }

        if let Some(codegen) = options.codegen {
            let mut group = Map::new();
            if let Some(compress) = codegen.compress {
                group.insert("compress".to_string(), compress.to_input_value());
            }
            if let Some(source_map) = codegen.source_map {
                group.insert("sourceMap".to_string(), Value::Bool(source_map));
            }
            root.insert(CODEGEN.to_string(), Value::Object(group));
        }

        Value::Object(root)
    }
}

// =============================================================================

/// What a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Object,
    Boolean,
    OneOf(&'static [&'static str]),
    BooleanOrOneOf(&'static [&'static str]),
}

impl Expected {
    /// The allowed set, as it would be written in a config file.
    pub fn allowed(&self) -> Vec<String> {
        match self {
            Self::Object => vec!["{...}".to_string()],
            Self::Boolean => vec!["true".to_string(), "false".to_string()],
            Self::OneOf(names) => names.iter().map(|n| format!("\"{n}\"")).collect(),
            Self::BooleanOrOneOf(names) => ["true".to_string(), "false".to_string()]
                .into_iter()
                .chain(names.iter().map(|n| format!("\"{n}\"")))
                .collect(),
        }
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => write!(f, "an object"),
            Self::Boolean => write!(f, "a boolean"),
            Self::OneOf(_) => write!(f, "one of {}", self.allowed().join(", ")),
            Self::BooleanOrOneOf(names) => write!(
                f,
                "a boolean or one of {}",
                Self::OneOf(*names).allowed().join(", ")
            ),
        }
    }
}

/// The merged options do not fit the schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid value for `{path}`: expected {expected}, received {received}")]
pub struct ValidationError {
    /// Dot-separated field path, e.g. `codegen.compress`
    pub path: String,
    pub received: Value,
    pub expected: Expected,
}

impl ValidationError {
    fn new(path: impl Into<String>, received: &Value, expected: Expected) -> Self {
        Self {
            path: path.into(),
            received: received.clone(),
            expected,
        }
    }
}

/// A `codegen.compress` value that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressInput<'a> {
    Flag(bool),
    Name(&'a str),
}

/// Merged options that passed validation, still in the caller's spelling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatedOptions<'a> {
    pub jsx_plugin: Option<bool>,
    pub runtime: Option<&'a str>,
    pub compress: Option<CompressInput<'a>>,
    pub source_map: Option<bool>,
}

impl ValidatedOptions<'_> {
    /// Map names to codes and fill defaults.
    pub fn coerce(&self) -> Config {
        let defaults = Config::default();

        // Names were checked by `validate`, so the fallbacks never apply.
        let runtime = self
            .runtime
            .and_then(JsxRuntime::from_name)
            .unwrap_or(defaults.react.runtime);
        let compress = match self.compress {
            Some(CompressInput::Flag(flag)) => Compress::Flag(flag),
            Some(CompressInput::Name(name)) => {
                Compress::Level(CompressOption::from_name(name).unwrap_or_default())
            }
            None => defaults.codegen.compress,
        };

        Config {
            react: ReactConfig {
                jsx_plugin: self.jsx_plugin.unwrap_or(defaults.react.jsx_plugin),
                runtime,
            },
            codegen: CodegenConfig {
                compress,
                source_map: self.source_map.unwrap_or(defaults.codegen.source_map),
            },
        }
    }
}

/// Check the merged options against the schema.
///
/// Unknown keys are ignored. A null is a value like any other and fails
/// every check; the merge only lets one through inside a copied container.
pub fn validate(merged: &Value) -> Result<ValidatedOptions<'_>, ValidationError> {
    let root = match merged {
        Value::Object(map) => map,
        other => return Err(ValidationError::new(ROOT_PATH, other, Expected::Object)),
    };

    let react = group(root, REACT)?;
    let codegen = group(root, CODEGEN)?;

    Ok(ValidatedOptions {
        jsx_plugin: boolean(react, REACT, "jsxPlugin")?,
        runtime: one_of(react, REACT, "runtime", RUNTIME_NAMES)?,
        compress: compress(codegen)?,
        source_map: boolean(codegen, CODEGEN, "sourceMap")?,
    })
}

/// Validate, then coerce.
pub fn parse_config(merged: &Value) -> Result<Config, ValidationError> {
    validate(merged).map(|options| options.coerce())
}

type Group<'a> = Option<&'a Map<String, Value>>;

fn group<'a>(root: &'a Map<String, Value>, key: &str) -> Result<Group<'a>, ValidationError> {
    match root.get(key) {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ValidationError::new(key, other, Expected::Object)),
    }
}

fn field<'a>(group: Group<'a>, key: &str) -> Option<&'a Value> {
    group.and_then(|map| map.get(key))
}

fn boolean(group: Group<'_>, group_name: &str, key: &str) -> Result<Option<bool>, ValidationError> {
    match field(group, key) {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(*flag)),
        Some(other) => Err(ValidationError::new(
            format!("{group_name}.{key}"),
            other,
            Expected::Boolean,
        )),
    }
}

fn one_of<'a>(
    group: Group<'a>,
    group_name: &str,
    key: &str,
    names: &'static [&'static str],
) -> Result<Option<&'a str>, ValidationError> {
    match field(group, key) {
        None => Ok(None),
        Some(Value::String(name)) if names.contains(&name.as_str()) => Ok(Some(name.as_str())),
        Some(other) => Err(ValidationError::new(
            format!("{group_name}.{key}"),
            other,
            Expected::OneOf(names),
        )),
    }
}

fn compress(codegen: Group<'_>) -> Result<Option<CompressInput<'_>>, ValidationError> {
    match field(codegen, "compress") {
        None => Ok(None),
        Some(Value::Bool(flag)) => Ok(Some(CompressInput::Flag(*flag))),
        Some(Value::String(name)) if COMPRESS_NAMES.contains(&name.as_str()) => {
            Ok(Some(CompressInput::Name(name.as_str())))
        }
        Some(other) => Err(ValidationError::new(
            format!("{CODEGEN}.compress"),
            other,
            Expected::BooleanOrOneOf(COMPRESS_NAMES),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_input_yields_defaults() {
        let config = parse_config(&json!({})).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(
            serde_json::to_value(config).unwrap(),
            json!({
                "react": {"jsxPlugin": false, "runtime": 1},
                "codegen": {"compress": 0, "sourceMap": true}
            })
        );
    }

    #[test]
    fn test_names_are_coerced_to_codes() {
        let config = parse_config(&json!({
            "react": {"jsxPlugin": true, "runtime": "classic"},
            "codegen": {"compress": "fold", "sourceMap": false}
        }))
        .unwrap();

        assert_eq!(
            serde_json::to_value(config).unwrap(),
            json!({
                "react": {"jsxPlugin": true, "runtime": 0},
                "codegen": {"compress": 2, "sourceMap": false}
            })
        );
    }

    #[test]
    fn test_boolean_compress_stays_boolean() {
        let config = parse_config(&json!({"codegen": {"compress": true}})).unwrap();

        assert_eq!(config.codegen.compress, Compress::Flag(true));
        assert_eq!(config.codegen.compress.level(), CompressOption::Whitespace);
        assert_eq!(
            serde_json::to_value(config).unwrap()["codegen"]["compress"],
            json!(true)
        );
    }

    #[test]
    fn test_partial_group_keeps_other_defaults() {
        let config = parse_config(&json!({"react": {"jsxPlugin": true}})).unwrap();

        assert!(config.react.jsx_plugin);
        assert_eq!(config.react.runtime, JsxRuntime::Automatic);
        assert!(config.codegen.source_map);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = parse_config(&json!({
            "react": {"pragma": "h"},
            "extra": [1, 2, 3]
        }))
        .unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_compress_name() {
        let err = parse_config(&json!({"codegen": {"compress": "bogus"}})).unwrap_err();

        assert_eq!(err.path, "codegen.compress");
        assert_eq!(err.received, json!("bogus"));
        assert_eq!(err.expected, Expected::BooleanOrOneOf(COMPRESS_NAMES));
        assert_eq!(
            err.expected.allowed(),
            vec!["true", "false", "\"none\"", "\"whitespace\"", "\"fold\""]
        );
        assert_eq!(
            err.to_string(),
            "Invalid value for `codegen.compress`: expected a boolean or one of \
             \"none\", \"whitespace\", \"fold\", received \"bogus\""
        );
    }

    #[test]
    fn test_invalid_runtime_name() {
        let err = parse_config(&json!({"react": {"runtime": "Classic"}})).unwrap_err();

        assert_eq!(err.path, "react.runtime");
        assert_eq!(err.received, json!("Classic"));
        assert_eq!(err.expected, Expected::OneOf(RUNTIME_NAMES));
    }

    #[test]
    fn test_integer_codes_are_not_accepted_as_input() {
        let err = parse_config(&json!({"react": {"runtime": 0}})).unwrap_err();
        assert_eq!(err.path, "react.runtime");

        let err = parse_config(&json!({"codegen": {"compress": 2}})).unwrap_err();
        assert_eq!(err.path, "codegen.compress");
    }

    #[test]
    fn test_wrong_shapes() {
        let err = parse_config(&json!({"react": true})).unwrap_err();
        assert_eq!(err.path, "react");
        assert_eq!(err.expected, Expected::Object);

        let err = parse_config(&json!({"codegen": {"sourceMap": "yes"}})).unwrap_err();
        assert_eq!(err.path, "codegen.sourceMap");
        assert_eq!(err.expected, Expected::Boolean);

        let err = parse_config(&json!("react")).unwrap_err();
        assert_eq!(err.path, ROOT_PATH);
    }

    #[test]
    fn test_null_fields_are_rejected() {
        let err = parse_config(&json!({"react": {"runtime": null}})).unwrap_err();
        assert_eq!(err.path, "react.runtime");
        assert_eq!(err.received, Value::Null);
        assert_eq!(err.expected, Expected::OneOf(RUNTIME_NAMES));

        let err = parse_config(&json!({"codegen": {"compress": null}})).unwrap_err();
        assert_eq!(err.path, "codegen.compress");
        assert_eq!(err.expected, Expected::BooleanOrOneOf(COMPRESS_NAMES));

        let err = parse_config(&json!({"codegen": null})).unwrap_err();
        assert_eq!(err.path, CODEGEN);
        assert_eq!(err.expected, Expected::Object);
    }

    #[test]
    fn test_validate_keeps_original_spelling() {
        let merged = json!({"react": {"runtime": "classic"}, "codegen": {"compress": false}});
        let validated = validate(&merged).unwrap();

        assert_eq!(validated.runtime, Some("classic"));
        assert_eq!(validated.compress, Some(CompressInput::Flag(false)));
        assert_eq!(validated.jsx_plugin, None);
    }

    #[test]
    fn test_config_deserializes_from_codes() {
        let config: Config = serde_json::from_value(json!({
            "react": {"jsxPlugin": true, "runtime": 0},
            "codegen": {"compress": false, "sourceMap": true}
        }))
        .unwrap();

        assert_eq!(config.react.runtime, JsxRuntime::Classic);
        assert_eq!(config.codegen.compress, Compress::Flag(false));

        let bad: Result<Config, _> = serde_json::from_value(json!({
            "react": {"jsxPlugin": true, "runtime": 7},
            "codegen": {"compress": 0, "sourceMap": true}
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn test_compress_option_from_code() {
        assert_eq!(CompressOption::try_from(2u8), Ok(CompressOption::Fold));
        let err = CompressOption::try_from(3u8).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid CompressOption value `3`: must be 0, 1, or 2."
        );
        assert!(CompressOption::None.is_none());
        assert!(CompressOption::from(true).is_some());
    }

    #[test]
    fn test_options_into_value() {
        let options = Options {
            react: Some(ReactOptions {
                runtime: Some(JsxRuntime::Classic),
                ..Default::default()
            }),
            codegen: Some(CodegenOptions {
                compress: Some(Compress::Level(CompressOption::Whitespace)),
                source_map: Some(false),
            }),
        };

        assert_eq!(
            Value::from(options),
            json!({
                "react": {"runtime": "classic"},
                "codegen": {"compress": "whitespace", "sourceMap": false}
            })
        );
        assert_eq!(Value::from(Options::default()), json!({}));
    }
}
