//! Configuration loading from disk and environment.
//!
//! Precedence, lowest first: the value the caller built in code, the
//! config file, then environment variables for keys that already exist.

use std::fmt;
use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::schema::CoreConfig;
use crate::config::validation::{env_name, MissingField};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error in {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid config location {0:?}: expected \"file:<path>\" or empty")]
    Location(String),

    #[error("Config value error: {0}")]
    Value(#[from] serde_json::Error),

    #[error("Config file {0} must contain an object at the top level")]
    NotAnObject(PathBuf),

    #[error("Validation failed: {}", join_missing(.0))]
    MissingRequired(Vec<MissingField>),
}

fn join_missing(fields: &[MissingField]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the config file lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    Disabled,
    File(PathBuf),
}

impl ConfigLocation {
    /// Parse `"file:<path>"`; an empty string disables file loading.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.is_empty() {
            return Ok(ConfigLocation::Disabled);
        }
        match raw.strip_prefix("file:") {
            Some(path) if !path.is_empty() => Ok(ConfigLocation::File(PathBuf::from(path))),
            _ => Err(ConfigError::Location(raw.to_string())),
        }
    }
}

impl fmt::Display for ConfigLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigLocation::Disabled => Ok(()),
            ConfigLocation::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

/// Environment lookup used for the env overlay.
pub type EnvLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Reads the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Load the file and environment into `cfg`, keeping values already set in
/// code for keys nobody overrides. A missing file is not an error.
pub fn load_into<T>(
    cfg: &mut T,
    location: &ConfigLocation,
    automatic_env: bool,
    env: &EnvLookup,
) -> Result<(), ConfigError>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(&*cfg)?;

    if let ConfigLocation::File(path) = location {
        if let Some(file) = read_file(path)? {
            merge(&mut merged, file);
            tracing::debug!(path = %path.display(), "Config file merged");
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, skipping");
        }
    }

    if !automatic_env {
        *cfg = serde_json::from_value(merged)?;
        return Ok(());
    }

    // Unset optional leaves carry no type, so their env value is first read
    // as JSON and only kept verbatim when that shape does not deserialize.
    let untyped = overlay_env(&mut merged, "", env);
    let err = match serde_json::from_value(merged.clone()) {
        Ok(value) => {
            *cfg = value;
            return Ok(());
        }
        Err(err) => err,
    };
    for candidate in literal_fallbacks(&merged, &untyped) {
        if let Ok(value) = serde_json::from_value(candidate) {
            *cfg = value;
            return Ok(());
        }
    }
    Err(err.into())
}

/// An env value that replaced a `null` leaf, addressed by JSON pointer.
struct UntypedLeaf {
    pointer: String,
    raw: String,
}

/// Variants of `merged` with untyped leaves kept as text: each leaf alone,
/// then all of them together.
fn literal_fallbacks(merged: &Value, untyped: &[UntypedLeaf]) -> Vec<Value> {
    let with_literal = |value: &mut Value, leaf: &UntypedLeaf| {
        if let Some(slot) = value.pointer_mut(&leaf.pointer) {
            *slot = Value::String(leaf.raw.clone());
        }
    };
    let mut candidates: Vec<Value> = untyped
        .iter()
        .filter(|leaf| merged.pointer(&leaf.pointer).is_some_and(|v| !v.is_string()))
        .map(|leaf| {
            let mut candidate = merged.clone();
            with_literal(&mut candidate, leaf);
            candidate
        })
        .collect();
    if candidates.len() > 1 {
        let mut all = merged.clone();
        untyped.iter().for_each(|leaf| with_literal(&mut all, leaf));
        candidates.push(all);
    }
    candidates
}

/// Load and validate an application config from its declared location,
/// reading the process environment.
pub fn load_config<C>(cfg: &mut C) -> Result<(), ConfigError>
where
    C: CoreConfig + Serialize + DeserializeOwned,
{
    load_config_with_env(cfg, &process_env)
}

pub fn load_config_with_env<C>(cfg: &mut C, env: &EnvLookup) -> Result<(), ConfigError>
where
    C: CoreConfig + Serialize + DeserializeOwned,
{
    let location = cfg.config_location()?;
    let automatic_env = cfg.automatic_env();
    load_into(cfg, &location, automatic_env, env)?;

    let missing = cfg.missing_fields();
    if !missing.is_empty() {
        return Err(ConfigError::MissingRequired(missing));
    }
    Ok(())
}

fn read_file(path: &Path) -> Result<Option<Value>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ConfigError::Io(e)),
    };

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };
    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?;
            serde_json::to_value(table)?
        }
        _ => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };

    if !value.is_object() {
        return Err(ConfigError::NotAnObject(path.to_path_buf()));
    }
    Ok(Some(value))
}

/// Deep-merge `src` into `dst`; objects merge key by key, anything else
/// replaces.
fn merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, value) in src {
                match dst.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        dst.insert(key, value);
                    }
                }
            }
        }
        (dst, src) => *dst = src,
    }
}

/// Replace every known leaf with its env variable when set. Returns the
/// leaves that were `null` before, whose type had to be guessed.
fn overlay_env(value: &mut Value, prefix: &str, env: &EnvLookup) -> Vec<UntypedLeaf> {
    let mut untyped = Vec::new();
    if let Value::Object(map) = value {
        overlay_object(map, prefix, "", env, &mut untyped);
    }
    untyped
}

fn overlay_object(
    map: &mut Map<String, Value>,
    prefix: &str,
    pointer: &str,
    env: &EnvLookup,
    untyped: &mut Vec<UntypedLeaf>,
) {
    for (key, value) in map.iter_mut() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let pointer = format!("{pointer}/{}", key.replace('~', "~0").replace('/', "~1"));
        if let Value::Object(child) = value {
            overlay_object(child, &path, &pointer, env, untyped);
            continue;
        }
        let Some(raw) = env(&env_name(&path)) else {
            continue;
        };
        if value.is_null() {
            *value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.clone()));
            untyped.push(UntypedLeaf { pointer, raw });
        } else {
            *value = coerce(value, raw);
        }
    }
}

/// Convert an env string to the JSON type of the value it replaces.
fn coerce(current: &Value, raw: String) -> Value {
    match current {
        Value::Bool(_) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Value::Bool(true),
            "false" | "0" | "" => Value::Bool(false),
            _ => Value::String(raw),
        },
        Value::Number(_) | Value::Array(_) => {
            serde_json::from_str(raw.trim()).unwrap_or(Value::String(raw))
        }
        _ => Value::String(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::CoreEnv;
    use crate::config::validation::Required;
    use serde::Deserialize;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + Send + Sync {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_location_parse() {
        assert_eq!(ConfigLocation::parse("").unwrap(), ConfigLocation::Disabled);
        assert_eq!(
            ConfigLocation::parse("file:/etc/app.json").unwrap(),
            ConfigLocation::File(PathBuf::from("/etc/app.json"))
        );
        assert!(matches!(ConfigLocation::parse("http://x"), Err(ConfigError::Location(_))));
        assert!(ConfigLocation::parse("file:").is_err());
        assert_eq!(
            ConfigLocation::File(PathBuf::from("/a.json")).to_string(),
            "file:/a.json"
        );
    }

    #[test]
    fn test_file_overrides_code_defaults() {
        let file = temp_file(".json", r#"{ "app_version": "1.1.1", "log_level": "warn" }"#);
        let mut cfg = CoreEnv::new("example");
        cfg.log_level = "info".into();

        let location = ConfigLocation::File(file.path().to_path_buf());
        load_into(&mut cfg, &location, false, &no_env).unwrap();

        assert_eq!(cfg.app_name, "example");
        assert_eq!(cfg.app_version, "1.1.1");
        assert_eq!(cfg.log_level, "warn");
    }

    #[test]
    fn test_toml_file() {
        let file = temp_file(
            ".toml",
            r#"
                app_name = "from-toml"
                [health.readiness_thresholds]
                db = 2
            "#,
        );
        let mut cfg = CoreEnv::default();
        load_into(&mut cfg, &ConfigLocation::File(file.path().to_path_buf()), false, &no_env).unwrap();

        assert_eq!(cfg.app_name, "from-toml");
        assert_eq!(cfg.health.readiness_thresholds.get("db"), Some(&2));
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let location = ConfigLocation::File(dir.path().join("absent.json"));
        let mut cfg = CoreEnv::new("example");
        load_into(&mut cfg, &location, false, &no_env).unwrap();
        assert_eq!(cfg.app_name, "example");
    }

    #[test]
    fn test_malformed_file_fails() {
        let file = temp_file(".json", "{ not json");
        let mut cfg = CoreEnv::default();
        let err = load_into(&mut cfg, &ConfigLocation::File(file.path().to_path_buf()), false, &no_env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let file = temp_file(".json", "[1, 2]");
        let err = load_into(&mut cfg, &ConfigLocation::File(file.path().to_path_buf()), false, &no_env)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject(_)));
    }

    #[test]
    fn test_env_overrides_file() {
        let file = temp_file(".json", r#"{ "profile": "development", "sentry_dsn": "" }"#);
        let env = env_from(&[("PROFILE", "production"), ("SENTRY_DSN", "https://k@o.example/1")]);
        let mut cfg = CoreEnv::default();
        load_into(&mut cfg, &ConfigLocation::File(file.path().to_path_buf()), true, &env).unwrap();

        assert_eq!(cfg.profile, "production");
        assert_eq!(cfg.sentry.sentry_dsn, "https://k@o.example/1");
    }

    #[test]
    fn test_env_ignored_when_disabled() {
        let env = env_from(&[("APP_NAME", "from-env")]);
        let mut cfg = CoreEnv::new("example");
        load_into(&mut cfg, &ConfigLocation::Disabled, false, &env).unwrap();
        assert_eq!(cfg.app_name, "example");
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Server {
        port: u16,
        tls: bool,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct AppConfig {
        #[serde(flatten)]
        core: CoreEnv,
        server: Server,
        required: String,
    }

    impl CoreConfig for AppConfig {
        fn core(&self) -> &CoreEnv {
            &self.core
        }

        fn config_location(&self) -> Result<ConfigLocation, ConfigError> {
            Ok(ConfigLocation::Disabled)
        }

        fn missing_fields(&self) -> Vec<MissingField> {
            Required::new()
                .check("required", "required", &self.required)
                .check("port", "server.port", &self.server.port)
                .finish()
        }
    }

    #[test]
    fn test_env_nested_keys_are_coerced() {
        let env = env_from(&[("SERVER__PORT", "8443"), ("SERVER__TLS", "true"), ("REQUIRED", "yes")]);
        let mut cfg = AppConfig::default();
        load_config_with_env(&mut cfg, &env).unwrap();

        assert_eq!(cfg.server.port, 8443);
        assert!(cfg.server.tls);
        assert_eq!(cfg.required, "yes");
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct Optional {
        port: Option<u16>,
        verbose: Option<bool>,
        label: Option<String>,
    }

    #[test]
    fn test_env_fills_unset_optional_fields() {
        let env = env_from(&[("PORT", "8080"), ("VERBOSE", "true"), ("LABEL", "edge")]);
        let mut cfg = Optional::default();
        load_into(&mut cfg, &ConfigLocation::Disabled, true, &env).unwrap();

        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.verbose, Some(true));
        assert_eq!(cfg.label.as_deref(), Some("edge"));
    }

    #[test]
    fn test_numeric_env_for_optional_string_stays_text() {
        let env = env_from(&[("PORT", "8080"), ("LABEL", "42")]);
        let mut cfg = Optional::default();
        load_into(&mut cfg, &ConfigLocation::Disabled, true, &env).unwrap();

        assert_eq!(cfg.port, Some(8080));
        assert_eq!(cfg.label.as_deref(), Some("42"));
    }

    #[test]
    fn test_bad_env_value_fails_deserialization() {
        let env = env_from(&[("SERVER__PORT", "not-a-port"), ("REQUIRED", "yes")]);
        let mut cfg = AppConfig::default();
        let err = load_config_with_env(&mut cfg, &env).unwrap_err();
        assert!(matches!(err, ConfigError::Value(_)));
    }

    #[test]
    fn test_missing_required_fields_are_listed() {
        let mut cfg = AppConfig::default();
        let err = load_config_with_env(&mut cfg, &no_env).unwrap_err();
        match &err {
            ConfigError::MissingRequired(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].env_name(), "SERVER__PORT");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("[required] is required"));
    }
}
