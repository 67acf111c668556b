//! Trim a translation file down to the keys of its base language file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    pub pretty: bool,
    /// One level of indentation when pretty printing.
    pub indent: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            indent: "\t".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrimError {
    #[error("Can't load JSON data from {}.", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Can't decode JSON data found in {}.", path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Can't decode JSON data found in {}: not an object.", path.display())]
    NotObject { path: PathBuf },
    #[error("Can't encode data as JSON!")]
    Encode(#[source] serde_json::Error),
    #[error("Failed to save JSON data to {}!", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Remove every key of `target` that `base` does not have. Values and key
/// order come from `target`.
pub fn retain_base_keys(base: &Map<String, Value>, target: Map<String, Value>) -> Map<String, Value> {
    target
        .into_iter()
        .filter(|(key, _)| base.contains_key(key))
        .collect()
}

/// Serialize without escaping slashes or non-ASCII text, and without a
/// trailing newline.
pub fn encode(data: &Map<String, Value>, config: &TrimConfig) -> Result<String, TrimError> {
    if !config.pretty {
        return serde_json::to_string(data).map_err(TrimError::Encode);
    }
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(config.indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    data.serialize(&mut ser).map_err(TrimError::Encode)?;
    // The serializer only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Rewrite `target_path` keeping only the keys found in `base_path`. The
/// target is left untouched when either file cannot be loaded.
pub fn run(base_path: &Path, target_path: &Path, config: &TrimConfig) -> Result<(), TrimError> {
    let base = load(base_path)?;
    let target = load(target_path)?;
    let before = target.len();

    let trimmed = retain_base_keys(&base, target);
    tracing::debug!(
        removed = before - trimmed.len(),
        kept = trimmed.len(),
        "trimmed {}",
        target_path.display()
    );

    let json = encode(&trimmed, config)?;
    std::fs::write(target_path, json).map_err(|source| TrimError::Write {
        path: target_path.to_path_buf(),
        source,
    })
}

fn load(path: &Path) -> Result<Map<String, Value>, TrimError> {
    let text = std::fs::read_to_string(path).map_err(|source| TrimError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(TrimError::NotObject {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(TrimError::Decode {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn object(json: &str) -> Map<String, Value> {
        match serde_json::from_str(json).unwrap() {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn setup(base: &str, target: &str) -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let base_path = dir.path().join("en.json");
        let target_path = dir.path().join("de.json");
        fs::write(&base_path, base).unwrap();
        fs::write(&target_path, target).unwrap();
        (dir, base_path, target_path)
    }

    // =========================================================================
    // Trimming
    // =========================================================================

    #[test]
    fn test_keeps_target_values_for_base_keys() {
        let trimmed = retain_base_keys(
            &object(r#"{"a":1,"b":2}"#),
            object(r#"{"a":10,"b":20,"c":30}"#),
        );
        assert_eq!(trimmed, object(r#"{"a":10,"b":20}"#));
    }

    #[test]
    fn test_target_order_preserved() {
        let trimmed = retain_base_keys(
            &object(r#"{"x":0,"m":0,"a":0}"#),
            object(r#"{"m":1,"gone":2,"x":3,"a":4}"#),
        );
        let keys: Vec<&str> = trimmed.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["m", "x", "a"]);
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn test_pretty_with_tabs() {
        let json = encode(&object(r#"{"a":10,"b":{"c":[1]}}"#), &TrimConfig::default()).unwrap();
        assert_eq!(json, "{\n\t\"a\": 10,\n\t\"b\": {\n\t\t\"c\": [\n\t\t\t1\n\t\t]\n\t}\n}");
    }

    #[test]
    fn test_compact() {
        let config = TrimConfig {
            pretty: false,
            ..TrimConfig::default()
        };
        assert_eq!(encode(&object(r#"{"a":10}"#), &config).unwrap(), r#"{"a":10}"#);
    }

    #[test]
    fn test_unicode_and_slashes_unescaped() {
        let json = encode(&object(r#"{"k":"é a/b"}"#), &TrimConfig::default()).unwrap();
        assert_eq!(json, "{\n\t\"k\": \"é a/b\"\n}");
    }

    // =========================================================================
    // Files
    // =========================================================================

    #[test]
    fn test_run_rewrites_target() {
        let (_dir, base, target) = setup(r#"{"a":1,"b":2}"#, r#"{"a":10,"b":20,"c":30}"#);
        run(&base, &target, &TrimConfig::default()).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "{\n\t\"a\": 10,\n\t\"b\": 20\n}"
        );
    }

    #[test]
    fn test_non_object_target_not_written() {
        let (_dir, base, target) = setup(r#"{"a":1}"#, "[1,2]");
        let err = run(&base, &target, &TrimConfig::default()).unwrap_err();
        assert!(matches!(err, TrimError::NotObject { .. }));
        assert_eq!(fs::read_to_string(&target).unwrap(), "[1,2]");
    }

    #[test]
    fn test_invalid_base_not_written() {
        let (_dir, base, target) = setup("{oops", r#"{"a":1}"#);
        let err = run(&base, &target, &TrimConfig::default()).unwrap_err();
        assert!(matches!(err, TrimError::Decode { .. }));
        assert!(err.to_string().starts_with("Can't decode JSON data found in"));
        assert_eq!(fs::read_to_string(&target).unwrap(), r#"{"a":1}"#);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(
            &dir.path().join("en.json"),
            &dir.path().join("de.json"),
            &TrimConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TrimError::Read { .. }));
    }
}
