//! Loading the value map templates render against.
//!
//! Value files are YAML (which covers JSON) and must hold a mapping at the
//! root. Files are deep-merged left to right: mappings merge key by key,
//! anything else replaces what was there. `--set` overrides run last.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use stencil_render::Values;
use thiserror::Error;

/// Path that reads values from stdin.
pub const STDIN_PATH: &str = "-";

#[derive(Debug, Error)]
pub enum ValuesError {
    #[error("invalid --set {0:?}: expected KEY=VALUE with a non-empty key")]
    InvalidSet(String),

    #[error("values from {0} must be a mapping at the root")]
    NotAMapping(String),

    #[error("failed to read values from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse values from {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Loads and merges `files`, then applies `sets` in order.
pub fn load_values<P: AsRef<Path>>(files: &[P], sets: &[String]) -> Result<Values, ValuesError> {
    let mut values = Values::new();
    for file in files {
        let file = file.as_ref();
        let loaded = load_file(file)?;
        tracing::debug!(file = %file.display(), keys = loaded.len(), "loaded values");
        merge(&mut values, loaded);
    }
    for set in sets {
        apply_set(&mut values, set)?;
    }
    Ok(values)
}

fn load_file(path: &Path) -> Result<Values, ValuesError> {
    let read_error = |source| ValuesError::Read {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == STDIN_PATH {
        let mut source = String::new();
        io::stdin()
            .read_to_string(&mut source)
            .map_err(read_error)?;
        return parse_values(&source, "stdin");
    }

    let source = fs::read_to_string(path).map_err(read_error)?;
    parse_values(&source, &path.display().to_string())
}

/// Parses a YAML or JSON document into a value map. An empty document is an
/// empty map.
pub fn parse_values(source: &str, origin: &str) -> Result<Values, ValuesError> {
    if source.trim().is_empty() {
        return Ok(Values::new());
    }
    let value: Value = serde_yaml::from_str(source).map_err(|source| ValuesError::Parse {
        origin: origin.to_string(),
        source,
    })?;

    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Values::new()),
        _ => Err(ValuesError::NotAMapping(origin.to_string())),
    }
}

/// Deep-merges `incoming` into `base`. Keys from `incoming` win.
pub fn merge(base: &mut Values, incoming: Values) {
    for (key, value) in incoming {
        match (base.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

/// Applies one `KEY=VALUE` override. Dotted keys create nested mappings.
pub fn apply_set(values: &mut Values, set: &str) -> Result<(), ValuesError> {
    let (key, raw) = set
        .split_once('=')
        .ok_or_else(|| ValuesError::InvalidSet(set.to_string()))?;

    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        return Err(ValuesError::InvalidSet(set.to_string()));
    }

    insert_path(values, &segments, parse_scalar(raw));
    Ok(())
}

fn insert_path(values: &mut Values, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            values.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let entry = values
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Reads `raw` as a YAML scalar so `--set port=80` is a number and
/// `--set debug=true` a bool. Anything that isn't a scalar stays a string.
fn parse_scalar(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(value @ (Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Null)) => value,
        _ => Value::String(raw.to_string()),
    }
}
