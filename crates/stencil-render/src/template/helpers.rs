//! Helper functions callable from templates.
//!
//! A [`Helpers`] registry maps names to functions. Every registered function
//! is installed into the MiniJinja environment of each render unit, so
//! `{{ env("HOME") }}` works in targets and preloads alike.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use minijinja::value::Rest;
use minijinja::{Environment, Error, ErrorKind, Value};

/// A helper implementation. Receives the call arguments positionally.
pub type HelperFn = Arc<dyn Fn(&[Value]) -> Result<Value, Error> + Send + Sync>;

/// Registry of helper functions, keyed by the name used in templates.
///
/// # Example
///
/// ```rust
/// use stencil_render::Helpers;
/// use minijinja::Value;
///
/// let helpers = Helpers::builtin().with("shout", |args| {
///     let text = args.first().and_then(Value::as_str).unwrap_or_default();
///     Ok(Value::from(text.to_uppercase()))
/// });
/// assert!(helpers.contains("shout"));
/// assert!(helpers.contains("to_json"));
/// ```
#[derive(Clone, Default)]
pub struct Helpers {
    functions: BTreeMap<String, HelperFn>,
}

impl Helpers {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in helpers:
    ///
    /// - `env(name, default?)`: environment variable, or `default`, or `""`
    /// - `required(value, message?)`: fails unless `value` is present and non-empty
    /// - `to_json(value)`: compact JSON
    /// - `to_yaml(value)`: YAML without the trailing newline
    pub fn builtin() -> Self {
        Self::new()
            .with("env", env_var)
            .with("required", required)
            .with("to_json", to_json)
            .with("to_yaml", to_yaml)
    }

    /// Registers `f` under `name`, replacing any helper of the same name.
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, Error> + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Helper names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Installs every helper as a global function on `env`.
    pub fn register(&self, env: &mut Environment<'static>) {
        for (name, f) in &self.functions {
            let f = Arc::clone(f);
            env.add_function(name.clone(), move |args: Rest<Value>| f(args.as_slice()));
        }
    }
}

impl fmt::Debug for Helpers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

fn env_var(args: &[Value]) -> Result<Value, Error> {
    let name = args.first().and_then(Value::as_str).ok_or_else(|| {
        Error::new(
            ErrorKind::MissingArgument,
            "env() requires a variable name",
        )
    })?;

    match std::env::var(name) {
        Ok(value) => Ok(Value::from(value)),
        Err(_) => Ok(args.get(1).cloned().unwrap_or_else(|| Value::from(""))),
    }
}

fn required(args: &[Value]) -> Result<Value, Error> {
    let value = args.first().cloned().unwrap_or(Value::UNDEFINED);
    let missing = value.is_undefined()
        || value.is_none()
        || value.as_str().is_some_and(str::is_empty);

    if missing {
        let message = args
            .get(1)
            .and_then(Value::as_str)
            .unwrap_or("required value is missing");
        return Err(Error::new(ErrorKind::InvalidOperation, message.to_string()));
    }
    Ok(value)
}

fn to_json(args: &[Value]) -> Result<Value, Error> {
    let value = args.first().cloned().unwrap_or(Value::UNDEFINED);
    serde_json::to_string(&value)
        .map(Value::from)
        .map_err(|e| Error::new(ErrorKind::BadSerialization, "to_json failed").with_source(e))
}

fn to_yaml(args: &[Value]) -> Result<Value, Error> {
    let value = args.first().cloned().unwrap_or(Value::UNDEFINED);
    serde_yaml::to_string(&value)
        .map(|yaml| Value::from(yaml.trim_end_matches('\n').to_string()))
        .map_err(|e| Error::new(ErrorKind::BadSerialization, "to_yaml failed").with_source(e))
}
