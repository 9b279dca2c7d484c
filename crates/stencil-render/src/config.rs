//! Renderer configuration.
//!
//! [`RendererConfig`] is built once, handed to [`Renderer::new`](crate::Renderer::new)
//! and never mutated afterwards. It holds everything that stays constant
//! across renders: the top-level inputs, the preload fragments, the
//! missing-key policy and the helper registry.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use minijinja::UndefinedBehavior;

use crate::template::Helpers;

/// What happens when a template references a key the value map lacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeyPolicy {
    /// Substitute an empty value and keep going
    #[default]
    ZeroValue,
    /// Fail the render on first use of an absent key
    Error,
}

impl MissingKeyPolicy {
    pub(crate) fn undefined_behavior(self) -> UndefinedBehavior {
        match self {
            MissingKeyPolicy::ZeroValue => UndefinedBehavior::Chainable,
            MissingKeyPolicy::Error => UndefinedBehavior::Strict,
        }
    }
}

impl fmt::Display for MissingKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingKeyPolicy::ZeroValue => f.write_str("zero-value"),
            MissingKeyPolicy::Error => f.write_str("error"),
        }
    }
}

impl FromStr for MissingKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zero-value" | "zero" => Ok(MissingKeyPolicy::ZeroValue),
            "error" => Ok(MissingKeyPolicy::Error),
            other => Err(format!(
                "unknown missing-key policy '{}' (expected 'error' or 'zero-value')",
                other
            )),
        }
    }
}

/// Immutable configuration for a [`Renderer`](crate::Renderer).
///
/// # Example
///
/// ```rust
/// use stencil_render::{Helpers, MissingKeyPolicy, RendererConfig};
///
/// let config = RendererConfig::new()
///     .with_input("templates/")
///     .with_preload("lib/macros.tpl")
///     .with_missing_key(MissingKeyPolicy::Error)
///     .with_helpers(Helpers::builtin());
///
/// assert_eq!(config.inputs().len(), 1);
/// assert_eq!(config.missing_key(), MissingKeyPolicy::Error);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    inputs: Vec<PathBuf>,
    preloads: Vec<PathBuf>,
    missing_key: MissingKeyPolicy,
    helpers: Helpers,
}

impl RendererConfig {
    /// Creates an empty configuration with the lenient missing-key policy
    /// and no helpers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level input. Inputs are rendered in the order added.
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    /// Appends several top-level inputs, keeping their order.
    pub fn with_inputs<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.inputs.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Appends a preload fragment.
    pub fn with_preload(mut self, path: impl Into<PathBuf>) -> Self {
        self.preloads.push(path.into());
        self
    }

    /// Appends several preload fragments, keeping their order.
    pub fn with_preloads<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.preloads.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_missing_key(mut self, policy: MissingKeyPolicy) -> Self {
        self.missing_key = policy;
        self
    }

    /// Replaces the helper registry.
    pub fn with_helpers(mut self, helpers: Helpers) -> Self {
        self.helpers = helpers;
        self
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn preloads(&self) -> &[PathBuf] {
        &self.preloads
    }

    pub fn missing_key(&self) -> MissingKeyPolicy {
        self.missing_key
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }
}
