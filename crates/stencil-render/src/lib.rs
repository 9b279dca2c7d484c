//! # Stencil Render - Recursive Template Rendering
//!
//! `stencil-render` renders text templates against a value map and mirrors an
//! input tree onto an output tree. It is the engine behind the `stencil` CLI,
//! but can be embedded in any application that needs to expand a directory
//! of templates.
//!
//! ## Core Concepts
//!
//! - [`Renderer`]: Walks inputs and renders each file
//! - [`RendererConfig`]: Inputs, preloads, missing-key policy and helpers
//! - [`MissingKeyPolicy`]: Strict (`Error`) or lenient (`ZeroValue`) lookups
//! - [`Helpers`]: Functions callable from templates
//! - [`output_path`]: Maps an output target and file name to a destination
//! - [`PathProbe`]: Filesystem queries made during path resolution
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stencil_render::{Helpers, MissingKeyPolicy, Renderer, RendererConfig, Values};
//!
//! let config = RendererConfig::new()
//!     .with_inputs(["templates/"])
//!     .with_preload("lib/macros.tpl")
//!     .with_missing_key(MissingKeyPolicy::Error)
//!     .with_helpers(Helpers::builtin());
//!
//! let mut values = Values::new();
//! values.insert("project".into(), "stencil".into());
//!
//! Renderer::new(config).execute("out/", &values)?;
//! # Ok::<(), stencil_render::RenderError>(())
//! ```
//!
//! ## Output Targets
//!
//! | Target | Result |
//! |--------|--------|
//! | `-` | Everything goes to standard output |
//! | `out/` | `templates/a.txt.tpl` becomes `out/templates/a.txt` |
//! | `out` (existing directory) | Same as `out/` |
//! | `all.txt` | Every input appends into `all.txt` |
//!
//! `.tpl` and `.tmpl` suffixes are stripped from mirrored file names; other
//! extensions are kept.

pub mod config;
mod error;
pub mod output;
pub mod probe;
mod renderer;
pub mod template;

// Error type
pub use error::RenderError;

pub use config::{MissingKeyPolicy, RendererConfig};
pub use output::{
    output_path, strip_template_suffix, subtree_target, OutputPath, STDOUT_TARGET,
    TEMPLATE_SUFFIXES,
};
pub use probe::{MockFs, PathProbe, RealFs};
pub use renderer::{RenderUnit, Renderer, Traversal, Values};
pub use template::{HelperFn, Helpers};
