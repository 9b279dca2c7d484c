//! Recursive tree renderer.
//!
//! This module provides [`Renderer`], which walks a list of inputs (files or
//! directories), maps each concrete file to an output path, composes the
//! preload fragments with it and renders the result.
//!
//! # Traversal
//!
//! Inputs are visited depth-first. Two orderings are in play:
//!
//! - [`Traversal::Ordered`]: the caller's top-level inputs, visited exactly as
//!   given. Their order can matter (later inputs may be meant to override
//!   earlier ones), so they are never re-sorted.
//! - [`Traversal::Sorted`]: children discovered inside a directory. These are
//!   generated by the walk itself, so they are sorted lexicographically to
//!   make output deterministic.
//!
//! The first error aborts the whole call. Files written before the failure
//! stay on disk.
//!
//! # Single-file targets append
//!
//! When the output target is a plain file path (no trailing separator, not
//! an existing directory), every resolved input renders into that same file
//! and each render appends to it. Rendering a directory of three templates
//! into `all.txt` therefore concatenates all three, and running the same
//! command twice duplicates the content. Mirrored directory targets append
//! too, which only shows when a render is repeated over an existing tree.

use std::borrow::Cow;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use minijinja::Value;

use crate::config::RendererConfig;
use crate::error::RenderError;
use crate::output::{output_path, subtree_target, OutputPath, Sink};
use crate::probe::{PathProbe, RealFs};
use crate::template::CompiledUnit;

/// Key-ordered value map every template is rendered against.
pub type Values = serde_json::Map<String, serde_json::Value>;

/// Ordering applied to a list of paths before visiting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Visit in the given order (caller-supplied inputs)
    Ordered,
    /// Sort lexicographically first (engine-discovered children)
    Sorted,
}

/// One template execution: the sources parsed together, where the result
/// goes, and the values it sees.
#[derive(Debug, Clone)]
pub struct RenderUnit<'a> {
    /// Preload fragments, in configured order.
    pub preloads: &'a [PathBuf],
    /// The file being rendered. Parsed after all preloads.
    pub target: PathBuf,
    pub output: OutputPath,
    pub values: &'a Value,
}

impl RenderUnit<'_> {
    /// All template sources in parse order: preloads, then the target.
    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.preloads
            .iter()
            .map(PathBuf::as_path)
            .chain(std::iter::once(self.target.as_path()))
    }
}

/// Renders a set of inputs against a value map.
///
/// # Example
///
/// ```rust,no_run
/// use stencil_render::{Renderer, RendererConfig, Values};
///
/// let renderer = Renderer::new(
///     RendererConfig::new()
///         .with_input("templates/")
///         .with_preload("lib/macros.tpl"),
/// );
///
/// let mut values = Values::new();
/// values.insert("name".into(), "World".into());
///
/// // templates/app/config.yaml.tpl -> out/templates/app/config.yaml
/// renderer.execute("out/", &values)?;
/// # Ok::<(), stencil_render::RenderError>(())
/// ```
pub struct Renderer {
    config: RendererConfig,
    probe: Box<dyn PathProbe>,
}

impl Renderer {
    /// Creates a renderer that probes the real filesystem.
    pub fn new(config: RendererConfig) -> Self {
        Self::with_probe(config, Box::new(RealFs))
    }

    /// Creates a renderer with an explicit filesystem probe.
    ///
    /// The probe answers "is this output target an existing directory?"
    /// during output-path resolution.
    pub fn with_probe(config: RendererConfig, probe: Box<dyn PathProbe>) -> Self {
        Self { config, probe }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Renders every configured input into `target`.
    ///
    /// `target` is `-` for standard output, a separator-terminated path to
    /// mirror inputs beneath a directory, or a single file path.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered, depth-first, left to right.
    pub fn execute(&self, target: &str, values: &Values) -> Result<(), RenderError> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.execute_with_stdout(target, values, &mut handle)
    }

    /// Like [`execute`](Self::execute), but output destined for standard
    /// output goes to `stdout` instead.
    pub fn execute_with_stdout(
        &self,
        target: &str,
        values: &Values,
        stdout: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let values = Value::from_serialize(values);
        self.walk(
            self.config.inputs(),
            Traversal::Ordered,
            target,
            &values,
            stdout,
        )
    }

    fn walk(
        &self,
        inputs: &[PathBuf],
        traversal: Traversal,
        target: &str,
        values: &Value,
        stdout: &mut dyn Write,
    ) -> Result<(), RenderError> {
        let inputs: Cow<'_, [PathBuf]> = match traversal {
            Traversal::Ordered => Cow::Borrowed(inputs),
            Traversal::Sorted => {
                let mut sorted = inputs.to_vec();
                sorted.sort();
                Cow::Owned(sorted)
            }
        };

        for input in inputs.iter() {
            let metadata = fs::metadata(input).map_err(|source| RenderError::Input {
                path: input.clone(),
                source,
            })?;

            if !metadata.is_dir() {
                let filename = input
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let unit = RenderUnit {
                    preloads: self.config.preloads(),
                    target: input.clone(),
                    output: output_path(target, &filename, self.probe.as_ref()),
                    values,
                };
                self.render(&unit, stdout)?;
                continue;
            }

            let children = list_children(input)?;
            let subtree = subtree_target(target, input);
            tracing::debug!(
                dir = %input.display(),
                entries = children.len(),
                target = %subtree,
                "descending into directory"
            );
            self.walk(&children, Traversal::Sorted, &subtree, values, stdout)?;
        }
        Ok(())
    }

    /// Renders one unit into its destination.
    ///
    /// The destination is opened before the templates are parsed and is
    /// always flushed and closed, whether rendering succeeds or not.
    fn render(&self, unit: &RenderUnit<'_>, stdout: &mut dyn Write) -> Result<(), RenderError> {
        if unit.output.is_blank() {
            return Err(RenderError::BlankOutput);
        }

        let sources: Vec<String> = unit.sources().map(|p| p.display().to_string()).collect();
        match &unit.output {
            OutputPath::Stdout => {
                tracing::info!("Rendering [{}] to STDOUT", sources.join(", "))
            }
            OutputPath::File(path) => {
                tracing::info!("Rendering [{}] into {}", sources.join(", "), path.display())
            }
        }

        let mut sink = Sink::open(&unit.output, stdout)?;
        let rendered = self.compile_and_render(unit, sink.writer());
        let closed = sink.finish();
        rendered.and(closed)
    }

    fn compile_and_render(&self, unit: &RenderUnit<'_>, out: &mut dyn Write) -> Result<(), RenderError> {
        let compiled = CompiledUnit::compile(
            unit.preloads,
            &unit.target,
            self.config.helpers(),
            self.config.missing_key(),
        )?;
        compiled.render_to(unit.values, out, &unit.output.to_string())
    }
}

/// Lists the immediate entries of `dir`, joined onto `dir`. Unsorted.
fn list_children(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    let list_error = |source| RenderError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut children = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_error)? {
        let entry = entry.map_err(list_error)?;
        children.push(dir.join(entry.file_name()));
    }
    Ok(children)
}
