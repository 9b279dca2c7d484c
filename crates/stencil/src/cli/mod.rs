//! Command-line arguments.
//!
//! [`Cli`] is the clap definition for the `stencil` binary. It only parses;
//! turning the parsed flags into a [`RendererConfig`] and a value map happens
//! in [`Cli::renderer_config`] and [`crate::values::load_values`].
//!
//! ```text
//! stencil -f base.yaml -f prod.yaml --set image.tag=1.4 \
//!         -p lib/macros.tpl -o out/ templates/
//! ```
//!
//! Input order is kept exactly as typed. Value files are merged left to
//! right, then each `--set` is applied in order.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use stencil_render::{Helpers, MissingKeyPolicy, RendererConfig};
use tracing::level_filters::LevelFilter;

/// Render a tree of templates against YAML/JSON values.
#[derive(Debug, Parser)]
#[command(name = "stencil", version, about, long_about = None)]
pub struct Cli {
    /// Template files or directories to render, in order.
    #[arg(required = true, value_name = "INPUT")]
    pub inputs: Vec<PathBuf>,

    /// Where to write: `-` for stdout, `dir/` to mirror inputs beneath a
    /// directory, or a single file that every input appends to.
    #[arg(short, long, default_value = "-", value_name = "PATH")]
    pub output: String,

    /// YAML or JSON value file; repeatable, later files override earlier ones.
    /// Use `-` to read values from stdin.
    #[arg(short = 'f', long = "values", value_name = "FILE")]
    pub values: Vec<PathBuf>,

    /// Set a value after all value files are merged (e.g. `image.tag=1.4`).
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub set: Vec<String>,

    /// Template fragment parsed before every input; repeatable.
    #[arg(short, long = "preload", value_name = "FILE")]
    pub preload: Vec<PathBuf>,

    /// What to do when a template references a missing value.
    #[arg(long, value_enum, default_value_t = MissingKey::ZeroValue)]
    pub missing_key: MissingKey,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// `--missing-key` choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingKey {
    /// Fail on the first missing value
    Error,
    /// Render missing values as empty
    ZeroValue,
}

impl From<MissingKey> for MissingKeyPolicy {
    fn from(value: MissingKey) -> Self {
        match value {
            MissingKey::Error => MissingKeyPolicy::Error,
            MissingKey::ZeroValue => MissingKeyPolicy::ZeroValue,
        }
    }
}

impl Cli {
    /// Log level implied by `-v`/`-q`. `STENCIL_LOG` can still override it.
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::ERROR;
        }
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Builds the renderer configuration, with the built-in helpers.
    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig::new()
            .with_inputs(self.inputs.iter().cloned())
            .with_preloads(self.preload.iter().cloned())
            .with_missing_key(self.missing_key.into())
            .with_helpers(Helpers::builtin())
    }
}
