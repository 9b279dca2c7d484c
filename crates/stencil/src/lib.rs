//! # Stencil
//!
//! Command-line front end for [`stencil_render`]: renders files and whole
//! directory trees of templates against values loaded from YAML or JSON.
//!
//! ```text
//! stencil -f values.yaml templates/          # everything to stdout
//! stencil -f values.yaml -o out/ templates/  # mirror into out/templates/...
//! stencil -f values.yaml -o all.txt a.tpl b.tpl
//! ```
//!
//! - [`cli`]: argument definitions
//! - [`values`]: value file loading, deep merge and `--set` overrides
//! - [`logging`]: tracing subscriber setup (`-v`, `-q`, `STENCIL_LOG`)
//!
//! The binary is a thin wrapper around [`run`].

pub mod cli;
pub mod logging;
pub mod values;

use std::io::Write;

use anyhow::Context;
use stencil_render::Renderer;

pub use cli::{Cli, MissingKey};
pub use values::{load_values, ValuesError};

/// Loads values and renders every input named on the command line.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    run_with_stdout(cli, &mut handle)
}

/// Like [`run`], but stdout-bound output goes to `stdout`.
pub fn run_with_stdout(cli: &Cli, stdout: &mut dyn Write) -> anyhow::Result<()> {
    let values = load_values(&cli.values, &cli.set).context("could not load values")?;
    tracing::debug!(keys = values.len(), "values ready");

    let renderer = Renderer::new(cli.renderer_config());
    renderer
        .execute_with_stdout(&cli.output, &values, stdout)
        .with_context(|| format!("could not render into {}", cli.output))?;
    stdout.flush().context("could not flush stdout")?;
    Ok(())
}
