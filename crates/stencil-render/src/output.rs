//! Output path resolution and destinations.
//!
//! [`output_path`] maps an output target plus an input file name to the place
//! a rendered artifact is written. The target string decides the mode:
//!
//! | Target | Mode |
//! |--------|------|
//! | `""` or `-` | standard output, for every file at every depth |
//! | ends with a separator (`out/`) | mirror: `out/<name>` |
//! | names an existing directory | mirror, same as above |
//! | anything else | single file: the target itself |
//!
//! Template suffixes (`.tpl`, then `.tmpl`) are stripped from the file name
//! before it is joined onto a directory target.
//!
//! In single-file mode every render appends to the same file, so several
//! resolved inputs concatenate into one artifact.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use crate::error::RenderError;
use crate::probe::PathProbe;

/// Output target meaning "write to standard output".
pub const STDOUT_TARGET: &str = "-";

/// Template suffixes stripped from output file names, in priority order.
pub const TEMPLATE_SUFFIXES: &[&str] = &[".tpl", ".tmpl"];

/// Where a single rendered artifact goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPath {
    /// Write to standard output
    Stdout,
    /// Append to a specific file
    File(PathBuf),
}

impl OutputPath {
    /// Returns true if the destination has no usable name.
    pub fn is_blank(&self) -> bool {
        match self {
            OutputPath::Stdout => false,
            OutputPath::File(path) => path.to_string_lossy().trim().is_empty(),
        }
    }
}

impl fmt::Display for OutputPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputPath::Stdout => f.write_str("STDOUT"),
            OutputPath::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Returns true if `target` ends with a path separator.
pub fn ends_with_separator(target: &str) -> bool {
    target.ends_with('/') || target.ends_with(MAIN_SEPARATOR)
}

/// Strips one trailing template suffix from `filename`.
///
/// `.tpl` is checked before `.tmpl`; at most one suffix is removed, so
/// `x.tpl.tmpl` becomes `x.tpl`.
pub fn strip_template_suffix(filename: &str) -> &str {
    TEMPLATE_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))
        .unwrap_or(filename)
}

/// Resolves the output path for a file named `filename` rendered against
/// the output target `base`.
pub fn output_path(base: &str, filename: &str, probe: &dyn PathProbe) -> OutputPath {
    if base.is_empty() || base == STDOUT_TARGET {
        return OutputPath::Stdout;
    }

    let filename = strip_template_suffix(filename);
    if ends_with_separator(base) || probe.is_dir(Path::new(base)) {
        let resolved = Path::new(base).join(filename);
        tracing::trace!(base, filename, output = %resolved.display(), "mirroring into directory");
        return OutputPath::File(resolved);
    }

    tracing::trace!(base, filename, "writing to single output file");
    OutputPath::File(PathBuf::from(base))
}

/// Computes the output target handed down when descending into `dir`.
///
/// A separator-terminated target grows by the directory's base name plus a
/// separator; any other target (including `-`) passes through unchanged.
pub fn subtree_target(base: &str, dir: &Path) -> String {
    if ends_with_separator(base) {
        format!("{}{}{}", base, base_name(dir), MAIN_SEPARATOR)
    } else {
        base.to_string()
    }
}

/// Last component of `path` as a string (`.` for an empty path).
pub(crate) fn base_name(path: &Path) -> String {
    match path.components().next_back() {
        Some(Component::Normal(name)) => name.to_string_lossy().into_owned(),
        Some(other) => other.as_os_str().to_string_lossy().into_owned(),
        None => ".".to_string(),
    }
}

/// An opened destination for one render unit.
///
/// File destinations are created if absent and opened in append mode; they
/// are never truncated.
pub(crate) enum Sink<'a> {
    Stdout(&'a mut dyn Write),
    File {
        path: PathBuf,
        writer: BufWriter<File>,
    },
}

impl<'a> Sink<'a> {
    /// Opens `output`, creating its parent directory chain when needed.
    pub(crate) fn open(output: &OutputPath, stdout: &'a mut dyn Write) -> Result<Self, RenderError> {
        let path = match output {
            OutputPath::Stdout => return Ok(Sink::Stdout(stdout)),
            OutputPath::File(path) => path,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| RenderError::CreateDir {
                output: path.clone(),
                source,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| RenderError::OpenOutput {
                output: path.clone(),
                source,
            })?;

        Ok(Sink::File {
            path: path.clone(),
            writer: BufWriter::new(file),
        })
    }

    pub(crate) fn writer(&mut self) -> &mut dyn Write {
        match self {
            Sink::Stdout(out) => &mut **out,
            Sink::File { writer, .. } => writer,
        }
    }

    /// Flushes and releases the destination. Files are synced to disk.
    pub(crate) fn finish(self) -> Result<(), RenderError> {
        match self {
            Sink::Stdout(out) => out.flush().map_err(|source| RenderError::Write {
                output: STDOUT_TARGET.to_string(),
                source,
            }),
            Sink::File { path, mut writer } => {
                let flushed = writer.flush().and_then(|()| writer.get_ref().sync_all());
                flushed.map_err(|source| RenderError::Write {
                    output: path.display().to_string(),
                    source,
                })
            }
        }
    }
}
