//! Error types for tree rendering.
//!
//! This module provides [`RenderError`], the single error type returned by
//! [`Renderer::execute`](crate::Renderer::execute). Every variant carries the
//! paths involved so a failure deep inside a directory walk can be traced back
//! to the file that caused it.

use std::io;
use std::path::PathBuf;

/// Errors that can occur while rendering a set of inputs.
///
/// Rendering stops at the first error; no variant is ever retried.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// An input path could not be opened or stat'ed.
    #[error("cannot read input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A directory input could not be listed.
    #[error("cannot list directory {}: {source}", .path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The resolved output name was blank.
    #[error("output name cannot be blank")]
    BlankOutput,

    /// The parent directory chain of an output file could not be created.
    #[error("cannot create directory for {}: {source}", .output.display())]
    CreateDir {
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    /// An output file could not be opened for appending.
    #[error("cannot open output file {}: {source}", .output.display())]
    OpenOutput {
        output: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template source (target or preload) could not be read.
    #[error("cannot read template {}: {source}", .path.display())]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The template set failed to parse.
    #[error("cannot parse templates [{sources}]: {source}")]
    Parse {
        /// Comma-joined list of every source in the render unit.
        sources: String,
        #[source]
        source: minijinja::Error,
    },

    /// The template set parsed but failed while executing.
    #[error("cannot render templates [{sources}] into {output}: {source}")]
    Execute {
        sources: String,
        output: String,
        #[source]
        source: minijinja::Error,
    },

    /// Rendered output could not be flushed to its destination.
    #[error("cannot write output {output}: {source}")]
    Write {
        output: String,
        #[source]
        source: io::Error,
    },
}

impl RenderError {
    /// Returns the underlying template engine error, if this is a parse or
    /// execution failure.
    pub fn template_error(&self) -> Option<&minijinja::Error> {
        match self {
            RenderError::Parse { source, .. } | RenderError::Execute { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if the render failed because a referenced value was
    /// absent under the strict missing-key policy.
    pub fn is_missing_key(&self) -> bool {
        self.template_error()
            .is_some_and(|err| err.kind() == minijinja::ErrorKind::UndefinedError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_output_display() {
        assert_eq!(
            RenderError::BlankOutput.to_string(),
            "output name cannot be blank"
        );
    }

    #[test]
    fn test_input_error_names_path() {
        let err = RenderError::Input {
            path: PathBuf::from("missing/a.tpl"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let msg = err.to_string();
        assert!(msg.contains("missing/a.tpl"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_parse_error_lists_sources() {
        let err = RenderError::Parse {
            sources: "lib.tpl, a.tpl".into(),
            source: minijinja::Error::new(minijinja::ErrorKind::SyntaxError, "unexpected end"),
        };
        assert!(err.to_string().contains("[lib.tpl, a.tpl]"));
        assert!(err.template_error().is_some());
        assert!(!err.is_missing_key());
    }

    #[test]
    fn test_missing_key_detection() {
        let err = RenderError::Execute {
            sources: "a.tpl".into(),
            output: "-".into(),
            source: minijinja::Error::new(minijinja::ErrorKind::UndefinedError, "undefined value"),
        };
        assert!(err.is_missing_key());
    }

    #[test]
    fn test_io_variants_expose_source() {
        use std::error::Error as _;

        let err = RenderError::OpenOutput {
            output: PathBuf::from("out.txt"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.template_error().is_none());
    }
}
