//! MiniJinja environment construction for one render unit.
//!
//! A render unit is parsed as a single template set sharing one namespace.
//! Each preload is first checked as written, then re-registered reduced to
//! its top-level definitions and prefixed with an `extends` of the next
//! source, so the sources form a chain ending at the target:
//!
//! ```text
//! lib/a.tpl:  {% extends "lib/b.tpl" %}<definitions of a.tpl>
//! lib/b.tpl:  {% extends "page.tpl" %}<definitions of b.tpl>
//! page.tpl:   <target source>
//! ```
//!
//! Rendering starts at the head of the chain. Every link runs in the same
//! frame with its output discarded, so definitions accumulate in parse order
//! and only the target produces output. A name defined again later replaces
//! the earlier definition everywhere, including inside preload macros that
//! call it. Line numbers in each source still match the file on disk.

use std::fs;
use std::io;
use std::path::Path;

use minijinja::{AutoEscape, Environment, Value};

use super::compose::definitions_only;
use super::helpers::Helpers;
use crate::config::MissingKeyPolicy;
use crate::error::RenderError;
use crate::output::base_name;

/// A parsed template set ready to execute.
pub(crate) struct CompiledUnit {
    env: Environment<'static>,
    entry: String,
    sources: String,
}

impl CompiledUnit {
    /// Parses `preloads` followed by `target` into one environment.
    pub(crate) fn compile(
        preloads: &[impl AsRef<Path>],
        target: &Path,
        helpers: &Helpers,
        policy: MissingKeyPolicy,
    ) -> Result<Self, RenderError> {
        let sources = join_sources(preloads.iter().map(AsRef::as_ref).chain([target]));
        let parse_error = |source| RenderError::Parse {
            sources: sources.clone(),
            source,
        };

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.set_undefined_behavior(policy.undefined_behavior());
        helpers.register(&mut env);

        let chain = preload_chain(preloads, target);
        let preload_names: Vec<String> = chain.iter().map(|(_, name)| name.clone()).collect();
        let target_name = target_template_name(target, &preload_names);

        for (index, (path, name)) in chain.iter().enumerate() {
            let next = preload_names.get(index + 1).unwrap_or(&target_name);
            let source = read_source(path)?;
            env.add_template_owned(name.clone(), source.clone())
                .map_err(parse_error)?;

            let linked = format!(
                "{{% extends \"{}\" %}}{}",
                escape_string_literal(next),
                definitions_only(&source)
            );
            env.add_template_owned(name.clone(), linked)
                .map_err(parse_error)?;
            tracing::debug!(preload = %name, extends = %next, "linked preload");
        }

        let body = read_source(target)?;
        env.add_template_owned(target_name.clone(), body)
            .map_err(parse_error)?;

        let entry = preload_names.first().cloned().unwrap_or(target_name);
        Ok(Self {
            env,
            entry,
            sources,
        })
    }

    /// Executes the unit, streaming the target's output into `out`.
    pub(crate) fn render_to(
        &self,
        ctx: &Value,
        out: &mut dyn io::Write,
        output_label: &str,
    ) -> Result<(), RenderError> {
        let execute_error = |source| RenderError::Execute {
            sources: self.sources.clone(),
            output: output_label.to_string(),
            source,
        };

        let tmpl = self.env.get_template(&self.entry).map_err(execute_error)?;
        tmpl.render_to_write(ctx, out).map_err(execute_error)?;
        Ok(())
    }
}

/// Preloads in parse order, each with its template name. The target itself
/// is skipped and a repeated preload keeps only its last position.
fn preload_chain<'p>(preloads: &'p [impl AsRef<Path>], target: &Path) -> Vec<(&'p Path, String)> {
    let mut chain: Vec<(&Path, String)> = Vec::new();
    for path in preloads.iter().map(AsRef::as_ref) {
        if path == target {
            continue;
        }
        let name = path.display().to_string();
        chain.retain(|(_, existing)| *existing != name);
        chain.push((path, name));
    }
    chain
}

/// The target is addressed by its base name unless a preload already uses
/// that name, in which case its full path keeps the two apart.
fn target_template_name(target: &Path, preload_names: &[String]) -> String {
    let name = base_name(target);
    let full = target.display().to_string();
    if preload_names.contains(&name) && name != full {
        full
    } else {
        name
    }
}

fn read_source(path: &Path) -> Result<String, RenderError> {
    fs::read_to_string(path).map_err(|source| RenderError::ReadTemplate {
        path: path.to_path_buf(),
        source,
    })
}

fn join_sources<'a>(paths: impl Iterator<Item = &'a Path>) -> String {
    paths
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape_string_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn compile(preloads: &[PathBuf], target: &Path) -> Result<CompiledUnit, RenderError> {
        compile_with(preloads, target, MissingKeyPolicy::ZeroValue)
    }

    fn compile_with(
        preloads: &[PathBuf],
        target: &Path,
        policy: MissingKeyPolicy,
    ) -> Result<CompiledUnit, RenderError> {
        CompiledUnit::compile(preloads, target, &Helpers::new(), policy)
    }

    fn render(unit: &CompiledUnit, ctx: &Value) -> Result<String, RenderError> {
        let mut out = Vec::new();
        unit.render_to(ctx, &mut out, "-")?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_target_only() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "a.tpl", "Hello {{ Name }}");

        let unit = compile(&[], &target).unwrap();
        assert_eq!(render(&unit, &context! { Name => "World" }).unwrap(), "Hello World");
    }

    #[test]
    fn test_preload_macro_available_in_target() {
        let dir = TempDir::new().unwrap();
        let lib = write(
            &dir,
            "lib.tpl",
            "ignored top-level text{% macro greet(who) %}Hi {{ who }}{% endmacro %}",
        );
        let target = write(&dir, "page.tpl", "{{ greet(Name) }}");

        let unit = compile(&[lib], &target).unwrap();
        assert_eq!(render(&unit, &context! { Name => "Ada" }).unwrap(), "Hi Ada");
    }

    #[test]
    fn test_later_definitions_win() {
        let dir = TempDir::new().unwrap();
        let p1 = write(
            &dir,
            "p1.tpl",
            "{% macro a() %}p1-a{% endmacro %}{% macro b() %}p1-b{% endmacro %}{% macro c() %}p1-c{% endmacro %}",
        );
        let p2 = write(&dir, "p2.tpl", "{% macro b() %}p2-b{% endmacro %}");
        let target = write(
            &dir,
            "t.tpl",
            "{% macro c() %}t-c{% endmacro %}{{ a() }} {{ b() }} {{ c() }}",
        );

        let unit = compile(&[p1, p2], &target).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "p1-a p2-b t-c");
    }

    #[test]
    fn test_target_override_reaches_preload_callers() {
        let dir = TempDir::new().unwrap();
        let layout = write(
            &dir,
            "layout.tpl",
            "{% macro body() %}default{% endmacro %}{% macro layout() %}<{{ body() }}>{% endmacro %}",
        );
        let target = write(
            &dir,
            "page.tpl",
            "{% macro body() %}custom{% endmacro %}{{ layout() }}",
        );

        let unit = compile(&[layout], &target).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "<custom>");
    }

    #[test]
    fn test_preload_text_is_not_evaluated() {
        let dir = TempDir::new().unwrap();
        let lib = write(
            &dir,
            "lib.tpl",
            "notes: {{ Undocumented }}{% macro greet() %}hi{% endmacro %}",
        );
        let target = write(&dir, "page.tpl", "{{ greet() }}");

        let unit = compile_with(&[lib], &target, MissingKeyPolicy::Error).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "hi");
    }

    #[test]
    fn test_preload_set_is_shared() {
        let dir = TempDir::new().unwrap();
        let lib = write(
            &dir,
            "lib.tpl",
            "header\n{% set greeting = \"hello\" %}\n{% set shout | upper %}{{ greeting }}{% endset %}",
        );
        let target = write(&dir, "page.tpl", "{{ greeting }} {{ shout }}");

        let unit = compile(&[lib], &target).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "hello HELLO");
    }

    #[test]
    fn test_keeps_trailing_newline_and_no_escaping() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "page.html", "<b>{{ v }}</b>\n");

        let unit = compile(&[], &target).unwrap();
        assert_eq!(
            render(&unit, &context! { v => "a & b" }).unwrap(),
            "<b>a & b</b>\n"
        );
    }

    #[test]
    fn test_syntax_error_lists_sources() {
        let dir = TempDir::new().unwrap();
        let lib = write(&dir, "lib.tpl", "{% macro x() %}x{% endmacro %}");
        let target = write(&dir, "broken.tpl", "{{ unclosed");

        let err = compile(&[lib], &target).err().unwrap();
        assert!(matches!(err, RenderError::Parse { .. }));
        let msg = err.to_string();
        assert!(msg.contains("lib.tpl"));
        assert!(msg.contains("broken.tpl"));
    }

    #[test]
    fn test_syntax_error_in_dropped_preload_text_is_reported() {
        let dir = TempDir::new().unwrap();
        let lib = write(&dir, "lib.tpl", "{{ 1 + }}{% macro x() %}x{% endmacro %}");
        let target = write(&dir, "page.tpl", "{{ x() }}");

        let err = compile(&[lib], &target).err().unwrap();
        assert!(matches!(err, RenderError::Parse { .. }));
    }

    #[test]
    fn test_missing_preload_is_reported() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "a.tpl", "x");

        let err = compile(&[dir.path().join("nope.tpl")], &target)
            .err()
            .unwrap();
        assert!(matches!(err, RenderError::ReadTemplate { .. }));
    }

    #[test]
    fn test_target_listed_as_preload_is_skipped() {
        let dir = TempDir::new().unwrap();
        let target = write(&dir, "a.tpl", "{% macro m() %}m{% endmacro %}{{ m() }}");

        let unit = compile(&[target.clone()], &target).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "m");
    }

    #[test]
    fn test_repeated_preload_keeps_last_position() {
        let dir = TempDir::new().unwrap();
        let p1 = write(&dir, "p1.tpl", "{% macro v() %}one{% endmacro %}");
        let p2 = write(&dir, "p2.tpl", "{% macro v() %}two{% endmacro %}");
        let target = write(&dir, "t.tpl", "{{ v() }}");

        let unit = compile(&[p1.clone(), p2, p1], &target).unwrap();
        assert_eq!(render(&unit, &context! {}).unwrap(), "one");
    }

    #[test]
    fn test_preload_chain_order() {
        let preloads = [
            PathBuf::from("a.tpl"),
            PathBuf::from("b.tpl"),
            PathBuf::from("t.tpl"),
            PathBuf::from("a.tpl"),
        ];
        let names: Vec<_> = preload_chain(&preloads, Path::new("t.tpl"))
            .into_iter()
            .map(|(_, name)| name)
            .collect();
        assert_eq!(names, vec!["b.tpl", "a.tpl"]);
    }

    #[test]
    fn test_target_name_avoids_preload_collision() {
        let preloads = vec!["a.tpl".to_string()];
        assert_eq!(
            target_template_name(Path::new("sub/a.tpl"), &preloads),
            "sub/a.tpl"
        );
        assert_eq!(target_template_name(Path::new("sub/b.tpl"), &preloads), "b.tpl");
    }

    #[test]
    fn test_escape_string_literal() {
        assert_eq!(escape_string_literal(r#"a"b\c"#), r#"a\"b\\c"#);
    }
}
