//! End-to-end tests for the `stencil` command line, driven through
//! [`stencil::run_with_stdout`] with arguments parsed by clap.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serial_test::serial;
use stencil::{run_with_stdout, Cli};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("stencil").chain(args.iter().copied())).unwrap()
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    let mut out = Vec::new();
    run_with_stdout(&cli(args), &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

fn arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn renders_to_stdout_with_value_files_and_sets() {
    let temp = TempDir::new().unwrap();
    let tpl = write(temp.path(), "greet.txt.tpl", "{{ greeting }}, {{ who.name }}!\n");
    let base = write(temp.path(), "base.yaml", "greeting: Hello\nwho:\n  name: nobody\n");
    let over = write(temp.path(), "over.json", r#"{"who": {"name": "World"}}"#);

    let out = run(&[
        "-f",
        &arg(&base),
        "-f",
        &arg(&over),
        "--set",
        "greeting=Hi",
        &arg(&tpl),
    ])
    .unwrap();
    assert_eq!(out, "Hi, World!\n");
}

#[test]
fn mirrors_a_tree_into_an_output_directory() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "site/index.html.tmpl", "<h1>{{ title }}</h1>\n");
    write(temp.path(), "site/conf/app.yaml.tpl", "port: {{ port }}\n");
    let out_dir = format!("{}/", temp.path().join("out").display());

    let out = run(&[
        "--set",
        "title=Home",
        "--set",
        "port=8080",
        "-o",
        &out_dir,
        &arg(&temp.path().join("site")),
    ])
    .unwrap();

    assert!(out.is_empty());
    let out_root = temp.path().join("out/site");
    assert_eq!(
        fs::read_to_string(out_root.join("index.html")).unwrap(),
        "<h1>Home</h1>\n"
    );
    assert_eq!(
        fs::read_to_string(out_root.join("conf/app.yaml")).unwrap(),
        "port: 8080\n"
    );
}

#[test]
fn preload_flags_share_macros() {
    let temp = TempDir::new().unwrap();
    let lib = write(
        temp.path(),
        "lib.tpl",
        "{% macro label(k, v) %}{{ k }}={{ v }}{% endmacro %}",
    );
    let tpl = write(temp.path(), "env.tpl", "{{ label('MODE', mode) }}");

    let out = run(&["-p", &arg(&lib), "--set", "mode=prod", &arg(&tpl)]).unwrap();
    assert_eq!(out, "MODE=prod");
}

#[test]
fn missing_key_policy_is_selectable() {
    let temp = TempDir::new().unwrap();
    let tpl = write(temp.path(), "a.tpl", "[{{ absent }}]");

    assert_eq!(run(&[&arg(&tpl)]).unwrap(), "[]");

    let err = run(&["--missing-key", "error", &arg(&tpl)]).unwrap_err();
    let rendered = format!("{err:#}");
    assert!(rendered.contains("could not render"));
    assert!(rendered.contains("a.tpl"));
}

#[test]
fn bad_set_is_reported_before_rendering() {
    let temp = TempDir::new().unwrap();
    let tpl = write(temp.path(), "a.txt.tpl", "x");
    let out_dir = format!("{}/", temp.path().join("out").display());

    let err = run(&["--set", "noequals", "-o", &out_dir, &arg(&tpl)]).unwrap_err();
    assert!(format!("{err:#}").contains("noequals"));
    assert!(!temp.path().join("out").exists());
}

#[test]
fn missing_input_fails() {
    let temp = TempDir::new().unwrap();
    let err = run(&[&arg(&temp.path().join("missing.tpl"))]).unwrap_err();
    assert!(format!("{err:#}").contains("missing.tpl"));
}

#[test]
#[serial]
fn env_helper_reads_process_environment() {
    let temp = TempDir::new().unwrap();
    let tpl = write(temp.path(), "a.tpl", r#"{{ env("STENCIL_CLI_TEST_VAR") }}"#);

    std::env::set_var("STENCIL_CLI_TEST_VAR", "from-env");
    let out = run(&[&arg(&tpl)]);
    std::env::remove_var("STENCIL_CLI_TEST_VAR");

    assert_eq!(out.unwrap(), "from-env");
}
