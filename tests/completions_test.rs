#![cfg(feature = "cli")]
//! Integration tests for `dbfsql completions`.

use clap::CommandFactory;
use dbf::cli::app::Cli;

fn generate_completions(shell: clap_complete::Shell) -> String {
    let mut cmd = Cli::command();
    let mut buf = Vec::new();
    clap_complete::generate(shell, &mut cmd, "dbfsql", &mut buf);
    String::from_utf8(buf).expect("completions should be valid UTF-8")
}

#[test]
fn bash_completions_contain_subcommands() {
    let output = generate_completions(clap_complete::Shell::Bash);
    assert!(!output.is_empty());
    assert!(output.contains("dbfsql"));
    assert!(output.contains("convert"));
    assert!(output.contains("schema"));
    assert!(output.contains("completions"));
}

#[test]
fn zsh_completions_are_valid() {
    let output = generate_completions(clap_complete::Shell::Zsh);
    assert!(!output.is_empty());
    assert!(output.contains("dbfsql"));
}

#[test]
fn fish_completions_are_valid() {
    let output = generate_completions(clap_complete::Shell::Fish);
    assert!(!output.is_empty());
    assert!(output.contains("dbfsql"));
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}
