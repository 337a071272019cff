//! End-to-end runs of the `roslyn-probe` binary.

use std::path::Path;
use std::process::{Command, Output};

use crate::common::{
    FakeServer, SAMPLE_DATA, SAMPLE_REPORT, initialize_response, log_message,
    register_capability_request, semantic_tokens_response,
};

fn probe(home: &Path, args: &[&Path]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_roslyn-probe"))
        .args(args)
        .env("HOME", home)
        .env_remove("ROSLYN_LSP_PATH")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn prints_decoded_tokens() {
    let server = FakeServer::new(&[
        initialize_response(),
        log_message(),
        register_capability_request(),
        semantic_tokens_response(&SAMPLE_DATA),
    ]);
    let file = server.source_file("Program.cs", "class Program {}\n");

    let output = probe(&server.home(), &[&file]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), SAMPLE_REPORT);
}

#[test]
fn prints_at_most_configured_token_lines() {
    let server = FakeServer::new(&[
        initialize_response(),
        semantic_tokens_response(&SAMPLE_DATA),
    ]);
    let file = server.source_file("Program.cs", "class Program {}\n");
    let home = server.home();
    let config = home.join(".roslyn-probe").join("config.toml");
    let mut text = std::fs::read_to_string(&config).unwrap();
    text.push_str("\n[output]\nmax_tokens = 1\n");
    std::fs::write(&config, text).unwrap();

    let output = probe(&home, &[&file]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Semantic tokens (3):\n   0:  0 len= 6 type=keyword mods=\n"
    );
}

#[test]
fn empty_data_is_not_an_error() {
    let server = FakeServer::new(&[initialize_response(), semantic_tokens_response(&[])]);
    let file = server.source_file("Empty.cs", "");

    let output = probe(&server.home(), &[&file]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Empty semantic tokens data.\n");
}

#[test]
fn missing_semantic_tokens_response_fails() {
    let server = FakeServer::new(&[initialize_response(), log_message()]);
    let file = server.source_file("Program.cs", "class Program {}\n");

    let output = probe(&server.home(), &[&file]);

    assert!(!output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("No semantic tokens response received."));
}

#[test]
fn missing_initialize_response_fails() {
    let server = FakeServer::new(&[]);
    let file = server.source_file("Program.cs", "class Program {}\n");

    let output = probe(&server.home(), &[&file]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No initialize response."));
}

#[test]
fn no_arguments_prints_usage() {
    let server = FakeServer::new(&[]);

    let output = probe(&server.home(), &[]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Usage: roslyn-probe /path/to/file.cs"));
}

#[test]
fn missing_file_is_reported() {
    let server = FakeServer::new(&[]);
    let missing = server.path().join("src").join("Missing.cs");

    let output = probe(&server.home(), &[&missing]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("File not found: "));
}

#[test]
fn unlocatable_server_is_reported() {
    let server = FakeServer::new(&[]);
    let file = server.source_file("Program.cs", "class Program {}\n");
    // No config and no wrapper cache under this home.
    let home = server.path().join("empty-home");
    std::fs::create_dir_all(&home).unwrap();

    let output = probe(&home, &[&file]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Could not locate Roslyn Language Server"));
}
