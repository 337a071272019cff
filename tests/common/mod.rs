//! Shared test utilities and fixtures
//!
//! A scripted language server: `/bin/sh` replays canned frames on stdout,
//! then swallows stdin until it is killed.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Value, json};
use tempfile::TempDir;

const SERVER_SCRIPT: &str = r#"cat "$(dirname "$0")/frames.bin"
exec cat >/dev/null
"#;

/// Encode one message with a `Content-Length` header.
pub fn frame(value: &Value) -> Vec<u8> {
    let body = serde_json::to_vec(value).unwrap();
    let mut out = format!("Content-Length: {}\r\n\r\n", body.len()).into_bytes();
    out.extend_from_slice(&body);
    out
}

pub fn initialize_response() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": {
            "capabilities": {
                "semanticTokensProvider": {
                    "legend": {
                        "tokenTypes": ["keyword", "class", "variable"],
                        "tokenModifiers": ["static", "readonly"]
                    },
                    "full": true
                }
            }
        }
    })
}

pub fn log_message() -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "window/logMessage",
        "params": { "type": 3, "message": "Loading projects" }
    })
}

pub fn register_capability_request() -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": "reg-1",
        "method": "client/registerCapability",
        "params": { "registrations": [] }
    })
}

pub fn semantic_tokens_response(data: &[u32]) -> Value {
    json!({ "jsonrpc": "2.0", "id": 2, "result": { "data": data } })
}

/// Three tokens: `keyword`, `class`, and `variable` with both modifiers.
pub const SAMPLE_DATA: [u32; 15] = [0, 0, 6, 0, 0, 0, 7, 5, 1, 0, 2, 4, 1, 2, 3];

pub const SAMPLE_REPORT: &str = "Semantic tokens (3):
   0:  0 len= 6 type=keyword mods=
   0:  7 len= 5 type=class mods=
   2:  4 len= 1 type=variable mods=static,readonly
";

pub struct FakeServer {
    dir: TempDir,
}

impl FakeServer {
    /// Write a server that replays `messages` in order, then closes stdout.
    pub fn new(messages: &[Value]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<u8> = messages.iter().flat_map(frame).collect();
        fs::write(dir.path().join("frames.bin"), frames).unwrap();
        fs::write(dir.path().join("server.sh"), SERVER_SCRIPT).unwrap();
        Self { dir }
    }

    /// Script to pass as the argument to `/bin/sh`.
    pub fn script(&self) -> PathBuf {
        self.dir.path().join("server.sh")
    }

    /// A home directory whose config points the probe at this server.
    pub fn home(&self) -> PathBuf {
        let home = self.dir.path().join("home");
        let config_dir = home.join(".roslyn-probe");
        fs::create_dir_all(&config_dir).unwrap();
        let script = self.script().display().to_string();
        fs::write(
            config_dir.join("config.toml"),
            format!("[server]\npath = \"/bin/sh\"\nargs = [{script:?}]\n"),
        )
        .unwrap();
        home
    }

    /// Write a source file inside a `src/` project directory.
    pub fn source_file(&self, name: &str, text: &str) -> PathBuf {
        let project = self.dir.path().join("src");
        fs::create_dir_all(&project).unwrap();
        let path = project.join(name);
        fs::write(&path, text).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
