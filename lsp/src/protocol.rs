//! Typed payloads for the LSP methods this client speaks.
//!
//! Outgoing params serialize to exactly the shapes the server expects.
//! Incoming results deserialize permissively: unknown fields are ignored and
//! every optional path defaults to empty.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::semantic::Legend;

pub const INITIALIZE: &str = "initialize";
pub const INITIALIZED: &str = "initialized";
pub const DID_OPEN: &str = "textDocument/didOpen";
pub const SEMANTIC_TOKENS_FULL: &str = "textDocument/semanticTokens/full";

#[derive(Debug, thiserror::Error)]
#[error("cannot convert path to file URI: {}", path.display())]
pub struct PathToUriError {
    path: PathBuf,
}

pub fn path_to_file_uri(path: &Path) -> Result<url::Url, PathToUriError> {
    url::Url::from_file_path(path).map_err(|()| PathToUriError {
        path: path.to_path_buf(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Always serialized, as `null` when absent.
    pub process_id: Option<u32>,
    pub root_uri: String,
    pub capabilities: ClientCapabilities,
    pub workspace_folders: Vec<WorkspaceFolder>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientCapabilities {
    pub text_document: TextDocumentClientCapabilities,
    pub workspace: WorkspaceClientCapabilities,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentClientCapabilities {
    pub semantic_tokens: SemanticTokensClientCapabilities,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensClientCapabilities {
    pub dynamic_registration: bool,
}

/// Serializes as `{}`.
#[derive(Debug, Default, Serialize)]
pub struct WorkspaceClientCapabilities {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkspaceFolder {
    pub uri: String,
    pub name: String,
}

/// Serializes as `{}`.
#[derive(Debug, Default, Serialize)]
pub struct InitializedParams {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DidOpenTextDocumentParams<'a> {
    pub text_document: TextDocumentItem<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentItem<'a> {
    pub uri: &'a str,
    pub language_id: &'a str,
    pub version: i32,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensParams<'a> {
    pub text_document: TextDocumentIdentifier<'a>,
}

#[derive(Debug, Serialize)]
pub struct TextDocumentIdentifier<'a> {
    pub uri: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct InitializeResult {
    #[serde(default)]
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    #[serde(default)]
    pub semantic_tokens_provider: Option<SemanticTokensOptions>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SemanticTokensOptions {
    #[serde(default)]
    pub legend: Option<SemanticTokensLegend>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTokensLegend {
    #[serde(default)]
    pub token_types: Vec<String>,
    #[serde(default)]
    pub token_modifiers: Vec<String>,
}

impl InitializeResult {
    /// The server's semantic token legend, or an empty one when the server
    /// does not advertise semantic tokens.
    #[must_use]
    pub fn into_legend(self) -> Legend {
        let legend = self
            .capabilities
            .semantic_tokens_provider
            .and_then(|provider| provider.legend)
            .unwrap_or_default();
        Legend::new(legend.token_types, legend.token_modifiers)
    }
}

/// `data` may be absent or `null`; both mean no tokens.
#[derive(Debug, Default, Deserialize)]
pub struct SemanticTokens {
    #[serde(default)]
    data: Option<Vec<u32>>,
}

impl SemanticTokens {
    #[must_use]
    pub fn into_data(self) -> Vec<u32> {
        self.data.unwrap_or_default()
    }
}
