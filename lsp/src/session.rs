//! The semantic-tokens probe pipeline.
//!
//! ```text
//! initialize ─▶ initialized ─▶ textDocument/didOpen ─▶ semanticTokens/full ─▶ decode
//! ```
//!
//! Every step runs on the caller's transport, one request at a time.

use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::connection::{Transport, TransportError};
use crate::protocol::{
    self, ClientCapabilities, DidOpenTextDocumentParams, InitializeParams, InitializeResult,
    InitializedParams, PathToUriError, SemanticTokens, SemanticTokensParams,
    TextDocumentIdentifier, TextDocumentItem, WorkspaceFolder,
};
use crate::semantic::{self, DecodeError, Legend, ResolvedToken};

/// Version sent with `didOpen`; the document is never changed afterwards.
const DOCUMENT_VERSION: i32 = 1;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("`{method}` failed with error {code}: {message}")]
    Server {
        method: &'static str,
        code: i64,
        message: String,
    },
    #[error("unexpected `{method}` result")]
    InvalidResult {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// The file being probed, with the URIs the server needs to see.
#[derive(Debug, Clone)]
pub struct TargetDocument {
    uri: String,
    root_uri: String,
    root_name: String,
    language_id: String,
    text: String,
}

impl TargetDocument {
    /// Describe `path` (absolute) with the given language id and contents.
    ///
    /// The workspace root is the file's parent directory.
    pub fn new(
        path: &Path,
        language_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self, PathToUriError> {
        let root = path.parent().unwrap_or(path);
        let uri = protocol::path_to_file_uri(path)?;
        let root_uri = protocol::path_to_file_uri(root)?;

        Ok(Self {
            uri: uri.into(),
            root_uri: root_uri.into(),
            root_name: root
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            language_id: language_id.into(),
            text: text.into(),
        })
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    #[must_use]
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    fn initialize_params(&self) -> InitializeParams {
        InitializeParams {
            process_id: None,
            root_uri: self.root_uri.clone(),
            capabilities: ClientCapabilities::default(),
            workspace_folders: vec![WorkspaceFolder {
                uri: self.root_uri.clone(),
                name: self.root_name.clone(),
            }],
        }
    }
}

/// Decoded tokens together with the legend they were decoded against.
#[derive(Debug, Clone)]
pub struct SemanticTokensReport {
    legend: Legend,
    tokens: Vec<ResolvedToken>,
}

impl SemanticTokensReport {
    #[must_use]
    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    #[must_use]
    pub fn tokens(&self) -> &[ResolvedToken] {
        &self.tokens
    }

    /// The server returned no token data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Send a request and wait for its result, parsed as `T`.
///
/// A `null` or missing result parses as `T::default()`.
async fn call<R, W, P, T>(
    transport: &mut Transport<R, W>,
    method: &'static str,
    params: &P,
) -> Result<T, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    P: Serialize,
    T: DeserializeOwned + Default,
{
    let id = transport.send_request(method, params).await?;
    let response = transport.await_response(id).await?;
    let result = response
        .into_result()
        .map_err(|error| SessionError::Server {
            method,
            code: error.code,
            message: error.message,
        })?;

    let parsed: Option<T> = serde_json::from_value(result)
        .map_err(|source| SessionError::InvalidResult { method, source })?;
    Ok(parsed.unwrap_or_default())
}

/// Run the `initialize` handshake and return the server's token legend.
///
/// Sends `initialized` once the response arrives. A server that does not
/// advertise semantic tokens yields an empty legend.
pub async fn initialize<R, W>(
    transport: &mut Transport<R, W>,
    document: &TargetDocument,
) -> Result<Legend, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let result: InitializeResult = call(
        transport,
        protocol::INITIALIZE,
        &document.initialize_params(),
    )
    .await?;

    transport
        .send_notification(protocol::INITIALIZED, &InitializedParams::default())
        .await?;

    let legend = result.into_legend();
    tracing::debug!(
        token_types = legend.token_types().len(),
        token_modifiers = legend.token_modifiers().len(),
        "Server initialized"
    );
    Ok(legend)
}

pub async fn open_document<R, W>(
    transport: &mut Transport<R, W>,
    document: &TargetDocument,
) -> Result<(), SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let params = DidOpenTextDocumentParams {
        text_document: TextDocumentItem {
            uri: &document.uri,
            language_id: &document.language_id,
            version: DOCUMENT_VERSION,
            text: &document.text,
        },
    };
    transport
        .send_notification(protocol::DID_OPEN, &params)
        .await?;
    Ok(())
}

/// Request full-document semantic tokens. Returns the raw delta-encoded data.
pub async fn request_semantic_tokens<R, W>(
    transport: &mut Transport<R, W>,
    document: &TargetDocument,
) -> Result<Vec<u32>, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let params = SemanticTokensParams {
        text_document: TextDocumentIdentifier { uri: &document.uri },
    };
    let tokens: SemanticTokens = call(transport, protocol::SEMANTIC_TOKENS_FULL, &params).await?;
    let data = tokens.into_data();
    tracing::debug!(integers = data.len(), "Received semantic tokens");
    Ok(data)
}

/// Run the whole pipeline against a fresh server.
pub async fn probe_semantic_tokens<R, W>(
    transport: &mut Transport<R, W>,
    document: &TargetDocument,
) -> Result<SemanticTokensReport, SessionError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let legend = initialize(transport, document).await?;
    open_document(transport, document).await?;
    let data = request_semantic_tokens(transport, document).await?;
    let tokens = semantic::decode(&data, &legend)?;
    Ok(SemanticTokensReport { legend, tokens })
}
