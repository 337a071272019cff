//! Minimal LSP client for fetching and decoding semantic tokens.
//!
//! [`Connection`] spawns a language server and exposes a [`Transport`] that
//! frames JSON-RPC over its stdio. [`session`] runs the
//! `initialize` / `didOpen` / `semanticTokens/full` exchange on that
//! transport, and [`semantic::decode`] turns the delta-encoded response into
//! [`ResolvedToken`]s.

pub mod codec;
pub mod message;
pub mod protocol;
pub mod semantic;
pub mod session;
pub mod types;

mod connection;

pub use connection::{Connection, Transport, TransportError};
pub use message::{Message, RequestId, Response, ResponseError};
pub use protocol::PathToUriError;
pub use semantic::{DecodeError, Legend, ResolvedToken};
pub use session::{SemanticTokensReport, SessionError, TargetDocument};
pub use types::ServerCommand;
