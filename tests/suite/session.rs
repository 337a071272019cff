//! Probe pipeline against a spawned server process.

use probe_lsp::{Connection, ServerCommand, SessionError, TargetDocument, TransportError, session};

use crate::common::{
    FakeServer, SAMPLE_DATA, initialize_response, log_message, register_capability_request,
    semantic_tokens_response,
};

fn command(server: &FakeServer) -> ServerCommand {
    ServerCommand::new("/bin/sh").arg(server.script())
}

fn document(server: &FakeServer) -> TargetDocument {
    let path = server.source_file("Program.cs", "class Program { static readonly int x; }\n");
    TargetDocument::new(&path, "csharp", "class Program { static readonly int x; }\n").unwrap()
}

#[tokio::test]
async fn probe_decodes_tokens_from_spawned_server() {
    let server = FakeServer::new(&[
        initialize_response(),
        log_message(),
        register_capability_request(),
        semantic_tokens_response(&SAMPLE_DATA),
    ]);
    let document = document(&server);

    let mut connection = Connection::spawn(&command(&server)).unwrap();
    assert!(connection.pid().is_some());

    let report = session::probe_semantic_tokens(connection.transport(), &document)
        .await
        .unwrap();
    connection.terminate().await;

    assert_eq!(report.legend().token_types(), ["keyword", "class", "variable"]);
    let tokens = report.tokens();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[2].line(), 2);
    assert_eq!(tokens[2].start_column(), 4);
    assert_eq!(tokens[2].token_type(), "variable");
    assert_eq!(tokens[2].modifiers(), ["static", "readonly"]);
}

#[tokio::test]
async fn missing_semantic_tokens_response_is_reported() {
    let server = FakeServer::new(&[initialize_response(), log_message()]);
    let document = document(&server);

    let mut connection = Connection::spawn(&command(&server)).unwrap();
    let err = session::probe_semantic_tokens(connection.transport(), &document)
        .await
        .unwrap_err();
    connection.terminate().await;

    match err {
        SessionError::Transport(TransportError::NoResponse { id, method }) => {
            assert_eq!(id, 2);
            assert_eq!(method, "textDocument/semanticTokens/full");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn silent_server_has_no_initialize_response() {
    let server = FakeServer::new(&[]);
    let document = document(&server);

    let mut connection = Connection::spawn(&command(&server)).unwrap();
    let err = session::initialize(connection.transport(), &document)
        .await
        .unwrap_err();
    connection.terminate().await;

    assert!(matches!(
        err,
        SessionError::Transport(TransportError::NoResponse { id: 1, .. })
    ));
}

#[tokio::test]
async fn empty_token_data_yields_empty_report() {
    let server = FakeServer::new(&[initialize_response(), semantic_tokens_response(&[])]);
    let document = document(&server);

    let mut connection = Connection::spawn(&command(&server)).unwrap();
    let report = session::probe_semantic_tokens(connection.transport(), &document)
        .await
        .unwrap();
    connection.terminate().await;

    assert!(report.is_empty());
}
