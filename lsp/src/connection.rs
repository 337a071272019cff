//! Connection to a language server. Owns the child process and drives the
//! JSON-RPC exchange over its stdin/stdout.
//!
//! The exchange is a single-consumer pump: callers send one request, then
//! call [`Transport::await_response`], which reads frames in order and drops
//! everything that is not the awaited response. There is no dispatcher task
//! and no pending-request table; only one request is ever in flight.

use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::codec::{FrameError, FrameReader, FrameWriter};
use crate::message::{Message, Notification, Request, Response};
use crate::types::ServerCommand;

const TERMINATE_TIMEOUT_SECS: u64 = 2;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start language server `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("language server has no {0} pipe")]
    MissingPipe(&'static str),
    #[error(transparent)]
    Frame(#[from] FrameError),
    #[error("no `{method}` response (request id {id}) before the server closed its output")]
    NoResponse { id: u64, method: String },
}

/// Framing and request/response correlation over a duplex byte stream.
///
/// Owns the id counter: ids start at 1 and increase by one per request for
/// the lifetime of the transport.
pub struct Transport<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    next_id: u64,
    /// Id and method of the most recent request, for diagnostics.
    in_flight: Option<(u64, String)>,
}

impl<R, W> Transport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
            next_id: 1,
            in_flight: None,
        }
    }

    /// Frame and write a request. Returns its id without waiting for a reply.
    pub async fn send_request<P: Serialize>(
        &mut self,
        method: &str,
        params: &P,
    ) -> Result<u64, TransportError> {
        // The id is consumed even if the write fails, so ids are never reused.
        let id = self.next_id;
        self.next_id += 1;

        tracing::debug!(id, method, "Sending request");
        self.writer
            .write_frame(&Request::new(id, method, params))
            .await?;
        self.in_flight = Some((id, method.to_string()));
        Ok(id)
    }

    /// Frame and write a notification.
    pub async fn send_notification<P: Serialize>(
        &mut self,
        method: &str,
        params: &P,
    ) -> Result<(), TransportError> {
        tracing::debug!(method, "Sending notification");
        self.writer
            .write_frame(&Notification::new(method, params))
            .await?;
        Ok(())
    }

    /// Read the next message. `Ok(None)` means the server closed its output
    /// cleanly between frames.
    ///
    /// Frames that are valid JSON but not JSON-RPC messages are skipped.
    pub async fn receive_one(&mut self) -> Result<Option<Message>, TransportError> {
        loop {
            let Some(frame) = self.reader.read_frame().await? else {
                return Ok(None);
            };
            match Message::from_value(frame) {
                Some(message) => return Ok(Some(message)),
                None => tracing::trace!("Ignoring frame that is not a JSON-RPC message"),
            }
        }
    }

    /// Pump messages until the response for `id` arrives.
    ///
    /// Notifications, server requests and responses to other ids are dropped.
    pub async fn await_response(&mut self, id: u64) -> Result<Response, TransportError> {
        while let Some(message) = self.receive_one().await? {
            match message {
                Message::Response(response) if response.id.matches(id) => {
                    if self.in_flight.as_ref().is_some_and(|(pending, _)| *pending == id) {
                        self.in_flight = None;
                    }
                    return Ok(response);
                }
                Message::Response(response) => {
                    tracing::trace!(id = %response.id, "Discarding response to another request");
                }
                Message::Request(request) => {
                    tracing::trace!(
                        id = %request.id,
                        method = %request.method,
                        "Discarding server request"
                    );
                }
                Message::Notification(notification) => {
                    tracing::trace!(method = %notification.method, "Discarding notification");
                }
            }
        }

        let method = match &self.in_flight {
            Some((pending, method)) if *pending == id => method.clone(),
            _ => String::from("unknown"),
        };
        Err(TransportError::NoResponse { id, method })
    }
}

/// A running language server and the transport bound to its stdio.
///
/// The child is spawned with `kill_on_drop`, so dropping a `Connection` on an
/// error path still releases the process. [`Connection::terminate`] does the
/// same explicitly and waits for the exit.
pub struct Connection {
    child: Child,
    transport: Transport<ChildStdout, ChildStdin>,
    stderr_task: Option<JoinHandle<()>>,
    terminated: bool,
}

impl Connection {
    /// Spawn `command` with piped stdin, stdout and stderr.
    ///
    /// Must be called from within a Tokio runtime: stderr is drained into the
    /// log by a background task so the server never blocks on a full pipe.
    pub fn spawn(command: &ServerCommand) -> Result<Self, TransportError> {
        let mut cmd = Command::new(command.program());
        cmd.args(command.arguments())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| TransportError::Spawn {
            program: command.program().display().to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or(TransportError::MissingPipe("stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or(TransportError::MissingPipe("stdout"))?;
        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(forward_stderr(stderr)));

        tracing::info!(pid = child.id(), command = %command, "Language server started");

        Ok(Self {
            child,
            transport: Transport::new(stdout, stdin),
            stderr_task,
            terminated: false,
        })
    }

    pub fn transport(&mut self) -> &mut Transport<ChildStdout, ChildStdin> {
        &mut self.transport
    }

    /// OS process id, while the server is running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Kill the server and reap it. Idempotent; never fails.
    pub async fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Language server already exited: {e}");
        }

        match tokio::time::timeout(
            Duration::from_secs(TERMINATE_TIMEOUT_SECS),
            self.child.wait(),
        )
        .await
        {
            Ok(Ok(status)) => tracing::debug!(%status, "Language server exited"),
            Ok(Err(e)) => tracing::debug!("Failed to reap language server: {e}"),
            Err(_) => {
                tracing::warn!("Language server did not exit within {TERMINATE_TIMEOUT_SECS}s");
            }
        }

        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => tracing::debug!(target: "probe_lsp::server_stderr", "{line}"),
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("Stopped reading language server stderr: {e}");
                break;
            }
        }
    }
}
