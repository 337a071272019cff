//! JSON-RPC 2.0 envelopes.
//!
//! Outgoing messages are built from [`Request`] and [`Notification`].
//! Incoming frames are classified into a [`Message`] by shape, the way
//! JSON-RPC defines them: `id` + `method` is a request, `method` alone is a
//! notification, `id` + `result`/`error` is a response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct Request<'a, P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: &'a P,
}

impl<'a, P: Serialize> Request<'a, P> {
    pub fn new(id: u64, method: &'a str, params: &'a P) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification<'a, P> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: &'a P,
}

impl<'a, P: Serialize> Notification<'a, P> {
    pub fn new(method: &'a str, params: &'a P) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

/// A JSON-RPC id. Ids we allocate are always numbers; servers may use strings
/// for their own requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Number(i64),
    String(String),
}

impl RequestId {
    /// Whether this id is the numeric id `id` that we allocated.
    #[must_use]
    pub fn matches(&self, id: u64) -> bool {
        match self {
            Self::Number(n) => u64::try_from(*n).is_ok_and(|n| n == id),
            Self::String(_) => false,
        }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s:?}"),
        }
    }
}

/// The `error` member of a failed response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// A request initiated by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRequest {
    pub id: RequestId,
    pub method: String,
    pub params: Option<Value>,
}

/// A one-way message from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerNotification {
    pub method: String,
    pub params: Option<Value>,
}

/// A response to one of our requests.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub id: RequestId,
    pub result: Option<Value>,
    pub error: Option<ResponseError>,
}

impl Response {
    /// Split into the result payload or the server's error.
    ///
    /// A response without either member, or with `"result": null`, yields
    /// `Value::Null`.
    pub fn into_result(self) -> Result<Value, ResponseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// An incoming JSON-RPC message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(ServerRequest),
    Notification(ServerNotification),
    Response(Response),
}

impl Message {
    /// Classify a decoded frame.
    ///
    /// Returns `None` for values that are not JSON-RPC messages at all
    /// (arrays, scalars, objects with neither `method` nor `result`/`error`).
    #[must_use]
    pub fn from_value(frame: Value) -> Option<Self> {
        let Value::Object(mut map) = frame else {
            return None;
        };

        let id = map
            .remove("id")
            .filter(|id| !id.is_null())
            .and_then(|id| serde_json::from_value::<RequestId>(id).ok());
        let method = match map.remove("method") {
            Some(Value::String(method)) => Some(method),
            _ => None,
        };
        let params = map.remove("params");
        let has_result_or_error = map.contains_key("result") || map.contains_key("error");

        match (id, method, has_result_or_error) {
            (Some(id), Some(method), _) => Some(Self::Request(ServerRequest { id, method, params })),
            (None, Some(method), _) => Some(Self::Notification(ServerNotification { method, params })),
            (Some(id), None, true) => {
                let error = map
                    .remove("error")
                    .filter(|e| !e.is_null())
                    .map(|e| {
                        serde_json::from_value(e.clone()).unwrap_or_else(|_| ResponseError {
                            code: 0,
                            message: e.to_string(),
                            data: None,
                        })
                    });
                Some(Self::Response(Response {
                    id,
                    result: map.remove("result"),
                    error,
                }))
            }
            _ => None,
        }
    }

    /// The message id, if it carries one.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(req) => Some(&req.id),
            Self::Response(resp) => Some(&resp.id),
            Self::Notification(_) => None,
        }
    }

    /// The method name, for requests and notifications.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(req) => Some(&req.method),
            Self::Notification(notif) => Some(&notif.method),
            Self::Response(_) => None,
        }
    }
}
