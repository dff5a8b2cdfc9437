//! Contract between the search session and the backend search API.
//!
//! Every backend call answers with an envelope `{success, message}`. A
//! successful envelope carries the payload in `message`; a failed one carries
//! a human-readable reason there (some endpoints use `error` instead).

use crate::document::SearchResult;
use crate::query::SearchQuery;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Shown when the backend cannot be reached or answers with garbage
pub const SERVER_UNAVAILABLE_MSG: &str =
    "Error while communicating with the server, please try again later";

/// Shown when the backend rejects a call without saying why
pub const UNKNOWN_ERROR_MSG: &str = "Unknown error occurred, please try again later";

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network failure, non-2xx status without an envelope, or undecodable body
    #[error("transport failure: {0}")]
    Transport(String),

    /// The backend answered `success: false`
    #[error("request rejected: {}", .0.as_deref().unwrap_or("no reason given"))]
    Rejected(Option<String>),
}

impl GatewayError {
    /// Message suitable for the notification channel
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Transport(_) => SERVER_UNAVAILABLE_MSG.to_string(),
            GatewayError::Rejected(Some(reason)) => reason.clone(),
            GatewayError::Rejected(None) => UNKNOWN_ERROR_MSG.to_string(),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Backend operations the search session depends on
#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// `POST /indices/{index}/search`
    async fn search(&self, index: &str, query: &SearchQuery) -> Result<SearchResult, GatewayError>;

    /// `DELETE /indices/{index}/documents/{id}`
    async fn delete_document(&self, index: &str, id: &str) -> Result<(), GatewayError>;
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    success: bool,
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Decoded response envelope
#[derive(Debug)]
pub struct Envelope {
    raw: RawEnvelope,
}

impl Envelope {
    /// Parse a response body; fails only if the body is not an envelope at all
    pub fn parse(body: &str) -> Result<Self, GatewayError> {
        serde_json::from_str::<RawEnvelope>(body)
            .map(|raw| Self { raw })
            .map_err(|e| GatewayError::Transport(format!("malformed envelope: {}", e)))
    }

    pub fn is_success(&self) -> bool {
        self.raw.success
    }

    /// Extract a typed payload from a successful envelope
    pub fn into_payload<T: DeserializeOwned>(self) -> Result<T, GatewayError> {
        let raw = self.check()?;
        let message = raw.message.unwrap_or(Value::Null);
        serde_json::from_value(message)
            .map_err(|e| GatewayError::Transport(format!("unexpected payload: {}", e)))
    }

    /// Extract the optional textual message of a successful envelope
    pub fn into_message(self) -> Result<Option<String>, GatewayError> {
        let raw = self.check()?;
        Ok(match raw.message {
            Some(Value::String(text)) => Some(text),
            _ => None,
        })
    }

    fn check(self) -> Result<RawEnvelope, GatewayError> {
        if self.raw.success {
            return Ok(self.raw);
        }

        let reason = match self.raw.message {
            Some(Value::String(text)) if !text.is_empty() => Some(text),
            _ => self.raw.error.filter(|text| !text.is_empty()),
        };
        Err(GatewayError::Rejected(reason))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-process gateways for driving sessions from tests.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::{mpsc, oneshot};

    /// A request the session issued, waiting for the test to answer it
    pub enum Call {
        Search {
            index: String,
            query: SearchQuery,
            reply: oneshot::Sender<Result<SearchResult, GatewayError>>,
        },
        Delete {
            index: String,
            id: String,
            reply: oneshot::Sender<Result<(), GatewayError>>,
        },
    }

    /// Hands every call to the test, which decides when and how it completes
    pub struct ScriptedGateway {
        calls: mpsc::UnboundedSender<Call>,
    }

    impl ScriptedGateway {
        pub fn new() -> (Self, mpsc::UnboundedReceiver<Call>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Self { calls: tx }, rx)
        }
    }

    #[async_trait]
    impl SearchGateway for ScriptedGateway {
        async fn search(
            &self,
            index: &str,
            query: &SearchQuery,
        ) -> Result<SearchResult, GatewayError> {
            let (reply, rx) = oneshot::channel();
            let call = Call::Search {
                index: index.to_string(),
                query: query.clone(),
                reply,
            };
            self.calls
                .send(call)
                .map_err(|_| GatewayError::Transport("script closed".into()))?;
            rx.await
                .map_err(|_| GatewayError::Transport("reply dropped".into()))?
        }

        async fn delete_document(&self, index: &str, id: &str) -> Result<(), GatewayError> {
            let (reply, rx) = oneshot::channel();
            let call = Call::Delete {
                index: index.to_string(),
                id: id.to_string(),
                reply,
            };
            self.calls
                .send(call)
                .map_err(|_| GatewayError::Transport("script closed".into()))?;
            rx.await
                .map_err(|_| GatewayError::Transport("reply dropped".into()))?
        }
    }

    /// Answers immediately from queued responses and counts requests
    #[derive(Default)]
    pub struct CannedGateway {
        searches: Mutex<VecDeque<Result<SearchResult, GatewayError>>>,
        deletes: Mutex<VecDeque<Result<(), GatewayError>>>,
        requests: Mutex<usize>,
    }

    impl CannedGateway {
        pub fn with_search(self, response: Result<SearchResult, GatewayError>) -> Self {
            self.searches.lock().unwrap().push_back(response);
            self
        }

        pub fn with_delete(self, response: Result<(), GatewayError>) -> Self {
            self.deletes.lock().unwrap().push_back(response);
            self
        }

        pub fn requests(&self) -> usize {
            *self.requests.lock().unwrap()
        }
    }

    #[async_trait]
    impl SearchGateway for CannedGateway {
        async fn search(&self, _: &str, _: &SearchQuery) -> Result<SearchResult, GatewayError> {
            *self.requests.lock().unwrap() += 1;
            self.searches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("no canned search".into())))
        }

        async fn delete_document(&self, _: &str, _: &str) -> Result<(), GatewayError> {
            *self.requests.lock().unwrap() += 1;
            self.deletes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GatewayError::Transport("no canned delete".into())))
        }
    }
}
