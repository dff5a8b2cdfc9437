//! Search session store.
//!
//! A [`SearchSession`] owns the state of one open search view for one index:
//! the current query, the result set, loading flags and one-shot feedback
//! flags. All mutation goes through [`reduce`], one [`SessionAction`] per
//! transition, so the invariants can be checked in one place.
//!
//! Searches and deletes may overlap. Their results are applied in completion
//! order. Each operation captures a ticket when it is dispatched; when the
//! response arrives the ticket is compared with the session:
//!
//! * a different `epoch` means the session was cleared (view left), and the
//!   response is dropped without touching anything;
//! * a different `generation` or index means the result set it belongs to
//!   was thrown away, so its documents are not applied, but loading flags
//!   (and for deletes, the success flag) still settle.

use crate::document::{documents_to_pretty_json, Document, SearchResult};
use crate::gateway::SearchGateway;
use crate::query::SearchQuery;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub const INDEX_UNAVAILABLE_MSG: &str = "Error could not delete document, index is not available";
pub const SEARCH_UNAVAILABLE_MSG: &str = "Search is not possible, index or query is not set";

/// Client-held state of one search view
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub index: Option<String>,
    pub query: Option<SearchQuery>,
    pub documents: Option<Vec<Document>>,
    pub stopwords: Option<Vec<String>>,
    pub total_documents: usize,
    pub loading: bool,
    pub delete_loading: bool,
    pub err: Option<String>,
    pub delete_success: Option<bool>,
    /// Identifies the applied search response; zero until the first one
    pub result_seq: u64,
}

/// Transitions of [`SessionState`]
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SetIndex(String),
    SetQuery(SearchQuery),
    Clear,
    ClearSearchResult,
    SearchStarted,
    SearchLoaded {
        result: SearchResult,
        seq: u64,
        still_loading: bool,
    },
    SearchFailed { message: String, still_loading: bool },
    /// A search settled but its result set is no longer the current one
    SearchDropped { still_loading: bool },
    DeleteStarted,
    DeleteSucceeded { id: String, reconcile: bool, still_loading: bool },
    DeleteFailed { message: String, still_loading: bool },
    ConsumeErr,
    ConsumeDeleteSuccess,
}

/// Apply one transition, producing the next state
pub fn reduce(state: SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::SetIndex(index) => SessionState {
            index: Some(index),
            ..state
        },
        SessionAction::SetQuery(query) => SessionState {
            query: Some(query),
            ..state
        },
        SessionAction::Clear => SessionState::default(),
        SessionAction::ClearSearchResult => SessionState {
            query: None,
            documents: None,
            stopwords: None,
            total_documents: 0,
            ..state
        },
        SessionAction::SearchStarted => SessionState {
            loading: true,
            ..state
        },
        // Replaces the result fields wholesale, never merges
        SessionAction::SearchLoaded {
            result,
            seq,
            still_loading,
        } => SessionState {
            total_documents: result.documents.len(),
            documents: Some(result.documents),
            stopwords: result.stopwords,
            loading: still_loading,
            result_seq: seq,
            ..state
        },
        SessionAction::SearchFailed {
            message,
            still_loading,
        } => SessionState {
            err: Some(message),
            loading: still_loading,
            ..state
        },
        SessionAction::SearchDropped { still_loading } => SessionState {
            loading: still_loading,
            ..state
        },
        SessionAction::DeleteStarted => SessionState {
            delete_loading: true,
            ..state
        },
        SessionAction::DeleteSucceeded {
            id,
            reconcile,
            still_loading,
        } => {
            let (documents, total_documents) = if reconcile {
                // The backend is authoritative: count the deletion even if
                // the document is not in the local page.
                let documents = state
                    .documents
                    .map(|docs| docs.into_iter().filter(|doc| doc.id != id).collect::<Vec<_>>());
                (documents, state.total_documents.saturating_sub(1))
            } else {
                (state.documents, state.total_documents)
            };

            SessionState {
                documents,
                total_documents,
                delete_loading: still_loading,
                delete_success: Some(true),
                ..state
            }
        }
        SessionAction::DeleteFailed {
            message,
            still_loading,
        } => SessionState {
            err: Some(message),
            delete_success: Some(false),
            delete_loading: still_loading,
            ..state
        },
        SessionAction::ConsumeErr => SessionState { err: None, ..state },
        SessionAction::ConsumeDeleteSuccess => SessionState {
            delete_success: None,
            ..state
        },
    }
}

/// How an asynchronous session operation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The response was applied to the session
    Applied,
    /// The operation failed; the reason is in `err`
    Failed,
    /// The session moved on before the response arrived
    Discarded,
}

#[derive(Debug, Clone)]
struct Ticket {
    epoch: u64,
    generation: u64,
    index: String,
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    epoch: u64,
    generation: u64,
    searches_in_flight: usize,
    deletes_in_flight: usize,
    // Never reset, so a result applied after `clear` still gets a fresh number
    results_applied: u64,
}

impl Inner {
    fn dispatch(&mut self, action: SessionAction) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action);
    }

    fn ticket(&self, index: String) -> Ticket {
        Ticket {
            epoch: self.epoch,
            generation: self.generation,
            index,
        }
    }

    /// Whether the result set the ticket was issued for is still displayed
    fn holds_results_for(&self, ticket: &Ticket) -> bool {
        self.generation == ticket.generation
            && self.state.index.as_deref() == Some(ticket.index.as_str())
    }
}

/// One open search view's session; clones share the same state
#[derive(Clone)]
pub struct SearchSession {
    inner: Arc<Mutex<Inner>>,
    gateway: Arc<dyn SearchGateway>,
}

impl SearchSession {
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            gateway,
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Existing results are kept; only [`clear`](Self::clear) drops them
    pub fn set_index(&self, index: impl Into<String>) {
        self.lock().dispatch(SessionAction::SetIndex(index.into()));
    }

    /// Does not start a search by itself
    pub fn set_query(&self, query: SearchQuery) {
        self.lock().dispatch(SessionAction::SetQuery(query));
    }

    /// Reset to the initial state; responses still in flight will be dropped
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.generation += 1;
        inner.searches_in_flight = 0;
        inner.deletes_in_flight = 0;
        inner.dispatch(SessionAction::Clear);
    }

    /// Drop the query and results but keep the index
    pub fn clear_search_result(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.dispatch(SessionAction::ClearSearchResult);
    }

    /// Run the current query against the current index
    pub async fn search(&self) -> Outcome {
        let (ticket, query) = {
            let mut inner = self.lock();
            let target = inner.state.index.clone().zip(inner.state.query.clone());
            let (index, query) = match target {
                Some(target) => target,
                None => {
                    tracing::warn!("search dispatched without index or query");
                    let still_loading = inner.searches_in_flight > 0;
                    inner.dispatch(SessionAction::SearchFailed {
                        message: SEARCH_UNAVAILABLE_MSG.to_string(),
                        still_loading,
                    });
                    return Outcome::Failed;
                }
            };

            inner.searches_in_flight += 1;
            inner.dispatch(SessionAction::SearchStarted);
            (inner.ticket(index), query)
        };

        tracing::debug!("searching index '{}' for '{}'", ticket.index, query.text);
        let response = self.gateway.search(&ticket.index, &query).await;

        let mut inner = self.lock();
        if inner.epoch != ticket.epoch {
            tracing::debug!("dropping search response for cleared session");
            return Outcome::Discarded;
        }

        inner.searches_in_flight = inner.searches_in_flight.saturating_sub(1);
        let still_loading = inner.searches_in_flight > 0;

        if !inner.holds_results_for(&ticket) {
            tracing::debug!("dropping stale search response for index '{}'", ticket.index);
            inner.dispatch(SessionAction::SearchDropped { still_loading });
            return Outcome::Discarded;
        }

        match response {
            Ok(result) => {
                tracing::debug!("search returned {} documents", result.documents.len());
                inner.results_applied += 1;
                let seq = inner.results_applied;
                inner.dispatch(SessionAction::SearchLoaded {
                    result,
                    seq,
                    still_loading,
                });
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!("search failed: {}", err);
                inner.dispatch(SessionAction::SearchFailed {
                    message: err.user_message(),
                    still_loading,
                });
                Outcome::Failed
            }
        }
    }

    /// Delete a document on the backend and reconcile the displayed results
    pub async fn delete_document(&self, document: &Document) -> Outcome {
        let ticket = {
            let mut inner = self.lock();
            let index = match inner.state.index.clone() {
                Some(index) => index,
                None => {
                    let still_loading = inner.deletes_in_flight > 0;
                    inner.dispatch(SessionAction::DeleteFailed {
                        message: INDEX_UNAVAILABLE_MSG.to_string(),
                        still_loading,
                    });
                    return Outcome::Failed;
                }
            };

            inner.deletes_in_flight += 1;
            inner.dispatch(SessionAction::DeleteStarted);
            inner.ticket(index)
        };

        tracing::debug!("deleting document '{}' from '{}'", document.id, ticket.index);
        let response = self.gateway.delete_document(&ticket.index, &document.id).await;

        let mut inner = self.lock();
        if inner.epoch != ticket.epoch {
            tracing::debug!("dropping delete response for cleared session");
            return Outcome::Discarded;
        }

        inner.deletes_in_flight = inner.deletes_in_flight.saturating_sub(1);
        let still_loading = inner.deletes_in_flight > 0;

        match response {
            Ok(()) => {
                let reconcile = inner.holds_results_for(&ticket);
                inner.dispatch(SessionAction::DeleteSucceeded {
                    id: document.id.clone(),
                    reconcile,
                    still_loading,
                });
                Outcome::Applied
            }
            Err(err) => {
                tracing::warn!("delete of '{}' failed: {}", document.id, err);
                inner.dispatch(SessionAction::DeleteFailed {
                    message: err.user_message(),
                    still_loading,
                });
                Outcome::Failed
            }
        }
    }

    pub fn consume_err(&self) {
        self.lock().dispatch(SessionAction::ConsumeErr);
    }

    pub fn consume_delete_success(&self) {
        self.lock().dispatch(SessionAction::ConsumeDeleteSuccess);
    }

    /// Read and consume `err` under one lock, so an error raised concurrently
    /// is either returned here or left for the next call
    pub fn take_err(&self) -> Option<String> {
        let mut inner = self.lock();
        let err = inner.state.err.clone();
        if err.is_some() {
            inner.dispatch(SessionAction::ConsumeErr);
        }
        err
    }

    /// Consume a settled delete success; false while deletes are still running
    pub fn take_delete_success(&self) -> bool {
        let mut inner = self.lock();
        let settled = !inner.state.delete_loading && inner.state.delete_success == Some(true);
        if settled {
            inner.dispatch(SessionAction::ConsumeDeleteSuccess);
        }
        settled
    }

    /// Current result set as pretty JSON (an empty array when there is none)
    pub fn export_documents_json(&self) -> serde_json::Result<String> {
        let inner = self.lock();
        documents_to_pretty_json(inner.state.documents.as_deref().unwrap_or_default())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a session when a search view opens and retires it when it closes
#[derive(Clone)]
pub struct SessionManager {
    gateway: Arc<dyn SearchGateway>,
}

impl SessionManager {
    pub fn new(gateway: Arc<dyn SearchGateway>) -> Self {
        Self { gateway }
    }

    pub fn open(&self, index: impl Into<String>) -> SearchSession {
        let session = SearchSession::new(Arc::clone(&self.gateway));
        session.set_index(index);
        session
    }

    /// Late responses for the closed session are discarded
    pub fn close(&self, session: SearchSession) {
        session.clear();
    }
}
