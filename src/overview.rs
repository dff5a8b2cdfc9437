//! Display statistics derived from a [`SessionState`].

use crate::notification::{Notification, NotificationChannel, Severity};
use crate::session::SessionState;
use std::fmt;

pub const NO_RESULTS_MSG: &str = "No results matching this query were found";
const NO_RESULTS_AUTOHIDE_SECS: u64 = 5;

/// Summary card shown above the result list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overview {
    pub model_name: Option<&'static str>,
    pub total_hits: Option<usize>,
    pub best_score: Option<f64>,
    pub worst_score: Option<f64>,
    pub stopword_warning: Option<String>,
}

impl Overview {
    /// Derive the overview; never touches the state
    pub fn derive(state: &SessionState) -> Self {
        let (query, documents) = match (&state.query, &state.documents) {
            (Some(query), Some(documents)) => (query, documents),
            _ => return Self::default(),
        };

        let mut overview = Self {
            model_name: Some(query.model.display_name()),
            total_hits: Some(state.total_documents),
            ..Self::default()
        };

        if documents.is_empty() {
            return overview;
        }

        overview.stopword_warning = state
            .stopwords
            .as_ref()
            .filter(|words| !words.is_empty())
            .map(|words| format!("Stopwords detected during search: \"{}\"", words.join(", ")));

        // Results arrive in descending score order
        if query.model.is_ranked() {
            overview.best_score = documents.first().and_then(|doc| doc.score);
            overview.worst_score = documents.last().and_then(|doc| doc.score);
        }

        overview
    }
}

impl fmt::Display for Overview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Overview")?;
        if let Some(model) = self.model_name {
            writeln!(f, "Model: {}", model)?;
        }
        if let Some(hits) = self.total_hits {
            writeln!(f, "Total Hits: {}", hits)?;
        }
        // A score of exactly zero is still a score and is printed
        if let Some(best) = self.best_score {
            writeln!(f, "Best Score: {:.3}", best)?;
        }
        if let Some(worst) = self.worst_score {
            writeln!(f, "Worst Score: {:.3}", worst)?;
        }
        if let Some(warning) = &self.stopword_warning {
            writeln!(f, "{}", warning)?;
        }
        Ok(())
    }
}

/// Re-derives the overview and raises the "no results" warning once per
/// transition into an empty result set.
///
/// Every applied search counts as a new result set, keyed by
/// [`SessionState::result_seq`], so back-to-back empty searches each warn
/// even when the tracker never saw the state between them. A delete that
/// empties the displayed results warns as well.
pub struct OverviewTracker {
    channel: NotificationChannel,
    showing_empty: bool,
    last_seq: u64,
}

impl OverviewTracker {
    pub fn new(channel: NotificationChannel) -> Self {
        Self {
            channel,
            showing_empty: false,
            last_seq: 0,
        }
    }

    pub fn update(&mut self, state: &SessionState) -> Overview {
        let empty = state.query.is_some()
            && state.documents.as_ref().map_or(false, |docs| docs.is_empty());
        let new_result = state.result_seq != self.last_seq;
        self.last_seq = state.result_seq;

        if empty && (new_result || !self.showing_empty) {
            self.channel.show(
                Notification::new(NO_RESULTS_MSG, Severity::Warning)
                    .with_autohide(NO_RESULTS_AUTOHIDE_SECS),
            );
        }
        self.showing_empty = empty;

        Overview::derive(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Document, SearchResult};
    use crate::gateway::testing::CannedGateway;
    use crate::query::{SearchModel, SearchQuery};
    use crate::session::SearchSession;
    use std::sync::Arc;

    fn state(model: SearchModel, docs: Vec<Document>, stopwords: &[&str]) -> SessionState {
        SessionState {
            index: Some("wiki".into()),
            query: Some(SearchQuery::new("cats", model)),
            total_documents: docs.len(),
            documents: Some(docs),
            stopwords: Some(stopwords.iter().map(|w| w.to_string()).collect()),
            ..SessionState::default()
        }
    }

    fn ranked() -> Vec<Document> {
        vec![
            Document::new("1", "a").with_score(0.9),
            Document::new("2", "b").with_score(0.4),
        ]
    }

    #[test]
    fn test_ranked_overview() {
        let overview = Overview::derive(&state(SearchModel::Tfidf, ranked(), &["the"]));

        assert_eq!(overview.model_name, Some("TF-IDF"));
        assert_eq!(overview.total_hits, Some(2));
        assert_eq!(overview.best_score, Some(0.9));
        assert_eq!(overview.worst_score, Some(0.4));
        assert_eq!(
            overview.stopword_warning.as_deref(),
            Some("Stopwords detected during search: \"the\"")
        );
    }

    #[test]
    fn test_boolean_model_hides_scores() {
        let overview = Overview::derive(&state(SearchModel::Bool, ranked(), &[]));

        assert_eq!(overview.model_name, Some("Boolean"));
        assert_eq!(overview.total_hits, Some(2));
        assert_eq!(overview.best_score, None);
        assert_eq!(overview.worst_score, None);
        assert_eq!(overview.stopword_warning, None);
    }

    #[test]
    fn test_cleared_without_query_or_documents() {
        let mut s = state(SearchModel::Bm25, ranked(), &[]);
        s.query = None;
        assert_eq!(Overview::derive(&s), Overview::default());

        let mut s = state(SearchModel::Bm25, ranked(), &[]);
        s.documents = None;
        assert_eq!(Overview::derive(&s), Overview::default());
    }

    #[test]
    fn test_total_hits_follow_total_documents() {
        let mut s = state(SearchModel::Bm25, ranked(), &[]);
        s.total_documents = 17;
        assert_eq!(Overview::derive(&s).total_hits, Some(17));
    }

    #[test]
    fn test_no_results_notifies_once() {
        let channel = NotificationChannel::new();
        let mut tracker = OverviewTracker::new(channel.clone());
        let empty = state(SearchModel::Tfidf, vec![], &["the"]);

        let overview = tracker.update(&empty);
        assert_eq!(overview.total_hits, Some(0));
        assert_eq!(overview.best_score, None);
        assert_eq!(overview.worst_score, None);
        assert_eq!(overview.stopword_warning, None);

        let shown = channel.consume().unwrap();
        assert_eq!(shown.message, NO_RESULTS_MSG);
        assert_eq!(shown.severity, Severity::Warning);
        assert_eq!(shown.autohide_secs, Some(5));

        // Re-rendering the same empty result stays quiet
        tracker.update(&empty);
        assert!(channel.current().is_none());

        // A new search that comes back empty again notifies again
        tracker.update(&SessionState::default());
        tracker.update(&empty);
        assert_eq!(channel.current().map(|n| n.message), Some(NO_RESULTS_MSG.to_string()));
    }

    #[tokio::test]
    async fn test_back_to_back_empty_searches_each_notify() {
        let gateway = CannedGateway::default()
            .with_search(Ok(SearchResult::new(vec![])))
            .with_search(Ok(SearchResult::new(vec![])));
        let session = SearchSession::new(Arc::new(gateway));
        let channel = NotificationChannel::new();
        let mut tracker = OverviewTracker::new(channel.clone());
        session.set_index("wiki");

        for text in ["zebra", "unicorn"] {
            session.clear_search_result();
            session.set_query(SearchQuery::new(text, SearchModel::Bm25));
            session.search().await;

            tracker.update(&session.state());
            let shown = channel.consume().map(|n| n.message);
            assert_eq!(shown.as_deref(), Some(NO_RESULTS_MSG), "query {:?}", text);
        }
    }

    #[tokio::test]
    async fn test_delete_of_last_result_notifies() {
        let gateway = CannedGateway::default()
            .with_search(Ok(SearchResult::new(vec![Document::new("1", "a").with_score(0.9)])))
            .with_delete(Ok(()));
        let session = SearchSession::new(Arc::new(gateway));
        let channel = NotificationChannel::new();
        let mut tracker = OverviewTracker::new(channel.clone());
        session.set_index("wiki");
        session.set_query(SearchQuery::new("cats", SearchModel::Tfidf));
        session.search().await;

        tracker.update(&session.state());
        assert!(channel.current().is_none());

        session.delete_document(&Document::new("1", "")).await;
        tracker.update(&session.state());
        assert_eq!(channel.consume().map(|n| n.message).as_deref(), Some(NO_RESULTS_MSG));
    }

    #[test]
    fn test_zero_score_is_displayed() {
        let docs = vec![
            Document::new("1", "a").with_score(0.5),
            Document::new("2", "b").with_score(0.0),
        ];
        let text = Overview::derive(&state(SearchModel::Tfidf, docs, &[])).to_string();
        assert!(text.contains("Worst Score: 0.000"));
    }

    #[test]
    fn test_display_formats_scores() {
        let overview = Overview::derive(&state(SearchModel::Bm25, ranked(), &[]));
        let text = overview.to_string();

        assert!(text.contains("Model: BM25"));
        assert!(text.contains("Total Hits: 2"));
        assert!(text.contains("Best Score: 0.900"));
        assert!(text.contains("Worst Score: 0.400"));
    }
}
