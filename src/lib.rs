// Re-export main components
pub mod config;
pub mod document;
pub mod gateway;
pub mod http;
pub mod index;
pub mod notification;
pub mod overview;
pub mod query;
pub mod session;

// Re-export commonly used types
pub use config::GatewayConfig;
pub use document::{Document, SearchResult};
pub use gateway::{GatewayError, SearchGateway};
pub use http::{HttpGateway, UploadFile};
pub use index::{IndexConfig, IndexSummary, PreprocessorConfig};
pub use notification::{Notification, NotificationChannel, Severity};
pub use overview::{Overview, OverviewTracker};
pub use query::{SearchModel, SearchQuery};
pub use session::{Outcome, SearchSession, SessionManager, SessionState};

// Re-export error types
pub use anyhow::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::testing::CannedGateway;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_basic_workflow() -> Result<()> {
        let gateway = CannedGateway::default()
            .with_search(Ok(SearchResult::new(vec![
                Document::new("1", "Rust is a systems programming language").with_score(1.2),
                Document::new("2", "Go is a simple programming language").with_score(0.7),
            ])))
            .with_delete(Ok(()));
        let manager = SessionManager::new(Arc::new(gateway));
        let channel = NotificationChannel::new();
        let mut tracker = OverviewTracker::new(channel.clone());

        // Open the view and search
        let session = manager.open("languages");
        session.clear_search_result();
        session.set_query(SearchQuery::new("programming language", SearchModel::Bm25));
        assert_eq!(session.search().await, Outcome::Applied);

        let overview = tracker.update(&session.state());
        assert_eq!(overview.total_hits, Some(2));
        assert_eq!(overview.best_score, Some(1.2));

        // Delete the top hit
        session.delete_document(&Document::new("1", "")).await;
        notification::relay_session_feedback(&session, &channel);
        assert_eq!(
            channel.current().map(|n| n.message),
            Some(notification::DELETE_SUCCESS_MSG.to_string())
        );

        let overview = tracker.update(&session.state());
        assert_eq!(overview.total_hits, Some(1));
        assert_eq!(overview.best_score, Some(0.7));

        manager.close(session);
        Ok(())
    }
}
