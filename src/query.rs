use serde::{Deserialize, Serialize};
use std::fmt;

/// Ranking/matching strategy requested from the backend
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SearchModel {
    #[default]
    Tfidf,
    Bool,
    Bm25,
    Transformers,
    /// A model name this client does not know about; kept verbatim
    Unknown(String),
}

impl SearchModel {
    pub fn as_str(&self) -> &str {
        match self {
            SearchModel::Tfidf => "tfidf",
            SearchModel::Bool => "bool",
            SearchModel::Bm25 => "bm25",
            SearchModel::Transformers => "transformers",
            SearchModel::Unknown(name) => name,
        }
    }

    /// Label shown in the search overview
    pub fn display_name(&self) -> &'static str {
        match self {
            SearchModel::Tfidf => "TF-IDF",
            SearchModel::Bool => "Boolean",
            SearchModel::Transformers => "Transformers",
            SearchModel::Bm25 | SearchModel::Unknown(_) => "BM25",
        }
    }

    /// Boolean retrieval does not rank, so its scores carry no meaning
    pub fn is_ranked(&self) -> bool {
        !matches!(self, SearchModel::Bool)
    }
}

impl From<&str> for SearchModel {
    fn from(name: &str) -> Self {
        match name {
            "tfidf" => SearchModel::Tfidf,
            "bool" => SearchModel::Bool,
            "bm25" => SearchModel::Bm25,
            "transformers" => SearchModel::Transformers,
            other => SearchModel::Unknown(other.to_string()),
        }
    }
}

impl From<String> for SearchModel {
    fn from(name: String) -> Self {
        SearchModel::from(name.as_str())
    }
}

impl From<SearchModel> for String {
    fn from(model: SearchModel) -> Self {
        model.as_str().to_string()
    }
}

impl fmt::Display for SearchModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query submitted to `POST /indices/{index}/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(rename = "query")]
    pub text: String,
    #[serde(default)]
    pub model: SearchModel,
    /// `None` asks for every match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, model: SearchModel) -> Self {
        Self {
            text: text.into(),
            model,
            top_k: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }
}
