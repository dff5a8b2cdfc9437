use crate::document::Document;
use serde::{Deserialize, Serialize};

/// Text preprocessing applied by the backend when an index is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreprocessorConfig {
    pub lowercase: bool,
    pub remove_accents_before_stemming: bool,
    pub remove_punctuation: bool,
    pub remove_stopwords: bool,
    pub use_stemmer: bool,
    pub lang: String,
    pub remove_accents_after_stemming: bool,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            remove_accents_before_stemming: true,
            remove_punctuation: true,
            remove_stopwords: true,
            use_stemmer: true,
            lang: "en".to_string(),
            remove_accents_after_stemming: true,
        }
    }
}

/// Body of a create-index request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
    pub name: String,
    pub preprocessor_config: PreprocessorConfig,
}

impl IndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preprocessor_config: PreprocessorConfig::default(),
        }
    }

    pub fn with_preprocessor(mut self, config: PreprocessorConfig) -> Self {
        self.preprocessor_config = config;
        self
    }
}

/// Index as listed by `GET /indices`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub name: String,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default)]
    pub n_terms: usize,
    #[serde(default)]
    pub n_docs: usize,
    #[serde(default)]
    pub example_documents: Vec<Document>,
}
