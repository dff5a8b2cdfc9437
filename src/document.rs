use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Document as returned by the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "docId", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub additional_properties: Map<String, Value>,
    /// Kept as the backend's ISO-8601 text so a fetched document saves back unchanged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Present only for ranked models
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            text: text.into(),
            additional_properties: Map::new(),
            date: None,
            score: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_properties.insert(key.into(), value.into());
        self
    }
}

/// Result of a search, ordered by descending score for ranked models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub documents: Vec<Document>,
    /// Terms dropped by the backend's query analyzer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopwords: Option<Vec<String>>,
}

impl SearchResult {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            stopwords: None,
        }
    }

    pub fn with_stopwords<I, S>(mut self, stopwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = Some(stopwords.into_iter().map(Into::into).collect());
        self
    }
}

/// Serialize documents the way the "download all" export writes them
pub fn documents_to_pretty_json(documents: &[Document]) -> serde_json::Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    documents.serialize(&mut ser)?;
    // serde_json only ever writes valid UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// Older backends sent numeric `docId` values.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_numeric_doc_id() {
        let doc: Document = serde_json::from_value(json!({
            "docId": 42,
            "text": "old style",
            "additionalProperties": {"lang": "en"}
        }))
        .unwrap();

        assert_eq!(doc.id, "42");
        assert_eq!(doc.additional_properties["lang"], "en");
        assert_eq!(doc.score, None);
    }

    #[test]
    fn test_date_survives_fetch_and_save() {
        let fetched = json!({
            "id": "7",
            "title": "Minutes",
            "text": "meeting notes",
            "date": "2021-03-04T10:00:00",
            "additionalProperties": {}
        });
        let doc: Document = serde_json::from_value(fetched.clone()).unwrap();
        assert_eq!(doc.date.as_deref(), Some("2021-03-04T10:00:00"));

        let saved = serde_json::to_value(&doc).unwrap();
        assert_eq!(saved["date"], fetched["date"]);

        let undated = serde_json::to_value(Document::new("8", "x")).unwrap();
        assert!(undated.get("date").is_none());
    }

    #[test]
    fn test_search_result_without_stopwords() {
        let result: SearchResult = serde_json::from_value(json!({
            "documents": [{"id": "1", "text": "cats", "score": 0.9}]
        }))
        .unwrap();

        assert_eq!(result.documents.len(), 1);
        assert_eq!(result.documents[0].score, Some(0.9));
        assert!(result.stopwords.is_none());
    }

    #[test]
    fn test_pretty_export_uses_four_spaces() {
        let docs = vec![Document::new("1", "cats")];
        let json = documents_to_pretty_json(&docs).unwrap();

        assert!(json.starts_with("[\n    {\n        \"id\": \"1\""));
        assert_eq!(documents_to_pretty_json(&[]).unwrap(), "[]");
    }
}
