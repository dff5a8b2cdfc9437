use crate::config::GatewayConfig;
use crate::document::{Document, SearchResult};
use crate::gateway::{Envelope, GatewayError, SearchGateway};
use crate::index::{IndexConfig, IndexSummary};
use crate::query::SearchQuery;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use std::path::Path;

/// A JSON file to be sent as the `dataFile` multipart field
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "documents.json".to_string());
        Ok(Self { file_name, bytes })
    }

    fn into_part(self) -> Result<Part, GatewayError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str("application/json")?)
    }
}

/// Gateway speaking the backend's HTTP/JSON envelope protocol
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: Url,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ========== Index Operations ==========

    /// List every index known to the backend
    pub async fn list_indices(&self) -> Result<Vec<IndexSummary>, GatewayError> {
        let url = self.endpoint(&["indices", ""]);
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_envelope(response).await?.into_payload()
    }

    /// Create an index, optionally seeding it with a JSON file of documents
    pub async fn create_index(
        &self,
        config: &IndexConfig,
        seed: Option<UploadFile>,
    ) -> Result<Option<String>, GatewayError> {
        let url = self.endpoint(&["indices", &config.name]);
        let idx_config = serde_json::to_string(config)
            .map_err(|e| GatewayError::Transport(format!("cannot encode index config: {}", e)))?;

        let mut form = Form::new().text("idxConfig", idx_config);
        if let Some(file) = seed {
            form = form.part("dataFile", file.into_part()?);
        }

        tracing::debug!("POST {}", url);
        let response = self.client.post(url).multipart(form).send().await?;
        read_envelope(response).await?.into_message()
    }

    pub async fn delete_index(&self, name: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["indices", name]);
        tracing::debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        read_envelope(response).await?.into_message().map(|_| ())
    }

    // ========== Document Operations ==========

    pub async fn get_document(&self, index: &str, id: &str) -> Result<Document, GatewayError> {
        let url = self.endpoint(&["indices", index, "documents", id]);
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        read_envelope(response).await?.into_payload()
    }

    /// Create or replace a document; the backend assigns an id when it is empty
    pub async fn save_document(
        &self,
        index: &str,
        document: &Document,
    ) -> Result<Option<String>, GatewayError> {
        let url = if document.id.is_empty() {
            self.endpoint(&["indices", index, "documents"])
        } else {
            self.endpoint(&["indices", index, "documents", &document.id])
        };
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).json(document).send().await?;
        read_envelope(response).await?.into_message()
    }

    /// Bulk-add documents from a JSON file
    pub async fn upload_documents(
        &self,
        index: &str,
        file: UploadFile,
    ) -> Result<Option<String>, GatewayError> {
        let url = self.endpoint(&["indices", index, "documents", "files"]);
        let form = Form::new().part("dataFile", file.into_part()?);

        tracing::debug!("POST {}", url);
        let response = self.client.post(url).multipart(form).send().await?;
        read_envelope(response).await?.into_message()
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Config validation guarantees the URL can be a base
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl SearchGateway for HttpGateway {
    async fn search(&self, index: &str, query: &SearchQuery) -> Result<SearchResult, GatewayError> {
        let url = self.endpoint(&["indices", index, "search"]);
        tracing::debug!("POST {} model={}", url, query.model);
        let response = self.client.post(url).json(query).send().await?;
        read_envelope(response).await?.into_payload()
    }

    async fn delete_document(&self, index: &str, id: &str) -> Result<(), GatewayError> {
        let url = self.endpoint(&["indices", index, "documents", id]);
        tracing::debug!("DELETE {}", url);
        let response = self.client.delete(url).send().await?;
        read_envelope(response).await?.into_message().map(|_| ())
    }
}

async fn read_envelope(response: Response) -> Result<Envelope, GatewayError> {
    let status = response.status();
    let body = response.text().await?;

    match Envelope::parse(&body) {
        Ok(envelope) => Ok(envelope),
        Err(_) if !status.is_success() => {
            Err(GatewayError::Transport(format!("HTTP {} without envelope", status)))
        }
        Err(e) => Err(e),
    }
}
