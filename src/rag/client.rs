use async_trait::async_trait;
use log::debug;
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use super::{ AnsweringService, RagError, SEARCH_ROUTE };

#[derive(Serialize)]
struct SearchRequest<'a> {
    question: &'a str,
    top_k: usize,
}

#[derive(Debug, Clone)]
pub struct HttpRagClient {
    http: HttpClient,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpRagClient {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, RagError> {
        let base = Url::parse(base_url).map_err(|e|
            RagError::InvalidBaseUrl(format!("{}: {}", base_url, e))
        )?;
        if base.scheme() != "http" && base.scheme() != "https" {
            return Err(RagError::InvalidBaseUrl(format!("unsupported scheme in {}", base_url)));
        }
        let endpoint_str = format!("{}{}", base.as_str().trim_end_matches('/'), SEARCH_ROUTE);
        let endpoint = Url::parse(&endpoint_str).map_err(|e|
            RagError::InvalidBaseUrl(format!("{}: {}", endpoint_str, e))
        )?;

        Ok(Self {
            http: HttpClient::new(),
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl AnsweringService for HttpRagClient {
    async fn search(&self, question: &str, top_k: usize) -> Result<Value, RagError> {
        debug!("POST {} (top_k={})", self.endpoint, top_k);
        let mut req = self.http
            .post(self.endpoint.clone())
            .json(&SearchRequest { question, top_k });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RagError::Status(status));
        }

        let body = resp.text().await?;
        let root: Value = serde_json::from_str(&body).map_err(|e| RagError::Malformed(e.to_string()))?;
        if root.is_null() {
            return Err(RagError::Malformed("response body is null".to_string()));
        }

        Ok(root.get("data").cloned().unwrap_or(Value::Null))
    }
}
