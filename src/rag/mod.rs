pub mod client;

pub use client::HttpRagClient;

use async_trait::async_trait;
use log::info;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

pub const SEARCH_ROUTE: &str = "/rag/search";

#[derive(Debug, Error)]
pub enum RagError {
    #[error("answering service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("answering service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed answering service response: {0}")]
    Malformed(String),
    #[error("invalid answering service URL: {0}")]
    InvalidBaseUrl(String),
}

/// Remote collaborator that answers a question from retrieved context.
#[async_trait]
pub trait AnsweringService: Send + Sync {
    /// Returns the payload under the response's `data` field, or
    /// `Value::Null` when the service left it out.
    async fn search(&self, question: &str, top_k: usize) -> Result<Value, RagError>;
}

pub fn create_answering_service(args: &Args) -> Result<Arc<dyn AnsweringService>, RagError> {
    let api_key = args.rag_api_key.clone().filter(|k| !k.is_empty());
    let client = HttpRagClient::new(&args.rag_base_url, api_key)?;
    info!("Answering service endpoint: {}", client.endpoint());
    Ok(Arc::new(client))
}
