use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Answering Service Args ---
    /// Base URL of the RAG answering service (the client posts to <base>/rag/search)
    #[arg(long, env = "RAG_BASE_URL", default_value = "http://127.0.0.1:8000")]
    pub rag_base_url: String,

    /// Optional bearer token sent to the answering service.
    #[arg(long, env = "RAG_API_KEY")]
    pub rag_api_key: Option<String>,

    /// Number of retrieved passages requested per question.
    #[arg(long, env = "RAG_TOP_K", default_value = "10")]
    pub rag_top_k: usize,

    // --- Storage Args ---
    /// Conversation storage type (file, redis, memory, none)
    #[arg(long, env = "STORAGE_TYPE", default_value = "file")]
    pub storage_type: String,

    /// Directory for the file storage backend. Defaults to <config dir>/rag-chat.
    #[arg(long, env = "STORAGE_DIR")]
    pub storage_dir: Option<String>,

    /// Redis endpoint for the redis storage backend (e.g., redis://127.0.0.1:6379)
    #[arg(long, env = "STORAGE_HOST", default_value = "redis://127.0.0.1:6379")]
    pub storage_host: String,

    /// Prefix for Redis storage keys.
    #[arg(long, env = "STORAGE_PREFIX", default_value = "chat:")]
    pub storage_prefix: String,

    /// Key the conversation is persisted under.
    #[arg(long, env = "STORAGE_KEY", default_value = "rag-chat-messages")]
    pub storage_key: String,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,
}
