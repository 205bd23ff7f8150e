pub mod models;
pub mod cli;
pub mod history;
pub mod rag;
pub mod repl;
pub mod store;

use cli::Args;
use history::initialize_storage;
use log::info;
use rag::create_answering_service;
use std::error::Error;
use store::ConversationStore;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("RAG Base URL: {}", args.rag_base_url);
    info!("RAG Top K: {}", args.rag_top_k);
    info!("Storage Type: {}", args.storage_type);
    info!("Storage Key: {}", args.storage_key);
    if args.storage_type.eq_ignore_ascii_case("redis") {
        info!("Storage Host: {}", args.storage_host);
        info!("Storage Prefix: {}", args.storage_prefix);
    }
    info!("-------------------------");

    let storage = initialize_storage(&args)?;
    let service = create_answering_service(&args)?;
    let store = ConversationStore::new(storage, service)
        .with_storage_key(args.storage_key.clone())
        .with_top_k(args.rag_top_k);

    store.init_from_storage().await;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    repl::run_session(&store, stdin, &mut stdout).await
}
