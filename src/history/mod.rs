mod file;
mod memory;
mod redis;

pub use file::FileStore;
pub use memory::{ DetachedStore, MemoryStore };
pub use self::redis::RedisStore;

use async_trait::async_trait;
use log::info;
use std::error::Error as StdError;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use crate::cli::Args;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("redis storage error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String key-value persistence used to mirror the conversation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

pub fn create_storage(
    args: &Args
) -> Result<Arc<dyn KeyValueStore>, Box<dyn StdError + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "file" => {
            let dir = match &args.storage_dir {
                Some(dir) => PathBuf::from(dir),
                None => FileStore::default_dir()?,
            };
            Ok(Arc::new(FileStore::new(dir)))
        }
        "redis" => {
            let store = RedisStore::new(&args.storage_host, &args.storage_prefix)?;
            Ok(Arc::new(store))
        }
        "memory" => Ok(Arc::new(MemoryStore::new())),
        "none" => Ok(Arc::new(DetachedStore)),
        _ =>
            Err(
                Box::new(
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        format!("Unsupported storage type: {}", args.storage_type)
                    )
                )
            ),
    }
}

pub fn initialize_storage(
    args: &Args
) -> Result<Arc<dyn KeyValueStore>, Box<dyn StdError + Send + Sync>> {
    match args.storage_type.to_lowercase().as_str() {
        "redis" => info!("Chat history will be stored in redis at {}", args.storage_host),
        "file" =>
            info!(
                "Chat history will be stored in files under {}",
                args.storage_dir.as_deref().unwrap_or("the default config directory")
            ),
        other => info!("Chat history storage: {}", other),
    }
    create_storage(args)
}
