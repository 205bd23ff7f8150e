use async_trait::async_trait;
use log::debug;
use std::io::ErrorKind;
use std::path::{ Path, PathBuf };
use tokio::fs;
use crate::history::{ KeyValueStore, StorageError };

/// Keeps each key in its own `<key>.json` file inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn default_dir() -> Result<PathBuf, StorageError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StorageError::Unavailable("Could not determine config directory".into()))?;
        Ok(config_dir.join("rag-chat"))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.entry_path(key)).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).await?;
        let path = self.entry_path(key);
        // Swap in a complete file so readers never see a partial array.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert_eq!(store.get("rag-chat-messages").await.unwrap(), None);
    }

    #[tokio::test]
    async fn value_survives_a_fresh_store_on_the_same_dir() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("nested").join("dir");

        FileStore::new(&nested).set("rag-chat-messages", "[]").await.unwrap();

        let reopened = FileStore::new(&nested);
        assert_eq!(reopened.get("rag-chat-messages").await.unwrap().as_deref(), Some("[]"));
        assert!(!nested.join("rag-chat-messages.json.tmp").exists());
    }

    #[tokio::test]
    async fn path_separators_stay_inside_the_dir() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        store.set("../escape", "x").await.unwrap();
        assert!(temp_dir.path().join(".._escape.json").exists());
    }
}
