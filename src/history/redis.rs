use async_trait::async_trait;
use crate::history::{ KeyValueStore, StorageError };
use redis::{ Client, AsyncCommands };

pub struct RedisStore {
    client: Client,
    key_prefix: String,
}

impl RedisStore {
    pub fn new(host: &str, key_prefix: &str) -> Result<Self, StorageError> {
        Ok(Self {
            client: Client::open(host)?,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, redis::RedisError> {
        self.client.get_multiplexed_async_connection().await
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.full_key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut conn = self.get_connection().await?;
        let _: () = conn.set(self.full_key(key), value).await?;
        Ok(())
    }
}
