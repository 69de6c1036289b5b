use async_trait::async_trait;
use redis::{aio::ConnectionManager, Client, IntoConnectionInfo};
use tracing::{debug, info};

use crate::error::RedisError;
use crate::store::KeyValueStore;

/// Handle on one logical Redis database.
///
/// The connection manager multiplexes a single connection and reconnects on its own,
/// so the client is cheap to clone and safe to share between concurrent requests.
#[derive(Clone)]
pub struct RedisClient {
    manager: ConnectionManager,
    db: i64,
}

impl RedisClient {
    /// Connect to `redis_url` and select `db`, overriding any database in the URL.
    pub async fn new(redis_url: &str, db: i64) -> Result<Self, RedisError> {
        let mut connection_info = redis_url
            .into_connection_info()
            .map_err(|e| RedisError::ConnectionError(e.to_string()))?;
        connection_info.redis.db = db;

        let client = Client::open(connection_info)
            .map_err(|e| RedisError::ConnectionError(e.to_string()))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| RedisError::ConnectionError(e.to_string()))?;

        let redis_client = Self { manager, db };
        redis_client.ping().await?;
        info!("Connected to redis db {}", db);

        Ok(redis_client)
    }

    pub fn db(&self) -> i64 {
        self.db
    }

    pub async fn ping(&self) -> Result<(), RedisError> {
        let reply: String = redis::cmd("PING")
            .query_async(&mut self.manager.clone())
            .await
            .map_err(RedisError::from)?;

        if reply != "PONG" {
            return Err(RedisError::InvalidDataFormat(format!(
                "unexpected PING reply: {}",
                reply
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for RedisClient {
    async fn get(&self, key: &str) -> Result<Option<String>, RedisError> {
        redis::cmd("GET")
            .arg(key)
            .query_async(&mut self.manager.clone())
            .await
            .map_err(RedisError::from)
    }

    async fn scan(
        &self,
        pattern: &str,
        cursor: u64,
        count: usize,
    ) -> Result<(Vec<String>, u64), RedisError> {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut self.manager.clone())
            .await
            .map_err(RedisError::from)?;

        debug!(
            "SCAN db={} pattern={} cursor={} -> {} keys, next cursor {}",
            self.db,
            pattern,
            cursor,
            keys.len(),
            next_cursor
        );
        Ok((keys, next_cursor))
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, RedisError> {
        redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut self.manager.clone())
            .await
            .map_err(RedisError::from)
    }

    async fn ttl(&self, key: &str) -> Result<i64, RedisError> {
        redis::cmd("TTL")
            .arg(key)
            .query_async(&mut self.manager.clone())
            .await
            .map_err(RedisError::from)
    }

    async fn ping(&self) -> Result<(), RedisError> {
        RedisClient::ping(self).await
    }
}
