// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redis-backed cache
//!
//! Entries are plain strings written with `SET .. PX`, so expiry is enforced
//! by the server. Prefix invalidation walks the keyspace with `SCAN` rather
//! than `KEYS` to avoid blocking the server.

use super::{Cache, CacheError};
use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use std::time::Duration;

const SCAN_BATCH: usize = 100;

/// Cache backed by a Redis server
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
    /// Prepended to every key, e.g. "ordo:" turns "item:1:2" into "ordo:item:1:2"
    prefix: String,
}

impl RedisCache {
    pub async fn connect(url: &str, prefix: &str) -> Result<Self, CacheError> {
        let client = Client::open(url).map_err(|e| CacheError::Connect(e.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connect(e.to_string()))?;
        Ok(Self {
            connection,
            prefix: prefix.to_string(),
        })
    }

    fn prefixed_key(&self, key: &str) -> String {
        if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}{}", self.prefix, key)
        }
    }
}

fn command_error(err: ::redis::RedisError) -> CacheError {
    CacheError::Command(err.to_string())
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let millis = ttl.as_millis().max(1) as u64;
        conn.pset_ex::<_, _, ()>(self.prefixed_key(key), value, millis)
            .await
            .map_err(command_error)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self.connection.clone();
        conn.get(self.prefixed_key(key)).await.map_err(command_error)
    }

    async fn invalidate(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.prefixed_key(key))
            .await
            .map_err(command_error)
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let pattern = format!("{}*", self.prefixed_key(prefix));
        let mut cursor = 0u64;
        loop {
            let (next, keys): (u64, Vec<String>) = ::redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(command_error)?;
            if !keys.is_empty() {
                conn.del::<_, ()>(keys).await.map_err(command_error)?;
            }
            cursor = next;
            if cursor == 0 {
                return Ok(());
            }
        }
    }
}
