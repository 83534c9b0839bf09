//! Persistent per-user, per-chat and bot-wide data.
//!
//! Entries are created explicitly through [`KeyedStore::get_or_create`]; a [`DataHandle`] is
//! a shared reference to one map, so handlers mutate the container but never replace it.
//! Concurrent non-blocking handlers share handles; each `write()` is exclusive but there is
//! no transaction spanning several calls.

use std::sync::Arc;

use dashmap::DashMap;
use dbot_core::Message;
use serde_json::Value;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use crate::error::MigrationError;

pub type DataMap = serde_json::Map<String, Value>;

/// Shared handle to one data map.
#[derive(Clone, Default, Debug)]
pub struct DataHandle(Arc<RwLock<DataMap>>);

impl DataHandle {
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.0.read().await.get(key).cloned()
    }

    /// Returns the previous value, if any.
    pub async fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.write().await.insert(key.into(), value.into())
    }

    pub async fn remove(&self, key: &str) -> Option<Value> {
        self.0.write().await.remove(key)
    }

    pub async fn read(&self) -> RwLockReadGuard<'_, DataMap> {
        self.0.read().await
    }

    pub async fn write(&self) -> RwLockWriteGuard<'_, DataMap> {
        self.0.write().await
    }

    /// Clones the current contents.
    pub async fn snapshot(&self) -> DataMap {
        self.0.read().await.clone()
    }

    /// Whether both handles point at the same map.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Data maps keyed by user or chat id.
#[derive(Debug, Default)]
pub struct KeyedStore(DashMap<i64, DataHandle>);

impl KeyedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: i64) -> Option<DataHandle> {
        self.0.get(&key).map(|entry| entry.value().clone())
    }

    /// Returns the map for `key`, creating an empty one on first access.
    pub fn get_or_create(&self, key: i64) -> DataHandle {
        self.0.entry(key).or_default().clone()
    }

    /// Removes the entry if present; absent keys are a no-op.
    pub fn drop_key(&self, key: i64) -> Option<DataHandle> {
        self.0.remove(&key).map(|(_, handle)| handle)
    }

    /// Moves the map at `old` to `new`. Nothing happens when `old` has no entry or equals
    /// `new`; an existing entry at `new` is replaced.
    ///
    /// The remove and the insert are separate map operations. A `get_or_create(old)` that
    /// lands between them, or after them, gets a fresh empty map at `old`; the moved
    /// contents are never split. Both keys can live in the same shard, so `old` cannot be
    /// held locked across the insert.
    pub fn migrate(&self, old: i64, new: i64) {
        if old == new {
            return;
        }
        if let Some((_, handle)) = self.0.remove(&old) {
            self.0.insert(new, handle);
        }
    }

    pub fn contains(&self, key: i64) -> bool {
        self.0.contains_key(&key)
    }

    pub fn keys(&self) -> Vec<i64> {
        let mut keys: Vec<i64> = self.0.iter().map(|entry| *entry.key()).collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The three stores an application keeps for its whole lifetime.
#[derive(Debug, Default)]
pub struct ContextStores {
    pub user_data: KeyedStore,
    pub chat_data: KeyedStore,
    pub bot_data: DataHandle,
}

impl ContextStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves chat data from an old chat id to a new one, either from a migration service
    /// message or from an explicit id pair. The two conventions are mutually exclusive.
    pub fn migrate_chat_data(
        &self,
        message: Option<&Message>,
        old_chat_id: Option<i64>,
        new_chat_id: Option<i64>,
    ) -> Result<(), MigrationError> {
        let (old, new) = match (message, old_chat_id, new_chat_id) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => return Err(MigrationError::Conflicting),
            (None, None, None) => return Err(MigrationError::Missing),
            (Some(message), None, None) => migration_ids(message)?,
            (None, Some(old), Some(new)) => (old, new),
            (None, _, _) => return Err(MigrationError::IncompleteIds),
        };
        debug!(old_chat_id = old, new_chat_id = new, "step: migrate chat data");
        self.chat_data.migrate(old, new);
        Ok(())
    }

    pub fn drop_chat_data(&self, chat_id: i64) {
        self.chat_data.drop_key(chat_id);
    }

    pub fn drop_user_data(&self, user_id: i64) {
        self.user_data.drop_key(user_id);
    }
}

/// Ids from a group ↔ supergroup migration message. Either side of the migration may be
/// the message's own chat.
fn migration_ids(message: &Message) -> Result<(i64, i64), MigrationError> {
    match (message.migrate_from_chat_id, message.migrate_to_chat_id) {
        (Some(from), _) => Ok((from, message.chat.id)),
        (None, Some(to)) => Ok((message.chat.id, to)),
        (None, None) => Err(MigrationError::NotMigrationMessage),
    }
}
