use super::{KeyValueStore, KvEntry};
use crate::error::RelayResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// 内存版有序键值存储
///
/// 单键写入与删除在锁内完成，满足核心对原语“单键原子性”的全部假设。
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> RelayResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> RelayResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), value);
        Ok(true)
    }

    async fn scan_prefix(&self, prefix: &str) -> RelayResult<Vec<KvEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn get(&self, key: &str) -> RelayResult<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> RelayResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn delete_if(&self, key: &str, expected: &[u8]) -> RelayResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.get(key).map(Vec::as_slice) != Some(expected) {
            return Ok(false);
        }
        entries.remove(key);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_prefix_is_ordered_and_bounded() {
        let kv = MemoryKeyValueStore::new();
        kv.put("message.b.z.1", b"3".to_vec()).await.unwrap();
        kv.put("message.b.a.2", b"2".to_vec()).await.unwrap();
        kv.put("message.b.a.1", b"1".to_vec()).await.unwrap();
        kv.put("message.bb.a.1", b"x".to_vec()).await.unwrap();
        kv.put("recipient.b", b"r".to_vec()).await.unwrap();

        let keys: Vec<String> = kv
            .scan_prefix("message.b.")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["message.b.a.1", "message.b.a.2", "message.b.z.1"]);
    }

    #[tokio::test]
    async fn put_if_absent_and_delete() {
        let kv = MemoryKeyValueStore::new();
        assert!(kv.put_if_absent("k", b"1".to_vec()).await.unwrap());
        assert!(!kv.put_if_absent("k", b"2".to_vec()).await.unwrap());
        assert_eq!(kv.scan_prefix("k").await.unwrap()[0].1, b"1".to_vec());

        assert!(kv.delete("k").await.unwrap());
        assert!(!kv.delete("k").await.unwrap());
        assert!(kv.is_empty().await);
    }

    #[tokio::test]
    async fn delete_if_requires_matching_value() {
        let kv = MemoryKeyValueStore::new();
        kv.put("k", b"new".to_vec()).await.unwrap();

        assert!(!kv.delete_if("k", b"old").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap(), Some(b"new".to_vec()));

        assert!(kv.delete_if("k", b"new").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap(), None);
        assert!(!kv.delete_if("k", b"new").await.unwrap());
    }
}
