//! 键值原语（kv）
//!
//! 核心只依赖一个有序键值存储的最小能力集：写入、按前缀有序扫描、删除。
//! 另有“仅当不存在时写入”，用于在不覆盖已有消息的前提下分配冲突序号；
//! 以及“值相等时删除”，保证回收不会误删复用了同一键的新消息。
//!
//! 具体实现：
//! - `MemoryKeyValueStore`：基于 `BTreeMap` 的内存实现，用于测试与本地运行；
//! - `PgKeyValueStore`（特性 `infra-sqlx`）：基于 Postgres 表的实现。
//!
mod memory;
#[cfg(feature = "infra-sqlx")]
mod postgres;

pub use memory::MemoryKeyValueStore;
#[cfg(feature = "infra-sqlx")]
pub use postgres::PgKeyValueStore;

use crate::error::RelayResult;
use async_trait::async_trait;
use std::sync::Arc;

/// 前缀扫描结果中的一项
pub type KvEntry = (String, Vec<u8>);

/// 有序键值存储原语
///
/// 所有方法的 I/O 失败都应映射为 `RelayError::BackendUnavailable`。
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// 写入（覆盖）
    async fn put(&self, key: &str, value: Vec<u8>) -> RelayResult<()>;

    /// 仅当键不存在时写入，返回是否写入成功
    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> RelayResult<bool>;

    /// 返回所有以 `prefix` 开头的条目，按键的字节序升序
    async fn scan_prefix(&self, prefix: &str) -> RelayResult<Vec<KvEntry>>;

    /// 读取单个键
    async fn get(&self, key: &str) -> RelayResult<Option<Vec<u8>>>;

    /// 删除键，返回删除前键是否存在；删除不存在的键不是错误
    async fn delete(&self, key: &str) -> RelayResult<bool>;

    /// 仅当当前值与 `expected` 逐字节相等时删除，返回是否删除
    async fn delete_if(&self, key: &str, expected: &[u8]) -> RelayResult<bool>;
}

#[async_trait]
impl<T> KeyValueStore for Arc<T>
where
    T: KeyValueStore + ?Sized,
{
    async fn put(&self, key: &str, value: Vec<u8>) -> RelayResult<()> {
        (**self).put(key, value).await
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> RelayResult<bool> {
        (**self).put_if_absent(key, value).await
    }

    async fn scan_prefix(&self, prefix: &str) -> RelayResult<Vec<KvEntry>> {
        (**self).scan_prefix(prefix).await
    }

    async fn get(&self, key: &str) -> RelayResult<Option<Vec<u8>>> {
        (**self).get(key).await
    }

    async fn delete(&self, key: &str) -> RelayResult<bool> {
        (**self).delete(key).await
    }

    async fn delete_if(&self, key: &str, expected: &[u8]) -> RelayResult<bool> {
        (**self).delete_if(key, expected).await
    }
}
