use super::{KeyValueStore, KvEntry};
use crate::error::RelayResult;
use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use tokio::sync::OnceCell;

const CREATE_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS relay_kv (
    key TEXT COLLATE "C" PRIMARY KEY,
    value BYTEA NOT NULL
)"#;

/// 基于 Postgres 的有序键值存储
///
/// 键列使用 `C` 排序规则，保证 `ORDER BY key` 与字节序一致；表在首次访问时创建。
pub struct PgKeyValueStore {
    pool: PgPool,
    schema: OnceCell<()>,
}

impl PgKeyValueStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            schema: OnceCell::new(),
        }
    }

    /// 以主机与端口惰性建立连接池；用户名、密码、库名沿用 `PG*` 环境变量
    pub fn connect_lazy(host: &str, port: u16) -> Self {
        let options = PgConnectOptions::new().host(host).port(port);
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .connect_lazy_with(options);
        Self::new(pool)
    }

    async fn ensure_schema(&self) -> RelayResult<()> {
        self.schema
            .get_or_try_init(|| async {
                sqlx::query(CREATE_TABLE)
                    .execute(&self.pool)
                    .await
                    .map(|_| ())
            })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for PgKeyValueStore {
    async fn put(&self, key: &str, value: Vec<u8>) -> RelayResult<()> {
        self.ensure_schema().await?;
        sqlx::query(
            "INSERT INTO relay_kv (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn put_if_absent(&self, key: &str, value: Vec<u8>) -> RelayResult<bool> {
        self.ensure_schema().await?;
        let result = sqlx::query(
            "INSERT INTO relay_kv (key, value) VALUES ($1, $2) ON CONFLICT (key) DO NOTHING",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn scan_prefix(&self, prefix: &str) -> RelayResult<Vec<KvEntry>> {
        self.ensure_schema().await?;
        let rows: Vec<(String, Vec<u8>)> = sqlx::query_as(
            "SELECT key, value FROM relay_kv WHERE starts_with(key, $1) ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn get(&self, key: &str) -> RelayResult<Option<Vec<u8>>> {
        self.ensure_schema().await?;
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM relay_kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn delete(&self, key: &str) -> RelayResult<bool> {
        self.ensure_schema().await?;
        let result = sqlx::query("DELETE FROM relay_kv WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_if(&self, key: &str, expected: &[u8]) -> RelayResult<bool> {
        self.ensure_schema().await?;
        let result = sqlx::query("DELETE FROM relay_kv WHERE key = $1 AND value = $2")
            .bind(key)
            .bind(expected)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
