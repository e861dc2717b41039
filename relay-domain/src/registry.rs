//! 存储后端注册表（BackendRegistry）
//!
//! 以名称到构造函数的显式映射解耦服务层与具体后端类型：
//! - 启动时一次性注册，按名称精确匹配查找；
//! - 同名重复注册时后注册者生效；
//! - 请求未注册的名称返回 `UnknownBackend`，启动流程应据此中止。
//!
use crate::{
    error::{RelayError, RelayResult},
    kv::MemoryKeyValueStore,
    storage::{KvBackendConfig, KvStorageBackend, StorageBackend},
};
use dashmap::DashMap;
use std::sync::Arc;

/// 内置内存后端名称
pub const MEMORY_BACKEND: &str = "memory";
/// 内置 Postgres 后端名称（特性 `infra-sqlx`）
#[cfg(feature = "infra-sqlx")]
pub const POSTGRES_BACKEND: &str = "postgres";

/// 后端构造函数：接收主机与端口，返回共享的存储后端
pub type BackendConstructor =
    Arc<dyn Fn(&str, u16) -> RelayResult<Arc<dyn StorageBackend>> + Send + Sync>;

pub struct BackendRegistry {
    constructors: DashMap<String, BackendConstructor>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self {
            constructors: DashMap::new(),
        }
    }
}

impl BackendRegistry {
    /// 空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 预注册内置后端（默认配置）
    pub fn with_defaults() -> Self {
        Self::with_builtin(KvBackendConfig::default())
    }

    /// 预注册内置后端，所有内置后端共享给定的键值后端配置
    pub fn with_builtin(config: KvBackendConfig) -> Self {
        let registry = Self::new();

        registry.register(MEMORY_BACKEND, move |_host, _port| {
            let backend = KvStorageBackend::with_config(MemoryKeyValueStore::new(), config);
            Ok(Arc::new(backend) as Arc<dyn StorageBackend>)
        });

        #[cfg(feature = "infra-sqlx")]
        registry.register(POSTGRES_BACKEND, move |host, port| {
            let store = crate::kv::PgKeyValueStore::connect_lazy(host, port);
            let backend = KvStorageBackend::with_config(store, config);
            Ok(Arc::new(backend) as Arc<dyn StorageBackend>)
        });

        registry
    }

    /// 注册后端构造函数；同名覆盖
    pub fn register<F>(&self, name: impl Into<String>, constructor: F)
    where
        F: Fn(&str, u16) -> RelayResult<Arc<dyn StorageBackend>> + Send + Sync + 'static,
    {
        let name = name.into();
        if self
            .constructors
            .insert(name.clone(), Arc::new(constructor))
            .is_some()
        {
            tracing::debug!(backend = %name, "backend constructor replaced");
        }
    }

    /// 按名称构造后端
    pub fn create(&self, name: &str, host: &str, port: u16) -> RelayResult<Arc<dyn StorageBackend>> {
        let Some(constructor) = self.constructors.get(name).map(|c| c.clone()) else {
            tracing::error!(backend = %name, known = ?self.names(), "unknown storage backend");
            return Err(RelayError::UnknownBackend {
                name: name.to_string(),
            });
        };

        let backend = (constructor)(host, port)?;
        tracing::info!(backend = %name, %host, port, "storage backend created");
        Ok(backend)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// 已注册的后端名称（升序）
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
