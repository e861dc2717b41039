//! 运行配置（RelayConfig）
//!
//! 后端名称、主机与端口原样传给注册表；其余为投递与存储调用的调优参数。
//! 环境变量：
//! - `RELAY_BACKEND`、`RELAY_BACKEND_HOST`、`RELAY_BACKEND_PORT`
//! - `RELAY_POLL_INTERVAL_MS`、`RELAY_RETRY_BUDGET`、`RELAY_OP_TIMEOUT_MS`
//! - `RELAY_MAX_SUBSCRIBERS`、`RELAY_SEED_RECIPIENTS`
//!
use crate::error::AppError;
use bon::Builder;
use relay_domain::delivery::DeliveryConfig;
use relay_domain::registry::MEMORY_BACKEND;
use relay_domain::storage::KvBackendConfig;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, Builder)]
pub struct RelayConfig {
    /// 注册表中的后端名称
    #[builder(into, default = MEMORY_BACKEND.to_string())]
    pub backend: String,
    #[builder(into, default = "localhost".to_string())]
    pub host: String,
    #[builder(default = 2379)]
    pub port: u16,
    /// 空轮询后的等待间隔
    #[builder(default = Duration::from_secs(1))]
    pub poll_interval: Duration,
    /// 轮询连续失败的重试预算
    #[builder(default = 5)]
    pub retry_budget: u32,
    /// 单次存储调用超时
    #[builder(default = Duration::from_secs(5))]
    pub op_timeout: Duration,
    /// 同时运行的投递循环上限
    #[builder(default = 1024)]
    pub max_subscribers: usize,
    /// 启动时是否写入默认收件人
    #[builder(default = false)]
    pub seed_recipients: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RelayConfig {
    /// 从进程环境变量读取，未设置的项取默认值
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取（便于测试）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Ok(Self {
            backend: lookup("RELAY_BACKEND").unwrap_or(defaults.backend),
            host: lookup("RELAY_BACKEND_HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "RELAY_BACKEND_PORT")?.unwrap_or(defaults.port),
            poll_interval: parse(&lookup, "RELAY_POLL_INTERVAL_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            retry_budget: parse(&lookup, "RELAY_RETRY_BUDGET")?.unwrap_or(defaults.retry_budget),
            op_timeout: parse(&lookup, "RELAY_OP_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.op_timeout),
            max_subscribers: parse(&lookup, "RELAY_MAX_SUBSCRIBERS")?
                .unwrap_or(defaults.max_subscribers),
            seed_recipients: parse(&lookup, "RELAY_SEED_RECIPIENTS")?
                .unwrap_or(defaults.seed_recipients),
        })
    }

    /// 拒绝会导致忙等或永不调度的取值
    pub fn validate(&self) -> Result<(), AppError> {
        if self.poll_interval.is_zero() {
            return Err(AppError::Validation {
                field: "poll_interval",
                reason: "must be greater than zero".into(),
            });
        }
        if self.max_subscribers == 0 {
            return Err(AppError::Validation {
                field: "max_subscribers",
                reason: "must be greater than zero".into(),
            });
        }
        if self.backend.is_empty() {
            return Err(AppError::Validation {
                field: "backend",
                reason: "backend name is empty".into(),
            });
        }
        Ok(())
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        DeliveryConfig {
            poll_interval: self.poll_interval,
            retry_budget: self.retry_budget,
            max_subscribers: self.max_subscribers,
            ..DeliveryConfig::default()
        }
    }

    pub fn backend_config(&self) -> KvBackendConfig {
        KvBackendConfig {
            op_timeout: self.op_timeout,
            ..KvBackendConfig::default()
        }
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, AppError>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| AppError::Config {
                key,
                reason: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}
