//! 中继核心统一错误定义
//!
//! 覆盖后端注册、键值存储 I/O、记录编解码、登录名校验与投递等最小必要集合，
//! 便于在应用层统一转换为 `AppError`。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RelayError {
    // --- 注册表 ---
    #[error("unknown backend: {name}")]
    UnknownBackend { name: String },

    // --- 存储/键值原语 ---
    #[error("backend unavailable: {reason}")]
    BackendUnavailable { reason: String },
    #[error("key space exhausted: key={key}")]
    KeySpaceExhausted { key: String },

    // --- 编解码 ---
    #[error("malformed record: key={key}, reason={reason}")]
    MalformedRecord { key: String, reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 领域规则 ---
    #[error("invalid login: {login:?}")]
    InvalidLogin { login: String },

    // --- 投递 ---
    #[error("emit failed: {reason}")]
    Emit { reason: String },
}

impl RelayError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        RelayError::BackendUnavailable {
            reason: reason.into(),
        }
    }

    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        RelayError::MalformedRecord {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// 是否为可在轮询粒度重试的错误（仅限存储 I/O）
    pub fn is_retryable(&self) -> bool {
        matches!(self, RelayError::BackendUnavailable { .. })
    }
}

/// 统一 Result 类型别名
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for RelayError {
    fn from(err: sqlx::Error) -> Self {
        RelayError::BackendUnavailable {
            reason: err.to_string(),
        }
    }
}

impl From<tokio::time::error::Elapsed> for RelayError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        RelayError::BackendUnavailable {
            reason: "operation timed out".to_string(),
        }
    }
}
