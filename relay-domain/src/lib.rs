//! 消息中继核心库（relay-domain）
//!
//! 提供消息存储与投递核心：
//! - 记录模型（`model`）与编解码、存储键推导（`codec`）
//! - 有序键值原语（`kv`）：写入、前缀扫描、删除
//! - 存储后端协议及其通用键值实现（`storage`）
//! - 后端注册表（`registry`）：按名称解析具体后端
//! - 投递循环（`delivery`）：至少一次语义的轮询投递
//!
//! 本 crate 不绑定任何传输层与具体数据库协议，内存后端开箱即用，
//! Postgres 后端通过 `infra-sqlx` 特性启用。
//!
//! 典型用法：
//! 1. 通过 `BackendRegistry::with_defaults()` 按名称创建后端；
//! 2. 使用 `StorageBackend::create_message` 发布消息；
//! 3. 使用 `DeliveryLoop::subscribe` 获取某收件人的消息流，丢弃流即取消。
//!
pub mod codec;
pub mod delivery;
pub mod error;
pub mod kv;
pub mod model;
pub mod registry;
pub mod storage;
pub mod value_object;

pub use delivery::{DeliveryConfig, DeliveryLoop, DeliveryReport, MessageSink, Subscription};
pub use error::{RelayError, RelayResult};
pub use model::{Message, Recipient};
pub use registry::BackendRegistry;
pub use storage::StorageBackend;
