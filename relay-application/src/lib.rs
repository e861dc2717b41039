//! 消息中继应用层（relay-application）
//!
//! 在核心库之上组装对外服务：
//! - `RelayService`：列出收件人、发布、订阅；
//! - `RelayConfig`：后端选择与投递调优，支持从环境变量读取；
//! - `AppContext`：请求标识与取消信号；
//! - `seed`：默认收件人初始化。
//!
pub mod config;
pub mod context;
pub mod error;
pub mod seed;
pub mod service;

pub use config::RelayConfig;
pub use context::AppContext;
pub use error::AppError;
pub use service::RelayService;
