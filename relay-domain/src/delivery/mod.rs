//! 投递子系统（delivery）
//!
//! 实现 Subscribe 协议：对某个收件人反复轮询待投递消息，逐条发送给订阅方后回收。
//! - `MessageSink`：订阅方输出端的抽象；
//! - `DeliveryLoop`：显式状态机（Polling / Emitting / Cancelled），可被取消令牌随时中断；
//! - `Subscription`：由后台任务驱动的惰性消息流，丢弃即取消。
//!
//! 语义为“至少一次”：发送与回收是两个顺序步骤，二者之间被中断的消息会在下一次订阅时重投；
//! 同一登录名的两个并发订阅也可能各自取到同一条消息。
//!
pub mod engine;
pub mod sink;
pub mod subscription;

pub use engine::{DeliveryConfig, DeliveryLoop, DeliveryReport};
pub use sink::MessageSink;
pub use subscription::Subscription;
