//! 领域模型（model）
//!
//! 中继系统仅有两类持久化记录：
//! - `Recipient`：可寻址的收件人，以登录名为主键；
//! - `Message`：待投递消息，存在即表示尚未投递并回收。
//!
mod message;
mod recipient;

pub use message::{Message, sort_chronologically};
pub use recipient::Recipient;
