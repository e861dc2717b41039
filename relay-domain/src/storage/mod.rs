//! 存储后端（storage）
//!
//! 定义中继核心所需的领域存储协议，并提供将编解码绑定到任意键值原语的通用实现：
//! - 收件人的创建（覆盖）与列举；
//! - 消息的创建、按收件人列举待投递消息、投递后回收（删除）。
//!
//! 投递循环与服务层只依赖 `StorageBackend`，具体后端通过注册表在启动时解析。
//!
mod kv_backend;

pub use kv_backend::{KvBackendConfig, KvStorageBackend};

use crate::{
    error::RelayResult,
    model::{Message, Recipient},
};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// 写入（覆盖）收件人
    async fn create_recipient(&self, recipient: &Recipient) -> RelayResult<()>;

    /// 列出全部收件人（顺序无意义）；任一条目解码失败则整体失败
    async fn list_recipients(&self) -> RelayResult<Vec<Recipient>>;

    /// 写入消息，返回最终落盘的消息（含分配的冲突序号）
    async fn create_message(&self, message: Message) -> RelayResult<Message>;

    /// 列出某收件人的待投递消息，按键序（发送者、时间升序）
    async fn list_pending_messages(&self, login: &str) -> RelayResult<Vec<Message>>;

    /// 回收（删除）已投递消息，幂等；键已被同一秒的新消息复用时不删除。返回是否删除
    async fn retire_message(&self, message: &Message) -> RelayResult<bool>;
}

#[async_trait]
impl<T> StorageBackend for Arc<T>
where
    T: StorageBackend + ?Sized,
{
    async fn create_recipient(&self, recipient: &Recipient) -> RelayResult<()> {
        (**self).create_recipient(recipient).await
    }

    async fn list_recipients(&self) -> RelayResult<Vec<Recipient>> {
        (**self).list_recipients().await
    }

    async fn create_message(&self, message: Message) -> RelayResult<Message> {
        (**self).create_message(message).await
    }

    async fn list_pending_messages(&self, login: &str) -> RelayResult<Vec<Message>> {
        (**self).list_pending_messages(login).await
    }

    async fn retire_message(&self, message: &Message) -> RelayResult<bool> {
        (**self).retire_message(message).await
    }
}
