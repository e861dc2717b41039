//! 订阅方输出端（MessageSink）
//!
use crate::error::{RelayError, RelayResult};
use crate::model::Message;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// 投递循环的输出端：一次 `emit` 成功即视为消息已移交给订阅方
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn emit(&self, message: &Message) -> RelayResult<()>;
}

/// 后台任务与 `Subscription` 之间通道中的一项
#[derive(Debug)]
pub(crate) enum Handoff {
    /// 待取走的消息；消费方取走时通过 `taken` 回执
    Message {
        message: Message,
        taken: oneshot::Sender<()>,
    },
    /// 投递循环的终止错误
    Failed(RelayError),
}

/// 基于有界通道的输出端
///
/// 消息放入通道后还要等消费方真正从流中取走（回执）才算移交完成；
/// 未被取走就丢弃的消息不会被回收。
#[derive(Clone)]
pub(crate) struct ChannelSink {
    tx: mpsc::Sender<Handoff>,
}

impl ChannelSink {
    pub(crate) fn new(tx: mpsc::Sender<Handoff>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl MessageSink for ChannelSink {
    async fn emit(&self, message: &Message) -> RelayResult<()> {
        let (taken, receipt) = oneshot::channel();
        self.tx
            .send(Handoff::Message {
                message: message.clone(),
                taken,
            })
            .await
            .map_err(|_| RelayError::Emit {
                reason: "subscriber disconnected".to_string(),
            })?;

        receipt.await.map_err(|_| RelayError::Emit {
            reason: "subscriber dropped the message unread".to_string(),
        })
    }
}
