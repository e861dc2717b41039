//! 订阅句柄（Subscription）
//!
//! 后台投递任务的惰性消息流；丢弃即取消，与 `EngineHandle` 的关闭语义一致。
//!
use super::sink::Handoff;
use crate::error::RelayResult;
use crate::model::Message;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

pub struct Subscription {
    inner: ReceiverStream<Handoff>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<Handoff>, token: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            inner: ReceiverStream::new(rx),
            token,
            task: Some(task),
        }
    }

    /// 取消订阅：此后不再轮询、发送或回收，未回收的消息留待下次订阅
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// 取消并等待后台任务结束
    pub async fn shutdown(mut self) {
        self.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(error = %err, "delivery task did not finish cleanly");
            }
        }
    }
}

impl Stream for Subscription {
    type Item = RelayResult<Message>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Handoff::Message { message, taken })) => {
                // 回执后投递循环才会回收该消息
                let _ = taken.send(());
                Poll::Ready(Some(Ok(message)))
            }
            Poll::Ready(Some(Handoff::Failed(err))) => Poll::Ready(Some(Err(err))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
