//! 投递循环（DeliveryLoop）
//!
//! 单个订阅的长驻控制循环，显式状态机：
//! - `Polling`：列出待投递消息；非空转入 `Emitting`，为空则等待一个轮询间隔；
//! - `Emitting`：逐条先发送、后回收，处理完整批后回到 `Polling`；
//! - `Cancelled`：终态，不再轮询、发送或回收。
//!
//! 取消令牌在每次轮询开始、等待期间、每次存储调用与发送期间、以及发送与回收之间都会检查。
//! 轮询遇到存储不可用时按间隔重试，连续失败超过预算后以该错误结束订阅。
//!
use super::sink::{ChannelSink, Handoff, MessageSink};
use super::subscription::Subscription;
use crate::codec::StoredRecord;
use crate::error::RelayResult;
use crate::model::Message;
use crate::storage::StorageBackend;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

/// 投递循环配置
#[derive(Clone, Copy, Debug)]
pub struct DeliveryConfig {
    /// 空轮询后的等待间隔
    pub poll_interval: Duration,
    /// 轮询连续失败的最大重试次数，超过后结束订阅
    pub retry_budget: u32,
    /// 订阅流的通道容量；消息须被消费方取走后才会回收
    pub buffer: usize,
    /// 同时运行的投递循环上限，超出的订阅排队等待
    pub max_subscribers: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            retry_budget: 5,
            buffer: 1,
            max_subscribers: 1024,
        }
    }
}

/// 一次投递循环结束时的统计
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub polls: usize,
    pub emitted: usize,
    pub retired: usize,
}

#[derive(Debug)]
enum DeliveryState {
    Polling,
    Emitting(VecDeque<Message>),
    Cancelled,
}

#[derive(Clone)]
pub struct DeliveryLoop {
    backend: Arc<dyn StorageBackend>,
    config: DeliveryConfig,
    slots: Arc<Semaphore>,
}

impl DeliveryLoop {
    pub fn new(backend: Arc<dyn StorageBackend>, config: DeliveryConfig) -> Self {
        let slots = Arc::new(Semaphore::new(config.max_subscribers.max(1)));
        Self {
            backend,
            config,
            slots,
        }
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// 在当前任务中驱动投递循环，直到取消或出错
    ///
    /// 正常取消返回 `Ok(report)`；发送/回收失败、不可重试的错误或重试耗尽时返回错误。
    pub async fn run(
        &self,
        login: &str,
        sink: &dyn MessageSink,
        token: &CancellationToken,
    ) -> RelayResult<DeliveryReport> {
        let mut report = DeliveryReport::default();
        let mut failures: u32 = 0;
        let mut state = DeliveryState::Polling;

        loop {
            state = match state {
                DeliveryState::Cancelled => {
                    tracing::debug!(%login, ?report, "delivery loop cancelled");
                    return Ok(report);
                }
                DeliveryState::Polling => {
                    if token.is_cancelled() {
                        DeliveryState::Cancelled
                    } else {
                        report.polls += 1;
                        match cancellable(token, self.backend.list_pending_messages(login)).await {
                            None => DeliveryState::Cancelled,
                            Some(Ok(batch)) => {
                                failures = 0;
                                if batch.is_empty() {
                                    self.wait(token).await
                                } else {
                                    tracing::debug!(%login, count = batch.len(), "pending messages fetched");
                                    DeliveryState::Emitting(batch.into())
                                }
                            }
                            Some(Err(err)) if err.is_retryable() => {
                                failures += 1;
                                if failures > self.config.retry_budget {
                                    tracing::error!(%login, attempts = failures, error = %err, "poll retry budget exhausted");
                                    return Err(err);
                                }
                                tracing::warn!(%login, attempt = failures, error = %err, "poll failed, retrying");
                                self.wait(token).await
                            }
                            Some(Err(err)) => {
                                tracing::error!(%login, error = %err, "poll failed");
                                return Err(err);
                            }
                        }
                    }
                }
                DeliveryState::Emitting(mut batch) => match batch.pop_front() {
                    None => DeliveryState::Polling,
                    Some(message) => {
                        if self.emit_and_retire(&message, sink, token, &mut report).await? {
                            DeliveryState::Emitting(batch)
                        } else {
                            DeliveryState::Cancelled
                        }
                    }
                },
            };
        }
    }

    /// 发送一条消息并回收；被取消时返回 `Ok(false)`，消息保留在存储中等待重投
    async fn emit_and_retire(
        &self,
        message: &Message,
        sink: &dyn MessageSink,
        token: &CancellationToken,
        report: &mut DeliveryReport,
    ) -> RelayResult<bool> {
        match cancellable(token, sink.emit(message)).await {
            None => return Ok(false),
            Some(Err(err)) => {
                tracing::warn!(key = %message.key(), error = %err, "emit failed");
                return Err(err);
            }
            Some(Ok(())) => report.emitted += 1,
        }

        if token.is_cancelled() {
            return Ok(false);
        }

        match cancellable(token, self.backend.retire_message(message)).await {
            None => Ok(false),
            Some(Ok(existed)) => {
                if existed {
                    report.retired += 1;
                } else {
                    tracing::debug!(key = %message.key(), "message already retired or key reused");
                }
                Ok(true)
            }
            Some(Err(err)) => {
                tracing::warn!(error = %err, "retire failed");
                Err(err)
            }
        }
    }

    async fn wait(&self, token: &CancellationToken) -> DeliveryState {
        tokio::select! {
            biased;
            _ = token.cancelled() => DeliveryState::Cancelled,
            _ = tokio::time::sleep(self.config.poll_interval) => DeliveryState::Polling,
        }
    }

    /// 启动后台投递任务，返回惰性消息流
    ///
    /// 消息在消费方从流中取走之后才会回收，仍留在通道里的消息随订阅丢弃而保留在存储中。
    /// 流在循环出错时先产出该错误再结束；丢弃 `Subscription` 或取消 `token` 都会终止循环。
    /// 同时运行的循环数受 `max_subscribers` 限制，超出时在后台排队。
    pub fn subscribe(&self, login: impl Into<String>, token: &CancellationToken) -> Subscription {
        let login = login.into();
        let token = token.child_token();
        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));

        let this = self.clone();
        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = task_token.cancelled() => return,
                permit = this.slots.clone().acquire_owned() => match permit {
                    Ok(p) => p,
                    Err(_) => return,
                },
            };

            tracing::info!(%login, "subscription started");
            let sink = ChannelSink::new(tx.clone());
            match this.run(&login, &sink, &task_token).await {
                Ok(report) => tracing::info!(%login, ?report, "subscription ended"),
                Err(err) => {
                    tracing::warn!(%login, error = %err, "subscription failed");
                    let _ = tx.send(Handoff::Failed(err)).await;
                }
            }
        });

        Subscription::new(rx, token, task)
    }
}

async fn cancellable<T>(token: &CancellationToken, op: impl Future<Output = T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        out = op => Some(out),
    }
}
