//! 中继服务（RelayService）
//!
//! 面向外部 RPC 层的三个操作：列出收件人、发布消息、订阅消息流。
//! 传输与请求编解码不在此处，调用方通过 `AppContext` 传入请求标识与取消信号。
//!
use crate::config::RelayConfig;
use crate::context::AppContext;
use crate::error::AppError;
use crate::seed::seed_default_recipients;
use relay_domain::delivery::{DeliveryConfig, DeliveryLoop, Subscription};
use relay_domain::model::{Message, Recipient};
use relay_domain::registry::BackendRegistry;
use relay_domain::storage::StorageBackend;
use relay_domain::value_object::Login;
use std::sync::Arc;

pub struct RelayService {
    backend: Arc<dyn StorageBackend>,
    delivery: DeliveryLoop,
}

impl RelayService {
    pub fn new(backend: Arc<dyn StorageBackend>, config: DeliveryConfig) -> Self {
        let delivery = DeliveryLoop::new(backend.clone(), config);
        Self { backend, delivery }
    }

    /// 按配置解析后端并构建服务
    ///
    /// 后端名称未注册时返回 `RelayError::UnknownBackend`，调用方应中止启动。
    pub async fn bootstrap(config: &RelayConfig, registry: &BackendRegistry) -> Result<Self, AppError> {
        config.validate()?;
        let backend = registry.create(&config.backend, &config.host, config.port)?;
        if config.seed_recipients {
            seed_default_recipients(backend.as_ref()).await?;
        }
        Ok(Self::new(backend, config.delivery_config()))
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// 写入（覆盖）收件人
    pub async fn register_recipient(&self, ctx: &AppContext, recipient: Recipient) -> Result<(), AppError> {
        tracing::debug!(request_id = ?ctx.request_id, login = recipient.login(), "register recipient");
        self.backend.create_recipient(&recipient).await?;
        Ok(())
    }

    pub async fn list_recipients(&self, ctx: &AppContext) -> Result<Vec<Recipient>, AppError> {
        let recipients = self.backend.list_recipients().await?;
        tracing::debug!(request_id = ?ctx.request_id, count = recipients.len(), "recipients listed");
        Ok(recipients)
    }

    /// 发布消息，返回兼容旧调用方的确认文本
    ///
    /// `created_at` 缺省时取当前时间（秒）。
    pub async fn publish(
        &self,
        ctx: &AppContext,
        sender: &str,
        recipient: &str,
        body: &str,
        created_at: Option<i64>,
    ) -> Result<String, AppError> {
        let message = Message::builder()
            .sender_login(sender)
            .recipient_login(recipient)
            .body(body)
            .maybe_created_at(created_at)
            .build();

        let stored = self.backend.create_message(message).await?;
        tracing::info!(
            request_id = ?ctx.request_id,
            sender,
            recipient,
            created_at = stored.created_at(),
            seq = stored.seq(),
            "message published"
        );

        Ok(format!("Done! {recipient} received message from {sender}!"))
    }

    /// 订阅某登录名的消息流
    ///
    /// 流随 `ctx.cancellation` 或自身被丢弃而结束；未回收的消息留待下一次订阅。
    pub fn subscribe(&self, ctx: &AppContext, login: &str) -> Result<Subscription, AppError> {
        let login = Login::new(login)?;
        tracing::debug!(request_id = ?ctx.request_id, %login, "subscribe requested");
        Ok(self.delivery.subscribe(login.into_inner(), &ctx.cancellation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::error::RelayError;

    fn service() -> RelayService {
        let registry = BackendRegistry::with_defaults();
        let backend = registry.create("memory", "localhost", 0).unwrap();
        RelayService::new(backend, DeliveryConfig::default())
    }

    #[tokio::test]
    async fn publish_returns_confirmation() {
        let svc = service();
        let ctx = AppContext::new();
        let status = svc
            .publish(&ctx, "userA", "userB", "Hello, you.", Some(1111))
            .await
            .unwrap();
        assert_eq!(status, "Done! userB received message from userA!");

        let pending = svc.backend().list_pending_messages("userB").await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].created_at(), 1111);
        assert_eq!(pending[0].body(), "Hello, you.");
    }

    #[tokio::test]
    async fn subscribe_rejects_invalid_login() {
        let svc = service();
        match svc.subscribe(&AppContext::new(), "a.b") {
            Err(AppError::Domain(RelayError::InvalidLogin { login })) => assert_eq!(login, "a.b"),
            Err(other) => panic!("unexpected {other:?}"),
            Ok(_) => panic!("invalid login must be rejected"),
        }
    }
}
