use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 应用层上下文（Application Context）
///
/// 承载一次调用所需的横切信息：
/// - 请求标识（`request_id`）：用于日志关联；
/// - 取消信号（`cancellation`）：由外部传输层在客户端断开、超时或主动取消时触发，
///   订阅的投递循环据此停止。
///
/// 典型用法：
/// ```rust
/// use relay_application::context::AppContext;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let ctx = AppContext::new().with_cancellation(token.clone());
/// token.cancel();
/// assert!(ctx.cancellation.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    /// 请求标识（可选）
    pub request_id: Option<String>,
    /// 调用方的取消信号
    pub cancellation: CancellationToken,
}

impl AppContext {
    /// 生成带随机请求标识的上下文
    pub fn new() -> Self {
        Self {
            request_id: Some(Uuid::new_v4().to_string()),
            cancellation: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}
