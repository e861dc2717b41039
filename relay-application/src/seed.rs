//! 收件人初始化
//!
//! 供管理或演示环境在启动时写入一组固定收件人。
//!
use relay_domain::error::RelayResult;
use relay_domain::model::Recipient;
use relay_domain::storage::StorageBackend;

/// 默认演示收件人：`user_A` ("AA AAA") … `user_D` ("DD DDD")
pub fn default_recipients() -> Vec<Recipient> {
    ['A', 'B', 'C', 'D']
        .into_iter()
        .map(|c| {
            let display = format!("{} {}", c.to_string().repeat(2), c.to_string().repeat(3));
            Recipient::new(format!("user_{c}"), display)
        })
        .collect()
}

/// 写入默认收件人，返回写入条数；重复执行按登录名覆盖
pub async fn seed_default_recipients(backend: &dyn StorageBackend) -> RelayResult<usize> {
    let recipients = default_recipients();
    for recipient in &recipients {
        backend.create_recipient(recipient).await?;
    }
    tracing::info!(count = recipients.len(), "default recipients seeded");
    Ok(recipients.len())
}
