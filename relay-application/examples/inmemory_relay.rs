use futures_util::StreamExt;
use relay_application::{AppContext, RelayConfig, RelayService};
use relay_domain::registry::BackendRegistry;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = RelayConfig::builder()
        .poll_interval(Duration::from_millis(200))
        .seed_recipients(true)
        .build();
    let registry = BackendRegistry::with_builtin(config.backend_config());
    let service = RelayService::bootstrap(&config, &registry).await?;

    let ctx = AppContext::new();
    for recipient in service.list_recipients(&ctx).await? {
        println!("{} ({})", recipient.login(), recipient.display_name());
    }

    let status = service
        .publish(&ctx, "user_A", "user_B", "First message.", None)
        .await?;
    println!("{status}");

    let mut messages = service.subscribe(&ctx, "user_B")?;
    if let Ok(Some(message)) = tokio::time::timeout(Duration::from_secs(2), messages.next()).await {
        let message = message?;
        println!(
            "{} -> {} @{}: {}",
            message.sender_login(),
            message.recipient_login(),
            message.created_at(),
            message.body()
        );
    }

    // 未注册的后端 -> 启动失败
    let bad = RelayConfig::builder().backend("mongo").build();
    if let Err(err) = RelayService::bootstrap(&bad, &registry).await {
        eprintln!("startup aborted as expected: {err}");
    }

    messages.shutdown().await;
    Ok(())
}
