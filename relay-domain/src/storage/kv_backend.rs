use super::StorageBackend;
use crate::{
    codec::{self, StoredRecord, message_prefix},
    error::{RelayError, RelayResult},
    kv::KeyValueStore,
    model::{Message, Recipient},
    value_object::validate_login,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// 通用键值后端配置
#[derive(Clone, Copy, Debug)]
pub struct KvBackendConfig {
    /// 单次原语调用（put/scan/delete）的超时，超时视为后端不可用
    pub op_timeout: Duration,
    /// 同一秒键冲突时最多探测的序号个数
    pub max_seq_probes: u32,
}

impl Default for KvBackendConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(5),
            max_seq_probes: 1024,
        }
    }
}

/// 将记录编解码绑定到任意 `KeyValueStore` 的存储后端
pub struct KvStorageBackend<S> {
    store: S,
    config: KvBackendConfig,
}

impl<S> KvStorageBackend<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S) -> Self {
        Self::with_config(store, KvBackendConfig::default())
    }

    pub fn with_config(store: S, config: KvBackendConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn timed<T>(&self, op: impl Future<Output = RelayResult<T>>) -> RelayResult<T> {
        tokio::time::timeout(self.config.op_timeout, op).await?
    }

    async fn scan<R: StoredRecord>(&self, prefix: &str) -> RelayResult<Vec<R>> {
        let entries = self.timed(self.store.scan_prefix(prefix)).await?;
        entries
            .iter()
            .map(|(key, bytes)| {
                codec::decode::<R>(key, bytes).inspect_err(|err| {
                    tracing::error!(%key, error = %err, "stored record failed to decode");
                })
            })
            .collect()
    }
}

#[async_trait]
impl<S> StorageBackend for KvStorageBackend<S>
where
    S: KeyValueStore,
{
    async fn create_recipient(&self, recipient: &Recipient) -> RelayResult<()> {
        validate_login(recipient.login())?;
        let value = codec::encode(recipient)?;
        self.timed(self.store.put(&recipient.key(), value)).await
    }

    async fn list_recipients(&self) -> RelayResult<Vec<Recipient>> {
        self.scan::<Recipient>(Recipient::KEY_PREFIX).await
    }

    async fn create_message(&self, message: Message) -> RelayResult<Message> {
        validate_login(message.sender_login())?;
        validate_login(message.recipient_login())?;

        let first = message.seq();
        for seq in first..first.saturating_add(self.config.max_seq_probes) {
            let candidate = message.clone().with_seq(seq);
            let key = candidate.key();
            let value = codec::encode(&candidate)?;
            if self.timed(self.store.put_if_absent(&key, value)).await? {
                tracing::debug!(%key, "message stored");
                return Ok(candidate);
            }
            tracing::debug!(%key, "message key taken, probing next seq");
        }

        Err(RelayError::KeySpaceExhausted { key: message.key() })
    }

    async fn list_pending_messages(&self, login: &str) -> RelayResult<Vec<Message>> {
        let login = validate_login(login)?;
        self.scan::<Message>(&message_prefix(login)).await
    }

    async fn retire_message(&self, message: &Message) -> RelayResult<bool> {
        let key = message.key();
        let Some(stored) = self.timed(self.store.get(&key)).await? else {
            return Ok(false);
        };

        // 回收后同一秒的新消息可能复用了该键，只删除与待回收消息相同的记录
        let current: Message = codec::decode(&key, &stored)?;
        if current != *message {
            tracing::debug!(%key, "key now holds a different message, skip retire");
            return Ok(false);
        }
        self.timed(self.store.delete_if(&key, &stored)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKeyValueStore;

    fn backend() -> KvStorageBackend<MemoryKeyValueStore> {
        KvStorageBackend::new(MemoryKeyValueStore::new())
    }

    fn msg(from: &str, to: &str, body: &str, created_at: i64) -> Message {
        Message::builder()
            .sender_login(from)
            .recipient_login(to)
            .body(body)
            .created_at(created_at)
            .build()
    }

    #[tokio::test]
    async fn recipients_are_last_write_wins() {
        let b = backend();
        b.create_recipient(&Recipient::new("userA", "AA AAA")).await.unwrap();
        b.create_recipient(&Recipient::new("userB", "BB BBB")).await.unwrap();
        b.create_recipient(&Recipient::new("userA", "Alice")).await.unwrap();

        let mut list = b.list_recipients().await.unwrap();
        list.sort_by(|a, b| a.login().cmp(b.login()));
        assert_eq!(
            list,
            vec![Recipient::new("userA", "Alice"), Recipient::new("userB", "BB BBB")]
        );
    }

    #[tokio::test]
    async fn same_second_publish_does_not_overwrite() {
        let b = backend();
        let first = b.create_message(msg("a", "b", "one", 1000)).await.unwrap();
        let second = b.create_message(msg("a", "b", "two", 1000)).await.unwrap();
        assert_eq!(first.seq(), 0);
        assert_eq!(second.seq(), 1);

        let pending = b.list_pending_messages("b").await.unwrap();
        let bodies: Vec<&str> = pending.iter().map(Message::body).collect();
        assert_eq!(bodies, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn seq_probing_is_bounded() {
        let b = KvStorageBackend::with_config(
            MemoryKeyValueStore::new(),
            KvBackendConfig {
                max_seq_probes: 2,
                ..Default::default()
            },
        );
        b.create_message(msg("a", "b", "1", 7)).await.unwrap();
        b.create_message(msg("a", "b", "2", 7)).await.unwrap();
        let err = b.create_message(msg("a", "b", "3", 7)).await.unwrap_err();
        assert!(matches!(err, RelayError::KeySpaceExhausted { .. }));
    }

    #[tokio::test]
    async fn pending_messages_follow_key_order() {
        let b = backend();
        b.create_message(msg("zed", "b", "late sender", 1)).await.unwrap();
        b.create_message(msg("amy", "b", "second", 20)).await.unwrap();
        b.create_message(msg("amy", "b", "first", 10)).await.unwrap();

        let pending = b.list_pending_messages("b").await.unwrap();
        let bodies: Vec<&str> = pending.iter().map(Message::body).collect();
        assert_eq!(bodies, vec!["first", "second", "late sender"]);
    }

    #[tokio::test]
    async fn invalid_logins_are_rejected() {
        let b = backend();
        let err = b.create_message(msg("a.b", "c", "x", 1)).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidLogin { .. }));
        let err = b.list_pending_messages("").await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidLogin { .. }));
        let err = b
            .create_recipient(&Recipient::new("x.y", "X"))
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidLogin { .. }));
    }

    #[tokio::test]
    async fn malformed_entry_aborts_listing() {
        let b = backend();
        b.create_recipient(&Recipient::new("ok", "Ok")).await.unwrap();
        b.store().put("recipient.broken", b"{}".to_vec()).await.unwrap();

        match b.list_recipients().await.unwrap_err() {
            RelayError::MalformedRecord { key, .. } => assert_eq!(key, "recipient.broken"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn retire_is_idempotent() {
        let b = backend();
        let m = b.create_message(msg("a", "b", "x", 1)).await.unwrap();
        assert!(b.retire_message(&m).await.unwrap());
        assert!(!b.retire_message(&m).await.unwrap());
        assert!(b.list_pending_messages("b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stale_retire_keeps_message_in_reused_slot() {
        let b = backend();
        let a = b.create_message(msg("x", "y", "A", 1000)).await.unwrap();
        let bm = b.create_message(msg("x", "y", "B", 1000)).await.unwrap();
        assert_eq!((a.seq(), bm.seq()), (0, 1));

        // 第一个订阅回收 A，同一秒的 C 落入空出的 seq 0
        assert!(b.retire_message(&a).await.unwrap());
        let c = b.create_message(msg("x", "y", "C", 1000)).await.unwrap();
        assert_eq!(c.seq(), 0);
        assert_eq!(c.key(), a.key());

        // 并发订阅持有的旧 A 不得删除 C
        assert!(!b.retire_message(&a).await.unwrap());
        let pending = b.list_pending_messages("y").await.unwrap();
        let bodies: Vec<&str> = pending.iter().map(Message::body).collect();
        assert_eq!(bodies, vec!["C", "B"]);
    }

    #[tokio::test]
    async fn retire_matches_records_written_with_legacy_field_names() {
        let b = backend();
        let legacy = br#"{"login_from":"x","login_to":"y","body":"old","created_at":5}"#;
        b.store().put("message.y.x.5", legacy.to_vec()).await.unwrap();

        let pending = b.list_pending_messages("y").await.unwrap();
        assert!(b.retire_message(&pending[0]).await.unwrap());
        assert!(b.store().is_empty().await);
    }
}
