//! 记录编解码（codec）
//!
//! 在内存记录与存储字节之间转换，并推导每条记录的存储键：
//! - 编码为带字段名的 JSON，自描述且与 `decode` 互逆；
//! - 字节缺少目标类型的必填字段时返回 `MalformedRecord`；
//! - 键只依赖记录的标识属性，对合法登录名单射。
//!
//! 键格式：
//! - `recipient.<login>`
//! - `message.<recipient>.<sender>.<created_at>`，冲突序号非 0 时追加 `.<seq>`
//!
use crate::error::{RelayError, RelayResult};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub const RECIPIENT_PREFIX: &str = "recipient.";
pub const MESSAGE_PREFIX: &str = "message.";

/// 可持久化记录：声明键前缀并推导自身的存储键
pub trait StoredRecord: Serialize + DeserializeOwned + Send + Sync {
    /// 同类记录共享的键前缀，用于前缀扫描
    const KEY_PREFIX: &'static str;

    /// 记录的存储键
    fn key(&self) -> String;
}

pub fn recipient_key(login: &str) -> String {
    format!("{RECIPIENT_PREFIX}{login}")
}

/// 某个收件人全部待投递消息的扫描前缀（以分隔符结尾，避免 `ann` 匹配到 `anna`）
pub fn message_prefix(recipient_login: &str) -> String {
    format!("{MESSAGE_PREFIX}{recipient_login}.")
}

/// 消息键
///
/// `created_at` 以不补零的十进制写入，键序是字符串序而非数值序：
/// 位数相同的时间戳之间升序成立，跨位数时（如 `999` 与 `1000`）不成立，负数同理。
/// 需要真实时间顺序的调用方应使用 `sort_chronologically`。
pub fn message_key(recipient_login: &str, sender_login: &str, created_at: i64, seq: u32) -> String {
    let base = format!("{MESSAGE_PREFIX}{recipient_login}.{sender_login}.{created_at}");
    if seq == 0 { base } else { format!("{base}.{seq}") }
}

pub fn encode<R: StoredRecord>(record: &R) -> RelayResult<Vec<u8>> {
    Ok(serde_json::to_vec(record)?)
}

/// 解码 `key` 处的字节；`key` 仅用于错误上下文
pub fn decode<R: StoredRecord>(key: &str, bytes: &[u8]) -> RelayResult<R> {
    serde_json::from_slice(bytes).map_err(|e| RelayError::malformed(key, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Message, Recipient};

    fn message(from: &str, to: &str, created_at: i64) -> Message {
        Message::builder()
            .sender_login(from)
            .recipient_login(to)
            .body("Hello, you!")
            .created_at(created_at)
            .build()
    }

    #[test]
    fn recipient_roundtrip_and_key() {
        let r = Recipient::new("user1", "AA AAA");
        let bytes = encode(&r).unwrap();
        let back: Recipient = decode(&r.key(), &bytes).unwrap();
        assert_eq!(back, r);
        assert_eq!(r.key(), "recipient.user1");
    }

    #[test]
    fn message_roundtrip_and_key() {
        let m = message("user1", "user2", 1234);
        let bytes = encode(&m).unwrap();
        let back: Message = decode(&m.key(), &bytes).unwrap();
        assert_eq!(back, m);
        assert_eq!(m.key(), "message.user2.user1.1234");

        let m = m.with_seq(3);
        let back: Message = decode(&m.key(), &encode(&m).unwrap()).unwrap();
        assert_eq!(back, m);
        assert_eq!(m.key(), "message.user2.user1.1234.3");
    }

    #[test]
    fn decode_rejects_missing_fields() {
        let err = decode::<Message>("message.b.a.1", br#"{"sender_login":"a","body":"x"}"#)
            .unwrap_err();
        match err {
            RelayError::MalformedRecord { key, .. } => assert_eq!(key, "message.b.a.1"),
            other => panic!("unexpected {other:?}"),
        }

        let err = decode::<Recipient>("recipient.x", b"not json").unwrap_err();
        assert!(matches!(err, RelayError::MalformedRecord { .. }));
    }

    #[test]
    fn decode_accepts_legacy_field_names() {
        let legacy = br#"{"login_from":"userA","login_to":"userB","body":"hi","created_at":1000}"#;
        let m: Message = decode("message.userB.userA.1000", legacy).unwrap();
        let expected = Message::builder()
            .sender_login("userA")
            .recipient_login("userB")
            .body("hi")
            .created_at(1000)
            .build();
        assert_eq!(m, expected);

        let r: Recipient = decode("recipient.user_A", br#"{"login":"user_A","full_name":"AA AAA"}"#)
            .unwrap();
        assert_eq!(r.display_name(), "AA AAA");
    }

    #[test]
    fn keys_differ_per_identifying_attribute() {
        let base = message("a", "b", 1000);
        assert_ne!(base.key(), message("c", "b", 1000).key());
        assert_ne!(base.key(), message("a", "c", 1000).key());
        assert_ne!(base.key(), message("a", "b", 1001).key());
        assert_ne!(
            Recipient::new("ann", "x").key(),
            Recipient::new("anna", "x").key()
        );
    }

    #[test]
    fn same_second_messages_collide_without_seq() {
        // 同一秒、同一发送者与收件人：仅靠时间戳无法区分，需要 seq 消解
        let first = message("a", "b", 1000);
        let second = Message::builder()
            .sender_login("a")
            .recipient_login("b")
            .body("another body")
            .created_at(1000)
            .build();
        assert_eq!(first.key(), second.key());
        assert_ne!(first.key(), second.with_seq(1).key());
    }

    #[test]
    fn seq_suffix_sorts_before_next_second() {
        let a = message_key("b", "a", 1000, 0);
        let b = message_key("b", "a", 1000, 1);
        let c = message_key("b", "a", 1001, 0);
        assert!(a < b && b < c);
    }

    #[test]
    fn key_order_is_textual_across_digit_counts() {
        assert!(message_key("b", "a", 1000, 0) < message_key("b", "a", 1001, 0));
        assert!(message_key("b", "a", 999, 0) > message_key("b", "a", 1000, 0));
        assert!(message_key("b", "a", -5, 0) < message_key("b", "a", 0, 0));
    }

    #[test]
    fn message_prefix_is_separator_terminated() {
        assert_eq!(message_prefix("ann"), "message.ann.");
        assert!(!message_key("anna", "x", 1, 0).starts_with(&message_prefix("ann")));
    }
}
