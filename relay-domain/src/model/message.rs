use crate::codec::{MESSAGE_PREFIX, StoredRecord, message_key};
use bon::Builder;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 待投递消息
///
/// 消息在存储中存在当且仅当它尚未被投递并回收；没有单独的“已投递”标记。
/// `seq` 用于消除同一秒内同一发送者发往同一收件人的键冲突，常规情况下为 0。
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Message {
    /// 发送者登录名
    #[builder(into)]
    #[serde(alias = "login_from")]
    sender_login: String,
    /// 收件人登录名
    #[builder(into)]
    #[serde(alias = "login_to")]
    recipient_login: String,
    /// 消息正文
    #[builder(into)]
    body: String,
    /// 创建时间（秒级 Unix 时间戳），未指定时取构建时刻
    #[builder(default = Utc::now().timestamp())]
    created_at: i64,
    /// 键冲突消解序号，由存储后端在写入时分配
    #[builder(default)]
    #[serde(default, skip_serializing_if = "is_zero")]
    seq: u32,
}

fn is_zero(seq: &u32) -> bool {
    *seq == 0
}

impl Message {
    pub fn sender_login(&self) -> &str {
        &self.sender_login
    }

    pub fn recipient_login(&self) -> &str {
        &self.recipient_login
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// 返回替换了冲突序号的副本（存储后端探测空闲键时使用）
    pub fn with_seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }
}

impl StoredRecord for Message {
    const KEY_PREFIX: &'static str = MESSAGE_PREFIX;

    fn key(&self) -> String {
        message_key(
            &self.recipient_login,
            &self.sender_login,
            self.created_at,
            self.seq,
        )
    }
}

/// 按到达时间排序
///
/// 存储后端按键序返回（先发送者、后时间），需要真实时间顺序的调用方可在客户端排序。
pub fn sort_chronologically(messages: &mut [Message]) {
    messages.sort_by(|a, b| {
        (a.created_at, a.seq, &a.sender_login).cmp(&(b.created_at, b.seq, &b.sender_login))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(from: &str, created_at: i64) -> Message {
        Message::builder()
            .sender_login(from)
            .recipient_login("userB")
            .body("hi")
            .created_at(created_at)
            .build()
    }

    #[test]
    fn builder_assigns_created_at_when_missing() {
        let before = Utc::now().timestamp();
        let m = Message::builder()
            .sender_login("userA")
            .recipient_login("userB")
            .body("hi")
            .build();
        assert!(m.created_at() >= before);
        assert_eq!(m.seq(), 0);
    }

    #[test]
    fn chronological_sort_ignores_sender_order() {
        let mut list = vec![msg("alice", 30), msg("bob", 10), msg("alice", 20)];
        sort_chronologically(&mut list);
        let stamps: Vec<i64> = list.iter().map(Message::created_at).collect();
        assert_eq!(stamps, vec![10, 20, 30]);
        assert_eq!(list[0].sender_login(), "bob");
    }
}
