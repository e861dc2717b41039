use crate::codec::{RECIPIENT_PREFIX, StoredRecord, recipient_key};
use bon::Builder;
use serde::{Deserialize, Serialize};

/// 收件人：以 `login` 唯一标识，重复创建同一登录名时后写覆盖先写
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct Recipient {
    /// 登录名（主键）
    #[builder(into)]
    login: String,
    /// 展示名称，可重复
    #[builder(into)]
    #[serde(alias = "full_name")]
    display_name: String,
}

impl Recipient {
    pub fn new(login: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            display_name: display_name.into(),
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl StoredRecord for Recipient {
    const KEY_PREFIX: &'static str = RECIPIENT_PREFIX;

    fn key(&self) -> String {
        recipient_key(&self.login)
    }
}
