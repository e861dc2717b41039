//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!
use crate::error::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 存储键中各段之间的分隔符
pub const KEY_SEPARATOR: char = '.';

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 登录名
///
/// 登录名会作为变量段嵌入存储键（`recipient.<login>`、`message.<to>.<from>...`），
/// 因此必须非空且不得包含分隔符 `.`，否则前缀扫描会串到其他收件人的数据。
///
/// # 示例
///
/// ```
/// use relay_domain::value_object::Login;
///
/// assert!(Login::new("userA").is_ok());
/// assert!(Login::new("").is_err());
/// assert!(Login::new("user.A").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Login(String);

impl Login {
    pub fn new(value: impl Into<String>) -> RelayResult<Self> {
        let login = Self(value.into());
        login.validate()?;
        Ok(login)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl ValueObject for Login {
    type Error = RelayError;

    fn validate(&self) -> Result<(), Self::Error> {
        validate_login(&self.0).map(|_| ())
    }
}

impl AsRef<str> for Login {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 校验登录名，返回原始字符串切片便于直接拼接键
pub fn validate_login(login: &str) -> RelayResult<&str> {
    if login.is_empty() || login.contains(KEY_SEPARATOR) {
        return Err(RelayError::InvalidLogin {
            login: login.to_string(),
        });
    }
    Ok(login)
}
