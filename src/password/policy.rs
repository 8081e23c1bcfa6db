//! 密码策略模块
//!
//! 长度上下限、复杂度要求以及注册方式的加固规则。
//!
//! bcrypt 只处理前 72 个字节，因此长度上限至少应放宽到 72，
//! 更长的输入直接拒绝，而不是被静默截断。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::primitive::BCRYPT_MAX_PASSWORD_BYTES;
use crate::error::{Error, Result, ValidationError};

/// 要求复杂密码时的最小长度
pub const COMPLEX_MIN_LENGTH: usize = 8;

/// 密码策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    /// 最小长度（字符）
    pub min_length: usize,
    /// 最大长度（字符）
    pub max_length: usize,
    /// 是否要求复杂密码
    pub require_complex: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: COMPLEX_MIN_LENGTH,
            max_length: BCRYPT_MAX_PASSWORD_BYTES,
            require_complex: true,
        }
    }
}

impl PasswordPolicy {
    /// 宿主常见的出厂策略：6 到 30 个字符，不要求复杂度
    pub fn relaxed() -> Self {
        Self {
            min_length: 6,
            max_length: 30,
            require_complex: false,
        }
    }

    /// 设置最小长度
    pub fn with_min_length(mut self, length: usize) -> Self {
        self.min_length = length;
        self
    }

    /// 设置最大长度
    pub fn with_max_length(mut self, length: usize) -> Self {
        self.max_length = length;
        self
    }

    /// 设置是否要求复杂密码
    pub fn with_complex(mut self, required: bool) -> Self {
        self.require_complex = required;
        self
    }

    /// 加固后的策略
    ///
    /// 打开复杂度要求，最小长度至少 8，最大长度至少 72；已经更严格的值保持不变。
    ///
    /// ```rust
    /// use hashcost::password::PasswordPolicy;
    ///
    /// let hardened = PasswordPolicy::relaxed().harden();
    /// assert!(hardened.require_complex);
    /// assert_eq!(hardened.min_length, 8);
    /// assert_eq!(hardened.max_length, 72);
    /// ```
    pub fn harden(&self) -> Self {
        Self {
            min_length: self.min_length.max(COMPLEX_MIN_LENGTH),
            max_length: self.max_length.max(BCRYPT_MAX_PASSWORD_BYTES),
            require_complex: true,
        }
    }

    /// 按策略校验密码
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashcost::password::PasswordPolicy;
    ///
    /// let policy = PasswordPolicy::default();
    /// assert!(policy.validate("weak").is_err());
    /// assert!(policy.validate("Str0ngPassw0rd").is_ok());
    /// ```
    pub fn validate(&self, password: &str) -> Result<()> {
        let len = password.chars().count();

        if len < self.min_length {
            return Err(Error::Validation(ValidationError::PasswordTooShort {
                min_length: self.min_length,
                actual: len,
            }));
        }

        if len > self.max_length {
            return Err(Error::Validation(ValidationError::PasswordTooLong {
                max_length: self.max_length,
                actual: len,
            }));
        }

        if password.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Err(Error::Validation(ValidationError::PasswordTooManyBytes {
                max_bytes: BCRYPT_MAX_PASSWORD_BYTES,
                actual: password.len(),
            }));
        }

        if self.require_complex {
            check_complexity(password, len)?;
        }

        Ok(())
    }
}

/// 密码包含的字符类别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterClasses {
    /// 包含小写字母
    pub has_lowercase: bool,
    /// 包含大写字母
    pub has_uppercase: bool,
    /// 包含数字
    pub has_digit: bool,
    /// 包含符号
    pub has_symbol: bool,
}

impl CharacterClasses {
    /// 分析密码包含的字符类别
    pub fn of(password: &str) -> Self {
        password.chars().fold(Self::default(), |mut classes, c| {
            if c.is_lowercase() {
                classes.has_lowercase = true;
            } else if c.is_uppercase() {
                classes.has_uppercase = true;
            } else if c.is_ascii_digit() {
                classes.has_digit = true;
            } else if !c.is_alphanumeric() && !c.is_whitespace() {
                classes.has_symbol = true;
            }
            classes
        })
    }
}

fn check_complexity(password: &str, len: usize) -> Result<()> {
    if len < COMPLEX_MIN_LENGTH {
        return Err(Error::Validation(ValidationError::PasswordTooShort {
            min_length: COMPLEX_MIN_LENGTH,
            actual: len,
        }));
    }

    let classes = CharacterClasses::of(password);
    let missing = if !classes.has_uppercase {
        Some("must contain at least one uppercase letter")
    } else if !classes.has_lowercase {
        Some("must contain at least one lowercase letter")
    } else if !(classes.has_digit || classes.has_symbol) {
        Some("must contain at least one digit or symbol")
    } else {
        None
    };

    match missing {
        Some(msg) => Err(Error::Validation(ValidationError::PasswordTooWeak(
            msg.to_string(),
        ))),
        None => Ok(()),
    }
}

// ============================================================================
// 注册方式
// ============================================================================

/// 新用户的注册方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationMode {
    /// 立即激活
    Instant,
    /// 邮件验证
    Verify,
    /// 管理员激活
    Admin,
    /// 邮件验证并由管理员激活
    Both,
    /// 把随机密码明文发给用户
    #[serde(rename = "randompass")]
    RandomPassword,
}

impl RegistrationMode {
    /// 全部注册方式
    pub const ALL: [RegistrationMode; 5] = [
        RegistrationMode::Instant,
        RegistrationMode::Verify,
        RegistrationMode::RandomPassword,
        RegistrationMode::Admin,
        RegistrationMode::Both,
    ];

    /// 宿主使用的代码
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationMode::Instant => "instant",
            RegistrationMode::Verify => "verify",
            RegistrationMode::Admin => "admin",
            RegistrationMode::Both => "both",
            RegistrationMode::RandomPassword => "randompass",
        }
    }

    /// 是否通过不可信渠道明文投递密码
    pub fn is_plaintext_delivery(&self) -> bool {
        matches!(self, RegistrationMode::RandomPassword)
    }

    /// 加固后的注册方式：随机密码改为邮件验证，其余不变
    pub fn hardened(self) -> Self {
        if self.is_plaintext_delivery() {
            RegistrationMode::Verify
        } else {
            self
        }
    }

    /// 加固后仍可选择的注册方式
    pub fn hardened_options() -> impl Iterator<Item = RegistrationMode> {
        Self::ALL.into_iter().filter(|m| !m.is_plaintext_delivery())
    }

    /// 解析以逗号分隔的注册方式列表
    ///
    /// ```rust
    /// use hashcost::password::RegistrationMode;
    ///
    /// let modes = RegistrationMode::parse_list("instant, verify").unwrap();
    /// assert_eq!(modes, vec![RegistrationMode::Instant, RegistrationMode::Verify]);
    /// assert_eq!(RegistrationMode::format_list(modes), "instant,verify");
    /// ```
    pub fn parse_list(s: &str) -> Result<Vec<RegistrationMode>> {
        s.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(str::parse)
            .collect()
    }

    /// 把注册方式列表格式化为逗号分隔的代码
    pub fn format_list(modes: impl IntoIterator<Item = RegistrationMode>) -> String {
        modes
            .into_iter()
            .map(|m| m.code())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for RegistrationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RegistrationMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.code() == s)
            .ok_or_else(|| Error::invalid_config("registration_mode", format!("unknown mode '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PasswordPolicy::default();
        assert_eq!(policy.min_length, 8);
        assert_eq!(policy.max_length, 72);
        assert!(policy.require_complex);
    }

    #[test]
    fn test_too_short_and_too_long() {
        let policy = PasswordPolicy::relaxed();

        assert!(matches!(
            policy.validate("abc"),
            Err(Error::Validation(ValidationError::PasswordTooShort {
                min_length: 6,
                actual: 3
            }))
        ));
        assert!(matches!(
            policy.validate(&"a".repeat(31)),
            Err(Error::Validation(ValidationError::PasswordTooLong {
                max_length: 30,
                actual: 31
            }))
        ));
        assert!(policy.validate("abcdef").is_ok());
    }

    #[test]
    fn test_byte_limit_applies_within_char_limit() {
        let policy = PasswordPolicy::default()
            .with_complex(false)
            .with_max_length(200);

        // 30 个字符，90 字节
        let password = "密".repeat(30);
        assert!(matches!(
            policy.validate(&password),
            Err(Error::Validation(ValidationError::PasswordTooManyBytes { .. }))
        ));
    }

    #[test]
    fn test_complexity() {
        let policy = PasswordPolicy::default();

        assert!(policy.validate("alllowercase1").is_err());
        assert!(policy.validate("ALLUPPERCASE1").is_err());
        assert!(policy.validate("NoDigitsHere").is_err());
        assert!(policy.validate("WithDigit1").is_ok());
        assert!(policy.validate("With-Symbol").is_ok());
    }

    #[test]
    fn test_complex_requires_eight_chars_even_if_min_lower() {
        let policy = PasswordPolicy::default().with_min_length(4);
        assert!(matches!(
            policy.validate("Ab1!"),
            Err(Error::Validation(ValidationError::PasswordTooShort {
                min_length: 8,
                ..
            }))
        ));
    }

    #[test]
    fn test_harden_never_loosens() {
        let strict = PasswordPolicy::default()
            .with_min_length(12)
            .with_max_length(128);
        assert_eq!(strict.harden(), strict);

        let loose = PasswordPolicy::relaxed();
        let hardened = loose.harden();
        assert_eq!(hardened, PasswordPolicy::default());
    }

    #[test]
    fn test_character_classes() {
        let classes = CharacterClasses::of("aB3!");
        assert!(classes.has_lowercase);
        assert!(classes.has_uppercase);
        assert!(classes.has_digit);
        assert!(classes.has_symbol);

        let classes = CharacterClasses::of("密码 abc");
        assert!(classes.has_lowercase);
        assert!(!classes.has_symbol);
    }

    #[test]
    fn test_registration_mode_codes() {
        for mode in RegistrationMode::ALL {
            assert_eq!(mode.code().parse::<RegistrationMode>().unwrap(), mode);
        }
        assert!("email".parse::<RegistrationMode>().is_err());
    }

    #[test]
    fn test_registration_mode_hardened() {
        assert_eq!(
            RegistrationMode::RandomPassword.hardened(),
            RegistrationMode::Verify
        );
        assert_eq!(RegistrationMode::Admin.hardened(), RegistrationMode::Admin);
        assert_eq!(RegistrationMode::hardened_options().count(), 4);
        assert!(RegistrationMode::hardened_options().all(|m| !m.is_plaintext_delivery()));
    }

    #[test]
    fn test_registration_mode_lists() {
        assert_eq!(
            RegistrationMode::format_list(RegistrationMode::hardened_options()),
            "instant,verify,admin,both"
        );
        assert_eq!(
            RegistrationMode::format_list(RegistrationMode::ALL),
            "instant,verify,randompass,admin,both"
        );
        assert_eq!(
            RegistrationMode::parse_list("verify,,admin ").unwrap(),
            vec![RegistrationMode::Verify, RegistrationMode::Admin]
        );
        assert!(RegistrationMode::parse_list("").unwrap().is_empty());
        assert!(RegistrationMode::parse_list("verify,telegram").is_err());
    }
}
