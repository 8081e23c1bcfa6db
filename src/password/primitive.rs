//! 自适应哈希原语
//!
//! 将具体的慢哈希函数（bcrypt、Argon2id）抽象为带工作因子的原语，
//! 供哈希器和成本校准器共用。

use std::ops::RangeInclusive;

#[cfg(feature = "argon2")]
use argon2::{Algorithm as Argon2Algorithm, Argon2, Params as Argon2Params, Version};

#[cfg(feature = "argon2")]
use password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};

use crate::error::{Error, PasswordHashError, Result, ValidationError};

/// bcrypt 只使用输入的前 72 个字节
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;

/// bcrypt 接受的最小 cost
pub const BCRYPT_MIN_COST: u32 = 4;

/// bcrypt 接受的最大 cost
pub const BCRYPT_MAX_COST: u32 = 31;

/// 带工作因子的自适应哈希原语
///
/// 工作因子越高，单次哈希越慢；校准器依赖延迟随工作因子单调增长。
pub trait HashPrimitive {
    /// 原语名称，例如 `"bcrypt"`
    fn name(&self) -> &'static str;

    /// 原语接受的工作因子范围
    fn cost_range(&self) -> RangeInclusive<u32>;

    /// 以给定工作因子哈希明文
    fn hash(&self, plaintext: &str, cost: u32) -> Result<String>;

    /// 校验明文是否匹配哈希
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool>;

    /// 从哈希字符串中读取工作因子，格式不属于该原语时返回 `None`
    fn cost_of(&self, hash: &str) -> Option<u32>;

    /// 哈希是否弱于以 `cost` 生成的新哈希
    ///
    /// 格式不属于该原语或工作因子更低时返回 `true`。
    fn needs_rehash(&self, hash: &str, cost: u32) -> bool {
        self.cost_of(hash).is_none_or(|current| current < cost)
    }

    /// 检查工作因子是否在范围内
    fn check_cost(&self, cost: u32) -> Result<()> {
        let range = self.cost_range();
        if range.contains(&cost) {
            Ok(())
        } else {
            Err(Error::PasswordHash(PasswordHashError::CostOutOfRange {
                cost,
                min: *range.start(),
                max: *range.end(),
            }))
        }
    }
}

// ============================================================================
// bcrypt
// ============================================================================

/// bcrypt 原语，cost 每加 1 耗时约翻倍
#[derive(Debug, Clone, Copy, Default)]
pub struct BcryptPrimitive;

impl BcryptPrimitive {
    /// 创建 bcrypt 原语
    pub const fn new() -> Self {
        Self
    }
}

impl HashPrimitive for BcryptPrimitive {
    fn name(&self) -> &'static str {
        "bcrypt"
    }

    fn cost_range(&self) -> RangeInclusive<u32> {
        BCRYPT_MIN_COST..=BCRYPT_MAX_COST
    }

    fn hash(&self, plaintext: &str, cost: u32) -> Result<String> {
        self.check_cost(cost)?;

        // 超出部分会被 bcrypt 静默忽略，直接拒绝
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Err(Error::Validation(ValidationError::PasswordTooManyBytes {
                max_bytes: BCRYPT_MAX_PASSWORD_BYTES,
                actual: plaintext.len(),
            }));
        }

        bcrypt::hash(plaintext, cost).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "bcrypt hash failed: {}",
                e
            )))
        })
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Ok(false);
        }

        bcrypt::verify(plaintext, hash).map_err(|e| {
            Error::PasswordHash(PasswordHashError::InvalidFormat(format!(
                "bcrypt verify failed: {}",
                e
            )))
        })
    }

    fn cost_of(&self, hash: &str) -> Option<u32> {
        if !hash.starts_with("$2") {
            return None;
        }
        // $2b$12$...
        hash.get(4..6)?.parse::<u32>().ok()
    }
}

// ============================================================================
// Argon2id
// ============================================================================

/// Argon2id 原语，时间成本（迭代次数）作为工作因子
///
/// 内存和并行度在实例上固定，耗时随工作因子线性增长。
#[cfg(feature = "argon2")]
#[derive(Debug, Clone, Copy)]
pub struct Argon2Primitive {
    memory_kib: u32,
    parallelism: u32,
}

#[cfg(feature = "argon2")]
impl Default for Argon2Primitive {
    fn default() -> Self {
        Self::new(Argon2Params::DEFAULT_M_COST, Argon2Params::DEFAULT_P_COST)
    }
}

#[cfg(feature = "argon2")]
impl Argon2Primitive {
    /// 使用指定内存（KiB）和并行度创建原语
    pub const fn new(memory_kib: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            parallelism,
        }
    }

    fn params(&self, cost: u32) -> Result<Argon2Params> {
        Argon2Params::new(self.memory_kib, cost, self.parallelism, None).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "invalid Argon2 parameters: {}",
                e
            )))
        })
    }
}

#[cfg(feature = "argon2")]
impl HashPrimitive for Argon2Primitive {
    fn name(&self) -> &'static str {
        "argon2id"
    }

    fn cost_range(&self) -> RangeInclusive<u32> {
        1..=31
    }

    fn hash(&self, plaintext: &str, cost: u32) -> Result<String> {
        self.check_cost(cost)?;

        let mut salt_bytes = [0u8; 16];
        getrandom::fill(&mut salt_bytes).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "Failed to generate random salt: {}",
                e
            )))
        })?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
            Error::PasswordHash(PasswordHashError::HashFailed(format!(
                "Failed to encode salt: {}",
                e
            )))
        })?;

        let argon2 = Argon2::new(Argon2Algorithm::Argon2id, Version::V0x13, self.params(cost)?);
        argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                Error::PasswordHash(PasswordHashError::HashFailed(format!(
                    "Argon2 hash failed: {}",
                    e
                )))
            })
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            Error::PasswordHash(PasswordHashError::InvalidFormat(format!(
                "invalid Argon2 hash: {}",
                e
            )))
        })?;

        // 参数取自哈希字符串本身
        Ok(Argon2::default()
            .verify_password(plaintext.as_bytes(), &parsed_hash)
            .is_ok())
    }

    fn cost_of(&self, hash: &str) -> Option<u32> {
        self.params_of(hash).map(|p| p.t_cost())
    }

    fn needs_rehash(&self, hash: &str, cost: u32) -> bool {
        match self.params_of(hash) {
            Some(params) => {
                params.t_cost() < cost
                    || params.m_cost() < self.memory_kib
                    || params.p_cost() < self.parallelism
            }
            None => true,
        }
    }
}

#[cfg(feature = "argon2")]
impl Argon2Primitive {
    fn params_of(&self, hash: &str) -> Option<Argon2Params> {
        if !hash.starts_with("$argon2id") {
            return None;
        }
        let parsed = PasswordHash::new(hash).ok()?;
        Argon2Params::try_from(&parsed).ok()
    }
}
