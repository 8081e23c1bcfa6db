//! 密码哈希实现
//!
//! 以校准得到的工作因子提供 `hash` / `verify`，取代宿主内置的弱哈希。

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "argon2")]
use argon2::Params as Argon2Params;

#[cfg(feature = "argon2")]
use super::primitive::Argon2Primitive;
use super::primitive::{BcryptPrimitive, HashPrimitive};
use crate::calibrate::CalibrationResult;
use crate::error::{Error, PasswordHashError, Result};

/// bcrypt 的默认 cost
pub const DEFAULT_BCRYPT_COST: u32 = 12;

static BCRYPT: BcryptPrimitive = BcryptPrimitive::new();

#[cfg(feature = "argon2")]
static ARGON2: Argon2Primitive =
    Argon2Primitive::new(Argon2Params::DEFAULT_M_COST, Argon2Params::DEFAULT_P_COST);

/// 支持的哈希算法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// bcrypt - 默认算法
    #[default]
    Bcrypt,

    /// Argon2id - 内存硬算法，时间成本作为工作因子
    #[cfg(feature = "argon2")]
    Argon2id,
}

impl Algorithm {
    /// 算法对应的原语
    pub fn primitive(&self) -> &'static dyn HashPrimitive {
        match self {
            Algorithm::Bcrypt => &BCRYPT,
            #[cfg(feature = "argon2")]
            Algorithm::Argon2id => &ARGON2,
        }
    }

    /// 算法名称，与原语名称一致
    pub fn name(&self) -> &'static str {
        self.primitive().name()
    }

    /// 算法的默认工作因子
    pub fn default_cost(&self) -> u32 {
        match self {
            Algorithm::Bcrypt => DEFAULT_BCRYPT_COST,
            #[cfg(feature = "argon2")]
            Algorithm::Argon2id => Argon2Params::DEFAULT_T_COST,
        }
    }

    /// 根据哈希前缀识别算法
    fn detect(hash: &str) -> Result<Self> {
        if hash.starts_with("$argon2") {
            #[cfg(feature = "argon2")]
            return Ok(Algorithm::Argon2id);
            #[cfg(not(feature = "argon2"))]
            return Err(Error::PasswordHash(PasswordHashError::UnsupportedAlgorithm(
                "argon2id".to_string(),
            )));
        }
        if hash.starts_with("$2") {
            return Ok(Algorithm::Bcrypt);
        }
        Err(Error::PasswordHash(PasswordHashError::InvalidFormat(
            "unknown hash format".to_string(),
        )))
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bcrypt" => Ok(Algorithm::Bcrypt),
            #[cfg(feature = "argon2")]
            "argon2id" => Ok(Algorithm::Argon2id),
            other => Err(Error::PasswordHash(PasswordHashError::UnsupportedAlgorithm(
                other.to_string(),
            ))),
        }
    }
}

/// 密码哈希器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    algorithm: Algorithm,
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}

impl PasswordHasher {
    /// 使用算法的默认工作因子创建哈希器
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashcost::password::{Algorithm, PasswordHasher};
    ///
    /// let hasher = PasswordHasher::new(Algorithm::Bcrypt);
    /// assert_eq!(hasher.cost(), 12);
    /// ```
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            cost: algorithm.default_cost(),
        }
    }

    /// 设置工作因子
    ///
    /// 超出算法允许范围时返回 [`PasswordHashError::CostOutOfRange`]。
    pub fn with_cost(mut self, cost: u32) -> Result<Self> {
        self.algorithm.primitive().check_cost(cost)?;
        self.cost = cost;
        Ok(self)
    }

    /// 按校准结果创建哈希器
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashcost::calibrate::CostCalibrator;
    /// use hashcost::password::PasswordHasher;
    ///
    /// let result = CostCalibrator::bcrypt().calibrate(0.000_001, 3).unwrap();
    /// let hasher = PasswordHasher::from_calibration(&result).unwrap();
    /// assert_eq!(hasher.cost(), result.work_factor);
    /// ```
    pub fn from_calibration(result: &CalibrationResult) -> Result<Self> {
        let algorithm: Algorithm = result.primitive.parse()?;
        Self::new(algorithm).with_cost(result.work_factor)
    }

    /// 使用的算法
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 使用的工作因子
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// 哈希密码
    ///
    /// # Example
    ///
    /// ```rust
    /// use hashcost::password::PasswordHasher;
    ///
    /// let hasher = PasswordHasher::default().with_cost(4).unwrap();
    /// let hash = hasher.hash("my_password").unwrap();
    /// assert!(hash.starts_with("$2"));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String> {
        self.algorithm.primitive().hash(password, self.cost)
    }

    /// 验证密码
    ///
    /// 根据哈希前缀自动选择算法，因此旧算法或旧 cost 的哈希仍可验证。
    /// 密码正确返回 `Ok(true)`，错误返回 `Ok(false)`。
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        Algorithm::detect(hash)?.primitive().verify(password, hash)
    }

    /// 检查哈希是否需要重新生成
    ///
    /// 算法不同或参数弱于当前配置时返回 `true`，适合在登录成功后顺带升级。
    /// Argon2id 同时比较时间成本、内存和并行度。
    pub fn needs_rehash(&self, hash: &str) -> bool {
        self.algorithm.primitive().needs_rehash(hash, self.cost)
    }
}

// ============================================================================
// 便捷函数
// ============================================================================

/// 使用 bcrypt 和默认 cost 哈希密码
pub fn hash_password(password: &str) -> Result<String> {
    PasswordHasher::default().hash(password)
}

/// 验证密码是否匹配哈希，自动识别哈希格式
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    PasswordHasher::default().verify(password, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn fast_hasher() -> PasswordHasher {
        // 使用低 cost 加快测试
        PasswordHasher::new(Algorithm::Bcrypt).with_cost(4).unwrap()
    }

    #[test]
    fn test_bcrypt_hash_and_verify() {
        let hasher = fast_hasher();
        let password = "test_password_123";

        let hash = hasher.hash(password).unwrap();
        assert!(hash.starts_with("$2"));

        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_default_is_bcrypt_cost_12() {
        let hasher = PasswordHasher::default();
        assert_eq!(hasher.algorithm(), Algorithm::Bcrypt);
        assert_eq!(hasher.cost(), DEFAULT_BCRYPT_COST);
    }

    #[test]
    fn test_invalid_cost() {
        assert!(PasswordHasher::new(Algorithm::Bcrypt).with_cost(3).is_err());
        assert!(PasswordHasher::new(Algorithm::Bcrypt).with_cost(32).is_err());
    }

    #[test]
    fn test_needs_rehash_lower_cost() {
        let strong = PasswordHasher::new(Algorithm::Bcrypt).with_cost(6).unwrap();
        let weak_hash = fast_hasher().hash("test").unwrap();

        assert!(strong.needs_rehash(&weak_hash));
        assert!(!fast_hasher().needs_rehash(&weak_hash));
    }

    #[test]
    fn test_needs_rehash_unknown_format() {
        assert!(fast_hasher().needs_rehash("5f4dcc3b5aa765d61d8327deb882cf99"));
    }

    #[test]
    fn test_verify_old_cost_still_works() {
        let old_hash = fast_hasher().hash("test").unwrap();
        let current = PasswordHasher::new(Algorithm::Bcrypt).with_cost(6).unwrap();
        assert!(current.verify("test", &old_hash).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let err = fast_hasher().verify("test", "invalid_hash").unwrap_err();
        assert!(matches!(
            err,
            Error::PasswordHash(PasswordHashError::InvalidFormat(_))
        ));
    }

    #[test]
    #[cfg(not(feature = "argon2"))]
    fn test_argon2_hash_without_feature() {
        let err = fast_hasher()
            .verify("test", "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA")
            .unwrap_err();
        assert!(matches!(
            err,
            Error::PasswordHash(PasswordHashError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_empty_password() {
        let hasher = fast_hasher();

        // 空密码应该也能正常哈希
        let hash = hasher.hash("").unwrap();
        assert!(hasher.verify("", &hash).unwrap());
        assert!(!hasher.verify("not_empty", &hash).unwrap());
    }

    #[test]
    fn test_unicode_password() {
        let hasher = fast_hasher();
        let password = "密码测试🔐émoji";

        let hash = hasher.hash(password).unwrap();
        assert!(hasher.verify(password, &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn test_long_password_rejected() {
        let err = fast_hasher().hash(&"a".repeat(100)).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::PasswordTooManyBytes { .. })
        ));
    }

    #[test]
    fn test_different_hashes_same_password() {
        let hasher = fast_hasher();
        let password = "same_password";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // 由于 salt 不同，同一密码每次生成的哈希应该不同
        assert_ne!(hash1, hash2);
        assert!(hasher.verify(password, &hash1).unwrap());
        assert!(hasher.verify(password, &hash2).unwrap());
    }

    #[test]
    fn test_algorithm_names() {
        assert_eq!(Algorithm::Bcrypt.to_string(), "bcrypt");
        assert_eq!("bcrypt".parse::<Algorithm>().unwrap(), Algorithm::Bcrypt);
        assert!("md5".parse::<Algorithm>().is_err());
    }

    #[test]
    #[cfg(feature = "argon2")]
    fn test_argon2_and_cross_algorithm_rehash() {
        let argon2 = PasswordHasher::new(Algorithm::Argon2id).with_cost(1).unwrap();
        let bcrypt = fast_hasher();

        let argon2_hash = argon2.hash("test").unwrap();
        assert!(argon2_hash.starts_with("$argon2id"));
        assert!(bcrypt.verify("test", &argon2_hash).unwrap());

        // 不同算法的哈希需要重新生成
        assert!(bcrypt.needs_rehash(&argon2_hash));
        assert!(!argon2.needs_rehash(&argon2_hash));
    }

    #[test]
    #[cfg(feature = "argon2")]
    fn test_argon2_low_memory_hash_needs_rehash() {
        // 时间成本更高，但内存低于默认配置
        let low_memory = Argon2Primitive::new(1024, 1).hash("test", 3).unwrap();
        let hasher = PasswordHasher::new(Algorithm::Argon2id).with_cost(1).unwrap();

        assert!(hasher.verify("test", &low_memory).unwrap());
        assert!(hasher.needs_rehash(&low_memory));
    }
}
