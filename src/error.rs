//! 统一错误类型模块
//!
//! 提供 hashcost 库中所有操作的错误类型定义。

use std::time::Duration;

use thiserror::Error as ThisError;

/// hashcost 库的统一结果类型
pub type Result<T> = std::result::Result<T, Error>;

/// hashcost 库的错误类型
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// 密码哈希错误
    #[error("Password hash error: {0}")]
    PasswordHash(#[from] PasswordHashError),

    /// 成本校准错误
    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 存储错误
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// 创建一个无效配置值错误
    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config(ConfigError::InvalidValue {
            key: key.into(),
            message: message.into(),
        })
    }

    /// 是否为校准无法达到目标延迟的错误
    pub fn is_calibration_unreachable(&self) -> bool {
        matches!(self, Error::Calibration(CalibrationError::Unreachable { .. }))
    }
}

/// 密码哈希相关错误
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum PasswordHashError {
    /// 哈希生成失败
    #[error("hash generation failed: {0}")]
    HashFailed(String),
    /// 无效的哈希格式
    #[error("invalid hash format: {0}")]
    InvalidFormat(String),
    /// 工作因子超出算法允许的范围
    #[error("cost {cost} outside supported range {min}..={max}")]
    CostOutOfRange { cost: u32, min: u32, max: u32 },
    /// 算法不支持
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

/// 成本校准相关错误
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum CalibrationError {
    /// 目标延迟或起始因子无效
    #[error("invalid calibration target: {reason}")]
    InvalidTarget { reason: String },
    /// 直到上限因子仍未达到目标延迟
    #[error("target latency not reached at ceiling cost {ceiling} (last probe took {last_latency:?})")]
    Unreachable {
        ceiling: u32,
        last_latency: Duration,
    },
}

/// 验证相关错误
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ValidationError {
    /// 密码太短
    #[error("password too short: minimum {min_length} characters, got {actual}")]
    PasswordTooShort { min_length: usize, actual: usize },
    /// 密码太长
    #[error("password too long: maximum {max_length} characters, got {actual}")]
    PasswordTooLong { max_length: usize, actual: usize },
    /// 超出 bcrypt 可处理的字节数
    #[error("password exceeds {max_bytes} bytes ({actual} bytes)")]
    PasswordTooManyBytes { max_bytes: usize, actual: usize },
    /// 密码复杂度不足
    #[error("password too weak: {0}")]
    PasswordTooWeak(String),
}

/// 配置相关错误
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ConfigError {
    /// 缺少必需的配置
    #[error("missing required configuration: {0}")]
    MissingRequired(String),
    /// 无效的配置值
    #[error("invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
    /// 配置文件解析失败
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

/// 存储相关错误
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum StorageError {
    /// 操作失败
    #[error("storage operation failed: {0}")]
    OperationFailed(String),
}
