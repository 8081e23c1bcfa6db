//! # hashcost
//!
//! 为宿主应用替换弱密码哈希：在安装时按本机速度校准 bcrypt cost，
//! 之后以该 cost 哈希和验证密码，并加固相关的密码设置。
//!
//! ## 功能特性
//!
//! - **成本校准**: 逐级提高工作因子，直到单次哈希达到目标延迟（默认 50ms）
//! - **密码哈希**: bcrypt（默认）与 Argon2id，自动识别哈希格式，支持按 cost 升级
//! - **密码策略**: 复杂度要求、长度上下限，拒绝超过 bcrypt 72 字节上限的输入
//! - **设置存储**: 宿主设置表的读写接口及内存实现
//! - **安装与加固**: 写入校准结果、禁用明文随机密码注册、放宽长度上限
//!
//! ## Features
//!
//! - `argon2` - 启用 Argon2id 原语
//! - `full` - 启用所有功能
//!
//! ## 校准示例
//!
//! ```rust,no_run
//! use hashcost::calibrate;
//!
//! // 单次哈希至少 50ms，从 cost 9 开始探测
//! let result = calibrate(0.05, 8).unwrap();
//! println!("cost {} took {:?}", result.work_factor, result.latency);
//! ```
//!
//! ## 哈希示例
//!
//! ```rust
//! use hashcost::{PasswordHasher, Algorithm};
//!
//! let hasher = PasswordHasher::new(Algorithm::Bcrypt).with_cost(4).unwrap();
//! let hash = hasher.hash("my_secure_password").unwrap();
//! assert!(hasher.verify("my_secure_password", &hash).unwrap());
//! assert!(!hasher.needs_rehash(&hash));
//! ```

pub mod calibrate;
pub mod error;
pub mod password;
pub mod provision;
pub mod settings;

pub use error::{Error, Result};

// ============================================================================
// 校准相关导出
// ============================================================================

pub use calibrate::{
    CalibrationConfig, CalibrationResult, Clock, CostCalibrator, ManualClock, ProbeSample,
    SystemClock, calibrate,
};

// ============================================================================
// 密码相关导出
// ============================================================================

pub use password::{
    Algorithm, BcryptPrimitive, HashPrimitive, PasswordHasher, PasswordPolicy, RegistrationMode,
    hash_password, verify_password,
};

// ============================================================================
// 设置与安装相关导出
// ============================================================================

pub use provision::{HardeningReport, ProvisionOptions, ProvisionedCost, Provisioner};
pub use settings::{InMemorySettingsStore, SettingsStore};
