//! 密码哈希模块
//!
//! 提供自适应哈希原语、使用校准 cost 的哈希器以及密码策略。
//!
//! ## 支持的算法
//!
//! - **bcrypt** (默认): cost 每加 1 耗时约翻倍，输入上限 72 字节
//! - **Argon2id**: 内存硬哈希算法，时间成本作为工作因子（需启用 `argon2` feature）
//!
//! ## 示例
//!
//! ```rust
//! use hashcost::password::{PasswordHasher, Algorithm};
//!
//! let hasher = PasswordHasher::new(Algorithm::Bcrypt).with_cost(4).unwrap();
//! let hash = hasher.hash("my_password").unwrap();
//! assert!(hasher.verify("my_password", &hash).unwrap());
//! ```
//!
//! ### 密码策略
//!
//! ```rust
//! use hashcost::password::PasswordPolicy;
//!
//! let policy = PasswordPolicy::default();
//! assert!(policy.validate("weak").is_err());
//! ```

mod hasher;
pub mod policy;
mod primitive;

pub use hasher::{Algorithm, DEFAULT_BCRYPT_COST, PasswordHasher, hash_password, verify_password};
pub use policy::{CharacterClasses, PasswordPolicy, RegistrationMode};
#[cfg(feature = "argon2")]
pub use primitive::Argon2Primitive;
pub use primitive::{
    BCRYPT_MAX_COST, BCRYPT_MAX_PASSWORD_BYTES, BCRYPT_MIN_COST, BcryptPrimitive, HashPrimitive,
};
