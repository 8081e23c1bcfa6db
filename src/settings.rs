//! 设置存储
//!
//! 宿主应用的设置表由宿主自己持久化，这里只定义读写接口，
//! 并提供一个内存实现用于开发和测试。

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{ConfigError, Error, Result, StorageError};

/// 校准得到的哈希 cost
pub const PASSWORD_HASHING_COST: &str = "password_hashing_cost";

/// 注册方式
pub const REGISTRATION_MODE: &str = "registration_mode";

/// 管理员可选择的注册方式，逗号分隔的代码列表
pub const REGISTRATION_MODES: &str = "registration_modes";

/// 是否要求复杂密码（`0` / `1`）
pub const REQUIRE_COMPLEX_PASSWORDS: &str = "require_complex_passwords";

/// 密码最小长度
pub const MIN_PASSWORD_LENGTH: &str = "min_password_length";

/// 密码最大长度
pub const MAX_PASSWORD_LENGTH: &str = "max_password_length";

/// 设置存储 trait
///
/// 值一律以字符串保存，与宿主设置表一致；类型转换见 [`get_u32`]、[`get_bool`]。
pub trait SettingsStore: Send + Sync {
    /// 读取设置
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入设置
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// 删除设置，返回是否存在
    fn delete(&self, key: &str) -> Result<bool>;
}

/// 读取整数设置
pub fn get_u32(store: &dyn SettingsStore, key: &str) -> Result<Option<u32>> {
    store
        .get(key)?
        .map(|value| {
            value
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::invalid_config(key, format!("'{}' is not an integer", value)))
        })
        .transpose()
}

/// 读取布尔设置，接受 `1`/`0` 和 `true`/`false`
pub fn get_bool(store: &dyn SettingsStore, key: &str) -> Result<Option<bool>> {
    store
        .get(key)?
        .map(|value| match value.trim() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(Error::invalid_config(
                key,
                format!("'{}' is not a boolean", other),
            )),
        })
        .transpose()
}

/// 读取必需的整数设置
pub fn require_u32(store: &dyn SettingsStore, key: &str) -> Result<u32> {
    get_u32(store, key)?.ok_or_else(|| Error::Config(ConfigError::MissingRequired(key.to_string())))
}

/// 内存设置存储
///
/// 用于开发和测试，生产环境应接入宿主的设置表
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySettingsStore {
    /// 创建空的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 以初始值创建内存存储
    pub fn with_values<K, V>(values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: RwLock::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// 当前设置数量
    pub fn len(&self) -> Result<usize> {
        let values = self
            .values
            .read()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(values.len())
    }

    /// 是否为空
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let mut values = self
            .values
            .write()
            .map_err(|_| Error::Storage(StorageError::OperationFailed("lock poisoned".into())))?;
        Ok(values.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_delete() {
        let store = InMemorySettingsStore::new();
        assert!(store.is_empty().unwrap());

        store.set(PASSWORD_HASHING_COST, "12").unwrap();
        assert_eq!(store.get(PASSWORD_HASHING_COST).unwrap().as_deref(), Some("12"));
        assert_eq!(store.len().unwrap(), 1);

        assert!(store.delete(PASSWORD_HASHING_COST).unwrap());
        assert!(!store.delete(PASSWORD_HASHING_COST).unwrap());
        assert_eq!(store.get(PASSWORD_HASHING_COST).unwrap(), None);
    }

    #[test]
    fn test_typed_helpers() {
        let store = InMemorySettingsStore::with_values([
            (PASSWORD_HASHING_COST, " 11 "),
            (REQUIRE_COMPLEX_PASSWORDS, "1"),
            (MAX_PASSWORD_LENGTH, "lots"),
            (MIN_PASSWORD_LENGTH, "maybe"),
        ]);

        assert_eq!(get_u32(&store, PASSWORD_HASHING_COST).unwrap(), Some(11));
        assert_eq!(get_bool(&store, REQUIRE_COMPLEX_PASSWORDS).unwrap(), Some(true));
        assert_eq!(get_u32(&store, "missing").unwrap(), None);

        assert!(matches!(
            get_u32(&store, MAX_PASSWORD_LENGTH),
            Err(Error::Config(ConfigError::InvalidValue { .. }))
        ));
        assert!(get_bool(&store, MIN_PASSWORD_LENGTH).is_err());
    }

    #[test]
    fn test_require_u32_missing() {
        let store = InMemorySettingsStore::new();
        assert_eq!(
            require_u32(&store, PASSWORD_HASHING_COST).unwrap_err(),
            Error::Config(ConfigError::MissingRequired(PASSWORD_HASHING_COST.to_string()))
        );
    }
}
