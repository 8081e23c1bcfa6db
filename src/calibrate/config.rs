//! 校准配置

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};

/// 默认目标延迟（秒）
pub const DEFAULT_TARGET_LATENCY_SECS: f64 = 0.05;

/// 默认起始工作因子，第一次探测使用它加一
pub const DEFAULT_STARTING_FACTOR: u32 = 8;

/// 默认上限工作因子
pub const DEFAULT_CEILING: u32 = 31;

/// 默认参考明文：8 个字母加 2 个数字，不是真实密码
pub const DEFAULT_REFERENCE_PLAINTEXT: &str = "z2d4BYAzsB";

/// 成本校准配置
///
/// 目标延迟、起始因子和上限都是策略参数，随硬件调整，不应写死在调用方。
///
/// 可以嵌入宿主自己的 TOML 配置：
///
/// ```rust
/// use hashcost::calibrate::CalibrationConfig;
///
/// let config = CalibrationConfig::from_toml_str(
///     r#"
///     target_latency_secs = 0.1
///     starting_factor = 10
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.starting_factor, 10);
/// assert_eq!(config.ceiling, 31);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// 单次哈希的目标耗时（秒）
    pub target_latency_secs: f64,
    /// 起始工作因子
    pub starting_factor: u32,
    /// 上限工作因子，探测到此仍未达标则失败
    pub ceiling: u32,
    /// 参考明文
    pub reference_plaintext: String,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            target_latency_secs: DEFAULT_TARGET_LATENCY_SECS,
            starting_factor: DEFAULT_STARTING_FACTOR,
            ceiling: DEFAULT_CEILING,
            reference_plaintext: DEFAULT_REFERENCE_PLAINTEXT.to_string(),
        }
    }
}

impl CalibrationConfig {
    /// 从 TOML 文本解析并校验配置，缺省字段取默认值
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(input).map_err(|e| Error::Config(ConfigError::Parse(e.to_string())))?;
        config.validate()?;
        Ok(config)
    }

    /// 设置目标延迟（秒）
    pub fn with_target_latency_secs(mut self, secs: f64) -> Self {
        self.target_latency_secs = secs;
        self
    }

    /// 设置起始工作因子
    pub fn with_starting_factor(mut self, factor: u32) -> Self {
        self.starting_factor = factor;
        self
    }

    /// 设置上限工作因子
    pub fn with_ceiling(mut self, ceiling: u32) -> Self {
        self.ceiling = ceiling;
        self
    }

    /// 设置参考明文
    pub fn with_reference_plaintext(mut self, plaintext: impl Into<String>) -> Self {
        self.reference_plaintext = plaintext.into();
        self
    }

    /// 校验各字段
    pub fn validate(&self) -> Result<()> {
        if !self.target_latency_secs.is_finite() || self.target_latency_secs <= 0.0 {
            return Err(Error::invalid_config(
                "target_latency_secs",
                "must be a finite number greater than zero",
            ));
        }
        if self.starting_factor < 1 {
            return Err(Error::invalid_config("starting_factor", "must be at least 1"));
        }
        if self.ceiling <= self.starting_factor {
            return Err(Error::invalid_config(
                "ceiling",
                format!("must be greater than starting_factor ({})", self.starting_factor),
            ));
        }
        if self.reference_plaintext.is_empty() {
            return Err(Error::invalid_config("reference_plaintext", "must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CalibrationConfig::default();
        assert_eq!(config.target_latency_secs, 0.05);
        assert_eq!(config.starting_factor, 8);
        assert_eq!(config.ceiling, 31);
        assert_eq!(config.reference_plaintext, "z2d4BYAzsB");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = CalibrationConfig::default()
            .with_target_latency_secs(0.25)
            .with_starting_factor(10)
            .with_ceiling(16)
            .with_reference_plaintext("probe");

        assert_eq!(config.target_latency_secs, 0.25);
        assert_eq!(config.starting_factor, 10);
        assert_eq!(config.ceiling, 16);
        assert_eq!(config.reference_plaintext, "probe");
    }

    #[test]
    fn test_from_toml_partial() {
        let config = CalibrationConfig::from_toml_str("ceiling = 20").unwrap();
        assert_eq!(config.ceiling, 20);
        assert_eq!(config.starting_factor, DEFAULT_STARTING_FACTOR);
    }

    #[test]
    fn test_from_toml_rejects_bad_values() {
        let err = CalibrationConfig::from_toml_str("target_latency_secs = -1.0").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));

        let err = CalibrationConfig::from_toml_str("starting_factor = 12\nceiling = 12").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::InvalidValue { .. })));

        let err = CalibrationConfig::from_toml_str("ceiling = \"high\"").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validate_rejects_empty_plaintext() {
        let config = CalibrationConfig::default().with_reference_plaintext("");
        assert!(config.validate().is_err());
    }
}
