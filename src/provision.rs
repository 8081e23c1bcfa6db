//! 安装与加固
//!
//! 把校准、设置写入和策略加固组合成宿主在安装/启用阶段调用的几个操作：
//!
//! - [`Provisioner::install`]: 校准 cost 并写入 `password_hashing_cost`
//! - [`harden`]: 禁用明文随机密码注册、打开复杂度要求、放宽长度上限到 72
//! - [`restore_registration_modes`]: 停用时恢复全部注册方式为可选
//! - [`load_hasher`] / [`load_policy`]: 运行时从设置中构建哈希器和策略
//! - [`uninstall`]: 删除 cost 设置
//!
//! ## 示例
//!
//! ```rust
//! use hashcost::calibrate::{CalibrationConfig, CostCalibrator};
//! use hashcost::password::Algorithm;
//! use hashcost::provision::{Provisioner, harden, is_installed, load_hasher};
//! use hashcost::settings::InMemorySettingsStore;
//!
//! let store = InMemorySettingsStore::with_values([("registration_mode", "randompass")]);
//! let calibrator = CostCalibrator::bcrypt().with_config(
//!     CalibrationConfig::default()
//!         .with_target_latency_secs(0.000_001)
//!         .with_starting_factor(3),
//! );
//!
//! Provisioner::new(calibrator).install(&store).unwrap();
//! assert!(is_installed(&store).unwrap());
//!
//! let report = harden(&store).unwrap();
//! assert!(report.changed("registration_mode"));
//!
//! let hasher = load_hasher(&store, Algorithm::Bcrypt).unwrap();
//! assert_eq!(hasher.cost(), 4);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::calibrate::{CalibrationResult, Clock, CostCalibrator, SystemClock};
use crate::error::{Error, Result};
use crate::password::{
    Algorithm, BCRYPT_MAX_PASSWORD_BYTES, BcryptPrimitive, HashPrimitive, PasswordHasher,
    PasswordPolicy, RegistrationMode, policy::COMPLEX_MIN_LENGTH,
};
use crate::settings::{
    self, MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PASSWORD_HASHING_COST, REGISTRATION_MODE,
    REGISTRATION_MODES, REQUIRE_COMPLEX_PASSWORDS, SettingsStore,
};

/// 安装选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionOptions {
    /// 校准达不到目标延迟时改用的 cost；为 `None` 时安装失败
    pub fallback_cost: Option<u32>,
}

impl ProvisionOptions {
    /// 设置回退 cost
    pub fn with_fallback_cost(mut self, cost: u32) -> Self {
        self.fallback_cost = Some(cost);
        self
    }
}

/// 安装写入的 cost 来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionedCost {
    /// 校准得到
    Calibrated(CalibrationResult),
    /// 校准无法达到目标，使用回退值
    Fallback(u32),
}

impl ProvisionedCost {
    /// 写入的 cost
    pub fn cost(&self) -> u32 {
        match self {
            ProvisionedCost::Calibrated(result) => result.work_factor,
            ProvisionedCost::Fallback(cost) => *cost,
        }
    }
}

/// 安装器
#[derive(Debug, Clone)]
pub struct Provisioner<P = BcryptPrimitive, C = SystemClock> {
    calibrator: CostCalibrator<P, C>,
    options: ProvisionOptions,
}

impl<P: HashPrimitive, C: Clock> Provisioner<P, C> {
    /// 使用给定校准器创建安装器
    pub fn new(calibrator: CostCalibrator<P, C>) -> Self {
        Self {
            calibrator,
            options: ProvisionOptions::default(),
        }
    }

    /// 设置安装选项
    pub fn with_options(mut self, options: ProvisionOptions) -> Self {
        self.options = options;
        self
    }

    /// 使用的校准器
    pub fn calibrator(&self) -> &CostCalibrator<P, C> {
        &self.calibrator
    }

    /// 校准并写入 cost
    ///
    /// 校准达不到目标且配置了回退 cost 时写入回退值；其他错误原样返回，
    /// 此时不写入任何设置。
    pub fn install(&self, store: &dyn SettingsStore) -> Result<ProvisionedCost> {
        let provisioned = match self.calibrator.run() {
            Ok(result) => ProvisionedCost::Calibrated(result),
            Err(err) if err.is_calibration_unreachable() => match self.options.fallback_cost {
                Some(fallback) => {
                    self.calibrator.primitive().check_cost(fallback)?;
                    warn!(error = %err, fallback, "calibration failed, using fallback cost");
                    ProvisionedCost::Fallback(fallback)
                }
                None => return Err(err),
            },
            Err(err) => return Err(err),
        };

        store.set(PASSWORD_HASHING_COST, &provisioned.cost().to_string())?;
        info!(
            key = PASSWORD_HASHING_COST,
            cost = provisioned.cost(),
            "stored password hashing cost"
        );
        Ok(provisioned)
    }
}

impl Default for Provisioner {
    fn default() -> Self {
        Self::new(CostCalibrator::bcrypt())
    }
}

/// cost 设置是否存在
pub fn is_installed(store: &dyn SettingsStore) -> Result<bool> {
    Ok(store.get(PASSWORD_HASHING_COST)?.is_some())
}

/// 删除 cost 设置，返回之前是否存在
pub fn uninstall(store: &dyn SettingsStore) -> Result<bool> {
    let removed = store.delete(PASSWORD_HASHING_COST)?;
    if removed {
        info!(key = PASSWORD_HASHING_COST, "removed password hashing cost");
    }
    Ok(removed)
}

// ============================================================================
// 加固
// ============================================================================

/// 一条设置变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChange {
    /// 设置名
    pub key: String,
    /// 原值，不存在时为 `None`
    pub old: Option<String>,
    /// 新值
    pub new: String,
}

impl SettingChange {
    fn new(key: &str, old: Option<String>, new: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            old,
            new: new.into(),
        }
    }

    fn write(&self, store: &dyn SettingsStore) -> Result<()> {
        store.set(&self.key, &self.new)?;
        info!(
            key = self.key.as_str(),
            old = self.old.as_deref().unwrap_or(""),
            new = self.new.as_str(),
            "updated setting"
        );
        Ok(())
    }
}

/// 加固报告
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardeningReport {
    /// 实际写入的变更
    pub changes: Vec<SettingChange>,
}

impl HardeningReport {
    /// 是否没有任何变更
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// 某个设置是否被修改
    pub fn changed(&self, key: &str) -> bool {
        self.changes.iter().any(|c| c.key == key)
    }
}

/// 加固密码相关设置
///
/// - 注册方式为随机密码时改为邮件验证
/// - 可选注册方式中去掉随机密码（未设置时视为全部可选）
/// - 打开复杂密码要求
/// - 最大长度低于 72 时提高到 72
/// - 最小长度低于 8 时提高到 8
///
/// 先读取并解析全部设置，任何一项无效都直接返回错误且不写入；
/// 已满足要求的设置不会被写入。
pub fn harden(store: &dyn SettingsStore) -> Result<HardeningReport> {
    let changes = plan_hardening(store)?;
    for change in &changes {
        change.write(store)?;
    }
    Ok(HardeningReport { changes })
}

fn plan_hardening(store: &dyn SettingsStore) -> Result<Vec<SettingChange>> {
    let mut changes = Vec::new();

    if let Some(code) = store.get(REGISTRATION_MODE)? {
        let mode: RegistrationMode = code.parse()?;
        let hardened = mode.hardened();
        if hardened != mode {
            changes.push(SettingChange::new(REGISTRATION_MODE, Some(code), hardened.code()));
        }
    }

    let options = store.get(REGISTRATION_MODES)?;
    let allows_plaintext = match options.as_deref() {
        Some(list) => RegistrationMode::parse_list(list)?
            .iter()
            .any(RegistrationMode::is_plaintext_delivery),
        None => true,
    };
    if allows_plaintext {
        changes.push(SettingChange::new(
            REGISTRATION_MODES,
            options,
            RegistrationMode::format_list(RegistrationMode::hardened_options()),
        ));
    }

    if settings::get_bool(store, REQUIRE_COMPLEX_PASSWORDS)? != Some(true) {
        let old = store.get(REQUIRE_COMPLEX_PASSWORDS)?;
        changes.push(SettingChange::new(REQUIRE_COMPLEX_PASSWORDS, old, "1"));
    }

    changes.extend(raise_at_least(store, MAX_PASSWORD_LENGTH, BCRYPT_MAX_PASSWORD_BYTES)?);
    changes.extend(raise_at_least(store, MIN_PASSWORD_LENGTH, COMPLEX_MIN_LENGTH)?);

    Ok(changes)
}

fn raise_at_least(
    store: &dyn SettingsStore,
    key: &str,
    floor: usize,
) -> Result<Option<SettingChange>> {
    let current = settings::get_u32(store, key)?;
    if current.is_none_or(|value| (value as usize) < floor) {
        let old = store.get(key)?;
        return Ok(Some(SettingChange::new(key, old, floor.to_string())));
    }
    Ok(None)
}

/// 恢复全部注册方式为可选
///
/// 停用加固时调用；当前注册方式保持不变。列表已包含全部方式时不写入，返回 `None`。
pub fn restore_registration_modes(store: &dyn SettingsStore) -> Result<Option<SettingChange>> {
    let options = store.get(REGISTRATION_MODES)?;
    let complete = match options.as_deref() {
        Some(list) => {
            let modes = RegistrationMode::parse_list(list)?;
            RegistrationMode::ALL.iter().all(|m| modes.contains(m))
        }
        None => false,
    };
    if complete {
        return Ok(None);
    }

    let change = SettingChange::new(
        REGISTRATION_MODES,
        options,
        RegistrationMode::format_list(RegistrationMode::ALL),
    );
    change.write(store)?;
    Ok(Some(change))
}

// ============================================================================
// 运行时读取
// ============================================================================

/// 按设置中的 cost 构建哈希器
///
/// cost 不存在时返回 [`ConfigError::MissingRequired`](crate::error::ConfigError::MissingRequired)。
pub fn load_hasher(store: &dyn SettingsStore, algorithm: Algorithm) -> Result<PasswordHasher> {
    let cost = settings::require_u32(store, PASSWORD_HASHING_COST)?;
    PasswordHasher::new(algorithm).with_cost(cost)
}

/// 按设置构建密码策略，缺失的项取默认策略的值
///
/// 最小长度大于最大长度时返回 [`ConfigError::InvalidValue`](crate::error::ConfigError::InvalidValue)。
pub fn load_policy(store: &dyn SettingsStore) -> Result<PasswordPolicy> {
    let defaults = PasswordPolicy::default();
    let policy = PasswordPolicy {
        min_length: settings::get_u32(store, MIN_PASSWORD_LENGTH)?
            .map_or(defaults.min_length, |v| v as usize),
        max_length: settings::get_u32(store, MAX_PASSWORD_LENGTH)?
            .map_or(defaults.max_length, |v| v as usize),
        require_complex: settings::get_bool(store, REQUIRE_COMPLEX_PASSWORDS)?
            .unwrap_or(defaults.require_complex),
    };
    if policy.min_length > policy.max_length {
        return Err(Error::invalid_config(
            MIN_PASSWORD_LENGTH,
            format!(
                "{} exceeds {} ({})",
                policy.min_length, MAX_PASSWORD_LENGTH, policy.max_length
            ),
        ));
    }
    Ok(policy)
}
