//! 成本校准模块
//!
//! 为自适应哈希原语挑选工作因子，使单次哈希耗时刚好达到目标延迟。
//!
//! 从 `starting_factor + 1` 开始逐个探测：用固定的参考明文哈希一次并计时，
//! 耗时达到目标即停止，否则工作因子加一继续，直到上限。结果只在安装/配置阶段
//! 计算一次，由宿主持久化后在每次哈希时复用。
//!
//! ## 示例
//!
//! ```rust,no_run
//! use hashcost::calibrate::calibrate;
//!
//! // 在当前机器上找到单次 bcrypt 耗时 ≥ 50ms 的 cost
//! let result = calibrate(0.05, 8).unwrap();
//! println!("cost = {}, took {:?}", result.work_factor, result.latency);
//! ```
//!
//! ### 注入原语和时钟
//!
//! ```rust
//! use hashcost::calibrate::{CalibrationConfig, CostCalibrator, SystemClock};
//! use hashcost::password::BcryptPrimitive;
//!
//! let calibrator = CostCalibrator::new(BcryptPrimitive::new(), SystemClock)
//!     .with_config(CalibrationConfig::default().with_ceiling(6));
//!
//! // 目标极小，第一次探测就会达标
//! let result = calibrator.calibrate(0.000_001, 3).unwrap();
//! assert_eq!(result.work_factor, 4);
//! ```

mod clock;
mod config;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CalibrationError, Error, Result};
use crate::password::{BcryptPrimitive, HashPrimitive};

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{
    CalibrationConfig, DEFAULT_CEILING, DEFAULT_REFERENCE_PLAINTEXT, DEFAULT_STARTING_FACTOR,
    DEFAULT_TARGET_LATENCY_SECS,
};

/// 单次探测的记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSample {
    /// 探测使用的工作因子
    pub work_factor: u32,
    /// 测得的耗时
    pub latency: Duration,
}

/// 校准结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// 选定的工作因子
    pub work_factor: u32,
    /// 选定工作因子下测得的耗时
    pub latency: Duration,
    /// 原语名称
    pub primitive: String,
    /// 按探测顺序排列的全部样本，最后一个即选定的工作因子
    pub probes: Vec<ProbeSample>,
    /// 校准时间
    pub calibrated_at: DateTime<Utc>,
}

impl CalibrationResult {
    /// 选定工作因子下的耗时（秒）
    pub fn latency_secs(&self) -> f64 {
        self.latency.as_secs_f64()
    }

    /// 选定工作因子之前一次探测的样本
    pub fn previous_probe(&self) -> Option<&ProbeSample> {
        self.probes.iter().rev().nth(1)
    }
}

/// 成本校准器
///
/// 单线程、同步执行；每次探测跑完才开始下一次，没有重试。
#[derive(Debug, Clone)]
pub struct CostCalibrator<P = BcryptPrimitive, C = SystemClock> {
    primitive: P,
    clock: C,
    config: CalibrationConfig,
}

impl Default for CostCalibrator {
    fn default() -> Self {
        Self::bcrypt()
    }
}

impl CostCalibrator {
    /// 使用 bcrypt 和系统时钟的校准器
    pub fn bcrypt() -> Self {
        Self::new(BcryptPrimitive::new(), SystemClock)
    }
}

impl<P: HashPrimitive, C: Clock> CostCalibrator<P, C> {
    /// 使用默认配置创建校准器
    pub fn new(primitive: P, clock: C) -> Self {
        Self {
            primitive,
            clock,
            config: CalibrationConfig::default(),
        }
    }

    /// 替换配置
    pub fn with_config(mut self, config: CalibrationConfig) -> Self {
        self.config = config;
        self
    }

    /// 当前配置
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// 使用的哈希原语
    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// 以配置中的目标延迟和起始因子执行校准
    pub fn run(&self) -> Result<CalibrationResult> {
        self.calibrate(self.config.target_latency_secs, self.config.starting_factor)
    }

    /// 以给定工作因子哈希一次参考明文，返回耗时
    ///
    /// 原语的错误原样返回。
    pub fn measure(&self, work_factor: u32) -> Result<Duration> {
        let start = self.clock.now();
        self.primitive
            .hash(&self.config.reference_plaintext, work_factor)?;
        Ok(self.clock.now().saturating_duration_since(start))
    }

    /// 执行校准
    ///
    /// # Arguments
    ///
    /// * `target_latency_seconds` - 目标耗时（秒），必须是大于 0 的有限数
    /// * `starting_factor` - 起始工作因子（≥ 1），第一次探测使用它加一
    ///
    /// # Errors
    ///
    /// * [`CalibrationError::InvalidTarget`] - 目标或起始因子无效，或上限低于原语的最小 cost
    /// * [`CalibrationError::Unreachable`] - 探测到上限仍未达到目标；起始因子已在上限处时不做任何探测
    /// * 原语哈希失败时返回原语的错误，校准立即终止
    pub fn calibrate(
        &self,
        target_latency_seconds: f64,
        starting_factor: u32,
    ) -> Result<CalibrationResult> {
        let target = target_duration(target_latency_seconds)?;
        if starting_factor < 1 {
            return Err(invalid_target("starting factor must be at least 1"));
        }

        let range = self.primitive.cost_range();
        let ceiling = self.config.ceiling.min(*range.end());
        if ceiling < *range.start() {
            return Err(invalid_target(format!(
                "ceiling {} is below the minimum cost {} of {}",
                ceiling,
                range.start(),
                self.primitive.name()
            )));
        }
        // 原语的下限高于 starting_factor + 1 时从下限开始
        let first = starting_factor.saturating_add(1).max(*range.start());
        if first > ceiling {
            // 起始因子已在上限处，没有可探测的工作因子
            warn!(starting_factor, ceiling, "starting factor already at ceiling");
            return Err(Error::Calibration(CalibrationError::Unreachable {
                ceiling,
                last_latency: Duration::ZERO,
            }));
        }

        let primitive = self.primitive.name();
        let mut probes = Vec::new();
        let mut last_latency = Duration::ZERO;

        for work_factor in first..=ceiling {
            let latency = self.measure(work_factor)?;
            debug!(
                primitive,
                work_factor,
                latency_ms = latency.as_secs_f64() * 1000.0,
                "calibration probe"
            );
            probes.push(ProbeSample {
                work_factor,
                latency,
            });

            if latency >= target {
                info!(
                    primitive,
                    work_factor,
                    latency_ms = latency.as_secs_f64() * 1000.0,
                    probes = probes.len(),
                    "calibrated hashing cost"
                );
                return Ok(CalibrationResult {
                    work_factor,
                    latency,
                    primitive: primitive.to_string(),
                    probes,
                    calibrated_at: Utc::now(),
                });
            }
            last_latency = latency;
        }

        warn!(
            primitive,
            ceiling,
            last_latency_ms = last_latency.as_secs_f64() * 1000.0,
            "target latency not reached at ceiling"
        );
        Err(Error::Calibration(CalibrationError::Unreachable {
            ceiling,
            last_latency,
        }))
    }
}

/// 使用 bcrypt、系统时钟和默认上限（31）执行校准
///
/// # Example
///
/// ```rust
/// use hashcost::calibrate::calibrate;
///
/// assert!(calibrate(-1.0, 8).is_err());
/// ```
pub fn calibrate(target_latency_seconds: f64, starting_factor: u32) -> Result<CalibrationResult> {
    CostCalibrator::bcrypt().calibrate(target_latency_seconds, starting_factor)
}

fn target_duration(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(invalid_target(format!(
            "target latency must be a finite number of seconds greater than zero, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| invalid_target(format!("target latency {} out of range: {}", secs, e)))
}

fn invalid_target(reason: impl Into<String>) -> Error {
    Error::Calibration(CalibrationError::InvalidTarget {
        reason: reason.into(),
    })
}
