//! 贝叶斯预测配置
//!
//! 配置是一个不可变值，在每次 `predict` 时显式传入。
//! 字段名兼容旧版持久化 JSON（`pmfBinWidth`、`serialCutoffProbability`）。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::algorithms::{FusionStrategy, ParallelFusion, SerialFusion};
use crate::error::{PositioningError, Result};

/// 融合方式
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FusionMode {
    /// 并行（朴素贝叶斯）
    #[default]
    Parallel,
    /// 串行（逐步更新，可提前停止）
    Serial,
}

impl fmt::Display for FusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionMode::Parallel => write!(f, "PARALLEL"),
            FusionMode::Serial => write!(f, "SERIAL"),
        }
    }
}

/// 预测配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// 融合方式
    pub mode: FusionMode,
    /// 使用哪一种分箱宽度的直方图
    #[serde(alias = "pmfBinWidth")]
    pub bin_width: i32,
    /// 串行模式的截断概率，(0, 1]
    #[serde(alias = "serialCutoffProbability")]
    pub cutoff_probability: f64,
}

impl Settings {
    /// 默认分箱宽度
    pub const DEFAULT_BIN_WIDTH: i32 = 5;
    /// 默认截断概率
    pub const DEFAULT_CUTOFF_PROBABILITY: f64 = 0.9;

    /// 创建并校验配置
    pub fn new(mode: FusionMode, bin_width: i32, cutoff_probability: f64) -> Result<Self> {
        let settings = Settings {
            mode,
            bin_width,
            cutoff_probability,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn parallel(bin_width: i32) -> Result<Self> {
        Self::new(FusionMode::Parallel, bin_width, Self::DEFAULT_CUTOFF_PROBABILITY)
    }

    pub fn serial(bin_width: i32, cutoff_probability: f64) -> Result<Self> {
        Self::new(FusionMode::Serial, bin_width, cutoff_probability)
    }

    /// 校验配置
    ///
    /// 分箱宽度必须为正；串行模式下截断概率必须在 (0, 1] 内。
    pub fn validate(&self) -> Result<()> {
        if self.bin_width <= 0 {
            return Err(PositioningError::InvalidConfiguration(format!(
                "分箱宽度必须为正数，当前为 {}",
                self.bin_width
            )));
        }
        if self.mode == FusionMode::Serial
            && !(self.cutoff_probability > 0.0 && self.cutoff_probability <= 1.0)
        {
            return Err(PositioningError::InvalidConfiguration(format!(
                "截断概率必须在 (0, 1] 内，当前为 {}",
                self.cutoff_probability
            )));
        }
        Ok(())
    }

    /// 按融合方式选择策略
    pub fn strategy(&self) -> Box<dyn FusionStrategy> {
        match self.mode {
            FusionMode::Parallel => Box::new(ParallelFusion),
            FusionMode::Serial => Box::new(SerialFusion::new(self.cutoff_probability)),
        }
    }

    /// 从 JSON 解析并校验
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 从持久化 JSON 加载；缺失或无效时使用默认配置
    pub fn from_json_or_default(json: Option<&str>) -> Self {
        match json.map(Self::from_json) {
            Some(Ok(settings)) => {
                log::debug!("已加载配置: {}", settings);
                settings
            }
            Some(Err(e)) => {
                log::error!("解析贝叶斯配置失败，使用默认配置: {}", e);
                Settings::default()
            }
            None => Settings::default(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            mode: FusionMode::Parallel,
            bin_width: Self::DEFAULT_BIN_WIDTH,
            cutoff_probability: Self::DEFAULT_CUTOFF_PROBABILITY,
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settings(mode={}, binWidth={}, cutoff={:.2})",
            self.mode, self.bin_width, self.cutoff_probability
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(Settings::parallel(5).is_ok());
        assert!(Settings::parallel(0).is_err());
        assert!(Settings::serial(5, 1.0).is_ok());
        assert!(Settings::serial(5, 0.0).is_err());
        assert!(Settings::serial(5, 1.2).is_err());
        assert!(Settings::serial(5, f64::NAN).is_err());
        // 并行模式不关心截断概率
        assert!(Settings::new(FusionMode::Parallel, 5, 0.0).is_ok());
    }

    #[test]
    fn test_legacy_json() {
        let json = r#"{"mode":"SERIAL","selectionMethod":"HIGHEST_PROBABILITY","pmfBinWidth":3,"serialCutoffProbability":0.75}"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.mode, FusionMode::Serial);
        assert_eq!(settings.bin_width, 3);
        assert_eq!(settings.cutoff_probability, 0.75);
    }

    #[test]
    fn test_json_fallback() {
        assert_eq!(Settings::from_json_or_default(None), Settings::default());
        assert_eq!(Settings::from_json_or_default(Some("{broken")), Settings::default());
        assert_eq!(
            Settings::from_json_or_default(Some(r#"{"binWidth":-1}"#)),
            Settings::default()
        );

        let json = Settings::serial(4, 0.8).unwrap().to_json().unwrap();
        let restored = Settings::from_json_or_default(Some(&json));
        assert_eq!(restored.bin_width, 4);
        assert_eq!(restored.mode, FusionMode::Serial);
    }

    #[test]
    fn test_strategy_selection() {
        assert_eq!(Settings::parallel(5).unwrap().strategy().name(), "parallel");
        assert_eq!(Settings::serial(5, 0.9).unwrap().strategy().name(), "serial");
    }
}
