/// 似然模型
///
/// 计算 P(观测 RSSI | 接入点, 单元格) 的直接频率估计，不做平滑。

use crate::algorithms::Histogram;

/// 某 (接入点, 单元格) 完全没有直方图时使用的似然
///
/// 表示“该接入点在任何地方都可能出现，只是没有在这个单元格训练过”，
/// 与“训练过但没有样本”的零质量模型不同。
pub const MISSING_MODEL_LIKELIHOOD: f64 = 1e-5;

/// 零似然的替代值（乘法单位元），并行与串行融合统一使用
pub const DISREGARDED_LIKELIHOOD: f64 = 1.0;

/// 观测值在直方图下的似然
///
/// - 没有直方图：`MISSING_MODEL_LIKELIHOOD`
/// - 直方图总计数为 0：精确的 0.0
/// - 否则：所在箱计数 / 总计数（区间外的观测计数为 0）
pub fn likelihood(histogram: Option<&Histogram>, observed_rssi: i32) -> f64 {
    match histogram {
        None => MISSING_MODEL_LIKELIHOOD,
        Some(histogram) if histogram.is_empty() => 0.0,
        Some(histogram) => histogram.probability_for_rssi(observed_rssi),
    }
}

/// 融合时实际使用的似然
///
/// 零似然被忽略（替换为 `DISREGARDED_LIKELIHOOD`），避免单个空箱否决整个单元格。
pub fn effective_likelihood(likelihood: f64) -> f64 {
    if likelihood == 0.0 {
        DISREGARDED_LIKELIHOOD
    } else {
        likelihood
    }
}
