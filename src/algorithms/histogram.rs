/// RSSI 直方图与概率质量函数（PMF）
///
/// 直方图在训练阶段构建一次，之后只读。分箱在 `[min_value, max_value]`
/// 闭区间上等宽划分，使用稠密数组存储，计数为 0 的箱依然存在，
/// 从而区分“该箱没有样本”与“根本没有模型”。

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PositioningError, Result};

/// 默认 RSSI 下限 (dBm)
pub const DEFAULT_MIN_RSSI: i32 = -100;
/// 默认 RSSI 上限 (dBm)
pub const DEFAULT_MAX_RSSI: i32 = 0;

/// 固定宽度分箱的 RSSI 直方图
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HistogramRecord", into = "HistogramRecord")]
pub struct Histogram {
    bin_width: i32,
    min_value: i32,
    max_value: i32,
    /// 第 i 个元素对应起点为 `min_value + i * bin_width` 的箱
    counts: Vec<u32>,
    total_count: u32,
}

/// 序列化时使用的扁平记录
#[derive(Clone, Debug, Serialize, Deserialize)]
struct HistogramRecord {
    bin_width: i32,
    min_value: i32,
    max_value: i32,
    counts: Vec<u32>,
}

impl Histogram {
    /// 使用默认范围 [-100, 0] 从原始样本构建直方图
    pub fn new(samples: &[i32], bin_width: i32) -> Result<Self> {
        Self::with_range(samples, bin_width, DEFAULT_MIN_RSSI, DEFAULT_MAX_RSSI)
    }

    /// 在指定闭区间上从原始样本构建直方图
    ///
    /// 区间外的样本被丢弃，不计入 `total_count`。
    ///
    /// # 错误
    /// - `bin_width <= 0` 或 `min_value > max_value` 时返回 `InvalidConfiguration`
    /// - 计入的样本数超出 `u32` 时返回 `InvalidConfiguration`
    pub fn with_range(
        samples: &[i32],
        bin_width: i32,
        min_value: i32,
        max_value: i32,
    ) -> Result<Self> {
        let bin_count = Self::bin_count_for(bin_width, min_value, max_value)?;
        let mut histogram = Histogram {
            bin_width,
            min_value,
            max_value,
            counts: vec![0; bin_count],
            total_count: 0,
        };

        for &sample in samples {
            if let Some(index) = histogram.bin_index(sample) {
                histogram.counts[index] += 1;
                histogram.total_count = histogram
                    .total_count
                    .checked_add(1)
                    .ok_or_else(|| Self::overflow(bin_width))?;
            }
        }

        Ok(histogram)
    }

    /// 从已有的稠密计数恢复直方图（例如从模型目录加载）
    pub fn from_counts(
        bin_width: i32,
        min_value: i32,
        max_value: i32,
        counts: Vec<u32>,
    ) -> Result<Self> {
        let bin_count = Self::bin_count_for(bin_width, min_value, max_value)?;
        if counts.len() != bin_count {
            return Err(PositioningError::InvalidConfiguration(format!(
                "计数长度 {} 与范围 [{}, {}] / 宽度 {} 所需的 {} 个箱不一致",
                counts.len(),
                min_value,
                max_value,
                bin_width,
                bin_count
            )));
        }
        // 计数来自外部数据，溢出时拒绝而不是回绕
        let total_count = counts
            .iter()
            .try_fold(0u32, |total, &count| total.checked_add(count))
            .ok_or_else(|| Self::overflow(bin_width))?;
        Ok(Histogram {
            bin_width,
            min_value,
            max_value,
            counts,
            total_count,
        })
    }

    fn bin_count_for(bin_width: i32, min_value: i32, max_value: i32) -> Result<usize> {
        if bin_width <= 0 {
            return Err(PositioningError::InvalidConfiguration(format!(
                "分箱宽度必须为正数，当前为 {}",
                bin_width
            )));
        }
        if min_value > max_value {
            return Err(PositioningError::InvalidConfiguration(format!(
                "RSSI 范围无效: [{}, {}]",
                min_value, max_value
            )));
        }
        let span = max_value as i64 - min_value as i64;
        Ok((span / bin_width as i64) as usize + 1)
    }

    fn overflow(bin_width: i32) -> PositioningError {
        PositioningError::InvalidConfiguration(format!(
            "宽度 {} 的直方图总计数超出 u32 范围",
            bin_width
        ))
    }

    /// 数值所在箱的下标；区间外返回 None
    fn bin_index(&self, value: i32) -> Option<usize> {
        if value < self.min_value || value > self.max_value {
            return None;
        }
        // value >= min_value，整数除法即向下取整
        let offset = value as i64 - self.min_value as i64;
        Some((offset / self.bin_width as i64) as usize)
    }

    fn bin_start(&self, index: usize) -> i32 {
        // 箱起点不超过 max_value，但中间乘积可能超出 i32
        let start = self.min_value as i64 + index as i64 * self.bin_width as i64;
        start as i32
    }

    /// 数值所属箱的起点；区间外没有所属箱
    pub fn bin_start_for_rssi(&self, value: i32) -> Option<i32> {
        self.bin_index(value).map(|index| self.bin_start(index))
    }

    /// 数值所属箱的计数；区间外为 0
    pub fn count_for_rssi(&self, value: i32) -> u32 {
        self.bin_index(value)
            .map(|index| self.counts[index])
            .unwrap_or(0)
    }

    /// 数值所属箱的概率质量；总计数为 0 时为 0.0
    pub fn probability_for_rssi(&self, value: i32) -> f64 {
        if self.total_count == 0 {
            return 0.0;
        }
        self.count_for_rssi(value) as f64 / self.total_count as f64
    }

    /// 概率质量函数：箱起点 -> 概率
    ///
    /// 总计数为 0 时所有箱的概率均为 0.0（显式的零质量模型，而非错误）。
    pub fn pmf(&self) -> BTreeMap<i32, f64> {
        self.counts
            .iter()
            .enumerate()
            .map(|(index, &count)| {
                let p = if self.total_count == 0 {
                    0.0
                } else {
                    count as f64 / self.total_count as f64
                };
                (self.bin_start(index), p)
            })
            .collect()
    }

    /// 稠密的箱计数：箱起点 -> 计数
    pub fn bins(&self) -> BTreeMap<i32, u32> {
        self.counts
            .iter()
            .enumerate()
            .map(|(index, &count)| (self.bin_start(index), count))
            .collect()
    }

    /// 近似平均 RSSI：以箱中心乘以概率求和
    ///
    /// 没有样本时返回 `min_value`。
    pub fn approximate_average_rssi(&self) -> f64 {
        if self.total_count == 0 {
            return self.min_value as f64;
        }
        let half_width = self.bin_width as f64 / 2.0;
        self.pmf()
            .iter()
            .map(|(&start, &p)| (start as f64 + half_width) * p)
            .sum()
    }

    pub fn bin_width(&self) -> i32 {
        self.bin_width
    }

    pub fn min_value(&self) -> i32 {
        self.min_value
    }

    pub fn max_value(&self) -> i32 {
        self.max_value
    }

    /// 实际计入的样本数
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    /// 箱的数量
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    /// 是否为零质量模型
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

impl TryFrom<HistogramRecord> for Histogram {
    type Error = PositioningError;

    fn try_from(record: HistogramRecord) -> Result<Self> {
        Histogram::from_counts(
            record.bin_width,
            record.min_value,
            record.max_value,
            record.counts,
        )
    }
}

impl From<Histogram> for HistogramRecord {
    fn from(histogram: Histogram) -> Self {
        HistogramRecord {
            bin_width: histogram.bin_width,
            min_value: histogram.min_value,
            max_value: histogram.max_value,
            counts: histogram.counts,
        }
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Histogram(binWidth={}, totalCount={}, range=[{}, {}])",
            self.bin_width, self.total_count, self.min_value, self.max_value
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binning_boundaries() {
        let histogram = Histogram::new(&[], 5).unwrap();
        assert_eq!(histogram.bin_start_for_rssi(-77), Some(-80));
        assert_eq!(histogram.bin_start_for_rssi(0), Some(0));
        assert_eq!(histogram.bin_start_for_rssi(-100), Some(-100));
        assert_eq!(histogram.bin_start_for_rssi(-1), Some(-5));
        assert_eq!(histogram.bin_start_for_rssi(-101), None);
        assert_eq!(histogram.bin_start_for_rssi(1), None);
    }

    #[test]
    fn test_dense_bins() {
        let histogram = Histogram::new(&[-77], 5).unwrap();
        let bins = histogram.bins();
        // -100, -95, ..., 0
        assert_eq!(bins.len(), 21);
        assert_eq!(histogram.bin_count(), 21);
        assert_eq!(bins[&-100], 0);
        assert_eq!(bins[&-80], 1);
        assert_eq!(bins[&0], 0);
    }

    #[test]
    fn test_max_value_not_a_bin_start() {
        let histogram = Histogram::with_range(&[-1, -3, -100], 5, -100, -1).unwrap();
        assert_eq!(histogram.bin_count(), 20);
        assert_eq!(histogram.bin_start_for_rssi(-1), Some(-5));
        assert_eq!(histogram.count_for_rssi(-2), 2);
        assert_eq!(histogram.total_count(), 3);
    }

    #[test]
    fn test_out_of_range_samples_discarded() {
        let histogram = Histogram::new(&[-120, -95, 5, -95, -90], 5).unwrap();
        assert_eq!(histogram.total_count(), 3);
        assert_eq!(histogram.count_for_rssi(-95), 2);
        assert_eq!(histogram.count_for_rssi(-120), 0);
        let sum: u32 = histogram.bins().values().sum();
        assert_eq!(sum, histogram.total_count());
    }

    #[test]
    fn test_invalid_bin_width() {
        assert!(matches!(
            Histogram::new(&[-50], 0),
            Err(PositioningError::InvalidConfiguration(_))
        ));
        assert!(Histogram::new(&[-50], -5).is_err());
        assert!(Histogram::with_range(&[], 5, 0, -100).is_err());
    }

    #[test]
    fn test_pmf() {
        let mut samples = vec![-95; 9];
        samples.push(-90);
        let histogram = Histogram::new(&samples, 5).unwrap();
        let pmf = histogram.pmf();
        assert!((pmf[&-95] - 0.9).abs() < 1e-12);
        assert!((pmf[&-90] - 0.1).abs() < 1e-12);
        assert_eq!(pmf[&-100], 0.0);
        assert!((pmf.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_mass_pmf() {
        let histogram = Histogram::new(&[-150], 10).unwrap();
        assert!(histogram.is_empty());
        assert!(histogram.pmf().values().all(|&p| p == 0.0));
        assert_eq!(histogram.probability_for_rssi(-50), 0.0);
        assert_eq!(histogram.approximate_average_rssi(), -100.0);
    }

    #[test]
    fn test_approximate_average() {
        let histogram = Histogram::new(&[-60, -60, -50, -50], 10).unwrap();
        // 箱中心 -55 与 -45 各占一半
        assert!((histogram.approximate_average_rssi() - (-50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_serde_validation() {
        let histogram = Histogram::new(&[-70, -71, -40], 10).unwrap();
        let json = serde_json::to_string(&histogram).unwrap();
        let restored: Histogram = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, histogram);

        let broken = r#"{"bin_width":10,"min_value":-100,"max_value":0,"counts":[1,2]}"#;
        assert!(serde_json::from_str::<Histogram>(broken).is_err());
    }

    #[test]
    fn test_total_count_overflow_rejected() {
        let overflowing = r#"{"bin_width":50,"min_value":-100,"max_value":0,"counts":[4294967295,1,0]}"#;
        assert!(serde_json::from_str::<Histogram>(overflowing).is_err());
        assert!(matches!(
            Histogram::from_counts(50, -100, 0, vec![u32::MAX, 1, 0]),
            Err(PositioningError::InvalidConfiguration(_))
        ));

        let full = Histogram::from_counts(50, -100, 0, vec![u32::MAX, 0, 0]).unwrap();
        assert_eq!(full.total_count(), u32::MAX);
    }

    #[test]
    fn test_extreme_range_bin_starts() {
        let histogram = Histogram::with_range(&[i32::MAX], i32::MAX, i32::MIN, i32::MAX).unwrap();
        let starts: Vec<i32> = histogram.bins().keys().copied().collect();
        assert_eq!(starts, vec![i32::MIN, -1, i32::MAX - 1]);
        assert_eq!(histogram.bin_start_for_rssi(i32::MAX), Some(i32::MAX - 1));
        assert_eq!(histogram.pmf()[&(i32::MAX - 1)], 1.0);
    }
}
