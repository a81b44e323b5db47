/// 每 (接入点, 单元格) 的直方图模型
///
/// `ModelEntry` 是模型目录中的一条记录；`PmfModel` 是某一分箱宽度下
/// 已经解析好的只读模型，推断核心只依赖它，不做任何 I/O。

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::algorithms::{AccessPointId, Cell, Histogram, likelihood};
use crate::error::Result;

/// 模型目录记录：(接入点, 单元格, 分箱宽度) -> 直方图
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub access_point: AccessPointId,
    pub cell: Cell,
    pub histogram: Histogram,
}

impl ModelEntry {
    pub fn new(access_point: AccessPointId, cell: Cell, histogram: Histogram) -> Self {
        ModelEntry {
            access_point,
            cell,
            histogram,
        }
    }

    /// 由训练样本直接构建记录（默认 RSSI 范围）
    pub fn train(
        access_point: AccessPointId,
        cell: Cell,
        samples: &[i32],
        bin_width: i32,
    ) -> Result<Self> {
        let histogram = Histogram::new(samples, bin_width)?;
        Ok(Self::new(access_point, cell, histogram))
    }

    pub fn bin_width(&self) -> i32 {
        self.histogram.bin_width()
    }
}

/// 某一分箱宽度下的完整模型
#[derive(Clone, Debug, Default)]
pub struct PmfModel {
    bin_width: i32,
    histograms: HashMap<AccessPointId, HashMap<Cell, Histogram>>,
    fixed_access_points: BTreeSet<AccessPointId>,
}

impl PmfModel {
    /// 由目录记录和固定接入点集合构建模型
    ///
    /// 分箱宽度不匹配的记录被丢弃；同一 (接入点, 单元格) 出现多次时保留最后一条。
    pub fn from_entries(
        bin_width: i32,
        entries: Vec<ModelEntry>,
        fixed_access_points: BTreeSet<AccessPointId>,
    ) -> Self {
        let mut histograms: HashMap<AccessPointId, HashMap<Cell, Histogram>> = HashMap::new();
        for entry in entries {
            if entry.bin_width() != bin_width {
                continue;
            }
            histograms
                .entry(entry.access_point)
                .or_default()
                .insert(entry.cell, entry.histogram);
        }

        PmfModel {
            bin_width,
            histograms,
            fixed_access_points,
        }
    }

    pub fn bin_width(&self) -> i32 {
        self.bin_width
    }

    /// 参与融合的固定接入点（有序）
    pub fn fixed_access_points(&self) -> &BTreeSet<AccessPointId> {
        &self.fixed_access_points
    }

    /// 是否存在任何直方图
    pub fn has_histograms(&self) -> bool {
        !self.histograms.is_empty()
    }

    /// 模型中直方图的总数
    pub fn histogram_count(&self) -> usize {
        self.histograms.values().map(HashMap::len).sum()
    }

    pub fn histogram(&self, access_point: &AccessPointId, cell: &Cell) -> Option<&Histogram> {
        self.histograms
            .get(access_point)
            .and_then(|by_cell| by_cell.get(cell))
    }

    /// P(observed_rssi | access_point, cell)，缺失与零质量的情况按似然模型处理
    pub fn likelihood(&self, access_point: &AccessPointId, cell: &Cell, observed_rssi: i32) -> f64 {
        let histogram = self.histogram(access_point, cell);
        let value = likelihood::likelihood(histogram, observed_rssi);

        match histogram {
            None => log::debug!(
                "接入点 {} 在单元格 {} 没有直方图，使用缺省似然 {}",
                access_point,
                cell,
                value
            ),
            Some(h) if h.is_empty() => log::debug!(
                "接入点 {} 在单元格 {} 的直方图总计数为 0，似然为 0.0",
                access_point,
                cell
            ),
            Some(_) if value == 0.0 => log::debug!(
                "接入点 {} (RSSI {}) 在单元格 {} 的所在箱计数为 0",
                access_point,
                observed_rssi,
                cell
            ),
            Some(_) => {}
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_filters_bin_width() {
        let ap = AccessPointId::new("aa");
        let entries = vec![
            ModelEntry::train(ap.clone(), Cell::new("C1"), &[-60], 5).unwrap(),
            ModelEntry::train(ap.clone(), Cell::new("C2"), &[-60], 10).unwrap(),
        ];
        let model = PmfModel::from_entries(5, entries, BTreeSet::from([ap.clone()]));
        assert_eq!(model.histogram_count(), 1);
        assert!(model.histogram(&ap, &Cell::new("C1")).is_some());
        assert!(model.histogram(&ap, &Cell::new("C2")).is_none());
    }

    #[test]
    fn test_model_likelihood() {
        let ap = AccessPointId::new("aa");
        let entries = vec![ModelEntry::train(ap.clone(), Cell::new("C1"), &[-60, -70], 5).unwrap()];
        let model = PmfModel::from_entries(5, entries, BTreeSet::new());
        assert!((model.likelihood(&ap, &Cell::new("C1"), -58) - 0.5).abs() < 1e-12);
        assert_eq!(
            model.likelihood(&ap, &Cell::new("C2"), -58),
            likelihood::MISSING_MODEL_LIKELIHOOD
        );
    }
}
