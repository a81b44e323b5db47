//! 直方图模型目录
//!
//! 目录是推断核心的外部协作者：它保存每 (接入点, 单元格, 分箱宽度) 的直方图
//! 以及已知接入点登记表。读取目录是预测中唯一会挂起的步骤。

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::algorithms::{AccessPointId, Cell, KnownAccessPoint, ModelEntry};
use crate::error::{PositioningError, Result};

/// 模型目录接口
#[async_trait]
pub trait ModelCatalog: Send + Sync {
    /// 指定分箱宽度的全部直方图记录
    async fn model_entries(&self, bin_width: i32) -> Result<Vec<ModelEntry>>;

    /// 全部已知接入点（固定与其他）
    async fn known_access_points(&self) -> Result<Vec<KnownAccessPoint>>;
}

/// 单条训练样本
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub access_point: AccessPointId,
    pub cell: Cell,
    pub rssi: i32,
}

impl TrainingSample {
    pub fn new(access_point: AccessPointId, cell: Cell, rssi: i32) -> Self {
        TrainingSample {
            access_point,
            cell,
            rssi,
        }
    }
}

/// 内存中的模型目录，可从 JSON 文件加载或保存
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    entries: Vec<ModelEntry>,
    access_points: Vec<KnownAccessPoint>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(entries: Vec<ModelEntry>, access_points: Vec<KnownAccessPoint>) -> Self {
        InMemoryCatalog {
            entries,
            access_points,
        }
    }

    pub fn add_entry(&mut self, entry: ModelEntry) {
        self.entries.push(entry);
    }

    pub fn add_access_point(&mut self, access_point: KnownAccessPoint) {
        self.access_points.push(access_point);
    }

    /// 由训练样本构建直方图
    ///
    /// 按 (接入点, 单元格) 分组，为每个分箱宽度各生成一条记录。
    /// 返回新增的记录数。
    ///
    /// # 错误
    /// - 任一分箱宽度非正时返回 `InvalidConfiguration`，目录保持不变
    pub fn train(&mut self, samples: &[TrainingSample], bin_widths: &[i32]) -> Result<usize> {
        let mut groups: BTreeMap<(&AccessPointId, &Cell), Vec<i32>> = BTreeMap::new();
        for sample in samples {
            groups
                .entry((&sample.access_point, &sample.cell))
                .or_default()
                .push(sample.rssi);
        }

        let mut trained = Vec::with_capacity(groups.len() * bin_widths.len());
        for ((access_point, cell), rssi_values) in &groups {
            for &bin_width in bin_widths {
                trained.push(ModelEntry::train(
                    (*access_point).clone(),
                    (*cell).clone(),
                    rssi_values,
                    bin_width,
                )?);
            }
        }

        let added = trained.len();
        log::info!(
            "训练完成: {} 组样本, {} 种分箱宽度, 新增 {} 条直方图",
            groups.len(),
            bin_widths.len(),
            added
        );
        self.entries.extend(trained);
        Ok(added)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    pub fn access_points(&self) -> &[KnownAccessPoint] {
        &self.access_points
    }

    /// 从 JSON 文件加载目录
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await?;
        let catalog: InMemoryCatalog = serde_json::from_str(&content).map_err(|e| {
            PositioningError::Catalog(format!("无法解析模型目录 {}: {}", path.display(), e))
        })?;
        log::info!(
            "已加载模型目录 {}: {} 条直方图, {} 个已知接入点",
            path.display(),
            catalog.entries.len(),
            catalog.access_points.len()
        );
        Ok(catalog)
    }

    /// 保存目录为 JSON 文件
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl ModelCatalog for InMemoryCatalog {
    async fn model_entries(&self, bin_width: i32) -> Result<Vec<ModelEntry>> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.bin_width() == bin_width)
            .cloned()
            .collect())
    }

    async fn known_access_points(&self) -> Result<Vec<KnownAccessPoint>> {
        Ok(self.access_points.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::Histogram;

    #[test]
    fn test_train_groups_samples() {
        let ap = AccessPointId::new("aa");
        let samples = vec![
            TrainingSample::new(ap.clone(), Cell::new("C1"), -60),
            TrainingSample::new(ap.clone(), Cell::new("C1"), -62),
            TrainingSample::new(ap.clone(), Cell::new("C2"), -80),
        ];
        let mut catalog = InMemoryCatalog::new();
        let added = catalog.train(&samples, &[1, 5]).unwrap();
        assert_eq!(added, 4);

        let c1 = catalog
            .entries()
            .iter()
            .find(|e| e.cell == Cell::new("C1") && e.bin_width() == 5)
            .unwrap();
        assert_eq!(c1.histogram.total_count(), 2);
    }

    #[test]
    fn test_train_rejects_invalid_bin_width() {
        let samples = vec![TrainingSample::new(AccessPointId::new("aa"), Cell::new("C1"), -60)];
        let mut catalog = InMemoryCatalog::new();
        assert!(catalog.train(&samples, &[5, 0]).is_err());
        assert!(catalog.entries().is_empty());
    }

    #[test]
    fn test_model_entries_filtered_by_bin_width() {
        let samples = vec![TrainingSample::new(AccessPointId::new("aa"), Cell::new("C1"), -60)];
        let mut catalog = InMemoryCatalog::new();
        catalog.train(&samples, &[2, 5]).unwrap();
        catalog.add_entry(ModelEntry::new(
            AccessPointId::new("bb"),
            Cell::new("C1"),
            Histogram::new(&[-70], 10).unwrap(),
        ));

        let entries = tokio_test::block_on(catalog.model_entries(5)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(tokio_test::block_on(catalog.model_entries(10)).unwrap().len(), 1);
        assert_eq!(entries[0].bin_width(), 5);
        assert!(tokio_test::block_on(catalog.model_entries(7)).unwrap().is_empty());
    }
}
