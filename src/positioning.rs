/// 单元格定位预测器
///
/// 功能：
/// - 从模型目录异步读取直方图与固定接入点（每次预测一次）
/// - 按配置选择并行或串行贝叶斯融合
/// - 无法预测时返回空后验，而不是错误

use std::sync::Arc;

use crate::algorithms::{
    AccessPointSet, Cell, FusionInput, LiveObservation, PmfModel, Posterior, Prediction,
};
use crate::catalog::ModelCatalog;
use crate::error::Result;
use crate::settings::Settings;

/// 使用已解析的模型执行融合（纯同步计算）
///
/// 模型没有直方图、固定接入点为空或单元格为空时返回空后验。
pub fn predict_with_model(
    model: &PmfModel,
    observation: &LiveObservation,
    settings: &Settings,
    cells: &[Cell],
) -> Result<Posterior> {
    settings.validate()?;

    if !model.has_histograms() || model.fixed_access_points().is_empty() {
        log::warn!("模型不可用（分箱宽度 {}），无法预测", model.bin_width());
        return Ok(Posterior::empty());
    }
    if cells.is_empty() {
        log::warn!("单元格列表为空，无法预测");
        return Ok(Posterior::empty());
    }

    let strategy = settings.strategy();
    let posterior = strategy.fuse(&FusionInput::new(model, observation, cells));
    log::debug!("{} 融合后验: {}", strategy.name(), posterior);
    Ok(posterior)
}

/// 定位预测器
pub struct Predictor<C: ModelCatalog> {
    catalog: Arc<C>,
}

impl<C: ModelCatalog> Clone for Predictor<C> {
    fn clone(&self) -> Self {
        Predictor {
            catalog: Arc::clone(&self.catalog),
        }
    }
}

impl<C: ModelCatalog> Predictor<C> {
    pub fn new(catalog: C) -> Self {
        Self::from_shared(Arc::new(catalog))
    }

    /// 与其他任务共享同一个目录
    pub fn from_shared(catalog: Arc<C>) -> Self {
        Predictor { catalog }
    }

    pub fn catalog(&self) -> &Arc<C> {
        &self.catalog
    }

    /// 读取指定分箱宽度的模型
    ///
    /// 没有匹配的直方图或没有固定接入点时返回 `None`（模型不可用）。
    pub async fn load_model(&self, bin_width: i32) -> Result<Option<PmfModel>> {
        let entries = self.catalog.model_entries(bin_width).await?;
        if entries.is_empty() {
            log::warn!("分箱宽度 {} 没有直方图数据，无法预测", bin_width);
            return Ok(None);
        }

        let known = AccessPointSet::from_vec(self.catalog.known_access_points().await?);
        let fixed = known.fixed_ids();
        if fixed.is_empty() {
            log::warn!("模型中没有固定接入点，无法预测");
            return Ok(None);
        }

        Ok(Some(PmfModel::from_entries(bin_width, entries, fixed)))
    }

    /// 计算单元格后验分布
    ///
    /// # 错误
    /// - 配置无效时返回 `InvalidConfiguration`
    /// - 目录读取失败时原样传播
    pub async fn predict(
        &self,
        observation: &LiveObservation,
        settings: &Settings,
        cells: &[Cell],
    ) -> Result<Posterior> {
        settings.validate()?;
        match self.load_model(settings.bin_width).await? {
            Some(model) => predict_with_model(&model, observation, settings, cells),
            None => Ok(Posterior::empty()),
        }
    }

    /// 计算后验并给出最可能的单元格；无法预测时返回 `None`
    pub async fn predict_cell(
        &self,
        observation: &LiveObservation,
        settings: &Settings,
        cells: &[Cell],
    ) -> Result<Option<Prediction>> {
        let posterior = self.predict(observation, settings, cells).await?;
        let prediction = Prediction::from_posterior(posterior, settings.mode);
        if let Some(p) = &prediction {
            log::info!("预测结果: {}", p);
        }
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::{AccessPointId, KnownAccessPoint, ModelEntry};
    use crate::catalog::InMemoryCatalog;
    use crate::settings::FusionMode;

    fn catalog() -> InMemoryCatalog {
        let ap = AccessPointId::new("x");
        InMemoryCatalog::with_data(
            vec![
                ModelEntry::train(ap.clone(), Cell::new("C1"), &[-60, -60, -70], 5).unwrap(),
                ModelEntry::train(ap.clone(), Cell::new("C2"), &[-70, -70, -60], 5).unwrap(),
            ],
            vec![KnownAccessPoint::fixed("x")],
        )
    }

    #[test]
    fn test_predict_with_model_rejects_invalid_settings() {
        let model = PmfModel::default();
        let settings = Settings {
            bin_width: 0,
            ..Settings::default()
        };
        assert!(predict_with_model(&model, &LiveObservation::new(), &settings, &[]).is_err());
    }

    #[test]
    fn test_load_model_unavailable_bin_width() {
        let predictor = Predictor::new(catalog());
        let model = tokio_test::block_on(predictor.load_model(10)).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn test_predict_cell() {
        let predictor = Predictor::new(catalog());
        let observation = LiveObservation::from_pairs(vec![("x", -60)]);
        let cells = Cell::from_labels(&["C1", "C2"]);
        let prediction = tokio_test::block_on(predictor.predict_cell(
            &observation,
            &Settings::default(),
            &cells,
        ))
        .unwrap()
        .unwrap();
        assert_eq!(prediction.cell, Cell::new("C1"));
        assert!((prediction.probability - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(prediction.mode, FusionMode::Parallel);
    }
}
