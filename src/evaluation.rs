//! 离线准确率评估
//!
//! 对带真实单元格标签的测试扫描逐条预测，统计正确率并生成逐条明细。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithms::{Cell, LiveObservation, Prediction};
use crate::catalog::ModelCatalog;
use crate::error::Result;
use crate::positioning::{Predictor, predict_with_model};
use crate::settings::Settings;

/// 带标签的测试扫描
#[derive(Clone, Debug)]
pub struct LabeledScan {
    /// 扫描时间（毫秒时间戳）
    pub timestamp_millis: i64,
    /// 真实单元格
    pub cell: Cell,
    pub observation: LiveObservation,
}

impl LabeledScan {
    pub fn new(timestamp_millis: i64, cell: Cell, observation: LiveObservation) -> Self {
        LabeledScan {
            timestamp_millis,
            cell,
            observation,
        }
    }
}

/// 单条测试结果状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleStatus {
    Correct,
    Incorrect,
    /// 扫描中没有任何接入点
    NoApsDetected,
    /// 模型不可用，后验为空
    NoPredictionPossible,
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SampleStatus::Correct => "CORRECT",
            SampleStatus::Incorrect => "INCORRECT",
            SampleStatus::NoApsDetected => "NO_APS_DETECTED",
            SampleStatus::NoPredictionPossible => "NO_PREDICTION_POSSIBLE",
        };
        f.write_str(text)
    }
}

/// 单条测试结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleOutcome {
    pub timestamp: DateTime<Utc>,
    pub actual: Cell,
    pub predicted: Option<Cell>,
    pub probability: Option<f64>,
    pub status: SampleStatus,
}

impl fmt::Display for SampleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let predicted = self
            .predicted
            .as_ref()
            .map(Cell::to_string)
            .unwrap_or_else(|| "N/A".to_string());
        let probability = self
            .probability
            .map(|p| format!("{:.3}", p))
            .unwrap_or_else(|| "N/A".to_string());
        write!(
            f,
            "Time: {}, True: {}, Pred: {}, Prob: {}, Status: {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.actual,
            predicted,
            probability,
            self.status
        )
    }
}

/// 评估报告
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub outcomes: Vec<SampleOutcome>,
}

impl EvaluationReport {
    /// 预测正确的样本数
    pub fn correct(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SampleStatus::Correct)
            .count()
    }

    /// 样本总数（包含无法预测的样本）
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// 准确率（百分比）；没有样本时为 0
    pub fn accuracy_percent(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.correct() as f64 / self.total() as f64 * 100.0
    }

    /// 逐条明细，每行一条
    pub fn details(&self) -> String {
        self.outcomes
            .iter()
            .map(|o| format!("{}\n", o))
            .collect()
    }

    pub fn summary(&self) -> String {
        format!(
            "准确率: {:.2}% (正确 {}/{})",
            self.accuracy_percent(),
            self.correct(),
            self.total()
        )
    }
}

/// 对全部测试扫描执行预测并统计准确率
///
/// 模型只读取一次，供所有样本复用。
pub async fn evaluate<C: ModelCatalog>(
    predictor: &Predictor<C>,
    samples: &[LabeledScan],
    settings: &Settings,
    cells: &[Cell],
) -> Result<EvaluationReport> {
    settings.validate()?;
    let model = predictor.load_model(settings.bin_width).await?;

    let mut report = EvaluationReport::default();
    for sample in samples {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(sample.timestamp_millis)
            .unwrap_or_default();
        let mut outcome = SampleOutcome {
            timestamp,
            actual: sample.cell.clone(),
            predicted: None,
            probability: None,
            status: SampleStatus::NoApsDetected,
        };

        if !sample.observation.is_empty() {
            let prediction = match &model {
                Some(model) => {
                    let posterior =
                        predict_with_model(model, &sample.observation, settings, cells)?;
                    Prediction::from_posterior(posterior, settings.mode)
                }
                None => None,
            };

            match prediction {
                Some(prediction) => {
                    outcome.status = if prediction.cell == sample.cell {
                        SampleStatus::Correct
                    } else {
                        SampleStatus::Incorrect
                    };
                    outcome.predicted = Some(prediction.cell);
                    outcome.probability = Some(prediction.probability);
                }
                None => outcome.status = SampleStatus::NoPredictionPossible,
            }
        }

        report.outcomes.push(outcome);
    }

    log::info!("评估完成（{} 模式）: {}", settings.mode, report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let report = EvaluationReport::default();
        assert_eq!(report.accuracy_percent(), 0.0);
        assert_eq!(report.total(), 0);
    }

    #[test]
    fn test_outcome_line() {
        let outcome = SampleOutcome {
            timestamp: DateTime::<Utc>::from_timestamp_millis(0).unwrap(),
            actual: Cell::new("C3"),
            predicted: None,
            probability: None,
            status: SampleStatus::NoPredictionPossible,
        };
        assert_eq!(
            outcome.to_string(),
            "Time: 1970-01-01 00:00:00, True: C3, Pred: N/A, Prob: N/A, Status: NO_PREDICTION_POSSIBLE"
        );
    }
}
