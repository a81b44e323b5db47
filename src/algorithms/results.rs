/// 定位结果数据结构
///
/// 包含单元格后验分布以及据此得出的最终猜测

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithms::Cell;
use crate::error::PositioningError;
use crate::settings::FusionMode;

/// 反序列化后验时允许的总和误差
const POSTERIOR_SUM_TOLERANCE: f64 = 1e-6;

/// 单元格后验分布
///
/// 非空时所有概率非负且总和为 1.0（浮点误差内）；空分布表示无法预测。
/// 反序列化时重新校验这一点。
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Cell, f64>",
    into = "BTreeMap<Cell, f64>"
)]
pub struct Posterior {
    probabilities: BTreeMap<Cell, f64>,
}

impl Posterior {
    /// 空分布（无法预测）
    pub fn empty() -> Self {
        Self::default()
    }

    /// 单元格上的均匀分布
    pub fn uniform<'a>(cells: impl IntoIterator<Item = &'a Cell>) -> Self {
        let cells: Vec<&Cell> = cells.into_iter().collect();
        if cells.is_empty() {
            return Self::empty();
        }
        let p = 1.0 / cells.len() as f64;
        Posterior {
            probabilities: cells.into_iter().map(|cell| (cell.clone(), p)).collect(),
        }
    }

    /// 包装已经归一化的概率表
    pub(crate) fn from_normalized(probabilities: BTreeMap<Cell, f64>) -> Self {
        Posterior { probabilities }
    }

    pub fn get(&self, cell: &Cell) -> Option<f64> {
        self.probabilities.get(cell).copied()
    }

    /// 概率最高的单元格；并列时取标签顺序最前的一个
    pub fn most_likely(&self) -> Option<(&Cell, f64)> {
        let mut best: Option<(&Cell, f64)> = None;
        for (cell, &p) in &self.probabilities {
            match best {
                Some((_, best_p)) if p <= best_p => {}
                _ => best = Some((cell, p)),
            }
        }
        best
    }

    /// 最大后验概率；空分布为 0.0
    pub fn max_probability(&self) -> f64 {
        self.most_likely().map(|(_, p)| p).unwrap_or(0.0)
    }

    /// 概率总和
    pub fn total(&self) -> f64 {
        self.probabilities.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Cell, &f64)> {
        self.probabilities.iter()
    }

    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }
}

impl TryFrom<BTreeMap<Cell, f64>> for Posterior {
    type Error = PositioningError;

    fn try_from(probabilities: BTreeMap<Cell, f64>) -> Result<Self, Self::Error> {
        if let Some((cell, p)) = probabilities
            .iter()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(PositioningError::InvalidPosterior(format!(
                "单元格 {} 的概率 {} 无效",
                cell, p
            )));
        }
        let total: f64 = probabilities.values().sum();
        if !probabilities.is_empty() && (total - 1.0).abs() > POSTERIOR_SUM_TOLERANCE {
            return Err(PositioningError::InvalidPosterior(format!(
                "概率总和为 {}",
                total
            )));
        }
        Ok(Posterior { probabilities })
    }
}

impl From<Posterior> for BTreeMap<Cell, f64> {
    fn from(posterior: Posterior) -> Self {
        posterior.probabilities
    }
}

impl fmt::Display for Posterior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (cell, p)) in self.probabilities.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:.3}", cell, p)?;
        }
        write!(f, "}}")
    }
}

/// 一次预测的最终结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Prediction {
    /// 猜测的单元格
    pub cell: Cell,
    /// 该单元格的后验概率
    pub probability: f64,
    /// 完整后验分布
    pub posterior: Posterior,
    /// 使用的融合方式
    pub mode: FusionMode,
    /// 时间戳
    pub timestamp: DateTime<Utc>,
}

impl Prediction {
    /// 由后验分布得出预测；空分布返回 None
    pub fn from_posterior(posterior: Posterior, mode: FusionMode) -> Option<Self> {
        let (cell, probability) = posterior
            .most_likely()
            .map(|(cell, p)| (cell.clone(), p))?;
        Some(Prediction {
            cell,
            probability,
            posterior,
            mode,
            timestamp: Utc::now(),
        })
    }

    /// 是否为高置信度结果
    pub fn is_confident(&self, threshold: f64) -> bool {
        self.probability >= threshold
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:.1}%]", self.cell, self.probability * 100.0)
    }
}
