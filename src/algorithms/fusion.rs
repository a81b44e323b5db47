/// 贝叶斯融合算法
///
/// 支持：
/// - 并行融合（朴素贝叶斯，各接入点独立相乘）
/// - 串行融合（按信号强度依次更新后验，达到截断概率时提前停止）
///
/// 两种策略都遍历全部固定接入点，而不仅是本次观测到的接入点：
/// 未观测到的接入点按 `FLOOR_RSSI` 计算，因为“在某单元格看不到它”本身就是信息。

use std::collections::{BTreeMap, BTreeSet};

use crate::algorithms::{
    AccessPointId, Cell, LiveObservation, PmfModel, Posterior, effective_likelihood, normalize,
};

/// 一次融合所需的全部输入（已解析，不含 I/O）
#[derive(Clone, Debug)]
pub struct FusionInput<'a> {
    model: &'a PmfModel,
    observation: &'a LiveObservation,
    cells: BTreeSet<Cell>,
}

impl<'a> FusionInput<'a> {
    /// 重复的单元格只计一次
    pub fn new(model: &'a PmfModel, observation: &'a LiveObservation, cells: &[Cell]) -> Self {
        FusionInput {
            model,
            observation,
            cells: cells.iter().cloned().collect(),
        }
    }

    fn effective_likelihood(&self, access_point: &AccessPointId, cell: &Cell) -> f64 {
        let observed = self.observation.reading_or_floor(access_point);
        effective_likelihood(self.model.likelihood(access_point, cell, observed))
    }
}

/// 融合策略
pub trait FusionStrategy: Send + Sync {
    /// 策略名称
    fn name(&self) -> &'static str;

    /// 计算单元格后验；单元格集合为空时返回空分布
    fn fuse(&self, input: &FusionInput<'_>) -> Posterior;
}

// ============================================================================
// 并行融合
// ============================================================================

/// 并行（朴素贝叶斯）融合
///
/// score[c] = prior(c) * Π_a eff(a, c)，prior 为均匀分布，最后统一归一化。
///
/// 乘积在对数域中累加，减去最大对数得分后再取指数，
/// 大量接入点（尤其是 ε 回退）不会让所有得分下溢为 0。
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelFusion;

impl FusionStrategy for ParallelFusion {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn fuse(&self, input: &FusionInput<'_>) -> Posterior {
        if input.cells.is_empty() {
            return Posterior::empty();
        }

        let log_prior = (1.0 / input.cells.len() as f64).ln();
        let fixed = input.model.fixed_access_points();

        // 有效似然总在 (0, 1] 内，对数有限
        let log_scores: Vec<(Cell, f64)> = input
            .cells
            .iter()
            .map(|cell| {
                let log_likelihood: f64 = fixed
                    .iter()
                    .map(|ap| input.effective_likelihood(ap, cell).ln())
                    .sum();
                (cell.clone(), log_prior + log_likelihood)
            })
            .collect();

        let max = log_scores
            .iter()
            .map(|(_, score)| *score)
            .fold(f64::NEG_INFINITY, f64::max);
        let scores: BTreeMap<Cell, f64> = log_scores
            .into_iter()
            .map(|(cell, score)| (cell, (score - max).exp()))
            .collect();

        Posterior::from_normalized(normalize(scores))
    }
}

// ============================================================================
// 串行融合
// ============================================================================

/// 串行融合的终止原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// 最大后验达到截断概率
    CutoffReached,
    /// 全部接入点已处理
    Exhausted,
}

/// 串行融合的完整结果
#[derive(Clone, Debug)]
pub struct SerialOutcome {
    pub posterior: Posterior,
    /// 实际参与更新的接入点（按处理顺序）
    pub applied: Vec<AccessPointId>,
    pub stop: StopReason,
}

/// 串行（逐步贝叶斯更新）融合
///
/// 每个接入点的后验作为下一个接入点的先验，信号最强的接入点最先更新。
#[derive(Clone, Copy, Debug)]
pub struct SerialFusion {
    cutoff_probability: f64,
}

impl SerialFusion {
    /// `cutoff_probability` 应在 (0, 1] 内，由 `Settings::validate` 保证
    pub fn new(cutoff_probability: f64) -> Self {
        SerialFusion { cutoff_probability }
    }

    /// 接入点处理顺序：按观测 RSSI 从强到弱，未观测的按下限计算；
    /// 读数相同时保持标识顺序
    pub fn processing_order(
        fixed: &BTreeSet<AccessPointId>,
        observation: &LiveObservation,
    ) -> Vec<AccessPointId> {
        let mut order: Vec<AccessPointId> = fixed.iter().cloned().collect();
        order.sort_by_key(|ap| std::cmp::Reverse(observation.reading_or_floor(ap)));
        order
    }

    /// 执行串行融合并返回处理轨迹
    pub fn run(&self, input: &FusionInput<'_>) -> SerialOutcome {
        if input.cells.is_empty() {
            return SerialOutcome {
                posterior: Posterior::empty(),
                applied: Vec::new(),
                stop: StopReason::Exhausted,
            };
        }

        let order = Self::processing_order(input.model.fixed_access_points(), input.observation);
        log::debug!("串行融合接入点处理顺序:");
        for (i, ap) in order.iter().enumerate() {
            log::debug!(
                "  {}. {} RSSI: {} dBm",
                i + 1,
                ap,
                input.observation.reading_or_floor(ap)
            );
        }

        let uniform = 1.0 / input.cells.len() as f64;
        let mut posterior: BTreeMap<Cell, f64> =
            input.cells.iter().map(|cell| (cell.clone(), uniform)).collect();
        let mut applied = Vec::with_capacity(order.len());

        for ap in order {
            let unnormalized: BTreeMap<Cell, f64> = posterior
                .iter()
                .map(|(cell, &prior)| (cell.clone(), input.effective_likelihood(&ap, cell) * prior))
                .collect();
            posterior = normalize(unnormalized);

            let max = posterior.values().copied().fold(0.0, f64::max);
            log::debug!("串行融合 - 接入点 {} 处理后最大后验 {:.4}", ap, max);
            applied.push(ap);

            if max >= self.cutoff_probability {
                log::info!(
                    "串行融合在第 {} 个接入点后达到截断概率 {:.2}",
                    applied.len(),
                    self.cutoff_probability
                );
                return SerialOutcome {
                    posterior: Posterior::from_normalized(posterior),
                    applied,
                    stop: StopReason::CutoffReached,
                };
            }
        }

        SerialOutcome {
            posterior: Posterior::from_normalized(posterior),
            applied,
            stop: StopReason::Exhausted,
        }
    }
}

impl FusionStrategy for SerialFusion {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn fuse(&self, input: &FusionInput<'_>) -> Posterior {
        self.run(input).posterior
    }
}
