/// 概率归一化

use std::collections::BTreeMap;

/// 将非负得分归一化为概率分布
///
/// - 空输入返回空
/// - 总和为 0 时（所有证据相互抵消）返回键上的均匀分布，保证总能给出一个猜测
/// - 否则每个值除以总和
pub fn normalize<K: Ord>(scores: BTreeMap<K, f64>) -> BTreeMap<K, f64> {
    if scores.is_empty() {
        return scores;
    }

    let sum: f64 = scores.values().sum();
    if sum == 0.0 {
        let uniform = 1.0 / scores.len() as f64;
        return scores.into_keys().map(|key| (key, uniform)).collect();
    }

    scores
        .into_iter()
        .map(|(key, value)| (key, value / sum))
        .collect()
}
