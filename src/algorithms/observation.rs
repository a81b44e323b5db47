/// 实时 WiFi 观测数据
///
/// 支持多种输入方式：逐个添加、键值对、原始扫描结果（自动规范化 BSSID）。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::algorithms::AccessPointId;

/// 未观测到的接入点在推断时使用的 RSSI 下限 (dBm)
pub const FLOOR_RSSI: i32 = -100;

/// 单条原始扫描结果
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanReading {
    /// 原始 BSSID（MAC 地址）
    pub bssid: String,
    /// 信号强度 (dBm)
    pub rssi: i32,
}

impl ScanReading {
    pub fn new(bssid: impl Into<String>, rssi: i32) -> Self {
        ScanReading {
            bssid: bssid.into(),
            rssi,
        }
    }
}

/// 一次扫描的观测：接入点 -> RSSI
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveObservation {
    readings: HashMap<AccessPointId, i32>,
}

impl LiveObservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 (已规范化标识, rssi) 对创建
    pub fn from_pairs(pairs: Vec<(&str, i32)>) -> Self {
        let mut observation = LiveObservation::new();
        for (id, rssi) in pairs {
            observation.add(AccessPointId::new(id), rssi);
        }
        observation
    }

    /// 从原始扫描结果创建
    ///
    /// 每个 BSSID 先规范化；同一物理设备的多个虚拟接入点只保留最强信号。
    /// 无法解析的 BSSID 被跳过。
    pub fn from_scan(scan: &[ScanReading]) -> Self {
        let mut observation = LiveObservation::new();
        for reading in scan {
            match AccessPointId::from_bssid(&reading.bssid) {
                Ok(id) => observation.record_strongest(id, reading.rssi),
                Err(e) => log::debug!("忽略扫描结果: {}", e),
            }
        }
        observation
    }

    /// 添加测量（覆盖已有值）
    pub fn add(&mut self, id: AccessPointId, rssi: i32) {
        self.readings.insert(id, rssi);
    }

    /// 添加测量，仅当信号比已有值更强时覆盖
    pub fn record_strongest(&mut self, id: AccessPointId, rssi: i32) {
        self.readings
            .entry(id)
            .and_modify(|current| *current = (*current).max(rssi))
            .or_insert(rssi);
    }

    pub fn get(&self, id: &AccessPointId) -> Option<i32> {
        self.readings.get(id).copied()
    }

    /// 推断时使用的读数：未观测到的接入点视为 `FLOOR_RSSI`
    pub fn reading_or_floor(&self, id: &AccessPointId) -> i32 {
        self.get(id).unwrap_or(FLOOR_RSSI)
    }

    pub fn count(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_observation_floor() {
        let observation = LiveObservation::from_pairs(vec![("aa", -50)]);
        assert_eq!(observation.reading_or_floor(&AccessPointId::new("aa")), -50);
        assert_eq!(observation.reading_or_floor(&AccessPointId::new("bb")), FLOOR_RSSI);
    }

    #[test]
    fn test_from_scan_keeps_strongest() {
        let scan = vec![
            ScanReading::new("20:A7:16:5E:C5:D6", -70),
            ScanReading::new("20:A7:16:5E:C5:D1", -55),
            ScanReading::new("20:A7:16:5E:C5:D3", -80),
            ScanReading::new("garbage", -10),
        ];
        let observation = LiveObservation::from_scan(&scan);
        assert_eq!(observation.count(), 1);
        assert_eq!(observation.get(&AccessPointId::new("20:a7:16:5e:c5:d")), Some(-55));
    }
}
