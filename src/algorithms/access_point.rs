/// WiFi 接入点标识与已知接入点登记表

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PositioningError, Result};

/// MAC 地址格式：六组十六进制，以 `:` 或 `-` 分隔
const BSSID_PATTERN: &str = r"^[0-9A-Fa-f]{2}([:-][0-9A-Fa-f]{2}){5}$";

fn bssid_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(BSSID_PATTERN).expect("BSSID 正则表达式错误"))
}

/// 规范化后的接入点标识（BSSID prime）
///
/// 同一物理设备上的多个虚拟 SSID 通常只在 BSSID 最后一个十六进制位上不同，
/// 因此规范形式为小写、冒号分隔、去掉最后一位，例如
/// `20:A7:16:5E:C5:D6` -> `20:a7:16:5e:c5:d`。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessPointId(String);

impl AccessPointId {
    /// 直接使用已规范化的标识（例如从模型目录中读取）
    pub fn new(prime: impl Into<String>) -> Self {
        AccessPointId(prime.into())
    }

    /// 从原始 BSSID 计算规范化标识
    ///
    /// # 错误
    /// - 不是合法的 MAC 地址时返回 `InvalidAccessPoint`
    pub fn from_bssid(bssid: &str) -> Result<Self> {
        let trimmed = bssid.trim();
        if !bssid_regex().is_match(trimmed) {
            return Err(PositioningError::InvalidAccessPoint(bssid.to_string()));
        }
        let mut normalized = trimmed.to_ascii_lowercase().replace('-', ":");
        normalized.pop();
        Ok(AccessPointId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccessPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccessPointId {
    fn from(prime: &str) -> Self {
        AccessPointId::new(prime)
    }
}

/// 接入点在模型中的角色
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApKind {
    /// 固定接入点，属于训练模型，推断时总是参与
    Fixed,
    /// 其他（临时、移动热点等），推断时忽略
    Other,
}

/// 已知接入点
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownAccessPoint {
    pub id: AccessPointId,
    pub kind: ApKind,
}

impl KnownAccessPoint {
    pub fn new(id: AccessPointId, kind: ApKind) -> Self {
        KnownAccessPoint { id, kind }
    }

    pub fn fixed(id: impl Into<String>) -> Self {
        Self::new(AccessPointId::new(id), ApKind::Fixed)
    }

    pub fn other(id: impl Into<String>) -> Self {
        Self::new(AccessPointId::new(id), ApKind::Other)
    }

    pub fn is_fixed(&self) -> bool {
        self.kind == ApKind::Fixed
    }
}

/// 已知接入点登记表
#[derive(Clone, Debug, Default)]
pub struct AccessPointSet {
    access_points: BTreeMap<AccessPointId, KnownAccessPoint>,
}

impl AccessPointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从接入点向量创建；同一标识后者覆盖前者
    pub fn from_vec(access_points: Vec<KnownAccessPoint>) -> Self {
        let mut set = AccessPointSet::new();
        for ap in access_points {
            set.insert(ap);
        }
        set
    }

    pub fn insert(&mut self, ap: KnownAccessPoint) {
        self.access_points.insert(ap.id.clone(), ap);
    }

    /// 固定接入点集合（有序，保证推断结果可复现）
    pub fn fixed_ids(&self) -> BTreeSet<AccessPointId> {
        self.access_points
            .values()
            .filter(|ap| ap.is_fixed())
            .map(|ap| ap.id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.access_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.access_points.is_empty()
    }
}
