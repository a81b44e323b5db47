/// 定位单元格标签

use std::fmt;

use serde::{Deserialize, Serialize};

/// 离散位置标签（例如 "C1"），没有内部结构，按值比较
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cell(String);

impl Cell {
    pub fn new(label: impl Into<String>) -> Self {
        Cell(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// 由标签列表构造单元格列表
    pub fn from_labels(labels: &[&str]) -> Vec<Cell> {
        labels.iter().map(|label| Cell::new(*label)).collect()
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cell {
    fn from(label: &str) -> Self {
        Cell::new(label)
    }
}
