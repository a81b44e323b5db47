//! cellnav - 基于 WiFi RSSI 直方图的贝叶斯单元格定位
//!
//! - `algorithms`：纯计算的推断核心（直方图、似然、融合、归一化）
//! - `positioning`：从模型目录读取模型并执行预测
//! - `catalog`：模型目录接口与内存实现
//! - `settings`：预测配置
//! - `evaluation`：离线准确率评估

pub mod algorithms;
pub mod catalog;
pub mod error;
pub mod evaluation;
pub mod positioning;
pub mod settings;

pub use error::{PositioningError, Result};
pub use settings::{FusionMode, Settings};
