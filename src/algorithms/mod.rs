/// 单元格定位推断核心
///
/// 该模块提供 WiFi 指纹贝叶斯定位的全部纯计算部分：
/// - RSSI 直方图与概率质量函数
/// - 带缺省策略的似然模型
/// - 并行 / 串行两种贝叶斯融合策略
/// - 带均匀回退的归一化

pub mod access_point;
pub mod cell;
pub mod fusion;
pub mod histogram;
pub mod likelihood;
pub mod model;
pub mod normalize;
pub mod observation;
pub mod results;

pub use access_point::*;
pub use cell::*;
pub use fusion::*;
pub use histogram::*;
pub use likelihood::*;
pub use model::*;
pub use normalize::*;
pub use observation::*;
pub use results::*;
