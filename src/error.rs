//! 定位库错误类型

use thiserror::Error;

/// 定位过程中的错误
///
/// 注意：模型缺失（ModelUnavailable）、单个 AP 在某单元格缺少直方图、
/// 直方图总计数为零等情况都不是错误，它们在推断内部就地处理。
#[derive(Debug, Error)]
pub enum PositioningError {
    /// 配置无效（分箱宽度非正、截断概率越界等）
    #[error("配置无效: {0}")]
    InvalidConfiguration(String),

    /// 无法解析的接入点硬件地址
    #[error("无效的接入点地址: {0}")]
    InvalidAccessPoint(String),

    /// 后验分布不满足非负且总和为 1
    #[error("无效的后验分布: {0}")]
    InvalidPosterior(String),

    /// 模型目录访问失败
    #[error("模型目录错误: {0}")]
    Catalog(String),

    /// I/O 错误
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化/反序列化错误
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),
}

/// 定位库结果类型
pub type Result<T> = std::result::Result<T, PositioningError>;
