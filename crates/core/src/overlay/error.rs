use thiserror::Error;

/// # Summary
/// 交易叠加层错误枚举。
///
/// # Invariants
/// - 所有错误均只影响单笔交易，批处理会跳过该笔并继续。
#[derive(Error, Debug, PartialEq)]
pub enum OverlayError {
    // 时间字段无法解析
    #[error("Invalid time: {0}")]
    InvalidTime(String),
    // 未平仓交易需要图表数据确定出场时间
    #[error("Chart data is empty, cannot resolve open trade exit time")]
    MissingChartData,
    // 价格无法转换为绘图坐标
    #[error("Invalid price: {0}")]
    InvalidPrice(String),
}
