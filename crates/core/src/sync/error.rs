use crate::sync::entity::ChartId;
use thiserror::Error;

/// # Summary
/// 同步域错误枚举。
///
/// # Invariants
/// - 单个目标图表的 `Apply` 失败只会被记录，不会中断同组其余图表的同步。
#[derive(Error, Debug)]
pub enum SyncError {
    // 图表未注册
    #[error("Chart not registered: {0}")]
    ChartNotFound(ChartId),
    // 同一 ID 重复注册
    #[error("Chart already registered: {0}")]
    AlreadyRegistered(ChartId),
    // 目标图表应用外部更新失败
    #[error("Chart {chart} failed to apply update: {reason}")]
    Apply { chart: ChartId, reason: String },
    // 跨上下文通道错误
    #[error("Transport error: {0}")]
    Transport(String),
    // 消息编解码失败
    #[error("Codec error: {0}")]
    Codec(String),
}
