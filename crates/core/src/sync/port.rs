use crate::common::TimeRange;
use crate::sync::entity::{ChartEvent, CrosshairPosition, SubscriptionId, SyncEnvelope};
use crate::sync::error::SyncError;
use std::sync::Arc;

/// 图表事件回调。
pub type ChartListener = Arc<dyn Fn(ChartEvent) + Send + Sync>;

/// 帧回调，在下一显示帧被调用恰好一次。
pub type FrameCallback = Box<dyn FnOnce() + Send>;

/// 跨上下文消息回调。
pub type TransportListener = Arc<dyn Fn(SyncEnvelope) + Send + Sync>;

/// # Summary
/// 宿主图表实例句柄 (Port)。
///
/// # Invariants
/// - `subscribe` 返回的句柄在 `unsubscribe` 之后不再收到任何事件。
/// - `apply_*` 可能同步地回调监听器（宿主把外部更新当成普通指针/范围事件再抛出来），
///   同步引擎依靠"外部应用中"标记过滤这类回声。
pub trait ChartHandle: Send + Sync {
    /// # Summary
    /// 订阅该图表的指针移动与可见范围变化事件。
    ///
    /// # Arguments
    /// * `listener`: 事件回调。
    ///
    /// # Returns
    /// 用于退订的订阅句柄。
    fn subscribe(&self, listener: ChartListener) -> SubscriptionId;

    /// 退订；对未知句柄静默忽略。
    fn unsubscribe(&self, subscription: SubscriptionId);

    /// 将十字光标移动到给定位置。
    fn apply_crosshair(&self, position: CrosshairPosition) -> Result<(), SyncError>;

    /// 隐藏十字光标。
    fn clear_crosshair(&self) -> Result<(), SyncError>;

    /// 设置可见时间范围。
    fn apply_visible_range(&self, range: TimeRange) -> Result<(), SyncError>;
}

/// # Summary
/// 显示帧调度器 (Port)，通常由宿主的 requestAnimationFrame 等价物实现。
///
/// # Invariants
/// - 每个回调在之后的某一帧被调用恰好一次。
/// - 同一帧内按请求顺序调用。
pub trait FrameScheduler: Send + Sync {
    fn request_frame(&self, callback: FrameCallback);
}

/// # Summary
/// 跨渲染上下文的带外同步通道 (Port)，例如持久化存储通知。
pub trait SyncTransport: Send + Sync {
    /// 向所有订阅方广播一条消息（包括发布方自己）。
    fn publish(&self, envelope: &SyncEnvelope) -> Result<(), SyncError>;

    /// 订阅消息。
    fn subscribe(&self, listener: TransportListener) -> SubscriptionId;

    /// 退订。
    fn unsubscribe(&self, subscription: SubscriptionId);
}
