use crate::common::{Time, TimeRange};
use serde::{Deserialize, Serialize};
use std::fmt;

/// # Summary
/// 图表实例的唯一标识。
///
/// # Invariants
/// - 在同一个同步引擎内必须唯一。
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChartId(pub String);

impl ChartId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ChartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// # Summary
/// 同步组标识。只有同组图表之间才会交换事件。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct GroupId(pub u32);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 订阅句柄，注销时凭此退订。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

/// # Summary
/// 十字光标位置。`time` 为 None 表示指针已离开图表区域。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrosshairPosition {
    pub time: Option<Time>,
    pub price: Option<f64>,
}

impl CrosshairPosition {
    pub fn at(time: Time, price: f64) -> Self {
        Self {
            time: Some(time),
            price: Some(price),
        }
    }

    pub fn left() -> Self {
        Self {
            time: None,
            price: None,
        }
    }
}

/// # Summary
/// 图表实例发出的、需要跨图表同步的原始事件。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum ChartEvent {
    /// 指针移动（十字光标）
    CrosshairMove(CrosshairPosition),
    /// 可见时间范围变化
    VisibleRangeChange(TimeRange),
}

impl ChartEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChartEvent::CrosshairMove(_) => EventKind::Crosshair,
            ChartEvent::VisibleRangeChange(_) => EventKind::VisibleRange,
        }
    }
}

/// 事件种类；不同种类各自独立合并。
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Crosshair,
    VisibleRange,
}

/// # Summary
/// 跨渲染上下文（进程 / 标签页）传输的同步消息。
///
/// # Invariants
/// - `origin` 为发布方引擎的实例 ID，接收方据此丢弃自己发出的消息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEnvelope {
    pub origin: String,
    pub group: GroupId,
    pub event: ChartEvent,
}
