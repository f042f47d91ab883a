//! 测试替身：记录型绘图表面、线性坐标换算器以及模拟图表句柄。
//!
//! 仅在 `test-utils` feature 下编译，供各实现 crate 的集成测试使用。

use crate::common::{BitmapSize, Color, Point, Rect, Time, TimeRange};
use crate::series::port::{CoordinateConverter, DrawingSurface};
use crate::style::entity::Stroke;
use crate::sync::entity::{ChartEvent, CrosshairPosition, SubscriptionId};
use crate::sync::error::SyncError;
use crate::sync::port::{ChartHandle, ChartListener};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

/// 一次绘图调用的记录。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Stroke { points: Vec<Point>, stroke: Stroke },
    Fill { points: Vec<Point>, color: Color },
    Rect { rect: Rect, color: Color },
}

impl DrawOp {
    pub fn is_fill(&self) -> bool {
        matches!(self, DrawOp::Fill { .. } | DrawOp::Rect { .. })
    }

    pub fn is_stroke(&self) -> bool {
        matches!(self, DrawOp::Stroke { .. })
    }
}

/// # Summary
/// 按调用顺序记录所有绘图操作的表面。
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub size: BitmapSize,
    pub ops: Vec<DrawOp>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            size: BitmapSize { width, height },
            ops: Vec::new(),
        }
    }

    pub fn strokes(&self) -> Vec<(&[Point], &Stroke)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke { points, stroke } => Some((points.as_slice(), stroke)),
                _ => None,
            })
            .collect()
    }

    pub fn fills(&self) -> Vec<(&[Point], Color)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Fill { points, color } => Some((points.as_slice(), *color)),
                _ => None,
            })
            .collect()
    }

    pub fn rects(&self) -> Vec<(Rect, Color)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { rect, color } => Some((*rect, *color)),
                _ => None,
            })
            .collect()
    }

    /// 所有填充操作是否都排在第一个描边之前。
    pub fn fills_precede_strokes(&self) -> bool {
        match self.ops.iter().position(DrawOp::is_stroke) {
            Some(first_stroke) => !self.ops[first_stroke..].iter().any(DrawOp::is_fill),
            None => true,
        }
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }
}

impl DrawingSurface for RecordingSurface {
    fn bitmap_size(&self) -> BitmapSize {
        self.size
    }

    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke) {
        self.ops.push(DrawOp::Stroke {
            points: points.to_vec(),
            stroke: *stroke,
        });
    }

    fn fill_path(&mut self, points: &[Point], color: Color) {
        self.ops.push(DrawOp::Fill {
            points: points.to_vec(),
            color,
        });
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ops.push(DrawOp::Rect { rect, color });
    }
}

/// # Summary
/// 仿射坐标换算：`x = (t - origin) * px_per_second`，`y = height - (p - price_floor) * px_per_unit`。
///
/// # Invariants
/// - 设置了 `time_window` 时，窗口外的时间换算失败。
/// - `undefined_prices` 中的价格换算失败，用于模拟宿主返回 undefined。
#[derive(Debug, Clone)]
pub struct LinearConverter {
    pub origin: Time,
    pub px_per_second: f64,
    pub height: f64,
    pub price_floor: f64,
    pub px_per_unit: f64,
    pub time_window: Option<(Time, Time)>,
    pub undefined_prices: Vec<f64>,
}

impl LinearConverter {
    pub fn new(px_per_second: f64, px_per_unit: f64) -> Self {
        Self {
            origin: 0,
            px_per_second,
            height: 500.0,
            price_floor: 0.0,
            px_per_unit,
            time_window: None,
            undefined_prices: Vec::new(),
        }
    }

    pub fn with_window(mut self, from: Time, to: Time) -> Self {
        self.time_window = Some((from, to));
        self
    }

    pub fn with_undefined_price(mut self, price: f64) -> Self {
        self.undefined_prices.push(price);
        self
    }
}

impl CoordinateConverter for LinearConverter {
    #[allow(clippy::cast_precision_loss)]
    fn time_to_x(&self, time: Time) -> Option<f64> {
        if let Some((from, to)) = self.time_window
            && (time < from || time > to)
        {
            return None;
        }
        Some((time - self.origin) as f64 * self.px_per_second)
    }

    fn price_to_y(&self, price: f64) -> Option<f64> {
        if self.undefined_prices.contains(&price) {
            return None;
        }
        Some(self.height - (price - self.price_floor) * self.px_per_unit)
    }
}

/// # Summary
/// 模拟的宿主图表句柄。
///
/// # Invariants
/// - 记录每一次被同步引擎推送的更新。
/// - `echo` 开启时，应用更新会同步地把同一事件回抛给监听器，模拟真实宿主的行为。
/// - `failing` 开启时，所有应用调用返回错误。
pub struct MockChart {
    id: String,
    listeners: Mutex<BTreeMap<u64, ChartListener>>,
    next_subscription: AtomicU64,
    applied: Mutex<Vec<ChartEvent>>,
    echo: AtomicBool,
    failing: AtomicBool,
}

impl MockChart {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            listeners: Mutex::new(BTreeMap::new()),
            next_subscription: AtomicU64::new(1),
            applied: Mutex::new(Vec::new()),
            echo: AtomicBool::new(false),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_echo(&self, on: bool) {
        self.echo.store(on, Ordering::SeqCst);
    }

    pub fn set_failing(&self, on: bool) {
        self.failing.store(on, Ordering::SeqCst);
    }

    /// 模拟用户在该图表上产生一个事件。
    pub fn emit(&self, event: ChartEvent) {
        let listeners: Vec<ChartListener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn applied(&self) -> Vec<ChartEvent> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record(&self, event: ChartEvent) -> Result<(), SyncError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SyncError::Apply {
                chart: crate::sync::entity::ChartId::new(self.id.clone()),
                reason: "mock failure".to_string(),
            });
        }
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        if self.echo.load(Ordering::SeqCst) {
            self.emit(event);
        }
        Ok(())
    }
}

impl ChartHandle for MockChart {
    fn subscribe(&self, listener: ChartListener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, listener);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, subscription: SubscriptionId) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&subscription.0);
    }

    fn apply_crosshair(&self, position: CrosshairPosition) -> Result<(), SyncError> {
        self.record(ChartEvent::CrosshairMove(position))
    }

    fn clear_crosshair(&self) -> Result<(), SyncError> {
        self.record(ChartEvent::CrosshairMove(CrosshairPosition::left()))
    }

    fn apply_visible_range(&self, range: TimeRange) -> Result<(), SyncError> {
        self.record(ChartEvent::VisibleRangeChange(range))
    }
}
