use serde::{Deserialize, Serialize};

mod color;

pub use color::Color;

/// # Summary
/// 图表时间轴上的时间键，单位为 UTC 秒。
///
/// # Invariants
/// - 同一序列内按升序排列且不重复（调用方保证）。
pub type Time = i64;

/// # Summary
/// 一次绘制中可见的记录下标区间，左闭右开。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleRange {
    pub from: usize,
    pub to: usize,
}

impl VisibleRange {
    pub fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// 覆盖全部 `len` 条记录的区间。
    pub fn full(len: usize) -> Self {
        Self { from: 0, to: len }
    }

    /// # Summary
    /// 将区间裁剪到 `[0, len)` 之内。
    ///
    /// # Logic
    /// 1. 两端都不超过 `len`。
    /// 2. 若 `from > to`，视为空区间。
    pub fn clamp(self, len: usize) -> Self {
        let to = self.to.min(len);
        let from = self.from.min(to);
        Self { from, to }
    }

    pub fn is_empty(&self) -> bool {
        self.from >= self.to
    }

    pub fn len(&self) -> usize {
        self.to.saturating_sub(self.from)
    }
}

/// # Summary
/// 时间轴上的可见时间窗口（闭区间）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: Time,
    pub to: Time,
}

/// # Summary
/// 设备像素比。宿主引擎以媒体坐标给出换算结果，绘制前需乘以该比例得到位图坐标。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRatio {
    pub horizontal: f64,
    pub vertical: f64,
}

impl PixelRatio {
    pub fn uniform(ratio: f64) -> Self {
        Self {
            horizontal: ratio,
            vertical: ratio,
        }
    }
}

impl Default for PixelRatio {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// 位图坐标系中的一个点。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// 位图坐标系中的轴对齐矩形。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// 绘图表面的位图尺寸（设备像素）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitmapSize {
    pub width: f64,
    pub height: f64,
}
