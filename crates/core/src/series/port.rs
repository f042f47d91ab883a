use crate::common::{BitmapSize, Color, PixelRatio, Point, Rect, Time, VisibleRange};
use crate::style::entity::Stroke;
use serde::{Deserialize, Serialize};

/// # Summary
/// 宿主引擎提供的坐标换算器 (Port)。
///
/// # Invariants
/// - 只在提供它的那一次绘制内有效，实现方不得跨绘制缓存。
/// - 返回媒体坐标（未乘像素比）。
pub trait CoordinateConverter {
    /// 时间键到 x 坐标；时间不在渲染范围内时返回 None。
    fn time_to_x(&self, time: Time) -> Option<f64>;

    /// 价格到 y 坐标；无法换算时返回 None。
    fn price_to_y(&self, price: f64) -> Option<f64>;
}

/// # Summary
/// 宿主引擎提供的类画布绘图表面 (Port)。
///
/// # Invariants
/// - 所有坐标均为位图坐标（设备像素）。
/// - 渲染器只在单次 `draw` 调用期间持有其引用。
pub trait DrawingSurface {
    /// 位图尺寸。
    fn bitmap_size(&self) -> BitmapSize;

    /// 沿折线描边，`points` 至少两个点。
    fn stroke_path(&mut self, points: &[Point], stroke: &Stroke);

    /// 填充闭合多边形。
    fn fill_path(&mut self, points: &[Point], color: Color);

    /// 填充轴对齐矩形。
    fn fill_rect(&mut self, rect: Rect, color: Color);
}

/// # Summary
/// 单次绘制的全部上下文：绘图表面、坐标换算器、可见区间以及像素比。
pub struct PaintContext<'a> {
    pub surface: &'a mut dyn DrawingSurface,
    pub converter: &'a dyn CoordinateConverter,
    pub visible: VisibleRange,
    pub pixel_ratio: PixelRatio,
    // 相邻 bar 的媒体像素间距
    pub bar_spacing: f64,
}

/// # Summary
/// 宿主引擎的价格区间累加器 (Port)，用于确定价格轴的自动缩放范围。
pub trait AutoscaleAccumulator {
    fn add(&mut self, value: f64);
}

/// # Summary
/// 默认的最小/最大值累加器实现。
///
/// # Invariants
/// - 非有限值被忽略。
/// - 未接收任何有效值前 `min > max`，`is_empty()` 为 true。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn new() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// 非空时返回 `(min, max)`。
    pub fn bounds(&self) -> Option<(f64, f64)> {
        (!self.is_empty()).then_some((self.min, self.max))
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoscaleAccumulator for PriceRange {
    fn add(&mut self, value: f64) {
        if value.is_finite() {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
    }
}

/// # Summary
/// 自定义指标渲染器的统一能力契约。
///
/// # Invariants
/// - 渲染器处于两种状态之一：Idle（无数据）或 Ready（持有已校验的记录与选项）。
/// - `set_data` 只迁移状态，不触发绘制。
/// - `draw` 不得修改渲染器状态；同一次绘制内所有填充先于所有线条提交。
pub trait IndicatorRenderer {
    type Record;
    type Options;

    /// # Summary
    /// 载入新的记录序列。
    ///
    /// # Logic
    /// 1. Idle 迁移到 Ready；已 Ready 时整体替换数据。
    /// 2. 非法字段按空白记录处理，不拒绝整个序列。
    fn set_data(&mut self, records: Vec<Self::Record>);

    /// 整体替换样式选项。
    fn apply_options(&mut self, options: Self::Options);

    /// 当前样式选项。
    fn options(&self) -> &Self::Options;

    /// 当前持有的记录条数，Idle 时为 0。
    fn len(&self) -> usize;

    fn is_ready(&self) -> bool;

    /// # Summary
    /// 绘制一帧。
    ///
    /// # Arguments
    /// * `ctx`: 由宿主引擎为本次绘制提供的上下文。
    fn draw(&self, ctx: &mut PaintContext<'_>);

    /// 第 `index` 条记录贡献给自动缩放的全部数值。
    fn price_values(&self, index: usize) -> Vec<f64>;

    /// # Summary
    /// 将可见区间内所有记录的全部追踪字段送入累加器。
    ///
    /// # Logic
    /// 1. 将区间裁剪到当前数据长度。
    /// 2. 逐条调用 `price_values` 并逐值累加。
    fn autoscale(&self, range: VisibleRange, accumulator: &mut dyn AutoscaleAccumulator) {
        let range = range.clamp(self.len());
        for index in range.from..range.to {
            for value in self.price_values(index) {
                accumulator.add(value);
            }
        }
    }
}
