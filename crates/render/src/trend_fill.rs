use crate::base::{SeriesState, check_line, paint_line, present, stroke_for, visible_geometry};
use crate::coords::track;
use crate::primitives::{draw_multi_line, draw_signed_fill};
use kagami_core::common::{Color, PixelRatio};
use kagami_core::series::entity::{GeometryPoint, SeriesRecord, TrendRecord};
use kagami_core::series::port::{DrawingSurface, IndicatorRenderer, PaintContext};
use kagami_core::style::entity::{FillStyle, LineStyle, LineStyleDescriptor};
use serde::{Deserialize, Serialize};

const VALUE: usize = 0;
const BASE: usize = 1;

/// 趋势填充的样式选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendFillOptions {
    pub value_line: LineStyleDescriptor,
    pub base_line: LineStyleDescriptor,
    // value > base 区段的填充
    pub up_fill: FillStyle,
    // value < base 区段的填充
    pub down_fill: FillStyle,
    // 开启后数值线按方向分段着色，忽略 value_line.color
    pub color_line_by_trend: bool,
    pub up_line_color: Color,
    pub down_line_color: Color,
}

impl Default for TrendFillOptions {
    fn default() -> Self {
        Self {
            value_line: LineStyleDescriptor::solid(Color::rgb(33, 150, 243), 2.0),
            base_line: LineStyleDescriptor::solid(Color::rgb(120, 123, 134), 1.0)
                .with_style(LineStyle::Dashed)
                .hidden(),
            up_fill: FillStyle::new(Color::rgba(38, 166, 154, 0.2)),
            down_fill: FillStyle::new(Color::rgba(239, 83, 80, 0.2)),
            color_line_by_trend: false,
            up_line_color: Color::rgb(38, 166, 154),
            down_line_color: Color::rgb(239, 83, 80),
        }
    }
}

impl TrendFillOptions {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_line("value_line", &self.value_line)?;
        check_line("base_line", &self.base_line)
    }
}

/// # Summary
/// 趋势填充渲染器：数值线与基准线之间按 `value - base` 的符号分色填充。
///
/// # Invariants
/// - 基准缺省为 0。
/// - 符号在区段内翻转时于交叉点切分，两侧各自着色。
#[derive(Debug, Clone, Default)]
pub struct TrendFillSeries {
    state: SeriesState<TrendRecord>,
    options: TrendFillOptions,
}

impl TrendFillSeries {
    pub fn new(options: TrendFillOptions) -> Self {
        Self {
            state: SeriesState::Idle,
            options,
        }
    }

    fn diffs(&self, points: &[GeometryPoint<2>]) -> Vec<Option<f64>> {
        let records = self.state.records();
        points
            .iter()
            .map(|p| match records.get(p.index).map(|r| r.fields()) {
                _ if p.gap => None,
                Some([Some(value), Some(base)]) => Some(value - base),
                _ => None,
            })
            .collect()
    }

    /// # Summary
    /// 按方向分段绘制数值线。
    ///
    /// # Logic
    /// 1. 每个点对的方向取右端点差值的符号，右端缺失时取左端。
    /// 2. 方向相同的连续点对合并为一段，按该方向颜色描边；相邻段共享端点。
    fn paint_trend_line(
        &self,
        surface: &mut dyn DrawingSurface,
        points: &[GeometryPoint<2>],
        diffs: &[Option<f64>],
        ratio: PixelRatio,
    ) {
        let o = &self.options;
        let line = track(points, VALUE);
        let rising = |pair: usize| {
            diffs
                .get(pair + 1)
                .copied()
                .flatten()
                .or(diffs.get(pair).copied().flatten())
                .is_none_or(|d| d >= 0.0)
        };
        let pairs = line.len().saturating_sub(1);
        let mut start = 0;
        for pair in 0..pairs {
            let last = pair + 1 == pairs;
            if last || rising(pair + 1) != rising(pair) {
                let mut stroke = stroke_for(&o.value_line, ratio);
                stroke.color = if rising(pair) {
                    o.up_line_color
                } else {
                    o.down_line_color
                };
                draw_multi_line(surface, &line[start..=pair + 1], &stroke, o.value_line.style);
                start = pair + 1;
            }
        }
    }
}

impl IndicatorRenderer for TrendFillSeries {
    type Record = TrendRecord;
    type Options = TrendFillOptions;

    fn set_data(&mut self, records: Vec<TrendRecord>) {
        self.state = SeriesState::load::<2>(records, "trend_fill");
    }

    fn apply_options(&mut self, options: TrendFillOptions) {
        self.options = options;
    }

    fn options(&self) -> &TrendFillOptions {
        &self.options
    }

    fn len(&self) -> usize {
        self.state.records().len()
    }

    fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    fn draw(&self, ctx: &mut PaintContext<'_>) {
        let points = visible_geometry(
            self.state.records(),
            ctx.visible,
            ctx.converter,
            ctx.pixel_ratio,
        );
        if points.is_empty() {
            return;
        }
        let o = &self.options;
        let diffs = self.diffs(&points);

        if o.up_fill.visible || o.down_fill.visible {
            let up = if o.up_fill.visible {
                o.up_fill.color
            } else {
                Color::TRANSPARENT
            };
            let down = if o.down_fill.visible {
                o.down_fill.color
            } else {
                Color::TRANSPARENT
            };
            draw_signed_fill(
                ctx.surface,
                &track(&points, VALUE),
                &track(&points, BASE),
                &diffs,
                up,
                down,
            );
        }

        paint_line(ctx.surface, &points, BASE, &o.base_line, ctx.pixel_ratio);
        if o.value_line.visible && o.color_line_by_trend {
            self.paint_trend_line(ctx.surface, &points, &diffs, ctx.pixel_ratio);
        } else {
            paint_line(ctx.surface, &points, VALUE, &o.value_line, ctx.pixel_ratio);
        }
    }

    fn price_values(&self, index: usize) -> Vec<f64> {
        present::<2, _>(self.state.records().get(index))
    }
}
