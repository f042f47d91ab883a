use crate::base::{SeriesState, check_line, paint_line, present, visible_geometry};
use crate::coords::track;
use crate::primitives::{FillPaint, draw_fill_area};
use kagami_core::common::Color;
use kagami_core::series::entity::BandRecord;
use kagami_core::series::port::{IndicatorRenderer, PaintContext};
use kagami_core::style::entity::{FillStyle, LineStyleDescriptor};
use serde::{Deserialize, Serialize};

const UPPER: usize = 0;
const MIDDLE: usize = 1;
const LOWER: usize = 2;

/// # Summary
/// 三线通道的样式选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandOptions {
    pub upper_line: LineStyleDescriptor,
    pub middle_line: LineStyleDescriptor,
    pub lower_line: LineStyleDescriptor,
    // 上轨与中轨之间
    pub upper_fill: FillStyle,
    // 中轨与下轨之间
    pub lower_fill: FillStyle,
}

impl Default for BandOptions {
    fn default() -> Self {
        let edge = Color::rgb(41, 98, 255);
        Self {
            upper_line: LineStyleDescriptor::solid(edge, 1.0),
            middle_line: LineStyleDescriptor::solid(Color::rgb(255, 109, 0), 1.0),
            lower_line: LineStyleDescriptor::solid(edge, 1.0),
            upper_fill: FillStyle::new(Color::rgba(41, 98, 255, 0.1)),
            lower_fill: FillStyle::new(Color::rgba(41, 98, 255, 0.1)),
        }
    }
}

impl BandOptions {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_line("upper_line", &self.upper_line)?;
        check_line("middle_line", &self.middle_line)?;
        check_line("lower_line", &self.lower_line)
    }
}

/// # Summary
/// 三线通道渲染器（如布林带、Keltner 通道）。
///
/// # Invariants
/// - 绘制顺序：上轨↔中轨填充、中轨↔下轨填充，然后上、中、下三条线。
/// - 自动缩放同时计入三个字段，价格轴覆盖整个通道。
#[derive(Debug, Clone, Default)]
pub struct BandSeries {
    state: SeriesState<BandRecord>,
    options: BandOptions,
}

impl BandSeries {
    pub fn new(options: BandOptions) -> Self {
        Self {
            state: SeriesState::Idle,
            options,
        }
    }
}

impl IndicatorRenderer for BandSeries {
    type Record = BandRecord;
    type Options = BandOptions;

    fn set_data(&mut self, records: Vec<BandRecord>) {
        self.state = SeriesState::load::<3>(records, "band");
    }

    fn apply_options(&mut self, options: BandOptions) {
        self.options = options;
    }

    fn options(&self) -> &BandOptions {
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
        let (upper, middle, lower) = (
            track(&points, UPPER),
            track(&points, MIDDLE),
            track(&points, LOWER),
        );

        if o.upper_fill.visible {
            draw_fill_area(ctx.surface, &upper, &middle, &FillPaint::Solid(o.upper_fill.color));
        }
        if o.lower_fill.visible {
            draw_fill_area(ctx.surface, &middle, &lower, &FillPaint::Solid(o.lower_fill.color));
        }

        paint_line(ctx.surface, &points, UPPER, &o.upper_line, ctx.pixel_ratio);
        paint_line(ctx.surface, &points, MIDDLE, &o.middle_line, ctx.pixel_ratio);
        paint_line(ctx.surface, &points, LOWER, &o.lower_line, ctx.pixel_ratio);
    }

    fn price_values(&self, index: usize) -> Vec<f64> {
        present::<3, _>(self.state.records().get(index))
    }
}
