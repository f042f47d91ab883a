use crate::base::{SeriesState, check_line, paint_line, present, visible_geometry};
use crate::coords::track;
use crate::primitives::{FillPaint, draw_fill_area};
use kagami_core::common::Color;
use kagami_core::series::entity::RibbonRecord;
use kagami_core::series::port::{IndicatorRenderer, PaintContext};
use kagami_core::style::entity::{FillStyle, LineStyleDescriptor};
use serde::{Deserialize, Serialize};

/// 双线带状图的样式选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RibbonOptions {
    pub upper_line: LineStyleDescriptor,
    pub lower_line: LineStyleDescriptor,
    pub fill: FillStyle,
}

impl Default for RibbonOptions {
    fn default() -> Self {
        Self {
            upper_line: LineStyleDescriptor::solid(Color::rgb(76, 175, 80), 1.0),
            lower_line: LineStyleDescriptor::solid(Color::rgb(244, 67, 54), 1.0),
            fill: FillStyle::new(Color::rgba(33, 150, 243, 0.1)),
        }
    }
}

impl RibbonOptions {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_line("upper_line", &self.upper_line)?;
        check_line("lower_line", &self.lower_line)
    }
}

/// # Summary
/// 双线带状渲染器：上下两条线及其间的纯色填充。
#[derive(Debug, Clone, Default)]
pub struct RibbonSeries {
    state: SeriesState<RibbonRecord>,
    options: RibbonOptions,
}

impl RibbonSeries {
    pub fn new(options: RibbonOptions) -> Self {
        Self {
            state: SeriesState::Idle,
            options,
        }
    }
}

impl IndicatorRenderer for RibbonSeries {
    type Record = RibbonRecord;
    type Options = RibbonOptions;

    fn set_data(&mut self, records: Vec<RibbonRecord>) {
        self.state = SeriesState::load::<2>(records, "ribbon");
    }

    fn apply_options(&mut self, options: RibbonOptions) {
        self.options = options;
    }

    fn options(&self) -> &RibbonOptions {
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
        if o.fill.visible {
            draw_fill_area(
                ctx.surface,
                &track(&points, 0),
                &track(&points, 1),
                &FillPaint::Solid(o.fill.color),
            );
        }
        paint_line(ctx.surface, &points, 0, &o.upper_line, ctx.pixel_ratio);
        paint_line(ctx.surface, &points, 1, &o.lower_line, ctx.pixel_ratio);
    }

    fn price_values(&self, index: usize) -> Vec<f64> {
        present::<2, _>(self.state.records().get(index))
    }
}
