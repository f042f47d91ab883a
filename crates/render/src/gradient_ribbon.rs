use crate::base::{SeriesState, check_line, paint_line, present, visible_geometry};
use crate::coords::track;
use crate::primitives::{FillPaint, draw_fill_area};
use kagami_core::common::Color;
use kagami_core::series::entity::{GeometryPoint, RibbonRecord};
use kagami_core::series::port::{IndicatorRenderer, PaintContext};
use kagami_core::style::entity::{GradientFill, LineStyleDescriptor};
use serde::{Deserialize, Serialize};

/// 渐变带状图的样式选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientRibbonOptions {
    pub upper_line: LineStyleDescriptor,
    pub lower_line: LineStyleDescriptor,
    pub gradient: GradientFill,
}

impl Default for GradientRibbonOptions {
    fn default() -> Self {
        Self {
            upper_line: LineStyleDescriptor::solid(Color::rgb(38, 166, 154), 1.0),
            lower_line: LineStyleDescriptor::solid(Color::rgb(239, 83, 80), 1.0),
            gradient: GradientFill::default(),
        }
    }
}

impl GradientRibbonOptions {
    pub(crate) fn validate(&self) -> Result<(), String> {
        check_line("upper_line", &self.upper_line)?;
        check_line("lower_line", &self.lower_line)
    }
}

/// # Summary
/// 渐变带状渲染器：填充颜色逐四边形在起止色之间插值。
///
/// # Invariants
/// - `normalize_gradients` 关闭时按可见区间内的位置插值。
/// - 开启时按带宽 (upper - lower) 在可见窗口内的 min-max 归一化值插值，带宽越大越接近终止色。
#[derive(Debug, Clone, Default)]
pub struct GradientRibbonSeries {
    state: SeriesState<RibbonRecord>,
    options: GradientRibbonOptions,
}

impl GradientRibbonSeries {
    pub fn new(options: GradientRibbonOptions) -> Self {
        Self {
            state: SeriesState::Idle,
            options,
        }
    }

    /// # Summary
    /// 计算与几何点对齐的带宽归一化标量。
    ///
    /// # Logic
    /// 1. 对每个几何点取其源记录的 `upper - lower`，缺字段记为 NaN。
    /// 2. 以窗口内有效带宽的最小 / 最大值做 min-max 归一化。
    /// 3. 所有带宽相等时统一取 0.5。
    fn spread_scalars(&self, points: &[GeometryPoint<2>]) -> Vec<f64> {
        let records = self.state.records();
        let spreads: Vec<f64> = points
            .iter()
            .map(|p| match records.get(p.index).map(|r| (r.upper, r.lower)) {
                _ if p.gap => f64::NAN,
                Some((Some(u), Some(l))) if (u - l).is_finite() => u - l,
                _ => f64::NAN,
            })
            .collect();

        let (min, max) = spreads
            .iter()
            .filter(|s| s.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(*s), hi.max(*s))
            });
        let span = max - min;
        spreads
            .into_iter()
            .map(|s| {
                if !s.is_finite() {
                    f64::NAN
                } else if span > 0.0 {
                    (s - min) / span
                } else {
                    0.5
                }
            })
            .collect()
    }
}

impl IndicatorRenderer for GradientRibbonSeries {
    type Record = RibbonRecord;
    type Options = GradientRibbonOptions;

    fn set_data(&mut self, records: Vec<RibbonRecord>) {
        self.state = SeriesState::load::<2>(records, "gradient_ribbon");
    }

    fn apply_options(&mut self, options: GradientRibbonOptions) {
        self.options = options;
    }

    fn options(&self) -> &GradientRibbonOptions {
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
        if o.gradient.visible {
            let scalars = o
                .gradient
                .normalize_gradients
                .then(|| self.spread_scalars(&points));
            let paint = FillPaint::Gradient {
                start: o.gradient.start_color,
                end: o.gradient.end_color,
                scalars: scalars.as_deref(),
            };
            draw_fill_area(ctx.surface, &track(&points, 0), &track(&points, 1), &paint);
        }
        paint_line(ctx.surface, &points, 0, &o.upper_line, ctx.pixel_ratio);
        paint_line(ctx.surface, &points, 1, &o.lower_line, ctx.pixel_ratio);
    }

    fn price_values(&self, index: usize) -> Vec<f64> {
        present::<2, _>(self.state.records().get(index))
    }
}
