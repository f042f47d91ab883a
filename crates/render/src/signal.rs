use crate::base::{SeriesState, visible_geometry};
use kagami_core::common::{Color, Rect};
use kagami_core::config::RenderConfig;
use kagami_core::series::entity::SignalRecord;
use kagami_core::series::port::{IndicatorRenderer, PaintContext};
use serde::{Deserialize, Serialize};

/// 信号带的样式选项。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalOptions {
    pub neutral_color: Color,
    pub signal_color: Color,
    pub alert_color: Color,
    // 叠加在选中颜色上的不透明度
    pub opacity: f64,
    // 宿主 bar 间距过小时的最小带宽（媒体像素）
    pub min_bar_width: f64,
}

impl Default for SignalOptions {
    fn default() -> Self {
        Self {
            neutral_color: Color::TRANSPARENT,
            signal_color: Color::rgb(76, 175, 80),
            alert_color: Color::rgb(244, 67, 54),
            opacity: 0.25,
            min_bar_width: 1.0,
        }
    }
}

impl SignalOptions {
    /// 默认配色，最小带宽取全局渲染配置。
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            min_bar_width: config.signal_min_bar_width,
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if !(self.opacity.is_finite() && (0.0..=1.0).contains(&self.opacity)) {
            return Err(format!("opacity must be within [0, 1], got {}", self.opacity));
        }
        if !(self.min_bar_width.is_finite() && self.min_bar_width >= 0.0) {
            return Err(format!(
                "min_bar_width must be a non-negative number, got {}",
                self.min_bar_width
            ));
        }
        Ok(())
    }
}

/// # Summary
/// 离散状态信号渲染器：每个样本绘制一条贯穿整个窗格高度的背景带。
///
/// # Invariants
/// - 0 使用中性色，正数使用信号色。
/// - 负数仅在序列含有 0/1 以外的取值时使用警示色，纯 0/1 序列中的负数回落到信号色。
/// - 序列是否纯 0/1 在 `set_data` 时对全部样本扫描一次并缓存。
/// - 不参与价格轴自动缩放。
#[derive(Debug, Clone, Default)]
pub struct SignalSeries {
    state: SeriesState<SignalRecord>,
    options: SignalOptions,
    // 是否存在 0/1 以外的取值
    multi_state: bool,
}

impl SignalSeries {
    pub fn new(options: SignalOptions) -> Self {
        Self {
            state: SeriesState::Idle,
            options,
            multi_state: false,
        }
    }

    /// 当前序列是否含有 0/1 以外的取值。
    pub fn is_multi_state(&self) -> bool {
        self.multi_state
    }

    /// # Summary
    /// 为单个样本选择颜色（已乘不透明度）。
    ///
    /// # Arguments
    /// * `value`: 样本取值。
    ///
    /// # Returns
    /// 选中的颜色。
    pub fn color_for(&self, value: f64) -> Color {
        let o = &self.options;
        let base = if value == 0.0 {
            o.neutral_color
        } else if value > 0.0 {
            o.signal_color
        } else if self.multi_state {
            o.alert_color
        } else {
            o.signal_color
        };
        base.fade(o.opacity)
    }
}

impl IndicatorRenderer for SignalSeries {
    type Record = SignalRecord;
    type Options = SignalOptions;

    fn set_data(&mut self, records: Vec<SignalRecord>) {
        self.multi_state = records
            .iter()
            .filter_map(|r| r.value.filter(|v| v.is_finite()))
            .any(|v| v != 0.0 && v != 1.0);
        self.state = SeriesState::load::<1>(records, "signal");
    }

    fn apply_options(&mut self, options: SignalOptions) {
        self.options = options;
    }

    fn options(&self) -> &SignalOptions {
        &self.options
    }

    fn len(&self) -> usize {
        self.state.records().len()
    }

    fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    fn draw(&self, ctx: &mut PaintContext<'_>) {
        let records = self.state.records();
        let points = visible_geometry(records, ctx.visible, ctx.converter, ctx.pixel_ratio);
        let height = ctx.surface.bitmap_size().height;
        let width = ctx.bar_spacing.max(self.options.min_bar_width) * ctx.pixel_ratio.horizontal;

        for point in points.iter().filter(|p| !p.gap) {
            let Some(value) = records
                .get(point.index)
                .and_then(|r| r.value)
                .filter(|v| v.is_finite())
            else {
                continue;
            };
            let color = self.color_for(value);
            if color.is_transparent() {
                continue;
            }
            let rect = Rect {
                x: point.x - width / 2.0,
                y: 0.0,
                width,
                height,
            };
            ctx.surface.fill_rect(rect, color);
        }
    }

    fn price_values(&self, _index: usize) -> Vec<f64> {
        Vec::new()
    }
}
