use crate::band::{BandOptions, BandSeries};
use crate::gradient_ribbon::{GradientRibbonOptions, GradientRibbonSeries};
use crate::ribbon::{RibbonOptions, RibbonSeries};
use crate::signal::{SignalOptions, SignalSeries};
use crate::trend_fill::{TrendFillOptions, TrendFillSeries};
use kagami_core::common::VisibleRange;
use kagami_core::series::entity::{BandRecord, RibbonRecord, SignalRecord, TrendRecord};
use kagami_core::series::error::RenderError;
use kagami_core::series::port::{AutoscaleAccumulator, IndicatorRenderer, PaintContext};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 指标渲染器类型枚举。
///
/// # Invariants
/// - 封闭集合，新增类型必须同时扩展 `IndicatorSeries` 的分派。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Band,
    Ribbon,
    GradientRibbon,
    Signal,
    TrendFill,
}

impl FromStr for IndicatorKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "band" => Ok(IndicatorKind::Band),
            "ribbon" => Ok(IndicatorKind::Ribbon),
            "gradient_ribbon" | "gradientribbon" => Ok(IndicatorKind::GradientRibbon),
            "signal" => Ok(IndicatorKind::Signal),
            "trend_fill" | "trendfill" => Ok(IndicatorKind::TrendFill),
            _ => Err(RenderError::UnknownKind(s.to_string())),
        }
    }
}

impl std::fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndicatorKind::Band => write!(f, "band"),
            IndicatorKind::Ribbon => write!(f, "ribbon"),
            IndicatorKind::GradientRibbon => write!(f, "gradient_ribbon"),
            IndicatorKind::Signal => write!(f, "signal"),
            IndicatorKind::TrendFill => write!(f, "trend_fill"),
        }
    }
}

/// 配置层下发的记录载荷，变体需与目标渲染器类型一致。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum IndicatorData {
    Band(Vec<BandRecord>),
    Ribbon(Vec<RibbonRecord>),
    GradientRibbon(Vec<RibbonRecord>),
    Signal(Vec<SignalRecord>),
    TrendFill(Vec<TrendRecord>),
}

impl IndicatorData {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorData::Band(_) => IndicatorKind::Band,
            IndicatorData::Ribbon(_) => IndicatorKind::Ribbon,
            IndicatorData::GradientRibbon(_) => IndicatorKind::GradientRibbon,
            IndicatorData::Signal(_) => IndicatorKind::Signal,
            IndicatorData::TrendFill(_) => IndicatorKind::TrendFill,
        }
    }
}

/// 配置层下发的样式载荷。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "options", rename_all = "snake_case")]
pub enum IndicatorOptions {
    Band(BandOptions),
    Ribbon(RibbonOptions),
    GradientRibbon(GradientRibbonOptions),
    Signal(SignalOptions),
    TrendFill(TrendFillOptions),
}

impl IndicatorOptions {
    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorOptions::Band(_) => IndicatorKind::Band,
            IndicatorOptions::Ribbon(_) => IndicatorKind::Ribbon,
            IndicatorOptions::GradientRibbon(_) => IndicatorKind::GradientRibbon,
            IndicatorOptions::Signal(_) => IndicatorKind::Signal,
            IndicatorOptions::TrendFill(_) => IndicatorKind::TrendFill,
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self {
            IndicatorOptions::Band(o) => o.validate(),
            IndicatorOptions::Ribbon(o) => o.validate(),
            IndicatorOptions::GradientRibbon(o) => o.validate(),
            IndicatorOptions::Signal(o) => o.validate(),
            IndicatorOptions::TrendFill(o) => o.validate(),
        }
    }
}

/// # Summary
/// 五种指标渲染器的带标签变体，绘制循环通过它做统一分派。
#[derive(Debug, Clone)]
pub enum IndicatorSeries {
    Band(BandSeries),
    Ribbon(RibbonSeries),
    GradientRibbon(GradientRibbonSeries),
    Signal(SignalSeries),
    TrendFill(TrendFillSeries),
}

macro_rules! dispatch {
    ($series:expr, $inner:ident => $body:expr) => {
        match $series {
            IndicatorSeries::Band($inner) => $body,
            IndicatorSeries::Ribbon($inner) => $body,
            IndicatorSeries::GradientRibbon($inner) => $body,
            IndicatorSeries::Signal($inner) => $body,
            IndicatorSeries::TrendFill($inner) => $body,
        }
    };
}

fn mismatch(expected: IndicatorKind, actual: IndicatorKind) -> RenderError {
    RenderError::KindMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

impl IndicatorSeries {
    /// 以默认样式创建处于 Idle 状态的渲染器。
    pub fn new(kind: IndicatorKind) -> Self {
        match kind {
            IndicatorKind::Band => IndicatorSeries::Band(BandSeries::default()),
            IndicatorKind::Ribbon => IndicatorSeries::Ribbon(RibbonSeries::default()),
            IndicatorKind::GradientRibbon => {
                IndicatorSeries::GradientRibbon(GradientRibbonSeries::default())
            }
            IndicatorKind::Signal => IndicatorSeries::Signal(SignalSeries::default()),
            IndicatorKind::TrendFill => IndicatorSeries::TrendFill(TrendFillSeries::default()),
        }
    }

    pub fn kind(&self) -> IndicatorKind {
        match self {
            IndicatorSeries::Band(_) => IndicatorKind::Band,
            IndicatorSeries::Ribbon(_) => IndicatorKind::Ribbon,
            IndicatorSeries::GradientRibbon(_) => IndicatorKind::GradientRibbon,
            IndicatorSeries::Signal(_) => IndicatorKind::Signal,
            IndicatorSeries::TrendFill(_) => IndicatorKind::TrendFill,
        }
    }

    /// # Summary
    /// 载入记录。
    ///
    /// # Logic
    /// 1. 校验载荷类型与渲染器类型一致。
    /// 2. 交给具体渲染器迁移到 Ready 状态。
    ///
    /// # Returns
    /// 类型不一致时返回 `RenderError::KindMismatch`，渲染器状态保持不变。
    pub fn set_data(&mut self, data: IndicatorData) -> Result<(), RenderError> {
        match (self, data) {
            (IndicatorSeries::Band(s), IndicatorData::Band(d)) => s.set_data(d),
            (IndicatorSeries::Ribbon(s), IndicatorData::Ribbon(d)) => s.set_data(d),
            (IndicatorSeries::GradientRibbon(s), IndicatorData::GradientRibbon(d)) => s.set_data(d),
            (IndicatorSeries::Signal(s), IndicatorData::Signal(d)) => s.set_data(d),
            (IndicatorSeries::TrendFill(s), IndicatorData::TrendFill(d)) => s.set_data(d),
            (series, data) => return Err(mismatch(series.kind(), data.kind())),
        }
        Ok(())
    }

    /// # Summary
    /// 替换样式选项。
    ///
    /// # Logic
    /// 1. 校验载荷类型与渲染器类型一致。
    /// 2. 校验线宽、不透明度等数值合法。
    /// 3. 整体替换选项。
    pub fn apply_options(&mut self, options: IndicatorOptions) -> Result<(), RenderError> {
        if options.kind() != self.kind() {
            return Err(mismatch(self.kind(), options.kind()));
        }
        options.validate().map_err(RenderError::InvalidOptions)?;
        match (self, options) {
            (IndicatorSeries::Band(s), IndicatorOptions::Band(o)) => s.apply_options(o),
            (IndicatorSeries::Ribbon(s), IndicatorOptions::Ribbon(o)) => s.apply_options(o),
            (IndicatorSeries::GradientRibbon(s), IndicatorOptions::GradientRibbon(o)) => {
                s.apply_options(o)
            }
            (IndicatorSeries::Signal(s), IndicatorOptions::Signal(o)) => s.apply_options(o),
            (IndicatorSeries::TrendFill(s), IndicatorOptions::TrendFill(o)) => s.apply_options(o),
            (series, options) => return Err(mismatch(series.kind(), options.kind())),
        }
        Ok(())
    }

    pub fn draw(&self, ctx: &mut PaintContext<'_>) {
        dispatch!(self, s => s.draw(ctx))
    }

    pub fn autoscale(&self, range: VisibleRange, accumulator: &mut dyn AutoscaleAccumulator) {
        dispatch!(self, s => s.autoscale(range, accumulator))
    }

    pub fn price_values(&self, index: usize) -> Vec<f64> {
        dispatch!(self, s => s.price_values(index))
    }

    pub fn len(&self) -> usize {
        dispatch!(self, s => s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ready(&self) -> bool {
        dispatch!(self, s => s.is_ready())
    }
}
