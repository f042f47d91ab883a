//! 自定义指标序列的渲染管线。
//!
//! 每次绘制：记录 → [`coords`] 坐标适配 → [`primitives`] 绘制原语 → 宿主画布。
//! 五种渲染器共用同一管线，由 [`series::IndicatorSeries`] 统一分派。

pub mod band;
pub mod coords;
pub mod gradient_ribbon;
pub mod primitives;
pub mod ribbon;
pub mod series;
pub mod signal;
pub mod trend_fill;

mod base;
