//! Kagami 核心层：领域实体、宿主图表引擎端口 (Port) 以及各领域错误。
//!
//! 具体实现位于 `kagami-render`、`kagami-sync` 与 `kagami-overlay`，
//! 它们只依赖本 crate 中定义的契约。

pub mod common;
pub mod config;
pub mod overlay;
pub mod series;
pub mod style;
pub mod sync;

#[cfg(feature = "test-utils")]
pub mod testing;
