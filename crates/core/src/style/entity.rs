use crate::common::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// # Summary
/// 线条样式枚举，定义实线及各类虚线的描边方式。
///
/// # Invariants
/// - 虚线节奏以线宽为单位缩放，线越粗间隔越大。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dotted,
    Dashed,
    LargeDashed,
    SparseDotted,
}

impl LineStyle {
    /// # Summary
    /// 返回该样式在给定线宽下的 (实段长度, 空段长度)。
    ///
    /// # Logic
    /// 实线返回 None；其余样式按线宽倍数给出交替的实/空段长度。
    ///
    /// # Arguments
    /// * `width`: 已按像素比缩放后的线宽。
    ///
    /// # Returns
    /// 实线为 None，否则为 `Some((on, off))`。
    pub fn dash_pattern(&self, width: f64) -> Option<(f64, f64)> {
        let w = width.max(1.0);
        match self {
            LineStyle::Solid => None,
            LineStyle::Dotted => Some((w, w)),
            LineStyle::Dashed => Some((2.0 * w, 2.0 * w)),
            LineStyle::LargeDashed => Some((6.0 * w, 6.0 * w)),
            LineStyle::SparseDotted => Some((w, 4.0 * w)),
        }
    }
}

impl FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "solid" | "0" => Ok(LineStyle::Solid),
            "dotted" | "1" => Ok(LineStyle::Dotted),
            "dashed" | "2" => Ok(LineStyle::Dashed),
            "large_dashed" | "largedashed" | "3" => Ok(LineStyle::LargeDashed),
            "sparse_dotted" | "sparsedotted" | "4" => Ok(LineStyle::SparseDotted),
            _ => Err(format!("Unknown LineStyle: {}", s)),
        }
    }
}

/// # Summary
/// 单条线的外观描述。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineStyleDescriptor {
    pub color: Color,
    // 媒体像素宽度，绘制时乘以像素比
    pub width: f64,
    pub style: LineStyle,
    pub visible: bool,
}

impl LineStyleDescriptor {
    pub fn solid(color: Color, width: f64) -> Self {
        Self {
            color,
            width,
            style: LineStyle::Solid,
            visible: true,
        }
    }

    pub fn with_style(mut self, style: LineStyle) -> Self {
        self.style = style;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

impl Default for LineStyleDescriptor {
    fn default() -> Self {
        Self::solid(Color::rgb(33, 150, 243), 1.0)
    }
}

/// # Summary
/// 纯色填充的外观描述。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillStyle {
    pub color: Color,
    pub visible: bool,
}

impl FillStyle {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            visible: true,
        }
    }
}

impl Default for FillStyle {
    fn default() -> Self {
        Self::new(Color::rgba(33, 150, 243, 0.1))
    }
}

/// # Summary
/// 渐变填充的外观描述。
///
/// # Invariants
/// - `normalize_gradients` 为 false 时按可见区间内的位置插值；
///   为 true 时由渲染器逐点提供归一化标量驱动颜色。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientFill {
    pub start_color: Color,
    pub end_color: Color,
    pub normalize_gradients: bool,
    pub visible: bool,
}

impl Default for GradientFill {
    fn default() -> Self {
        Self {
            start_color: Color::rgba(38, 166, 154, 0.35),
            end_color: Color::rgba(239, 83, 80, 0.35),
            normalize_gradients: false,
            visible: true,
        }
    }
}

/// # Summary
/// 单次描边调用的最终参数，宽度已是设备像素。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}
