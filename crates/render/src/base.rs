use crate::coords::{to_geometry, track};
use crate::primitives::draw_multi_line;
use kagami_core::common::{PixelRatio, VisibleRange};
use kagami_core::series::entity::{GeometryPoint, SeriesRecord, first_unordered};
use kagami_core::series::port::{CoordinateConverter, DrawingSurface};
use kagami_core::style::entity::{LineStyleDescriptor, Stroke};
use tracing::{debug, warn};

/// # Summary
/// 渲染器的数据状态机。
///
/// # Invariants
/// - `Idle` 不持有数据，绘制为空操作。
/// - `Ready` 中的记录按调用方给出的顺序保存，不做排序修正。
#[derive(Debug, Clone, Default)]
pub(crate) enum SeriesState<R> {
    #[default]
    Idle,
    Ready(Vec<R>),
}

impl<R> SeriesState<R> {
    /// # Summary
    /// 由一批新记录构造 Ready 状态。
    ///
    /// # Logic
    /// 1. 检查时间键是否严格升序，不满足时记录一次告警，但仍原样保存。
    /// 2. 统计空白记录数量，便于排查数据问题。
    pub(crate) fn load<const N: usize>(records: Vec<R>, series: &str) -> Self
    where
        R: SeriesRecord<N>,
    {
        if let Some(index) = first_unordered::<N, R>(&records) {
            warn!(
                "{series}: time keys are not strictly ascending at index {index}, drawing in given order"
            );
        }
        let whitespace = records.iter().filter(|r| r.is_whitespace()).count();
        debug!(
            "{series}: loaded {} records ({whitespace} whitespace)",
            records.len()
        );
        SeriesState::Ready(records)
    }

    pub(crate) fn records(&self) -> &[R] {
        match self {
            SeriesState::Idle => &[],
            SeriesState::Ready(records) => records,
        }
    }

    pub(crate) fn is_ready(&self) -> bool {
        matches!(self, SeriesState::Ready(_))
    }
}

/// 可见窗口的记录切片及其起始下标。
pub(crate) fn window<R>(records: &[R], visible: VisibleRange) -> (&[R], usize) {
    let range = visible.clamp(records.len());
    (&records[range.from..range.to], range.from)
}

/// 可见窗口换算成几何点。
pub(crate) fn visible_geometry<const N: usize, R: SeriesRecord<N>>(
    records: &[R],
    visible: VisibleRange,
    converter: &dyn CoordinateConverter,
    ratio: PixelRatio,
) -> Vec<GeometryPoint<N>> {
    let (slice, offset) = window(records, visible);
    to_geometry(slice, offset, converter, ratio)
}

/// 线条描述转换为设备像素描边参数。
pub(crate) fn stroke_for(style: &LineStyleDescriptor, ratio: PixelRatio) -> Stroke {
    Stroke {
        color: style.color,
        width: style.width * ratio.horizontal,
    }
}

/// 绘制单个字段的线，隐藏的线直接跳过。
pub(crate) fn paint_line<const N: usize>(
    surface: &mut dyn DrawingSurface,
    points: &[GeometryPoint<N>],
    field: usize,
    style: &LineStyleDescriptor,
    ratio: PixelRatio,
) {
    if !style.visible {
        return;
    }
    draw_multi_line(surface, &track(points, field), &stroke_for(style, ratio), style.style);
}

/// 线宽必须为非负有限数。
pub(crate) fn check_line(name: &str, style: &LineStyleDescriptor) -> Result<(), String> {
    if style.width.is_finite() && style.width >= 0.0 {
        Ok(())
    } else {
        Err(format!("{name} width must be a non-negative number, got {}", style.width))
    }
}

/// 有效字段值，供自动缩放使用。
pub(crate) fn present<const N: usize, R: SeriesRecord<N>>(record: Option<&R>) -> Vec<f64> {
    record
        .map(|r| r.fields().into_iter().flatten().collect())
        .unwrap_or_default()
}
