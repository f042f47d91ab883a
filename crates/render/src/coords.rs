use kagami_core::common::{PixelRatio, Time};
use kagami_core::series::entity::{GeometryPoint, LinePoint, SeriesRecord};
use kagami_core::series::port::CoordinateConverter;

/// # Summary
/// 将一段有序记录窗口换算为屏幕空间的几何点。
///
/// # Logic
/// 1. 时间无法换算时该点没有 x。位于首尾的这类点直接丢弃；夹在两个可换算点之间的，
///    以一个所有 y 均为 None 的占位断点代替，使连线与填充只在该点断开。
/// 2. 字段缺失、非有限，或宿主价格换算返回 undefined 时，该字段的 y 为 None，形成断点而非报错。
/// 3. 媒体坐标乘以像素比得到位图坐标。
///
/// # Arguments
/// * `records`: 可见窗口内的记录。
/// * `offset`: 窗口首条记录在完整序列中的下标。
/// * `converter`: 本次绘制有效的坐标换算器。
/// * `ratio`: 设备像素比。
///
/// # Returns
/// 与记录一一对应（首尾被丢弃的除外）的几何点序列，连续多个内部失败合并为一个断点。
pub fn to_geometry<const N: usize, R: SeriesRecord<N>>(
    records: &[R],
    offset: usize,
    converter: &dyn CoordinateConverter,
    ratio: PixelRatio,
) -> Vec<GeometryPoint<N>> {
    let mut points: Vec<GeometryPoint<N>> = Vec::with_capacity(records.len());
    let mut failed: Option<(usize, Time)> = None;
    for (i, record) in records.iter().enumerate() {
        let Some(x) = converter.time_to_x(record.time()).filter(|x| x.is_finite()) else {
            if failed.is_none() {
                failed = Some((offset + i, record.time()));
            }
            continue;
        };
        let last_x = points.last().map(|p| p.x);
        if let (Some((index, time)), Some(last_x)) = (failed.take(), last_x) {
            points.push(GeometryPoint {
                index,
                time,
                x: last_x,
                ys: [None; N],
                gap: true,
            });
        }
        let ys = record.fields().map(|field| {
            field
                .and_then(|price| converter.price_to_y(price))
                .filter(|y| y.is_finite())
                .map(|y| y * ratio.vertical)
        });
        points.push(GeometryPoint {
            index: offset + i,
            time: record.time(),
            x: x * ratio.horizontal,
            ys,
            gap: false,
        });
    }
    points
}

/// 取出某个字段的单线投影。
pub fn track<const N: usize>(points: &[GeometryPoint<N>], field: usize) -> Vec<LinePoint> {
    points.iter().map(|p| p.track(field)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kagami_core::series::entity::BandRecord;

    struct HalfBroken;

    impl CoordinateConverter for HalfBroken {
        fn time_to_x(&self, time: i64) -> Option<f64> {
            (time != 3).then(|| f64::from(u32::try_from(time).unwrap_or(0)) * 10.0)
        }

        fn price_to_y(&self, price: f64) -> Option<f64> {
            (price != 666.0).then_some(1000.0 - price)
        }
    }

    #[test]
    fn test_conversion_failures_degrade_per_point() {
        let records = vec![
            BandRecord::new(1, 110.0, 100.0, 90.0),
            BandRecord::new(2, 666.0, 100.0, 90.0),
            BandRecord::new(3, 110.0, 100.0, 90.0),
            BandRecord::whitespace(4),
        ];
        let points = to_geometry(&records, 10, &HalfBroken, PixelRatio::uniform(2.0));

        assert_eq!(points.len(), 4);
        assert_eq!(points[0].index, 10);
        assert_eq!(points[0].x, 20.0);
        assert_eq!(points[0].ys, [Some(1780.0), Some(1800.0), Some(1820.0)]);
        // 价格换算失败只断开该字段
        assert_eq!(points[1].ys[0], None);
        assert_eq!(points[1].ys[1], Some(1800.0));
        // t=3 的时间无法换算，以断点占位
        assert!(points[2].gap);
        assert_eq!(points[2].index, 12);
        assert_eq!(points[2].ys, [None, None, None]);
        // 空白记录保留时间槽
        assert!(!points[3].gap);
        assert_eq!(points[3].index, 13);
        assert_eq!(points[3].ys, [None, None, None]);
    }

    #[test]
    fn test_leading_and_trailing_failures_are_dropped() {
        let leading = vec![
            BandRecord::new(3, 110.0, 100.0, 90.0),
            BandRecord::new(4, 110.0, 100.0, 90.0),
        ];
        let points = to_geometry(&leading, 0, &HalfBroken, PixelRatio::default());
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].index, 1);

        let trailing = vec![
            BandRecord::new(2, 110.0, 100.0, 90.0),
            BandRecord::new(3, 110.0, 100.0, 90.0),
        ];
        let points = to_geometry(&trailing, 0, &HalfBroken, PixelRatio::default());
        assert_eq!(points.len(), 1);
        assert!(!points[0].gap);
    }
}
