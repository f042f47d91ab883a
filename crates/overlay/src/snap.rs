use kagami_core::common::Time;

/// # Summary
/// 把任意时间戳对齐到图表数据中最近的时间戳。
///
/// # Logic
/// 线性扫描，以绝对差最小者为准；差值相同时取较早的时间戳。
///
/// # Arguments
/// * `time`: 待对齐的时间戳。
/// * `series`: 图表数据的时间戳序列。
///
/// # Returns
/// 序列为空时返回 None。
pub fn snap_to_nearest(time: Time, series: &[Time]) -> Option<Time> {
    series
        .iter()
        .copied()
        .min_by_key(|&candidate| (candidate.abs_diff(time), candidate))
}

/// 图表数据中最晚的时间戳，作为未平仓交易的出场时间。
pub fn latest(series: &[Time]) -> Option<Time> {
    series.iter().copied().max()
}
