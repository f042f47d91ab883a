use crate::common::Time;
use serde::{Deserialize, Deserializer, Serialize};

/// # Summary
/// 指标记录的统一访问契约，`N` 为该指标追踪的数值字段个数。
///
/// # Invariants
/// - `fields()` 只返回有限数值，缺失或非有限值一律为 None。
/// - 任一必填字段为 None 的记录即为空白记录 (whitespace)：占据时间槽但断开连线。
pub trait SeriesRecord<const N: usize> {
    /// 记录的时间键。
    fn time(&self) -> Time;

    /// 按绘制顺序（自上而下）返回追踪字段。
    fn fields(&self) -> [Option<f64>; N];

    /// 是否为空白记录。
    fn is_whitespace(&self) -> bool {
        self.fields().iter().any(Option::is_none)
    }
}

/// 宽松的数值字段反序列化：数字保留，其余任意类型（null、字符串、布尔、对象、非有限值）视为缺失。
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64().filter(|v| v.is_finite()))
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

/// # Summary
/// 三线通道记录（上轨 / 中轨 / 下轨）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRecord {
    pub time: Time,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub upper: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub middle: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lower: Option<f64>,
}

impl BandRecord {
    pub fn new(time: Time, upper: f64, middle: f64, lower: f64) -> Self {
        Self {
            time,
            upper: Some(upper),
            middle: Some(middle),
            lower: Some(lower),
        }
    }

    pub fn whitespace(time: Time) -> Self {
        Self {
            time,
            upper: None,
            middle: None,
            lower: None,
        }
    }
}

impl SeriesRecord<3> for BandRecord {
    fn time(&self) -> Time {
        self.time
    }

    fn fields(&self) -> [Option<f64>; 3] {
        [finite(self.upper), finite(self.middle), finite(self.lower)]
    }
}

/// # Summary
/// 双线带状记录（上沿 / 下沿），Ribbon 与 GradientRibbon 共用。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RibbonRecord {
    pub time: Time,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub upper: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lower: Option<f64>,
}

impl RibbonRecord {
    pub fn new(time: Time, upper: f64, lower: f64) -> Self {
        Self {
            time,
            upper: Some(upper),
            lower: Some(lower),
        }
    }

    pub fn whitespace(time: Time) -> Self {
        Self {
            time,
            upper: None,
            lower: None,
        }
    }
}

impl SeriesRecord<2> for RibbonRecord {
    fn time(&self) -> Time {
        self.time
    }

    fn fields(&self) -> [Option<f64>; 2] {
        [finite(self.upper), finite(self.lower)]
    }
}

/// # Summary
/// 离散状态信号记录。取值约定：0 为中性，正数为信号，负数为警示。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub time: Time,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
}

impl SignalRecord {
    pub fn new(time: Time, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
        }
    }
}

impl SeriesRecord<1> for SignalRecord {
    fn time(&self) -> Time {
        self.time
    }

    fn fields(&self) -> [Option<f64>; 1] {
        [finite(self.value)]
    }
}

/// # Summary
/// 趋势填充记录：数值线及其基准线，基准缺省为 0。
///
/// # Invariants
/// - 仅 `value` 缺失才构成空白记录，`base` 缺失时回落到 0。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub time: Time,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
}

impl TrendRecord {
    pub fn new(time: Time, value: f64) -> Self {
        Self {
            time,
            value: Some(value),
            base: None,
        }
    }

    pub fn with_base(mut self, base: f64) -> Self {
        self.base = Some(base);
        self
    }
}

impl SeriesRecord<2> for TrendRecord {
    fn time(&self) -> Time {
        self.time
    }

    fn fields(&self) -> [Option<f64>; 2] {
        [finite(self.value), Some(finite(self.base).unwrap_or(0.0))]
    }
}

/// # Summary
/// 坐标适配器的屏幕空间输出：一个 x 以及每个追踪字段各自的 y。
///
/// # Invariants
/// - 只在单次绘制内有效，从不持久化。
/// - `ys[i]` 为 None 表示该字段在此点断开，不得穿过该点连线。
/// - `gap` 为 true 的点是时间无法换算的占位断点，所有 y 均为 None，`x` 沿用前一点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryPoint<const N: usize> {
    // 源记录在输入序列中的下标
    pub index: usize,
    pub time: Time,
    pub x: f64,
    pub ys: [Option<f64>; N],
    pub gap: bool,
}

impl<const N: usize> GeometryPoint<N> {
    /// 取出单个字段的投影，供绘制原语使用。
    pub fn track(&self, field: usize) -> LinePoint {
        LinePoint {
            x: self.x,
            y: self.ys.get(field).copied().flatten(),
        }
    }
}

/// 单字段的屏幕点，`y` 为 None 时表示断点。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub x: f64,
    pub y: Option<f64>,
}

impl LinePoint {
    pub fn new(x: f64, y: Option<f64>) -> Self {
        Self { x, y }
    }
}

/// # Summary
/// 查找第一个破坏严格升序的记录下标。
///
/// # Logic
/// 1. 逐对比较相邻记录的时间键。
/// 2. 后一条不大于前一条时返回后一条的下标。
///
/// # Arguments
/// * `records`: 待检查的记录序列。
///
/// # Returns
/// 有序时返回 None。
pub fn first_unordered<const N: usize, R: SeriesRecord<N>>(records: &[R]) -> Option<usize> {
    records
        .windows(2)
        .position(|w| w[1].time() <= w[0].time())
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_typed_fields_become_whitespace() {
        let json = r#"[
            {"time": 1, "upper": 110, "middle": 100, "lower": 90},
            {"time": 2, "upper": "oops", "middle": 101, "lower": 91},
            {"time": 3, "middle": null}
        ]"#;
        let records: Vec<BandRecord> = serde_json::from_str(json).unwrap();
        assert!(!records[0].is_whitespace());
        assert!(records[1].is_whitespace());
        assert_eq!(records[1].fields(), [None, Some(101.0), Some(91.0)]);
        assert!(records[2].is_whitespace());
    }

    #[test]
    fn test_non_finite_values_are_filtered() {
        let r = RibbonRecord::new(5, f64::NAN, 1.0);
        assert_eq!(r.fields(), [None, Some(1.0)]);
        assert!(r.is_whitespace());
    }

    #[test]
    fn test_trend_base_defaults_to_zero() {
        let r = TrendRecord::new(1, -3.0);
        assert_eq!(r.fields(), [Some(-3.0), Some(0.0)]);
        assert!(!r.is_whitespace());
        let r = TrendRecord::new(1, 2.0).with_base(f64::INFINITY);
        assert_eq!(r.fields(), [Some(2.0), Some(0.0)]);
    }

    #[test]
    fn test_first_unordered() {
        let ok = vec![SignalRecord::new(1, 0.0), SignalRecord::new(2, 1.0)];
        assert_eq!(first_unordered::<1, _>(&ok), None);
        let dup = vec![
            SignalRecord::new(1, 0.0),
            SignalRecord::new(3, 1.0),
            SignalRecord::new(3, 1.0),
        ];
        assert_eq!(first_unordered::<1, _>(&dup), Some(2));
    }
}
