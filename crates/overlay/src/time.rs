use chrono::{DateTime, NaiveDate, NaiveDateTime};
use kagami_core::common::Time;
use kagami_core::overlay::entity::TimeInput;
use kagami_core::overlay::error::OverlayError;

// 不带时区的日期时间文本，按 UTC 解释
const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// # Summary
/// 把交易记录中的时间字段解析为 Unix 秒。
///
/// # Logic
/// 1. 整数与浮点数按量级区分：绝对值大于 `ms_threshold` 视为毫秒，否则为秒；不足一秒的部分向下取整。
/// 2. 字符串先尝试按数字解析，再依次尝试 RFC 3339、`YYYY-MM-DD HH:MM:SS`、
///    `YYYY-MM-DDTHH:MM:SS` 与 `YYYY-MM-DD`（后三者按 UTC）。
///
/// # Arguments
/// * `input`: 原始时间字段。
/// * `ms_threshold`: 秒 / 毫秒的判定阈值。
///
/// # Returns
/// 无法解析时返回 `OverlayError::InvalidTime`。
pub fn parse_time(input: &TimeInput, ms_threshold: i64) -> Result<Time, OverlayError> {
    match input {
        TimeInput::Integer(value) => Ok(from_integer(*value, ms_threshold)),
        TimeInput::Float(value) => from_float(*value, ms_threshold),
        TimeInput::Text(text) => parse_text(text, ms_threshold),
    }
}

fn from_integer(value: i64, ms_threshold: i64) -> Time {
    if value.unsigned_abs() > ms_threshold.unsigned_abs() {
        value.div_euclid(1000)
    } else {
        value
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn from_float(value: f64, ms_threshold: i64) -> Result<Time, OverlayError> {
    if !value.is_finite() {
        return Err(OverlayError::InvalidTime(value.to_string()));
    }
    let seconds = if value.abs() > ms_threshold as f64 {
        value / 1000.0
    } else {
        value
    }
    .floor();
    if seconds < i64::MIN as f64 || seconds >= i64::MAX as f64 {
        return Err(OverlayError::InvalidTime(value.to_string()));
    }
    Ok(seconds as i64)
}

fn parse_text(text: &str, ms_threshold: i64) -> Result<Time, OverlayError> {
    let text = text.trim();
    if let Ok(value) = text.parse::<i64>() {
        return Ok(from_integer(value, ms_threshold));
    }
    if let Ok(value) = text.parse::<f64>() {
        return from_float(value, ms_threshold);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.timestamp());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| OverlayError::InvalidTime(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: i64 = 10_000_000_000;

    #[test]
    fn test_numeric_magnitude_detection() {
        assert_eq!(parse_time(&TimeInput::Integer(1_700_000_000), THRESHOLD), Ok(1_700_000_000));
        assert_eq!(
            parse_time(&TimeInput::Integer(1_700_000_000_999), THRESHOLD),
            Ok(1_700_000_000)
        );
        assert_eq!(parse_time(&TimeInput::Float(1_700_000_000.7), THRESHOLD), Ok(1_700_000_000));
        assert_eq!(
            parse_time(&TimeInput::Float(1_700_000_000_500.0), THRESHOLD),
            Ok(1_700_000_000)
        );
        assert!(parse_time(&TimeInput::Float(f64::NAN), THRESHOLD).is_err());
    }

    #[test]
    fn test_text_formats() {
        let expected = 1_704_067_200; // 2024-01-01T00:00:00Z
        for text in [
            "1704067200",
            "1704067200000",
            "2024-01-01T00:00:00Z",
            "2024-01-01T08:00:00+08:00",
            "2024-01-01 00:00:00",
            "2024-01-01T00:00:00",
            "2024-01-01",
            "  2024-01-01  ",
        ] {
            assert_eq!(parse_time(&TimeInput::from(text), THRESHOLD), Ok(expected), "{text}");
        }
    }

    #[test]
    fn test_unparsable_text() {
        assert_eq!(
            parse_time(&TimeInput::from("yesterday"), THRESHOLD),
            Err(OverlayError::InvalidTime("yesterday".to_string()))
        );
        assert!(parse_time(&TimeInput::from(""), THRESHOLD).is_err());
        assert!(parse_time(&TimeInput::from("2024-13-01"), THRESHOLD).is_err());
    }
}
