use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// # Summary
/// RGBA 颜色。通道为 0-255 整数，透明度为 `[0, 1]` 浮点。
///
/// # Invariants
/// - `alpha` 始终位于 `[0, 1]`。
/// - 序列化形式为 CSS 颜色字符串，与配置层及宿主画布保持一致。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

    pub const fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red,
            green,
            blue,
            alpha: 1.0,
        }
    }

    pub const fn rgba(red: u8, green: u8, blue: u8, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// 返回替换了透明度的新颜色，透明度会被裁剪到 `[0, 1]`。
    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: clamp_unit(alpha),
            ..self
        }
    }

    /// 在原有透明度上再乘以 `opacity`。
    pub fn fade(self, opacity: f64) -> Self {
        self.with_alpha(self.alpha * clamp_unit(opacity))
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha <= 0.0
    }

    /// # Summary
    /// 在两种颜色之间线性插值。
    ///
    /// # Logic
    /// 1. 将 `t` 裁剪到 `[0, 1]`，非有限值按 0 处理。
    /// 2. 逐通道（含透明度）做 `start + (end - start) * t`。
    ///
    /// # Arguments
    /// * `start`: `t = 0` 时的颜色。
    /// * `end`: `t = 1` 时的颜色。
    /// * `t`: 插值位置。
    ///
    /// # Returns
    /// 插值后的颜色。
    pub fn lerp(start: Color, end: Color, t: f64) -> Color {
        let t = clamp_unit(t);
        let mix = |a: u8, b: u8| {
            let a = f64::from(a);
            channel(a + (f64::from(b) - a) * t)
        };
        Color {
            red: mix(start.red, end.red),
            green: mix(start.green, end.green),
            blue: mix(start.blue, end.blue),
            alpha: clamp_unit(start.alpha + (end.alpha - start.alpha) * t),
        }
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 }
}

// 输入已裁剪到 [0, 255]，转换不会截断或翻转符号
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(v: f64) -> u8 {
    if v.is_finite() {
        v.round().clamp(0.0, 255.0) as u8
    } else {
        0
    }
}

fn hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn parse_hex(body: &str) -> Option<Color> {
    let digits = body
        .bytes()
        .map(hex_digit)
        .collect::<Option<Vec<u8>>>()?;
    match digits.as_slice() {
        [r, g, b] => Some(Color::rgb(r * 17, g * 17, b * 17)),
        [r, g, b, a] => Some(Color::rgba(
            r * 17,
            g * 17,
            b * 17,
            f64::from(a * 17) / 255.0,
        )),
        [r1, r2, g1, g2, b1, b2] => Some(Color::rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
        [r1, r2, g1, g2, b1, b2, a1, a2] => Some(Color::rgba(
            r1 * 16 + r2,
            g1 * 16 + g2,
            b1 * 16 + b2,
            f64::from(a1 * 16 + a2) / 255.0,
        )),
        _ => None,
    }
}

fn parse_functional(s: &str) -> Option<Color> {
    let (name, rest) = s.split_once('(')?;
    let args = rest.strip_suffix(')')?;
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    let rgb = |i: usize| -> Option<u8> {
        let v: f64 = parts.get(i)?.parse().ok()?;
        Some(channel(v))
    };
    match (name.trim(), parts.len()) {
        ("rgb", 3) => Some(Color::rgb(rgb(0)?, rgb(1)?, rgb(2)?)),
        ("rgba", 4) => {
            let alpha: f64 = parts.get(3)?.parse().ok()?;
            Some(Color::rgba(rgb(0)?, rgb(1)?, rgb(2)?, clamp_unit(alpha)))
        }
        _ => None,
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        let parsed = if lowered == "transparent" {
            Some(Color::TRANSPARENT)
        } else if let Some(body) = lowered.strip_prefix('#') {
            parse_hex(body)
        } else {
            parse_functional(&lowered)
        };
        parsed.ok_or_else(|| format!("Unknown color: {}", s))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.alpha >= 1.0 {
            write!(f, "#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
        } else {
            write!(
                f,
                "rgba({}, {}, {}, {})",
                self.red, self.green, self.blue, self.alpha
            )
        }
    }
}
