use crate::common::{Color, Time};
use crate::style::entity::LineStyle;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// # Summary
/// 交易记录中的原始时间字段。
///
/// # Invariants
/// - 数字按量级区分秒与毫秒；字符串可以是数字或日期文本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeInput {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for TimeInput {
    fn from(value: i64) -> Self {
        TimeInput::Integer(value)
    }
}

impl From<i32> for TimeInput {
    fn from(value: i32) -> Self {
        TimeInput::Integer(i64::from(value))
    }
}

impl From<&str> for TimeInput {
    fn from(value: &str) -> Self {
        TimeInput::Text(value.to_string())
    }
}

/// 交易方向。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeType {
    /// 做多
    #[serde(alias = "buy", alias = "LONG", alias = "Long")]
    Long,
    /// 做空
    #[serde(alias = "sell", alias = "SHORT", alias = "Short")]
    Short,
}

impl std::fmt::Display for TradeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeType::Long => write!(f, "long"),
            TradeType::Short => write!(f, "short"),
        }
    }
}

/// # Summary
/// 单笔交易记录，由配置层整批提供。
///
/// # Invariants
/// - `exit_time` 为 None 表示未平仓。
/// - `extra` 中的自由字段仅用于标签文本。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_time: TimeInput,
    #[serde(default)]
    pub exit_time: Option<TimeInput>,
    pub entry_price: Decimal,
    #[serde(default)]
    pub exit_price: Option<Decimal>,
    pub is_profitable: bool,
    pub trade_type: TradeType,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TradeRecord {
    pub fn closed(
        trade_type: TradeType,
        entry_time: impl Into<TimeInput>,
        entry_price: Decimal,
        exit_time: impl Into<TimeInput>,
        exit_price: Decimal,
        is_profitable: bool,
    ) -> Self {
        Self {
            entry_time: entry_time.into(),
            exit_time: Some(exit_time.into()),
            entry_price,
            exit_price: Some(exit_price),
            is_profitable,
            trade_type,
            extra: BTreeMap::new(),
        }
    }

    pub fn open(
        trade_type: TradeType,
        entry_time: impl Into<TimeInput>,
        entry_price: Decimal,
    ) -> Self {
        Self {
            entry_time: entry_time.into(),
            exit_time: None,
            entry_price,
            exit_price: None,
            is_profitable: false,
            trade_type,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// 叠加层的呈现方式。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeVisualization {
    Rectangles,
    Markers,
    #[default]
    Both,
}

impl TradeVisualization {
    pub fn rectangles(&self) -> bool {
        matches!(self, TradeVisualization::Rectangles | TradeVisualization::Both)
    }

    pub fn markers(&self) -> bool {
        matches!(self, TradeVisualization::Markers | TradeVisualization::Both)
    }
}

/// 交易矩形的外观。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectangleStyle {
    pub fill_color: Color,
    pub fill_opacity: f64,
    pub border_color: Color,
    pub border_width: f64,
    pub border_style: LineStyle,
    pub visible: bool,
}

impl RectangleStyle {
    pub fn new(color: Color) -> Self {
        Self {
            fill_color: color,
            fill_opacity: 0.2,
            border_color: color,
            border_width: 1.0,
            border_style: LineStyle::Solid,
            visible: true,
        }
    }
}

impl Default for RectangleStyle {
    fn default() -> Self {
        Self::new(PROFIT_GREEN)
    }
}

/// 标记形状。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerShape {
    ArrowUp,
    ArrowDown,
    Circle,
    Square,
}

/// 标记相对 bar 的位置。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPosition {
    AboveBar,
    BelowBar,
    InBar,
}

/// 单类标记的外观。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub color: Color,
    pub position: MarkerPosition,
}

impl MarkerStyle {
    pub fn entry_long() -> Self {
        Self {
            shape: MarkerShape::ArrowUp,
            color: Color::rgb(33, 150, 243),
            position: MarkerPosition::BelowBar,
        }
    }

    pub fn entry_short() -> Self {
        Self {
            shape: MarkerShape::ArrowDown,
            color: Color::rgb(255, 152, 0),
            position: MarkerPosition::AboveBar,
        }
    }

    pub fn exit_profitable() -> Self {
        Self {
            shape: MarkerShape::Circle,
            color: PROFIT_GREEN,
            position: MarkerPosition::AboveBar,
        }
    }

    pub fn exit_unprofitable() -> Self {
        Self {
            shape: MarkerShape::Circle,
            color: LOSS_RED,
            position: MarkerPosition::BelowBar,
        }
    }

    /// 用部分字段覆盖当前样式，缺省字段保持不变。
    fn merge(self, patch: MarkerStylePatch) -> Self {
        Self {
            shape: patch.shape.unwrap_or(self.shape),
            color: patch.color.unwrap_or(self.color),
            position: patch.position.unwrap_or(self.position),
        }
    }
}

// 配置层发来的部分标记样式
#[derive(Deserialize)]
struct MarkerStylePatch {
    #[serde(default)]
    shape: Option<MarkerShape>,
    #[serde(default)]
    color: Option<Color>,
    #[serde(default)]
    position: Option<MarkerPosition>,
}

macro_rules! marker_style_field {
    ($name:ident, $default:path) => {
        fn $name<'de, D>(deserializer: D) -> Result<MarkerStyle, D::Error>
        where
            D: Deserializer<'de>,
        {
            MarkerStylePatch::deserialize(deserializer).map(|patch| $default().merge(patch))
        }
    };
}

marker_style_field!(entry_long_style, MarkerStyle::entry_long);
marker_style_field!(entry_short_style, MarkerStyle::entry_short);
marker_style_field!(exit_profitable_style, MarkerStyle::exit_profitable);
marker_style_field!(exit_unprofitable_style, MarkerStyle::exit_unprofitable);

const PROFIT_GREEN: Color = Color::rgb(38, 166, 154);
const LOSS_RED: Color = Color::rgb(239, 83, 80);

/// # Summary
/// 交易叠加层选项。
///
/// # Invariants
/// - 所有字段均有默认值，配置层可只发送部分 JSON；标记样式对象同样可以只给出部分字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeOverlayOptions {
    pub visualization: TradeVisualization,
    pub profitable: RectangleStyle,
    pub unprofitable: RectangleStyle,
    #[serde(deserialize_with = "entry_long_style")]
    pub entry_long: MarkerStyle,
    #[serde(deserialize_with = "entry_short_style")]
    pub entry_short: MarkerStyle,
    #[serde(deserialize_with = "exit_profitable_style")]
    pub exit_profitable: MarkerStyle,
    #[serde(deserialize_with = "exit_unprofitable_style")]
    pub exit_unprofitable: MarkerStyle,
    pub show_labels: bool,
    pub entry_label_template: String,
    pub exit_label_template: String,
    // 超过该值的数字时间按毫秒解析
    pub epoch_ms_threshold: i64,
}

impl Default for TradeOverlayOptions {
    fn default() -> Self {
        Self {
            visualization: TradeVisualization::Both,
            profitable: RectangleStyle::new(PROFIT_GREEN),
            unprofitable: RectangleStyle::new(LOSS_RED),
            entry_long: MarkerStyle::entry_long(),
            entry_short: MarkerStyle::entry_short(),
            exit_profitable: MarkerStyle::exit_profitable(),
            exit_unprofitable: MarkerStyle::exit_unprofitable(),
            show_labels: true,
            entry_label_template: "{trade_type} @ {entry_price}".to_string(),
            exit_label_template: "exit @ {exit_price} ({pnl})".to_string(),
            epoch_ms_threshold: 10_000_000_000,
        }
    }
}

/// # Summary
/// 单笔交易的矩形几何。时间与价格均已排序为 (小, 大)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRectangle {
    // 源交易在输入列表中的下标
    pub trade_index: usize,
    pub time1: Time,
    pub time2: Time,
    pub price1: f64,
    pub price2: f64,
    pub fill_color: Color,
    pub border_color: Color,
    pub border_width: f64,
    pub border_style: LineStyle,
    pub profitable: bool,
}

/// 标记类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    Entry,
    Exit,
}

/// 单个交易标记的几何。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeMarker {
    pub trade_index: usize,
    pub kind: MarkerKind,
    pub time: Time,
    pub position: MarkerPosition,
    pub shape: MarkerShape,
    pub color: Color,
    pub text: Option<String>,
}

/// 一次构建的全部输出，顺序与输入交易顺序一致。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeOverlay {
    pub rectangles: Vec<TradeRectangle>,
    pub markers: Vec<TradeMarker>,
}
