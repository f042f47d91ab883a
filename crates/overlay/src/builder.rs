use crate::label::render_label;
use crate::snap::{latest, snap_to_nearest};
use crate::time::parse_time;
use kagami_core::common::Time;
use kagami_core::config::OverlayConfig;
use kagami_core::overlay::entity::{
    MarkerKind, MarkerStyle, TradeMarker, TradeOverlay, TradeOverlayOptions, TradeRecord,
    TradeRectangle, TradeType,
};
use kagami_core::overlay::error::OverlayError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, warn};

/// # Summary
/// 由全局配置生成叠加层选项，其余字段取默认值。
pub fn options_from_config(config: &OverlayConfig) -> TradeOverlayOptions {
    TradeOverlayOptions {
        epoch_ms_threshold: config.epoch_ms_threshold,
        entry_label_template: config.entry_label_template.clone(),
        exit_label_template: config.exit_label_template.clone(),
        ..TradeOverlayOptions::default()
    }
}

/// # Summary
/// 把一批交易转换为矩形与标记几何。
///
/// # Logic
/// 1. 逐笔处理，单笔失败（时间无法解析、价格无法转换、未平仓且无图表数据）只记录告警并跳过该笔。
/// 2. 输出顺序与输入一致，不去重、不排序；每个几何体记录源交易下标。
///
/// # Arguments
/// * `trades`: 交易列表。
/// * `options`: 呈现选项。
/// * `chart_data`: 图表数据的时间戳序列（Unix 秒），用于对齐与确定未平仓出场时间。
///
/// # Returns
/// 本次构建的全部几何，调用之间不保留任何状态。
pub fn build(
    trades: &[TradeRecord],
    options: &TradeOverlayOptions,
    chart_data: &[Time],
) -> TradeOverlay {
    let mut overlay = TradeOverlay::default();
    for (index, trade) in trades.iter().enumerate() {
        match build_trade(index, trade, options, chart_data) {
            Ok((rectangle, markers)) => {
                overlay.rectangles.extend(rectangle);
                overlay.markers.extend(markers);
            }
            Err(e) => warn!("Skipping trade #{index}: {e}"),
        }
    }
    debug!(
        "Trade overlay built: {} trades -> {} rectangles, {} markers",
        trades.len(),
        overlay.rectangles.len(),
        overlay.markers.len()
    );
    overlay
}

/// # Summary
/// 处理单笔交易。
///
/// # Logic
/// 1. 解析入场时间；出场时间缺省时取图表数据的最晚时间戳。
/// 2. 图表数据非空时把两端时间对齐到最近的数据时间戳。
/// 3. 矩形的时间与价格区间均按 (小, 大) 排列；出场价缺省时取入场价。
/// 4. 入场标记按多空选样式；已平仓交易再追加按盈亏选样式的出场标记。
fn build_trade(
    index: usize,
    trade: &TradeRecord,
    options: &TradeOverlayOptions,
    chart_data: &[Time],
) -> Result<(Option<TradeRectangle>, Vec<TradeMarker>), OverlayError> {
    let threshold = options.epoch_ms_threshold;
    let entry = parse_time(&trade.entry_time, threshold)?;
    let exit = match &trade.exit_time {
        Some(time) => parse_time(time, threshold)?,
        None => latest(chart_data).ok_or(OverlayError::MissingChartData)?,
    };
    let entry = snap_to_nearest(entry, chart_data).unwrap_or(entry);
    let exit = snap_to_nearest(exit, chart_data).unwrap_or(exit);

    let entry_price = to_price(trade.entry_price)?;
    let exit_price = to_price(trade.exit_price.unwrap_or(trade.entry_price))?;

    let rectangle = if options.visualization.rectangles() {
        let style = if trade.is_profitable {
            &options.profitable
        } else {
            &options.unprofitable
        };
        style.visible.then(|| TradeRectangle {
            trade_index: index,
            time1: entry.min(exit),
            time2: entry.max(exit),
            price1: entry_price.min(exit_price),
            price2: entry_price.max(exit_price),
            fill_color: style.fill_color.fade(style.fill_opacity),
            border_color: style.border_color,
            border_width: style.border_width,
            border_style: style.border_style,
            profitable: trade.is_profitable,
        })
    } else {
        None
    };

    let mut markers = Vec::new();
    if options.visualization.markers() {
        let entry_style = match trade.trade_type {
            TradeType::Long => &options.entry_long,
            TradeType::Short => &options.entry_short,
        };
        markers.push(marker(
            index,
            MarkerKind::Entry,
            entry,
            entry_style,
            label(options, &options.entry_label_template, trade),
        ));
        if !trade.is_open() {
            let exit_style = if trade.is_profitable {
                &options.exit_profitable
            } else {
                &options.exit_unprofitable
            };
            markers.push(marker(
                index,
                MarkerKind::Exit,
                exit,
                exit_style,
                label(options, &options.exit_label_template, trade),
            ));
        }
    }

    Ok((rectangle, markers))
}

fn to_price(price: Decimal) -> Result<f64, OverlayError> {
    price
        .to_f64()
        .filter(|p| p.is_finite())
        .ok_or_else(|| OverlayError::InvalidPrice(price.to_string()))
}

fn label(options: &TradeOverlayOptions, template: &str, trade: &TradeRecord) -> Option<String> {
    options.show_labels.then(|| render_label(template, trade))
}

fn marker(
    trade_index: usize,
    kind: MarkerKind,
    time: Time,
    style: &MarkerStyle,
    text: Option<String>,
) -> TradeMarker {
    TradeMarker {
        trade_index,
        kind,
        time,
        position: style.position,
        shape: style.shape,
        color: style.color,
        text,
    }
}
