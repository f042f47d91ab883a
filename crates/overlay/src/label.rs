use kagami_core::overlay::entity::{TradeRecord, TradeType};
use rust_decimal::Decimal;
use serde_json::Value;

/// # Summary
/// 用交易字段替换模板中的 `{name}` 占位符。
///
/// # Logic
/// 1. 内置占位符：`entry_price`、`exit_price`、`trade_type`、`pnl`、`pnl_pct`。
/// 2. 其余名称从交易的自由字段中查找。
/// 3. 找不到或无法计算的占位符原样保留；缺少右括号的尾部原样输出。
///
/// # Arguments
/// * `template`: 标签模板。
/// * `trade`: 交易记录。
///
/// # Returns
/// 替换后的文本。
pub fn render_label(template: &str, trade: &TradeRecord) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let Some(close) = tail.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        let name = &tail[..close];
        match lookup(name, trade) {
            Some(value) => out.push_str(&value),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &tail[close + 1..];
    }
    out.push_str(rest);
    out
}

fn lookup(name: &str, trade: &TradeRecord) -> Option<String> {
    match name {
        "entry_price" => Some(trade.entry_price.normalize().to_string()),
        "exit_price" => trade.exit_price.map(|p| p.normalize().to_string()),
        "trade_type" => Some(trade.trade_type.to_string()),
        "pnl" => pnl(trade).map(|v| signed(v.normalize())),
        "pnl_pct" => pnl_pct(trade).map(|v| format!("{}%", signed(v))),
        _ => trade.extra.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }),
    }
}

/// 单位盈亏：做多为 exit - entry，做空为 entry - exit。未平仓时为 None。
pub fn pnl(trade: &TradeRecord) -> Option<Decimal> {
    let exit = trade.exit_price?;
    Some(match trade.trade_type {
        TradeType::Long => exit - trade.entry_price,
        TradeType::Short => trade.entry_price - exit,
    })
}

/// 盈亏相对入场价的百分比，保留两位小数。入场价为 0 时为 None。
pub fn pnl_pct(trade: &TradeRecord) -> Option<Decimal> {
    let pnl = pnl(trade)?;
    pnl.checked_div(trade.entry_price)
        .map(|ratio| (ratio * Decimal::ONE_HUNDRED).round_dp(2))
}

fn signed(value: Decimal) -> String {
    if value.is_sign_positive() && !value.is_zero() {
        format!("+{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_builtin_placeholders() {
        let trade = TradeRecord::closed(TradeType::Long, 1, dec!(100.50), 2, dec!(110.00), true);
        assert_eq!(render_label("{trade_type} @ {entry_price}", &trade), "long @ 100.5");
        assert_eq!(render_label("exit @ {exit_price} ({pnl})", &trade), "exit @ 110 (+9.5)");
        assert_eq!(render_label("{pnl_pct}", &trade), "+9.45%");
    }

    #[test]
    fn test_short_pnl_sign() {
        let trade = TradeRecord::closed(TradeType::Short, 1, dec!(100), 2, dec!(110), false);
        assert_eq!(pnl(&trade), Some(dec!(-10)));
        assert_eq!(render_label("{pnl}", &trade), "-10");
    }

    #[test]
    fn test_free_fields_and_unknown_placeholders() {
        let trade = TradeRecord::open(TradeType::Short, 1, dec!(50))
            .with_field("strategy", Value::String("breakout".to_string()))
            .with_field("size", serde_json::json!(3));
        assert_eq!(
            render_label("{strategy} x{size} {unknown} {exit_price} {pnl}", &trade),
            "breakout x3 {unknown} {exit_price} {pnl}"
        );
        assert_eq!(render_label("no braces", &trade), "no braces");
        assert_eq!(render_label("dangling {strategy", &trade), "dangling {strategy");
    }
}
