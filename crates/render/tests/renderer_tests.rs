use kagami_core::common::{Color, PixelRatio, VisibleRange};
use kagami_core::series::entity::{BandRecord, RibbonRecord, SignalRecord, TrendRecord};
use kagami_core::series::error::RenderError;
use kagami_core::series::port::{CoordinateConverter, IndicatorRenderer, PaintContext, PriceRange};
use kagami_core::style::entity::{LineStyle, LineStyleDescriptor};
use kagami_core::testing::{LinearConverter, RecordingSurface};
use kagami_render::band::{BandOptions, BandSeries};
use kagami_render::gradient_ribbon::{GradientRibbonOptions, GradientRibbonSeries};
use kagami_render::ribbon::{RibbonOptions, RibbonSeries};
use kagami_render::series::{IndicatorData, IndicatorKind, IndicatorOptions, IndicatorSeries};
use kagami_render::signal::{SignalOptions, SignalSeries};
use kagami_render::trend_fill::{TrendFillOptions, TrendFillSeries};

/// 每秒 10px、每价格单位 1px、窗格高 500px 的换算器。
fn converter() -> LinearConverter {
    LinearConverter::new(10.0, 1.0)
}

fn paint<S: IndicatorRenderer>(series: &S, visible: VisibleRange) -> RecordingSurface {
    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = converter();
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible,
        pixel_ratio: PixelRatio::default(),
        bar_spacing: 10.0,
    };
    series.draw(&mut ctx);
    surface
}

#[test]
fn test_band_scenario_three_lines_two_fills() {
    let mut band = BandSeries::default();
    band.set_data(vec![
        BandRecord::new(1, 110.0, 100.0, 90.0),
        BandRecord::new(2, 112.0, 102.0, 92.0),
    ]);

    let surface = paint(&band, VisibleRange::full(2));

    assert_eq!(surface.fills().len(), 2);
    assert_eq!(surface.strokes().len(), 3);
    assert!(surface.fills_precede_strokes());

    // 没有缺口：每条线恰好连接两个点
    for (points, _) in surface.strokes() {
        assert_eq!(points.len(), 2);
    }
    // 上轨 y = 500 - 110
    let (upper, _) = surface.strokes()[0];
    assert_eq!(upper[0].x, 10.0);
    assert_eq!(upper[0].y, 390.0);
}

#[test]
fn test_whitespace_breaks_lines_and_fills() {
    let mut ribbon = RibbonSeries::default();
    ribbon.set_data(vec![
        RibbonRecord::new(1, 10.0, 5.0),
        RibbonRecord::new(2, 11.0, 6.0),
        RibbonRecord::whitespace(3),
        RibbonRecord::new(4, 12.0, 7.0),
        RibbonRecord::new(5, 13.0, 8.0),
    ]);

    let surface = paint(&ribbon, VisibleRange::full(5));
    let gap_x = 30.0;

    // 上下两条线各断成两段
    assert_eq!(surface.strokes().len(), 4);
    for (points, _) in surface.strokes() {
        assert!(points.iter().all(|p| p.x != gap_x));
    }
    // 仅 (1,2) 与 (4,5) 两个四边形
    assert_eq!(surface.fills().len(), 2);
    for (polygon, _) in surface.fills() {
        assert!(polygon.iter().all(|p| p.x != gap_x));
    }
    assert!(surface.fills_precede_strokes());
}

#[test]
fn test_wrong_typed_json_sample_only_blanks_itself() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let records: Vec<BandRecord> = serde_json::from_str(
        r#"[
            {"time": 1, "upper": 110, "middle": 100, "lower": 90},
            {"time": 2, "upper": 111, "middle": "bad", "lower": 91},
            {"time": 3, "upper": 112, "middle": 102, "lower": 92}
        ]"#,
    )?;
    let mut band = BandSeries::default();
    band.set_data(records);

    let surface = paint(&band, VisibleRange::full(3));
    // 上、下轨连续；中轨在 t=2 断开后只剩孤立点，不画
    assert_eq!(surface.strokes().len(), 2);
    // 两个填充区都依赖中轨，全部跳过
    assert!(surface.fills().is_empty());
    Ok(())
}

#[test]
fn test_dashed_line_is_split_into_dashes() {
    let mut ribbon = RibbonSeries::new(RibbonOptions {
        upper_line: LineStyleDescriptor::solid(Color::rgb(0, 0, 0), 1.0)
            .with_style(LineStyle::Dashed),
        lower_line: LineStyleDescriptor::default().hidden(),
        ..RibbonOptions::default()
    });
    let mut options = ribbon.options().clone();
    options.fill.visible = false;
    ribbon.apply_options(options);
    ribbon.set_data((0..=10).map(|t| RibbonRecord::new(t, 100.0, 90.0)).collect());

    let surface = paint(&ribbon, VisibleRange::full(11));
    let strokes = surface.strokes();

    // 100px 长的水平线，2px 实 2px 空
    assert_eq!(strokes.len(), 25);
    for (points, stroke) in &strokes {
        assert!(points.iter().all(|p| p.y == 400.0));
        let length = points.last().unwrap().x - points.first().unwrap().x;
        assert!((length - 2.0).abs() < 1e-6);
        assert_eq!(stroke.width, 1.0);
    }
}

#[test]
fn test_off_pane_outlier_keeps_dotted_line_bounded() {
    let mut ribbon = RibbonSeries::new(RibbonOptions {
        upper_line: LineStyleDescriptor::solid(Color::rgb(0, 0, 0), 1.0)
            .with_style(LineStyle::Dotted),
        lower_line: LineStyleDescriptor::default().hidden(),
        ..RibbonOptions::default()
    });
    let mut options = ribbon.options().clone();
    options.fill.visible = false;
    ribbon.apply_options(options);
    ribbon.set_data(vec![
        RibbonRecord::new(1, 100.0, 90.0),
        RibbonRecord::new(2, 20_000_000.0, 90.0),
    ]);

    let surface = paint(&ribbon, VisibleRange::full(2));
    let strokes = surface.strokes();

    // 只有窗格内约 400px 的可见部分被切分
    assert!(!strokes.is_empty());
    assert!(strokes.len() <= 250, "stroke ops: {}", strokes.len());
    assert!(strokes.iter().all(|(points, _)| points.iter().all(|p| p.y >= -2.0)));
}

#[test]
fn test_dashed_pattern_continues_after_leaving_pane() {
    let mut ribbon = RibbonSeries::new(RibbonOptions {
        upper_line: LineStyleDescriptor::solid(Color::rgb(0, 0, 0), 1.0)
            .with_style(LineStyle::Dashed),
        lower_line: LineStyleDescriptor::default().hidden(),
        ..RibbonOptions::default()
    });
    let mut options = ribbon.options().clone();
    options.fill.visible = false;
    ribbon.apply_options(options);
    // 中间一段完全越出窗格右侧
    ribbon.set_data(vec![
        RibbonRecord::new(1, 100.0, 90.0),
        RibbonRecord::new(2, 100.0, 90.0),
        RibbonRecord::new(100, 100.0, 90.0),
    ]);

    let surface = paint(&ribbon, VisibleRange::full(3));
    let strokes = surface.strokes();

    // x 从 10 到 801 的可见部分，4px 一个周期
    assert!(strokes.len() <= 220, "stroke ops: {}", strokes.len());
    assert!(strokes.iter().all(|(points, _)| points.iter().all(|p| p.x <= 801.0 + 1e-6)));
}

#[test]
fn test_line_width_scales_with_pixel_ratio() {
    let mut ribbon = RibbonSeries::default();
    ribbon.set_data(vec![RibbonRecord::new(1, 10.0, 5.0), RibbonRecord::new(2, 11.0, 6.0)]);

    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = converter();
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible: VisibleRange::full(2),
        pixel_ratio: PixelRatio::uniform(2.0),
        bar_spacing: 10.0,
    };
    ribbon.draw(&mut ctx);

    let (points, stroke) = surface.strokes()[0];
    assert_eq!(stroke.width, 2.0);
    assert_eq!(points[1].x, 40.0);
}

#[test]
fn test_band_autoscale_covers_all_fields() {
    let mut band = BandSeries::default();
    band.set_data(vec![
        BandRecord::new(1, 110.0, 100.0, 90.0),
        BandRecord::new(2, 125.0, 101.0, 80.0),
        BandRecord::whitespace(3),
        BandRecord::new(4, 500.0, 400.0, 300.0),
    ]);

    let mut range = PriceRange::new();
    band.autoscale(VisibleRange::new(0, 3), &mut range);
    assert_eq!(range.bounds(), Some((80.0, 125.0)));

    // 超出数据长度的区间被裁剪
    let mut all = PriceRange::new();
    band.autoscale(VisibleRange::new(0, 99), &mut all);
    assert_eq!(all.bounds(), Some((80.0, 500.0)));
}

#[test]
fn test_visible_range_limits_drawing() {
    let mut ribbon = RibbonSeries::default();
    ribbon.set_data((1..=10).map(|t| RibbonRecord::new(t, 20.0, 10.0)).collect());

    let surface = paint(&ribbon, VisibleRange::new(2, 5));
    assert_eq!(surface.fills().len(), 2);
    let (upper, _) = surface.strokes()[0];
    assert_eq!(upper.len(), 3);
    assert_eq!(upper[0].x, 30.0);
}

#[test]
fn test_draw_is_repeatable_and_idle_draws_nothing() {
    let idle = BandSeries::default();
    assert!(!idle.is_ready());
    assert!(paint(&idle, VisibleRange::full(10)).ops.is_empty());

    let mut band = BandSeries::new(BandOptions::default());
    band.set_data(vec![
        BandRecord::new(1, 110.0, 100.0, 90.0),
        BandRecord::new(2, 112.0, 102.0, 92.0),
    ]);
    let first = paint(&band, VisibleRange::full(2));
    let second = paint(&band, VisibleRange::full(2));
    assert_eq!(first.ops, second.ops);
}

#[test]
fn test_points_outside_time_window_are_dropped() {
    let mut ribbon = RibbonSeries::default();
    ribbon.set_data((1..=5).map(|t| RibbonRecord::new(t, 20.0, 10.0)).collect());

    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = converter().with_window(2, 4);
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible: VisibleRange::full(5),
        pixel_ratio: PixelRatio::default(),
        bar_spacing: 10.0,
    };
    ribbon.draw(&mut ctx);

    assert_eq!(surface.fills().len(), 2);
    assert!(
        surface
            .strokes()
            .iter()
            .all(|(points, _)| points.iter().all(|p| (20.0..=40.0).contains(&p.x)))
    );
}

/// 仅对一个时间点换算失败的换算器。
struct SkipOneTime {
    inner: LinearConverter,
    skipped: i64,
}

impl CoordinateConverter for SkipOneTime {
    fn time_to_x(&self, time: i64) -> Option<f64> {
        if time == self.skipped {
            return None;
        }
        self.inner.time_to_x(time)
    }

    fn price_to_y(&self, price: f64) -> Option<f64> {
        self.inner.price_to_y(price)
    }
}

#[test]
fn test_interior_time_failure_breaks_only_that_point() {
    let mut ribbon = RibbonSeries::default();
    ribbon.set_data((1..=5).map(|t| RibbonRecord::new(t, 20.0, 10.0)).collect());

    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = SkipOneTime {
        inner: converter(),
        skipped: 3,
    };
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible: VisibleRange::full(5),
        pixel_ratio: PixelRatio::default(),
        bar_spacing: 10.0,
    };
    ribbon.draw(&mut ctx);

    // 两侧不再被一条直线连起来
    assert_eq!(surface.strokes().len(), 4);
    for (points, _) in surface.strokes() {
        let spans_gap = points.iter().any(|p| p.x <= 20.0) && points.iter().any(|p| p.x >= 40.0);
        assert!(!spans_gap);
    }
    assert_eq!(surface.fills().len(), 2);
    for (polygon, _) in surface.fills() {
        let spans_gap =
            polygon.iter().any(|p| p.x <= 20.0) && polygon.iter().any(|p| p.x >= 40.0);
        assert!(!spans_gap);
    }
}

#[test]
fn test_signal_binary_series_never_uses_alert_color() {
    let options = SignalOptions {
        neutral_color: Color::rgb(128, 128, 128),
        ..SignalOptions::default()
    };
    let mut signal = SignalSeries::new(options.clone());
    signal.set_data(
        [0.0, 1.0, 0.0, 1.0]
            .iter()
            .enumerate()
            .map(|(i, v)| SignalRecord::new(i64::try_from(i).unwrap() + 1, *v))
            .collect(),
    );
    assert!(!signal.is_multi_state());

    let surface = paint(&signal, VisibleRange::full(4));
    let rects = surface.rects();
    assert_eq!(rects.len(), 4);

    let neutral = options.neutral_color.fade(options.opacity);
    let active = options.signal_color.fade(options.opacity);
    let alert = options.alert_color.fade(options.opacity);
    assert!(rects.iter().all(|(_, c)| *c == neutral || *c == active));
    assert!(rects.iter().all(|(_, c)| *c != alert));
    assert_eq!(rects[1].1, active);

    // 整个窗格高度，宽度等于 bar 间距
    let (rect, _) = rects[0];
    assert_eq!(rect.height, 500.0);
    assert_eq!(rect.width, 10.0);
    assert_eq!(rect.x, 5.0);

    // 纯 0/1 序列中，负值回落到信号色
    assert_eq!(signal.color_for(-1.0), active);
}

#[test]
fn test_signal_multi_state_series_uses_alert_color() {
    let options = SignalOptions::default();
    let mut signal = SignalSeries::new(options.clone());
    signal.set_data(vec![
        SignalRecord::new(1, -1.0),
        SignalRecord::new(2, 0.0),
        SignalRecord::new(3, 1.0),
    ]);
    assert!(signal.is_multi_state());

    let surface = paint(&signal, VisibleRange::full(3));
    let rects = surface.rects();
    // 默认中性色透明，不提交
    assert_eq!(rects.len(), 2);
    assert_eq!(rects[0].1, options.alert_color.fade(options.opacity));
    assert_eq!(rects[1].1, options.signal_color.fade(options.opacity));

    let mut range = PriceRange::new();
    signal.autoscale(VisibleRange::full(3), &mut range);
    assert!(range.is_empty());
}

#[test]
fn test_gradient_ribbon_interpolates_by_position() {
    let options = GradientRibbonOptions::default();
    let mut ribbon = GradientRibbonSeries::new(options.clone());
    ribbon.set_data(vec![
        RibbonRecord::new(1, 20.0, 10.0),
        RibbonRecord::new(2, 20.0, 10.0),
        RibbonRecord::new(3, 20.0, 10.0),
    ]);

    let surface = paint(&ribbon, VisibleRange::full(3));
    let fills = surface.fills();
    assert_eq!(fills.len(), 2);
    let g = options.gradient;
    assert_eq!(fills[0].1, Color::lerp(g.start_color, g.end_color, 0.25));
    assert_eq!(fills[1].1, Color::lerp(g.start_color, g.end_color, 0.75));
    assert!(surface.fills_precede_strokes());
}

#[test]
fn test_gradient_ribbon_normalized_by_spread() {
    let mut options = GradientRibbonOptions::default();
    options.gradient.normalize_gradients = true;
    let mut ribbon = GradientRibbonSeries::new(options.clone());
    ribbon.set_data(vec![
        RibbonRecord::new(1, 20.0, 10.0),
        RibbonRecord::new(2, 20.0, 10.0),
        RibbonRecord::new(3, 40.0, 10.0),
    ]);

    let surface = paint(&ribbon, VisibleRange::full(3));
    let fills = surface.fills();
    let g = options.gradient;
    // 带宽 10, 10, 30 归一化为 0, 0, 1
    assert_eq!(fills[0].1, g.start_color);
    assert_eq!(fills[1].1, Color::lerp(g.start_color, g.end_color, 0.5));
}

#[test]
fn test_trend_fill_splits_at_crossing() {
    let options = TrendFillOptions::default();
    let mut trend = TrendFillSeries::new(options.clone());
    trend.set_data(vec![TrendRecord::new(1, 2.0), TrendRecord::new(2, -2.0)]);

    let surface = paint(&trend, VisibleRange::full(2));
    let fills = surface.fills();
    assert_eq!(fills.len(), 2);
    assert_eq!(fills[0].1, options.up_fill.color);
    assert_eq!(fills[1].1, options.down_fill.color);
    // 交叉点位于两点正中，落在基准线上
    let cross = fills[0].0[1];
    assert_eq!(cross.x, 15.0);
    assert_eq!(cross.y, 500.0);

    // 基准线默认隐藏，只有数值线
    assert_eq!(surface.strokes().len(), 1);
    assert!(surface.fills_precede_strokes());

    // 自动缩放计入基准 0
    let mut range = PriceRange::new();
    trend.autoscale(VisibleRange::full(2), &mut range);
    assert_eq!(range.bounds(), Some((-2.0, 2.0)));
}

#[test]
fn test_trend_line_colored_by_direction() {
    let options = TrendFillOptions {
        color_line_by_trend: true,
        ..TrendFillOptions::default()
    };
    let mut trend = TrendFillSeries::new(options.clone());
    trend.set_data(vec![
        TrendRecord::new(1, 1.0).with_base(0.0),
        TrendRecord::new(2, 2.0),
        TrendRecord::new(3, -1.0),
        TrendRecord::new(4, -2.0),
    ]);

    let surface = paint(&trend, VisibleRange::full(4));
    let strokes = surface.strokes();
    assert_eq!(strokes.len(), 2);
    assert_eq!(strokes[0].1.color, options.up_line_color);
    assert_eq!(strokes[1].1.color, options.down_line_color);
    // 相邻段共享端点
    assert_eq!(strokes[0].0.last(), strokes[1].0.first());
}

#[test]
fn test_indicator_series_dispatch() -> anyhow::Result<()> {
    let kind: IndicatorKind = "gradient-ribbon".parse()?;
    assert_eq!(kind, IndicatorKind::GradientRibbon);
    assert_eq!(kind.to_string(), "gradient_ribbon");
    assert!(matches!(
        "candles".parse::<IndicatorKind>(),
        Err(RenderError::UnknownKind(_))
    ));

    let mut series = IndicatorSeries::new(IndicatorKind::Band);
    assert!(!series.is_ready());

    let data: IndicatorData = serde_json::from_str(
        r#"{"type": "band", "data": [
            {"time": 1, "upper": 110, "middle": 100, "lower": 90},
            {"time": 2, "upper": 112, "middle": 102, "lower": 92}
        ]}"#,
    )?;
    series.set_data(data)?;
    assert!(series.is_ready());
    assert_eq!(series.len(), 2);
    assert_eq!(series.price_values(1), vec![112.0, 102.0, 92.0]);

    let err = series
        .set_data(IndicatorData::Signal(vec![SignalRecord::new(1, 1.0)]))
        .unwrap_err();
    assert_eq!(
        err,
        RenderError::KindMismatch {
            expected: "band".to_string(),
            actual: "signal".to_string(),
        }
    );
    // 失败的调用不改变状态
    assert_eq!(series.len(), 2);

    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = converter();
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible: VisibleRange::full(2),
        pixel_ratio: PixelRatio::default(),
        bar_spacing: 10.0,
    };
    series.draw(&mut ctx);
    assert_eq!(surface.fills().len(), 2);
    assert_eq!(surface.strokes().len(), 3);
    Ok(())
}

#[test]
fn test_indicator_options_validation() -> anyhow::Result<()> {
    let mut series = IndicatorSeries::new(IndicatorKind::Ribbon);

    let partial: IndicatorOptions = serde_json::from_str(
        r##"{"type": "ribbon", "options": {"fill": {"color": "#ff000033"}}}"##,
    )?;
    series.apply_options(partial)?;

    let mut bad = RibbonOptions::default();
    bad.upper_line.width = -1.0;
    assert!(matches!(
        series.apply_options(IndicatorOptions::Ribbon(bad)),
        Err(RenderError::InvalidOptions(_))
    ));
    assert!(matches!(
        series.apply_options(IndicatorOptions::Signal(SignalOptions::default())),
        Err(RenderError::KindMismatch { .. })
    ));
    Ok(())
}

#[test]
fn test_signal_min_width_from_config() {
    let config = kagami_core::config::RenderConfig {
        signal_min_bar_width: 6.0,
        ..Default::default()
    };
    let mut signal = SignalSeries::new(SignalOptions::from_config(&config));
    signal.set_data(vec![SignalRecord::new(1, 1.0)]);

    let mut surface = RecordingSurface::new(800.0, 500.0);
    let conv = converter();
    let mut ctx = PaintContext {
        surface: &mut surface,
        converter: &conv,
        visible: VisibleRange::full(1),
        pixel_ratio: config.pixel_ratio(),
        bar_spacing: 2.0,
    };
    signal.draw(&mut ctx);

    // bar 间距小于最小带宽时取最小带宽
    let (rect, _) = surface.rects()[0];
    assert_eq!(rect.width, 6.0);
}
