use kagami_core::common::{Color, Point, Rect};
use kagami_core::series::entity::LinePoint;
use kagami_core::series::port::DrawingSurface;
use kagami_core::style::entity::{LineStyle, Stroke};

const EPSILON: f64 = 1e-9;

/// # Summary
/// 填充的着色方式。
#[derive(Debug, Clone, Copy)]
pub enum FillPaint<'a> {
    /// 单一颜色
    Solid(Color),
    /// 逐四边形插值的渐变。`scalars` 与点序列对齐，给出时覆盖按位置插值。
    Gradient {
        start: Color,
        end: Color,
        scalars: Option<&'a [f64]>,
    },
}

impl FillPaint<'_> {
    /// # Summary
    /// 计算第 `quad` 个四边形（连接点 `quad` 与 `quad + 1`）的颜色。
    ///
    /// # Logic
    /// 1. 纯色直接返回。
    /// 2. 渐变时优先取两端点标量的均值；标量缺失或非有限时回落到四边形中心在序列中的相对位置。
    fn color_at(&self, quad: usize, points: usize) -> Color {
        match *self {
            FillPaint::Solid(color) => color,
            FillPaint::Gradient {
                start,
                end,
                scalars,
            } => {
                let from_scalars = scalars.and_then(|s| {
                    let a = *s.get(quad)?;
                    let b = *s.get(quad + 1)?;
                    let mean = (a + b) / 2.0;
                    mean.is_finite().then_some(mean)
                });
                let t = from_scalars.unwrap_or_else(|| position(quad, points));
                Color::lerp(start, end, t)
            }
        }
    }
}

// 四边形中心在 [0, 1] 中的位置
#[allow(clippy::cast_precision_loss)]
fn position(quad: usize, points: usize) -> f64 {
    if points < 2 {
        return 0.0;
    }
    (quad as f64 + 0.5) / (points - 1) as f64
}

/// # Summary
/// 沿点序列描边，遇到断点形成缺口。
///
/// # Logic
/// 1. 依次遍历相邻点对，任一端点 y 为 None 即跳过该对，不做插值跨越。
/// 2. 连续可画的点组成一段 run，实线样式整段一次描边。
/// 3. 虚线样式按 (实段, 空段) 节奏切分，节奏在同一 run 的线段间连续，遇缺口重置；位图之外的部分只推进节奏不切分。
///
/// # Arguments
/// * `surface`: 本次绘制的表面。
/// * `points`: 位图坐标下的单线投影。
/// * `stroke`: 颜色与设备像素线宽（调用方已按像素比缩放）。
/// * `style`: 线条样式。
pub fn draw_multi_line(
    surface: &mut dyn DrawingSurface,
    points: &[LinePoint],
    stroke: &Stroke,
    style: LineStyle,
) {
    if stroke.width <= 0.0 || stroke.color.is_transparent() {
        return;
    }
    let mut run: Vec<Point> = Vec::new();
    for point in points {
        match point.y {
            Some(y) => run.push(Point::new(point.x, y)),
            None => {
                stroke_run(surface, &run, stroke, style);
                run.clear();
            }
        }
    }
    stroke_run(surface, &run, stroke, style);
}

fn stroke_run(surface: &mut dyn DrawingSurface, run: &[Point], stroke: &Stroke, style: LineStyle) {
    if run.len() < 2 {
        return;
    }
    match style.dash_pattern(stroke.width) {
        None => surface.stroke_path(run, stroke),
        Some((on, off)) => stroke_dashed(surface, run, stroke, on, off),
    }
}

// 虚线节奏：当前处于实段还是空段，以及该段剩余长度
struct DashPhase {
    on: f64,
    off: f64,
    drawing: bool,
    remaining: f64,
}

impl DashPhase {
    fn new(on: f64, off: f64) -> Self {
        Self {
            on,
            off,
            drawing: true,
            remaining: on,
        }
    }

    fn toggle(&mut self) {
        self.drawing = !self.drawing;
        self.remaining = if self.drawing { self.on } else { self.off };
    }

    // 跳过一段不可见长度，按周期取模，O(1)
    fn skip(&mut self, distance: f64) {
        let period = self.on + self.off;
        let elapsed = if self.drawing {
            self.on - self.remaining
        } else {
            period - self.remaining
        };
        let phase = (elapsed + distance).rem_euclid(period);
        self.drawing = phase < self.on;
        self.remaining = if self.drawing {
            self.on - phase
        } else {
            period - phase
        };
        if self.remaining <= EPSILON {
            self.toggle();
        }
    }
}

/// # Summary
/// 把虚线 run 切成若干实段逐段描边。
///
/// # Logic
/// 1. 每条线段先裁剪到位图范围（外扩一个线宽），只在可见部分上逐段切分。
/// 2. 被裁掉的长度直接推进节奏，保证单次绘制的描边次数与可见长度成正比，与离群值的量级无关。
fn stroke_dashed(
    surface: &mut dyn DrawingSurface,
    run: &[Point],
    stroke: &Stroke,
    on: f64,
    off: f64,
) {
    let size = surface.bitmap_size();
    let margin = stroke.width.max(1.0);
    let bounds = Rect {
        x: -margin,
        y: -margin,
        width: size.width + 2.0 * margin,
        height: size.height + 2.0 * margin,
    };
    let mut phase = DashPhase::new(on, off);
    let mut dash: Vec<Point> = Vec::new();

    for pair in run.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let length = (b.x - a.x).hypot(b.y - a.y);
        if length <= EPSILON {
            continue;
        }
        let Some((t0, t1)) = clip_segment(a, b, &bounds) else {
            flush_dash(surface, &mut dash, stroke, &phase);
            phase.skip(length);
            continue;
        };
        let start = t0 * length;
        let end = t1 * length;
        let at = |d: f64| {
            let t = d / length;
            Point::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t)
        };
        if start > EPSILON {
            flush_dash(surface, &mut dash, stroke, &phase);
            phase.skip(start);
        }
        if phase.drawing && dash.is_empty() {
            dash.push(at(start));
        }

        let mut travelled = start;
        while end - travelled > EPSILON {
            let step = phase.remaining.min(end - travelled);
            travelled += step;
            phase.remaining -= step;
            let p = at(travelled);
            if phase.drawing {
                dash.push(p);
            }
            if phase.remaining <= EPSILON {
                if phase.drawing {
                    if dash.len() >= 2 {
                        surface.stroke_path(&dash, stroke);
                    }
                    dash.clear();
                } else {
                    dash.push(p);
                }
                phase.toggle();
            }
        }

        if length - end > EPSILON {
            flush_dash(surface, &mut dash, stroke, &phase);
            phase.skip(length - end);
        }
    }
    flush_dash(surface, &mut dash, stroke, &phase);
}

fn flush_dash(
    surface: &mut dyn DrawingSurface,
    dash: &mut Vec<Point>,
    stroke: &Stroke,
    phase: &DashPhase,
) {
    if phase.drawing && dash.len() >= 2 {
        surface.stroke_path(dash, stroke);
    }
    dash.clear();
}

/// # Summary
/// Liang-Barsky 线段裁剪。
///
/// # Returns
/// 线段 `a -> b` 落在 `bounds` 内的参数区间 `(t0, t1)`，完全在外时为 None。
fn clip_segment(a: Point, b: Point, bounds: &Rect) -> Option<(f64, f64)> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let edges = [
        (-dx, a.x - bounds.x),
        (dx, bounds.x + bounds.width - a.x),
        (-dy, a.y - bounds.y),
        (dy, bounds.y + bounds.height - a.y),
    ];
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

/// # Summary
/// 填充上下两条平行边界之间的区域。
///
/// # Logic
/// 1. 对每个相邻下标对 (i, i + 1) 构造四边形：上 i → 上 i+1 → 下 i+1 → 下 i。
/// 2. 四个角中任一 y 为 None 则跳过该四边形（留出缺口，不拉伸填充）。
/// 3. 按 `paint` 计算颜色，完全透明的四边形不提交。
///
/// # Arguments
/// * `surface`: 本次绘制的表面。
/// * `upper`: 上边界点序列。
/// * `lower`: 下边界点序列，与 `upper` 按下标对齐。
/// * `paint`: 纯色或渐变。
pub fn draw_fill_area(
    surface: &mut dyn DrawingSurface,
    upper: &[LinePoint],
    lower: &[LinePoint],
    paint: &FillPaint<'_>,
) {
    let count = upper.len().min(lower.len());
    for quad in 0..count.saturating_sub(1) {
        let (u0, u1, l0, l1) = (upper[quad], upper[quad + 1], lower[quad], lower[quad + 1]);
        let (Some(u0y), Some(u1y), Some(l0y), Some(l1y)) = (u0.y, u1.y, l0.y, l1.y) else {
            continue;
        };
        let color = paint.color_at(quad, count);
        if color.is_transparent() {
            continue;
        }
        let polygon = [
            Point::new(u0.x, u0y),
            Point::new(u1.x, u1y),
            Point::new(l1.x, l1y),
            Point::new(l0.x, l0y),
        ];
        surface.fill_path(&polygon, color);
    }
}

/// # Summary
/// 按方向着色填充数值线与基准线之间的区域。
///
/// # Logic
/// 1. `diffs[i]` 为数据空间中的 `value - base`，其符号决定颜色（正为 `up`，负为 `down`）。
/// 2. 相邻两点符号相反时，在线性插值的交叉点把四边形切为两块，各自按自身符号着色。
/// 3. 任一角缺失则跳过；两端差值均为 0 时区域面积为 0，同样跳过。
///
/// # Arguments
/// * `surface`: 本次绘制的表面。
/// * `value`: 数值线点序列。
/// * `base`: 基准线点序列。
/// * `diffs`: 与点序列对齐的数据空间差值。
/// * `up`: 正向颜色。
/// * `down`: 负向颜色。
pub fn draw_signed_fill(
    surface: &mut dyn DrawingSurface,
    value: &[LinePoint],
    base: &[LinePoint],
    diffs: &[Option<f64>],
    up: Color,
    down: Color,
) {
    let count = value.len().min(base.len()).min(diffs.len());
    let pick = |d: f64| if d >= 0.0 { up } else { down };

    for i in 0..count.saturating_sub(1) {
        let (v0, v1, b0, b1) = (value[i], value[i + 1], base[i], base[i + 1]);
        let (Some(v0y), Some(v1y), Some(b0y), Some(b1y), Some(d0), Some(d1)) =
            (v0.y, v1.y, b0.y, b1.y, diffs[i], diffs[i + 1])
        else {
            continue;
        };
        if d0 == 0.0 && d1 == 0.0 {
            continue;
        }
        if d0 * d1 < 0.0 {
            let t = d0 / (d0 - d1);
            let cross = Point::new(v0.x + (v1.x - v0.x) * t, v0y + (v1y - v0y) * t);
            let left = [Point::new(v0.x, v0y), cross, Point::new(b0.x, b0y)];
            let right = [cross, Point::new(v1.x, v1y), Point::new(b1.x, b1y)];
            fill_unless_transparent(surface, &left, pick(d0));
            fill_unless_transparent(surface, &right, pick(d1));
        } else {
            // 一端恰为 0 时取另一端的方向
            let sign = if d0 == 0.0 { d1 } else { d0 };
            let polygon = [
                Point::new(v0.x, v0y),
                Point::new(v1.x, v1y),
                Point::new(b1.x, b1y),
                Point::new(b0.x, b0y),
            ];
            fill_unless_transparent(surface, &polygon, pick(sign));
        }
    }
}

fn fill_unless_transparent(surface: &mut dyn DrawingSurface, polygon: &[Point], color: Color) {
    if !color.is_transparent() {
        surface.fill_path(polygon, color);
    }
}
