use bpview_protocol::{Point, Rect, RenderCommand, TextAlign, ThemeToken};

pub const RULER_HEIGHT: f64 = 2.0;
const LABEL_Y: f64 = 0.0;
const MIN_MAJOR_SPACING: f64 = 16.0;
const FONT_SIZE: f64 = 1.0;

/// Render a base-pair ruler over `[view_start, view_end)` across `width`
/// units: a header bar, labelled major ticks and unlabelled minor ticks.
pub fn render_ruler(width: f64, view_start: f64, view_end: f64) -> Vec<RenderCommand> {
    let span = view_end - view_start;
    if span <= 0.0 || width <= 0.0 {
        return Vec::new();
    }
    let x_scale = width / span;
    let mut commands = Vec::with_capacity(32);

    commands.push(RenderCommand::DrawRect {
        rect: Rect::new(0.0, 0.0, width, RULER_HEIGHT),
        color: ThemeToken::TrackBackground,
        border_color: Some(ThemeToken::TrackBorder),
        label: None,
        segment: None,
    });

    let (major, subdivisions) = nice_interval(span, width);
    let minor = major / f64::from(subdivisions);

    // Minor ticks first so majors draw over them.
    let mut bp = (view_start / minor).floor() * minor;
    while bp <= view_end {
        let x = (bp - view_start) * x_scale;
        if (0.0..=width).contains(&x) && !is_aligned(bp, major) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, RULER_HEIGHT - 0.5),
                to: Point::new(x, RULER_HEIGHT),
                color: ThemeToken::TextMuted,
                width: 0.5,
            });
        }
        bp += minor;
    }

    let mut bp = (view_start / major).floor() * major;
    while bp <= view_end {
        let x = (bp - view_start) * x_scale;
        if (0.0..=width).contains(&x) {
            commands.push(RenderCommand::DrawLine {
                from: Point::new(x, RULER_HEIGHT - 1.0),
                to: Point::new(x, RULER_HEIGHT),
                color: ThemeToken::TrackBorder,
                width: 1.0,
            });
            commands.push(RenderCommand::DrawText {
                position: Point::new(x, LABEL_Y),
                text: format_bp_label(bp),
                color: ThemeToken::TextPrimary,
                font_size: FONT_SIZE,
                align: TextAlign::Left,
            });
        }
        bp += major;
    }

    commands
}

fn is_aligned(bp: f64, interval: f64) -> bool {
    let offset = bp / interval;
    (offset - offset.round()).abs() < 0.001
}

/// Pick a 1-2-5 major interval giving roughly one major tick every
/// `MIN_MAJOR_SPACING` units. Returns `(major_interval_bp, subdivisions)`.
pub(crate) fn nice_interval(span_bp: f64, width: f64) -> (f64, u32) {
    let target_count = (width / MIN_MAJOR_SPACING).max(2.0);
    let raw = (span_bp / target_count).max(1.0);
    let magnitude = 10f64.powf(raw.log10().floor());
    for (step, subdivisions) in [(1.0, 2), (2.0, 2), (5.0, 5), (10.0, 2)] {
        let interval = step * magnitude;
        if interval >= raw {
            return (interval, subdivisions);
        }
    }
    (10.0 * magnitude, 2)
}

/// `"950 bp"`, `"12.5 kbp"`, `"3.20 Mbp"`.
pub(crate) fn format_bp_label(bp: f64) -> String {
    let abs = bp.abs();
    if abs >= 1_000_000_000.0 {
        format!("{:.2} Gbp", bp / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("{:.2} Mbp", bp / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{:.1} kbp", bp / 1_000.0)
    } else {
        format!("{bp:.0} bp")
    }
}
