use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io::{Stdout, stdout};

use anyhow::Result;
use bpview_protocol::{RenderCommand, TextAlign, ThemeToken};
use bpview_render::RenderSink;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    buffer::Buffer,
    layout::Rect,
    style::Color,
};

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::SegmentA => Color::Rgb(70, 130, 180),
        ThemeToken::SegmentB => Color::Rgb(60, 160, 110),
        ThemeToken::SegmentC => Color::Rgb(190, 140, 60),
        ThemeToken::SegmentD => Color::Rgb(150, 90, 170),
        ThemeToken::TrackBackground => Color::Black,
        ThemeToken::TrackBorder => Color::DarkGray,
        ThemeToken::TrackHeaderText => Color::White,
        ThemeToken::TextPrimary => Color::White,
        ThemeToken::TextMuted => Color::DarkGray,
        ThemeToken::BaseA => Color::Green,
        ThemeToken::BaseC => Color::Blue,
        ThemeToken::BaseG => Color::Yellow,
        ThemeToken::BaseT => Color::Red,
        ThemeToken::BaseOther => Color::Gray,
        ThemeToken::OverviewBackground => Color::Rgb(20, 20, 20),
        ThemeToken::OverviewViewport => Color::Rgb(60, 60, 60),
        ThemeToken::OverviewHandle => Color::LightBlue,
        ThemeToken::CanvasBackground => Color::Black,
        ThemeToken::CanvasNode => Color::LightYellow,
        ThemeToken::CanvasEdge => Color::DarkGray,
    }
}

/// Keeps the newest command list of each surface for the next paint.
#[derive(Default)]
pub struct FrameStore {
    latest: RefCell<HashMap<&'static str, Vec<RenderCommand>>>,
    dirty: Cell<bool>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything was presented since the last call.
    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn with<R>(&self, surface: &str, f: impl FnOnce(&[RenderCommand]) -> R) -> Option<R> {
        self.latest.borrow().get(surface).map(|commands| f(commands))
    }
}

impl RenderSink for FrameStore {
    fn present(&self, surface: &'static str, commands: Vec<RenderCommand>) {
        self.latest.borrow_mut().insert(surface, commands);
        self.dirty.set(true);
    }
}

/// Paint a command list into `area`, one surface unit per cell.
pub fn paint(buf: &mut Buffer, area: Rect, commands: &[RenderCommand]) {
    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect {
                rect, color, label, ..
            } => {
                let bg = theme_to_color(*color);
                let (x0, y0) = (rect.x.floor(), rect.y.floor());
                let (x1, y1) = ((rect.x + rect.w).ceil(), (rect.y + rect.h).ceil());
                for y in y0 as i64..y1 as i64 {
                    for x in x0 as i64..x1 as i64 {
                        if let Some(cell) = cell_at(buf, area, x, y) {
                            cell.set_char(' ').set_bg(bg);
                        }
                    }
                }
                if let Some(label) = label {
                    let width = (x1 - x0) as usize;
                    if label.chars().count() <= width {
                        let row = (y0 + (y1 - y0 - 1.0).max(0.0) / 2.0).floor() as i64;
                        let col = x0 as i64 + ((width - label.chars().count()) / 2) as i64;
                        put_str(buf, area, col, row, label, Color::White, Some(bg));
                    }
                }
            }
            RenderCommand::DrawText {
                position,
                text,
                color,
                align,
                ..
            } => {
                let len = text.chars().count() as f64;
                let x = match align {
                    TextAlign::Left => position.x,
                    TextAlign::Center => position.x - len / 2.0,
                    TextAlign::Right => position.x - len,
                };
                put_str(
                    buf,
                    area,
                    x.floor() as i64,
                    position.y.floor() as i64,
                    text,
                    theme_to_color(*color),
                    None,
                );
            }
            RenderCommand::DrawLine {
                from, to, color, ..
            } => {
                let fg = theme_to_color(*color);
                let (dx, dy) = (to.x - from.x, to.y - from.y);
                let glyph = if dx.abs() < 0.5 {
                    '│'
                } else if dy.abs() < 0.5 {
                    '─'
                } else {
                    '·'
                };
                let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as i64;
                for i in 0..=steps {
                    let t = i as f64 / steps as f64;
                    let x = (from.x + dx * t).floor() as i64;
                    let y = (from.y + dy * t).floor() as i64;
                    if let Some(cell) = cell_at(buf, area, x, y) {
                        cell.set_char(glyph).set_fg(fg);
                    }
                }
            }
            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
        }
    }
}

fn cell_at(buf: &mut Buffer, area: Rect, x: i64, y: i64) -> Option<&mut ratatui::buffer::Cell> {
    if x < 0 || y < 0 || x >= i64::from(area.width) || y >= i64::from(area.height) {
        return None;
    }
    let x = area.x.checked_add(u16::try_from(x).ok()?)?;
    let y = area.y.checked_add(u16::try_from(y).ok()?)?;
    buf.cell_mut((x, y))
}

fn put_str(buf: &mut Buffer, area: Rect, x: i64, y: i64, text: &str, fg: Color, bg: Option<Color>) {
    for (i, ch) in text.chars().enumerate() {
        if let Some(cell) = cell_at(buf, area, x + i as i64, y) {
            cell.set_char(ch).set_fg(fg);
            if let Some(bg) = bg {
                cell.set_bg(bg);
            }
        }
    }
}

pub fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

pub fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use bpview_protocol::{Point, Rect as UnitRect};

    use super::*;

    #[test]
    fn rect_fills_cells_and_centers_label() {
        let area = Rect::new(2, 1, 10, 3);
        let mut buf = Buffer::empty(Rect::new(0, 0, 12, 4));
        paint(
            &mut buf,
            area,
            &[RenderCommand::DrawRect {
                rect: UnitRect::new(0.0, 0.0, 6.0, 3.0),
                color: ThemeToken::SegmentB,
                border_color: None,
                label: Some("s1".into()),
                segment: Some(1),
            }],
        );
        assert_eq!(buf[(2, 1)].bg, theme_to_color(ThemeToken::SegmentB));
        assert_eq!(buf[(7, 3)].bg, theme_to_color(ThemeToken::SegmentB));
        assert_eq!(buf[(8, 1)].bg, Color::Reset);
        assert_eq!(buf[(4, 2)].symbol(), "s");
        assert_eq!(buf[(5, 2)].symbol(), "1");
    }

    #[test]
    fn out_of_area_commands_are_clipped() {
        let area = Rect::new(0, 0, 4, 2);
        let mut buf = Buffer::empty(area);
        paint(
            &mut buf,
            area,
            &[
                RenderCommand::DrawText {
                    position: Point::new(2.0, 0.0),
                    text: "hello".into(),
                    color: ThemeToken::TextPrimary,
                    font_size: 1.0,
                    align: TextAlign::Left,
                },
                RenderCommand::DrawLine {
                    from: Point::new(-5.0, 1.0),
                    to: Point::new(10.0, 1.0),
                    color: ThemeToken::TrackBorder,
                    width: 1.0,
                },
            ],
        );
        assert_eq!(buf[(2, 0)].symbol(), "h");
        assert_eq!(buf[(3, 0)].symbol(), "e");
        assert_eq!(buf[(0, 1)].symbol(), "─");
        assert_eq!(buf[(3, 1)].symbol(), "─");
    }

    #[test]
    fn store_keeps_latest_per_surface() {
        let store = FrameStore::new();
        assert!(!store.take_dirty());
        store.present("path", vec![RenderCommand::EndGroup]);
        store.present("path", Vec::new());
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
        assert_eq!(store.with("path", <[RenderCommand]>::len), Some(0));
        assert_eq!(store.with("overview", <[RenderCommand]>::len), None);
    }

    #[test]
    fn nucleotides_get_distinct_colors() {
        let colors: Vec<Color> = [b'A', b'C', b'G', b'T']
            .into_iter()
            .map(|b| theme_to_color(ThemeToken::for_base(b)))
            .collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
