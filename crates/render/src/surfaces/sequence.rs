use std::sync::Arc;

use bpview_protocol::{LinearSnapshot, Point, Rect, RenderCommand, Size, TextAlign, ThemeToken};

use crate::consumer::Surface;

/// Individual bases, once the window is narrow enough to give each its own
/// column.
pub struct SequenceTrack {
    sequence: Option<Arc<[u8]>>,
    area: Size,
}

impl SequenceTrack {
    pub fn new(sequence: Option<Arc<[u8]>>, area: Size) -> Self {
        Self { sequence, area }
    }

    fn message(&self, text: String) -> RenderCommand {
        RenderCommand::DrawText {
            position: Point::new(self.area.w / 2.0, 0.0),
            text,
            color: ThemeToken::TextMuted,
            font_size: 1.0,
            align: TextAlign::Center,
        }
    }
}

impl Surface for SequenceTrack {
    type Snapshot = LinearSnapshot;

    fn name(&self) -> &'static str {
        "sequence"
    }

    fn resize(&mut self, area: Size) {
        self.area = area;
    }

    fn render(&mut self, snapshot: &LinearSnapshot) -> Vec<RenderCommand> {
        let width = self.area.w.max(0.0);
        let mut commands = vec![
            RenderCommand::BeginGroup {
                id: "sequence".into(),
                label: Some("Sequence".into()),
            },
            RenderCommand::DrawRect {
                rect: Rect::new(0.0, 0.0, width, self.area.h),
                color: ThemeToken::TrackBackground,
                border_color: None,
                label: None,
                segment: None,
            },
        ];

        match &self.sequence {
            None => commands.push(self.message("no sequence loaded".into())),
            Some(_) if snapshot.len() as f64 > width => {
                commands.push(self.message(format!(
                    "zoom in to see bases ({} bp visible)",
                    snapshot.len()
                )));
            }
            Some(sequence) => {
                let bp_width = width / snapshot.len() as f64;
                let start = usize::try_from(snapshot.start).unwrap_or(0);
                let end = usize::try_from(snapshot.end).unwrap_or(0).min(sequence.len());
                let visible = sequence.get(start..end).unwrap_or_default();
                for (offset, &base) in visible.iter().enumerate() {
                    let x = offset as f64 * bp_width;
                    commands.push(RenderCommand::DrawRect {
                        rect: Rect::new(x, 0.0, bp_width, self.area.h),
                        color: ThemeToken::for_base(base),
                        border_color: None,
                        label: Some(char::from(base.to_ascii_uppercase()).to_string()),
                        segment: None,
                    });
                }
            }
        }

        commands.push(RenderCommand::EndGroup);
        commands
    }
}
