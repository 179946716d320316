use ratatui::prelude::*;
use ratatui::widgets::{Clear, Paragraph};

use crate::app::{FOOTER_ROWS, Model};

use super::{DOCUMENT_LEFT_PADDING, status};

/// Render the complete UI.
pub fn render(model: &Model, frame: &mut Frame) {
    let area = frame.area();
    let doc_area = Rect {
        height: area.height.saturating_sub(FOOTER_ROWS),
        ..area
    };
    let status_area = Rect {
        y: area.y + area.height.saturating_sub(1),
        height: area.height.min(1),
        ..area
    };
    let toast_area = Rect {
        y: status_area.y.saturating_sub(1),
        height: doc_area.height.min(1),
        ..area
    };

    render_document(model, frame, doc_area);
    if model.active_toast().is_some() {
        status::render_toast_bar(model, frame, toast_area);
    }
    status::render_status_bar(model, frame, status_area);
}

fn render_document(model: &Model, frame: &mut Frame, area: Rect) {
    let text_area = Rect {
        x: area.x + DOCUMENT_LEFT_PADDING.min(area.width),
        width: area.width.saturating_sub(DOCUMENT_LEFT_PADDING),
        ..area
    };
    let range = model.viewport.visible_range();
    let lines: Vec<Line> = model
        .layout
        .rows
        .get(range.clone())
        .unwrap_or_default()
        .iter()
        .map(|row| {
            Line::from(
                row.segments
                    .iter()
                    .filter(|segment| !segment.text.is_empty())
                    .map(|segment| Span::styled(segment.text.as_str(), segment.style))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();

    frame.render_widget(Clear, area);
    frame.render_widget(Paragraph::new(lines), text_area);

    let Some((row, col)) = model.caret_position() else {
        return;
    };
    if !range.contains(&row) || text_area.width == 0 {
        return;
    }
    let y = text_area.y + u16::try_from(row - range.start).unwrap_or(u16::MAX);
    let x = text_area.x + u16::try_from(col).unwrap_or(u16::MAX).min(text_area.width - 1);
    frame.set_cursor_position((x, y));
}
