use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let dirty_indicator = if model.is_dirty() { " [modified]" } else { "" };
    let save_label = model.save_status.label();
    let save_info = if save_label.is_empty() {
        String::new()
    } else {
        format!("  {save_label}")
    };
    let cursor_info = model
        .caret_position()
        .map_or_else(String::new, |(row, col)| {
            format!("  Ln {}, Col {}", row + 1, col + 1)
        });
    let search_indicator = if model.search_modal_visible {
        "  [search]"
    } else {
        ""
    };

    let status = format!(
        " {}{dirty_indicator}{save_info}{cursor_info}{search_indicator}  [{}%]  {}",
        model.document_path,
        model.viewport.scroll_percent(),
        model.store_location,
    );

    let style = if model.save_status.is_failed() {
        Style::default().bg(Color::Red).fg(Color::White)
    } else {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
