// src/ui/widgets/footer.rs

use crate::app::{App, AppState, ExportStatus};
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

/// Renders the footer with the keys available in the current state.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let key = |k: &'static str| Span::styled(k, Style::new().bold().fg(Color::Yellow));

    let line = if app.show_disclaimer {
        Line::from(vec![Span::raw("Press "), key("Enter"), Span::raw(" to continue.")])
    } else {
        match app.state {
            AppState::Idle => Line::from(vec![
                Span::raw("Press "),
                key("Enter"),
                Span::raw(" to scan, "),
                key("Esc"),
                Span::raw(" to quit."),
            ]),
            AppState::Finished => {
                let mut spans = vec![
                    key("[N]"),
                    Span::raw("ew Scan, "),
                    key("[E]"),
                    Span::raw("xport, "),
                    key("[C]"),
                    Span::raw("lear findings, "),
                    key("[Q]"),
                    Span::raw("uit"),
                ];
                match &app.export_status {
                    ExportStatus::Idle => {}
                    ExportStatus::Success(msg) => {
                        spans.push(Span::styled(format!("  {msg}"), Style::new().fg(Color::Green)))
                    }
                    ExportStatus::Error(msg) => spans.push(Span::styled(
                        format!("  Export failed: {msg}"),
                        Style::new().fg(Color::Red),
                    )),
                }
                Line::from(spans)
            }
            AppState::Scanning => Line::from("Tracing routes... Press Q to quit."),
        }
    };

    frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}
