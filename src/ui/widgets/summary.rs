// src/ui/widgets/summary.rs

use crate::app::{App, AppState};
use crate::core::scanner::route_scanner::PLUGIN_NAME;
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Renders the summary pane: the scan settings in use and, once a scan has
/// finished, the counts of what it produced.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let summary_container = Block::default().borders(Borders::ALL).title("Summary");
    frame.render_widget(summary_container, area);

    let [settings_area, _, results_area] = Layout::vertical([
        Constraint::Length(7),
        Constraint::Length(1),
        Constraint::Min(0),
    ])
    .margin(1)
    .areas(area);

    let settings = &app.settings;
    let mode = if settings.concurrent_probes { "concurrent" } else { "sequential" };
    let settings_lines = vec![
        Line::from("ANALYSIS".bold()),
        Line::from(vec![Span::raw("Plugin: "), Span::styled(PLUGIN_NAME, Style::default().fg(Color::Cyan))]),
        Line::from(format!("Standard port: {}", settings.http_port)),
        Line::from(format!("Fallback port: {}", settings.https_port)),
        Line::from(format!("Max TTL: {}", settings.max_ttl)),
        Line::from(format!("Hop timeout: {} ms", settings.probe_timeout_ms)),
        Line::from(format!("Probes: {mode}")),
    ];
    frame.render_widget(
        Paragraph::new(settings_lines).wrap(Wrap { trim: true }),
        settings_area,
    );

    if app.state != AppState::Finished {
        return;
    }

    let results_lines = vec![
        Line::from("RESULTS".bold()),
        Line::from(vec![
            Span::raw("Findings: "),
            Span::styled(app.summary.findings.to_string(), Style::default().fg(Color::Cyan)),
        ]),
        Line::from(vec![
            Span::raw("Messages: "),
            Span::styled(app.summary.messages.to_string(), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            Span::raw("Errors: "),
            Span::styled(app.summary.errors.to_string(), Style::default().fg(Color::Red)),
        ]),
        Line::from(""),
        Line::from(format!("Stored findings: {}", app.summary.stored)),
    ];
    frame.render_widget(Paragraph::new(results_lines), results_area);
}
