// src/ui/widgets/report_view.rs

use crate::app::{App, AppState, SPINNER_CHARS};
use crate::core::knowledge_base;
use crate::core::models::{OutputMessage, ScanOutcome, ScanStatus, Severity};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, Wrap},
};

pub fn render_report_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let main_block = Block::default()
        .borders(Borders::ALL)
        .title("Route Report (Navigate with ↑ ↓)");

    let outcome = match (&app.state, &app.outcome) {
        (AppState::Finished, Some(outcome)) => outcome,
        (AppState::Scanning, _) => {
            let spinner_char = SPINNER_CHARS[app.spinner_frame];
            let content = Paragraph::new(Line::from(vec![
                Span::styled(format!("{spinner_char} "), Style::default().fg(Color::Cyan)),
                Span::raw("Tracing routes... Please wait."),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(content.block(main_block), area);
            return;
        }
        _ => {
            let content = Paragraph::new("Route comparison results will appear here...")
                .alignment(Alignment::Center);
            frame.render_widget(content.block(main_block), area);
            return;
        }
    };

    let lines = report_lines(outcome);
    let line_count = lines.len();
    app.scroll_offset = app.scroll_offset.min(line_count.saturating_sub(1));
    app.report_scroll_state = app
        .report_scroll_state
        .content_length(line_count)
        .position(app.scroll_offset);

    let report = Paragraph::new(lines)
        .block(main_block)
        .wrap(Wrap { trim: false })
        .scroll((app.scroll_offset as u16, 0));
    frame.render_widget(report, area);

    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        area.inner(Margin { vertical: 1, horizontal: 0 }),
        &mut app.report_scroll_state,
    );
}

/// Text of a finished scan: header, status notes, output messages, findings
/// with their catalog explanation, then the plugin description.
fn report_lines(outcome: &ScanOutcome) -> Vec<Line<'_>> {
    let mut lines: Vec<Line> = Vec::new();
    let target = match outcome.ports {
        Some(ports) => format!(
            "{} (ports {} and {})",
            outcome.target.host, ports.standard_port, ports.target_port
        ),
        None => outcome.target.host.clone(),
    };
    lines.push(Line::from(vec![Span::raw("Target: ").bold(), Span::raw(target)]));
    lines.push(Line::from(vec![
        Span::raw("Plugin: ").bold(),
        Span::styled(outcome.plugin, Style::default().fg(Color::Cyan)),
    ]));
    if let Some(at) = outcome.analysed_at {
        lines.push(Line::from(vec![
            Span::raw("Analysed: ").bold(),
            Span::raw(at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]));
    }
    lines.push(Line::from(vec![
        Span::raw("Status: ").bold(),
        Span::styled(outcome.status.to_string(), status_style(&outcome.status)),
    ]));
    lines.push(Line::from(""));

    match &outcome.status {
        ScanStatus::AlreadyRan => {
            lines.push(Line::from("This host was already analysed in this session."));
            lines.push(Line::from(""));
        }
        ScanStatus::Failed(reason) => {
            lines.push(Line::styled(reason.clone(), Style::default().fg(Color::Red)));
            lines.push(Line::from(""));
        }
        // the permission message arrives through the output messages
        ScanStatus::Identical | ScanStatus::Divergent | ScanStatus::PermissionDenied => {}
    }

    for message in &outcome.messages {
        let (text, style) = match message {
            OutputMessage::Information(text) => (text, Style::default()),
            OutputMessage::Error(text) => (text, Style::default().fg(Color::Red)),
        };
        // messages carry their own line breaks and indentation
        lines.extend(text.lines().map(|l| Line::styled(l.to_string(), style)));
        lines.push(Line::from(""));
    }

    for finding in &outcome.findings {
        let detail = knowledge_base::get_finding_detail(&finding.kind);
        let (title, severity) = match detail {
            Some(detail) => (detail.title.to_string(), detail.severity),
            None => (finding.name.clone(), finding.severity),
        };
        lines.push(Line::from(vec![
            Span::styled("[ROUTE] ", Style::default().fg(Color::DarkGray)),
            Span::styled(title, severity_style(severity)),
            Span::styled(format!(" ({severity})"), Style::default().fg(Color::DarkGray)),
        ]));
        lines.push(Line::from(finding.description.clone()));
        if let Some(detail) = detail {
            lines.push(Line::from(""));
            lines.push(Line::from("WHAT IT IS:".yellow().bold()));
            lines.push(Line::from(detail.description));
            lines.push(Line::from(""));
            lines.push(Line::from("NEXT STEPS:".yellow().bold()));
            lines.push(Line::from(detail.next_steps));
        }
        lines.push(Line::from(""));
    }

    lines.push(Line::from("ABOUT THIS ANALYSIS".yellow().bold()));
    lines.extend(outcome.plugin_description.lines().map(Line::from));

    lines
}

fn status_style(status: &ScanStatus) -> Style {
    match status {
        ScanStatus::Identical => Style::default().fg(Color::Green),
        ScanStatus::Divergent => Style::default().fg(Color::Yellow),
        ScanStatus::AlreadyRan => Style::default().fg(Color::Cyan),
        ScanStatus::PermissionDenied | ScanStatus::Failed(_) => Style::default().fg(Color::Red),
    }
}

fn severity_style(severity: Severity) -> Style {
    match severity {
        Severity::Info => Style::default().fg(Color::Cyan),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Finding, PortPair, TargetRequest};
    use crate::core::scanner::route_scanner::PERM_ERROR_MSG;

    fn outcome(status: ScanStatus, messages: Vec<OutputMessage>, findings: Vec<Finding>) -> ScanOutcome {
        ScanOutcome {
            target: TargetRequest::parse("host.tld", 443).unwrap(),
            ports: PortPair::new(80, 443).ok(),
            plugin: "http_vs_https_dist",
            plugin_description: "First line.\nSecond line.",
            analysed_at: None,
            status,
            messages,
            findings,
        }
    }

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn permission_message_is_shown_once() {
        let o = outcome(
            ScanStatus::PermissionDenied,
            vec![OutputMessage::Error(PERM_ERROR_MSG.to_string())],
            vec![],
        );
        let lines = report_lines(&o);
        let shown = plain(&lines).iter().filter(|l| l.as_str() == PERM_ERROR_MSG).count();
        assert_eq!(shown, 1);
    }

    #[test]
    fn finding_uses_catalog_title() {
        let finding = Finding::new(
            "HTTP traceroute",
            "The routes are the same.",
            Severity::Info,
            "http_vs_https_dist",
            "http_vs_https_dist",
            "host.tld",
        );
        let text = plain(&report_lines(&outcome(ScanStatus::Identical, vec![], vec![finding])));
        assert!(text.contains(&"Target: host.tld (ports 80 and 443)".to_string()));
        assert!(text.contains(&"[ROUTE] HTTP traceroute (Info)".to_string()));
        assert!(text.contains(&"NEXT STEPS:".to_string()));
        assert_eq!(text.last().map(String::as_str), Some("Second line."));
    }

    #[test]
    fn divergence_keeps_its_line_layout() {
        let message = "Routes differ:\n  TCP trace to host.tld:80\n    0 10.0.0.1";
        let text = plain(&report_lines(&outcome(
            ScanStatus::Divergent,
            vec![OutputMessage::Information(message.to_string())],
            vec![],
        )));
        assert!(text.contains(&"  TCP trace to host.tld:80".to_string()));
        assert!(text.contains(&"    0 10.0.0.1".to_string()));
    }
}
