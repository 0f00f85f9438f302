// src/app.rs

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ratatui::widgets::ScrollbarState;
use tracing::{error, info};

use crate::config::Settings;
use crate::core::knowledge_base::KnowledgeBase;
use crate::core::models::{OutputMessage, ScanOutcome, ScanStatus};
use crate::core::scanner::RouteScanSession;

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

pub const EXPORT_FILE: &str = "findings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Scanning,
    Finished,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub findings: usize,
    pub messages: usize,
    pub errors: usize,
    /// Findings held in the store across all hosts.
    pub stored: usize,
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub state: AppState,
    pub input: String,
    /// Error from parsing the last submitted input, shown under the input box.
    pub input_error: Option<String>,
    pub outcome: Option<ScanOutcome>,
    pub summary: ScanSummary,
    pub scroll_offset: usize,
    pub report_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub spinner_frame: usize,
    pub settings: Settings,
    pub kb: Arc<KnowledgeBase>,
    /// One session per host, kept for the lifetime of the application.
    sessions: HashMap<String, Arc<RouteScanSession>>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            state: AppState::Idle,
            input: String::new(),
            input_error: None,
            outcome: None,
            summary: ScanSummary::default(),
            scroll_offset: 0,
            report_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            spinner_frame: 0,
            settings,
            kb: Arc::new(KnowledgeBase::new()),
            sessions: HashMap::new(),
        }
    }

    /// Returns the session for `host`, creating it on first use.
    pub fn session_for(&mut self, host: &str) -> Arc<RouteScanSession> {
        let settings = &self.settings;
        let kb = &self.kb;
        self.sessions
            .entry(host.to_string())
            .or_insert_with(|| {
                info!(host, "New route scan session.");
                Arc::new(RouteScanSession::new(settings, Arc::clone(kb)))
            })
            .clone()
    }

    pub fn finish_scan(&mut self, outcome: ScanOutcome) {
        self.summary = summarize(&outcome);
        self.summary.stored = self.kb.all().len();
        self.outcome = Some(outcome);
        self.state = AppState::Finished;
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
        self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
        self.report_scroll_state = self.report_scroll_state.position(self.scroll_offset);
    }

    pub fn on_tick(&mut self) {
        if self.state == AppState::Scanning {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    /// Writes every finding gathered so far into `dir`.
    pub fn export_findings(&mut self, dir: &Path) {
        let path = dir.join(EXPORT_FILE);
        let result = std::fs::create_dir_all(dir).and_then(|_| self.kb.export_json(&path));
        self.export_status = match result {
            Ok(count) => ExportStatus::Success(format!("{count} finding(s) saved to {}", path.display())),
            Err(e) => {
                error!(path = %path.display(), error = %e, "Export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    /// Drops every stored finding. Sessions keep their run-once state.
    pub fn clear_findings(&mut self) {
        let count = self.kb.all().len();
        self.kb.cleanup();
        info!(count, "Stored findings cleared.");
        self.summary.stored = 0;
        self.export_status = ExportStatus::Success(format!("{count} stored finding(s) cleared"));
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Back to the input box. Sessions and findings are kept.
    pub fn reset(&mut self) {
        self.state = AppState::Idle;
        self.input = String::new();
        self.input_error = None;
        self.outcome = None;
        self.summary = ScanSummary::default();
        self.scroll_offset = 0;
        self.report_scroll_state = ScrollbarState::default();
        self.export_status = ExportStatus::Idle;
        self.spinner_frame = 0;
    }
}

fn summarize(outcome: &ScanOutcome) -> ScanSummary {
    let errors = outcome
        .messages
        .iter()
        .filter(|m| matches!(m, OutputMessage::Error(_)))
        .count()
        + usize::from(matches!(outcome.status, ScanStatus::Failed(_)));
    ScanSummary {
        findings: outcome.findings.len(),
        messages: outcome.messages.len(),
        errors,
        stored: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Finding, PortPair, Severity, TargetRequest};

    fn outcome(status: ScanStatus, messages: Vec<OutputMessage>, findings: Vec<Finding>) -> ScanOutcome {
        ScanOutcome {
            target: TargetRequest::parse("host.tld", 443).unwrap(),
            ports: PortPair::new(80, 443).ok(),
            plugin: "http_vs_https_dist",
            plugin_description: "",
            analysed_at: None,
            status,
            messages,
            findings,
        }
    }

    #[test]
    fn finish_then_reset() {
        let mut app = App::new(Settings::default());
        app.state = AppState::Scanning;
        app.scroll_down();
        app.finish_scan(outcome(
            ScanStatus::Identical,
            vec![],
            vec![Finding::new("n", "d", Severity::Info, "p", "k", "host.tld")],
        ));
        assert_eq!(app.state, AppState::Finished);
        assert_eq!(app.scroll_offset, 0);
        assert_eq!(app.summary.findings, 1);

        app.reset();
        assert_eq!(app.state, AppState::Idle);
        assert!(app.outcome.is_none());
    }

    #[test]
    fn failed_status_counts_as_error() {
        let summary = summarize(&outcome(
            ScanStatus::Failed("boom".into()),
            vec![OutputMessage::Error("x".into()), OutputMessage::Information("y".into())],
            vec![],
        ));
        assert_eq!(summary.errors, 2);
        assert_eq!(summary.messages, 2);
    }

    #[tokio::test]
    async fn session_is_reused_per_host() {
        let mut app = App::new(Settings::default());
        let first = app.session_for("host.tld");
        let again = app.session_for("host.tld");
        let other = app.session_for("other.tld");
        assert!(Arc::ptr_eq(&first, &again));
        assert!(!Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn spinner_only_moves_while_scanning() {
        let mut app = App::new(Settings::default());
        app.on_tick();
        assert_eq!(app.spinner_frame, 0);
        app.state = AppState::Scanning;
        app.on_tick();
        assert_eq!(app.spinner_frame, 1);
    }

    #[test]
    fn clear_findings_empties_store() {
        let mut app = App::new(Settings::default());
        app.kb.append("p", "k", Finding::new("n", "d", Severity::Info, "p", "k", "host.tld"));
        app.finish_scan(outcome(ScanStatus::Identical, vec![], vec![]));
        assert_eq!(app.summary.stored, 1);

        app.clear_findings();
        assert!(app.kb.all().is_empty());
        assert_eq!(app.summary.stored, 0);
        assert!(matches!(app.export_status, ExportStatus::Success(ref m) if m.starts_with("1 stored")));
    }

    #[test]
    fn export_writes_into_directory() {
        let mut app = App::new(Settings::default());
        let dir = tempfile::tempdir().unwrap();
        app.export_findings(&dir.path().join("nested"));
        assert!(matches!(app.export_status, ExportStatus::Success(ref m) if m.starts_with("0 finding")));
        assert!(dir.path().join("nested").join(EXPORT_FILE).exists());
    }
}
