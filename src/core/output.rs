// src/core/output.rs

use std::sync::Mutex;
use tracing::{error, info};

use crate::core::models::OutputMessage;

/// Destination for user-facing messages produced by a scan.
pub trait OutputSink: Send + Sync {
    fn information(&self, message: &str);
    fn error(&self, message: &str);
}

/// Collects messages for the front end and mirrors each one into the log.
#[derive(Debug, Default)]
pub struct BufferedOutput {
    messages: Mutex<Vec<OutputMessage>>,
}

impl BufferedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns everything written so far.
    pub fn drain(&self) -> Vec<OutputMessage> {
        match self.messages.lock() {
            Ok(mut messages) => std::mem::take(&mut *messages),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn push(&self, message: OutputMessage) {
        match self.messages.lock() {
            Ok(mut messages) => messages.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }
    }
}

impl OutputSink for BufferedOutput {
    fn information(&self, message: &str) {
        info!(message, "Output information.");
        self.push(OutputMessage::Information(message.to_string()));
    }

    fn error(&self, message: &str) {
        error!(message, "Output error.");
        self.push(OutputMessage::Error(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_messages_in_order() {
        let out = BufferedOutput::new();
        out.information("first");
        out.error("second");
        assert_eq!(
            out.drain(),
            vec![
                OutputMessage::Information("first".into()),
                OutputMessage::Error("second".into()),
            ]
        );
        assert!(out.drain().is_empty());
    }
}
