use std::sync::Mutex;

use tracing::{info, warn};

use crate::domain::ports::StatusSink;
use crate::domain::value_objects::{ActionLabel, Notice, StatusText};

/// Terminal stand-in for the status label and action button
pub struct ConsoleStatusSink {
    view: Mutex<ConsoleView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsoleView {
    pub status: StatusText,
    pub action: ActionLabel,
}

impl ConsoleStatusSink {
    pub fn new() -> Self {
        Self {
            view: Mutex::new(ConsoleView {
                status: StatusText::Idle,
                action: ActionLabel::Start,
            }),
        }
    }

    pub fn view(&self) -> ConsoleView {
        *self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// One-line rendering for the prompt
    pub fn render(&self) -> String {
        let view = self.view();
        format!("[{}] press Enter to {}", view.status, view.action)
    }

    fn update(&self, apply: impl FnOnce(&mut ConsoleView)) {
        let mut view = self.view.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        apply(&mut view);
    }
}

impl Default for ConsoleStatusSink {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSink for ConsoleStatusSink {
    fn show_status(&self, status: StatusText) {
        self.update(|view| view.status = status);
        info!(target: "ui", status = %status, "Status");
    }

    fn show_action(&self, label: ActionLabel) {
        self.update(|view| view.action = label);
    }

    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            warn!(target: "ui", "{}", notice);
        } else {
            info!(target: "ui", "{}", notice);
        }
    }
}
