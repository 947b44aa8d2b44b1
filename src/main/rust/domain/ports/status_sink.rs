use crate::domain::value_objects::{ActionLabel, Notice, StatusText};

/// Port for the UI surface that displays session status
pub trait StatusSink: Send + Sync {
    fn show_status(&self, status: StatusText);
    fn show_action(&self, label: ActionLabel);
    fn notify(&self, notice: &Notice);
}
