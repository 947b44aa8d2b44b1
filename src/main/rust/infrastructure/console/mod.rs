mod console_status_sink;

pub use console_status_sink::{ConsoleStatusSink, ConsoleView};
