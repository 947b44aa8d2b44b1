mod session_coordinator;
mod session_runtime;

pub use session_coordinator::{Completion, ConnectionEvent, SessionCoordinator};
pub use session_runtime::{Command, CoordinatorHandle, SessionRuntime};
