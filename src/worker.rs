pub mod lifecycle;
pub mod runtime;

pub use lifecycle::{WorkerError, WorkerLifecycle};
pub use runtime::{ClickedNotification, Registration, WorkerHost, WorkerScript, WorkerState};
