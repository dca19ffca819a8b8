pub mod controller;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod scan;
pub mod state;

pub use controller::{CaptureController, CaptureReport};
pub use error::{CaptureError, FailureKind};
pub use pipeline::PipelineCommand;
pub use state::{SessionState, SessionStatus, StopReason};
