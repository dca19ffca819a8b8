//! Failure taxonomy for a capture session.
//!
//! Every way a session can end other than a normal stop maps to exactly one
//! variant, so callers can branch on the cause instead of parsing text.

use std::path::PathBuf;

use thiserror::Error;

/// Why a capture session did not complete normally.
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The session never got going: bad parameters, the output directory could
    /// not be created, or the pipeline could not be launched.
    #[error("{message}")]
    Startup { message: String },

    /// The operator stopped the session. The pipeline has been terminated and
    /// reaped, and `images_saved` is a fresh count taken afterwards.
    #[error(
        "Capture interrupted by user. {images_saved} images saved to: {}",
        output_dir.display()
    )]
    Interrupted {
        images_saved: usize,
        output_dir: PathBuf,
    },

    /// Something failed while the pipeline was running. The pipeline is not
    /// stopped on this path.
    #[error("An error occurred: {message}")]
    Runtime { message: String },
}

/// Discriminant of [`CaptureError`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Startup,
    Interrupted,
    Runtime,
}

impl CaptureError {
    pub fn startup(message: impl Into<String>) -> Self {
        Self::Startup {
            message: message.into(),
        }
    }

    pub fn interrupted(images_saved: usize, output_dir: impl Into<PathBuf>) -> Self {
        Self::Interrupted {
            images_saved,
            output_dir: output_dir.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Wraps an internal error chain as a runtime failure.
    pub fn runtime_from(err: anyhow::Error) -> Self {
        Self::runtime(format!("{err:#}"))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Startup { .. } => FailureKind::Startup,
            Self::Interrupted { .. } => FailureKind::Interrupted,
            Self::Runtime { .. } => FailureKind::Runtime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(CaptureError::startup("x").kind(), FailureKind::Startup);
        assert_eq!(
            CaptureError::interrupted(3, "/tmp/lapse").kind(),
            FailureKind::Interrupted
        );
        assert_eq!(CaptureError::runtime("x").kind(), FailureKind::Runtime);
    }

    #[test]
    fn interrupted_message_reports_count_and_path() {
        let err = CaptureError::interrupted(12, "/tmp/lapse");
        assert_eq!(
            err.to_string(),
            "Capture interrupted by user. 12 images saved to: /tmp/lapse"
        );
    }

    #[test]
    fn runtime_from_keeps_context_chain() {
        let err: anyhow::Result<()> = Err(anyhow::anyhow!("disk vanished"));
        let err = err.context("failed to read directory /tmp/lapse").unwrap_err();
        let err = CaptureError::runtime_from(err);
        assert_eq!(
            err.to_string(),
            "An error occurred: failed to read directory /tmp/lapse: disk vanished"
        );
    }
}
