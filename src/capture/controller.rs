use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Local};
use tokio::process::Child;
use tokio_util::sync::CancellationToken;

use crate::models::SessionParams;

use super::error::CaptureError;
use super::pipeline::{self, PipelineCommand};
use super::progress::ProgressPrinter;
use super::scan;
use super::state::{SessionState, SessionStatus, StopReason};

// Set to true to enable logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Outcome of a session that stopped on its own (deadline or target count).
#[derive(Debug, Clone)]
pub struct CaptureReport {
    pub expected_images: u64,
    pub images_saved: usize,
    pub output_dir: PathBuf,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub stop_reason: StopReason,
}

/// Runs one capture session: launches the pipeline, watches the output
/// directory until the session is over, then stops the pipeline.
pub struct CaptureController {
    params: SessionParams,
    pipeline: PipelineCommand,
    cancel_token: CancellationToken,
    state: SessionState,
    printer: ProgressPrinter<Box<dyn Write + Send>>,
}

impl CaptureController {
    pub fn new(params: SessionParams) -> Self {
        let pipeline = PipelineCommand::gstreamer(params.interval_secs(), params.output_dir());
        Self {
            params,
            pipeline,
            cancel_token: CancellationToken::new(),
            state: SessionState::new(),
            printer: ProgressPrinter::new(Box::new(io::stdout())),
        }
    }

    /// Replaces the default GStreamer pipeline.
    pub fn with_pipeline(mut self, pipeline: PipelineCommand) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Redirects banner and progress output (stdout by default).
    pub fn with_output(mut self, out: impl Write + Send + 'static) -> Self {
        self.printer = ProgressPrinter::new(Box::new(out));
        self
    }

    pub fn with_cancel_token(mut self, cancel_token: CancellationToken) -> Self {
        self.cancel_token = cancel_token;
        self
    }

    /// Token that ends the session through the interrupt path when cancelled.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    pub fn pipeline(&self) -> &PipelineCommand {
        &self.pipeline
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub async fn run(&mut self) -> Result<CaptureReport, CaptureError> {
        if self.state.status() != SessionStatus::NotStarted {
            return Err(CaptureError::startup("capture session already started"));
        }

        let expected = self.params.expected_images();
        let output_dir = self.params.output_dir().to_path_buf();

        fs::create_dir_all(&output_dir).map_err(|err| {
            CaptureError::startup(format!(
                "Error creating directory {}: {err}",
                output_dir.display()
            ))
        })?;

        // Banner output failing is not worth aborting over.
        if let Err(err) = self.printer.banner(&self.params) {
            log_warn!("failed to print session banner: {err}");
        }

        let mut child = self
            .pipeline
            .spawn()
            .map_err(|err| CaptureError::startup(format!("{err:#}")))?;

        self.state
            .begin(self.params.duration(), Instant::now(), Local::now());
        if let Err(err) = self.printer.schedule(self.state.scheduled_end()) {
            log_warn!("failed to print session schedule: {err}");
        }
        log_info!(
            "capturing {} images into {} (poll every {:?})",
            expected,
            output_dir.display(),
            self.params.poll_period()
        );

        let period = self.params.poll_period();
        let stop_reason = loop {
            if self.state.deadline_passed(Instant::now()) {
                break StopReason::Deadline;
            }

            let current = match scan::count_images(&output_dir) {
                Ok(current) => current,
                Err(err) => return Err(abandon(&child, err)),
            };

            if let Err(err) = self.printer.update(current, expected) {
                return Err(abandon(&child, err.into()));
            }

            if current as u64 >= expected {
                break StopReason::TargetReached;
            }

            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                _ = self.cancel_token.cancelled() => {
                    log_info!(
                        "capture interrupted with {:?} left",
                        self.state.remaining(Instant::now())
                    );
                    break StopReason::Interrupted;
                }
            }
        };

        self.stop_pipeline(&mut child, stop_reason).await?;

        let images_saved = scan::count_images(&output_dir).map_err(CaptureError::runtime_from)?;

        if stop_reason == StopReason::Interrupted {
            return Err(CaptureError::interrupted(images_saved, output_dir));
        }

        let started_at = self.state.started_at().unwrap_or_else(Local::now);
        Ok(CaptureReport {
            expected_images: expected,
            images_saved,
            output_dir,
            started_at,
            finished_at: Local::now(),
            stop_reason,
        })
    }

    async fn stop_pipeline(
        &mut self,
        child: &mut Child,
        reason: StopReason,
    ) -> Result<(), CaptureError> {
        log_debug!("stopping pipeline: {reason:?}");
        self.state
            .begin_stopping(reason)
            .map_err(CaptureError::runtime_from)?;

        if let Err(err) = pipeline::terminate(child).await {
            log_warn!("failed to wait for pipeline: {err}");
        }

        self.state.finish().map_err(CaptureError::runtime_from)
    }
}

/// Gives up on the session after a failure inside the loop. The pipeline is
/// left running.
fn abandon(child: &Child, err: anyhow::Error) -> CaptureError {
    log_warn!(
        "capture loop failed; pipeline (pid {:?}) is still running",
        child.id()
    );
    CaptureError::runtime_from(err)
}
