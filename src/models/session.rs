use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::CaptureError;

const SECS_PER_HOUR: f64 = 3600.0;
const MAX_POLL_PERIOD: Duration = Duration::from_secs(1);

/// Inputs of one capture session. Validated on construction and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParams {
    duration_hours: f64,
    interval_secs: u64,
    output_dir: PathBuf,
}

impl SessionParams {
    pub fn new(
        duration_hours: f64,
        interval_secs: u64,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, CaptureError> {
        if !duration_hours.is_finite() || duration_hours <= 0.0 {
            return Err(CaptureError::startup(format!(
                "duration must be a positive number of hours, got {duration_hours}"
            )));
        }
        if interval_secs == 0 {
            return Err(CaptureError::startup(
                "interval must be at least one second",
            ));
        }
        Duration::try_from_secs_f64(duration_hours * SECS_PER_HOUR).map_err(|err| {
            CaptureError::startup(format!(
                "duration of {duration_hours} hours is out of range: {err}"
            ))
        })?;

        Ok(Self {
            duration_hours,
            interval_secs,
            output_dir: output_dir.into(),
        })
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_hours
    }

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_hours * SECS_PER_HOUR
    }

    pub fn duration(&self) -> Duration {
        // Range checked in `new`.
        Duration::from_secs_f64(self.duration_secs())
    }

    /// Number of whole intervals that fit in the duration. A trailing partial
    /// interval does not count.
    pub fn expected_images(&self) -> u64 {
        (self.duration_secs() / self.interval_secs as f64).floor() as u64
    }

    /// How often the output directory is re-scanned: once a second, or once
    /// per interval if that is shorter.
    pub fn poll_period(&self) -> Duration {
        MAX_POLL_PERIOD.min(Duration::from_secs(self.interval_secs))
    }
}
