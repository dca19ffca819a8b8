use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::{DateTime, Local, TimeDelta};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    NotStarted,
    Running,
    Stopping,
    Done,
}

/// What ended the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The session's time budget ran out.
    Deadline,
    /// The expected number of images is on disk.
    TargetReached,
    /// The operator asked to stop.
    Interrupted,
}

/// Lifecycle of one capture session. Transitions are strictly
/// `NotStarted -> Running -> Stopping -> Done`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    status: SessionStatus,
    started_at: Option<DateTime<Local>>,
    scheduled_end: Option<DateTime<Local>>,
    /// `None` while not running, or when the duration does not fit the
    /// monotonic clock (the session then only ends on count or interrupt).
    deadline: Option<Instant>,
    stop_reason: Option<StopReason>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Local>> {
        self.started_at
    }

    /// Wall-clock time the session is due to end, for display.
    pub fn scheduled_end(&self) -> Option<DateTime<Local>> {
        self.scheduled_end
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Marks the session as running. Callers check for `NotStarted` first.
    pub fn begin(&mut self, duration: Duration, now: Instant, started_at: DateTime<Local>) {
        let scheduled_end = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| started_at.checked_add_signed(delta));

        *self = Self {
            status: SessionStatus::Running,
            started_at: Some(started_at),
            scheduled_end,
            deadline: now.checked_add(duration),
            stop_reason: None,
        };
    }

    pub fn deadline_passed(&self, now: Instant) -> bool {
        match (self.status, self.deadline) {
            (SessionStatus::Running, Some(deadline)) => now >= deadline,
            _ => false,
        }
    }

    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match (self.status, self.deadline) {
            (SessionStatus::Running, Some(deadline)) => {
                Some(deadline.saturating_duration_since(now))
            }
            _ => None,
        }
    }

    pub fn begin_stopping(&mut self, reason: StopReason) -> Result<()> {
        if self.status != SessionStatus::Running {
            bail!("cannot stop a session that is {:?}", self.status);
        }
        self.status = SessionStatus::Stopping;
        self.stop_reason = Some(reason);
        Ok(())
    }

    pub fn finish(&mut self) -> Result<()> {
        if self.status != SessionStatus::Stopping {
            bail!("cannot finish a session that is {:?}", self.status);
        }
        self.status = SessionStatus::Done;
        self.deadline = None;
        Ok(())
    }
}
