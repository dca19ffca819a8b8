use std::io::{self, Write};

use chrono::{DateTime, Local};

use crate::models::SessionParams;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Operator-facing terminal output: the start banner and a single progress
/// line rewritten in place with `\r`.
pub struct ProgressPrinter<W: Write> {
    out: W,
}

impl<W: Write> ProgressPrinter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn banner(&mut self, params: &SessionParams) -> io::Result<()> {
        writeln!(
            self.out,
            "Starting capture for {} hours",
            params.duration_hours()
        )?;
        writeln!(
            self.out,
            "Taking screenshots every {} seconds",
            params.interval_secs()
        )?;
        writeln!(
            self.out,
            "Expected number of images: {}",
            params.expected_images()
        )?;
        self.out.flush()
    }

    pub fn schedule(&mut self, scheduled_end: Option<DateTime<Local>>) -> io::Result<()> {
        if let Some(end) = scheduled_end {
            writeln!(self.out, "Capture will end by {}", end.format(TIME_FORMAT))?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn update(&mut self, current: usize, expected: u64) -> io::Result<()> {
        write!(self.out, "{}", progress_line(current, expected))?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn progress_line(current: usize, expected: u64) -> String {
    format!("\rProgress: {current}/{expected} images captured")
}
