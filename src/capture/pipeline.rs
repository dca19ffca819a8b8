//! The external capture pipeline: how it is described, launched and stopped.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::Path;
use std::process::ExitStatus;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

// Set to true to enable logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub const GST_LAUNCH: &str = "gst-launch-1.0";

/// multifilesink location template, five-digit zero-padded frame index.
pub const IMAGE_PATTERN: &str = "image_%05d.jpg";

/// Program plus argument vector for the capture pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl PipelineCommand {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// `v4l2src ! videorate ! video/x-raw,framerate=1/N ! jpegenc ! multifilesink`
    /// writing numbered JPEGs into `output_dir`.
    pub fn gstreamer(interval_secs: u64, output_dir: &Path) -> Self {
        let mut location = OsString::from("location=");
        location.push(output_dir.join(IMAGE_PATTERN));

        Self::new(GST_LAUNCH)
            .args(["v4l2src", "!", "videorate", "!"])
            .arg(format!("video/x-raw,framerate=1/{interval_secs}"))
            .args(["!", "jpegenc", "!", "multifilesink"])
            .arg(location)
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// Starts the pipeline with inherited stdio. Does not wait for it.
    pub fn spawn(&self) -> Result<Child> {
        log_debug!("launching pipeline: {self}");
        let child = Command::new(&self.program)
            .args(&self.args)
            .spawn()
            .with_context(|| format!("Error starting command {}", self.program.to_string_lossy()))?;
        log_info!("pipeline started (pid {:?})", child.id());
        Ok(child)
    }
}

impl fmt::Display for PipelineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Asks the pipeline to stop and waits for it to exit, with no timeout.
///
/// A child that has already exited is just reaped; calling this twice is fine.
pub async fn terminate(child: &mut Child) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        log_debug!("pipeline already exited with {status}");
        return Ok(status);
    }

    if let Err(err) = request_stop(child) {
        log_warn!("failed to signal pipeline (pid {:?}): {err}", child.id());
    }

    let status = child.wait().await?;
    log_info!("pipeline exited with {status}");
    Ok(status)
}

#[cfg(unix)]
fn request_stop(child: &mut Child) -> io::Result<()> {
    let Some(pid) = child.id() else {
        return Ok(());
    };
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
    let rc = unsafe { libc::kill(pid, libc::SIGTERM) };
    if rc == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.raw_os_error() == Some(libc::ESRCH) {
        Ok(())
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn request_stop(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::scan::{IMAGE_PREFIX, IMAGE_SUFFIX};

    fn args_of(command: &PipelineCommand) -> Vec<String> {
        command
            .get_args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn gstreamer_pipeline_arguments() {
        let command = PipelineCommand::gstreamer(10, Path::new("/tmp/lapse"));
        assert_eq!(command.program(), GST_LAUNCH);
        assert_eq!(
            args_of(&command),
            vec![
                "v4l2src",
                "!",
                "videorate",
                "!",
                "video/x-raw,framerate=1/10",
                "!",
                "jpegenc",
                "!",
                "multifilesink",
                "location=/tmp/lapse/image_%05d.jpg",
            ]
        );
    }

    #[test]
    fn framerate_follows_interval() {
        let command = PipelineCommand::gstreamer(45, Path::new("out"));
        assert!(args_of(&command).contains(&"video/x-raw,framerate=1/45".to_string()));
    }

    #[test]
    fn pattern_produces_counted_names() {
        assert!(IMAGE_PATTERN.starts_with(IMAGE_PREFIX));
        assert!(IMAGE_PATTERN.ends_with(IMAGE_SUFFIX));
    }

    #[test]
    fn display_joins_program_and_args() {
        let command = PipelineCommand::new("sh").args(["-c", "exit 0"]);
        assert_eq!(command.to_string(), "sh -c exit 0");
    }

    #[tokio::test]
    async fn spawn_reports_missing_program() {
        let err = PipelineCommand::new("shootlapse-no-such-program")
            .spawn()
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("Error starting command shootlapse-no-such-program"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_sends_sigterm_and_reaps() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = PipelineCommand::new("sleep").arg("30").spawn().unwrap();
        let status = terminate(&mut child).await.unwrap();
        assert_eq!(status.signal(), Some(libc::SIGTERM));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn terminate_is_idempotent() {
        let mut child = PipelineCommand::new("true").spawn().unwrap();
        let first = child.wait().await.unwrap();
        assert!(first.success());

        let second = terminate(&mut child).await.unwrap();
        assert!(second.success());
        let third = terminate(&mut child).await.unwrap();
        assert!(third.success());
    }
}
