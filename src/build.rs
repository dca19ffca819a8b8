//! Assembles captured frames into an H.264 video with ffmpeg.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::capture::pipeline::{PipelineCommand, IMAGE_PATTERN};
use crate::capture::CaptureError;

// Set to true to enable logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

pub const FFMPEG: &str = "ffmpeg";
pub const DEFAULT_OUTPUT_DIR: &str = "../timelapse_photos";

const FRAMERATE: u32 = 30;
/// Day-month-year-hour:minute, e.g. `timelapse_15-10-2026-18:30.mp4`.
const VIDEO_STAMP_FORMAT: &str = "%d-%m-%Y-%H:%M";

pub fn video_name(at: DateTime<Local>) -> String {
    format!("timelapse_{}.mp4", at.format(VIDEO_STAMP_FORMAT))
}

/// `ffmpeg -framerate 30 -i <input>/image_%05d.jpg -c:v libx264 -pix_fmt yuv420p -preset ultrafast <video>`
pub fn ffmpeg_command(input_dir: &Path, video: &Path) -> PipelineCommand {
    PipelineCommand::new(FFMPEG)
        .arg("-framerate")
        .arg(FRAMERATE.to_string())
        .arg("-i")
        .arg(input_dir.join(IMAGE_PATTERN))
        .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-preset", "ultrafast"])
        .arg(video)
}

/// Where frames are read from and where the video goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildParams {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl BuildParams {
    /// The input directory has to exist; the output directory is created on
    /// demand.
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, CaptureError> {
        let input_dir = input_dir.into();
        if !input_dir.is_dir() {
            return Err(CaptureError::startup(format!(
                "input directory not found: {}",
                input_dir.display()
            )));
        }
        Ok(Self {
            input_dir,
            output_dir: output_dir.into(),
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub video_path: PathBuf,
    pub elapsed: Duration,
}

/// Runs ffmpeg over a directory of numbered frames and waits for it.
pub struct TimelapseBuilder {
    params: BuildParams,
    program: OsString,
}

impl TimelapseBuilder {
    pub fn new(params: BuildParams) -> Self {
        Self {
            params,
            program: FFMPEG.into(),
        }
    }

    /// Swaps the encoder binary; the argument list stays the same.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    pub fn params(&self) -> &BuildParams {
        &self.params
    }

    /// Encoder invocation and target path for a build started at `at`.
    pub fn command_at(&self, at: DateTime<Local>) -> (PipelineCommand, PathBuf) {
        let video = self.params.output_dir.join(video_name(at));
        let default = ffmpeg_command(&self.params.input_dir, &video);
        let command = PipelineCommand::new(self.program.clone()).args(default.get_args().iter().cloned());
        (command, video)
    }

    pub async fn run(&self) -> Result<BuildReport, CaptureError> {
        fs::create_dir_all(&self.params.output_dir).map_err(|err| {
            CaptureError::startup(format!(
                "Error creating output directory {}: {err}",
                self.params.output_dir.display()
            ))
        })?;

        let (command, video_path) = self.command_at(Local::now());
        let started = Instant::now();
        let mut child = command
            .spawn()
            .map_err(|err| CaptureError::startup(format!("{err:#}")))?;

        let status = child.wait().await.map_err(|err| {
            CaptureError::runtime(format!("failed to wait for {}: {err}", FFMPEG))
        })?;
        let elapsed = started.elapsed();

        if !status.success() {
            log_warn!("encoder exited with {status} after {elapsed:?}");
            return Err(CaptureError::runtime(format!(
                "{} exited with {status}",
                self.program.to_string_lossy()
            )));
        }

        log_info!("wrote {} in {elapsed:?}", video_path.display());
        Ok(BuildReport {
            video_path,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::FailureKind;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn args_of(command: &PipelineCommand) -> Vec<String> {
        command
            .get_args()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn video_name_uses_day_month_year_stamp() {
        let at = Local.with_ymd_and_hms(2026, 10, 5, 8, 7, 0).unwrap();
        assert_eq!(video_name(at), "timelapse_05-10-2026-08:07.mp4");
    }

    #[test]
    fn ffmpeg_argument_list() {
        let command = ffmpeg_command(
            Path::new("/tmp/frames"),
            Path::new("/tmp/videos/timelapse_05-10-2026-08:07.mp4"),
        );
        assert_eq!(command.program(), FFMPEG);
        assert_eq!(
            args_of(&command),
            vec![
                "-framerate",
                "30",
                "-i",
                "/tmp/frames/image_%05d.jpg",
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-preset",
                "ultrafast",
                "/tmp/videos/timelapse_05-10-2026-08:07.mp4",
            ]
        );
    }

    #[test]
    fn command_targets_output_dir() {
        let frames = tempdir().unwrap();
        let params = BuildParams::new(frames.path(), "/tmp/videos").unwrap();
        let builder = TimelapseBuilder::new(params);
        let at = Local.with_ymd_and_hms(2026, 10, 15, 18, 30, 0).unwrap();

        let (command, video) = builder.command_at(at);
        assert_eq!(
            video,
            PathBuf::from("/tmp/videos/timelapse_15-10-2026-18:30.mp4")
        );
        assert_eq!(command, ffmpeg_command(frames.path(), &video));
    }

    #[test]
    fn missing_input_dir_is_rejected() {
        let dir = tempdir().unwrap();
        let err = BuildParams::new(dir.path().join("nothing"), dir.path()).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Startup);
        assert!(err.to_string().starts_with("input directory not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_creates_output_dir_and_names_video() {
        let frames = tempdir().unwrap();
        let out = tempdir().unwrap();
        let videos = out.path().join("videos");
        let params = BuildParams::new(frames.path(), &videos).unwrap();

        let report = TimelapseBuilder::new(params)
            .with_program("true")
            .run()
            .await
            .unwrap();

        assert!(videos.is_dir());
        assert_eq!(report.video_path.parent(), Some(videos.as_path()));
        let name = report.video_path.file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("timelapse_") && name.ends_with(".mp4"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn encoder_failure_is_a_runtime_failure() {
        let frames = tempdir().unwrap();
        let params = BuildParams::new(frames.path(), frames.path()).unwrap();

        let err = TimelapseBuilder::new(params)
            .with_program("false")
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Runtime);
    }

    #[tokio::test]
    async fn missing_encoder_is_a_startup_failure() {
        let frames = tempdir().unwrap();
        let params = BuildParams::new(frames.path(), frames.path()).unwrap();

        let err = TimelapseBuilder::new(params)
            .with_program("shootlapse-no-such-encoder")
            .run()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::Startup);
    }
}
