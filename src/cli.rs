use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::build::{BuildParams, DEFAULT_OUTPUT_DIR};
use crate::capture::CaptureError;
use crate::models::SessionParams;

/// Capture time-lapse images from a V4L2 camera through gstreamer.
#[derive(Parser, Debug)]
#[command(
    name = "shootlapse",
    version,
    about,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub capture: CaptureArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assemble captured images into an mp4 with ffmpeg
    Build(BuildArgs),
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Duration in hours to capture screenshots
    #[arg(short, long, required = true, value_parser = parse_hours)]
    pub duration: Option<f64>,

    /// Interval in seconds between screenshots
    #[arg(short, long, required = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Output directory path for screenshots to be saved
    #[arg(short, long, required = true)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Folder holding the image_%05d.jpg frames
    #[arg(short, long)]
    pub input: PathBuf,

    /// Folder the video is written to
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,
}

/// What the invocation asks for, with paths resolved and values checked.
#[derive(Debug)]
pub enum Mode {
    Capture(SessionParams),
    Build(BuildParams),
}

impl Cli {
    pub fn into_mode(self) -> Result<Mode, CaptureError> {
        match self.command {
            Some(Command::Build(args)) => args.into_params().map(Mode::Build),
            None => self.capture.into_params().map(Mode::Capture),
        }
    }
}

impl CaptureArgs {
    /// Resolves the output path against the working directory and validates
    /// the rest.
    pub fn into_params(self) -> Result<SessionParams, CaptureError> {
        let (Some(duration), Some(interval), Some(output)) =
            (self.duration, self.interval, self.output)
        else {
            return Err(CaptureError::startup(
                "All flags are required: --duration, --interval, --output",
            ));
        };
        SessionParams::new(duration, interval, absolute(&output)?)
    }
}

impl BuildArgs {
    pub fn into_params(self) -> Result<BuildParams, CaptureError> {
        BuildParams::new(absolute(&self.input)?, absolute(&self.output)?)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, CaptureError> {
    std::path::absolute(path).map_err(|err| {
        CaptureError::startup(format!(
            "Error getting absolute path for {}: {err}",
            path.display()
        ))
    })
}

fn parse_hours(raw: &str) -> Result<f64, String> {
    let hours: f64 = raw
        .parse()
        .map_err(|err| format!("`{raw}` is not a number: {err}"))?;
    if !hours.is_finite() || hours <= 0.0 {
        return Err(format!("duration must be a positive number of hours, got `{raw}`"));
    }
    Ok(hours)
}
