pub mod build;
pub mod capture;
pub mod cli;
pub mod models;
mod utils;

use clap::Parser;
use log::{info, warn};

use build::{BuildParams, TimelapseBuilder};
use capture::{CaptureController, CaptureError, FailureKind};
use cli::{Cli, Mode};
use models::SessionParams;

// Set to true to enable logging in this module
const ENABLE_LOGS: bool = true;

pub fn run() {
    utils::logging::init();

    let cli = Cli::parse();
    info!("shootlapse starting up...");

    let mode = match cli.into_mode() {
        Ok(mode) => mode,
        Err(err) => {
            log_error!("invalid arguments: {err}");
            println!("{err}");
            return;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log_error!("failed to build tokio runtime: {err}");
            println!("An error occurred: {err}");
            return;
        }
    };

    runtime.block_on(async move {
        match mode {
            Mode::Capture(params) => capture_session(params).await,
            Mode::Build(params) => build_session(params).await,
        }
    });
}

async fn capture_session(params: SessionParams) {
    let mut controller = CaptureController::new(params);

    let cancel_token = controller.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping capture...");
                cancel_token.cancel();
            }
            Err(err) => warn!("unable to listen for Ctrl-C: {err}"),
        }
    });
    // Let the listener register before the pipeline starts.
    tokio::task::yield_now().await;

    match controller.run().await {
        Ok(report) => {
            info!(
                "session {} -> {} ended by {:?}: {}/{} images",
                report.started_at.to_rfc3339(),
                report.finished_at.to_rfc3339(),
                report.stop_reason,
                report.images_saved,
                report.expected_images
            );
            println!(
                "\nCapture completed. {} images saved to: {}",
                report.images_saved,
                report.output_dir.display()
            );
        }
        Err(err) => report_failure(&err),
    }
}

async fn build_session(params: BuildParams) {
    println!(
        "Starting to process timelapse creation: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    match TimelapseBuilder::new(params).run().await {
        Ok(report) => println!(
            "Timelapse created successfully: {}. Elapsed time: {:.1?}",
            report.video_path.display(),
            report.elapsed
        ),
        Err(err) => report_failure(&err),
    }
}

fn report_failure(err: &CaptureError) {
    match err.kind() {
        FailureKind::Startup => {
            log_error!("failed to start: {err}");
            println!("{err}");
        }
        FailureKind::Interrupted => println!("\n{err}"),
        FailureKind::Runtime => {
            log_error!("aborted: {err}");
            println!("\n{err}");
        }
    }
}
