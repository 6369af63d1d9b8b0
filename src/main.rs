//! pcbeep: event-driven PC speaker tone player
//!
//! Plays a sequence of tones through the PC speaker while staying
//! responsive to job control: SIGTSTP pauses playback, SIGCONT resumes
//! it, and SIGHUP/SIGINT/SIGTERM stop it with the speaker silenced.

mod args;
mod config;
mod driver;
mod event_loop;
mod events;
mod sequence;
mod signals;
mod state;
mod timer;

use std::process::ExitCode;

use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::event_loop::LoopError;
use crate::signals::SignalChannel;

/// Exit status when an event reaches the terminal state
const EXIT_INTERNAL_LOGIC: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::load();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "pcbeep starting");

    let cli = args::parse();
    debug!(notes = cli.sequence.len(), "command line parsed");

    let mut driver = match driver::open(cli.device.as_deref()) {
        Ok(driver) => driver,
        Err(err) => {
            error!(error = %err, "no beep device");
            return ExitCode::FAILURE;
        }
    };

    let signals = match SignalChannel::subscribe() {
        Ok(channel) => channel,
        Err(err) => {
            error!(error = %err, "signal subscription failed");
            driver.fini();
            return ExitCode::FAILURE;
        }
    };

    let result = event_loop::run(driver.as_mut(), cli.sequence, signals).await;

    // Teardown runs on every exit path, before the status is decided.
    driver.fini();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err @ LoopError::InternalLogic(_)) => {
            error!(error = %err, "internal logic error");
            ExitCode::from(EXIT_INTERNAL_LOGIC)
        }
        Err(err) => {
            error!(error = %err, "playback aborted");
            ExitCode::FAILURE
        }
    }
}
