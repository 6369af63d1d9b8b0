//! Beep device drivers
//!
//! Playback reaches the hardware through the [`BeepDriver`] trait.
//! Two implementations exist: the input-layer event device and the
//! console ioctl fallback. [`open`] probes them in that order.

mod console;
mod evdev;

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

pub use console::ConsoleDriver;
pub use evdev::EvdevDriver;

/// Standard kernel path for the pcspkr platform device
const EVDEV_DEFAULT_PATH: &str = "/dev/input/by-path/platform-pcspkr-event-spkr";

/// Console device paths, probed in order
const CONSOLE_DEFAULT_PATHS: [&str; 2] = ["/dev/tty0", "/dev/vc/0"];

/// A device that can start and stop a tone
///
/// Call failures after a successful open are logged by the driver and
/// swallowed; playback timing must not depend on the hardware
/// answering.
pub trait BeepDriver {
    /// Driver name for logging
    fn name(&self) -> &'static str;

    /// Start sounding a tone at `freq_hz`
    fn begin_tone(&mut self, freq_hz: u16);

    /// Stop the sounding tone, if any
    fn end_tone(&mut self);

    /// Final teardown: stop any sounding tone
    ///
    /// Called exactly once, after the playback loop exits.
    fn fini(&mut self);
}

/// Errors opening a beep device
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The device file could not be opened
    #[error("cannot open {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// The device is open but rejected the capability probe
    #[error("{path} cannot beep: {source}")]
    Probe { path: PathBuf, source: io::Error },

    /// Every candidate path failed
    #[error("no usable beep device found")]
    NoDevice,
}

/// Open a beep device
///
/// With an explicit `device`, both drivers are probed against that
/// path alone and the evdev failure is reported if neither fits.
/// Without one, the evdev default path is tried first, then the
/// console paths.
pub fn open(device: Option<&Path>) -> Result<Box<dyn BeepDriver>, DriverError> {
    match device {
        Some(path) => open_explicit(path),
        None => open_probed(),
    }
}

fn open_explicit(path: &Path) -> Result<Box<dyn BeepDriver>, DriverError> {
    let evdev_err = match EvdevDriver::open(path) {
        Ok(driver) => {
            info!(driver = driver.name(), path = %path.display(), "beep device opened");
            return Ok(Box::new(driver));
        }
        Err(err) => err,
    };
    debug!(path = %path.display(), error = %evdev_err, "evdev probe failed");

    match ConsoleDriver::open(path) {
        Ok(driver) => {
            info!(driver = driver.name(), path = %path.display(), "beep device opened");
            Ok(Box::new(driver))
        }
        Err(err) => {
            debug!(path = %path.display(), error = %err, "console probe failed");
            Err(evdev_err)
        }
    }
}

fn open_probed() -> Result<Box<dyn BeepDriver>, DriverError> {
    match EvdevDriver::open(Path::new(EVDEV_DEFAULT_PATH)) {
        Ok(driver) => {
            info!(driver = driver.name(), path = EVDEV_DEFAULT_PATH, "beep device opened");
            return Ok(Box::new(driver));
        }
        Err(err) => debug!(path = EVDEV_DEFAULT_PATH, error = %err, "evdev probe failed"),
    }

    for path in CONSOLE_DEFAULT_PATHS {
        match ConsoleDriver::open(Path::new(path)) {
            Ok(driver) => {
                info!(driver = driver.name(), path, "beep device opened");
                return Ok(Box::new(driver));
            }
            Err(err) => debug!(path, error = %err, "console probe failed"),
        }
    }

    Err(DriverError::NoDevice)
}

/// Driver calls captured by [`RecordingDriver`]
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DriverCall {
    BeginTone(u16),
    EndTone,
    Fini,
}

/// Test double that records the call sequence instead of beeping
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingDriver {
    pub(crate) calls: Vec<DriverCall>,
}

#[cfg(test)]
impl RecordingDriver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::BeginTone(_)))
            .count()
    }

    pub(crate) fn end_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DriverCall::EndTone))
            .count()
    }
}

#[cfg(test)]
impl BeepDriver for RecordingDriver {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn begin_tone(&mut self, freq_hz: u16) {
        self.calls.push(DriverCall::BeginTone(freq_hz));
    }

    fn end_tone(&mut self) {
        self.calls.push(DriverCall::EndTone);
    }

    fn fini(&mut self) {
        self.calls.push(DriverCall::Fini);
    }
}
