//! Console ioctl beep driver
//!
//! Classic fallback: the KIOCSOUND ioctl programs the PIT with a clock
//! divisor. Works on virtual console devices only.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

use tracing::{debug, warn};

use super::{BeepDriver, DriverError};

/// Start or stop the console tone; the argument is the PIT divisor
const KIOCSOUND: libc::c_ulong = 0x4b2f;

/// PIT oscillator frequency in Hz
const CLOCK_TICK_RATE: u32 = 1_193_180;

/// Beep driver backed by a virtual console device
pub struct ConsoleDriver {
    file: File,
}

impl ConsoleDriver {
    /// Open `path` and verify it accepts KIOCSOUND
    ///
    /// The probe uses divisor 0, which stops any tone rather than
    /// starting one.
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| DriverError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let rc = unsafe { libc::ioctl(file.as_raw_fd(), KIOCSOUND, 0 as libc::c_ulong) };
        if rc < 0 {
            return Err(DriverError::Probe {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }

        debug!(path = %path.display(), "console device accepts KIOCSOUND");
        Ok(Self { file })
    }

    fn set_divisor(&mut self, divisor: libc::c_ulong) {
        let rc = unsafe { libc::ioctl(self.file.as_raw_fd(), KIOCSOUND, divisor) };
        if rc < 0 {
            warn!(divisor, error = %io::Error::last_os_error(), "KIOCSOUND failed");
        }
    }
}

/// PIT divisor for a tone frequency; 0 means silence
fn divisor_for(freq_hz: u16) -> libc::c_ulong {
    if freq_hz == 0 {
        0
    } else {
        libc::c_ulong::from(CLOCK_TICK_RATE / u32::from(freq_hz))
    }
}

impl BeepDriver for ConsoleDriver {
    fn name(&self) -> &'static str {
        "console"
    }

    fn begin_tone(&mut self, freq_hz: u16) {
        self.set_divisor(divisor_for(freq_hz));
    }

    fn end_tone(&mut self) {
        self.set_divisor(0);
    }

    fn fini(&mut self) {
        self.set_divisor(0);
    }
}
