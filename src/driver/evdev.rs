//! Input-layer beep driver
//!
//! Drives the PC speaker through a `/dev/input` event device by
//! writing EV_SND/SND_TONE records. The kernel exposes the pcspkr
//! platform device under `/dev/input/by-path/`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::mem;
use std::os::fd::AsRawFd;
use std::path::Path;
use std::slice;

use tracing::{debug, warn};

use super::{BeepDriver, DriverError};

/// Input event type for sound devices
const EV_SND: u16 = 0x12;
/// Sound event code for tone generation
const SND_TONE: u16 = 0x02;

/// EVIOCGSND(8): read the first 64 sound capability bits
const EVIOCGSND_8: libc::c_ulong = 0x8008_451a;

/// Beep driver backed by an input event device
pub struct EvdevDriver {
    file: File,
}

impl EvdevDriver {
    /// Open `path` and verify it advertises the SND_TONE capability
    pub fn open(path: &Path) -> Result<Self, DriverError> {
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|source| DriverError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        let mut sound_bits: u64 = 0;
        let rc = unsafe {
            libc::ioctl(file.as_raw_fd(), EVIOCGSND_8, &mut sound_bits as *mut u64)
        };
        if rc < 0 {
            return Err(DriverError::Probe {
                path: path.to_path_buf(),
                source: io::Error::last_os_error(),
            });
        }
        if sound_bits & (1 << SND_TONE) == 0 {
            return Err(DriverError::Probe {
                path: path.to_path_buf(),
                source: io::Error::from_raw_os_error(libc::ENOTSUP),
            });
        }

        debug!(path = %path.display(), "evdev device supports tone events");
        Ok(Self { file })
    }

    /// Write one tone event; `value` is the frequency in Hz, 0 stops
    fn write_tone(&mut self, value: i32) {
        let event = tone_event(value);
        // The kernel wants the whole struct in a single write.
        let bytes = unsafe {
            slice::from_raw_parts(
                (&event as *const libc::input_event).cast::<u8>(),
                mem::size_of::<libc::input_event>(),
            )
        };
        if let Err(err) = self.file.write_all(bytes) {
            warn!(value, error = %err, "tone event write failed");
        }
    }
}

/// Build an EV_SND/SND_TONE event record
///
/// The timestamp is left zeroed; the kernel fills it in on write.
fn tone_event(value: i32) -> libc::input_event {
    libc::input_event {
        time: libc::timeval {
            tv_sec: 0,
            tv_usec: 0,
        },
        type_: EV_SND,
        code: SND_TONE,
        value,
    }
}

impl BeepDriver for EvdevDriver {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn begin_tone(&mut self, freq_hz: u16) {
        self.write_tone(i32::from(freq_hz));
    }

    fn end_tone(&mut self) {
        self.write_tone(0);
    }

    fn fini(&mut self) {
        self.write_tone(0);
    }
}
