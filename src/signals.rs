//! Process control signal channel
//!
//! Registers handlers for the signals that drive playback and funnels
//! them into a single mpsc channel, so the main loop receives them in
//! arrival order and can drain a burst in one pass.

use std::io;

use libc::c_int;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::events::FsmEvent;

/// Signals the playback loop subscribes to
///
/// SIGSTOP is decoded by [`SignalRecord::fsm_event`] but absent here:
/// the kernel never lets a process observe it.
const WATCHED_SIGNALS: [c_int; 5] = [
    libc::SIGHUP,
    libc::SIGINT,
    libc::SIGTERM,
    libc::SIGTSTP,
    libc::SIGCONT,
];

/// Capacity of the delivery channel shared by all forwarders
const CHANNEL_CAPACITY: usize = 32;

/// One delivered signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalRecord {
    /// Raw signal number as delivered by the kernel
    pub signo: c_int,
}

impl SignalRecord {
    /// Map this signal to the playback event it stands for
    pub fn fsm_event(self) -> FsmEvent {
        match self.signo {
            libc::SIGHUP | libc::SIGINT | libc::SIGTERM => FsmEvent::Terminate,
            libc::SIGTSTP | libc::SIGSTOP => FsmEvent::Pause,
            libc::SIGCONT => FsmEvent::Continue,
            other => {
                warn!(signo = other, "unexpected signal, treating as terminate");
                FsmEvent::Terminate
            }
        }
    }

    /// Signal name for logging
    pub fn name(self) -> &'static str {
        match self.signo {
            libc::SIGHUP => "SIGHUP",
            libc::SIGINT => "SIGINT",
            libc::SIGTERM => "SIGTERM",
            libc::SIGTSTP => "SIGTSTP",
            libc::SIGSTOP => "SIGSTOP",
            libc::SIGCONT => "SIGCONT",
            _ => "unknown",
        }
    }
}

/// Receives watched signals as they arrive
pub struct SignalChannel {
    rx: mpsc::Receiver<SignalRecord>,
}

impl SignalChannel {
    /// Register handlers for all watched signals and start forwarding
    /// them into the channel
    ///
    /// Fails if any handler cannot be installed, before playback has
    /// touched the hardware.
    pub fn subscribe() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        for signo in WATCHED_SIGNALS {
            let mut stream = signal(SignalKind::from_raw(signo))?;
            let tx = tx.clone();
            let record = SignalRecord { signo };
            tokio::spawn(async move {
                while stream.recv().await.is_some() {
                    debug!(signal = record.name(), "signal received");
                    if tx.send(record).await.is_err() {
                        break;
                    }
                }
            });
        }

        Ok(Self { rx })
    }

    /// Wait for at least one signal, then take up to `limit` of them
    /// without further waiting
    ///
    /// Appends to `buf` and returns how many records arrived. A return
    /// of 0 means the channel is closed.
    pub async fn recv_batch(&mut self, buf: &mut Vec<SignalRecord>, limit: usize) -> usize {
        self.rx.recv_many(buf, limit).await
    }

    /// Build a channel fed by `rx` instead of process signals
    #[cfg(test)]
    pub(crate) fn from_rx(rx: mpsc::Receiver<SignalRecord>) -> Self {
        Self { rx }
    }
}
