//! Events module for playback state transitions
//!
//! Every input to the playback loop, whether from the timer or from a
//! process signal, is normalized to one of these events before the
//! state machine sees it.

/// Events consumed by the playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsmEvent {
    /// The armed one-shot timer fired
    Timeout,

    /// Stop playback and exit (SIGHUP, SIGINT, SIGTERM)
    Terminate,

    /// Suspend playback (SIGTSTP)
    Pause,

    /// Resume playback (SIGCONT)
    Continue,
}

impl std::fmt::Display for FsmEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FsmEvent::Timeout => write!(f, "TIMEOUT"),
            FsmEvent::Terminate => write!(f, "TERMINATE"),
            FsmEvent::Pause => write!(f, "PAUSE"),
            FsmEvent::Continue => write!(f, "CONTINUE"),
        }
    }
}
