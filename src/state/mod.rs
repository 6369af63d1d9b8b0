//! State machine module for playback control
//!
//! Provides an explicit state machine with five states:
//! - Beeping: a tone is sounding
//! - Silence: the gap between repetitions or tones
//! - PausedBeeping: suspended mid-tone, restarted in full on resume
//! - PausedSilence: suspended mid-gap
//! - Done: terminal, playback over

mod machine;

pub use machine::{
    InternalLogicError, LoopContext, PlaybackFsm, PlaybackState, END_GRACE,
};
