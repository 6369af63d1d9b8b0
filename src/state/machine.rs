//! Core playback state machine
//!
//! Handles transitions between Beeping, Silence, PausedBeeping,
//! PausedSilence, and Done based on timer expiry and process signals.
//! Every transition's side effects are driver calls and timer arming;
//! the machine itself never blocks.

use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::driver::BeepDriver;
use crate::events::FsmEvent;
use crate::sequence::{EndDelay, ToneSequence};
use crate::timer::OneShotTimer;

/// Silent tail after the last repetition of a tone without an end
/// delay of its own
pub const END_GRACE: Duration = Duration::from_millis(100);

/// The five possible states of playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// A tone is sounding
    Beeping,
    /// Speaker off, waiting out a gap
    Silence,
    /// Suspended while a tone was sounding
    PausedBeeping,
    /// Suspended during a gap
    PausedSilence,
    /// Terminal: playback is over
    Done,
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackState::Beeping => write!(f, "Beeping"),
            PlaybackState::Silence => write!(f, "Silence"),
            PlaybackState::PausedBeeping => write!(f, "PausedBeeping"),
            PlaybackState::PausedSilence => write!(f, "PausedSilence"),
            PlaybackState::Done => write!(f, "Done"),
        }
    }
}

/// Fatal condition: an event was delivered after playback reached Done
#[derive(Debug, thiserror::Error)]
#[error("event {event} delivered in terminal state {state}")]
pub struct InternalLogicError {
    pub state: PlaybackState,
    pub event: FsmEvent,
}

/// Everything a transition may touch: the device, the remaining tones,
/// and the timer
pub struct LoopContext<'d> {
    pub driver: &'d mut dyn BeepDriver,
    pub sequence: ToneSequence,
    pub timer: OneShotTimer,
}

/// The state machine controlling playback phase
pub struct PlaybackFsm {
    state: PlaybackState,
}

impl PlaybackFsm {
    /// Start the first tone and enter Beeping
    ///
    /// An empty sequence finishes immediately.
    pub fn startup(ctx: &mut LoopContext<'_>) -> Self {
        let state = match ctx.sequence.current().copied() {
            Some(spec) => {
                info!(
                    freq_hz = spec.freq_hz,
                    length_ms = spec.length.as_millis() as u64,
                    reps = spec.reps,
                    "playback started"
                );
                ctx.driver.begin_tone(spec.freq_hz);
                ctx.timer.arm(spec.length);
                PlaybackState::Beeping
            }
            None => {
                debug!("empty tone sequence, nothing to play");
                PlaybackState::Done
            }
        };
        Self { state }
    }

    /// Current state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True once playback has reached the terminal state
    pub fn is_done(&self) -> bool {
        self.state == PlaybackState::Done
    }

    /// Apply one event, performing its driver and timer effects
    ///
    /// No event may be delivered once Done is reached; the loop stops
    /// feeding the machine at that point. If one arrives anyway the
    /// tone is stopped and the error surfaces as a distinct exit
    /// status.
    pub fn handle_event(
        &mut self,
        ctx: &mut LoopContext<'_>,
        event: FsmEvent,
    ) -> Result<(), InternalLogicError> {
        let old_state = self.state;
        let new_state = match old_state {
            PlaybackState::Beeping => self.on_beeping(ctx, event),
            PlaybackState::Silence => self.on_silence(ctx, event),
            PlaybackState::PausedBeeping => self.on_paused_beeping(ctx, event),
            PlaybackState::PausedSilence => self.on_paused_silence(ctx, event),
            PlaybackState::Done => {
                ctx.driver.end_tone();
                error!(state = %old_state, event = %event, "event in terminal state");
                return Err(InternalLogicError {
                    state: old_state,
                    event,
                });
            }
        };

        if new_state != old_state {
            info!(from = %old_state, to = %new_state, event = %event, "state transition");
        }
        self.state = new_state;
        Ok(())
    }

    /// A tone is sounding
    fn on_beeping(&self, ctx: &mut LoopContext<'_>, event: FsmEvent) -> PlaybackState {
        match event {
            FsmEvent::Terminate => {
                ctx.driver.end_tone();
                PlaybackState::Done
            }
            FsmEvent::Pause => {
                // Elapsed tone time is not preserved; Continue restarts
                // the interval from scratch.
                ctx.driver.end_tone();
                PlaybackState::PausedBeeping
            }
            FsmEvent::Continue => PlaybackState::Beeping,
            FsmEvent::Timeout => self.on_beeping_timeout(ctx),
        }
    }

    /// The current repetition finished sounding
    fn on_beeping_timeout(&self, ctx: &mut LoopContext<'_>) -> PlaybackState {
        ctx.driver.end_tone();

        let Some(spec) = ctx.sequence.current_mut() else {
            // Beeping always has a current tone.
            warn!("no current tone while beeping");
            return PlaybackState::Done;
        };
        spec.reps -= 1;
        let reps_left = spec.reps;
        let delay = spec.delay;
        let end_delay = spec.end_delay;
        debug!(freq_hz = spec.freq_hz, reps_left, "repetition finished");

        if reps_left == 0 {
            let gap = match end_delay {
                EndDelay::No => END_GRACE,
                EndDelay::Yes => delay,
            };
            ctx.timer.arm(gap);
            ctx.sequence.advance();
            PlaybackState::Silence
        } else if ctx.sequence.has_next() {
            ctx.timer.arm(delay);
            PlaybackState::Silence
        } else {
            // Repetitions remain but nothing follows this tone; the
            // run ends here rather than scheduling another repeat.
            PlaybackState::Done
        }
    }

    /// Speaker off, waiting out a gap
    fn on_silence(&self, ctx: &mut LoopContext<'_>, event: FsmEvent) -> PlaybackState {
        match event {
            FsmEvent::Terminate => PlaybackState::Done,
            FsmEvent::Continue => PlaybackState::Silence,
            FsmEvent::Pause => PlaybackState::PausedSilence,
            FsmEvent::Timeout => match ctx.sequence.current().copied() {
                Some(spec) => {
                    ctx.driver.begin_tone(spec.freq_hz);
                    ctx.timer.arm(spec.length);
                    PlaybackState::Beeping
                }
                None => {
                    ctx.driver.end_tone();
                    PlaybackState::Done
                }
            },
        }
    }

    /// Suspended while a tone was sounding
    fn on_paused_beeping(&self, ctx: &mut LoopContext<'_>, event: FsmEvent) -> PlaybackState {
        match event {
            FsmEvent::Terminate => PlaybackState::Done,
            // A timeout firing while paused is swallowed; Continue
            // restarts the interval in full.
            FsmEvent::Timeout | FsmEvent::Pause => PlaybackState::PausedBeeping,
            FsmEvent::Continue => match ctx.sequence.current().copied() {
                Some(spec) => {
                    ctx.driver.begin_tone(spec.freq_hz);
                    ctx.timer.arm(spec.length);
                    PlaybackState::Beeping
                }
                None => {
                    warn!("no current tone on resume");
                    PlaybackState::Done
                }
            },
        }
    }

    /// Suspended during a gap
    fn on_paused_silence(&self, _ctx: &mut LoopContext<'_>, event: FsmEvent) -> PlaybackState {
        match event {
            FsmEvent::Terminate => PlaybackState::Done,
            FsmEvent::Timeout | FsmEvent::Pause => PlaybackState::PausedSilence,
            // The timer is not re-armed here: the still-pending
            // timeout ends the gap. If it fired while paused it was
            // swallowed above, and only a signal can end the silence.
            FsmEvent::Continue => PlaybackState::Silence,
        }
    }
}
