//! Tone sequence types
//!
//! A playback run works through an ordered list of tone specifications,
//! one at a time, front to back. Finished entries are discarded so the
//! loop can never revisit them.

use std::collections::VecDeque;
use std::time::Duration;

/// Whether the inter-repetition delay is also played after the final
/// repetition of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndDelay {
    /// Delay only between repetitions
    No,
    /// Delay after every repetition, including the last
    Yes,
}

/// One tone to play: frequency, duration, and repetition accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneSpec {
    /// Tone frequency in Hz
    pub freq_hz: u16,
    /// How long each repetition sounds
    pub length: Duration,
    /// Repetitions remaining, counted down during playback
    pub reps: u32,
    /// Silent gap between repetitions
    pub delay: Duration,
    /// Whether the gap also follows the final repetition
    pub end_delay: EndDelay,
}

/// The ordered tones of one playback run
///
/// The front entry is the one currently playing. `advance` drops it,
/// making the next entry current; there is no way back.
#[derive(Debug, Clone, Default)]
pub struct ToneSequence {
    specs: VecDeque<ToneSpec>,
}

impl ToneSequence {
    /// Build a sequence from tone specs in playback order
    pub fn from_specs(specs: impl IntoIterator<Item = ToneSpec>) -> Self {
        Self {
            specs: specs.into_iter().collect(),
        }
    }

    /// The tone currently playing, if any
    pub fn current(&self) -> Option<&ToneSpec> {
        self.specs.front()
    }

    /// Mutable access to the current tone (for counting down reps)
    pub fn current_mut(&mut self) -> Option<&mut ToneSpec> {
        self.specs.front_mut()
    }

    /// Discard the current tone; the next one (if any) becomes current
    pub fn advance(&mut self) -> Option<ToneSpec> {
        self.specs.pop_front()
    }

    /// True if another tone follows the current one
    pub fn has_next(&self) -> bool {
        self.specs.len() > 1
    }

    /// True if no tones remain
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Number of tones remaining, current included
    pub fn len(&self) -> usize {
        self.specs.len()
    }
}
