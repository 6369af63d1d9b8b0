//! The playback event loop
//!
//! Couples the signal channel and the one-shot timer to the state
//! machine: wait for whichever is ready, decode what arrived into FSM
//! events, apply them in order, stop at Done.

use tokio::select;
use tracing::{debug, info};

use crate::driver::BeepDriver;
use crate::events::FsmEvent;
use crate::sequence::ToneSequence;
use crate::signals::{SignalChannel, SignalRecord};
use crate::state::{InternalLogicError, LoopContext, PlaybackFsm};
use crate::timer::OneShotTimer;

/// Most signal records taken per wake
const MAX_EVENTS: usize = 16;

/// Fatal conditions that abort the loop
#[derive(Debug, thiserror::Error)]
pub enum LoopError {
    /// An event reached the state machine after Done
    #[error(transparent)]
    InternalLogic(#[from] InternalLogicError),

    /// Every signal forwarder vanished while playback was running
    #[error("signal channel closed")]
    SignalChannelClosed,
}

/// Run playback to completion
///
/// Consumes the sequence, multiplexing timer expiry against incoming
/// signals, and returns once the state machine reaches Done. The
/// caller tears the driver down afterwards, on success and on error
/// alike.
pub async fn run(
    driver: &mut dyn BeepDriver,
    sequence: ToneSequence,
    mut signals: SignalChannel,
) -> Result<(), LoopError> {
    let mut ctx = LoopContext {
        driver,
        sequence,
        timer: OneShotTimer::new(),
    };
    let mut fsm = PlaybackFsm::startup(&mut ctx);
    let mut batch: Vec<SignalRecord> = Vec::with_capacity(MAX_EVENTS);

    // A third readiness source (beep-on-input from stdin) would slot
    // in as another select! arm.
    while !fsm.is_done() {
        select! {
            count = signals.recv_batch(&mut batch, MAX_EVENTS) => {
                if count == 0 {
                    return Err(LoopError::SignalChannelClosed);
                }
                for record in batch.drain(..) {
                    debug!(signal = record.name(), "processing signal");
                    fsm.handle_event(&mut ctx, record.fsm_event())?;
                    if fsm.is_done() {
                        // Whatever is left of the batch dies with it.
                        break;
                    }
                }
            }
            _ = ctx.timer.expired() => {
                fsm.handle_event(&mut ctx, FsmEvent::Timeout)?;
            }
        }
    }

    info!("playback finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, RecordingDriver};
    use crate::sequence::{EndDelay, ToneSpec};
    use crate::state::END_GRACE;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};

    fn tone(freq_hz: u16, reps: u32) -> ToneSpec {
        ToneSpec {
            freq_hz,
            length: Duration::from_millis(200),
            reps,
            delay: Duration::from_millis(100),
            end_delay: EndDelay::No,
        }
    }

    fn quiet_channel() -> (mpsc::Sender<SignalRecord>, SignalChannel) {
        let (tx, rx) = mpsc::channel(8);
        (tx, SignalChannel::from_rx(rx))
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_playback_without_signals() {
        let mut driver = RecordingDriver::new();
        let (_tx, signals) = quiet_channel();
        let start = Instant::now();

        run(&mut driver, ToneSequence::from_specs([tone(440, 1)]), signals)
            .await
            .unwrap();

        assert_eq!(
            Instant::now() - start,
            Duration::from_millis(200) + END_GRACE
        );
        assert_eq!(
            driver.calls,
            vec![
                DriverCall::BeginTone(440),
                DriverCall::EndTone,
                DriverCall::EndTone,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_multi_tone_timeline() {
        let mut driver = RecordingDriver::new();
        let (_tx, signals) = quiet_channel();
        let sequence = ToneSequence::from_specs([tone(440, 2), tone(880, 1)]);
        let start = Instant::now();

        run(&mut driver, sequence, signals).await.unwrap();

        // 200 beep, 100 gap, 200 beep, 100 grace, 200 beep, 100 grace.
        assert_eq!(Instant::now() - start, Duration::from_millis(900));
        assert_eq!(
            driver.calls,
            vec![
                DriverCall::BeginTone(440),
                DriverCall::EndTone,
                DriverCall::BeginTone(440),
                DriverCall::EndTone,
                DriverCall::BeginTone(880),
                DriverCall::EndTone,
                DriverCall::EndTone,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_resume_terminate() {
        let mut driver = RecordingDriver::new();
        let (tx, signals) = quiet_channel();
        let sequence = ToneSequence::from_specs([tone(440, 10)]);

        let script = async move {
            sleep(Duration::from_millis(50)).await;
            tx.send(SignalRecord { signo: libc::SIGTSTP }).await.unwrap();
            sleep(Duration::from_millis(500)).await;
            tx.send(SignalRecord { signo: libc::SIGCONT }).await.unwrap();
            sleep(Duration::from_millis(50)).await;
            tx.send(SignalRecord { signo: libc::SIGTERM }).await.unwrap();
        };

        let (result, ()) = tokio::join!(run(&mut driver, sequence, signals), script);
        result.unwrap();

        assert_eq!(
            driver.calls,
            vec![
                DriverCall::BeginTone(440),
                DriverCall::EndTone,
                DriverCall::BeginTone(440),
                DriverCall::EndTone,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_burst_stops_at_done() {
        let mut driver = RecordingDriver::new();
        let (tx, signals) = quiet_channel();

        // Both arrive before the loop wakes; the second must never
        // reach the state machine.
        tx.send(SignalRecord { signo: libc::SIGINT }).await.unwrap();
        tx.send(SignalRecord { signo: libc::SIGINT }).await.unwrap();

        run(&mut driver, ToneSequence::from_specs([tone(440, 1)]), signals)
            .await
            .unwrap();

        assert_eq!(
            driver.calls,
            vec![DriverCall::BeginTone(440), DriverCall::EndTone]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_signal_terminates_during_silence() {
        let mut driver = RecordingDriver::new();
        let (tx, signals) = quiet_channel();
        let spec = ToneSpec {
            delay: Duration::from_millis(5000),
            end_delay: EndDelay::Yes,
            ..tone(440, 1)
        };

        let script = async move {
            sleep(Duration::from_millis(300)).await;
            tx.send(SignalRecord { signo: libc::SIGUSR1 }).await.unwrap();
        };

        let (result, ()) = tokio::join!(
            run(&mut driver, ToneSequence::from_specs([spec]), signals),
            script
        );
        result.unwrap();

        // The tone was stopped exactly once over the whole run.
        assert_eq!(driver.end_count(), 1);
        assert_eq!(
            driver.calls,
            vec![DriverCall::BeginTone(440), DriverCall::EndTone]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_signal_channel_aborts() {
        let mut driver = RecordingDriver::new();
        let (tx, signals) = quiet_channel();
        drop(tx);

        let err = run(&mut driver, ToneSequence::from_specs([tone(440, 1)]), signals)
            .await
            .unwrap_err();

        assert!(matches!(err, LoopError::SignalChannelClosed));
        // The tone may still be sounding; teardown is the caller's job.
        assert_eq!(driver.begin_count(), 1);
        assert_eq!(driver.end_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_sequence_completes_immediately() {
        let mut driver = RecordingDriver::new();
        let (_tx, signals) = quiet_channel();
        let start = Instant::now();

        run(&mut driver, ToneSequence::default(), signals)
            .await
            .unwrap();

        assert_eq!(Instant::now() - start, Duration::ZERO);
        assert!(driver.calls.is_empty());
    }
}
