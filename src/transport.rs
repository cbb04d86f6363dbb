use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::TransportError, keyboard::Note};

/*
Record / Replay
===============

          arm()                    play() [sequence non-empty]
  ┌──────┐ ────→ ┌───────┐        ┌──────┐ ─────────────→ ┌─────────┐
  │ Idle │       │ Armed │        │ Idle │                │ Playing │
  └──────┘ ←──── └───────┘        └──────┘ ←───────────── └─────────┘
          disarm()                         finish() / stop()

  arm      clears the previous take
  disarm   keeps the take
  capture  only while Armed, appends (note, timestamp_ms)
  clear    only while Idle

Playback keeps onset spacing, not hold lengths: step i waits
`ts[i] - ts[i-1]` ms after step i-1 (the first step waits 0).
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransportState {
    #[default]
    Idle,
    Armed,
    Playing,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportState::Idle => "idle",
            TransportState::Armed => "armed",
            TransportState::Playing => "playing",
        })
    }
}

/// One captured note-on.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecordedEvent {
    pub note: Note,
    pub timestamp_ms: i64,
}

/// One note of a replay: wait `delay_ms` after the previous step, then play.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStep {
    pub delay_ms: i64,
    pub note: Note,
}

#[derive(Debug, Default)]
pub struct Transport {
    state: TransportState,
    sequence: Vec<RecordedEvent>,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh take.
    pub fn arm(&mut self) -> Result<(), TransportError> {
        self.require(TransportState::Idle, "arm")?;
        self.sequence.clear();
        self.state = TransportState::Armed;
        log::debug!(target: "piano::transport", "armed");
        Ok(())
    }

    pub fn capture(&mut self, note: Note, timestamp_ms: i64) -> Result<(), TransportError> {
        self.require(TransportState::Armed, "capture")?;
        self.sequence.push(RecordedEvent { note, timestamp_ms });
        Ok(())
    }

    /// Stop recording, keeping what was captured.
    pub fn disarm(&mut self) -> Result<(), TransportError> {
        self.require(TransportState::Armed, "disarm")?;
        self.state = TransportState::Idle;
        log::debug!(target: "piano::transport", "disarmed with {} events", self.sequence.len());
        Ok(())
    }

    /// Enter Playing and return the steps to schedule.
    pub fn play(&mut self) -> Result<Vec<PlaybackStep>, TransportError> {
        self.require(TransportState::Idle, "play")?;
        if self.sequence.is_empty() {
            return Err(TransportError::EmptySequence);
        }

        let steps = self
            .sequence
            .iter()
            .scan(None, |prev: &mut Option<i64>, event| {
                let delay_ms = prev.map_or(0, |p| event.timestamp_ms - p);
                *prev = Some(event.timestamp_ms);
                Some(PlaybackStep {
                    delay_ms,
                    note: event.note,
                })
            })
            .collect();

        self.state = TransportState::Playing;
        log::debug!(target: "piano::transport", "playing {} events", self.sequence.len());
        Ok(steps)
    }

    /// The last step has fired.
    pub fn finish(&mut self) -> Result<(), TransportError> {
        self.require(TransportState::Playing, "finish")?;
        self.state = TransportState::Idle;
        Ok(())
    }

    /// Abandon playback early.
    pub fn stop(&mut self) -> Result<(), TransportError> {
        self.require(TransportState::Playing, "stop")?;
        self.state = TransportState::Idle;
        log::debug!(target: "piano::transport", "playback stopped");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), TransportError> {
        self.require(TransportState::Idle, "clear")?;
        self.sequence.clear();
        Ok(())
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_armed(&self) -> bool {
        self.state == TransportState::Armed
    }

    pub fn sequence(&self) -> &[RecordedEvent] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    fn require(&self, state: TransportState, op: &'static str) -> Result<(), TransportError> {
        if self.state == state {
            Ok(())
        } else {
            Err(TransportError::InvalidState {
                op,
                state: self.state,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyRange;

    fn key(index: usize) -> Note {
        KeyRange::THREE_OCTAVES.note_at(index).expect("key in range")
    }

    fn recorded(timestamps: &[i64]) -> Transport {
        let mut transport = Transport::new();
        transport.arm().expect("idle transport arms");
        for (i, &ts) in timestamps.iter().enumerate() {
            transport.capture(key(i), ts).expect("armed transport captures");
        }
        transport.disarm().expect("armed transport disarms");
        transport
    }

    #[test]
    fn playback_keeps_onset_spacing() {
        let mut transport = recorded(&[0, 200, 550]);
        let steps = transport.play().expect("non-empty take plays");

        let delays: Vec<i64> = steps.iter().map(|s| s.delay_ms).collect();
        assert_eq!(delays, vec![0, 200, 350]);
        assert!(steps[2].note.same_key(&key(2)));
        assert_eq!(transport.state(), TransportState::Playing);

        transport.finish().expect("playing transport finishes");
        assert_eq!(transport.state(), TransportState::Idle);
        assert_eq!(transport.len(), 3, "playback keeps the take");
    }

    #[test]
    fn first_delay_is_zero_whatever_the_offset() {
        let mut transport = recorded(&[1_500, 1_600]);
        let steps = transport.play().expect("plays");
        assert_eq!(steps[0].delay_ms, 0);
        assert_eq!(steps[1].delay_ms, 100);
    }

    #[test]
    fn arming_clears_previous_take() {
        let mut transport = recorded(&[0, 10]);
        transport.arm().expect("arms");
        assert!(transport.is_empty());
    }

    #[test]
    fn capture_outside_armed_is_rejected() {
        let mut transport = Transport::new();
        let err = transport.capture(key(0), 0).unwrap_err();
        assert_eq!(
            err,
            TransportError::InvalidState {
                op: "capture",
                state: TransportState::Idle
            }
        );
        assert!(transport.is_empty());
    }

    #[test]
    fn play_with_nothing_recorded_fails() {
        let mut transport = Transport::new();
        assert_eq!(transport.play(), Err(TransportError::EmptySequence));
        assert_eq!(transport.state(), TransportState::Idle);
    }

    #[test]
    fn clear_then_play_fails_for_empty_and_populated_takes() {
        let mut empty = Transport::new();
        empty.clear().expect("clearing an empty take is fine");
        assert_eq!(empty.play(), Err(TransportError::EmptySequence));

        let mut populated = recorded(&[0, 100]);
        populated.clear().expect("idle transport clears");
        assert_eq!(populated.play(), Err(TransportError::EmptySequence));
    }

    #[test]
    fn invalid_transitions_change_nothing() {
        let mut transport = recorded(&[0]);
        transport.play().expect("plays");

        assert!(transport.arm().is_err());
        assert!(transport.clear().is_err());
        assert!(transport.play().is_err());
        assert_eq!(transport.state(), TransportState::Playing);
        assert_eq!(transport.len(), 1);

        transport.stop().expect("stops");
        assert!(transport.stop().is_err());
        assert!(transport.disarm().is_err());
    }

    #[test]
    fn error_messages_name_the_state() {
        let err = Transport::new().disarm().unwrap_err();
        assert_eq!(err.to_string(), "cannot disarm while transport is idle");
    }
}
