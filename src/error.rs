use thiserror::Error;

use crate::transport::TransportState;

/// Errors raised by the record / replay state machine.
///
/// The engine treats all of these as ignorable: they are only reachable when
/// a control is pressed while it should have been unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Operation not permitted from the current state
    #[error("cannot {op} while transport is {state}")]
    InvalidState {
        op: &'static str,
        state: TransportState,
    },
    /// Playback requested with nothing recorded
    #[error("nothing recorded to play back")]
    EmptySequence,
}

/// Failure to parse a note name such as `"C#"`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown note name `{0}` (expected one of C, C#, D, D#, E, F, F#, G, G#, A, A#, B)")]
pub struct ParseNoteError(pub String);
