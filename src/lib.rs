pub mod config; // Engine constants and tunables
pub mod dsp;
pub mod engine; // Clock, scheduler, and the piano engine itself
pub mod error;
pub mod graph; // Composable audio graph nodes
pub mod input; // Held-key debouncing for device glue
pub mod keyboard; // Equal-tempered key range
pub mod synth; // Voices, timbres, and the sustain pool
pub mod transport; // Record / replay state machine

pub use config::PianoConfig;
pub use engine::{EngineListener, PianoEngine, PianoEvent};
pub use error::{ParseNoteError, TransportError};
pub use input::{InputId, InputRouter};
pub use keyboard::{KeyRange, Note, NoteName};
pub use synth::Timbre;
pub use transport::{PlaybackStep, RecordedEvent, Transport, TransportState};

pub const MAX_BLOCK_SIZE: usize = 2048;
pub(crate) const MIN_TIME: f32 = 1.0 / 48_000.0;
