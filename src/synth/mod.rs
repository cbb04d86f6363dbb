// Purpose: Voice lifecycle, timbre presets, and the sustain pool
// This layer sits above graph nodes and below the engine

pub mod pool;
pub mod timbre;
pub mod voice;

pub use pool::{NoteOn, Released, VoicePool};
pub use timbre::{Timbre, TimbreParams};
pub use voice::{Voice, VoiceId, VoiceSettings};
