use crate::{
    config::DEFAULT_RELEASE_TIME,
    input::InputId,
    keyboard::Note,
    synth::voice::{Voice, VoiceId},
};

/*
Sustain Pool
============

The pool maps the *source* of a note-on (mouse on C#4, keyboard key "a", ...)
to the voice it started. Two sources may sound the same note at once; each
gets its own voice and must release with its own id.

    held:    [(id, voice), ...]   insertion order, oldest first, len ≤ cap
    ringing: [voice, ...]         released, fading, waiting for teardown

  note_on(id)   id held?  → nothing (key auto-repeat, already sounding)
                pool full → release the OLDEST held voice first
                          → spawn, insert at the back

  note_off(id)  id held?  → release with the voice's own release time,
                            move it from held to ringing
                otherwise → nothing (mouseup after mouseleave, etc.)

Releasing before inserting keeps `len() <= max_voices` at every point a
caller can observe. Ringing voices don't count toward the cap: they can no
longer be retriggered and die on their own once their teardown runs.
*/

/// A voice that just left the held set.
#[derive(Debug, Clone, PartialEq)]
pub struct Released {
    pub owner: InputId,
    pub voice: VoiceId,
    pub note: Note,
    /// When the release tail is over and the voice may be torn down
    pub teardown_at: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NoteOn {
    /// The id already had a held voice
    Ignored,
    Started { evicted: Option<Released> },
}

pub struct VoicePool {
    max_voices: usize,
    held: Vec<(InputId, Voice)>,
    ringing: Vec<Voice>,
}

impl VoicePool {
    pub fn new(max_voices: usize) -> Self {
        let max_voices = max_voices.max(1);
        Self {
            max_voices,
            held: Vec::with_capacity(max_voices),
            ringing: Vec::new(),
        }
    }

    /// Start a voice for `id` unless it already has one.
    ///
    /// `spawn` is only called when a voice is actually needed and must
    /// return a started voice.
    pub fn note_on(&mut self, id: InputId, now: f64, spawn: impl FnOnce() -> Voice) -> NoteOn {
        if self.contains(&id) {
            log::debug!(target: "piano::pool", "{id} already held, ignoring");
            return NoteOn::Ignored;
        }

        let evicted = if self.held.len() >= self.max_voices {
            self.evict_oldest(now)
        } else {
            None
        };

        let voice = spawn();
        log::debug!(target: "piano::pool", "{id} -> {} ({:?})", voice.note(), voice.id());
        self.held.push((id, voice));

        NoteOn::Started { evicted }
    }

    /// Release the voice held by `id`, if any.
    pub fn note_off(&mut self, id: &InputId, now: f64) -> Option<Released> {
        let idx = self.held.iter().position(|(owner, _)| owner == id)?;
        let (owner, voice) = self.held.remove(idx);
        let release_time = voice.release_time();
        Some(self.retire(owner, voice, release_time, now))
    }

    /// Release every held voice, oldest first.
    pub fn release_all(&mut self, now: f64) -> Vec<Released> {
        let held = std::mem::take(&mut self.held);
        held.into_iter()
            .map(|(owner, voice)| {
                let release_time = voice.release_time();
                self.retire(owner, voice, release_time, now)
            })
            .collect()
    }

    /// Stop and drop a ringing voice. Returns false if it was already gone.
    pub fn teardown(&mut self, voice: VoiceId) -> bool {
        let Some(idx) = self.ringing.iter().position(|v| v.id() == voice) else {
            return false;
        };
        let mut voice = self.ringing.swap_remove(idx);
        voice.stop();
        log::debug!(target: "piano::pool", "torn down {:?}", voice.id());
        true
    }

    /// Mix every held and ringing voice into `out` (added, not overwritten).
    pub fn render(&mut self, out: &mut [f32], t0: f64) {
        for (_, voice) in self.held.iter_mut() {
            voice.render(out, t0);
        }
        for voice in self.ringing.iter_mut() {
            voice.render(out, t0);
        }
    }

    pub fn contains(&self, id: &InputId) -> bool {
        self.held.iter().any(|(owner, _)| owner == id)
    }

    pub fn get(&self, id: &InputId) -> Option<&Voice> {
        self.held
            .iter()
            .find(|(owner, _)| owner == id)
            .map(|(_, voice)| voice)
    }

    /// Held ids, oldest first.
    pub fn held_ids(&self) -> impl Iterator<Item = &InputId> {
        self.held.iter().map(|(owner, _)| owner)
    }

    /// Number of held voices (the capped quantity).
    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn ringing_len(&self) -> usize {
        self.ringing.len()
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    fn evict_oldest(&mut self, now: f64) -> Option<Released> {
        if self.held.is_empty() {
            return None;
        }
        let (owner, voice) = self.held.remove(0);
        log::debug!(target: "piano::pool", "pool full, evicting {owner}");
        Some(self.retire(owner, voice, DEFAULT_RELEASE_TIME, now))
    }

    fn retire(&mut self, owner: InputId, mut voice: Voice, release_time: f32, now: f64) -> Released {
        let teardown_at = voice.release(release_time, now);
        let released = Released {
            owner,
            voice: voice.id(),
            note: *voice.note(),
            teardown_at,
        };

        if teardown_at.is_some() {
            self.ringing.push(voice);
        } else {
            voice.stop();
        }
        released
    }
}
