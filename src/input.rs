use std::fmt;

use crate::{
    engine::{EngineListener, PianoEngine},
    keyboard::Note,
};

/// Identifies the *source* of a note-on, not the note itself.
///
/// The mouse on C#4 and the keyboard key bound to C#4 are different sources
/// and may hold the same note at the same time. A release must use the exact
/// id its press used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputId(String);

impl InputId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// `mouse:C#4`
    pub fn mouse(note: &Note) -> Self {
        Self(format!("mouse:{note}"))
    }

    /// `keyboard:a`
    pub fn keyboard(key: char) -> Self {
        Self(format!("keyboard:{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
struct Held {
    note: Note,
    last_press: f64,
}

/// Debounces raw device input before it reaches the engine.
///
/// Terminals and browsers repeat key-down while a key is held, and some
/// terminals never report key-up at all. The router remembers which ids are
/// down so only the first press starts a note, and can expire ids that
/// stopped repeating.
#[derive(Debug, Default)]
pub struct InputRouter {
    held: Vec<(InputId, Held)>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. True only for the first press of `id`; repeats just
    /// refresh its timestamp.
    pub fn press(&mut self, id: InputId, note: Note, now: f64) -> bool {
        if let Some((_, held)) = self.held.iter_mut().find(|(held_id, _)| *held_id == id) {
            held.last_press = now;
            return false;
        }
        self.held.push((
            id,
            Held {
                note,
                last_press: now,
            },
        ));
        true
    }

    /// Forget `id`. True if it was held.
    pub fn release(&mut self, id: &InputId) -> bool {
        let before = self.held.len();
        self.held.retain(|(held_id, _)| held_id != id);
        self.held.len() != before
    }

    /// Drop and return every id whose last press is more than `hold` seconds
    /// before `now`.
    pub fn expire(&mut self, now: f64, hold: f64) -> Vec<InputId> {
        let mut expired = Vec::new();
        self.held.retain(|(id, held)| {
            let stale = now - held.last_press > hold;
            if stale {
                expired.push(id.clone());
            }
            !stale
        });
        expired
    }

    pub fn is_held(&self, id: &InputId) -> bool {
        self.held.iter().any(|(held_id, _)| held_id == id)
    }

    /// Notes currently held down, with their ids.
    pub fn held(&self) -> impl Iterator<Item = (&InputId, &Note)> {
        self.held.iter().map(|(id, held)| (id, &held.note))
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Press routed into the engine: only the first press starts a note.
    pub fn key_down<L: EngineListener>(
        &mut self,
        engine: &mut PianoEngine<L>,
        id: InputId,
        note: Note,
    ) -> bool {
        let now = engine.now();
        if !self.press(id.clone(), note, now) {
            return false;
        }
        engine.note_on(id, note);
        true
    }

    /// Release routed into the engine. Unknown ids are ignored.
    pub fn key_up<L: EngineListener>(&mut self, engine: &mut PianoEngine<L>, id: &InputId) -> bool {
        if !self.release(id) {
            return false;
        }
        engine.note_off(id);
        true
    }

    /// Release every id that stopped repeating more than `hold` seconds ago.
    pub fn expire_into<L: EngineListener>(
        &mut self,
        engine: &mut PianoEngine<L>,
        hold: f64,
    ) -> Vec<InputId> {
        let expired = self.expire(engine.now(), hold);
        for id in &expired {
            engine.note_off(id);
        }
        expired
    }

    /// Release everything (focus lost, quitting).
    pub fn release_all<L: EngineListener>(&mut self, engine: &mut PianoEngine<L>) {
        for (id, _) in std::mem::take(&mut self.held) {
            engine.note_off(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        keyboard::{KeyRange, NoteName},
        PianoConfig, PianoEvent,
    };

    fn c4() -> Note {
        KeyRange::THREE_OCTAVES
            .find(NoteName::C, 4)
            .expect("C4 is on the keyboard")
    }

    #[test]
    fn ids_name_their_source() {
        let note = KeyRange::THREE_OCTAVES
            .find(NoteName::Cs, 4)
            .expect("C#4 is on the keyboard");
        assert_eq!(InputId::mouse(&note).as_str(), "mouse:C#4");
        assert_eq!(InputId::keyboard('a').to_string(), "keyboard:a");
        assert_ne!(InputId::mouse(&note), InputId::keyboard('w'));
    }

    #[test]
    fn auto_repeat_is_debounced() {
        let mut router = InputRouter::new();
        let id = InputId::keyboard('q');

        assert!(router.press(id.clone(), c4(), 0.0));
        assert!(!router.press(id.clone(), c4(), 0.03));
        assert!(!router.press(id.clone(), c4(), 0.06));
        assert_eq!(router.len(), 1);

        assert!(router.release(&id));
        assert!(!router.release(&id));
        assert!(router.press(id, c4(), 0.5));
    }

    #[test]
    fn expire_drops_keys_that_stopped_repeating() {
        let mut router = InputRouter::new();
        let fresh = InputId::keyboard('w');
        let stale = InputId::keyboard('e');

        router.press(stale.clone(), c4(), 0.0);
        router.press(fresh.clone(), c4(), 0.0);
        router.press(fresh.clone(), c4(), 0.4);

        let expired = router.expire(0.5, 0.25);
        assert_eq!(expired, vec![stale.clone()]);
        assert!(router.is_held(&fresh));
        assert!(!router.is_held(&stale));
    }

    #[test]
    fn routing_reaches_the_engine_once() {
        let mut engine = PianoEngine::new(PianoConfig::default(), Vec::<PianoEvent>::new());
        let mut router = InputRouter::new();
        let id = InputId::keyboard('q');

        assert!(router.key_down(&mut engine, id.clone(), c4()));
        assert!(!router.key_down(&mut engine, id.clone(), c4()));
        assert_eq!(engine.held_voices(), 1);

        assert!(router.key_up(&mut engine, &id));
        assert!(!router.key_up(&mut engine, &id));
        assert_eq!(engine.held_voices(), 0);
    }

    #[test]
    fn expire_into_releases_engine_voices() {
        let mut engine = PianoEngine::new(PianoConfig::default(), ());
        let mut router = InputRouter::new();
        router.key_down(&mut engine, InputId::keyboard('z'), c4());

        engine.advance(1.0);
        let expired = router.expire_into(&mut engine, 0.5);
        assert_eq!(expired.len(), 1);
        assert_eq!(engine.held_voices(), 0);
    }
}
