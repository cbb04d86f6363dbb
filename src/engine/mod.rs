//! The piano engine: one value that owns everything that sounds.
//!
//! ```text
//!  note_on / note_off ──→ VoicePool ──→ Voice (held, then ringing)
//!          │                                  ↑ Teardown tasks
//!          └─(armed)─→ Transport.capture      │
//!                                          Scheduler ←── advance / render_block
//!  play() ──→ Transport.play ──→ PlaybackNote / PlaybackRelease tasks
//! ```
//!
//! There is no global state. Time only moves when the host calls
//! [`PianoEngine::advance`] or [`PianoEngine::render_block`], so two engines
//! can run side by side and tests can step the clock exactly.

pub mod scheduler;

use crate::{
    config::{PianoConfig, PLAYBACK_HOLD},
    error::TransportError,
    input::InputId,
    keyboard::Note,
    synth::{
        pool::{NoteOn, Released, VoicePool},
        timbre::Timbre,
        voice::{Voice, VoiceId, VoiceSettings},
    },
    transport::{RecordedEvent, Transport, TransportState},
    MAX_BLOCK_SIZE,
};

use self::scheduler::{Scheduler, Task};

/// What the engine tells its host (key highlights, transport display).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PianoEvent {
    /// A voice started for `note`, live or replayed, at engine time `at`
    NoteStarted { note: Note, at: f64 },
    /// A voice for `note` began its release
    NoteReleased { note: Note },
    /// Transport state or the number of recorded events changed
    Transport {
        state: TransportState,
        recorded: usize,
    },
}

/// Receiver of [`PianoEvent`]s. Called from wherever the engine runs, which
/// in the binary is the audio callback: implementations must not block.
pub trait EngineListener {
    fn notify(&mut self, event: PianoEvent);
}

/// Discard every event.
impl EngineListener for () {
    fn notify(&mut self, _event: PianoEvent) {}
}

/// Collect events, mostly for tests.
impl EngineListener for Vec<PianoEvent> {
    fn notify(&mut self, event: PianoEvent) {
        self.push(event);
    }
}

#[cfg(feature = "rtrb")]
impl EngineListener for rtrb::Producer<PianoEvent> {
    fn notify(&mut self, event: PianoEvent) {
        // Full ring: the UI is behind, drop the event
        let _ = self.push(event);
    }
}

pub struct PianoEngine<L: EngineListener = ()> {
    config: PianoConfig,
    settings: VoiceSettings,
    pool: VoicePool,
    transport: Transport,
    scheduler: Scheduler,
    /// Replay voices, outside the pool's sustain semantics
    playback: Vec<Voice>,
    listener: L,
    now: f64,
    next_voice: u64,
}

impl<L: EngineListener> PianoEngine<L> {
    pub fn new(config: PianoConfig, listener: L) -> Self {
        log::info!(
            target: "piano::engine",
            "engine up: {} Hz, {} keys, {} voices, {} timbre",
            config.sample_rate,
            config.range.key_count,
            config.max_voices,
            config.timbre
        );

        Self {
            settings: VoiceSettings::resolve(&config, config.timbre),
            pool: VoicePool::new(config.max_voices),
            transport: Transport::new(),
            scheduler: Scheduler::new(),
            playback: Vec::new(),
            listener,
            now: 0.0,
            next_voice: 0,
            config,
        }
    }

    // ---- live input ----

    /// Start a held note for `id`. Returns false if `id` is already sounding.
    ///
    /// While recording, every note that actually starts is captured with the
    /// engine time in milliseconds.
    pub fn note_on(&mut self, id: InputId, note: Note) -> bool {
        let now = self.now;
        let voice_id = self.allocate_voice_id();
        let settings = self.settings;
        let owner = id.clone();

        let outcome = self.pool.note_on(id, now, move || {
            let mut voice = Voice::new(voice_id, note).with_owner(owner);
            voice.start(&settings, now);
            voice
        });

        let NoteOn::Started { evicted } = outcome else {
            return false;
        };

        if let Some(evicted) = evicted {
            self.retired(evicted);
        }
        self.listener.notify(PianoEvent::NoteStarted { note, at: now });

        if self.transport.is_armed() {
            let timestamp_ms = (now * 1000.0).round() as i64;
            match self.transport.capture(note, timestamp_ms) {
                Ok(()) => self.notify_transport(),
                Err(err) => log::debug!(target: "piano::engine", "capture skipped: {err}"),
            }
        }
        true
    }

    /// Release the note held by `id`. Unknown ids are ignored.
    pub fn note_off(&mut self, id: &InputId) -> bool {
        match self.pool.note_off(id, self.now) {
            Some(released) => {
                self.retired(released);
                true
            }
            None => false,
        }
    }

    /// Release every held note.
    pub fn all_notes_off(&mut self) {
        for released in self.pool.release_all(self.now) {
            self.retired(released);
        }
    }

    // ---- transport ----

    /// Start a new take. False (and nothing changes) unless idle.
    pub fn arm(&mut self) -> bool {
        let result = self.transport.arm();
        self.transport_result("arm", result)
    }

    /// Stop recording and keep the take.
    pub fn disarm(&mut self) -> bool {
        let result = self.transport.disarm();
        self.transport_result("disarm", result)
    }

    /// Record button: arm when idle, disarm when armed, ignored while playing.
    pub fn toggle_recording(&mut self) -> bool {
        match self.transport.state() {
            TransportState::Armed => self.disarm(),
            _ => self.arm(),
        }
    }

    /// Replay the take from now. Each step waits its recorded gap after the
    /// previous one, then plays a fixed-length note.
    pub fn play(&mut self) -> bool {
        let steps = match self.transport.play() {
            Ok(steps) => steps,
            Err(err) => {
                log::debug!(target: "piano::engine", "play ignored: {err}");
                return false;
            }
        };

        let mut at = self.now;
        for step in &steps {
            at += step.delay_ms.max(0) as f64 / 1000.0;
            self.scheduler.schedule(at, Task::PlaybackNote(step.note));
        }
        self.scheduler
            .schedule(at + self.playback_hold(), Task::PlaybackFinished);

        self.notify_transport();
        true
    }

    /// Abandon a replay: pending steps are dropped, sounding replay voices
    /// fade out.
    pub fn stop_playback(&mut self) -> bool {
        if let Err(err) = self.transport.stop() {
            log::debug!(target: "piano::engine", "stop ignored: {err}");
            return false;
        }

        self.scheduler
            .retain(|task| !matches!(task, Task::PlaybackNote(_) | Task::PlaybackFinished));

        let now = self.now;
        let mut released = Vec::new();
        for voice in self.playback.iter_mut() {
            if let Some(deadline) = voice.release(voice.release_time(), now) {
                released.push((voice.id(), *voice.note(), deadline));
            }
        }
        for (id, note, deadline) in released {
            self.scheduler.schedule(deadline, Task::Teardown(id));
            self.listener.notify(PianoEvent::NoteReleased { note });
        }

        self.notify_transport();
        true
    }

    /// Drop the take. Only while idle.
    pub fn clear_recording(&mut self) -> bool {
        let result = self.transport.clear();
        self.transport_result("clear", result)
    }

    // ---- clock ----

    /// Move the clock forward by `seconds`, running every task that falls
    /// due on the way at its own due time.
    pub fn advance(&mut self, seconds: f64) {
        let target = self.now + seconds.max(0.0);
        self.run_due(target);
        self.now = target;
    }

    /// Render mono audio into `out`, moving the clock by `out.len()` samples.
    ///
    /// The block is split wherever a task falls due, so replay steps and
    /// teardowns land on the sample they belong to.
    pub fn render_block(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let sample_rate = self.config.sample_rate as f64;

        let mut offset = 0;
        while offset < out.len() {
            self.run_due(self.now);

            let mut frames = (out.len() - offset).min(MAX_BLOCK_SIZE);
            if let Some(due) = self.scheduler.next_due() {
                let until_due = ((due - self.now) * sample_rate).ceil().max(1.0) as usize;
                frames = frames.min(until_due);
            }

            let chunk = &mut out[offset..offset + frames];
            self.pool.render(chunk, self.now);
            for voice in self.playback.iter_mut() {
                voice.render(chunk, self.now);
            }

            self.now += frames as f64 / sample_rate;
            offset += frames;
        }

        let volume = self.config.volume;
        for sample in out.iter_mut() {
            *sample = (*sample * volume).clamp(-1.0, 1.0);
        }
    }

    // ---- settings ----

    pub fn set_volume(&mut self, volume: f32) {
        self.config.volume = volume.clamp(0.0, 1.0);
    }

    pub fn volume(&self) -> f32 {
        self.config.volume
    }

    /// Switch preset. Voices already sounding keep the old one.
    pub fn set_timbre(&mut self, timbre: Timbre) {
        self.config.timbre = timbre;
        self.settings = VoiceSettings::resolve(&self.config, timbre);
        log::debug!(target: "piano::engine", "timbre -> {timbre}");
    }

    pub fn cycle_timbre(&mut self) -> Timbre {
        let next = self.config.timbre.next();
        self.set_timbre(next);
        next
    }

    pub fn timbre(&self) -> Timbre {
        self.config.timbre
    }

    // ---- inspection ----

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn config(&self) -> &PianoConfig {
        &self.config
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn recording(&self) -> &[RecordedEvent] {
        self.transport.sequence()
    }

    /// Voices held by live input (the polyphony-capped set).
    pub fn held_voices(&self) -> usize {
        self.pool.len()
    }

    pub fn is_held(&self, id: &InputId) -> bool {
        self.pool.contains(id)
    }

    /// Released live voices still fading out.
    pub fn ringing_voices(&self) -> usize {
        self.pool.ringing_len()
    }

    pub fn playback_voices(&self) -> usize {
        self.playback.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.len()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    // ---- internals ----

    fn allocate_voice_id(&mut self) -> VoiceId {
        self.next_voice += 1;
        VoiceId(self.next_voice)
    }

    fn playback_hold(&self) -> f64 {
        (self.settings.attack_decay() + PLAYBACK_HOLD) as f64
    }

    fn retired(&mut self, released: Released) {
        if let Some(deadline) = released.teardown_at {
            self.scheduler.schedule(deadline, Task::Teardown(released.voice));
        }
        self.listener.notify(PianoEvent::NoteReleased {
            note: released.note,
        });
    }

    fn run_due(&mut self, until: f64) {
        while let Some((due, task)) = self.scheduler.pop_due(until) {
            self.now = self.now.max(due);
            self.run_task(task);
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Teardown(id) => {
                if !self.pool.teardown(id) {
                    if let Some(idx) = self.playback.iter().position(|v| v.id() == id) {
                        let mut voice = self.playback.swap_remove(idx);
                        voice.stop();
                    }
                }
            }
            Task::PlaybackNote(note) => {
                let id = self.allocate_voice_id();
                let mut voice = Voice::new(id, note);
                voice.start(&self.settings, self.now);
                self.playback.push(voice);

                let release_at = self.now + self.playback_hold();
                self.scheduler.schedule(release_at, Task::PlaybackRelease(id));
                self.listener.notify(PianoEvent::NoteStarted {
                    note,
                    at: self.now,
                });
            }
            Task::PlaybackRelease(id) => {
                let now = self.now;
                let Some(voice) = self.playback.iter_mut().find(|v| v.id() == id) else {
                    return;
                };
                if let Some(deadline) = voice.release(voice.release_time(), now) {
                    let note = *voice.note();
                    self.scheduler.schedule(deadline, Task::Teardown(id));
                    self.listener.notify(PianoEvent::NoteReleased { note });
                }
            }
            Task::PlaybackFinished => {
                if self.transport.finish().is_ok() {
                    log::debug!(target: "piano::engine", "playback finished");
                    self.notify_transport();
                }
            }
        }
    }

    fn transport_result(&mut self, op: &str, result: Result<(), TransportError>) -> bool {
        match result {
            Ok(()) => {
                self.notify_transport();
                true
            }
            Err(err) => {
                log::debug!(target: "piano::engine", "{op} ignored: {err}");
                false
            }
        }
    }

    fn notify_transport(&mut self) {
        self.listener.notify(PianoEvent::Transport {
            state: self.transport.state(),
            recorded: self.transport.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::KeyRange;

    fn key(index: usize) -> Note {
        KeyRange::THREE_OCTAVES.note_at(index).expect("key in range")
    }

    fn engine() -> PianoEngine<Vec<PianoEvent>> {
        PianoEngine::new(PianoConfig::default(), Vec::new())
    }

    #[test]
    fn note_on_is_idempotent_per_id() {
        let mut engine = engine();
        let id = InputId::mouse(&key(0));

        assert!(engine.note_on(id.clone(), key(0)));
        assert!(!engine.note_on(id.clone(), key(0)));
        assert_eq!(engine.held_voices(), 1);

        let starts = engine
            .listener()
            .iter()
            .filter(|e| matches!(e, PianoEvent::NoteStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn same_note_from_two_sources_gets_two_voices() {
        let mut engine = engine();
        let note = key(4);
        engine.note_on(InputId::mouse(&note), note);
        engine.note_on(InputId::keyboard('e'), note);
        assert_eq!(engine.held_voices(), 2);

        engine.note_off(&InputId::mouse(&note));
        assert!(engine.is_held(&InputId::keyboard('e')));
    }

    #[test]
    fn released_voice_is_torn_down_after_its_tail() {
        let mut engine = engine();
        let id = InputId::keyboard('z');
        engine.note_on(id.clone(), key(0));
        engine.advance(0.5);

        assert!(engine.note_off(&id));
        assert!(!engine.note_off(&id));
        assert_eq!(engine.ringing_voices(), 1);

        engine.advance(0.1);
        assert_eq!(engine.ringing_voices(), 1, "still inside the release tail");

        engine.advance(2.0);
        assert_eq!(engine.ringing_voices(), 0);
        assert_eq!(engine.pending_tasks(), 0);
    }

    #[test]
    fn capture_only_while_armed_and_only_on_start() {
        let mut engine = engine();
        engine.note_on(InputId::keyboard('z'), key(0));
        assert!(engine.recording().is_empty());

        assert!(engine.arm());
        engine.advance(0.25);
        engine.note_on(InputId::keyboard('x'), key(2));
        engine.note_on(InputId::keyboard('x'), key(2));
        assert!(engine.disarm());

        let take = engine.recording();
        assert_eq!(take.len(), 1);
        assert_eq!(take[0].timestamp_ms, 250);
    }

    #[test]
    fn transport_errors_are_silent() {
        let mut engine = engine();
        assert!(!engine.play(), "nothing recorded");
        assert!(!engine.disarm());
        assert!(!engine.stop_playback());
        assert_eq!(engine.transport_state(), TransportState::Idle);
    }

    #[test]
    fn playback_replays_and_returns_to_idle() {
        let mut engine = engine();
        engine.arm();
        engine.note_on(InputId::keyboard('z'), key(0));
        engine.advance(0.2);
        engine.note_on(InputId::keyboard('x'), key(2));
        engine.disarm();
        engine.all_notes_off();

        assert!(engine.play());
        assert_eq!(engine.transport_state(), TransportState::Playing);
        assert!(!engine.clear_recording(), "cannot clear while playing");

        engine.advance(0.0);
        assert_eq!(engine.playback_voices(), 1);
        engine.advance(0.2);
        assert_eq!(engine.playback_voices(), 2);

        engine.advance(5.0);
        assert_eq!(engine.transport_state(), TransportState::Idle);
        assert_eq!(engine.playback_voices(), 0);
        assert_eq!(engine.recording().len(), 2);
    }

    #[test]
    fn stop_playback_drops_pending_steps() {
        let mut engine = engine();
        engine.arm();
        for (i, gap) in [0.0, 0.5, 0.5].into_iter().enumerate() {
            engine.advance(gap);
            engine.note_on(InputId::keyboard('a'), key(i));
            engine.note_off(&InputId::keyboard('a'));
        }
        engine.disarm();

        engine.play();
        engine.advance(0.1);
        assert!(engine.stop_playback());
        assert_eq!(engine.transport_state(), TransportState::Idle);

        engine.advance(5.0);
        assert_eq!(engine.playback_voices(), 0);
        let started_after_stop = engine
            .listener()
            .iter()
            .filter(|e| matches!(e, PianoEvent::NoteStarted { at, .. } if *at > 1.1))
            .count();
        assert_eq!(started_after_stop, 0);
    }

    #[test]
    fn volume_is_clamped_and_output_stays_in_range() {
        let mut engine = engine();
        engine.set_volume(4.0);
        assert_eq!(engine.volume(), 1.0);
        engine.set_volume(-1.0);
        assert_eq!(engine.volume(), 0.0);

        engine.set_volume(1.0);
        for i in 0..10 {
            engine.note_on(InputId::keyboard(char::from(b'a' + i as u8)), key(i));
        }
        let mut block = vec![0.0f32; 4096];
        engine.render_block(&mut block);
        assert!(block.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(block.iter().any(|s| s.abs() > 0.01));
    }

    #[test]
    fn render_moves_the_clock() {
        let mut engine = engine();
        let mut block = vec![0.0f32; 480];
        engine.render_block(&mut block);
        assert!((engine.now() - 0.01).abs() < 1e-9);
        assert!(block.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn timbre_change_applies_to_new_voices() {
        let mut engine = engine();
        assert_eq!(engine.timbre(), Timbre::Classic);
        assert_eq!(engine.cycle_timbre(), Timbre::Grand);
        engine.set_timbre(Timbre::Organ);
        assert_eq!(engine.config().timbre, Timbre::Organ);
    }

    #[test]
    fn engines_are_independent() {
        let mut a = engine();
        let b = engine();
        a.note_on(InputId::keyboard('q'), key(12));
        a.arm();
        assert_eq!(a.held_voices(), 1);
        assert_eq!(b.held_voices(), 0);
        assert_eq!(b.transport_state(), TransportState::Idle);
    }
}
