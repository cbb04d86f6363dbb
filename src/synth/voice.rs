use crate::{
    config::{PianoConfig, TEARDOWN_MARGIN},
    dsp::{
        envelope::{Envelope, EnvelopeState},
        oscillator::OscillatorWaveform,
    },
    graph::node::{GraphNode, RenderCtx},
    input::InputId,
    keyboard::Note,
    synth::timbre::Timbre,
    MAX_BLOCK_SIZE,
};

/// Per-voice gain at the top of the attack. Leaves headroom for chords.
pub const VOICE_PEAK: f32 = 0.3;

/// Engine-unique handle of a voice, used by teardown tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub u64);

/// Everything a voice needs to build its sound, resolved from the config
/// and the active timbre (preset overrides win).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceSettings {
    pub sample_rate: f32,
    pub waveform: OscillatorWaveform,
    pub timbre: Timbre,
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
    pub peak: f32,
}

impl VoiceSettings {
    pub fn resolve(config: &PianoConfig, timbre: Timbre) -> Self {
        let params = timbre.params();
        Self {
            sample_rate: config.sample_rate,
            waveform: config.waveform,
            timbre,
            attack: params.attack.unwrap_or(config.attack),
            decay: params.decay.unwrap_or(config.decay),
            sustain: params.sustain.unwrap_or(config.sustain),
            release: params.release.unwrap_or(config.release),
            peak: VOICE_PEAK,
        }
    }

    /// Time from note-on until the sustain level is reached.
    pub fn attack_decay(&self) -> f32 {
        self.attack + self.decay
    }
}

/// One sounding note.
///
/// A voice knows its note, when it started and who started it; it never
/// touches another voice. Lifecycle:
///
///   new ──start──→ sounding ──release──→ ringing out ──stop──→ silent
///
/// `release` and `stop` are both idempotent.
pub struct Voice {
    id: VoiceId,
    note: Note,
    owner: Option<InputId>,
    started_at: Option<f64>,
    teardown_at: Option<f64>,
    stopped: bool,

    graph: Option<Box<dyn GraphNode>>,
    amp: Envelope,
    ctx: RenderCtx,
    tone_buffer: Vec<f32>,
    env_buffer: Vec<f32>,
}

impl Voice {
    pub fn new(id: VoiceId, note: Note) -> Self {
        Self {
            id,
            note,
            owner: None,
            started_at: None,
            teardown_at: None,
            stopped: false,
            graph: None,
            amp: Envelope::new(),
            ctx: RenderCtx::from_freq(48_000.0, note.frequency as f32, 1.0),
            tone_buffer: vec![0.0; MAX_BLOCK_SIZE],
            env_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn with_owner(mut self, owner: InputId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Build the signal chain and trigger the attack at `now`.
    ///
    /// Starting a voice that was already started (or stopped) does nothing.
    pub fn start(&mut self, settings: &VoiceSettings, now: f64) {
        if self.started_at.is_some() || self.stopped {
            return;
        }

        self.ctx =
            RenderCtx::from_freq(settings.sample_rate, self.note.frequency as f32, 1.0).at(now);
        self.amp = Envelope::adsr(
            settings.attack,
            settings.decay,
            settings.sustain,
            settings.release,
        )
        .with_peak(settings.peak);

        let mut graph = settings.timbre.graph(settings.waveform, self.id.0);
        graph.note_on(&self.ctx);
        self.amp.note_on(&self.ctx);

        self.graph = Some(graph);
        self.started_at = Some(now);
    }

    /// Fade out from wherever the envelope is at `now` over `release_time`.
    ///
    /// Returns the teardown deadline on the first call; later calls, and
    /// calls on a voice that never started, return `None` and change nothing.
    pub fn release(&mut self, release_time: f32, now: f64) -> Option<f64> {
        if self.stopped || self.teardown_at.is_some() {
            return None;
        }
        if !self.amp.release_at(now, release_time) {
            return None;
        }

        if let Some(graph) = self.graph.as_mut() {
            graph.note_off(&self.ctx.at(now));
        }

        let deadline = now + (release_time.max(0.0) + TEARDOWN_MARGIN) as f64;
        self.teardown_at = Some(deadline);
        Some(deadline)
    }

    /// Drop the signal chain. Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.graph = None;
        self.amp.reset();
    }

    /// Add this voice's output for the block starting at `t0` into `out`.
    ///
    /// A voice that never started or has been stopped adds nothing.
    pub fn render(&mut self, out: &mut [f32], t0: f64) {
        let Some(graph) = self.graph.as_mut() else {
            return;
        };

        let ctx = self.ctx.at(t0);
        let frames = out.len().min(MAX_BLOCK_SIZE);
        let tone = &mut self.tone_buffer[..frames];
        let env = &mut self.env_buffer[..frames];

        tone.fill(0.0);
        env.fill(0.0);
        graph.render_block(tone, &ctx);
        self.amp.render(env, &ctx);

        for ((o, s), e) in out[..frames].iter_mut().zip(tone.iter()).zip(env.iter()) {
            *o += *s * *e;
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn note(&self) -> &Note {
        &self.note
    }

    pub fn owner(&self) -> Option<&InputId> {
        self.owner.as_ref()
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    /// Deadline set by the first release, if any.
    pub fn teardown_at(&self) -> Option<f64> {
        self.teardown_at
    }

    pub fn is_released(&self) -> bool {
        self.teardown_at.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Instantaneous amplitude at engine time `now`.
    pub fn amplitude_at(&self, now: f64) -> f32 {
        if self.stopped {
            return 0.0;
        }
        self.amp.level_at(now)
    }

    pub fn stage_at(&self, now: f64) -> EnvelopeState {
        if self.stopped {
            return EnvelopeState::Idle;
        }
        self.amp.stage_at(now)
    }

    pub fn release_time(&self) -> f32 {
        self.amp.release_time()
    }
}
