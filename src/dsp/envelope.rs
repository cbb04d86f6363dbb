use crate::{graph::node::RenderCtx, MIN_TIME};

/*
ADSR Envelope on a Time Axis
============================

This envelope is evaluated from absolute time rather than stepped sample by
sample. A note-on pins the attack to a start time; a note-off pins the release
to a release time and captures the level at that instant. Everything else is
a closed-form function of `t`, so the same envelope answers "what is the
amplitude right now?" for the control side and fills sample buffers for the
audio side.

Vocabulary
----------

  peak        Level reached at the end of the attack (usually the voice gain).

  floor       A tiny non-zero level (-80 dB). Exponential ramps cannot start
              or end at exactly zero, so attacks start here and releases aim
              here before snapping to silence.

  target      sustain_level * peak: where the decay settles.


The Shape
---------

  Level
   peak ┐     ╱╲
        │    ╱  ╲_
   S*pk │   ╱     ╲__________
        │  ╱                 ╲_
  floor └─╱────────────────────╲___→ Time
        Attack Decay  Sustain  Release
         lin    exp             exp

  Attack   linear   floor → peak over attack_time
  Decay    exp      peak → target over decay_time (linear when target is 0)
  Sustain  hold     exactly target until note-off
  Release  exp      captured level → floor over release_time, then 0


The Math
--------

Exponential ramp from `a` to `b` over `T` seconds, `p = elapsed / T`:

    level = a * (b / a)^p

At p = 0 this is `a`, at p = 1 it is `b`, and in between the ratio between
successive samples is constant, which is what the ear hears as an even fade.


Why Capture at Release
----------------------

note_off can land in any stage. If release always started from the sustain
level, releasing mid-attack (level 0.2, sustain 0.7) would jump up to 0.7 and
click. Capturing `level_at(now)` makes the release start exactly where the
signal already is.

    ┌──────┐ note_on  ┌────────┐ t=A ┌───────┐ t=A+D ┌─────────┐
    │ Idle │ ───────→ │ Attack │ ──→ │ Decay │ ────→ │ Sustain │
    └──────┘          └────────┘     └───────┘       └─────────┘
        ↑                  │ note_off     │ note_off      │ note_off
        │                  ↓              ↓               ↓
        │   t=R end   ┌─────────────────────────────────────┐
        └──────────── │ Release (from captured level)       │
                      └─────────────────────────────────────┘
*/

/// Lowest level an exponential ramp is allowed to touch (-80 dB).
pub const ENVELOPE_FLOOR: f32 = 0.0001;

/// The current stage of the envelope state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeState {
    Idle,    // Not triggered, or release has finished
    Attack,  // Linear ramp up to peak
    Decay,   // Exponential ramp down to sustain
    Sustain, // Holding until release
    Release, // Exponential ramp from captured level to silence
}

#[derive(Debug, Clone, Copy)]
struct ReleaseRamp {
    start: f64,
    from: f32,
    duration: f32,
}

#[derive(Debug, Clone)]
pub struct Envelope {
    // ADSR parameters
    attack_time: f32,   // seconds, floor → peak
    decay_time: f32,    // seconds, peak → sustain
    sustain_level: f32, // fraction of peak (0.0 - 1.0)
    release_time: f32,  // seconds, captured → silence
    peak: f32,

    // Automation pinned to the time axis
    gate_on: Option<f64>,
    release: Option<ReleaseRamp>,

    // Last evaluated point, for inspection between renders
    last_time: f64,
    level: f32,
}

impl Envelope {
    pub fn new() -> Self {
        Self::adsr(0.01, 0.1, 0.7, 0.3)
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack_time: attack.max(MIN_TIME),
            decay_time: decay.max(MIN_TIME),
            sustain_level: sustain.clamp(0.0, 1.0),
            release_time: release.max(MIN_TIME),
            peak: 1.0,
            gate_on: None,
            release: None,
            last_time: 0.0,
            level: 0.0,
        }
    }

    /// Scale the whole curve so the attack tops out at `peak`.
    pub fn with_peak(mut self, peak: f32) -> Self {
        self.peak = peak.max(0.0);
        self
    }

    /// Gate high at `ctx.time`: schedule attack and decay from there.
    ///
    /// Retriggering drops any release in flight.
    pub fn note_on(&mut self, ctx: &RenderCtx) {
        self.gate_on = Some(ctx.time);
        self.release = None;
        self.last_time = ctx.time;
        self.level = self.level_at(ctx.time);
    }

    /// Gate low at `ctx.time` using the configured release time.
    pub fn note_off(&mut self, ctx: &RenderCtx) {
        self.release_at(ctx.time, self.release_time);
    }

    /// Cancel whatever automation is pending after `now`, capture the level
    /// at `now`, and fade from there over `duration` seconds.
    ///
    /// Returns false (and changes nothing) if the envelope was never started
    /// or is already releasing.
    pub fn release_at(&mut self, now: f64, duration: f32) -> bool {
        if self.gate_on.is_none() || self.release.is_some() {
            return false;
        }

        let from = self.level_at(now);
        self.release = Some(ReleaseRamp {
            start: now,
            from,
            duration: duration.max(MIN_TIME),
        });
        self.last_time = now;
        self.level = from;
        true
    }

    /// Amplitude at absolute time `t`.
    pub fn level_at(&self, t: f64) -> f32 {
        let Some(gate_on) = self.gate_on else {
            return 0.0;
        };

        if let Some(ramp) = self.release {
            if t >= ramp.start {
                return Self::release_level(ramp, t);
            }
        }

        self.held_level((t - gate_on).max(0.0) as f32)
    }

    /// Stage at absolute time `t`.
    pub fn stage_at(&self, t: f64) -> EnvelopeState {
        let Some(gate_on) = self.gate_on else {
            return EnvelopeState::Idle;
        };

        if let Some(ramp) = self.release {
            if t >= ramp.start {
                let elapsed = (t - ramp.start) as f32;
                return if elapsed >= ramp.duration {
                    EnvelopeState::Idle
                } else {
                    EnvelopeState::Release
                };
            }
        }

        let elapsed = (t - gate_on).max(0.0) as f32;
        if elapsed < self.attack_time {
            EnvelopeState::Attack
        } else if elapsed < self.attack_time + self.decay_time {
            EnvelopeState::Decay
        } else {
            EnvelopeState::Sustain
        }
    }

    /// Level while the gate is high, `elapsed` seconds after note-on.
    fn held_level(&self, elapsed: f32) -> f32 {
        let target = self.sustain_level * self.peak;

        if elapsed < self.attack_time {
            let progress = elapsed / self.attack_time;
            return ENVELOPE_FLOOR + (self.peak - ENVELOPE_FLOOR) * progress;
        }

        let decay_elapsed = elapsed - self.attack_time;
        if decay_elapsed >= self.decay_time {
            return target;
        }

        let progress = decay_elapsed / self.decay_time;
        if target > ENVELOPE_FLOOR && self.peak > ENVELOPE_FLOOR {
            self.peak * (target / self.peak).powf(progress)
        } else {
            // Exponential ramps can't reach zero; fall back to linear
            self.peak + (target - self.peak) * progress
        }
    }

    fn release_level(ramp: ReleaseRamp, t: f64) -> f32 {
        let elapsed = (t - ramp.start) as f32;
        if elapsed >= ramp.duration {
            return 0.0;
        }

        let progress = elapsed / ramp.duration;
        if ramp.from > ENVELOPE_FLOOR {
            ramp.from * (ENVELOPE_FLOOR / ramp.from).powf(progress)
        } else {
            ramp.from * (1.0 - progress)
        }
    }

    /// Render a block of envelope values starting at `ctx.time`.
    pub fn render(&mut self, buffer: &mut [f32], ctx: &RenderCtx) {
        let dt = 1.0 / ctx.sample_rate as f64;
        for (i, sample) in buffer.iter_mut().enumerate() {
            let t = ctx.time + i as f64 * dt;
            *sample = self.level_at(t);
        }

        if let Some(&last) = buffer.last() {
            self.last_time = ctx.time + (buffer.len() - 1) as f64 * dt;
            self.level = last;
        }
    }

    /// True once triggered, until the release has fully elapsed at `t`.
    pub fn is_active_at(&self, t: f64) -> bool {
        !matches!(self.stage_at(t), EnvelopeState::Idle)
    }

    /// Active as of the last evaluated point.
    pub fn is_active(&self) -> bool {
        self.is_active_at(self.last_time)
    }

    pub fn is_releasing(&self) -> bool {
        self.release.is_some()
    }

    /// Reset to idle state.
    pub fn reset(&mut self) {
        self.gate_on = None;
        self.release = None;
        self.level = 0.0;
    }

    /// Level at the last evaluated point
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Stage at the last evaluated point
    pub fn state(&self) -> EnvelopeState {
        self.stage_at(self.last_time)
    }

    pub fn attack_time(&self) -> f32 {
        self.attack_time
    }

    pub fn decay_time(&self) -> f32 {
        self.decay_time
    }

    pub fn release_time(&self) -> f32 {
        self.release_time
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 1_000.0;

    fn ctx_at(time: f64) -> RenderCtx {
        RenderCtx::from_freq(SAMPLE_RATE, 440.0, 1.0).at(time)
    }

    #[test]
    fn attack_reaches_peak() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.7, 0.2).with_peak(0.5);
        env.note_on(&ctx_at(2.0));

        assert!(env.level_at(2.0) <= ENVELOPE_FLOOR * 1.01);
        assert!((env.level_at(2.01) - 0.5).abs() < 1e-4);
        assert_eq!(env.stage_at(2.005), EnvelopeState::Attack);
    }

    #[test]
    fn sustain_is_exact_after_attack_and_decay() {
        let sustain = 0.6;
        let mut env = Envelope::adsr(0.01, 0.05, sustain, 0.2);
        env.note_on(&ctx_at(0.0));

        assert_eq!(env.stage_at(0.03), EnvelopeState::Decay);
        for t in [0.061, 0.5, 10.0] {
            assert_eq!(env.stage_at(t), EnvelopeState::Sustain);
            assert_eq!(env.level_at(t), sustain);
        }
    }

    #[test]
    fn decay_is_monotonic() {
        let mut env = Envelope::adsr(0.01, 0.1, 0.3, 0.2);
        env.note_on(&ctx_at(0.0));

        let mut previous = env.level_at(0.01);
        for step in 1..=100 {
            let level = env.level_at(0.01 + step as f64 * 0.001);
            assert!(level <= previous + 1e-6);
            previous = level;
        }
    }

    #[test]
    fn release_starts_from_current_level() {
        let mut env = Envelope::adsr(0.1, 0.1, 0.7, 0.3);
        env.note_on(&ctx_at(0.0));

        // Mid-attack: level is ~0.5, well below sustain
        let before = env.level_at(0.05);
        assert!(env.release_at(0.05, 0.3));
        let after = env.level_at(0.05);

        assert!((before - after).abs() < 1e-6, "release must not jump");
        assert!(env.level_at(0.06) < before);
    }

    #[test]
    fn release_falls_to_silence() {
        let release = 0.03;
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, release);
        env.note_on(&ctx_at(0.0));
        env.note_off(&ctx_at(0.2));

        assert_eq!(env.stage_at(0.21), EnvelopeState::Release);
        assert_eq!(env.level_at(0.2 + release as f64), 0.0);
        assert!(!env.is_active_at(0.25));
    }

    #[test]
    fn second_release_is_ignored() {
        let mut env = Envelope::adsr(0.01, 0.05, 0.5, 0.1);
        env.note_on(&ctx_at(0.0));

        assert!(env.release_at(0.5, 0.1));
        let mid = env.level_at(0.55);
        assert!(!env.release_at(0.55, 2.0));
        assert_eq!(env.level_at(0.55), mid);
    }

    #[test]
    fn untriggered_envelope_is_silent() {
        let mut env = Envelope::new();
        assert!(!env.release_at(0.0, 0.1));
        assert_eq!(env.level_at(1.0), 0.0);
        assert_eq!(env.stage_at(1.0), EnvelopeState::Idle);
    }

    #[test]
    fn render_samples_the_time_axis() {
        let mut env = Envelope::adsr(0.01, 0.01, 1.0, 0.1);
        env.note_on(&ctx_at(0.0));

        let mut buffer = vec![0.0; 30];
        env.render(&mut buffer, &ctx_at(0.0));

        assert!(buffer[0] < buffer[5]);
        assert!((buffer[25] - 1.0).abs() < 1e-6);
        assert_eq!(env.state(), EnvelopeState::Sustain);
    }
}
