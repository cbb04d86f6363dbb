//! Audio + terminal setup: one engine shared by the cpal callback and the UI

use std::{
    io,
    sync::{Arc, Mutex},
};

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossterm::{
    event::{
        DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::supports_keyboard_enhancement,
};
use rtrb::{Producer, RingBuffer};
use saavy_piano::{PianoConfig, PianoEngine, PianoEvent, MAX_BLOCK_SIZE};

use crate::ui::UiApp;

/// Engine as shared between the audio callback and the UI thread
pub type SharedEngine = Arc<Mutex<PianoEngine<Producer<PianoEvent>>>>;

/// Engine → UI event ring capacity
const EVENT_RING: usize = 1024;
/// Audio → oscilloscope ring capacity (samples)
const SCOPE_RING: usize = 8192;

pub struct PianoApp {
    config: PianoConfig,
}

impl PianoApp {
    pub fn new(config: PianoConfig) -> Self {
        Self { config }
    }

    /// Open the default output device, start the engine and run the UI
    /// until the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;
        log::info!(
            "output: {} ({} Hz, {} channels)",
            device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels
        );

        let config = self.config.with_sample_rate(sample_rate);
        let range = config.range;

        let (event_tx, event_rx) = RingBuffer::<PianoEvent>::new(EVENT_RING);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING);
        let engine: SharedEngine = Arc::new(Mutex::new(PianoEngine::new(config, event_tx)));

        let audio_engine = engine.clone();
        let mut render_buf = vec![0.0f32; MAX_BLOCK_SIZE];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _| {
                let Ok(mut engine) = audio_engine.lock() else {
                    data.fill(0.0);
                    return;
                };

                let total_frames = data.len() / channels;
                let mut frames_written = 0;
                while frames_written < total_frames {
                    let frames = (total_frames - frames_written).min(MAX_BLOCK_SIZE);
                    let block = &mut render_buf[..frames];
                    engine.render_block(block);

                    // Copy to output (mono to all channels)
                    let out_off = frames_written * channels;
                    for (i, &s) in block.iter().enumerate() {
                        for ch in 0..channels {
                            data[out_off + i * channels + ch] = s;
                        }
                        // Scope is best effort; drop samples when the UI lags
                        let _ = scope_tx.push(s);
                    }

                    frames_written += frames;
                }
            },
            |err| log::error!("audio stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let mut terminal = ratatui::init();
        let key_releases = enter_input_modes().unwrap_or_else(|err| {
            log::warn!("could not enable terminal input modes: {err}");
            false
        });
        if !key_releases {
            log::info!("terminal does not report key releases; using repeat timeout");
        }

        let result = UiApp::new(engine, range, event_rx, scope_rx, key_releases).run(&mut terminal);

        leave_input_modes(key_releases);
        ratatui::restore();
        drop(stream);
        result
    }
}

/// Mouse capture, focus reports and, where the terminal supports it, key
/// release events. Returns whether key releases will be reported.
fn enter_input_modes() -> EyreResult<bool> {
    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    execute!(io::stdout(), EnableMouseCapture, EnableFocusChange)?;

    Ok(enhanced
        && execute!(
            io::stdout(),
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .is_ok())
}

fn leave_input_modes(key_releases: bool) {
    if key_releases {
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
    }
    let _ = execute!(io::stdout(), DisableMouseCapture, DisableFocusChange);
}
