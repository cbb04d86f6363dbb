//! TUI module for the piano
//!
//! Draws the keyboard, transport bar and oscilloscope, and turns terminal
//! key and mouse events into engine calls through an [`InputRouter`].

mod keyboard;
mod transport;
mod waveform;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::Consumer;
use saavy_piano::{InputId, InputRouter, KeyRange, Note, PianoEvent, TransportState};

use crate::{app::SharedEngine, keymap};

use keyboard::{render_keyboard, KeyboardLayout};
use transport::{render_transport, AudioStats, TransportView};
use waveform::render_waveform;

/// Audio visualization buffer size
const VIS_BUFFER_SIZE: usize = 1024;

/// Without key-release reports, a key counts as lifted once it has not
/// repeated for this long (seconds). Must outlast the terminal's initial
/// auto-repeat delay.
const STALE_KEY_HOLD: f64 = 0.6;

const VOLUME_STEP: f32 = 0.05;

/// UI application state
pub struct UiApp {
    engine: SharedEngine,
    router: InputRouter,
    range: KeyRange,
    /// Engine events (key highlights, transport changes)
    event_rx: Consumer<PianoEvent>,
    /// Ring buffer receiver for audio samples
    audio_rx: Consumer<f32>,
    audio_buffer: Vec<f32>,
    /// Sounding voices per key
    lit: Vec<u8>,
    transport: TransportState,
    recorded: usize,
    show_labels: bool,
    /// Terminal reports key releases (keyboard enhancement active)
    key_releases: bool,
    mouse_key: Option<InputId>,
    layout: Option<KeyboardLayout>,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        engine: SharedEngine,
        range: KeyRange,
        event_rx: Consumer<PianoEvent>,
        audio_rx: Consumer<f32>,
        key_releases: bool,
    ) -> Self {
        Self {
            engine,
            router: InputRouter::new(),
            range,
            event_rx,
            audio_rx,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            lit: vec![0; range.key_count],
            transport: TransportState::Idle,
            recorded: 0,
            show_labels: true,
            key_releases,
            mouse_key: None,
            layout: None,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_events();

            if !self.key_releases {
                self.expire_stale_keys();
            }

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                match event::read()? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    Event::FocusLost => self.release_everything(),
                    _ => {}
                }
            }
        }

        self.release_everything();
        Ok(())
    }

    /// Poll for new audio samples from ring buffer
    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.audio_rx.pop() {
            self.audio_buffer.push(sample);
            received = true;
        }

        if received && self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
        }
    }

    fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.pop() {
            match event {
                PianoEvent::NoteStarted { note, .. } => {
                    if let Some(count) = self
                        .range
                        .index_of(note.name, note.octave)
                        .and_then(|i| self.lit.get_mut(i))
                    {
                        *count = count.saturating_add(1);
                    }
                }
                PianoEvent::NoteReleased { note } => {
                    if let Some(count) = self
                        .range
                        .index_of(note.name, note.octave)
                        .and_then(|i| self.lit.get_mut(i))
                    {
                        *count = count.saturating_sub(1);
                    }
                }
                PianoEvent::Transport { state, recorded } => {
                    self.transport = state;
                    self.recorded = recorded;
                }
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            if let KeyCode::Char(c) = key.code {
                self.release_char(c);
            }
            return;
        }

        let Ok(mut engine) = self.engine.lock() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::F(1) => {
                engine.toggle_recording();
            }
            KeyCode::F(2) => {
                engine.play();
            }
            KeyCode::F(3) => {
                engine.stop_playback();
            }
            KeyCode::F(4) => {
                engine.clear_recording();
            }
            KeyCode::Tab => {
                let timbre = engine.cycle_timbre();
                log::info!("timbre: {timbre}");
            }
            KeyCode::Char('+') => {
                let volume = engine.volume() + VOLUME_STEP;
                engine.set_volume(volume);
            }
            KeyCode::Char('-') => {
                let volume = engine.volume() - VOLUME_STEP;
                engine.set_volume(volume);
            }
            KeyCode::Char(' ') => self.show_labels = !self.show_labels,
            KeyCode::Char(c) => {
                if let Some(note) = keymap::key_index(c).and_then(|i| self.range.note_at(i)) {
                    self.router.key_down(&mut engine, InputId::keyboard(c), note);
                }
            }
            _ => {}
        }
    }

    fn release_char(&mut self, c: char) {
        let Ok(mut engine) = self.engine.lock() else {
            return;
        };
        for alias in keymap::release_aliases(c) {
            self.router.key_up(&mut engine, &InputId::keyboard(alias));
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let under = self
            .layout
            .as_ref()
            .and_then(|layout| layout.hit_test(mouse.column, mouse.row))
            .and_then(|i| self.range.note_at(i));

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.mouse_up();
                if let Some(note) = under {
                    self.mouse_down(InputId::mouse(&note), note);
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let id = under.map(|note| (InputId::mouse(&note), note));
                if id.as_ref().map(|(id, _)| id) != self.mouse_key.as_ref() {
                    // Slid off the key (or onto another one)
                    self.mouse_up();
                    if let Some((id, note)) = id {
                        self.mouse_down(id, note);
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.mouse_up(),
            _ => {}
        }
    }

    // The mouse reports real down/up events, so it bypasses the router's
    // repeat and expiry handling and talks to the engine directly.
    fn mouse_down(&mut self, id: InputId, note: Note) {
        let Ok(mut engine) = self.engine.lock() else {
            return;
        };
        engine.note_on(id.clone(), note);
        self.mouse_key = Some(id);
    }

    fn mouse_up(&mut self) {
        let Some(id) = self.mouse_key.take() else {
            return;
        };
        if let Ok(mut engine) = self.engine.lock() {
            engine.note_off(&id);
        }
    }

    fn expire_stale_keys(&mut self) {
        if self.router.is_empty() {
            return;
        }
        if let Ok(mut engine) = self.engine.lock() {
            for id in self.router.expire_into(&mut engine, STALE_KEY_HOLD) {
                log::debug!("{id} stopped repeating, released");
            }
        }
    }

    fn release_everything(&mut self) {
        self.mouse_up();
        if let Ok(mut engine) = self.engine.lock() {
            self.router.release_all(&mut engine);
        }
    }

    fn transport_view(&self) -> Option<TransportView> {
        let engine = self.engine.lock().ok()?;
        Some(TransportView {
            state: self.transport,
            recorded: self.recorded,
            timbre: engine.timbre(),
            volume: engine.volume(),
            voices: engine.held_voices() + engine.playback_voices(),
            sample_rate: engine.config().sample_rate,
        })
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Transport bar
                Constraint::Min(8),    // Keyboard
                Constraint::Length(8), // Oscilloscope
                Constraint::Length(1), // Help bar
            ])
            .split(frame.area());

        if let Some(view) = self.transport_view() {
            let stats = AudioStats::from_buffer(&self.audio_buffer);
            render_transport(frame, chunks[0], &view, &stats);
        }

        let lit: Vec<bool> = self.lit.iter().map(|&n| n > 0).collect();
        self.layout = Some(render_keyboard(
            frame,
            chunks[1],
            &self.range,
            &lit,
            self.show_labels,
        ));

        render_waveform(frame, chunks[2], &self.audio_buffer);

        let help = Paragraph::new(
            " [z..m q..u Z..M] Keys  [F1] Rec  [F2] Play  [F3] Stop  [F4] Clear  \
             [Tab] Timbre  [+/-] Vol  [Space] Labels  [Esc] Quit",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[3]);
    }
}
