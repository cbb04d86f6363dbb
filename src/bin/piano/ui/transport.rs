//! Transport bar widget - record/play state, take length, timbre, levels

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_piano::{synth::Timbre, TransportState};

/// Audio statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    /// Compute audio stats from a buffer
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

/// What the transport bar shows; refreshed every frame.
pub struct TransportView {
    pub state: TransportState,
    pub recorded: usize,
    pub timbre: Timbre,
    pub volume: f32,
    pub voices: usize,
    pub sample_rate: f32,
}

fn state_span(state: TransportState) -> Span<'static> {
    match state {
        TransportState::Idle => Span::styled("■ Idle     ", Style::default().fg(Color::Yellow)),
        TransportState::Armed => Span::styled(
            "● Recording",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        TransportState::Playing => Span::styled("▶ Playing  ", Style::default().fg(Color::Green)),
    }
}

/// Render the transport bar
pub fn render_transport(frame: &mut Frame, area: Rect, view: &TransportView, stats: &AudioStats) {
    let block = Block::default().title(" saavy piano ").borders(Borders::ALL);

    let line = Line::from(vec![
        Span::raw(" "),
        state_span(view.state),
        Span::styled(
            format!("  {} notes  ", view.recorded),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Timbre: {}  ", view.timbre),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Vol: {:>3.0}%  ", view.volume * 100.0),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Voices: {}  ", view.voices),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1}kHz  ", view.sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
