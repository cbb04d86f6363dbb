//! Piano keyboard widget and mouse hit-testing

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, Borders},
    Frame,
};
use saavy_piano::{KeyRange, Note};

use crate::keymap;

/// Where each key sits on screen for a given area.
///
/// White keys tile the full height; black keys straddle the gap between
/// two whites and cover the top `BLACK_HEIGHT` of it.
pub struct KeyboardLayout {
    area: Rect,
    white_width: u16,
    black_height: u16,
    notes: Vec<Note>,
}

/// Black key height as a fraction of the keyboard, in percent.
const BLACK_HEIGHT: u16 = 60;

impl KeyboardLayout {
    pub fn new(area: Rect, range: &KeyRange) -> Self {
        let notes = range.notes();
        let whites = notes.iter().filter(|n| !n.is_accidental).count().max(1) as u16;
        Self {
            area,
            white_width: (area.width / whites).max(1),
            black_height: (area.height * BLACK_HEIGHT / 100).max(1),
            notes,
        }
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Number of white keys strictly left of key `index`.
    fn whites_before(&self, index: usize) -> u16 {
        self.notes[..index]
            .iter()
            .filter(|n| !n.is_accidental)
            .count() as u16
    }

    /// Screen rectangle of key `index`.
    pub fn key_rect(&self, index: usize) -> Option<Rect> {
        let note = self.notes.get(index)?;
        let left = self.whites_before(index) * self.white_width;

        let rect = if note.is_accidental {
            let width = (self.white_width / 2).max(1);
            Rect::new(
                self.area.x + left.saturating_sub(width / 2 + width % 2),
                self.area.y,
                width,
                self.black_height,
            )
        } else {
            Rect::new(self.area.x + left, self.area.y, self.white_width, self.area.height)
        };
        Some(rect.intersection(self.area))
    }

    /// Key under the terminal cell `(column, row)`. Black keys win where
    /// they overlap white ones.
    pub fn hit_test(&self, column: u16, row: u16) -> Option<usize> {
        let inside = |r: Rect| {
            column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
        };

        let black = (0..self.notes.len())
            .filter(|&i| self.notes[i].is_accidental)
            .find(|&i| self.key_rect(i).is_some_and(inside));
        black.or_else(|| {
            (0..self.notes.len())
                .filter(|&i| !self.notes[i].is_accidental)
                .find(|&i| self.key_rect(i).is_some_and(inside))
        })
    }
}

/// Draw the keyboard. `lit[i]` highlights key `i`.
pub fn render_keyboard(
    frame: &mut Frame,
    area: Rect,
    range: &KeyRange,
    lit: &[bool],
    show_labels: bool,
) -> KeyboardLayout {
    let block = Block::default().title(" Keyboard ").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let layout = KeyboardLayout::new(inner, range);
    let buf = frame.buffer_mut();

    // Whites first so blacks paint over them
    for pass_black in [false, true] {
        for (i, note) in layout.notes().iter().enumerate() {
            if note.is_accidental != pass_black {
                continue;
            }
            let Some(rect) = layout.key_rect(i) else {
                continue;
            };
            let on = lit.get(i).copied().unwrap_or(false);
            let bg = match (note.is_accidental, on) {
                (false, false) => Color::White,
                (true, false) => Color::Black,
                (false, true) => Color::LightCyan,
                (true, true) => Color::Cyan,
            };
            let fg = if note.is_accidental { Color::Gray } else { Color::DarkGray };
            fill(buf, rect, Style::default().bg(bg).fg(fg));

            // Right edge of each white key
            if !note.is_accidental && rect.width > 1 {
                let edge = Rect::new(rect.x + rect.width - 1, rect.y, 1, rect.height);
                for y in edge.y..edge.y + edge.height {
                    if let Some(cell) = buf.cell_mut((edge.x, y)) {
                        cell.set_char('▕');
                    }
                }
            }

            if show_labels && rect.height > 0 {
                if let Some(label) = keymap::label(i) {
                    let y = rect.y + rect.height - 1;
                    if let Some(cell) = buf.cell_mut((rect.x + rect.width / 2, y)) {
                        cell.set_char(label);
                    }
                }
            }
        }
    }

    layout
}

fn fill(buf: &mut Buffer, rect: Rect, style: Style) {
    for y in rect.y..rect.y + rect.height {
        for x in rect.x..rect.x + rect.width {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_char(' ');
                cell.set_style(style);
            }
        }
    }
}
