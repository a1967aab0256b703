//! crossterm backend for the menuconfig front end.
//!
//! [`CrosstermTerminal::enter`] switches the terminal to raw mode on the
//! alternate screen; dropping the value restores it, also when the editor
//! bails out with an error.

use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    style::{self, Attribute, Print, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kconfig::ui::{Cell, Color, Key, Style, Terminal, WIDE_CONTINUATION, char_width};

pub struct CrosstermTerminal {
    out: Stdout,
}

impl CrosstermTerminal {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        Ok(Self { out })
    }
}

impl Drop for CrosstermTerminal {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            SetAttribute(Attribute::Reset),
            Show,
            LeaveAlternateScreen
        );
        let _ = disable_raw_mode();
    }
}

impl Terminal for CrosstermTerminal {
    fn size(&self) -> io::Result<(u16, u16)> {
        terminal::size()
    }

    fn draw(&mut self, cells: &[(u16, u16, Cell)]) -> io::Result<()> {
        let mut current: Option<Style> = None;
        let mut next_pos = None;
        for &(x, y, cell) in cells {
            // The terminal advances past both halves when printing the head
            if cell.ch == WIDE_CONTINUATION {
                continue;
            }
            if next_pos != Some((x, y)) {
                queue!(self.out, MoveTo(x, y))?;
            }
            if current != Some(cell.style) {
                queue_style(&mut self.out, cell.style)?;
                current = Some(cell.style);
            }
            queue!(self.out, Print(cell.ch))?;
            next_pos = Some((x.saturating_add(char_width(cell.ch).max(1)), y));
        }
        self.out.flush()
    }

    fn read_key(&mut self) -> io::Result<Key> {
        loop {
            match event::read()? {
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    if let Some(key) = map_key(key) {
                        return Ok(key);
                    }
                }
                Event::Resize(w, h) => return Ok(Key::Resize(w, h)),
                _ => {}
            }
        }
    }
}

fn queue_style(out: &mut impl Write, s: Style) -> io::Result<()> {
    // SGR reset also clears colors, so it goes first
    queue!(
        out,
        SetAttribute(Attribute::Reset),
        SetForegroundColor(map_color(s.fg)),
        SetBackgroundColor(map_color(s.bg))
    )?;
    if s.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if s.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

fn map_color(c: Color) -> style::Color {
    match c {
        Color::Default => style::Color::Reset,
        Color::Black => style::Color::Black,
        Color::Red => style::Color::DarkRed,
        Color::Green => style::Color::DarkGreen,
        Color::Yellow => style::Color::DarkYellow,
        Color::Blue => style::Color::DarkBlue,
        Color::Magenta => style::Color::DarkMagenta,
        Color::Cyan => style::Color::DarkCyan,
        Color::White => style::Color::White,
        Color::Grey => style::Color::DarkGrey,
    }
}

fn map_key(key: KeyEvent) -> Option<Key> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            // Ctrl+C backs out like Esc
            KeyCode::Char('c') => Some(Key::Esc),
            _ => None,
        };
    }
    Some(match key.code {
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Tab => Key::Tab,
        KeyCode::Char(c) => Key::Char(c),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let plain = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(map_key(plain(KeyCode::Char('y'))), Some(Key::Char('y')));
        assert_eq!(map_key(plain(KeyCode::PageDown)), Some(Key::PageDown));
        assert_eq!(map_key(plain(KeyCode::F(1))), None);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Key::Esc)
        );
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL)),
            None
        );
    }
}
