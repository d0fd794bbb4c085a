//! Canonical key chords.

use std::fmt;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Tab,
    Enter,
    Backspace,
    Delete,
    Escape,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,
}

impl Key {
    fn name(self) -> Option<&'static str> {
        Some(match self {
            Key::Tab => "tab",
            Key::Enter => "enter",
            Key::Backspace => "backspace",
            Key::Delete => "delete",
            Key::Escape => "escape",
            Key::ArrowUp => "arrowup",
            Key::ArrowDown => "arrowdown",
            Key::ArrowLeft => "arrowleft",
            Key::ArrowRight => "arrowright",
            Key::Home => "home",
            Key::End => "end",
            Key::PageUp => "pageup",
            Key::PageDown => "pagedown",
            Key::Char(' ') => "space",
            Key::Char('+') => "plus",
            Key::Char(_) => return None,
        })
    }

    fn from_name(name: &str) -> Option<Self> {
        let key = match name {
            "tab" => Key::Tab,
            "enter" => Key::Enter,
            "backspace" => Key::Backspace,
            "delete" => Key::Delete,
            "escape" | "esc" => Key::Escape,
            "arrowup" | "up" => Key::ArrowUp,
            "arrowdown" | "down" => Key::ArrowDown,
            "arrowleft" | "left" => Key::ArrowLeft,
            "arrowright" | "right" => Key::ArrowRight,
            "home" => Key::Home,
            "end" => Key::End,
            "pageup" => Key::PageUp,
            "pagedown" => Key::PageDown,
            "space" => Key::Char(' '),
            "plus" => Key::Char('+'),
            _ => {
                let mut chars = name.chars();
                let ch = chars.next()?;
                if chars.next().is_some() {
                    return None;
                }
                Key::Char(ch)
            }
        };
        Some(key)
    }
}

/// A key plus modifier state, written `ctrl+alt+shift+key`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Chord {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub key: Key,
}

impl Chord {
    pub const fn new(key: Key) -> Self {
        Self {
            ctrl: false,
            alt: false,
            shift: false,
            key,
        }
    }

    pub const fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub const fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub const fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Classifies a terminal key event. Letters are folded to lower case
    /// with the shift flag carrying the case, and back-tab becomes
    /// `shift+tab`.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        let modifiers = event.modifiers;
        let mut shift = modifiers.contains(KeyModifiers::SHIFT);
        let key = match event.code {
            KeyCode::Char(ch) if ch.is_uppercase() => {
                shift = true;
                Key::Char(ch.to_lowercase().next().unwrap_or(ch))
            }
            KeyCode::Char(ch) => Key::Char(ch),
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => {
                shift = true;
                Key::Tab
            }
            KeyCode::Enter => Key::Enter,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Delete => Key::Delete,
            KeyCode::Esc => Key::Escape,
            KeyCode::Up => Key::ArrowUp,
            KeyCode::Down => Key::ArrowDown,
            KeyCode::Left => Key::ArrowLeft,
            KeyCode::Right => Key::ArrowRight,
            KeyCode::Home => Key::Home,
            KeyCode::End => Key::End,
            KeyCode::PageUp => Key::PageUp,
            KeyCode::PageDown => Key::PageDown,
            _ => return None,
        };
        Some(Self {
            ctrl: modifiers.contains(KeyModifiers::CONTROL),
            alt: modifiers.contains(KeyModifiers::ALT),
            shift,
            key,
        })
    }

    /// The character this chord types, if it types one.
    pub fn typed_char(&self, event: &KeyEvent) -> Option<char> {
        if self.ctrl || self.alt {
            return None;
        }
        match event.code {
            KeyCode::Char(ch) => Some(ch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseChordError(String);

impl fmt::Display for ParseChordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid key chord {:?}", self.0)
    }
}

impl std::error::Error for ParseChordError {}

impl FromStr for Chord {
    type Err = ParseChordError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = || ParseChordError(input.to_string());
        let mut chord: Option<Chord> = None;
        let (mut ctrl, mut alt, mut shift) = (false, false, false);
        for part in input.split('+') {
            let part = part.trim().to_lowercase();
            match part.as_str() {
                "ctrl" | "control" => ctrl = true,
                "alt" => alt = true,
                "shift" => shift = true,
                name => {
                    if chord.is_some() {
                        return Err(err());
                    }
                    chord = Some(Chord::new(Key::from_name(name).ok_or_else(err)?));
                }
            }
        }
        let mut chord = chord.ok_or_else(err)?;
        chord.ctrl = ctrl;
        chord.alt = alt;
        chord.shift = shift;
        Ok(chord)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.alt {
            f.write_str("alt+")?;
        }
        if self.shift {
            f.write_str("shift+")?;
        }
        match self.key.name() {
            Some(name) => f.write_str(name),
            None => match self.key {
                Key::Char(ch) => write!(f, "{ch}"),
                _ => Ok(()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventKind;

    use super::*;

    fn event(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        let mut event = KeyEvent::new(code, modifiers);
        event.kind = KeyEventKind::Press;
        event
    }

    #[test]
    fn parses_modifiers_in_any_order() {
        let chord: Chord = "shift+ctrl+Enter".parse().unwrap();
        assert_eq!(chord, Chord::new(Key::Enter).ctrl().shift());
        assert_eq!(chord.to_string(), "ctrl+shift+enter");
    }

    #[test]
    fn parses_browser_key_names() {
        assert_eq!(
            "ctrl+alt+arrowup".parse::<Chord>().unwrap(),
            Chord::new(Key::ArrowUp).ctrl().alt()
        );
        assert_eq!("ctrl+h".parse::<Chord>().unwrap(), Chord::new(Key::Char('h')).ctrl());
        assert_eq!("ctrl+plus".parse::<Chord>().unwrap(), Chord::new(Key::Char('+')).ctrl());
    }

    #[test]
    fn rejects_malformed_chords() {
        assert!("ctrl".parse::<Chord>().is_err());
        assert!("ctrl+a+b".parse::<Chord>().is_err());
        assert!("ctrl+nonsense".parse::<Chord>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for text in ["tab", "shift+tab", "ctrl+alt+arrowdown", "ctrl+shift+k", "space"] {
            let chord: Chord = text.parse().unwrap();
            assert_eq!(chord.to_string(), text);
        }
    }

    #[test]
    fn classifies_terminal_events() {
        assert_eq!(
            Chord::from_key_event(&event(KeyCode::BackTab, KeyModifiers::SHIFT)),
            Some(Chord::new(Key::Tab).shift())
        );
        assert_eq!(
            Chord::from_key_event(&event(KeyCode::Char('J'), KeyModifiers::CONTROL)),
            Some(Chord::new(Key::Char('j')).ctrl().shift())
        );
        assert_eq!(
            Chord::from_key_event(&event(
                KeyCode::Up,
                KeyModifiers::CONTROL | KeyModifiers::ALT
            )),
            Some(Chord::new(Key::ArrowUp).ctrl().alt())
        );
        assert_eq!(Chord::from_key_event(&event(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn typed_char_ignores_command_chords() {
        let plain = event(KeyCode::Char('A'), KeyModifiers::SHIFT);
        let chord = Chord::from_key_event(&plain).unwrap();
        assert_eq!(chord.typed_char(&plain), Some('A'));

        let ctrl = event(KeyCode::Char('a'), KeyModifiers::CONTROL);
        let chord = Chord::from_key_event(&ctrl).unwrap();
        assert_eq!(chord.typed_char(&ctrl), None);
    }
}
