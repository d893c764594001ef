//! Keyboard to watch-button mapping
//!
//! The terminal has no press duration, so long clicks get their own keys:
//! the uppercase letter or the shifted arrow.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Back,
    Up,
    Select,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Click {
    Single,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Press(Button, Click),
    Quit,
}

pub fn map_key(key: KeyEvent) -> Option<Key> {
    let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
    let click = |long: bool| if long { Click::Long } else { Click::Single };
    let key = match key.code {
        KeyCode::Char('q') => Key::Quit,
        KeyCode::Esc | KeyCode::Backspace => Key::Press(Button::Back, Click::Single),
        KeyCode::Char('k') => Key::Press(Button::Up, Click::Single),
        KeyCode::Char('K') => Key::Press(Button::Up, Click::Long),
        KeyCode::Up => Key::Press(Button::Up, click(shifted)),
        KeyCode::Char('j') => Key::Press(Button::Down, Click::Single),
        KeyCode::Char('J') => Key::Press(Button::Down, Click::Long),
        KeyCode::Down => Key::Press(Button::Down, click(shifted)),
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('s') => {
            Key::Press(Button::Select, Click::Single)
        }
        KeyCode::Char('S') => Key::Press(Button::Select, Click::Long),
        _ => return None,
    };
    Some(key)
}
