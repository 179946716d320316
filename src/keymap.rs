//! Key chords bound to named actions.
//!
//! A chord is written `Ctrl+Shift+Alt+Meta+key`, modifiers in that order.
//! Each platform has default bindings; a JSON file of the form
//! `{"keymap": [{"key": "Ctrl+s", "command": "SAVE_DOCUMENT"}]}` adds to or
//! overrides them.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::error::KeymapError;

pub const TOGGLE_SEARCH_MODAL: &str = "TOGGLE_SEARCH_MODAL";
pub const SAVE_DOCUMENT: &str = "SAVE_DOCUMENT";
pub const QUIT: &str = "QUIT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

/// A modifier set plus one key. Single-character keys are stored
/// lowercase; named keys keep their canonical spelling (`Enter`, `F5`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Chord {
    /// The chord a terminal key event represents, if it has a name.
    pub fn from_key_event(event: &KeyEvent) -> Option<Self> {
        let key = match event.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_lowercase().collect(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Escape".to_string(),
            KeyCode::Tab | KeyCode::BackTab => "Tab".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Up => "ArrowUp".to_string(),
            KeyCode::Down => "ArrowDown".to_string(),
            KeyCode::Left => "ArrowLeft".to_string(),
            KeyCode::Right => "ArrowRight".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::F(n) => format!("F{n}"),
            _ => return None,
        };
        let m = event.modifiers;
        Some(Self {
            modifiers: Modifiers {
                ctrl: m.contains(KeyModifiers::CONTROL),
                shift: m.contains(KeyModifiers::SHIFT) || event.code == KeyCode::BackTab,
                alt: m.contains(KeyModifiers::ALT),
                meta: m.intersects(KeyModifiers::SUPER | KeyModifiers::META),
            },
            key,
        })
    }
}

impl FromStr for Chord {
    type Err = KeymapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || KeymapError::InvalidChord(s.to_string());
        let mut parts: Vec<&str> = s.split('+').collect();
        // "Ctrl++" binds the plus key.
        if s.ends_with("++") {
            parts.truncate(parts.len() - 2);
            parts.push("+");
        }
        let (key, modifier_names) = parts.split_last().ok_or_else(invalid)?;
        if key.is_empty() {
            return Err(invalid());
        }
        let mut modifiers = Modifiers::default();
        for name in modifier_names {
            let flag = match name.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => &mut modifiers.ctrl,
                "shift" => &mut modifiers.shift,
                "alt" | "option" => &mut modifiers.alt,
                "meta" | "cmd" | "command" | "super" => &mut modifiers.meta,
                _ => return Err(invalid()),
            };
            *flag = true;
        }
        let key = if key.chars().count() == 1 {
            key.to_lowercase()
        } else {
            (*key).to_string()
        };
        Ok(Self { modifiers, key })
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.modifiers;
        for (on, name) in [
            (m.ctrl, "Ctrl+"),
            (m.shift, "Shift+"),
            (m.alt, "Alt+"),
            (m.meta, "Meta+"),
        ] {
            if on {
                f.write_str(name)?;
            }
        }
        f.write_str(&self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Other,
}

impl Platform {
    pub const fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeymapFile {
    keymap: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    key: String,
    command: String,
}

/// Chord to action-name bindings.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: HashMap<Chord, String>,
}

impl Keymap {
    pub fn defaults(platform: Platform) -> Self {
        let primary = match platform {
            Platform::MacOs => "Meta",
            Platform::Other => "Ctrl",
        };
        let mut keymap = Self::default();
        for (key, action) in [
            ("p", TOGGLE_SEARCH_MODAL),
            ("s", SAVE_DOCUMENT),
            ("q", QUIT),
        ] {
            if let Ok(chord) = format!("{primary}+{key}").parse() {
                keymap.bind(chord, action);
            }
        }
        keymap
    }

    pub fn bind(&mut self, chord: Chord, action: impl Into<String>) {
        self.bindings.insert(chord, action.into());
    }

    /// Merge bindings from keymap JSON, replacing existing ones for the
    /// same chord. Returns how many bindings were read.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an unparseable chord; nothing is merged
    /// in that case.
    pub fn merge_json(&mut self, json: &str) -> Result<usize, KeymapError> {
        let file: KeymapFile = serde_json::from_str(json)?;
        let parsed = file
            .keymap
            .into_iter()
            .map(|b| Ok((b.key.parse::<Chord>()?, b.command)))
            .collect::<Result<Vec<_>, KeymapError>>()?;
        let count = parsed.len();
        self.bindings.extend(parsed);
        Ok(count)
    }

    /// Merge bindings from a keymap JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or does not parse.
    pub fn merge_file(&mut self, path: &Path) -> Result<usize, KeymapError> {
        let json = std::fs::read_to_string(path).map_err(|source| KeymapError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.merge_json(&json)
    }

    pub fn action_for(&self, chord: &Chord) -> Option<&str> {
        self.bindings.get(chord).map(String::as_str)
    }

    /// The action bound to a key event, if any.
    pub fn action_for_key(&self, event: &KeyEvent) -> Option<&str> {
        Chord::from_key_event(event).and_then(|chord| self.action_for(&chord))
    }

    /// Bindings sorted by chord text, for help output.
    pub fn bindings(&self) -> Vec<(String, &str)> {
        let mut list: Vec<(String, &str)> = self
            .bindings
            .iter()
            .map(|(chord, action)| (chord.to_string(), action.as_str()))
            .collect();
        list.sort();
        list
    }
}
