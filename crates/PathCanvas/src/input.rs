//! # Input Protocol
//!
//! Raw pointer and keyboard events the host forwards to the Editor. Positions are in
//! Screen Space (pixels relative to the canvas surface).

use bitflags::bitflags;
use glam::DVec2;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Keyboard modifiers held while an event fired.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        /// Command on macOS, Windows key elsewhere.
        const META = 1 << 3;
    }
}

impl Modifiers {
    /// Ctrl or Cmd, whichever the platform uses for shortcuts.
    pub fn command(self) -> bool {
        self.intersects(Modifiers::CTRL | Modifiers::META)
    }

    pub fn shift(self) -> bool {
        self.contains(Modifiers::SHIFT)
    }
}

// Serialized as the raw bits.
impl Serialize for Modifiers {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for Modifiers {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let bits = u8::deserialize(deserializer)?;
        Ok(Self::from_bits_truncate(bits))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerButton {
    #[default]
    Primary,
    Secondary,
    Middle,
}

/// Keyboard keys the Editor cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Delete,
    Backspace,
    Escape,
    Z,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown {
        position: DVec2,
        button: PointerButton,
        modifiers: Modifiers,
    },
    PointerMove {
        position: DVec2,
    },
    PointerUp {
        position: DVec2,
        button: PointerButton,
    },
    /// Vertical wheel delta; negative values scroll up.
    Wheel {
        position: DVec2,
        delta_y: f64,
    },
    KeyDown {
        key: Key,
        modifiers: Modifiers,
    },
}

impl InputEvent {
    pub fn press(position: DVec2) -> Self {
        InputEvent::PointerDown {
            position,
            button: PointerButton::Primary,
            modifiers: Modifiers::empty(),
        }
    }

    pub fn release(position: DVec2) -> Self {
        InputEvent::PointerUp {
            position,
            button: PointerButton::Primary,
        }
    }

    pub fn key(key: Key) -> Self {
        InputEvent::KeyDown {
            key,
            modifiers: Modifiers::empty(),
        }
    }
}
