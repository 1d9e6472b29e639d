//! Keyboard bindings.

use crate::foundation::math::map_range;

/// Number of preset cursor positions bound to the digit keys.
pub const PRESET_COUNT: u8 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Space: move to the next phase.
    Advance,
    /// `1`..=`5`: jump the cursor to a preset score.
    Preset(u8),
    ToggleInfo,
    Save,
    Load,
    /// Play the test video from any phase.
    Rehearse,
    Fullscreen,
}

impl Key {
    /// Binding for a typed character; letters match in either case.
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            ' ' => Some(Key::Advance),
            'i' => Some(Key::ToggleInfo),
            's' => Some(Key::Save),
            'l' => Some(Key::Load),
            't' => Some(Key::Rehearse),
            'f' => Some(Key::Fullscreen),
            d @ '1'..='5' => Some(Key::Preset(d as u8 - b'0')),
            _ => None,
        }
    }
}

/// Cursor x for preset `n`: the presets split the width into equal slots and
/// sit in the middle of each one.
pub fn preset_x(n: u8, width: f64) -> f64 {
    map_range(
        f64::from(n),
        0.5,
        f64::from(PRESET_COUNT) + 0.5,
        0.0,
        width,
    )
}
