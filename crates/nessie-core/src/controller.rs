//! Standard 8-button joypad readable through `$4016`.

/// Button ordering follows the shift register bit layout (A first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A = 0,
    B = 1,
    Select = 2,
    Start = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::Select,
        Button::Start,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
    ];

    #[inline]
    pub const fn mask(self) -> u8 {
        1 << self as u8
    }
}

/// Serially-readable pad with strobe/latch behaviour.
///
/// While strobe is high every read reports the live A button. Dropping strobe
/// freezes a snapshot that the next eight reads shift out LSB first; reads
/// after the eighth return 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controller {
    strobe: bool,
    state: u8,
    snapshot: u8,
    cursor: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update a button's pressed state.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.state |= button.mask();
        } else {
            self.state &= !button.mask();
        }
    }

    /// Replaces the whole button byte.
    pub fn set_state(&mut self, state: u8) {
        self.state = state;
    }

    pub fn state(&self) -> u8 {
        self.state
    }

    /// Writes to the `$4016` strobe bit.
    pub fn write_strobe(&mut self, data: u8) {
        let strobe = data & 0x01 != 0;
        if self.strobe && !strobe {
            self.snapshot = self.state;
            self.cursor = 0;
        }
        self.strobe = strobe;
    }

    /// Reads the next serial bit (0 or 1).
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return self.state & 0x01;
        }
        if self.cursor >= 8 {
            return 1;
        }
        let bit = (self.snapshot >> self.cursor) & 0x01;
        self.cursor += 1;
        bit
    }

    /// Next bit without advancing the shift sequence.
    pub fn peek(&self) -> u8 {
        if self.strobe {
            self.state & 0x01
        } else if self.cursor >= 8 {
            1
        } else {
            (self.snapshot >> self.cursor) & 0x01
        }
    }
}
