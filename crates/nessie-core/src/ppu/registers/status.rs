use bitflags::bitflags;

bitflags! {
    /// PPU status register (`$2002`).
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V S O . . . . .
    /// ```
    /// The low five bits are not driven and read back from the I/O latch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        const SPRITE_OVERFLOW = 0b0010_0000;
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Cleared by reading `$2002`.
        const VERTICAL_BLANK = 0b1000_0000;
    }
}
