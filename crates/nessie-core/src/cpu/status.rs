use bitflags::bitflags;

bitflags! {
    /// Processor status register (P).
    ///
    /// Bit layout:
    /// 7 6 5 4 3 2 1 0
    /// N V _ B D I Z C
    ///
    /// `BREAK` and `UNUSED` have no storage on the die; they only exist in
    /// the copy of P pushed to the stack.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Status: u8 {
        /// Carry out of bit 7, or "no borrow" after a subtraction.
        const CARRY     = 0b0000_0001;
        /// Last result was zero.
        const ZERO      = 0b0000_0010;
        /// Masks IRQ. NMI is unaffected.
        const INTERRUPT = 0b0000_0100;
        /// Settable, but the 2A03 has no BCD adder so it changes nothing.
        const DECIMAL   = 0b0000_1000;
        /// Set in the pushed copy by BRK/PHP, clear for IRQ/NMI.
        const BREAK     = 0b0001_0000;
        /// Always reads back as 1.
        const UNUSED    = 0b0010_0000;
        /// Signed overflow.
        const OVERFLOW  = 0b0100_0000;
        /// Bit 7 of the last result.
        const NEGATIVE  = 0b1000_0000;
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new()
    }
}

impl Status {
    /// Power-up value: I set, bit 5 set.
    pub const fn new() -> Self {
        Status::from_bits_truncate(0x24)
    }

    pub fn update_zero(&mut self, value: u8) {
        self.set(Status::ZERO, value == 0);
    }

    pub fn update_negative(&mut self, value: u8) {
        self.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// Updates Z and N from a result byte.
    #[inline]
    pub fn update_zn(&mut self, value: u8) {
        self.update_zero(value);
        self.update_negative(value);
    }

    /// Value pushed to the stack. `brk` selects the B bit.
    pub fn to_stack(self, brk: bool) -> u8 {
        let mut pushed = self | Status::UNUSED;
        pushed.set(Status::BREAK, brk);
        pushed.bits()
    }

    /// Value restored by PLP/RTI. B is discarded, bit 5 forced on.
    pub fn from_stack(byte: u8) -> Self {
        (Status::from_bits_truncate(byte) - Status::BREAK) | Status::UNUSED
    }
}
