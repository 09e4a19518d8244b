/// Base cycle cost of an opcode and which penalties apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cycle {
    /// Fixed cost.
    Normal(u8),
    /// +1 when indexing crosses a page.
    Cross(u8),
    /// +1 when taken, +1 more when the target is on another page.
    Branch(u8),
}

const fn n(cycle: u8) -> Cycle {
    Cycle::Normal(cycle)
}

const fn c(cycle: u8) -> Cycle {
    Cycle::Cross(cycle)
}

const fn b(cycle: u8) -> Cycle {
    Cycle::Branch(cycle)
}

impl Cycle {
    pub const fn base(self) -> u8 {
        match self {
            Cycle::Normal(cycle) | Cycle::Cross(cycle) | Cycle::Branch(cycle) => cycle,
        }
    }

    pub const fn total(self, page_crossed: bool, branch_taken: bool) -> u8 {
        match self {
            Cycle::Normal(cycle) => cycle,
            Cycle::Cross(cycle) => cycle + page_crossed as u8,
            Cycle::Branch(cycle) => {
                if branch_taken {
                    cycle + 1 + page_crossed as u8
                } else {
                    cycle
                }
            }
        }
    }
}

// Unimplemented holes (JAM and the unstable immediate/store combos) cost 1.
#[rustfmt::skip]
pub(crate) static CYCLE_TABLE: [Cycle; 256] = [
    n(7), n(6), n(1), n(8), n(3), n(3), n(5), n(5), n(3), n(2), n(2), n(1), n(4), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
    n(6), n(6), n(1), n(8), n(3), n(3), n(5), n(5), n(4), n(2), n(2), n(1), n(4), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
    n(6), n(6), n(1), n(8), n(3), n(3), n(5), n(5), n(3), n(2), n(2), n(1), n(3), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
    n(6), n(6), n(1), n(8), n(3), n(3), n(5), n(5), n(4), n(2), n(2), n(1), n(5), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
    n(2), n(6), n(2), n(6), n(3), n(3), n(3), n(3), n(2), n(2), n(2), n(1), n(4), n(4), n(4), n(4),
    b(2), n(6), n(1), n(1), n(4), n(4), n(4), n(4), n(2), n(5), n(2), n(1), n(1), n(5), n(1), n(1),
    n(2), n(6), n(2), n(6), n(3), n(3), n(3), n(3), n(2), n(2), n(2), n(2), n(4), n(4), n(4), n(4),
    b(2), c(5), n(1), c(5), n(4), n(4), n(4), n(4), n(2), c(4), n(2), n(1), c(4), c(4), c(4), c(4),
    n(2), n(6), n(2), n(8), n(3), n(3), n(5), n(5), n(2), n(2), n(2), n(1), n(4), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
    n(2), n(6), n(2), n(8), n(3), n(3), n(5), n(5), n(2), n(2), n(2), n(2), n(4), n(4), n(6), n(6),
    b(2), c(5), n(1), n(8), n(4), n(4), n(6), n(6), n(2), c(4), n(2), n(7), c(4), c(4), n(7), n(7),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_penalties() {
        let branch = b(2);
        assert_eq!(branch.total(false, false), 2);
        assert_eq!(branch.total(true, false), 2);
        assert_eq!(branch.total(false, true), 3);
        assert_eq!(branch.total(true, true), 4);
    }

    #[test]
    fn cross_penalty_only_for_cross_kind() {
        assert_eq!(c(4).total(true, false), 5);
        assert_eq!(n(5).total(true, false), 5);
    }
}
