//! DDR pin words.
//!
//! A [`DdrWord`] holds the `2 * nphases` transitions one pin makes during a single
//! system clock cycle. Bit 0 is the earliest transition; phase `p` owns bits `2p`
//! (rising edge) and `2p + 1` (falling edge).

/// Transitions of one pin over one system cycle, earliest transition in bit 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DdrWord(pub u8);

impl DdrWord {
    /// All-low word.
    pub const ZERO: Self = Self(0);

    /// Number of transitions per system cycle for `nphases` phases.
    #[inline]
    pub const fn width(nphases: usize) -> usize {
        2 * nphases
    }

    /// Mask covering the valid transitions for `nphases` phases.
    #[inline]
    pub const fn mask(nphases: usize) -> u8 {
        (((1u16) << Self::width(nphases)) - 1) as u8
    }

    /// Truncates a fixed 8-transition pattern to the width of `nphases` phases.
    #[inline]
    pub const fn pattern(pattern: u8, nphases: usize) -> Self {
        Self(pattern & Self::mask(nphases))
    }

    /// Builds a word from per-phase (rising, falling) transition pairs.
    pub fn from_phases(nphases: usize, mut slot: impl FnMut(usize) -> (bool, bool)) -> Self {
        let mut bits = 0u8;
        for p in 0..nphases {
            let (rise, fall) = slot(p);
            bits |= u8::from(rise) << (2 * p);
            bits |= u8::from(fall) << (2 * p + 1);
        }
        Self(bits)
    }

    /// Builds a word that holds each phase's level across both of its transitions,
    /// as address and command pins do.
    pub fn held(nphases: usize, mut level: impl FnMut(usize) -> bool) -> Self {
        Self::from_phases(nphases, |p| {
            let l = level(p);
            (l, l)
        })
    }

    /// Transition `index` of the word.
    #[inline]
    pub const fn bit(self, index: usize) -> bool {
        (self.0 >> index) & 1 == 1
    }

    /// The (rising, falling) transitions carried by phase `p`.
    #[inline]
    pub const fn phase(self, p: usize) -> (bool, bool) {
        (self.bit(2 * p), self.bit(2 * p + 1))
    }
}

/// Bit `index` of a wide DFI data or mask vector.
#[inline]
pub const fn bit_of(value: u128, index: usize) -> bool {
    index < 128 && (value >> index) & 1 == 1
}
