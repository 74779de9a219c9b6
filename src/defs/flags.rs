use bitflags::bitflags;

bitflags! {
    /// Render-relevant flags carried by every **mobj**.
    ///
    /// The numeric values match the classic `info.h` layout so flags coming
    /// from the simulation can be passed through untouched.
    #[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MobjFlags: u32 {
        // Not linked into any sector thing list; never drawn.
        const NOSECTOR       = 0x0000_0008;
        // Partial invisibility: drawn with the fuzz effect.
        const SHADOW         = 0x0004_0000;

        // Upper two bits encode multiplayer palette translation.
        const TRANSLATION    = 0x0C00_0000;
    }
}

/// Bit-shift used to extract the player-colour translation (0‥3) from
/// the upper bits of `MobjFlags::TRANSLATION`.
pub const MF_TRANSSHIFT: u32 = 26;

/// Frame bit: draw at full brightness regardless of sector light.
pub const FF_FULLBRIGHT: u16 = 0x8000;
pub const FF_FRAMEMASK: u16 = 0x7FFF;

impl MobjFlags {
    /// Translation table index (1‥3), or `None` for untranslated sprites.
    #[inline]
    pub fn translation(self) -> Option<usize> {
        match (self & MobjFlags::TRANSLATION).bits() >> MF_TRANSSHIFT {
            0 => None,
            n => Some(n as usize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_bits_decode() {
        assert_eq!(MobjFlags::empty().translation(), None);
        assert_eq!(MobjFlags::from_bits_retain(1 << MF_TRANSSHIFT).translation(), Some(1));
        assert_eq!(MobjFlags::TRANSLATION.translation(), Some(3));
        assert_eq!((MobjFlags::SHADOW | MobjFlags::TRANSLATION).translation(), Some(3));
    }
}
