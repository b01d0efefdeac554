pub mod header;
pub mod rsrc;

use std::fmt::{Debug, Display, Formatter, Write};

use binrw::binrw;

/// Four-character resource type code, stored as a big-endian `u32`.
#[binrw]
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    #[inline]
    pub const fn from_u32(value: u32) -> Self { Self(value.to_be_bytes()) }

    #[inline]
    pub const fn as_u32(&self) -> u32 { u32::from_be_bytes(self.0) }
}

impl Display for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for c in self.0 {
            f.write_char(c as char)?;
        }
        Ok(())
    }
}

impl Debug for FourCC {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { write!(f, "\"{self}\"") }
}

impl PartialEq<[u8; 4]> for FourCC {
    fn eq(&self, other: &[u8; 4]) -> bool { &self.0 == other }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn four_cc_u32() {
        let kind = FourCC::from_u32(0x54455354);
        assert_eq!(kind, *b"TEST");
        assert_eq!(kind.as_u32(), 0x54455354);
        assert_eq!(kind.to_string(), "TEST");
        assert_eq!(format!("{kind:?}"), "\"TEST\"");
    }
}
