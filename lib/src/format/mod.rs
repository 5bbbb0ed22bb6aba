pub mod d3dmesh;
pub mod geom;
pub mod hashdb;
pub mod material;

use std::fmt::{Debug, Display, Formatter};

use binrw::binrw;

use crate::{error::Result, util::read::Reader};

/// A 64-bit content identifier stored and transmitted as two separate 32-bit
/// halves. Used throughout the format as the key for name and type lookups.
/// Equality is exact; no normalization.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SplitHash {
    pub hash1: u32,
    pub hash2: u32,
}

impl SplitHash {
    #[inline]
    pub const fn new(hash1: u32, hash2: u32) -> Self { Self { hash1, hash2 } }

    /// Read a hash pair in stream order: `hash2` first, then `hash1`.
    #[inline]
    pub fn read(r: &mut Reader<'_>) -> Result<Self> {
        let hash2 = r.read_u32()?;
        let hash1 = r.read_u32()?;
        Ok(Self { hash1, hash2 })
    }

    /// Substitute name for hashes absent from a database: lowercase hex of
    /// both halves, unpadded, `hash1` first.
    pub fn placeholder_name(&self) -> String { format!("{:x}{:x}", self.hash1, self.hash2) }
}

impl Display for SplitHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x} {:08x}", self.hash1, self.hash2)
    }
}

impl Debug for SplitHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "SplitHash({:08x}, {:08x})", self.hash1, self.hash2)
    }
}

#[binrw]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[binrw]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct AABox {
    pub min: Vec3f,
    pub max: Vec3f,
}

/// Renders a header magic value as the 4 ASCII characters it was stored as.
pub fn magic_string(magic: u32) -> String {
    magic.to_be_bytes().iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_unpadded_lowercase_hex() {
        let h = SplitHash::new(0xAB, 0x1F00);
        assert_eq!(h.placeholder_name(), "ab1f00");
    }

    #[test]
    fn read_order_is_hash2_then_hash1() {
        let bytes = [0x02, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let mut r = Reader::new(&bytes);
        let h = SplitHash::read(&mut r).unwrap();
        assert_eq!(h, SplitHash::new(1, 2));
    }
}
