use binrw::{binrw, BinReaderExt, BinWriterExt};

use crate::{
    error::{Error, Result},
    format::FourCC,
    util::cursor::{ResourceReader, ResourceWriter},
};

/// Size of the map header: duplicate fork header, 8 reserved bytes and the two list offsets.
pub const MAP_HEADER_SIZE: usize = 28;
/// Name offset marking a resource without a name.
pub const NO_NAME: u16 = 0xFFFF;
/// Largest data offset the packed 24-bit reference field can hold.
pub const MAX_DATA_OFFSET: usize = 0xFF_FFFF;

/// Fork header, found at offset 0 and duplicated at the start of the map.
#[binrw]
#[brw(big)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ForkHeader {
    pub data_offset: u32,
    pub map_offset: u32,
    pub data_length: u32,
    pub map_length: u32,
}

impl ForkHeader {
    pub const SIZE: usize = 16;

    #[inline]
    pub fn read(reader: &mut ResourceReader) -> Result<Self> {
        reader.read_record(Self::SIZE, |r| r.read_be())
    }

    #[inline]
    pub fn write_at(&self, writer: &mut ResourceWriter, offset: usize) -> Result<()> {
        writer.write_record_at(offset, |w| w.write_be(self))
    }

    #[inline]
    pub fn is_zero(&self) -> bool { *self == Self::default() }

    /// Checks the header against the size of the file it was read from.
    pub fn validate(&self, file_len: usize) -> Result<()> {
        if self.data_offset == 0 || self.map_offset == 0 || self.map_length == 0 {
            return Err(Error::CorruptFile(format!("Missing offsets in header {self:?}")));
        }
        if self.map_offset as u64 != self.data_offset as u64 + self.data_length as u64 {
            return Err(Error::CorruptFile(format!(
                "Map offset {:#X} does not follow resource data ({:#X} + {:#X})",
                self.map_offset, self.data_offset, self.data_length
            )));
        }
        if (self.map_length as usize) < MAP_HEADER_SIZE {
            return Err(Error::CorruptFile(format!(
                "Map length {:#X} is smaller than the map header",
                self.map_length
            )));
        }
        if self.map_offset as u64 + self.map_length as u64 > file_len as u64 {
            return Err(Error::CorruptFile(format!(
                "Map ({:#X} + {:#X}) extends past end of file ({:#X})",
                self.map_offset, self.map_length, file_len
            )));
        }
        Ok(())
    }
}

/// Type list entry.
#[binrw]
#[brw(big)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TypeEntry {
    pub kind: FourCC,
    // Resource count minus one, wrapping
    pub count_minus_one: u16,
    // Relative to the type list
    pub list_offset: u16,
}

impl TypeEntry {
    pub const SIZE: usize = 8;

    #[inline]
    pub fn read(reader: &mut ResourceReader) -> Result<Self> {
        reader.read_record(Self::SIZE, |r| r.read_be())
    }

    #[inline]
    pub fn write(&self, writer: &mut ResourceWriter) -> Result<()> {
        writer.write_record(|w| w.write_be(self))
    }

    #[inline]
    pub fn count(&self) -> usize { decode_count(self.count_minus_one) }
}

/// Reference list entry, one per resource.
#[binrw]
#[brw(big)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ReferenceEntry {
    pub id: i16,
    // Relative to the name list, or NO_NAME
    pub name_offset: u16,
    // Attributes in the high byte, data offset in the low 24 bits
    pub packed: u32,
    // Handle slot used by the Resource Manager at runtime
    pub handle: u32,
}

impl ReferenceEntry {
    pub const SIZE: usize = 12;

    /// Packs a reference. `data_offset` must already be checked against [`MAX_DATA_OFFSET`].
    #[inline]
    pub fn new(id: i16, name_offset: u16, attributes: u8, data_offset: u32) -> Self {
        Self {
            id,
            name_offset,
            packed: ((attributes as u32) << 24) | (data_offset & MAX_DATA_OFFSET as u32),
            handle: 0,
        }
    }

    #[inline]
    pub fn read(reader: &mut ResourceReader) -> Result<Self> {
        reader.read_record(Self::SIZE, |r| r.read_be())
    }

    #[inline]
    pub fn write(&self, writer: &mut ResourceWriter) -> Result<()> {
        writer.write_record(|w| w.write_be(self))
    }

    #[inline]
    pub fn attributes(&self) -> u8 { (self.packed >> 24) as u8 }

    #[inline]
    pub fn data_offset(&self) -> u32 { self.packed & MAX_DATA_OFFSET as u32 }
}

/// Decodes a stored count-minus-one field. `0xFFFF` wraps around to zero.
#[inline]
pub fn decode_count(stored: u16) -> usize { stored.wrapping_add(1) as usize }

/// Encodes a count as count-minus-one. Zero wraps around to `0xFFFF`.
pub fn encode_count(count: usize, what: &'static str) -> Result<u16> {
    let count = u16::try_from(count).map_err(|_| Error::ValueOverflow {
        what,
        value: count,
        max: u16::MAX as usize,
    })?;
    Ok(count.wrapping_sub(1))
}
