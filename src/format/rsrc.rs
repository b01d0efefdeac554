use indexmap::IndexMap;

use crate::{
    error::{Error, Result},
    format::{
        header::{
            decode_count, encode_count, ForkHeader, ReferenceEntry, TypeEntry, MAP_HEADER_SIZE,
            MAX_DATA_OFFSET, NO_NAME,
        },
        FourCC,
    },
    util::cursor::{ResourceReader, ResourceWriter},
};

// Resource attribute bits
pub const ATTR_SYS_HEAP: u8 = 0x40;
pub const ATTR_PURGEABLE: u8 = 0x20;
pub const ATTR_LOCKED: u8 = 0x10;
pub const ATTR_PROTECTED: u8 = 0x08;
pub const ATTR_PRELOAD: u8 = 0x04;
pub const ATTR_CHANGED: u8 = 0x02;

/// Space reserved for the fork header at the start of written files.
pub const DATA_OFFSET: usize = 256;

const RESERVED_MAP_SIZE: usize = 8;

/// Names of the attribute bits set in `attributes`.
pub fn attribute_names(attributes: u8) -> Vec<&'static str> {
    [
        (ATTR_SYS_HEAP, "sysheap"),
        (ATTR_PURGEABLE, "purgeable"),
        (ATTR_LOCKED, "locked"),
        (ATTR_PROTECTED, "protected"),
        (ATTR_PRELOAD, "preload"),
        (ATTR_CHANGED, "changed"),
    ]
    .into_iter()
    .filter(|(bit, _)| attributes & bit != 0)
    .map(|(_, name)| name)
    .collect()
}

/// A single resource.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Resource {
    pub id: i16,
    /// `None` is stored without a name list entry; `Some("")` is a present, empty name.
    ///
    /// Names are read and written as UTF-8. MacRoman names outside ASCII fail to decode.
    pub name: Option<String>,
    pub attributes: u8,
    pub data: Vec<u8>,
}

/// All resources in a fork, grouped by type.
///
/// Types and resources are written in iteration order, which fixes the layout of the output.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ResourceMap {
    pub types: IndexMap<FourCC, Vec<Resource>>,
}

impl ResourceMap {
    pub fn new() -> Self { Self::default() }

    pub fn get(&self, kind: FourCC, id: i16) -> Option<&Resource> {
        self.types.get(&kind).and_then(|resources| resources.iter().find(|r| r.id == id))
    }

    /// Iterates every resource in table order.
    pub fn resources(&self) -> impl Iterator<Item = (FourCC, &Resource)> {
        self.types.iter().flat_map(|(kind, resources)| resources.iter().map(move |r| (*kind, r)))
    }

    pub fn resource_count(&self) -> usize { self.types.values().map(Vec::len).sum() }

    pub fn is_empty(&self) -> bool { self.resource_count() == 0 }

    pub fn read(data: &[u8]) -> Result<Self> {
        let mut reader = ResourceReader::new(data);
        let header = ForkHeader::read(&mut reader)?;
        log::debug!("Header: {:?}", header);
        header.validate(data.len())?;
        let data_offset = header.data_offset as usize;
        let map_offset = header.map_offset as usize;

        reader.set_position(map_offset)?;
        let map_header = ForkHeader::read(&mut reader)?;
        if !map_header.is_zero() && map_header != header {
            return Err(Error::CorruptFile(format!(
                "Map header {map_header:?} does not match file header {header:?}"
            )));
        }
        reader.advance(RESERVED_MAP_SIZE)?;
        let type_list_offset = map_offset + reader.read::<u16>()? as usize;
        let name_list_offset = map_offset + reader.read::<u16>()? as usize;

        reader.set_position(type_list_offset)?;
        let type_count = decode_count(reader.read()?);
        let mut map = ResourceMap::new();
        for _ in 0..type_count {
            let entry = TypeEntry::read(&mut reader)?;
            log::debug!("- {:?}: {} resource(s)", entry.kind, entry.count());
            let mut resources = Vec::with_capacity(entry.count());
            reader.push_position(type_list_offset + entry.list_offset as usize)?;
            for _ in 0..entry.count() {
                let reference = ReferenceEntry::read(&mut reader)?;
                let next_offset = reader.bytes_read();
                let name = if reference.name_offset == NO_NAME {
                    None
                } else {
                    reader.set_position(name_list_offset + reference.name_offset as usize)?;
                    Some(reader.read_pstring()?)
                };
                reader.set_position(data_offset + reference.data_offset() as usize)?;
                let length = reader.read::<u32>()? as usize;
                let data = reader.read_data(length)?;
                reader.set_position(next_offset)?;
                resources.push(Resource {
                    id: reference.id,
                    name,
                    attributes: reference.attributes(),
                    data,
                });
            }
            reader.pop_position();
            map.types.entry(entry.kind).or_default().extend(resources);
        }
        Ok(map)
    }

    pub fn write(&self) -> Result<Vec<u8>> {
        let type_count = self.types.len();
        let resource_count = self.resource_count();
        let type_list_offset = MAP_HEADER_SIZE;
        let name_list_offset = type_list_offset
            + 2
            + type_count * TypeEntry::SIZE
            + resource_count * ReferenceEntry::SIZE;
        if name_list_offset > u16::MAX as usize {
            return Err(Error::ValueOverflow {
                what: "name list offset",
                value: name_list_offset,
                max: u16::MAX as usize,
            });
        }

        let data_size: usize = self.resources().map(|(_, r)| 4 + r.data.len()).sum();
        let mut w = ResourceWriter::with_capacity(DATA_OFFSET + data_size + name_list_offset);
        w.advance(DATA_OFFSET);

        let mut data_offsets = Vec::with_capacity(resource_count);
        for (_, resource) in self.resources() {
            let offset = w.bytes_written() - DATA_OFFSET;
            if offset > MAX_DATA_OFFSET {
                return Err(Error::FileTooBig {
                    what: "resource data offset",
                    value: offset,
                    max: MAX_DATA_OFFSET,
                });
            }
            data_offsets.push(offset as u32);
            let length = u32::try_from(resource.data.len()).map_err(|_| Error::FileTooBig {
                what: "resource data length",
                value: resource.data.len(),
                max: u32::MAX as usize,
            })?;
            w.write(length)?;
            w.write_data(&resource.data);
        }

        let map_offset = w.bytes_written();
        w.advance(MAP_HEADER_SIZE - 4);
        w.write(type_list_offset as u16)?;
        w.write(name_list_offset as u16)?;

        // Reference list offsets are relative to the type list
        w.write(encode_count(type_count, "type count")?)?;
        let mut list_offset = 2 + type_count * TypeEntry::SIZE;
        for (&kind, resources) in &self.types {
            TypeEntry {
                kind,
                count_minus_one: encode_count(resources.len(), "resource count")?,
                // Bounded by the name list offset check
                list_offset: list_offset as u16,
            }
            .write(&mut w)?;
            list_offset += resources.len() * ReferenceEntry::SIZE;
        }

        let mut names = ResourceWriter::new();
        for ((_, resource), &data_offset) in self.resources().zip(&data_offsets) {
            let name_offset = match &resource.name {
                None => NO_NAME,
                Some(name) => {
                    let offset = names.bytes_written();
                    if offset >= NO_NAME as usize {
                        return Err(Error::ValueOverflow {
                            what: "name offset",
                            value: offset,
                            max: NO_NAME as usize - 1,
                        });
                    }
                    names.write_pstring(name)?;
                    offset as u16
                }
            };
            ReferenceEntry::new(resource.id, name_offset, resource.attributes, data_offset)
                .write(&mut w)?;
        }
        w.write_data(names.as_slice());

        let file_len = w.bytes_written();
        if file_len > MAX_DATA_OFFSET {
            return Err(Error::FileTooBig {
                what: "file size",
                value: file_len,
                max: MAX_DATA_OFFSET,
            });
        }
        let header = ForkHeader {
            data_offset: DATA_OFFSET as u32,
            map_offset: map_offset as u32,
            data_length: (map_offset - DATA_OFFSET) as u32,
            map_length: (file_len - map_offset) as u32,
        };
        log::debug!("Header: {:?}", header);
        header.write_at(&mut w, 0)?;
        header.write_at(&mut w, map_offset)?;
        Ok(w.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K_TEST: FourCC = FourCC(*b"TEST");

    fn be_u16(data: &[u8], offset: usize) -> u16 {
        u16::from_be_bytes([data[offset], data[offset + 1]])
    }

    fn be_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([data[offset], data[offset + 1], data[offset + 2], data[offset + 3]])
    }

    #[test]
    fn single_resource_layout() {
        let mut map = ResourceMap::new();
        map.types.insert(FourCC::from_u32(0x54455354), vec![Resource {
            id: 128,
            name: Some("Ship".to_string()),
            attributes: 0,
            data: vec![0x01, 0x02, 0x03, 0x04],
        }]);
        let data = map.write().unwrap();

        let map_offset = DATA_OFFSET + 8;
        assert_eq!(be_u32(&data, 0), DATA_OFFSET as u32);
        assert_eq!(be_u32(&data, 4), map_offset as u32);
        assert_eq!(be_u32(&data, 8), 8);
        assert_eq!(be_u32(&data, 12), 55);
        assert_eq!(&data[0..16], &data[map_offset..map_offset + 16]);
        assert_eq!(&data[DATA_OFFSET..map_offset], &[0, 0, 0, 4, 1, 2, 3, 4]);

        let type_list = map_offset + 28;
        assert_eq!(be_u16(&data, map_offset + 24), 28);
        assert_eq!(be_u16(&data, map_offset + 26), 50);
        assert_eq!(be_u16(&data, type_list), 0);
        assert_eq!(&data[type_list + 2..type_list + 6], b"TEST");
        assert_eq!(be_u16(&data, type_list + 6), 0);
        assert_eq!(be_u16(&data, type_list + 8), 10);

        let reference = type_list + 10;
        assert_eq!(be_u16(&data, reference), 128);
        assert_eq!(be_u16(&data, reference + 2), 0);
        assert_eq!(be_u32(&data, reference + 4), 0);
        assert_eq!(be_u32(&data, reference + 8), 0);
        assert_eq!(&data[map_offset + 50..], b"\x04Ship");

        assert_eq!(ResourceMap::read(&data).unwrap(), map);
    }

    #[test]
    fn unnamed_resources_use_sentinel() {
        let mut map = ResourceMap::new();
        map.types.insert(K_TEST, vec![Resource { id: 1, data: vec![9], ..Default::default() }]);
        map.types.insert(FourCC(*b"PICT"), vec![Resource { id: 2, ..Default::default() }]);
        let data = map.write().unwrap();

        let map_offset = be_u32(&data, 4) as usize;
        let name_list_offset = be_u16(&data, map_offset + 26) as usize;
        assert_eq!(name_list_offset, 28 + 2 + 2 * 8 + 2 * 12);
        // Empty name list
        assert_eq!(data.len(), map_offset + name_list_offset);
        let references = map_offset + 28 + 2 + 2 * 8;
        assert_eq!(be_u16(&data, references + 2), NO_NAME);
        assert_eq!(be_u16(&data, references + 12 + 2), NO_NAME);

        let read = ResourceMap::read(&data).unwrap();
        assert_eq!(read.get(K_TEST, 1).unwrap().name, None);
        assert_eq!(read, map);
    }

    #[test]
    fn empty_map() {
        let data = ResourceMap::new().write().unwrap();
        let map_offset = DATA_OFFSET;
        assert_eq!(be_u32(&data, 8), 0);
        assert_eq!(be_u16(&data, map_offset + 28), 0xFFFF);
        assert_eq!(data.len(), map_offset + 30);
        assert!(ResourceMap::read(&data).unwrap().types.is_empty());
    }

    #[test]
    fn attributes_round_trip() {
        let mut map = ResourceMap::new();
        map.types.insert(K_TEST, vec![Resource {
            id: -1,
            attributes: ATTR_PURGEABLE | ATTR_PRELOAD | 0x81,
            ..Default::default()
        }]);
        let read = ResourceMap::read(&map.write().unwrap()).unwrap();
        let resource = read.get(K_TEST, -1).unwrap();
        assert_eq!(resource.attributes, 0xA5);
        assert_eq!(attribute_names(resource.attributes), vec!["purgeable", "preload"]);
    }

    #[test]
    fn resources_iterate_in_table_order() {
        let mut map = ResourceMap::new();
        map.types.insert(K_TEST, vec![
            Resource { id: 5, ..Default::default() },
            Resource { id: 3, ..Default::default() },
        ]);
        map.types.insert(FourCC(*b"snd "), vec![Resource { id: 7, ..Default::default() }]);
        let order: Vec<(FourCC, i16)> = map.resources().map(|(k, r)| (k, r.id)).collect();
        assert_eq!(order, vec![(K_TEST, 5), (K_TEST, 3), (FourCC(*b"snd "), 7)]);
        assert_eq!(map.resource_count(), 3);
        assert!(map.get(K_TEST, 4).is_none());
    }
}
