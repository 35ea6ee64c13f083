//! Wire and persistence encodings for section storage.
//!
//! Array palettes travel as `varint count` + `count x varint global_id`;
//! global palettes need no palette-local data because their indices are
//! already registry ids. Nibble fields persist as a fixed 2048-byte block
//! or are omitted entirely when uninitialized.

use std::io::{self, Read, Write};

use loam_blocks::{BlockRegistry, BlockState};
use loam_world::SECTION_VOLUME;

use crate::packed::PackedArray;
use crate::palette::{ArrayPalette, Palette};
use crate::section::Section;

/// LEB128, at most five bytes for a u32.
pub fn write_varint(w: &mut impl Write, mut value: u32) -> io::Result<()> {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            return w.write_all(&[byte]);
        }
        w.write_all(&[byte | 0x80])?;
    }
}

pub fn read_varint(r: &mut impl Read) -> io::Result<u32> {
    let mut value: u32 = 0;
    for shift in 0..5 {
        let mut byte = [0u8; 1];
        r.read_exact(&mut byte)?;
        value |= u32::from(byte[0] & 0x7f) << (shift * 7);
        if byte[0] & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(io::Error::new(io::ErrorKind::InvalidData, "varint longer than 5 bytes"))
}

/// `[count][global_id]*count`, every entry resolved through the registry.
pub fn write_array_palette(
    w: &mut impl Write,
    palette: &ArrayPalette,
    reg: &BlockRegistry,
) -> io::Result<()> {
    write_varint(w, palette.len() as u32)?;
    for &entry in palette.entries() {
        let id = if reg.contains(entry) { u32::from(entry.0) } else { 0 };
        write_varint(w, id)?;
    }
    Ok(())
}

pub fn read_array_palette(r: &mut impl Read, bits: usize) -> io::Result<ArrayPalette> {
    let count = read_varint(r)? as usize;
    if count > (1 << bits) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "palette entry count exceeds capacity",
        ));
    }
    let mut palette = ArrayPalette::new(bits);
    for _ in 0..count {
        let id = read_varint(r)?;
        let id = u16::try_from(id)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "global id out of range"))?;
        palette.push_raw(BlockState(id));
    }
    Ok(palette)
}

/// Persistence form: ordered list of entry names; list position is the
/// palette index.
pub fn palette_name_list(palette: &ArrayPalette, reg: &BlockRegistry) -> Vec<String> {
    palette
        .entries()
        .iter()
        .map(|&e| reg.name_of(e).to_string())
        .collect()
}

pub fn palette_from_name_list(names: &[String], bits: usize, reg: &BlockRegistry) -> ArrayPalette {
    let mut palette = ArrayPalette::new(bits);
    for name in names {
        let state = reg.id_by_name(name).unwrap_or_else(|| {
            log::warn!("unknown palette entry {name:?}, substituting air");
            BlockState::AIR
        });
        palette.push_raw(state);
    }
    palette
}

/// `[non_air_count][bits][palette?][word_count][words]`.
pub fn write_section(w: &mut impl Write, section: &Section, reg: &BlockRegistry) -> io::Result<()> {
    write_varint(w, u32::from(section.non_air_count()))?;
    let indices = section.indices();
    w.write_all(&[indices.bits() as u8])?;
    match section.palette() {
        Palette::Array(p) => write_array_palette(w, p, reg)?,
        Palette::Global => {}
    }
    write_varint(w, indices.words().len() as u32)?;
    for &word in indices.words() {
        w.write_all(&word.to_le_bytes())?;
    }
    Ok(())
}

pub fn read_section(r: &mut impl Read, _reg: &BlockRegistry) -> io::Result<Section> {
    let non_air = read_varint(r)?;
    let non_air = u16::try_from(non_air)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "non-air count out of range"))?;

    let mut bits_byte = [0u8; 1];
    r.read_exact(&mut bits_byte)?;
    let bits = bits_byte[0] as usize;
    // Direct indices are registry ids, and the id space is u16; anything
    // wider cannot have been written by `write_section`.
    if !(1..=16).contains(&bits) {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "bad entry width"));
    }

    let direct = bits > 8;
    let palette = if direct {
        Palette::Global
    } else {
        Palette::Array(read_array_palette(r, bits)?)
    };

    let word_count = read_varint(r)? as usize;
    let expected = SECTION_VOLUME.div_ceil(64 / bits);
    if word_count != expected {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "word count mismatch"));
    }
    let mut words = Vec::with_capacity(word_count);
    let mut buf = [0u8; 8];
    for _ in 0..word_count {
        r.read_exact(&mut buf)?;
        words.push(u64::from_le_bytes(buf));
    }
    let indices = PackedArray::from_words(bits, SECTION_VOLUME, words);
    Ok(Section::from_parts(palette, indices, non_air))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varint_boundaries() {
        for value in [0u32, 1, 127, 128, 300, 16383, 16384, u32::MAX] {
            let mut buf = Vec::new();
            write_varint(&mut buf, value).unwrap();
            assert!(buf.len() <= 5);
            assert_eq!(read_varint(&mut buf.as_slice()).unwrap(), value);
        }
    }

    #[test]
    fn truncated_varint_is_an_error() {
        let buf = vec![0x80u8, 0x80];
        assert!(read_varint(&mut buf.as_slice()).is_err());
    }

    #[test]
    fn palette_wire_round_trip() {
        let reg = BlockRegistry::builtin();
        let mut palette = ArrayPalette::with_default_air(4);
        palette.lookup(reg.id_by_name("stone").unwrap());
        palette.lookup(reg.id_by_name("water").unwrap());

        let mut buf = Vec::new();
        write_array_palette(&mut buf, &palette, &reg).unwrap();
        let back = read_array_palette(&mut buf.as_slice(), 4).unwrap();
        assert_eq!(back.entries(), palette.entries());
    }

    #[test]
    fn palette_name_list_positions_are_indices() {
        let reg = BlockRegistry::builtin();
        let mut palette = ArrayPalette::with_default_air(4);
        palette.lookup(reg.id_by_name("dirt").unwrap());
        let names = palette_name_list(&palette, &reg);
        assert_eq!(names, vec!["air".to_string(), "dirt".to_string()]);
        let back = palette_from_name_list(&names, 4, &reg);
        assert_eq!(back.entries(), palette.entries());
    }

    #[test]
    fn entry_width_past_the_id_space_is_rejected() {
        let reg = BlockRegistry::builtin();
        // non_air_count 0, then a 17-bit entry width: ids that wide
        // cannot fit the u16 state space and must not decode.
        let buf = vec![0u8, 17];
        let err = read_section(&mut buf.as_slice(), &reg).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn section_round_trip() {
        let reg = BlockRegistry::builtin();
        let stone = reg.id_by_name("stone").unwrap();
        let grass = reg.id_by_name("grass").unwrap();
        let mut section = Section::new_empty();
        for x in 0..16 {
            for z in 0..16 {
                section.set(x, 3, z, stone, &reg);
            }
            section.set(x, 4, 0, grass, &reg);
        }

        let mut buf = Vec::new();
        write_section(&mut buf, &section, &reg).unwrap();
        let back = read_section(&mut buf.as_slice(), &reg).unwrap();
        assert_eq!(back.non_air_count(), section.non_air_count());
        for x in 0..16 {
            for z in 0..16 {
                assert_eq!(back.get(x, 3, z), stone);
            }
            assert_eq!(back.get(x, 4, 0), grass);
            assert_eq!(back.get(x, 9, 9), loam_blocks::BlockState::AIR);
        }
    }
}
