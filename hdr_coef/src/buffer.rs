#[cfg(feature = "serde")]
use serde::Serialize;

use crate::blob::{CoefficientBlob, LutHeader, LUT_HEADER_SIZE, LUT_MAGIC};
use crate::error::{HdrCoefError, Result};

/// Serialized size of a `CoefHeader`
pub const COEF_HEADER_SIZE: usize = 16;

/// Hardware type reported for DPU buffers
pub const HW_TYPE_DPU: u8 = 1;

/// Global header at the start of every layer buffer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CoefHeader {
    pub total_bytes: u32,
    pub hw_type: u8,
    pub layer_index: u8,
    pub log_level: u8,
    pub optional_flag: u8,
    pub mul_en: u8,
    pub mod_en: u8,
    pub mandatory_count: u16,
    pub optional_count: u16,
}

impl CoefHeader {
    fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.total_bytes.to_le_bytes());
        out[4..8].copy_from_slice(&[
            self.hw_type,
            self.layer_index,
            self.log_level,
            self.optional_flag,
        ]);
        out[8..12].copy_from_slice(&[self.mul_en, self.mod_en, 0, 0]);
        out[12..14].copy_from_slice(&self.mandatory_count.to_le_bytes());
        out[14..16].copy_from_slice(&self.optional_count.to_le_bytes());
    }

    fn read(data: &[u8]) -> Self {
        Self {
            total_bytes: read_u32(data, 0),
            hw_type: data[4],
            layer_index: data[5],
            log_level: data[6],
            optional_flag: data[7],
            mul_en: data[8],
            mod_en: data[9],
            mandatory_count: u16::from_le_bytes([data[12], data[13]]),
            optional_count: u16::from_le_bytes([data[14], data[15]]),
        }
    }
}

/// Entries of one layer, in output order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LayerEntries {
    pub mandatory: Vec<CoefficientBlob>,
    pub optional: Vec<CoefficientBlob>,
}

impl LayerEntries {
    pub fn byte_size(&self) -> usize {
        COEF_HEADER_SIZE
            + self
                .mandatory
                .iter()
                .chain(self.optional.iter())
                .map(CoefficientBlob::size)
                .sum::<usize>()
    }

    /// Lays out the global header followed by mandatory then optional entries.
    ///
    /// `mod_en` reports whether the layer's color pipeline is active.
    pub fn serialize(&self, layer_index: usize, log_level: i32, mod_en: bool) -> Result<Vec<u8>> {
        let total = self.byte_size();

        let header = CoefHeader {
            total_bytes: total as u32,
            hw_type: HW_TYPE_DPU,
            layer_index: layer_index as u8,
            log_level: log_level as u8,
            optional_flag: 0,
            mul_en: 0,
            mod_en: mod_en as u8,
            mandatory_count: self.mandatory.len() as u16,
            optional_count: self.optional.len() as u16,
        };

        let mut out = vec![0; total];
        header.write(&mut out);

        let mut offset = COEF_HEADER_SIZE;
        for entry in self.mandatory.iter().chain(self.optional.iter()) {
            offset = entry.serialize(&mut out, offset)?;
        }

        Ok(out)
    }
}

/// A layer buffer read back from its serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ParsedCoefBuffer {
    pub header: CoefHeader,
    pub mandatory: Vec<ParsedEntry>,
    pub optional: Vec<ParsedEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ParsedEntry {
    pub header: LutHeader,
    pub words: Vec<u32>,
}

impl ParsedCoefBuffer {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < COEF_HEADER_SIZE {
            return Err(HdrCoefError::MalformedBuffer(format!(
                "{} bytes is shorter than the global header",
                data.len()
            )));
        }

        let header = CoefHeader::read(data);

        if header.total_bytes as usize != data.len() {
            return Err(HdrCoefError::MalformedBuffer(format!(
                "header declares {} bytes, buffer holds {}",
                header.total_bytes,
                data.len()
            )));
        }

        let mut offset = COEF_HEADER_SIZE;
        let mandatory = parse_entries(data, &mut offset, header.mandatory_count)?;
        let optional = parse_entries(data, &mut offset, header.optional_count)?;

        if offset != data.len() {
            return Err(HdrCoefError::MalformedBuffer(format!(
                "{} trailing bytes after the last entry",
                data.len() - offset
            )));
        }

        Ok(Self {
            header,
            mandatory,
            optional,
        })
    }
}

fn parse_entries(data: &[u8], offset: &mut usize, count: u16) -> Result<Vec<ParsedEntry>> {
    (0..count)
        .map(|_| {
            if data.len() < *offset + LUT_HEADER_SIZE {
                return Err(HdrCoefError::MalformedBuffer(format!(
                    "entry header at {} runs past the end",
                    *offset
                )));
            }

            let header = LutHeader {
                byte_offset: read_u32(data, *offset),
                length: read_u32(data, *offset + 4),
                magic: read_u32(data, *offset + 8),
            };

            if header.magic != LUT_MAGIC {
                return Err(HdrCoefError::MalformedBuffer(format!(
                    "bad magic 0x{:08X} at {}",
                    header.magic, *offset
                )));
            }

            let start = *offset + LUT_HEADER_SIZE;
            let end = start + header.length as usize * 4;

            if data.len() < end {
                return Err(HdrCoefError::MalformedBuffer(format!(
                    "entry at {} declares {} words past the end",
                    *offset, header.length
                )));
            }

            let words = data[start..end]
                .chunks_exact(4)
                .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
                .collect();

            *offset = end;

            Ok(ParsedEntry { header, words })
        })
        .collect()
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(offset: u32, words: Vec<u32>) -> CoefficientBlob {
        CoefficientBlob {
            header: LutHeader::new(offset, words.len() as u32),
            words,
            group_id: -1,
        }
    }

    #[test]
    fn header_layout() {
        let entries = LayerEntries {
            mandatory: vec![entry(0x100, vec![1, 2])],
            optional: vec![entry(0x0, vec![0])],
        };

        let data = entries.serialize(3, 2, true).unwrap();

        assert_eq!(data.len(), 16 + 20 + 16);
        assert_eq!(&data[0..4], &(52u32).to_le_bytes());
        assert_eq!(&data[4..8], &[1, 3, 2, 0]);
        assert_eq!(&data[8..12], &[0, 1, 0, 0]);
        assert_eq!(&data[12..16], &[1, 0, 1, 0]);
        assert_eq!(&data[16..20], &(0x100u32).to_le_bytes());
    }

    #[test]
    fn total_size_matches_contents() {
        let entries = LayerEntries {
            mandatory: vec![entry(0x0, vec![1]), entry(0x4, vec![1, 2, 3])],
            optional: Vec::new(),
        };

        let data = entries.serialize(0, 0, false).unwrap();
        let parsed = ParsedCoefBuffer::parse(&data).unwrap();

        assert_eq!(parsed.header.total_bytes as usize, data.len());
        assert_eq!(parsed.header.mandatory_count, 2);
        assert_eq!(parsed.header.optional_count, 0);
        assert_eq!(parsed.mandatory[1].words, vec![1, 2, 3]);
    }

    #[test]
    fn parse_rejects_truncation_and_bad_magic() {
        let entries = LayerEntries {
            mandatory: vec![entry(0x0, vec![7])],
            optional: Vec::new(),
        };
        let data = entries.serialize(0, 0, true).unwrap();

        assert!(ParsedCoefBuffer::parse(&data[..10]).is_err());
        assert!(ParsedCoefBuffer::parse(&data[..data.len() - 4]).is_err());

        let mut corrupted = data.clone();
        corrupted[24] = 0;
        assert!(matches!(
            ParsedCoefBuffer::parse(&corrupted),
            Err(HdrCoefError::MalformedBuffer(_))
        ));
    }
}
