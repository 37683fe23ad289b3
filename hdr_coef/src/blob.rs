use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{HdrCoefError, Result};
use crate::packer::{self, SubModuleGeometry};

pub const LUT_MAGIC: u32 = 0xDADA_DADA;

/// Serialized size of a `LutHeader`
pub const LUT_HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LutHeader {
    /// Register byte offset the payload is written to
    pub byte_offset: u32,
    /// Payload length in 32-bit words
    pub length: u32,
    pub magic: u32,
}

impl LutHeader {
    pub fn new(byte_offset: u32, length: u32) -> Self {
        Self {
            byte_offset,
            length,
            magic: LUT_MAGIC,
        }
    }

    pub fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(&self.byte_offset.to_le_bytes());
        out[4..8].copy_from_slice(&self.length.to_le_bytes());
        out[8..12].copy_from_slice(&self.magic.to_le_bytes());
    }
}

/// One packed sub-module payload, ready to be placed in a layer buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CoefficientBlob {
    pub header: LutHeader,
    pub words: Vec<u32>,
    pub group_id: i32,
}

impl CoefficientBlob {
    /// Packs `values` for a sub-module. The payload always spans the
    /// sub-module's full register count, unused words are zero.
    pub fn pack(values: &[i64], geometry: &SubModuleGeometry) -> Result<Self> {
        let mut words = packer::pack(values, geometry)?;
        words.resize(geometry.reg_num as usize, 0);

        Ok(Self {
            header: LutHeader::new(geometry.reg_offset, geometry.reg_num),
            words,
            group_id: geometry.group_id,
        })
    }

    /// Serialized size in bytes, header included
    pub fn size(&self) -> usize {
        LUT_HEADER_SIZE + self.words.len() * 4
    }

    /// ORs the payload of `other` into `self`.
    ///
    /// Both blobs must describe the same register range.
    pub fn merge(&mut self, other: &CoefficientBlob) -> Result<&mut Self> {
        if self.header != other.header || self.words.len() != other.words.len() {
            return Err(HdrCoefError::IncompatibleMerge {
                group_id: other.group_id,
            });
        }

        self.words
            .iter_mut()
            .zip(other.words.iter())
            .for_each(|(word, other)| *word |= other);

        Ok(self)
    }

    /// Queues ungrouped blobs directly, grouped ones are OR-merged per group.
    pub fn queue_or_group(
        self,
        pending: &mut Vec<CoefficientBlob>,
        groups: &mut GroupMap,
    ) -> Result<()> {
        if self.group_id < 0 {
            pending.push(self);
            Ok(())
        } else {
            groups.insert_or_merge(self)
        }
    }

    /// Writes header and payload at `offset`, returning the offset past the entry.
    pub fn serialize(&self, out: &mut [u8], offset: usize) -> Result<usize> {
        let end = offset + self.size();

        if out.len() < end {
            return Err(HdrCoefError::BufferTooSmall {
                needed: end,
                available: out.len(),
            });
        }

        self.header.write(&mut out[offset..offset + LUT_HEADER_SIZE]);

        out[offset + LUT_HEADER_SIZE..end]
            .chunks_exact_mut(4)
            .zip(self.words.iter())
            .for_each(|(dst, word)| dst.copy_from_slice(&word.to_le_bytes()));

        Ok(end)
    }
}

/// Merge groups, kept in the order their ids were first seen.
#[derive(Debug, Default, Clone)]
pub struct GroupMap {
    entries: Vec<CoefficientBlob>,
    index: HashMap<i32, usize>,
}

impl GroupMap {
    pub fn insert_or_merge(&mut self, blob: CoefficientBlob) -> Result<()> {
        if let Some(&idx) = self.index.get(&blob.group_id) {
            self.entries[idx].merge(&blob)?;
        } else {
            self.index.insert(blob.group_id, self.entries.len());
            self.entries.push(blob);
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, group_id: i32) -> Option<&CoefficientBlob> {
        self.index.get(&group_id).map(|&idx| &self.entries[idx])
    }

    /// Moves every group after the directly queued entries.
    pub fn flush_into(&mut self, pending: &mut Vec<CoefficientBlob>) {
        self.index.clear();
        pending.append(&mut self.entries);
    }
}

/// Drops an entry when a later one programs the same registers with the same group.
pub fn clean_duplicates(list: &mut Vec<CoefficientBlob>) {
    let mut seen = HashSet::new();
    let mut keep: Vec<bool> = list
        .iter()
        .rev()
        .map(|blob| {
            seen.insert((
                blob.header.byte_offset,
                blob.header.length,
                blob.group_id,
            ))
        })
        .collect();
    keep.reverse();

    let mut flags = keep.into_iter();
    list.retain(|_| flags.next().unwrap_or(true));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(offset: u32, words: Vec<u32>, group_id: i32) -> CoefficientBlob {
        CoefficientBlob {
            header: LutHeader::new(offset, words.len() as u32),
            words,
            group_id,
        }
    }

    #[test]
    fn merge_ors_payloads() {
        let mut a = blob(0x10, vec![0x1, 0x10], 0);
        let b = blob(0x10, vec![0x2, 0x100], 0);

        a.merge(&b).unwrap();
        assert_eq!(a.words, vec![0x3, 0x110]);
    }

    #[test]
    fn merge_rejects_different_headers() {
        let mut a = blob(0x10, vec![0x1], 0);
        let b = blob(0x14, vec![0x2], 0);

        assert!(matches!(
            a.merge(&b),
            Err(HdrCoefError::IncompatibleMerge { group_id: 0 })
        ));
        assert_eq!(a.words, vec![0x1]);
    }

    #[test]
    fn groups_follow_direct_entries_in_first_seen_order() {
        let mut pending = Vec::new();
        let mut groups = GroupMap::default();

        let queued = [
            blob(0x20, vec![1], 7),
            blob(0x00, vec![1], -1),
            blob(0x30, vec![1], 2),
            blob(0x20, vec![4], 7),
            blob(0x04, vec![1], -1),
        ];

        for entry in queued {
            entry.queue_or_group(&mut pending, &mut groups).unwrap();
        }

        groups.flush_into(&mut pending);

        let offsets: Vec<u32> = pending.iter().map(|b| b.header.byte_offset).collect();
        assert_eq!(offsets, vec![0x00, 0x04, 0x20, 0x30]);
        assert_eq!(pending[2].words, vec![5]);
        assert!(groups.is_empty());
    }

    #[test]
    fn serialize_is_little_endian() {
        let entry = blob(0x1234, vec![0xAABBCCDD], -1);
        let mut out = vec![0u8; 16];

        let end = entry.serialize(&mut out, 0).unwrap();
        assert_eq!(end, 16);
        assert_eq!(
            out,
            vec![
                0x34, 0x12, 0, 0, 1, 0, 0, 0, 0xDA, 0xDA, 0xDA, 0xDA, 0xDD, 0xCC, 0xBB, 0xAA
            ]
        );

        let mut short = vec![0u8; 15];
        assert!(entry.serialize(&mut short, 0).is_err());
    }

    #[test]
    fn duplicates_keep_the_later_entry() {
        let mut list = vec![
            blob(0x0, vec![1], -1),
            blob(0x4, vec![2], -1),
            blob(0x0, vec![3], -1),
            blob(0x0, vec![4], 1),
        ];

        clean_duplicates(&mut list);

        let words: Vec<u32> = list.iter().map(|b| b.words[0]).collect();
        assert_eq!(words, vec![2, 3, 4]);
    }

    #[test]
    fn pack_pads_to_register_count() {
        let geometry = SubModuleGeometry {
            name: String::from("mod_en"),
            num_nodes: 1,
            nodes_per_reg: 1,
            last_node_align: true,
            bit_offsets: vec![0],
            masks: vec![0x1],
            reg_offset: 0x40,
            reg_num: 2,
            group_id: 3,
        };

        let packed = CoefficientBlob::pack(&[1], &geometry).unwrap();
        assert_eq!(packed.words, vec![1, 0]);
        assert_eq!(packed.header, LutHeader::new(0x40, 2));
        assert_eq!(packed.group_id, 3);
        assert_eq!(packed.size(), 20);
    }
}
