use bitvec::prelude::*;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::error::{HdrCoefError, Result};

/// Register layout of one hardware sub-module.
///
/// `num_nodes` values are spread over `reg_num` 32-bit words starting at byte
/// `reg_offset`, `nodes_per_reg` values per word. Value `i` of a word is masked
/// with `masks[i]` and shifted left by `bit_offsets[i]`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SubModuleGeometry {
    pub name: String,
    pub num_nodes: usize,
    pub nodes_per_reg: usize,
    pub last_node_align: bool,
    pub bit_offsets: Vec<u32>,
    pub masks: Vec<u32>,
    pub reg_offset: u32,
    pub reg_num: u32,
    /// Merge group, -1 when entries are queued on their own
    pub group_id: i32,
}

impl SubModuleGeometry {
    /// Number of words produced by packing `num_nodes` values.
    pub fn packed_words(&self) -> usize {
        if self.nodes_per_reg == 0 {
            0
        } else {
            self.num_nodes.div_ceil(self.nodes_per_reg)
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| HdrCoefError::InvalidGeometry {
            name: self.name.clone(),
            reason,
        };

        if self.nodes_per_reg == 0 {
            return Err(invalid("num-nodes-per-reg must be positive".into()));
        }

        let per_reg = self.nodes_per_reg.min(self.num_nodes);
        if self.bit_offsets.len() < per_reg || self.masks.len() < per_reg {
            return Err(invalid(format!(
                "{per_reg} nodes per register but {} offsets and {} masks",
                self.bit_offsets.len(),
                self.masks.len()
            )));
        }

        if let Some(offset) = self.bit_offsets.iter().find(|&&o| o >= 32) {
            return Err(invalid(format!("bit offset {offset} outside a 32-bit word")));
        }

        if self.packed_words() > self.reg_num as usize {
            return Err(invalid(format!(
                "{} packed words do not fit in {} registers",
                self.packed_words(),
                self.reg_num
            )));
        }

        Ok(())
    }
}

/// Packs `values` into register words following `geometry`.
///
/// Fails with `GeometryMismatch` when the value count differs from the
/// declared node count.
pub fn pack(values: &[i64], geometry: &SubModuleGeometry) -> Result<Vec<u32>> {
    if values.len() != geometry.num_nodes {
        return Err(HdrCoefError::GeometryMismatch {
            name: geometry.name.clone(),
            expected: geometry.num_nodes,
            actual: values.len(),
        });
    }

    geometry.validate()?;

    let words = values
        .chunks(geometry.nodes_per_reg)
        .map(|group| pack_one(group, geometry))
        .collect();

    Ok(words)
}

fn pack_one(group: &[i64], geometry: &SubModuleGeometry) -> u32 {
    let place = |i: usize| ((group[i] as u32) & geometry.masks[i]) << geometry.bit_offsets[i];

    if geometry.last_node_align {
        (0..group.len()).fold(0, |word, i| word | place(i))
    } else {
        (0..group.len()).rev().fold(0, |word, i| word | place(i))
    }
}

/// Extracts the masked values back out of packed words.
pub fn unpack(words: &[u32], geometry: &SubModuleGeometry) -> Vec<u32> {
    let per_reg = geometry.nodes_per_reg.max(1);

    (0..geometry.num_nodes)
        .map(|node| {
            let word = words.get(node / per_reg).copied().unwrap_or(0);
            let slot = node % per_reg;

            let bits = word.view_bits::<Lsb0>();
            let offset = geometry.bit_offsets[slot] as usize;

            bits[offset..].load_le::<u32>() & geometry.masks[slot]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(num_nodes: usize, nodes_per_reg: usize, align: bool) -> SubModuleGeometry {
        SubModuleGeometry {
            name: String::from("test"),
            num_nodes,
            nodes_per_reg,
            last_node_align: align,
            bit_offsets: vec![0, 16],
            masks: vec![0x3fff, 0x3fff],
            reg_offset: 0x100,
            reg_num: num_nodes.div_ceil(nodes_per_reg) as u32,
            group_id: -1,
        }
    }

    #[test]
    fn packs_pairs_and_trailing_group() {
        let geo = geometry(3, 2, true);
        let words = pack(&[1, 2, 0x7fff], &geo).unwrap();

        assert_eq!(words, vec![0x0002_0001, 0x3fff]);
    }

    #[test]
    fn alignment_does_not_change_placement() {
        let values = [0x123, 0x456, 0x789, 0xabc];

        let forward = pack(&values, &geometry(4, 2, true)).unwrap();
        let backward = pack(&values, &geometry(4, 2, false)).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let err = pack(&[1, 2], &geometry(3, 2, true)).unwrap_err();

        assert!(matches!(
            err,
            HdrCoefError::GeometryMismatch {
                expected: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn unpack_recovers_masked_values() {
        let geo = SubModuleGeometry {
            name: String::from("gm"),
            num_nodes: 9,
            nodes_per_reg: 3,
            last_node_align: true,
            bit_offsets: vec![0, 10, 21],
            masks: vec![0x3ff, 0x7ff, 0x7ff],
            reg_offset: 0,
            reg_num: 3,
            group_id: -1,
        };
        let values: Vec<i64> = vec![1023, 2047, 5, -1, 4096, 300, 77, 0, 1500];

        let words = pack(&values, &geo).unwrap();
        let unpacked = unpack(&words, &geo);

        let expected: Vec<u32> = values
            .iter()
            .enumerate()
            .map(|(i, v)| (*v as u32) & geo.masks[i % 3])
            .collect();

        assert_eq!(unpacked, expected);
    }

    #[test]
    fn geometry_needing_more_registers_is_invalid() {
        let mut geo = geometry(4, 2, true);
        geo.reg_num = 1;

        assert!(geo.validate().is_err());
        assert!(pack(&[0, 0, 0, 0], &geo).is_err());
    }
}
