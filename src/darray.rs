//! Select index over a bit vector (the "darray" of Okanohara &
//! Sadakane, Practical entropy-compressed rank/select dictionary,
//! ALENEX 2007).
//!
//! The indexed bits are grouped into super-blocks of `L = 1024`
//! positions. A super-block spanning fewer than `L2 = 65536` bits is
//! *dense*: its first position goes into `block_inventory` and one
//! 16-bit offset every `L3 = 32` positions into `subblock_inventory`,
//! leaving at most a 32-one scan per query. A wider super-block is
//! *sparse*: all of its positions are stored verbatim in
//! `overflow_positions` and the query is a single array read.
//!
//! `block_inventory` encodes the dense/sparse distinction in the sign:
//! a non-negative entry is the absolute position of the block's first
//! indexed bit; a negative entry `v` points at offset `-v - 1` into
//! `overflow_positions`.
//!
//! The same structure indexes either 1-bits ([`DArray1`]) or 0-bits
//! ([`DArray0`]), selected by a word filter applied on every read; the
//! bit data itself is never duplicated or complemented in memory.

use std::marker::PhantomData;

use crate::bitvec::BitVector;
use crate::broadword::select_in_word;
use crate::codec::{Codec, Reader, Writer};
use crate::error::{Error, Result};

/// Indexed positions per super-block (L).
const BLOCK_SIZE: u64 = 1024;
/// Span threshold separating dense from sparse super-blocks (L2).
const MAX_DENSE_SPAN: u64 = 1 << 16;
/// Indexed positions per subblock within a dense super-block (L3).
const SUBBLOCK_SIZE: u64 = 32;
/// Subblock sentinel for sparse super-blocks.
const SUBBLOCK_UNUSED: u16 = u16::MAX;

/// View of the bit data seen by the index: identity for select-1,
/// complement for select-0.
pub trait BitFilter {
    fn word(words: &[u64], i: usize) -> u64;
}

/// Index the set bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ones;

impl BitFilter for Ones {
    #[inline]
    fn word(words: &[u64], i: usize) -> u64 {
        words[i]
    }
}

/// Index the clear bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct Zeros;

impl BitFilter for Zeros {
    #[inline]
    fn word(words: &[u64], i: usize) -> u64 {
        !words[i]
    }
}

/// Select index over the 1-bits of a [`BitVector`].
pub type DArray1 = DArray<Ones>;
/// Select index over the 0-bits of a [`BitVector`].
pub type DArray0 = DArray<Zeros>;

/// Select index parameterized by the bit view.
///
/// The index stores only positions; every query takes the indexed
/// [`BitVector`] as an argument, exactly as it was at build time.
#[derive(Clone, Debug, Default)]
pub struct DArray<F> {
    positions: u64,
    block_inventory: Vec<i64>,
    subblock_inventory: Vec<u16>,
    overflow_positions: Vec<u64>,
    _filter: PhantomData<F>,
}

impl<F: BitFilter> DArray<F> {
    /// Build the index by streaming the filtered bits of `bv`.
    pub fn build(bv: &BitVector) -> Self {
        let words = bv.words();
        let mut positions = 0u64;
        let mut cur_block = Vec::with_capacity(BLOCK_SIZE as usize);
        let mut block_inventory = Vec::new();
        let mut subblock_inventory = Vec::new();
        let mut overflow_positions = Vec::new();

        for word_idx in 0..words.len() {
            let mut word = F::word(words, word_idx);
            let base = (word_idx as u64) << 6;
            while word != 0 {
                let pos = base + word.trailing_zeros() as u64;
                if pos >= bv.num_bits() {
                    break;
                }
                cur_block.push(pos);
                if cur_block.len() as u64 == BLOCK_SIZE {
                    Self::flush_block(
                        &mut cur_block,
                        &mut block_inventory,
                        &mut subblock_inventory,
                        &mut overflow_positions,
                    );
                }
                positions += 1;
                word &= word - 1;
            }
        }
        if !cur_block.is_empty() {
            Self::flush_block(
                &mut cur_block,
                &mut block_inventory,
                &mut subblock_inventory,
                &mut overflow_positions,
            );
        }

        Self {
            positions,
            block_inventory,
            subblock_inventory,
            overflow_positions,
            _filter: PhantomData,
        }
    }

    fn flush_block(
        cur_block: &mut Vec<u64>,
        block_inventory: &mut Vec<i64>,
        subblock_inventory: &mut Vec<u16>,
        overflow_positions: &mut Vec<u64>,
    ) {
        let first = cur_block[0];
        let last = cur_block[cur_block.len() - 1];
        if last - first < MAX_DENSE_SPAN {
            block_inventory.push(first as i64);
            for chunk_start in (0..cur_block.len()).step_by(SUBBLOCK_SIZE as usize) {
                subblock_inventory.push((cur_block[chunk_start] - first) as u16);
            }
        } else {
            block_inventory.push(-(overflow_positions.len() as i64) - 1);
            overflow_positions.extend_from_slice(cur_block);
            for _ in (0..cur_block.len()).step_by(SUBBLOCK_SIZE as usize) {
                subblock_inventory.push(SUBBLOCK_UNUSED);
            }
        }
        cur_block.clear();
    }

    /// Number of indexed bits.
    #[inline]
    pub fn num_positions(&self) -> u64 {
        self.positions
    }

    /// Position of the (i+1)-th indexed bit of `bv`.
    ///
    /// `bv` must be the vector the index was built over;
    /// `i < num_positions()` is required.
    #[inline]
    pub fn select(&self, bv: &BitVector, i: u64) -> u64 {
        debug_assert!(i < self.positions);
        let block = (i / BLOCK_SIZE) as usize;
        let block_pos = self.block_inventory[block];
        if block_pos < 0 {
            // Sparse super-block: verbatim position.
            let overflow_start = (-block_pos - 1) as u64;
            return self.overflow_positions[(overflow_start + (i & (BLOCK_SIZE - 1))) as usize];
        }

        let subblock = (i / SUBBLOCK_SIZE) as usize;
        let start_pos = block_pos as u64 + self.subblock_inventory[subblock] as u64;
        let mut remainder = i & (SUBBLOCK_SIZE - 1);
        if remainder == 0 {
            return start_pos;
        }

        let words = bv.words();
        let mut word_idx = (start_pos >> 6) as usize;
        let word_shift = start_pos & 63;
        let mut word = F::word(words, word_idx) & (u64::MAX << word_shift);
        loop {
            let popcount = word.count_ones() as u64;
            if remainder < popcount {
                break;
            }
            remainder -= popcount;
            word_idx += 1;
            word = F::word(words, word_idx);
        }
        ((word_idx as u64) << 6) + select_in_word(word, remainder as u32) as u64
    }

    /// Structural consistency checks, run once at decode time so the
    /// query path can index without bounds surprises on well-formed
    /// input. Count agreement with the covered bit vector is checked
    /// by the structure that owns both (see the Elias-Fano loader).
    fn validate(&self) -> Result<()> {
        let blocks = self.positions.div_ceil(BLOCK_SIZE) as usize;
        if self.block_inventory.len() != blocks {
            return Err(Error::CorruptSelect("block inventory size mismatch"));
        }
        if self.subblock_inventory.len() != self.positions.div_ceil(SUBBLOCK_SIZE) as usize {
            return Err(Error::CorruptSelect("subblock inventory size mismatch"));
        }
        for (b, &entry) in self.block_inventory.iter().enumerate() {
            if entry < 0 {
                // -entry - 1 without overflow on i64::MIN.
                let start = !entry as u64;
                let in_block = (self.positions - (b as u64) * BLOCK_SIZE).min(BLOCK_SIZE);
                if start + in_block > self.overflow_positions.len() as u64 {
                    return Err(Error::CorruptSelect("overflow offset out of range"));
                }
            }
        }
        Ok(())
    }
}

impl<F: BitFilter> Codec for DArray<F> {
    fn write(&self, w: &mut Writer) {
        w.u64(self.positions);
        w.i64_slice(&self.block_inventory);
        w.u16_slice(&self.subblock_inventory);
        w.u64_slice(&self.overflow_positions);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let positions = r.u64()?;
        let block_inventory = r.i64_vec()?;
        let subblock_inventory = r.u16_vec()?;
        let overflow_positions = r.u64_vec()?;
        let d = Self {
            positions,
            block_inventory,
            subblock_inventory,
            overflow_positions,
            _filter: PhantomData,
        };
        d.validate()?;
        Ok(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitvec::BitVectorBuilder;

    fn bitvec_with(num_bits: u64, positions: &[u64]) -> BitVector {
        let mut b = BitVectorBuilder::new(num_bits);
        for &p in positions {
            b.set(p);
        }
        b.build()
    }

    #[test]
    fn empty_vector() {
        let bv = BitVectorBuilder::new(0).build();
        let d = DArray1::build(&bv);
        assert_eq!(d.num_positions(), 0);
    }

    #[test]
    fn single_dense_block() {
        // 250 evenly spread ones, span well under 2^16: one dense block.
        let positions: Vec<u64> = (0..250).map(|i| i * 42).collect();
        let bv = bitvec_with(10_500, &positions);
        let d = DArray1::build(&bv);
        assert_eq!(d.num_positions(), 250);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(d.select(&bv, i as u64), p, "i={i}");
        }
    }

    #[test]
    fn single_sparse_block() {
        // 1024 ones spaced 128 bits apart: span 130944 >= 2^16, so the
        // whole block goes to overflow storage.
        let positions: Vec<u64> = (0..1024).map(|i| i * 128).collect();
        let bv = bitvec_with(1024 * 128, &positions);
        let d = DArray1::build(&bv);
        assert_eq!(d.num_positions(), 1024);
        assert_eq!(d.block_inventory, vec![-1]);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(d.select(&bv, i as u64), p, "i={i}");
        }
    }

    #[test]
    fn mixed_dense_and_sparse_blocks() {
        // First 1024 ones packed tight (dense), next 1024 spread wide
        // (sparse), then a dense tail.
        let mut positions: Vec<u64> = (0..1024).collect();
        positions.extend((0..1024).map(|i| 2048 + i * 256));
        let tail_base = 2048 + 1024 * 256;
        positions.extend((0..100).map(|i| tail_base + i * 3));
        let bv = bitvec_with(tail_base + 400, &positions);
        let d = DArray1::build(&bv);
        assert_eq!(d.num_positions(), positions.len() as u64);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(d.select(&bv, i as u64), p, "i={i}");
        }
    }

    #[test]
    fn select_zero_bits() {
        let ones: Vec<u64> = (0..300).map(|i| i * 2).collect(); // zeros at odd positions
        let bv = bitvec_with(600, &ones);
        let d = DArray0::build(&bv);
        assert_eq!(d.num_positions(), 300);
        for i in 0..300u64 {
            assert_eq!(d.select(&bv, i), 2 * i + 1, "i={i}");
        }
    }

    #[test]
    fn subblock_scan_crosses_words() {
        // Irregular gaps force the in-block scan across word boundaries.
        let positions: Vec<u64> = (0..200).map(|i| i * 61 + (i % 7)).collect();
        let bv = bitvec_with(13_000, &positions);
        let d = DArray1::build(&bv);
        for (i, &p) in positions.iter().enumerate() {
            assert_eq!(d.select(&bv, i as u64), p, "i={i}");
        }
    }

    #[test]
    fn codec_roundtrip() {
        let positions: Vec<u64> = (0..2000).map(|i| i * 37).collect();
        let bv = bitvec_with(2000 * 37 + 1, &positions);
        let d = DArray1::build(&bv);
        let bytes = d.to_bytes();
        let back = DArray1::from_bytes(&bytes).unwrap();
        assert_eq!(back.num_positions(), d.num_positions());
        for i in (0..2000).step_by(97) {
            assert_eq!(back.select(&bv, i), d.select(&bv, i));
        }
        assert_eq!(back.to_bytes(), bytes);
    }

    #[test]
    fn codec_rejects_inventory_mismatch() {
        let positions: Vec<u64> = (0..100).collect();
        let bv = bitvec_with(100, &positions);
        let d = DArray1::build(&bv);
        let mut bytes = d.to_bytes();
        // Inflate the declared position count.
        bytes[..8].copy_from_slice(&5000u64.to_le_bytes());
        assert!(matches!(
            DArray1::from_bytes(&bytes),
            Err(Error::CorruptSelect(_))
        ));
    }
}
