//! Elias-Fano encoding of monotone non-decreasing sequences.
//!
//! Each value `v` splits at bit `l = floor(log2(universe / n))`: the
//! low `l` bits go verbatim into a [`CompactVector`], the high part is
//! unary-coded in a [`BitVector`] as a 1-bit at position
//! `(v >> l) + i` for the i-th value. A [`DArray1`] over the high bits
//! gives O(1) `access`; with `INDEX_ZEROS` a [`DArray0`] additionally
//! accelerates predecessor/successor queries.
//!
//! With `ENCODE_PREFIX_SUM` the stored sequence is the prefix-sum
//! chain `[0, v0, v0+v1, ...]` of a (possibly unsorted) input, and
//! [`EliasFano::diff`] recovers the original elements.

use crate::bitvec::{BitVector, BitVectorBuilder};
use crate::broadword::msb;
use crate::codec::{Codec, Reader, Writer};
use crate::compact::{CompactIter, CompactVector, CompactVectorBuilder};
use crate::darray::{DArray0, DArray1};
use crate::error::{Error, Result};

/// A monotone sequence with constant-time random access.
///
/// Takes roughly `n * (2 + log2(universe / n))` bits plus the select
/// indexes. The two const parameters mirror the build-time choices:
/// `INDEX_ZEROS` enables [`next_geq`](EliasFano::next_geq) and
/// [`prev_leq`](EliasFano::prev_leq); `ENCODE_PREFIX_SUM` stores
/// running sums instead of the raw sequence.
#[derive(Clone, Debug, Default)]
pub struct EliasFano<const INDEX_ZEROS: bool = false, const ENCODE_PREFIX_SUM: bool = false> {
    back: u64,
    high_bits: BitVector,
    high_bits_d1: DArray1,
    high_bits_d0: DArray0,
    low_bits: CompactVector,
}

impl<const INDEX_ZEROS: bool, const ENCODE_PREFIX_SUM: bool>
    EliasFano<INDEX_ZEROS, ENCODE_PREFIX_SUM>
{
    /// Encode `values`.
    ///
    /// Without `ENCODE_PREFIX_SUM` the input must be monotone
    /// non-decreasing ([`Error::NotSorted`] otherwise) and `universe`
    /// defaults to the last element. With `ENCODE_PREFIX_SUM` the
    /// input is arbitrary, a leading zero is prepended, and the
    /// universe is the total sum regardless of the argument.
    ///
    /// An empty input yields a valid empty structure.
    pub fn encode(values: &[u64], universe: Option<u64>) -> Result<Self> {
        if values.is_empty() {
            return Ok(Self::default());
        }

        let stored: Vec<u64>;
        let (seq, universe) = if ENCODE_PREFIX_SUM {
            let mut sums = Vec::with_capacity(values.len() + 1);
            let mut total = 0u64;
            sums.push(0);
            for &v in values {
                total += v;
                sums.push(total);
            }
            stored = sums;
            (&stored[..], total)
        } else {
            for (i, pair) in values.windows(2).enumerate() {
                if pair[1] < pair[0] {
                    return Err(Error::NotSorted {
                        index: i as u64 + 1,
                    });
                }
            }
            let last = *values.last().expect("non-empty");
            let universe = universe.unwrap_or(last);
            if universe < last {
                return Err(Error::InvariantViolation(
                    "universe smaller than the last element",
                ));
            }
            (values, universe)
        };

        let n = seq.len() as u64;
        let l = if universe / n > 0 {
            msb(universe / n) as u64
        } else {
            0
        };
        let low_mask = if l == 0 { 0 } else { (1u64 << l) - 1 };

        let mut high = BitVectorBuilder::new(n + (universe >> l) + 1);
        let mut low = CompactVectorBuilder::new(n, l);
        for (i, &v) in seq.iter().enumerate() {
            if l != 0 {
                low.set(i as u64, v & low_mask);
            }
            high.set((v >> l) + i as u64);
        }

        let high_bits = high.build();
        let high_bits_d1 = DArray1::build(&high_bits);
        let high_bits_d0 = if INDEX_ZEROS {
            DArray0::build(&high_bits)
        } else {
            DArray0::default()
        };

        Ok(Self {
            back: *seq.last().expect("non-empty"),
            high_bits,
            high_bits_d1,
            high_bits_d0,
            low_bits: low.build(),
        })
    }

    /// Number of stored values (including the prepended zero in
    /// prefix-sum mode).
    #[inline]
    pub fn size(&self) -> u64 {
        self.low_bits.size()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Largest stored value.
    #[inline]
    pub fn back(&self) -> u64 {
        self.back
    }

    /// The i-th stored value.
    ///
    /// The select result minus `i` is exactly `v >> l`; the low bits
    /// fill in the rest.
    #[inline]
    pub fn access(&self, i: u64) -> u64 {
        debug_assert!(i < self.size());
        let high_val = self.high_bits_d1.select(&self.high_bits, i) - i;
        let low_val = self.low_bits.access(i);
        (high_val << self.low_bits.width()) | low_val
    }

    /// Iterate the stored values in order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            ones: self.high_bits.ones(),
            lows: self.low_bits.iter(),
            width: self.low_bits.width(),
            i: 0,
        }
    }
}

impl<const ENCODE_PREFIX_SUM: bool> EliasFano<true, ENCODE_PREFIX_SUM> {
    /// Position and value of the leftmost element `>= x`.
    ///
    /// Saturates to `(size() - 1, back())` when `x > back()`.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is empty.
    pub fn next_geq(&self, x: u64) -> (u64, u64) {
        assert!(!self.is_empty(), "next_geq on empty sequence");
        if x > self.back {
            return (self.size() - 1, self.back);
        }
        let h = x >> self.low_bits.width();
        // Number of ones before the h-th zero, i.e. the first index
        // whose high part can reach h.
        let mut pos = if h > 0 {
            self.high_bits_d0.select(&self.high_bits, h - 1) - (h - 1)
        } else {
            0
        };
        loop {
            // x <= back keeps pos inside the sequence.
            let val = self.access(pos);
            if val >= x {
                return (pos, val);
            }
            pos += 1;
        }
    }

    /// Position and value of the rightmost element `<= x`.
    ///
    /// Saturates to `(size() - 1, back())` when `x >= back()`; returns
    /// `None` when `x` is smaller than the first element.
    ///
    /// # Panics
    ///
    /// Panics if the sequence is empty.
    pub fn prev_leq(&self, x: u64) -> Option<(u64, u64)> {
        assert!(!self.is_empty(), "prev_leq on empty sequence");
        if x >= self.back {
            return Some((self.size() - 1, self.back));
        }
        let (pos, val) = self.next_geq(x);
        if val == x {
            let mut p = pos;
            while p + 1 < self.size() && self.access(p + 1) == x {
                p += 1;
            }
            return Some((p, x));
        }
        if pos == 0 {
            return None;
        }
        Some((pos - 1, self.access(pos - 1)))
    }
}

impl<const INDEX_ZEROS: bool> EliasFano<INDEX_ZEROS, true> {
    /// The i-th element of the original (pre-prefix-sum) sequence,
    /// `stored[i+1] - stored[i]`.
    ///
    /// The second select is replaced by stepping one 1-bit forward
    /// from the first, since consecutive elements sit in adjacent
    /// unary runs.
    pub fn diff(&self, i: u64) -> u64 {
        debug_assert!(i + 1 < self.size());
        let l = self.low_bits.width();
        let low1 = self.low_bits.access(i);
        let low2 = self.low_bits.access(i + 1);
        let pos = self.high_bits_d1.select(&self.high_bits, i);
        let h1 = pos - i;
        let h2 = match self.high_bits.next_one(pos + 1) {
            Some(next) => next - i - 1,
            None => unreachable!("high bits end inside the sequence"),
        };
        ((h2 << l) | low2) - ((h1 << l) | low1)
    }
}

/// In-order iterator over an [`EliasFano`] sequence.
pub struct Iter<'a> {
    ones: crate::bitvec::Ones<'a>,
    lows: CompactIter<'a>,
    width: u64,
    i: u64,
}

impl Iterator for Iter<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let high_pos = self.ones.next()?;
        let low = self.lows.next()?;
        let value = ((high_pos - self.i) << self.width) | low;
        self.i += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lows.size_hint()
    }
}

impl<const INDEX_ZEROS: bool, const ENCODE_PREFIX_SUM: bool> Codec
    for EliasFano<INDEX_ZEROS, ENCODE_PREFIX_SUM>
{
    fn write(&self, w: &mut Writer) {
        w.u64(self.back);
        self.high_bits.write(w);
        self.high_bits_d1.write(w);
        self.high_bits_d0.write(w);
        self.low_bits.write(w);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let back = r.u64()?;
        let high_bits = BitVector::read(r)?;
        let high_bits_d1 = DArray1::read(r)?;
        let high_bits_d0 = DArray0::read(r)?;
        let low_bits = CompactVector::read(r)?;

        let ones = high_bits.count_ones();
        if high_bits_d1.num_positions() != ones {
            return Err(Error::CorruptSelect(
                "one index does not cover the high bits",
            ));
        }
        if INDEX_ZEROS {
            if high_bits_d0.num_positions() != high_bits.num_bits() - ones {
                return Err(Error::CorruptSelect(
                    "zero index does not cover the high bits",
                ));
            }
        } else if high_bits_d0.num_positions() != 0 {
            return Err(Error::InvariantViolation("unexpected zero index"));
        }
        if low_bits.size() != ones {
            return Err(Error::InvariantViolation(
                "low bits and high bits disagree on the element count",
            ));
        }

        let ef = Self {
            back,
            high_bits,
            high_bits_d1,
            high_bits_d0,
            low_bits,
        };
        if !ef.is_empty() && ef.access(ef.size() - 1) != ef.back {
            return Err(Error::InvariantViolation(
                "stored back does not match the last element",
            ));
        }
        Ok(ef)
    }
}
