//! Pilot table compression.
//!
//! Pilot values repeat heavily: a handful of small displacements cover
//! most buckets. The dictionary encoder exploits this by storing each
//! distinct pilot once and a per-bucket rank into that table, both in
//! [`CompactVector`]s. The dual variant splits the bucket range in two
//! and trains a dictionary per half, so the dense region's larger
//! pilots do not widen the ranks of the sparse majority.

use std::collections::HashMap;

use crate::codec::{Codec, Reader, Writer};
use crate::compact::CompactVector;
use crate::error::{Error, Result};

/// Read access to the per-bucket pilot table.
pub trait PilotEncoder {
    /// Compress one pilot per bucket.
    fn encode(pilots: &[u64]) -> Self;

    /// Pilot for `bucket`.
    fn access(&self, bucket: u64) -> u64;

    /// Number of buckets covered.
    fn num_buckets(&self) -> u64;
}

/// Dictionary-compressed pilot table.
#[derive(Clone, Debug, Default)]
pub struct Dictionary {
    ranks: CompactVector,
    dict: CompactVector,
}

impl PilotEncoder for Dictionary {
    fn encode(pilots: &[u64]) -> Self {
        if pilots.is_empty() {
            return Self::default();
        }
        let mut rank_of = HashMap::new();
        let mut dict = Vec::new();
        let mut ranks = Vec::with_capacity(pilots.len());
        for &pilot in pilots {
            let rank = *rank_of.entry(pilot).or_insert_with(|| {
                dict.push(pilot);
                dict.len() as u64 - 1
            });
            ranks.push(rank);
        }
        Self {
            ranks: CompactVector::from_values(&ranks),
            dict: CompactVector::from_values(&dict),
        }
    }

    #[inline]
    fn access(&self, bucket: u64) -> u64 {
        self.dict.access(self.ranks.access(bucket))
    }

    #[inline]
    fn num_buckets(&self) -> u64 {
        self.ranks.size()
    }
}

impl Codec for Dictionary {
    fn write(&self, w: &mut Writer) {
        self.ranks.write(w);
        self.dict.write(w);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let ranks = CompactVector::read(r)?;
        let dict = CompactVector::read(r)?;
        // Every rank must point inside the dictionary.
        if ranks.size() > 0 {
            let limit = dict.size();
            if limit == 0 || ranks.iter().any(|rank| rank >= limit) {
                return Err(Error::InvariantViolation(
                    "pilot rank points past the dictionary",
                ));
            }
        }
        Ok(Self { ranks, dict })
    }
}

/// Two dictionaries, one per half of the bucket range.
///
/// The split point is chosen at build time and recovered from the
/// front size; `access` routes by comparing against it.
#[derive(Clone, Debug, Default)]
pub struct DualDictionary {
    front: Dictionary,
    back: Dictionary,
}

/// Fraction of buckets encoded by the front dictionary, matching the
/// skew bucketer's dense region.
const FRONT_FRACTION: f64 = 0.3;

impl PilotEncoder for DualDictionary {
    fn encode(pilots: &[u64]) -> Self {
        let front_len = (FRONT_FRACTION * pilots.len() as f64) as usize;
        Self {
            front: Dictionary::encode(&pilots[..front_len]),
            back: Dictionary::encode(&pilots[front_len..]),
        }
    }

    #[inline]
    fn access(&self, bucket: u64) -> u64 {
        if bucket < self.front.num_buckets() {
            self.front.access(bucket)
        } else {
            self.back.access(bucket - self.front.num_buckets())
        }
    }

    #[inline]
    fn num_buckets(&self) -> u64 {
        self.front.num_buckets() + self.back.num_buckets()
    }
}

impl Codec for DualDictionary {
    fn write(&self, w: &mut Writer) {
        self.front.write(w);
        self.back.write(w);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        Ok(Self {
            front: Dictionary::read(r)?,
            back: Dictionary::read(r)?,
        })
    }
}
