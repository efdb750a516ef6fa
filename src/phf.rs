//! The hash function itself: query driver over the compact
//! substrates.
//!
//! A lookup is `hash -> bucket -> pilot -> displaced position ->
//! optional free-slot remap`, a constant number of memory touches with
//! no branches on key bytes. For keys that were in the build set the
//! result is their unique index in `[0, num_keys)`; for anything else
//! it is an arbitrary index in the same range.

use std::marker::PhantomData;

use crate::bucketer::Bucketer;
use crate::codec::{Codec, Reader, Writer};
use crate::elias_fano::EliasFano;
use crate::encoder::PilotEncoder;
use crate::error::{Error, Result};
use crate::fastmod::{compute_m_u32, compute_m_u64, fastdiv_u32, fastmod_u32, fastmod_u64};
use crate::hash::{hash_key, hash_pilot, Hash64};

/// How a pilot displaces a key hash into a table position.
///
/// Implementations are zero-sized markers so the driver monomorphizes
/// per scheme; the displaced position must be in `[0, table_size)`.
pub trait SearchScheme {
    fn position(h2: u64, pilot: u64, seed: u64, m128: u128, m64: u64, table_size: u64) -> u64;
}

/// Xor displacement: `fastmod64(h2 ^ hash(pilot), table_size)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct XorDisplacement;

impl SearchScheme for XorDisplacement {
    #[inline]
    fn position(h2: u64, pilot: u64, seed: u64, m128: u128, _m64: u64, table_size: u64) -> u64 {
        let hashed_pilot = hash_pilot(pilot, seed);
        fastmod_u64(h2 ^ hashed_pilot, m128, table_size)
    }
}

/// Additive displacement: mixes `h2 + pilot/table_size` and adds the
/// pilot back before a 32-bit reduction. Pilot search under this
/// scheme only re-mixes when the pilot crosses a table-size boundary,
/// which keeps candidate probing cheap.
#[derive(Clone, Copy, Debug, Default)]
pub struct AddDisplacement;

impl SearchScheme for AddDisplacement {
    #[inline]
    fn position(h2: u64, pilot: u64, _seed: u64, _m128: u128, m64: u64, table_size: u64) -> u64 {
        let s = fastdiv_u32(pilot as u32, m64);
        let mixed = Hash64::new(h2.wrapping_add(s as u64)).mix();
        fastmod_u32(
            ((mixed >> 33).wrapping_add(pilot)) as u32,
            m64,
            table_size as u32,
        ) as u64
    }
}

/// A single (non-partitioned) perfect hash function.
///
/// `MINIMAL` controls whether positions at or past `num_keys` are
/// remapped through the free-slots sequence, making the output a
/// bijection onto `[0, num_keys)`.
///
/// Everything is immutable after construction; lookups borrow `self`
/// shared and are freely parallel.
#[derive(Clone, Debug)]
pub struct SinglePhf<B, E, S, const MINIMAL: bool> {
    seed: u64,
    num_keys: u64,
    table_size: u64,
    m128: u128,
    m64: u64,
    bucketer: B,
    pilots: E,
    free_slots: EliasFano,
    _search: PhantomData<S>,
}

/// The default configuration: skew bucketing, dictionary-of-
/// dictionaries pilots, xor displacement, minimal output range.
pub type MinimalPhf = SinglePhf<
    crate::bucketer::SkewBucketer,
    crate::encoder::DualDictionary,
    XorDisplacement,
    true,
>;

impl<B, E, S, const MINIMAL: bool> SinglePhf<B, E, S, MINIMAL>
where
    B: Bucketer,
    E: PilotEncoder,
    S: SearchScheme,
{
    pub(crate) fn from_parts(
        seed: u64,
        num_keys: u64,
        table_size: u64,
        bucketer: B,
        pilots: E,
        free_slots: EliasFano,
    ) -> Self {
        Self {
            seed,
            num_keys,
            table_size,
            m128: compute_m_u64(table_size),
            m64: compute_m_u32(table_size as u32),
            bucketer,
            pilots,
            free_slots,
            _search: PhantomData,
        }
    }

    /// Index for `key`.
    ///
    /// Total over all 64-bit inputs; keys outside the build set get an
    /// arbitrary in-range index.
    #[inline]
    pub fn lookup(&self, key: u64) -> u64 {
        self.position(hash_key(key, self.seed))
    }

    /// Index for an already-hashed key.
    #[inline]
    pub fn position(&self, hash: Hash64) -> u64 {
        let bucket = self.bucketer.bucket(hash.first());
        let pilot = self.pilots.access(bucket);
        let p = S::position(
            hash.second(),
            pilot,
            self.seed,
            self.m128,
            self.m64,
            self.table_size,
        );
        if MINIMAL && p >= self.num_keys {
            self.free_slots.access(p - self.num_keys)
        } else {
            p
        }
    }

    /// Number of keys in the build set; the output range is
    /// `[0, num_keys)` when minimal.
    #[inline]
    pub fn num_keys(&self) -> u64 {
        self.num_keys
    }

    /// Size of the underlying position table, `>= num_keys`.
    #[inline]
    pub fn table_size(&self) -> u64 {
        self.table_size
    }

    /// Seed the winning search ran with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl<B, E, S, const MINIMAL: bool> Codec for SinglePhf<B, E, S, MINIMAL>
where
    B: Bucketer + Codec,
    E: PilotEncoder + Codec,
    S: SearchScheme,
{
    fn write(&self, w: &mut Writer) {
        w.u64(self.seed);
        w.u64(self.num_keys);
        w.u64(self.table_size);
        w.u128(self.m128);
        w.u64(self.m64);
        self.bucketer.write(w);
        self.pilots.write(w);
        self.free_slots.write(w);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let seed = r.u64()?;
        let num_keys = r.u64()?;
        let table_size = r.u64()?;
        let m128 = r.u128()?;
        let m64 = r.u64()?;
        let bucketer = B::read(r)?;
        let pilots = E::read(r)?;
        let free_slots = EliasFano::read(r)?;

        if num_keys == 0 || table_size < num_keys {
            return Err(Error::InvariantViolation(
                "table size must cover the key count",
            ));
        }
        if m128 != compute_m_u64(table_size) || m64 != compute_m_u32(table_size as u32) {
            return Err(Error::InvariantViolation(
                "table reciprocals do not match the table size",
            ));
        }
        if bucketer.num_buckets() != pilots.num_buckets() {
            return Err(Error::InvariantViolation(
                "bucketer and pilot table disagree on the bucket count",
            ));
        }
        let expected_free = if MINIMAL { table_size - num_keys } else { 0 };
        if free_slots.size() != expected_free {
            return Err(Error::InvariantViolation(
                "free-slots size must be table_size - num_keys",
            ));
        }

        Ok(Self {
            seed,
            num_keys,
            table_size,
            m128,
            m64,
            bucketer,
            pilots,
            free_slots,
            _search: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildConfig;

    #[test]
    fn xor_and_add_disagree() {
        // Same inputs, different schemes: positions should differ for
        // at least some pilots, or the schemes collapsed.
        let (m128, m64) = (compute_m_u64(1000), compute_m_u32(1000));
        let h2 = 0x0123_4567_89AB_CDEFu64;
        let differing = (0..64u64)
            .filter(|&p| {
                XorDisplacement::position(h2, p, 7, m128, m64, 1000)
                    != AddDisplacement::position(h2, p, 7, m128, m64, 1000)
            })
            .count();
        assert!(differing > 0);
    }

    #[test]
    fn positions_stay_in_table() {
        let (m128, m64) = (compute_m_u64(997), compute_m_u32(997));
        for pilot in 0..200u64 {
            for h2 in [0u64, 1, u64::MAX, 0xDEAD_BEEF_1234_5678] {
                assert!(XorDisplacement::position(h2, pilot, 3, m128, m64, 997) < 997);
                assert!(AddDisplacement::position(h2, pilot, 3, m128, m64, 997) < 997);
            }
        }
    }

    #[test]
    fn lookup_is_deterministic() {
        let keys: Vec<u64> = (0..100).map(|i| i * 0x9E37_79B9 + 7).collect();
        let phf = MinimalPhf::build(&keys, &BuildConfig::default()).unwrap();
        for &k in &keys {
            assert_eq!(phf.lookup(k), phf.lookup(k));
        }
    }

    #[test]
    fn stranger_keys_stay_in_range() {
        let keys: Vec<u64> = (0..500).map(|i| i * 3 + 1).collect();
        let phf = MinimalPhf::build(&keys, &BuildConfig::default()).unwrap();
        let mut x = 0xABCD_EF01u64;
        for _ in 0..10_000 {
            x = x.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1);
            assert!(phf.lookup(x) < phf.num_keys());
        }
    }
}
