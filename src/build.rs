//! Internal-memory construction: turn a key set into a serialized
//! search result.
//!
//! The search places buckets largest-first into a `taken` table,
//! trying successive pilots until every key in the bucket lands on a
//! distinct empty slot. Displacement goes through the exact same
//! [`SearchScheme`] the query path uses, so a successful build is
//! correct by construction. A seed whose search stalls (pilot cap, or
//! two keys in one bucket sharing a full 128-bit hash) is abandoned
//! and a fresh one tried, up to an attempt cap.

use crate::bitvec::BitVectorBuilder;
use crate::bucketer::Bucketer;
use crate::codec::Codec;
use crate::elias_fano::EliasFano;
use crate::encoder::PilotEncoder;
use crate::error::{Error, Result};
use crate::fastmod::{compute_m_u32, compute_m_u64};
use crate::hash::hash_key;
use crate::phf::{SearchScheme, SinglePhf};

/// Pilots tried per bucket before giving up on the seed.
const MAX_PILOT: u64 = 1 << 24;
/// Random seeds tried before reporting failure.
const MAX_SEED_ATTEMPTS: u32 = 16;

/// Knobs for the construction.
#[derive(Clone, Copy, Debug)]
pub struct BuildConfig {
    /// Load factor: `table_size = ceil(num_keys / alpha)`. In `(0, 1]`;
    /// lower values make the search faster and the table emptier.
    pub alpha: f64,
    /// Average bucket size: `num_buckets = ceil(num_keys / lambda)`.
    pub lambda: f64,
    /// Fixed seed. `None` draws random seeds and retries on failure;
    /// a fixed seed gets exactly one attempt.
    pub seed: Option<u64>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            alpha: 0.94,
            lambda: 5.0,
            seed: None,
        }
    }
}

impl<B, E, S, const MINIMAL: bool> SinglePhf<B, E, S, MINIMAL>
where
    B: Bucketer,
    E: PilotEncoder,
    S: SearchScheme,
{
    /// Build over `keys`, which must be distinct.
    ///
    /// Duplicate keys make every seed fail and surface as
    /// [`Error::SeedSearchFailed`] after the attempt cap.
    pub fn build(keys: &[u64], config: &BuildConfig) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::InvariantViolation(
                "cannot build from an empty key set",
            ));
        }
        if !(config.alpha > 0.0 && config.alpha <= 1.0) {
            return Err(Error::InvariantViolation("alpha must be in (0, 1]"));
        }
        if !(config.lambda > 0.0) {
            return Err(Error::InvariantViolation("lambda must be positive"));
        }

        let num_keys = keys.len() as u64;
        let mut table_size = (num_keys as f64 / config.alpha).ceil() as u64;
        // Degenerate moduli make the displacement too regular.
        if table_size.is_power_of_two() {
            table_size += 1;
        }
        let num_buckets = ((num_keys as f64 / config.lambda).ceil() as u64).max(1);

        let attempts = if config.seed.is_some() {
            1
        } else {
            MAX_SEED_ATTEMPTS
        };
        for _ in 0..attempts {
            let seed = config.seed.unwrap_or_else(rand::random);
            if let Some(phf) = Self::try_seed(keys, seed, num_keys, table_size, num_buckets) {
                return Ok(phf);
            }
        }
        Err(Error::SeedSearchFailed { attempts })
    }

    /// One full search under a fixed seed. `None` means the seed lost.
    fn try_seed(
        keys: &[u64],
        seed: u64,
        num_keys: u64,
        table_size: u64,
        num_buckets: u64,
    ) -> Option<Self> {
        let bucketer = B::new(num_buckets);
        let m128 = compute_m_u64(table_size);
        let m64 = compute_m_u32(table_size as u32);

        // Distribute second-halves of the hashes into buckets.
        let mut buckets: Vec<Vec<u64>> = vec![Vec::new(); num_buckets as usize];
        for &key in keys {
            let hash = hash_key(key, seed);
            buckets[bucketer.bucket(hash.first()) as usize].push(hash.second());
        }

        // Two keys with identical full hashes in one bucket can never
        // separate; no pilot will help this seed.
        for bucket in &mut buckets {
            bucket.sort_unstable();
            if bucket.windows(2).any(|pair| pair[0] == pair[1]) {
                return None;
            }
        }

        // Largest buckets first, while the table is still empty.
        let mut order: Vec<usize> = (0..buckets.len()).collect();
        order.sort_by_key(|&b| (std::cmp::Reverse(buckets[b].len()), b));

        let mut taken = BitVectorBuilder::new(table_size);
        let mut pilots = vec![0u64; num_buckets as usize];
        let mut positions: Vec<u64> = Vec::new();

        for &b in &order {
            let bucket = &buckets[b];
            if bucket.is_empty() {
                break;
            }
            let mut placed = false;
            'pilot: for pilot in 0..MAX_PILOT {
                positions.clear();
                for &h2 in bucket {
                    let p = S::position(h2, pilot, seed, m128, m64, table_size);
                    if taken.get(p) || positions.contains(&p) {
                        continue 'pilot;
                    }
                    positions.push(p);
                }
                for &p in &positions {
                    taken.set(p);
                }
                pilots[b] = pilot;
                placed = true;
                break;
            }
            if !placed {
                return None;
            }
        }

        let free_slots = if MINIMAL && num_keys < table_size {
            let slots = fill_free_slots(&taken, num_keys, table_size);
            EliasFano::encode(&slots, None).expect("free slots are monotone")
        } else {
            EliasFano::default()
        };

        Some(Self::from_parts(
            seed,
            num_keys,
            table_size,
            bucketer,
            E::encode(&pilots),
            free_slots,
        ))
    }

    /// Build and serialize in one step.
    pub fn build_to_bytes(keys: &[u64], config: &BuildConfig) -> Result<Vec<u8>>
    where
        B: Codec,
        E: Codec,
    {
        Ok(Self::build(keys, config)?.to_bytes())
    }
}

/// The remap table for positions past `num_keys`.
///
/// One entry per slot in `[num_keys, table_size)`: a taken slot there
/// consumes the next untaken slot below `num_keys` (ascending, so the
/// sequence is monotone and each free slot is used once); an untaken
/// slot repeats the current candidate, keeping monotonicity without
/// ever being read back.
fn fill_free_slots(taken: &BitVectorBuilder, num_keys: u64, table_size: u64) -> Vec<u64> {
    let mut free = Vec::with_capacity((table_size - num_keys) as usize);
    let mut candidate = 0u64;
    for p in num_keys..table_size {
        if taken.get(p) {
            while taken.get(candidate) {
                candidate += 1;
            }
            free.push(candidate);
            candidate += 1;
        } else {
            free.push(candidate);
        }
    }
    free
}
