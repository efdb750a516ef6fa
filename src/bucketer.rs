//! Hash-to-bucket mapping.
//!
//! The skew bucketer splits the bucket range into a small dense region
//! that receives most of the hash space and a large sparse region for
//! the rest: 60% of hashes land in 30% of the buckets. Front-loading
//! big buckets lets the displacement search place them while the table
//! is still mostly empty.

use crate::codec::{Codec, Reader, Writer};
use crate::error::{Error, Result};
use crate::fastmod::{compute_m_u64, fastmod_u64};

/// Fraction of the hash space mapped to the dense region.
pub(crate) const SKEW_HASH_FRACTION: f64 = 0.6;
/// Fraction of the buckets forming the dense region.
pub(crate) const SKEW_DENSE_FRACTION: f64 = 0.3;

/// Maps a 64-bit hash to a bucket id in `[0, num_buckets)`.
pub trait Bucketer {
    /// Set up for `num_buckets` buckets.
    fn new(num_buckets: u64) -> Self;

    /// Bucket id for `hash`.
    fn bucket(&self, hash: u64) -> u64;

    /// Total number of buckets.
    fn num_buckets(&self) -> u64;
}

/// Two-region skew bucketer.
///
/// Hashes below `floor(0.6 * 2^64)` reduce modulo the dense region
/// size; the rest reduce modulo the sparse region size and shift past
/// the dense ids. Both reductions use 128-bit Barrett reciprocals.
#[derive(Clone, Debug)]
pub struct SkewBucketer {
    num_dense_buckets: u64,
    num_sparse_buckets: u64,
    m_num_dense_buckets: u128,
    m_num_sparse_buckets: u128,
}

impl Bucketer for SkewBucketer {
    fn new(num_buckets: u64) -> Self {
        let num_dense_buckets = (SKEW_DENSE_FRACTION * num_buckets as f64) as u64;
        let num_sparse_buckets = num_buckets - num_dense_buckets;
        Self {
            num_dense_buckets,
            num_sparse_buckets,
            m_num_dense_buckets: if num_dense_buckets > 0 {
                compute_m_u64(num_dense_buckets)
            } else {
                0
            },
            m_num_sparse_buckets: if num_sparse_buckets > 0 {
                compute_m_u64(num_sparse_buckets)
            } else {
                0
            },
        }
    }

    #[inline]
    fn bucket(&self, hash: u64) -> u64 {
        const THRESHOLD: u64 = (SKEW_HASH_FRACTION * u64::MAX as f64) as u64;
        if hash < THRESHOLD {
            fastmod_u64(hash, self.m_num_dense_buckets, self.num_dense_buckets)
        } else {
            self.num_dense_buckets
                + fastmod_u64(hash, self.m_num_sparse_buckets, self.num_sparse_buckets)
        }
    }

    #[inline]
    fn num_buckets(&self) -> u64 {
        self.num_dense_buckets + self.num_sparse_buckets
    }
}

impl Codec for SkewBucketer {
    fn write(&self, w: &mut Writer) {
        w.u64(self.num_dense_buckets);
        w.u64(self.num_sparse_buckets);
        w.u128(self.m_num_dense_buckets);
        w.u128(self.m_num_sparse_buckets);
    }

    fn read(r: &mut Reader<'_>) -> Result<Self> {
        let num_dense_buckets = r.u64()?;
        let num_sparse_buckets = r.u64()?;
        let m_num_dense_buckets = r.u128()?;
        let m_num_sparse_buckets = r.u128()?;
        if num_dense_buckets > 0 && m_num_dense_buckets != compute_m_u64(num_dense_buckets) {
            return Err(Error::InvariantViolation(
                "dense reciprocal does not match the dense bucket count",
            ));
        }
        if num_sparse_buckets > 0 && m_num_sparse_buckets != compute_m_u64(num_sparse_buckets) {
            return Err(Error::InvariantViolation(
                "sparse reciprocal does not match the sparse bucket count",
            ));
        }
        Ok(Self {
            num_dense_buckets,
            num_sparse_buckets,
            m_num_dense_buckets,
            m_num_sparse_buckets,
        })
    }
}
