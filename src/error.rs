//! Error types for loading and building hash functions.

use thiserror::Error;

/// Error variants for deserialization and construction.
///
/// The query path is total over 64-bit keys and never fails; all variants
/// here surface either while decoding a serialized function or while
/// building one from keys.
#[derive(Debug, Error)]
pub enum Error {
    /// The input stream ended before a declared count was satisfied.
    #[error("short read: needed {needed} bytes, {available} available")]
    ShortRead { needed: usize, available: usize },

    /// A decoded structure violates one of its internal invariants.
    #[error("invariant violation: {0}")]
    InvariantViolation(&'static str),

    /// A select index is inconsistent with the bit vector it covers.
    #[error("corrupt select index: {0}")]
    CorruptSelect(&'static str),

    /// Elias-Fano encoding requires a monotone non-decreasing sequence.
    #[error("sequence is not sorted at index {index}")]
    NotSorted { index: u64 },

    /// No tried seed produced a valid pilot assignment.
    #[error("search failed after {attempts} seed attempt(s)")]
    SeedSearchFailed { attempts: u32 },
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
