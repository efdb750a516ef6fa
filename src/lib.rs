//! # Perfectly
//!
//! Static minimal perfect hashing over 64-bit keys, built on succinct
//! substrates.
//!
//! Given an immutable set of `n` distinct keys, [`MinimalPhf`] maps
//! each of them to a unique index in `[0, n)` using a few bits per key
//! and a handful of cache lines per lookup. Keys outside the set get
//! an arbitrary index in the same range (never an error). The layout
//! follows the two-level hash-and-displace design: a skew bucketer
//! groups keys, a per-bucket *pilot* found at build time displaces
//! them into distinct slots, and an Elias-Fano sequence of free slots
//! folds the sparse overflow back into the dense output range.
//!
//! ## Quick start
//!
//! ```
//! use perfectly::{BuildConfig, Codec, MinimalPhf};
//!
//! let keys: Vec<u64> = (0..1000).map(|i| i * 1_000_003).collect();
//! let phf = MinimalPhf::build(&keys, &BuildConfig::default()).unwrap();
//!
//! // Each key gets a distinct index below the key count.
//! let mut seen = vec![false; keys.len()];
//! for &k in &keys {
//!     let idx = phf.lookup(k) as usize;
//!     assert!(!seen[idx]);
//!     seen[idx] = true;
//! }
//!
//! // The byte format round-trips exactly.
//! let bytes = phf.to_bytes();
//! let reloaded = MinimalPhf::from_bytes(&bytes).unwrap();
//! assert_eq!(reloaded.lookup(keys[0]), phf.lookup(keys[0]));
//! ```
//!
//! ## Pieces
//!
//! The substrates are usable on their own:
//!
//! - [`BitVector`]: packed bits with word-level access
//! - [`CompactVector`]: fixed-width packed integers
//! - [`DArray1`] / [`DArray0`]: select indexes over a bit vector
//! - [`EliasFano`]: compressed monotone sequences
//! - [`fastmod`]: Barrett reduction by precomputed reciprocals
//!
//! Everything is immutable after construction; lookups take `&self`
//! and are freely parallel with no interior mutability anywhere.

pub mod bitvec;
pub mod broadword;
pub mod bucketer;
pub mod build;
pub mod codec;
pub mod compact;
pub mod darray;
pub mod elias_fano;
pub mod encoder;
pub mod error;
pub mod fastmod;
pub mod hash;
pub mod phf;

pub use bitvec::{BitVector, BitVectorBuilder};
pub use bucketer::{Bucketer, SkewBucketer};
pub use build::BuildConfig;
pub use codec::{Codec, Reader, Writer};
pub use compact::{CompactVector, CompactVectorBuilder};
pub use darray::{DArray0, DArray1};
pub use elias_fano::EliasFano;
pub use encoder::{Dictionary, DualDictionary, PilotEncoder};
pub use error::{Error, Result};
pub use phf::{AddDisplacement, MinimalPhf, SearchScheme, SinglePhf, XorDisplacement};
