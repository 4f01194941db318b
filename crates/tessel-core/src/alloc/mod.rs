//! Hash collections backed by AHash.
//!
//! The geometry crates key small maps by node and channel ids; SipHash is
//! wasted work there.

pub use ahash::AHashMap as HashMap;
