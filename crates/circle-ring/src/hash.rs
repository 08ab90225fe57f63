//! Position hashing for ring members and lookup keys.
//!
//! Every member occupies one position per replica. The position of replica
//! `i` of member `name` is `hash(i ++ name)`: the decimal replica index comes
//! first, the name second. Changing that order moves every existing position,
//! so it is fixed.

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use serde::Deserialize;

/// FNV-1a 32-bit offset basis.
const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;

/// FNV-1a 32-bit prime.
const FNV_PRIME: u32 = 0x0100_0193;

/// A caller-supplied hash function mapping a key to a ring position.
///
/// Implementations must be deterministic and free of side effects visible
/// to the ring. Any `Fn(&str) -> u32` closure that is `Send + Sync`
/// implements this trait.
pub trait RingHasher: Send + Sync {
    /// Hash `key` to a 32-bit ring position.
    fn hash(&self, key: &str) -> u32;
}

impl<F> RingHasher for F
where
    F: Fn(&str) -> u32 + Send + Sync,
{
    fn hash(&self, key: &str) -> u32 {
        self(key)
    }
}

/// The hash function a ring places members and keys with.
///
/// Chosen once when the ring is built and never changed afterwards.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashStrategy {
    /// CRC32 checksum with the IEEE polynomial.
    #[default]
    Crc32,
    /// 32-bit FNV-1a.
    Fnv1a,
    /// A caller-supplied hash function.
    #[serde(skip)]
    Custom(Arc<dyn RingHasher>),
}

impl HashStrategy {
    /// Wrap a custom hash function.
    pub fn custom(hasher: impl RingHasher + 'static) -> Self {
        Self::Custom(Arc::new(hasher))
    }

    /// Hash `key` to a ring position.
    pub fn hash(&self, key: &str) -> u32 {
        match self {
            Self::Crc32 => crc32fast::hash(key.as_bytes()),
            Self::Fnv1a => fnv1a(key.as_bytes()),
            Self::Custom(hasher) => hasher.hash(key),
        }
    }
}

impl fmt::Debug for HashStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crc32 => f.write_str("Crc32"),
            Self::Fnv1a => f.write_str("Fnv1a"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Computes replica positions for members, reusing one key buffer.
///
/// Held only for the duration of a single mutation.
pub(crate) struct PositionHasher<'a> {
    strategy: &'a HashStrategy,
    scratch: String,
}

impl<'a> PositionHasher<'a> {
    pub(crate) fn new(strategy: &'a HashStrategy) -> Self {
        Self {
            strategy,
            scratch: String::with_capacity(64),
        }
    }

    /// Position of replica `index` of `member`: `hash(index ++ member)`.
    pub(crate) fn replica_position(&mut self, member: &str, index: usize) -> u32 {
        self.scratch.clear();
        // Writing into a String cannot fail.
        let _ = write!(self.scratch, "{index}{member}");
        self.strategy.hash(&self.scratch)
    }
}

/// 32-bit FNV-1a over raw bytes.
fn fnv1a(data: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in data {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
