//! Consistent hashing ring for routing string keys to named members.
//!
//! This crate provides:
//!
//! - [`Ring`] — a thread-safe ring mapping keys to members (cache servers,
//!   shards, ...). Adding or removing a member only remaps the keys that
//!   member gains or loses.
//! - [`RingConfig`] — default replica count and hash strategy, loadable
//!   from TOML.
//! - [`HashStrategy`] — CRC32 (default), FNV-1a, or a caller-supplied
//!   [`RingHasher`].
//!
//! Each member occupies several positions (replicas) on a `u32` ring, the
//! position of replica `i` being `hash(i ++ name)`. A key belongs to the
//! member owning the first position strictly after `hash(key)`.
//!
//! ```
//! use circle_ring::{Ring, RingConfig};
//!
//! let ring = Ring::new(RingConfig::default());
//! ring.add("cache-a");
//! ring.add("cache-b");
//! ring.add_with_replicas("cache-c", 100);
//!
//! let owner = ring.get("user:42").unwrap();
//! let backups = ring.get_n("user:42", 2).unwrap();
//! assert_eq!(backups[0], owner);
//! ```

mod config;
mod error;
mod hash;
mod ring;


pub use config::{DEFAULT_REPLICAS, RingConfig};
pub use error::RingError;
pub use hash::{HashStrategy, RingHasher};
pub use ring::{MemberEntry, Ring};
