//! Sharded concurrent map.
//!
//! Keys are spread over a fixed number of shards, each behind its own
//! reader/writer lock, so writers to different shards never contend.
//!
//! # Example
//!
//! ```
//! use shardlog::ShardedMap;
//!
//! let map = ShardedMap::new(16);
//! map.set("key", 42);
//! assert_eq!(map.get(&"key"), Some(42));
//!
//! let (value, loaded) = map.get_or_set("key", 7);
//! assert_eq!((value, loaded), (42, true));
//! ```

mod hash;
mod sharded;

pub use hash::{fnv32, fnv32_display, Fnv32, FNV32_OFFSET_BASIS, FNV32_PRIME};
pub use sharded::{ShardedMap, ShardedMapConfig, DEFAULT_SHARD_COUNT};
