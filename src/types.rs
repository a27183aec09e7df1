/// Position on a protein sequence, 1-based inclusive.
pub type Coord = u32;
/// Index of a protein group in the sorted dispatch order.
pub type GroupIdx = usize;

// Fast hash maps / sets using AHash instead of the default SipHash.
// Import these throughout the codebase with `use crate::types::{HashMap, HashSet}`.
// Also import `HashMapExt` / `HashSetExt` when you need `::new()` or `::with_capacity()`.
pub(crate) type HashMap<K, V> = ahash::HashMap<K, V>;
pub(crate) type HashSet<K> = ahash::HashSet<K>;
pub(crate) use ahash::HashMapExt;
pub(crate) use ahash::HashSetExt;
