//! Collection aliases used throughout the mesh engine.
//!
//! Node back-references and per-operation scratch sets are small and hashed with
//! trusted integer keys, so the crate standardises on `rustc_hash` maps/sets and
//! `smallvec` buffers behind the aliases below.
//!
//! # Security Warning
//!
//! ⚠️ The Fx hasher is **not DoS-resistant**. Only use these aliases with indices
//! produced by the mesh itself.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Fast non-cryptographic `HashMap` for internal index bookkeeping.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<usize, usize> = FastHashMap::default();
/// map.insert(3, 7);
/// assert_eq!(map.get(&3), Some(&7));
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Fast non-cryptographic `HashSet` for internal index bookkeeping.
pub type FastHashSet<T> = FxHashSet<T>;

/// Stack-allocated buffer that spills to the heap beyond `N` items.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// Inline capacity of [`ElementIndexBuffer`].
///
/// A well-formed 2D vertex-mesh node sits in at most three elements; one extra slot
/// lets a transient fourth entry exist during surgery without spilling.
pub const MAX_NODE_VALENCE_INLINE: usize = 4;

/// Sorted indices of the elements containing a node.
pub type ElementIndexBuffer = SmallBuffer<usize, MAX_NODE_VALENCE_INLINE>;

/// Creates a [`FastHashMap`] with at least the given capacity.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Creates a [`FastHashSet`] with at least the given capacity.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FxBuildHasher)
}

/// Inserts `value` into a sorted buffer, keeping it sorted and duplicate-free.
///
/// Returns `true` if the value was not already present.
pub fn sorted_insert(buffer: &mut ElementIndexBuffer, value: usize) -> bool {
    match buffer.binary_search(&value) {
        Ok(_) => false,
        Err(pos) => {
            buffer.insert(pos, value);
            true
        }
    }
}

/// Removes `value` from a sorted buffer. Returns `true` if it was present.
pub fn sorted_remove(buffer: &mut ElementIndexBuffer, value: usize) -> bool {
    match buffer.binary_search(&value) {
        Ok(pos) => {
            buffer.remove(pos);
            true
        }
        Err(_) => false,
    }
}
