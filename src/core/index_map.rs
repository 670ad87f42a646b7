//! Old-to-new index translation produced by mesh compaction.
//!
//! After a remesh, tombstoned nodes and elements are removed and the survivors are
//! renumbered contiguously from zero. An [`IndexMap`] records, for every index that
//! existed before compaction, either its new index or the fact that it was deleted.
//! Callers that keep per-cell or per-node state (for example a cell population holding
//! biological properties keyed by element index) use the [`ElementMap`] and [`NodeMap`]
//! returned from [`VertexMesh::remesh`](crate::core::vertex_mesh::VertexMesh::remesh) to
//! carry that state across the renumbering.

use serde::{Deserialize, Serialize};

/// Translation table `old index -> new index | deleted`.
///
/// # Examples
///
/// ```rust
/// use vertex_mesh::core::index_map::IndexMap;
///
/// let mut map = IndexMap::identity(4);
/// assert!(map.is_identity());
///
/// map.set_deleted(1);
/// map.set_new_index(2, 1);
/// map.set_new_index(3, 2);
///
/// assert!(map.is_deleted(1));
/// assert_eq!(map.new_index(0), Some(0));
/// assert_eq!(map.new_index(1), None);
/// assert_eq!(map.new_index(3), Some(2));
/// assert_eq!(map.num_deleted(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexMap {
    entries: Vec<Option<usize>>,
}

/// Translation table for node indices.
pub type NodeMap = IndexMap;

/// Translation table for element indices.
pub type ElementMap = IndexMap;

impl IndexMap {
    /// A map of `len` entries where every index maps to itself.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            entries: (0..len).map(Some).collect(),
        }
    }

    /// Number of old indices covered by the map.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map covers no indices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records that `old` is now `new`.
    ///
    /// # Panics
    ///
    /// Panics if `old` is out of range.
    pub fn set_new_index(&mut self, old: usize, new: usize) {
        self.entries[old] = Some(new);
    }

    /// Records that `old` was deleted.
    ///
    /// # Panics
    ///
    /// Panics if `old` is out of range.
    pub fn set_deleted(&mut self, old: usize) {
        self.entries[old] = None;
    }

    /// The new index of `old`, or `None` if it was deleted or is out of range.
    #[inline]
    #[must_use]
    pub fn new_index(&self, old: usize) -> Option<usize> {
        self.entries.get(old).copied().flatten()
    }

    /// Returns `true` if `old` was deleted.
    #[inline]
    #[must_use]
    pub fn is_deleted(&self, old: usize) -> bool {
        matches!(self.entries.get(old), Some(None))
    }

    /// Returns `true` if no index moved and none was deleted.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(old, new)| *new == Some(old))
    }

    /// Number of deleted entries.
    #[must_use]
    pub fn num_deleted(&self) -> usize {
        self.entries.iter().filter(|e| e.is_none()).count()
    }

    /// Iterator over `(old, new)` pairs for surviving indices, in old-index order.
    pub fn surviving(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(old, new)| new.map(|n| (old, n)))
    }
}
