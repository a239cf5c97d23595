//! Utility types.

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Ordered map with deterministic iteration, keyed by insertion order.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;
/// Ordered set with deterministic iteration.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;
