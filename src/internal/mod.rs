//! Internal implementation details.

pub(crate) mod circular;
pub(crate) mod cleanup_list;

pub(crate) use circular::StackGuard;
pub(crate) use cleanup_list::{CleanupList, CloseHook};

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

#[cfg(feature = "ahash")]
pub(crate) type Set<K> = ahash::AHashSet<K>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Set<K> = std::collections::HashSet<K>;
