//! Accessor cache for collaborators
//!
//! Accessors never consult this cache; building one is always a fresh
//! compilation. Callers that want one accessor per member for the lifetime
//! of the process keep them here, keyed by member identity.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AccessResult;
use crate::metadata::MemberId;

/// Concurrent map from member identity to a shared accessor
#[derive(Debug)]
pub struct AccessorCache<A> {
    entries: DashMap<MemberId, Arc<A>>,
}

impl<A> AccessorCache<A> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached accessor for `id`, if any
    pub fn get(&self, id: MemberId) -> Option<Arc<A>> {
        self.entries.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Cached accessor for `id`, building it on a miss.
    ///
    /// Concurrent callers for the same member are serialized on the map
    /// shard, so `build` runs at most once per member. A failed build caches
    /// nothing.
    pub fn get_or_try_insert_with<F>(&self, id: MemberId, build: F) -> AccessResult<Arc<A>>
    where
        F: FnOnce() -> AccessResult<A>,
    {
        if let Some(cached) = self.get(id) {
            return Ok(cached);
        }
        match self.entries.entry(id) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let accessor = Arc::new(build()?);
                entry.insert(Arc::clone(&accessor));
                Ok(accessor)
            }
        }
    }

    /// Drop the accessor cached for `id`
    pub fn remove(&self, id: MemberId) -> Option<Arc<A>> {
        self.entries.remove(&id).map(|(_, accessor)| accessor)
    }

    /// Number of cached accessors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached accessor
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<A> Default for AccessorCache<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::FieldAccessor;
    use crate::descriptor::{DescriptorKind, MemberDescriptor};
    use crate::error::AccessError;
    use crate::metadata::MetadataRegistry;
    use safe_value::TypeHandle;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Node {
        weight: i32,
    }

    #[test]
    fn test_builds_once() {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Node>()
            .field("weight", |n: &Node| n.weight, |n: &mut Node, v| n.weight = v);
        let member = registry
            .find_field(&TypeHandle::reference::<Node>(), "weight")
            .unwrap();
        let id = member.id();

        let cache = AccessorCache::<FieldAccessor>::new();
        let builds = AtomicUsize::new(0);
        let build = || {
            builds.fetch_add(1, Ordering::SeqCst);
            FieldAccessor::new(MemberDescriptor::new(Some(member), DescriptorKind::Field)?)
        };

        let first = cache.get_or_try_insert_with(id, build).unwrap();
        let second = cache.get_or_try_insert_with(id, build).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(id).is_none());
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = AccessorCache::<FieldAccessor>::new();
        let id = MemberId(0);
        let err = cache
            .get_or_try_insert_with(id, || Err(AccessError::invalid_member("missing")))
            .unwrap_err();
        assert!(matches!(err, AccessError::InvalidMember(_)));
        assert!(cache.is_empty());
    }
}
