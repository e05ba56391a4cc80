//! Metadata registry
//!
//! Arena of registered members addressed by [`MemberId`], plus per-type
//! lookup tables. This is the "reflection facility" callers consult to find
//! a member before asking for an accessor; it performs no accessor caching.

use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use safe_value::TypeHandle;

use super::builder::TypeBuilder;
use super::member::{MemberId, MemberInfo, MemberKind};

/// Metadata for a single registered type
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    ty: TypeHandle,
    /// All members in registration order
    members: Vec<MemberId>,
    /// Member name to ids (overloads share a name)
    member_indices: FxHashMap<String, Vec<MemberId>>,
    /// Constructor ids
    constructors: Vec<MemberId>,
    /// Set once the type refuses construction; shared with its constructors
    is_abstract: Arc<AtomicBool>,
}

impl TypeMetadata {
    fn new(ty: TypeHandle) -> Self {
        Self {
            ty,
            members: Vec::new(),
            member_indices: FxHashMap::default(),
            constructors: Vec::new(),
            is_abstract: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Type handle
    pub fn type_handle(&self) -> TypeHandle {
        self.ty
    }

    /// Member ids in registration order
    pub fn members(&self) -> &[MemberId] {
        &self.members
    }

    /// Constructor ids
    pub fn constructors(&self) -> &[MemberId] {
        &self.constructors
    }

    /// Member ids registered under `name`
    pub fn members_named(&self, name: &str) -> &[MemberId] {
        self.member_indices
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether the type refuses construction
    pub fn is_abstract(&self) -> bool {
        self.is_abstract.load(Ordering::Acquire)
    }
}

/// Registry of member metadata
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    /// Member arena, indexed by `MemberId`
    members: Vec<Arc<MemberInfo>>,
    /// Type metadata by Rust type id
    types: FxHashMap<TypeId, TypeMetadata>,
    /// Type lookup by full path and short name
    type_names: FxHashMap<&'static str, TypeId>,
}

impl MetadataRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing the members of `T`
    pub fn describe<T: Any + Send + Sync>(&mut self) -> TypeBuilder<'_, T> {
        let ty = TypeHandle::reference::<T>();
        self.types
            .entry(ty.id())
            .or_insert_with(|| TypeMetadata::new(ty));
        self.type_names.insert(ty.name(), ty.id());
        self.type_names.insert(ty.short_name(), ty.id());
        TypeBuilder::new(self)
    }

    /// Mark `ty` abstract; constructors registered before or after see the change
    pub(crate) fn mark_abstract(&mut self, ty: &TypeHandle) {
        self.abstract_flag(ty).store(true, Ordering::Release);
    }

    /// Abstract flag shared by `ty` and its constructors
    pub(crate) fn abstract_flag(&mut self, ty: &TypeHandle) -> Arc<AtomicBool> {
        let meta = self
            .types
            .entry(ty.id())
            .or_insert_with(|| TypeMetadata::new(*ty));
        Arc::clone(&meta.is_abstract)
    }

    /// Push a member into the arena and index it under its declaring type
    pub(crate) fn add_member(&mut self, build: impl FnOnce(MemberId) -> MemberInfo) -> MemberId {
        let id = MemberId(self.members.len() as u32);
        let info = build(id);
        let ty = info.declaring_type;
        let meta = self
            .types
            .entry(ty.id())
            .or_insert_with(|| TypeMetadata::new(ty));
        meta.members.push(id);
        if info.kind == MemberKind::Constructor {
            meta.constructors.push(id);
        }
        meta.member_indices
            .entry(info.name.clone())
            .or_default()
            .push(id);
        tracing::trace!(
            member = %info.qualified_name(),
            kind = %info.kind,
            ?id,
            "registered member"
        );
        self.members.push(Arc::new(info));
        id
    }

    /// Get a member by id
    pub fn member(&self, id: MemberId) -> Option<&Arc<MemberInfo>> {
        self.members.get(id.index())
    }

    /// Get type metadata
    pub fn type_metadata(&self, ty: &TypeHandle) -> Option<&TypeMetadata> {
        self.types.get(&ty.id())
    }

    /// Find a registered type by full path or short name
    pub fn type_by_name(&self, name: &str) -> Option<TypeHandle> {
        let id = self.type_names.get(name)?;
        self.types.get(id).map(|meta| meta.ty)
    }

    /// Whether `ty` is registered as abstract
    pub fn is_abstract(&self, ty: &TypeHandle) -> bool {
        self.type_metadata(ty).is_some_and(TypeMetadata::is_abstract)
    }

    /// Iterate the members declared by `ty`
    pub fn members_of<'a>(
        &'a self,
        ty: &TypeHandle,
    ) -> impl Iterator<Item = &'a Arc<MemberInfo>> + 'a {
        self.type_metadata(ty)
            .map(|meta| meta.members.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.member(*id))
    }

    fn named<'a>(
        &'a self,
        ty: &TypeHandle,
        name: &str,
    ) -> impl Iterator<Item = &'a Arc<MemberInfo>> + 'a {
        self.type_metadata(ty)
            .map(|meta| meta.members_named(name))
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.member(*id))
    }

    /// Resolve `(type, name)` to the first member of any kind
    pub fn resolve(&self, ty: &TypeHandle, name: &str) -> Option<&Arc<MemberInfo>> {
        self.named(ty, name).next()
    }

    /// Find a member by name and kind
    pub fn find(&self, ty: &TypeHandle, name: &str, kind: MemberKind) -> Option<&Arc<MemberInfo>> {
        self.named(ty, name).find(|m| m.kind == kind)
    }

    /// Find a field by name
    pub fn find_field(&self, ty: &TypeHandle, name: &str) -> Option<&Arc<MemberInfo>> {
        self.find(ty, name, MemberKind::Field)
    }

    /// Find a property by name
    pub fn find_property(&self, ty: &TypeHandle, name: &str) -> Option<&Arc<MemberInfo>> {
        self.find(ty, name, MemberKind::Property)
    }

    /// Find an indexer by name, optionally by index arity
    pub fn find_indexer(
        &self,
        ty: &TypeHandle,
        name: &str,
        arity: Option<usize>,
    ) -> Option<&Arc<MemberInfo>> {
        self.named(ty, name).find(|m| {
            m.kind == MemberKind::Indexer && arity.map_or(true, |n| m.parameters.len() == n)
        })
    }

    /// Find a method by name, optionally by arity
    pub fn find_method(
        &self,
        ty: &TypeHandle,
        name: &str,
        arity: Option<usize>,
    ) -> Option<&Arc<MemberInfo>> {
        self.named(ty, name).find(|m| {
            m.kind == MemberKind::Method && arity.map_or(true, |n| m.parameters.len() == n)
        })
    }

    /// Find the constructor taking `arity` arguments
    pub fn find_constructor(&self, ty: &TypeHandle, arity: usize) -> Option<&Arc<MemberInfo>> {
        self.type_metadata(ty)?
            .constructors
            .iter()
            .filter_map(|id| self.member(*id))
            .find(|m| m.parameters.len() == arity)
    }

    /// Number of registered members
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: i32,
    }

    fn registry() -> MetadataRegistry {
        let mut registry = MetadataRegistry::new();
        registry
            .describe::<Point>()
            .constructor(|(x, y): (i32, i32)| Point { x, y })
            .constructor(|(): ()| Point { x: 0, y: 0 })
            .field("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)
            .field("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)
            .method("sum", |p: &mut Point, (): ()| p.x + p.y)
            .method("scale", |p: &mut Point, (k,): (i32,)| {
                p.x *= k;
                p.y *= k;
            });
        registry
    }

    #[test]
    fn test_member_lookup() {
        let registry = registry();
        let ty = TypeHandle::reference::<Point>();

        assert_eq!(registry.len(), 6);
        assert!(registry.find_field(&ty, "x").is_some());
        assert!(registry.find_field(&ty, "z").is_none());
        assert!(registry.find_property(&ty, "x").is_none());
        assert_eq!(registry.find_method(&ty, "scale", Some(1)).map(|m| m.name()), Some("scale"));
        assert!(registry.find_method(&ty, "scale", Some(2)).is_none());
    }

    #[test]
    fn test_constructor_by_arity() {
        let registry = registry();
        let ty = TypeHandle::reference::<Point>();

        let two = registry.find_constructor(&ty, 2).unwrap();
        assert_eq!(two.parameters().len(), 2);
        assert_eq!(two.value_type(), ty);
        assert!(registry.find_constructor(&ty, 0).is_some());
        assert!(registry.find_constructor(&ty, 3).is_none());
    }

    #[test]
    fn test_type_by_name() {
        let registry = registry();
        assert_eq!(registry.type_by_name("Point"), Some(TypeHandle::reference::<Point>()));
        assert!(registry.type_by_name("Missing").is_none());
    }

    #[test]
    fn test_member_ids_are_stable() {
        let registry = registry();
        let ty = TypeHandle::reference::<Point>();
        let ids: Vec<_> = registry.members_of(&ty).map(|m| m.id()).collect();
        assert_eq!(ids.len(), 6);
        for id in ids {
            assert_eq!(registry.member(id).map(|m| m.id()), Some(id));
        }
    }
}
