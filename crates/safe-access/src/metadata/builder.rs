//! Type builder
//!
//! Registers the members of one type. Every registration produces both
//! binding forms (typed and erased) so that accessors on either surface can
//! be built from the same `MemberInfo`.
//!
//! ```ignore
//! registry
//!     .describe::<Point>()
//!     .constructor(|(x, y): (i32, i32)| Point { x, y })
//!     .field("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)
//!     .readonly_field("id", |p: &Point| p.id)
//!     .method("translate", |p: &mut Point, (dx, dy): (i32, i32)| {
//!         p.x += dx;
//!         p.y += dy;
//!     });
//! ```

use std::any::Any;
use std::fmt::Display;
use std::marker::PhantomData;
use std::sync::Arc;

use safe_value::{Arguments, Reflect, TypeHandle, Value};

use super::binding::{
    erase_construct, erase_get, erase_invoke, erase_reinit, erase_set, missing_receiver,
    ErasedBinding, TypedConstruct, TypedConstructorBinding, TypedGet, TypedInvoke,
    TypedMethodBinding, TypedSet, TypedValueBinding,
};
use super::member::{MemberId, MemberInfo, MemberKind, Modifiers, ParameterInfo, Visibility};
use super::registry::MetadataRegistry;
use crate::error::AccessError;

/// Shape of a value member being registered
struct ValueMember<T, V> {
    name: String,
    kind: MemberKind,
    is_static: bool,
    index: Vec<TypeHandle>,
    get: Option<TypedGet<T, V>>,
    set: Option<TypedSet<T, V>>,
}

/// Builder registering the members of `T`
pub struct TypeBuilder<'r, T> {
    registry: &'r mut MetadataRegistry,
    visibility: Visibility,
    last: Option<MemberId>,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Any + Send + Sync> TypeBuilder<'r, T> {
    pub(crate) fn new(registry: &'r mut MetadataRegistry) -> Self {
        Self {
            registry,
            visibility: Visibility::Public,
            last: None,
            _marker: PhantomData,
        }
    }

    /// Handle of the type being described
    pub fn type_handle(&self) -> TypeHandle {
        TypeHandle::reference::<T>()
    }

    /// Id of the most recently registered member
    pub fn last_member(&self) -> Option<MemberId> {
        self.last
    }

    /// Visibility applied to subsequently registered members
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the type as non-constructible
    pub fn abstract_type(self) -> Self {
        let ty = self.type_handle();
        self.registry.mark_abstract(&ty);
        self
    }

    fn modifiers(&self, is_static: bool, is_readonly: bool) -> Modifiers {
        Modifiers {
            visibility: self.visibility,
            is_static,
            is_readonly,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        mut self,
        name: String,
        kind: MemberKind,
        value_type: TypeHandle,
        parameters: Vec<TypeHandle>,
        modifiers: Modifiers,
        erased: ErasedBinding,
        typed: Arc<dyn Any + Send + Sync>,
    ) -> Self {
        let declaring_type = self.type_handle();
        let type_abstract = self.registry.abstract_flag(&declaring_type);
        let id = self.registry.add_member(|id| MemberInfo {
            id,
            name,
            kind,
            declaring_type,
            value_type,
            parameters: ParameterInfo::list(parameters),
            modifiers,
            erased,
            typed,
            type_abstract,
        });
        self.last = Some(id);
        self
    }

    fn value_member<V: Reflect>(self, member: ValueMember<T, V>) -> Self {
        let erased = ErasedBinding::Value {
            get: member.get.as_ref().map(erase_get),
            set: member.set.as_ref().map(erase_set),
        };
        // Only fields are "read-only"; a property without a setter is simply unwritable.
        let is_readonly = member.kind == MemberKind::Field && member.set.is_none();
        let modifiers = self.modifiers(member.is_static, is_readonly);
        let typed = Arc::new(TypedValueBinding {
            get: member.get,
            set: member.set,
        });
        self.push(
            member.name,
            member.kind,
            V::type_handle(),
            member.index,
            modifiers,
            erased,
            typed,
        )
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// Register a constructor taking positional arguments `A`
    pub fn constructor<A, F>(self, f: F) -> Self
    where
        A: Arguments,
        F: Fn(A) -> T + Send + Sync + 'static,
    {
        let construct = TypedConstruct::new(move |args: &[Value]| Ok(f(A::from_args(args)?)));
        let erased = ErasedBinding::Constructor {
            construct: erase_construct(&construct),
            reinit: erase_reinit(&construct),
        };
        let ty = self.type_handle();
        let modifiers = self.modifiers(false, false);
        self.push(
            "new".to_string(),
            MemberKind::Constructor,
            ty,
            A::parameter_types(),
            modifiers,
            erased,
            Arc::new(TypedConstructorBinding { construct }),
        )
    }

    // ========================================================================
    // Fields
    // ========================================================================

    /// Register a read-write instance field
    pub fn field<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Field,
            is_static: false,
            index: Vec::new(),
            get: Some(instance_getter(get)),
            set: Some(instance_setter(set)),
        })
    }

    /// Register a read-only (init-only) instance field
    pub fn readonly_field<V, G>(self, name: &str, get: G) -> Self
    where
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Field,
            is_static: false,
            index: Vec::new(),
            get: Some(instance_getter(get)),
            set: None,
        })
    }

    /// Register a read-write static field
    pub fn static_field<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Reflect,
        G: Fn() -> V + Send + Sync + 'static,
        S: Fn(V) + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Field,
            is_static: true,
            index: Vec::new(),
            get: Some(static_getter(get)),
            set: Some(static_setter(set)),
        })
    }

    /// Register a read-only static field
    pub fn static_readonly_field<V, G>(self, name: &str, get: G) -> Self
    where
        V: Reflect,
        G: Fn() -> V + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Field,
            is_static: true,
            index: Vec::new(),
            get: Some(static_getter(get)),
            set: None,
        })
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Register an instance property with getter and setter
    pub fn property<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Property,
            is_static: false,
            index: Vec::new(),
            get: Some(instance_getter(get)),
            set: Some(instance_setter(set)),
        })
    }

    /// Register a get-only instance property
    pub fn readonly_property<V, G>(self, name: &str, get: G) -> Self
    where
        V: Reflect,
        G: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Property,
            is_static: false,
            index: Vec::new(),
            get: Some(instance_getter(get)),
            set: None,
        })
    }

    /// Register a set-only instance property
    pub fn writeonly_property<V, S>(self, name: &str, set: S) -> Self
    where
        V: Reflect,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Property,
            is_static: false,
            index: Vec::new(),
            get: None,
            set: Some(instance_setter(set)),
        })
    }

    /// Register a static property with getter and setter
    pub fn static_property<V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        V: Reflect,
        G: Fn() -> V + Send + Sync + 'static,
        S: Fn(V) + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Property,
            is_static: true,
            index: Vec::new(),
            get: Some(static_getter(get)),
            set: Some(static_setter(set)),
        })
    }

    /// Register a get-only static property
    pub fn static_readonly_property<V, G>(self, name: &str, get: G) -> Self
    where
        V: Reflect,
        G: Fn() -> V + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Property,
            is_static: true,
            index: Vec::new(),
            get: Some(static_getter(get)),
            set: None,
        })
    }

    // ========================================================================
    // Indexers
    // ========================================================================

    /// Register a read-write indexer taking index arguments `I`
    pub fn indexer<I, V, G, S>(self, name: &str, get: G, set: S) -> Self
    where
        I: Arguments,
        V: Reflect,
        G: Fn(&T, I) -> V + Send + Sync + 'static,
        S: Fn(&mut T, I, V) + Send + Sync + 'static,
    {
        let setter = TypedSet::new(move |t: Option<&mut T>, index: &[Value], v: V| {
            let t = t.ok_or_else(missing_receiver)?;
            set(t, I::from_args(index)?, v);
            Ok(())
        });
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Indexer,
            is_static: false,
            index: I::parameter_types(),
            get: Some(index_getter(get)),
            set: Some(setter),
        })
    }

    /// Register a get-only indexer taking index arguments `I`
    pub fn readonly_indexer<I, V, G>(self, name: &str, get: G) -> Self
    where
        I: Arguments,
        V: Reflect,
        G: Fn(&T, I) -> V + Send + Sync + 'static,
    {
        self.value_member(ValueMember {
            name: name.to_string(),
            kind: MemberKind::Indexer,
            is_static: false,
            index: I::parameter_types(),
            get: Some(index_getter(get)),
            set: None,
        })
    }

    // ========================================================================
    // Methods
    // ========================================================================

    fn method_member<R: Reflect>(
        self,
        name: &str,
        is_static: bool,
        params: Vec<TypeHandle>,
        invoke: TypedInvoke<T, R>,
    ) -> Self {
        let erased = ErasedBinding::Method {
            invoke: erase_invoke(&invoke),
        };
        let modifiers = self.modifiers(is_static, false);
        self.push(
            name.to_string(),
            MemberKind::Method,
            R::type_handle(),
            params,
            modifiers,
            erased,
            Arc::new(TypedMethodBinding { invoke }),
        )
    }

    /// Register an instance method
    pub fn method<A, R, F>(self, name: &str, f: F) -> Self
    where
        A: Arguments,
        R: Reflect,
        F: Fn(&mut T, A) -> R + Send + Sync + 'static,
    {
        let invoke = TypedInvoke::new(move |t: Option<&mut T>, args: &[Value]| {
            let t = t.ok_or_else(missing_receiver)?;
            Ok(f(t, A::from_args(args)?))
        });
        self.method_member(name, false, A::parameter_types(), invoke)
    }

    /// Register a fallible instance method; `Err` surfaces as `MemberFailed`
    pub fn try_method<A, R, E, F>(self, name: &str, f: F) -> Self
    where
        A: Arguments,
        R: Reflect,
        E: Display + 'static,
        F: Fn(&mut T, A) -> Result<R, E> + Send + Sync + 'static,
    {
        let member = format!("{}.{}", self.type_handle().short_name(), name);
        let invoke = TypedInvoke::new(move |t: Option<&mut T>, args: &[Value]| {
            let t = t.ok_or_else(missing_receiver)?;
            f(t, A::from_args(args)?).map_err(|e| AccessError::MemberFailed {
                member: member.clone(),
                message: e.to_string(),
            })
        });
        self.method_member(name, false, A::parameter_types(), invoke)
    }

    /// Register a static method
    pub fn static_method<A, R, F>(self, name: &str, f: F) -> Self
    where
        A: Arguments,
        R: Reflect,
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        let invoke = TypedInvoke::new(move |_: Option<&mut T>, args: &[Value]| {
            Ok(f(A::from_args(args)?))
        });
        self.method_member(name, true, A::parameter_types(), invoke)
    }
}

// ============================================================================
// Typed binding adapters
// ============================================================================

fn instance_getter<T: 'static, V: 'static>(
    get: impl Fn(&T) -> V + Send + Sync + 'static,
) -> TypedGet<T, V> {
    TypedGet::new(move |t: Option<&T>, _: &[Value]| {
        t.map(&get).ok_or_else(missing_receiver)
    })
}

fn instance_setter<T: 'static, V: 'static>(
    set: impl Fn(&mut T, V) + Send + Sync + 'static,
) -> TypedSet<T, V> {
    TypedSet::new(move |t: Option<&mut T>, _: &[Value], v: V| {
        set(t.ok_or_else(missing_receiver)?, v);
        Ok(())
    })
}

fn static_getter<T: 'static, V: 'static>(
    get: impl Fn() -> V + Send + Sync + 'static,
) -> TypedGet<T, V> {
    TypedGet::new(move |_: Option<&T>, _: &[Value]| Ok(get()))
}

fn static_setter<T: 'static, V: 'static>(
    set: impl Fn(V) + Send + Sync + 'static,
) -> TypedSet<T, V> {
    TypedSet::new(move |_: Option<&mut T>, _: &[Value], v: V| {
        set(v);
        Ok(())
    })
}

fn index_getter<T: 'static, I: Arguments, V: 'static>(
    get: impl Fn(&T, I) -> V + Send + Sync + 'static,
) -> TypedGet<T, V> {
    TypedGet::new(move |t: Option<&T>, index: &[Value]| {
        let t = t.ok_or_else(missing_receiver)?;
        Ok(get(t, I::from_args(index)?))
    })
}
