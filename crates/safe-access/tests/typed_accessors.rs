//! Integration tests for the typed accessor family

use std::sync::atomic::{AtomicI64, Ordering};

use safe_access::{
    AccessError, AccessorOptions, AccessPermission, AccessPolicy, CastPolicy, DescriptorKind,
    MemberAccessor, MemberDescriptor, MetadataRegistry, TypedConstructorAccessor,
    TypedConstructorMethodAccessor, TypedFieldAccessor, TypedIndexedPropertyAccessor,
    TypedMethodAccessor, TypedPropertyAccessor,
};
use safe_value::{TypeHandle, Value, NO_ARGS};

#[derive(Debug, Clone, PartialEq)]
struct Point {
    x: i32,
    y: i32,
}

#[derive(Debug, PartialEq)]
struct Order {
    id: i64,
    note: Option<String>,
    lines: Vec<i64>,
}

static NEXT_ORDER: AtomicI64 = AtomicI64::new(1);

fn registry() -> MetadataRegistry {
    let mut registry = MetadataRegistry::new();
    registry
        .describe::<Point>()
        .constructor(|(): ()| Point { x: 0, y: 0 })
        .constructor(|(x, y): (i32, i32)| Point { x, y })
        .field("x", |p: &Point| p.x, |p: &mut Point, v| p.x = v)
        .field("y", |p: &Point| p.y, |p: &mut Point, v| p.y = v)
        .method("scale", |p: &mut Point, (k,): (i32,)| {
            p.x *= k;
            p.y *= k;
            p.x + p.y
        });
    registry
        .describe::<Order>()
        .constructor(|(): ()| Order {
            id: NEXT_ORDER.fetch_add(1, Ordering::SeqCst),
            note: None,
            lines: Vec::new(),
        })
        .readonly_field("id", |o: &Order| o.id)
        .property("note", |o: &Order| o.note.clone(), |o: &mut Order, v| o.note = v)
        .static_property(
            "next_id",
            || NEXT_ORDER.load(Ordering::SeqCst),
            |v| NEXT_ORDER.store(v, Ordering::SeqCst),
        )
        .indexer(
            "line",
            |o: &Order, (i,): (i32,)| o.lines.get(i as usize).copied().unwrap_or_default(),
            |o: &mut Order, (i,): (i32,), v| {
                let i = i as usize;
                if o.lines.len() <= i {
                    o.lines.resize(i + 1, 0);
                }
                o.lines[i] = v;
            },
        )
        .static_method("describe", |(id,): (i64,)| format!("order #{}", id));
    registry
}

fn descriptor<T: 'static>(
    registry: &MetadataRegistry,
    name: &str,
    kind: DescriptorKind,
) -> MemberDescriptor {
    MemberDescriptor::resolve(registry, &TypeHandle::reference::<T>(), name, kind).unwrap()
}

#[test]
fn test_point_scenario() {
    let registry = registry();
    let ty = TypeHandle::reference::<Point>();
    let ctor = registry.find_constructor(&ty, 2);
    let ctor = MemberDescriptor::new(ctor, DescriptorKind::Constructor).unwrap();
    let ctor = TypedConstructorAccessor::<Point>::new(ctor).unwrap();

    let mut point = ctor.invoke(&[Value::i32(3), Value::i32(4)]).unwrap();
    assert_eq!(point, Point { x: 3, y: 4 });

    let x = descriptor::<Point>(&registry, "x", DescriptorKind::Field);
    let x = TypedFieldAccessor::<Point, i32>::new(x).unwrap();
    assert_eq!(x.get_value(Some(&point)).unwrap(), 3);
    x.set_value(Some(&mut point), 10).unwrap();
    assert_eq!(x.get_value(Some(&point)).unwrap(), 10);
    assert_eq!(point.x, 10);
}

#[test]
fn test_constructor_matches_direct_call() {
    let registry = registry();
    let ty = TypeHandle::reference::<Point>();
    let ctor = registry.find_constructor(&ty, 0);
    let ctor = MemberDescriptor::new(ctor, DescriptorKind::Constructor).unwrap();
    let ctor = TypedConstructorAccessor::<Point>::new(ctor).unwrap();
    assert_eq!(ctor.invoke0().unwrap(), Point { x: 0, y: 0 });
}

#[test]
fn test_reinitialize_in_place() {
    let registry = registry();
    let ty = TypeHandle::reference::<Point>();
    let ctor = registry.find_constructor(&ty, 2);
    let ctor = MemberDescriptor::new(ctor, DescriptorKind::ConstructorAsMethod).unwrap();
    let reinit = TypedConstructorMethodAccessor::<Point>::new(ctor).unwrap();

    let mut point = Point { x: 1, y: 1 };
    reinit.invoke(Some(&mut point), &[Value::i32(7), Value::i32(8)]).unwrap();
    assert_eq!(point, Point { x: 7, y: 8 });
    assert!(matches!(
        reinit.invoke(None, &[Value::i32(7), Value::i32(8)]),
        Err(AccessError::TargetNull { .. })
    ));
}

#[test]
fn test_readonly_id_scenario() {
    let registry = registry();
    let id = descriptor::<Order>(&registry, "id", DescriptorKind::Field);
    let id = TypedFieldAccessor::<Order, i64>::new(id).unwrap();
    assert!(id.can_read());
    assert!(!id.can_write());

    let mut order = Order { id: 42, note: None, lines: Vec::new() };
    assert!(matches!(
        id.set_value(Some(&mut order), 43),
        Err(AccessError::NotSupported { operation: "SetValue", .. })
    ));
    assert_eq!(order.id, 42);
}

#[test]
fn test_optional_property_round_trip() {
    let registry = registry();
    let note = TypedPropertyAccessor::<Order, Option<String>>::new(descriptor::<Order>(
        &registry,
        "note",
        DescriptorKind::Property,
    ))
    .unwrap();
    let mut order = Order { id: 1, note: None, lines: Vec::new() };

    note.set_value(Some(&mut order), Some("fragile".to_string())).unwrap();
    assert_eq!(note.get_value(Some(&order)).unwrap().as_deref(), Some("fragile"));
    assert_eq!(note.get_value(Some(&order)).unwrap(), note.get_value(Some(&order)).unwrap());

    note.set_value(Some(&mut order), None).unwrap();
    assert_eq!(note.get_value(Some(&order)).unwrap(), None);
}

#[test]
fn test_static_property_ignores_target() {
    let registry = registry();
    let next = TypedPropertyAccessor::<Order, i64>::new(descriptor::<Order>(
        &registry,
        "next_id",
        DescriptorKind::Property,
    ))
    .unwrap();
    assert!(next.is_static());

    let order = Order { id: 0, note: None, lines: Vec::new() };
    let without = next.get_value(None).unwrap();
    let with = next.get_value(Some(&order)).unwrap();
    assert!(without >= 1);
    assert!(with >= without);
}

#[test]
fn test_static_method_ignores_target() {
    let registry = registry();
    let describe = TypedMethodAccessor::<Order, String>::new(descriptor::<Order>(
        &registry,
        "describe",
        DescriptorKind::Method,
    ))
    .unwrap();
    assert_eq!(describe.invoke(None, &[Value::i64(9)]).unwrap(), "order #9");

    let mut order = Order { id: 0, note: None, lines: Vec::new() };
    assert_eq!(describe.invoke(Some(&mut order), &[Value::i64(3)]).unwrap(), "order #3");
}

#[test]
fn test_instance_members_require_target() {
    let registry = registry();
    let x = descriptor::<Point>(&registry, "x", DescriptorKind::Field);
    let x = TypedFieldAccessor::<Point, i32>::new(x).unwrap();
    assert!(matches!(x.get_value(None), Err(AccessError::TargetNull { .. })));
    assert!(matches!(x.set_value(None, 1), Err(AccessError::TargetNull { .. })));

    let scale = descriptor::<Point>(&registry, "scale", DescriptorKind::Method);
    let scale = TypedMethodAccessor::<Point, i32>::new(scale).unwrap();
    assert!(matches!(scale.invoke(None, &[Value::i32(2)]), Err(AccessError::TargetNull { .. })));
}

#[test]
fn test_method_invocation() {
    let registry = registry();
    let scale = descriptor::<Point>(&registry, "scale", DescriptorKind::Method);
    let scale = TypedMethodAccessor::<Point, i32>::new(scale).unwrap();
    let mut point = Point { x: 1, y: 2 };
    assert_eq!(scale.invoke(Some(&mut point), &[Value::i32(3)]).unwrap(), 9);
    assert_eq!(point, Point { x: 3, y: 6 });

    assert!(matches!(
        scale.invoke(Some(&mut point), NO_ARGS),
        Err(AccessError::ArgumentCount { expected: 1, got: 0, .. })
    ));
    assert!(matches!(
        scale.invoke(Some(&mut point), &[Value::string("3")]),
        Err(AccessError::InvalidCast { .. })
    ));
}

#[test]
fn test_indexer_round_trip() {
    let registry = registry();
    let line = TypedIndexedPropertyAccessor::<Order, i64>::new(descriptor::<Order>(
        &registry,
        "line",
        DescriptorKind::IndexedProperty,
    ))
    .unwrap();
    assert_eq!(line.index_arity(), 1);

    let mut order = Order { id: 1, note: None, lines: Vec::new() };
    line.set_value(Some(&mut order), 250, &[Value::i32(2)]).unwrap();
    assert_eq!(line.get_value(Some(&order), &[Value::i32(2)]).unwrap(), 250);
    assert_eq!(order.lines, vec![0, 0, 250]);

    assert!(matches!(
        line.get_value(Some(&order), NO_ARGS),
        Err(AccessError::ArgumentCount { expected: 1, got: 0, .. })
    ));
    assert!(matches!(
        line.set_value(Some(&mut order), 1, &[Value::i32(0), Value::i32(1)]),
        Err(AccessError::ArgumentCount { expected: 1, got: 2, .. })
    ));
    assert_eq!(order.lines, vec![0, 0, 250]);
}

#[test]
fn test_static_type_mismatch_is_invalid_member() {
    let registry = registry();
    let x = descriptor::<Point>(&registry, "x", DescriptorKind::Field);
    assert!(matches!(
        TypedFieldAccessor::<Point, i64>::new(x.clone()),
        Err(AccessError::InvalidMember(_))
    ));
    assert!(matches!(
        TypedFieldAccessor::<Order, i32>::new(x),
        Err(AccessError::InvalidMember(_))
    ));
}

#[test]
fn test_policy_applies_to_typed_surface() {
    let registry = registry();
    let mut policy = AccessPolicy::new();
    policy.add_rule("**", AccessPermission::READ_ALL);
    let options = AccessorOptions {
        policy,
        cast_policy: CastPolicy::default(),
    };

    let id = descriptor::<Order>(&registry, "id", DescriptorKind::Field);
    assert!(TypedFieldAccessor::<Order, i64>::with_options(id, &options).is_ok());

    let scale = descriptor::<Point>(&registry, "scale", DescriptorKind::Method);
    assert!(matches!(
        TypedMethodAccessor::<Point, i32>::with_options(scale, &options),
        Err(AccessError::AccessorCompilationFailed { .. })
    ));
}
