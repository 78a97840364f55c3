use mira_descriptors::flags;
use mira_types::{
    as_super, capture, contains_type, is_same_type, is_subtype, make_generic, ClassDef, ClassKind,
    Type, TypeBindings, TypeEnv, TypeStore, TypeVarDef, VarOwner, WildcardBound,
};
use pretty_assertions::assert_eq;

#[test]
fn inheritance_applies_type_argument_substitution() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let string = Type::Class(wk.string);
    let object = Type::Class(wk.object);

    let array_list_string = make_generic(&store, array_list, vec![string.clone()]).unwrap();
    let list_string = make_generic(&store, wk.list, vec![string.clone()]).unwrap();
    let list_object = make_generic(&store, wk.list, vec![object]).unwrap();

    assert!(is_subtype(&store, &array_list_string, &list_string));
    assert!(!is_subtype(&store, &array_list_string, &list_object));

    // And through a two-interface chain with the substitution carried along.
    let iterable_string = make_generic(&store, wk.iterable, vec![string]).unwrap();
    assert!(is_subtype(&store, &array_list_string, &iterable_string));
}

#[test]
fn generic_subtyping_is_invariant_without_wildcards() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);
    let object = Type::Class(wk.object);

    let list_string = make_generic(&store, wk.list, vec![string]).unwrap();
    let list_object = make_generic(&store, wk.list, vec![object]).unwrap();

    assert!(!is_subtype(&store, &list_string, &list_object));
    assert!(!is_subtype(&store, &list_object, &list_string));
}

#[test]
fn wildcard_containment_extends() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let integer = Type::Class(wk.integer);
    let number = Type::Class(wk.number);

    let list_integer = make_generic(&store, wk.list, vec![integer]).unwrap();
    let list_extends_number = make_generic(
        &store,
        wk.list,
        vec![Type::extends_wildcard(number)],
    )
    .unwrap();

    // List<? extends Number> is not a subtype of List<Integer>, but
    // List<Integer> is a subtype of List<? extends Number>.
    assert!(!is_subtype(&store, &list_extends_number, &list_integer));
    assert!(is_subtype(&store, &list_integer, &list_extends_number));
}

#[test]
fn wildcard_containment_super() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);
    let object = Type::Class(wk.object);

    let list_super_string =
        make_generic(&store, wk.list, vec![Type::super_wildcard(string)]).unwrap();
    let list_super_object =
        make_generic(&store, wk.list, vec![Type::super_wildcard(object)]).unwrap();

    assert!(is_subtype(&store, &list_super_object, &list_super_string));
    assert!(!is_subtype(&store, &list_super_string, &list_super_object));
}

#[test]
fn unbounded_wildcard_contains_every_argument() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let list_string = make_generic(&store, wk.list, vec![string.clone()]).unwrap();
    let list_wild = make_generic(&store, wk.list, vec![Type::unbounded_wildcard()]).unwrap();

    assert!(is_subtype(&store, &list_string, &list_wild));
    assert!(!is_subtype(&store, &list_wild, &list_string));
    assert!(contains_type(&store, &Type::unbounded_wildcard(), &string));
}

#[test]
fn subtyping_is_reflexive_for_every_shape() {
    let mut store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let t = store.add_type_param(TypeVarDef {
        name: "T".to_string(),
        position: 0,
        declared_by: VarOwner::Capture,
        upper_bound: Type::Class(wk.number),
        lower_bound: None,
        captured_from: None,
    });

    let shapes = vec![
        Type::int(),
        Type::boolean(),
        string.clone(),
        Type::Class(wk.list),
        make_generic(&store, wk.list, vec![string.clone()]).unwrap(),
        make_generic(&store, wk.list, vec![Type::extends_wildcard(string.clone())]).unwrap(),
        Type::array(string.clone()),
        Type::array(Type::int()),
        Type::Var(t),
        Type::Null,
        Type::Bottom,
    ];

    for shape in &shapes {
        assert!(is_subtype(&store, shape, shape), "{shape:?} <: itself");
        assert!(is_same_type(&store, shape, shape), "{shape:?} same as itself");
    }
}

#[test]
fn as_super_recovers_the_instantiated_ancestor() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let string = Type::Class(wk.string);

    let array_list_string = make_generic(&store, array_list, vec![string.clone()]).unwrap();
    let found = as_super(&store, &array_list_string, &Type::Class(wk.list))
        .expect("ArrayList<String> must be viewable as List");

    assert_eq!(found, make_generic(&store, wk.list, vec![string]).unwrap());
}

#[test]
fn capture_conversion_allocates_capture_variables() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let integer = Type::Class(wk.integer);

    let list_extends_integer = make_generic(
        &store,
        wk.list,
        vec![Type::extends_wildcard(integer.clone())],
    )
    .unwrap();

    let captured = capture(&store, &list_extends_integer);
    let generic = captured.generic().expect("capture keeps the class shape");
    let args = generic.type_arguments();
    assert_eq!(args.len(), 1);

    let Type::Captured(cap) = &args[0] else {
        panic!("expected a capture variable, got {:?}", args[0]);
    };
    let cap_def = store.type_param(*cap).expect("capture variable is defined");
    assert!(cap_def.name.starts_with("CAP#"));
    assert_eq!(cap_def.upper_bound, integer);
    assert_eq!(cap_def.lower_bound, None);
    assert!(matches!(
        cap_def.captured_from,
        Some(WildcardBound::Extends(_))
    ));
}

#[test]
fn capture_conversion_keeps_super_bounds_as_lower_bounds() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let list_super_string =
        make_generic(&store, wk.list, vec![Type::super_wildcard(string.clone())]).unwrap();

    let captured = capture(&store, &list_super_string);
    let args = captured.generic().unwrap().type_arguments();
    let Type::Captured(cap) = &args[0] else {
        panic!("expected a capture variable");
    };
    let cap_def = store.type_param(*cap).unwrap();
    assert_eq!(cap_def.upper_bound, Type::Class(wk.object));
    assert_eq!(cap_def.lower_bound, Some(string));
}

#[test]
fn capture_conversion_is_idempotent() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let number = Type::Class(wk.number);

    let list_extends_number =
        make_generic(&store, wk.list, vec![Type::extends_wildcard(number)]).unwrap();

    let once = capture(&store, &list_extends_number);
    let twice = capture(&store, &once);
    // No wildcard arguments remain after the first conversion, so the second
    // is the identity.
    assert_eq!(once, twice);

    let plain = make_generic(&store, wk.list, vec![Type::Class(wk.string)]).unwrap();
    assert_eq!(capture(&store, &plain), plain);
}

#[test]
fn capture_conversion_substitutes_self_referential_bounds() {
    let mut store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();

    // Model `class EnumLike<E extends EnumLike<E>>`. The class id and the
    // parameter id both have to exist before the bound can be spelled.
    let enum_like = store.intern_class("com.example.EnumLike");
    let e = store.reserve_type_param();
    let self_bound = Type::Generic(Box::new(mira_types::GenericType {
        def: enum_like,
        bindings: TypeBindings::create(&[Type::Var(e)], vec![Type::Var(e)]).unwrap(),
    }));
    store.define_type_param(
        e,
        TypeVarDef {
            name: "E".to_string(),
            position: 0,
            declared_by: VarOwner::Class(enum_like),
            upper_bound: self_bound,
            lower_bound: None,
            captured_from: None,
        },
    );
    store.define_class(
        enum_like,
        ClassDef {
            name: "com.example.EnumLike".to_string(),
            kind: ClassKind::Class,
            access_flags: flags::ACC_PUBLIC,
            type_params: vec![e],
            super_class: Some(Type::Class(wk.object)),
            interfaces: vec![],
            enclosing: None,
        },
    );

    let receiver =
        make_generic(&store, enum_like, vec![Type::unbounded_wildcard()]).unwrap();
    let captured = capture(&store, &receiver);
    let args = captured.generic().unwrap().type_arguments();
    let Type::Captured(cap) = &args[0] else {
        panic!("expected a capture variable");
    };

    // The capture's upper bound must reference the capture itself.
    let cap_def = store.type_param(*cap).unwrap();
    let expected = Type::Generic(Box::new(mira_types::GenericType {
        def: enum_like,
        bindings: TypeBindings::create(&[Type::Var(e)], vec![Type::Captured(*cap)]).unwrap(),
    }));
    assert_eq!(cap_def.upper_bound, expected);
}

#[test]
fn string_satisfies_its_interface_ancestry() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let comparable_string =
        make_generic(&store, wk.comparable, vec![string.clone()]).unwrap();
    assert!(is_subtype(&store, &string, &comparable_string));
    assert!(is_subtype(&store, &string, &Type::Class(wk.serializable)));

    let comparable_object = make_generic(
        &store,
        wk.comparable,
        vec![Type::Class(wk.object)],
    )
    .unwrap();
    assert!(!is_subtype(&store, &string, &comparable_object));
}

#[test]
fn wildcard_same_type_compares_bound_shapes() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let number = Type::Class(wk.number);

    let extends_a = Type::extends_wildcard(number.clone());
    let extends_b = Type::extends_wildcard(number.clone());
    let super_a = Type::super_wildcard(number.clone());

    assert!(is_same_type(&store, &extends_a, &extends_b));
    assert!(!is_same_type(&store, &extends_a, &super_a));
    assert!(!is_same_type(&store, &extends_a, &number));
    assert!(is_same_type(
        &store,
        &Type::unbounded_wildcard(),
        &Type::unbounded_wildcard()
    ));
}
