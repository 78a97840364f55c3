use mira_descriptors::flags;
use mira_types::{
    definition_of, get_constructor, get_field, get_fields, get_method, get_methods, make_generic,
    overrides, BindingFlags, ClassDef, ClassId, ClassKind, FieldSig, MethodKind, MethodSig, Type,
    TypeEnv, TypeError, TypeStore,
};
use pretty_assertions::assert_eq;

fn field(name: &str, declaring: Type, ty: Type, access_flags: u16) -> FieldSig {
    FieldSig {
        name: name.to_string(),
        declaring,
        ty,
        access_flags,
    }
}

fn method(name: &str, declaring: Type, params: Vec<Type>, return_type: Type) -> MethodSig {
    MethodSig {
        name: name.to_string(),
        kind: MethodKind::Method,
        declaring,
        type_params: vec![],
        params,
        return_type,
        throws: vec![],
        access_flags: flags::ACC_PUBLIC,
        is_varargs: false,
        definition: None,
    }
}

fn add_class(store: &mut TypeStore, name: &str, super_class: Option<Type>) -> ClassId {
    let object = store.well_known().object_type();
    store.add_class(ClassDef {
        name: name.to_string(),
        kind: ClassKind::Class,
        access_flags: flags::ACC_PUBLIC,
        type_params: vec![],
        super_class: super_class.or(Some(object)),
        interfaces: vec![],
        enclosing: None,
    })
}

#[test]
fn instantiated_receiver_reports_substituted_member_types() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let list_string = make_generic(&store, wk.list, vec![string.clone()]).unwrap();
    let get = get_method(
        &store,
        &list_string,
        "get",
        BindingFlags::default_lookup(),
        Some(&[Type::int()]),
    )
    .unwrap()
    .expect("List.get must resolve");

    assert_eq!(get.return_type, string);
    assert_eq!(get.declaring, list_string);
}

#[test]
fn inherited_members_carry_the_substitution_chain() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let string = Type::Class(wk.string);

    let array_list_string = make_generic(&store, array_list, vec![string.clone()]).unwrap();

    // `iterator()` comes from Iterable<T> three hops up; its return type must
    // still instantiate to Iterator<String>.
    let iterator_method = get_method(
        &store,
        &array_list_string,
        "iterator",
        BindingFlags::default_lookup(),
        Some(&[]),
    )
    .unwrap()
    .expect("iterator() is inherited from Iterable");

    let iterator_class = store.class_id("java.util.Iterator").unwrap();
    let expected = make_generic(&store, iterator_class, vec![string]).unwrap();
    assert_eq!(iterator_method.return_type, expected);
}

#[test]
fn generic_field_types_resolve_on_the_instantiation() {
    let mut store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    // class Box<T> { T value; }
    let box_class = store.intern_class("com.example.Box");
    let t = store.add_type_param(mira_types::TypeVarDef {
        name: "T".to_string(),
        position: 0,
        declared_by: mira_types::VarOwner::Class(box_class),
        upper_bound: Type::Class(wk.object),
        lower_bound: None,
        captured_from: None,
    });
    store.define_class(
        box_class,
        ClassDef {
            name: "com.example.Box".to_string(),
            kind: ClassKind::Class,
            access_flags: flags::ACC_PUBLIC,
            type_params: vec![t],
            super_class: Some(Type::Class(wk.object)),
            interfaces: vec![],
            enclosing: None,
        },
    );
    let declaring = definition_of(&store, box_class);
    store.set_fields(
        box_class,
        vec![field(
            "value",
            declaring.clone(),
            Type::Var(t),
            flags::ACC_PUBLIC,
        )],
    );

    // On the definition the field still has its declared variable type.
    let on_definition = get_field(&store, &declaring, "value", BindingFlags::default_lookup())
        .unwrap()
        .expect("field exists on the definition");
    assert_eq!(on_definition.ty, Type::Var(t));

    // On Box<String> it resolves to String.
    let box_string = make_generic(&store, box_class, vec![string.clone()]).unwrap();
    let on_instance = get_field(&store, &box_string, "value", BindingFlags::default_lookup())
        .unwrap()
        .expect("field exists on the instantiation");
    assert_eq!(on_instance.ty, string);
    assert_eq!(on_instance.declaring, box_string);
}

#[test]
fn field_hiding_resolves_to_the_most_derived_declaration() {
    let mut store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let string = Type::Class(wk.string);

    let base = add_class(&mut store, "com.example.FBase", None);
    store.set_fields(
        base,
        vec![field("v", Type::Class(base), Type::int(), flags::ACC_PUBLIC)],
    );
    let derived = add_class(&mut store, "com.example.FDerived", Some(Type::Class(base)));
    store.set_fields(
        derived,
        vec![field(
            "v",
            Type::Class(derived),
            string.clone(),
            flags::ACC_PUBLIC,
        )],
    );

    let found = get_field(
        &store,
        &Type::Class(derived),
        "v",
        BindingFlags::default_lookup(),
    )
    .unwrap()
    .expect("field must resolve");
    assert_eq!(found.ty, string);

    // Both declarations are still enumerable.
    let all = get_fields(&store, &Type::Class(derived), BindingFlags::default_lookup()).unwrap();
    assert_eq!(all.iter().filter(|f| f.name == "v").count(), 2);
}

#[test]
fn competing_interface_statics_are_ambiguous() {
    let mut store = TypeStore::with_minimal_runtime();

    let make_iface = |store: &mut TypeStore, name: &str| {
        let id = store.add_class(ClassDef {
            name: name.to_string(),
            kind: ClassKind::Interface,
            access_flags: flags::ACC_PUBLIC | flags::ACC_INTERFACE | flags::ACC_ABSTRACT,
            type_params: vec![],
            super_class: None,
            interfaces: vec![],
            enclosing: None,
        });
        store.set_fields(
            id,
            vec![field(
                "CONST",
                Type::Class(id),
                Type::int(),
                flags::ACC_PUBLIC | flags::ACC_STATIC | flags::ACC_FINAL,
            )],
        );
        id
    };

    let i1 = make_iface(&mut store, "com.example.I1");
    let i2 = make_iface(&mut store, "com.example.I2");

    let object = store.well_known().object_type();
    let both = store.add_class(ClassDef {
        name: "com.example.Both".to_string(),
        kind: ClassKind::Class,
        access_flags: flags::ACC_PUBLIC,
        type_params: vec![],
        super_class: Some(object),
        interfaces: vec![Type::Class(i1), Type::Class(i2)],
        enclosing: None,
    });

    let lookup = BindingFlags::default_lookup() | BindingFlags::FLATTEN_HIERARCHY;
    let err = get_field(&store, &Type::Class(both), "CONST", lookup).unwrap_err();
    assert!(matches!(err, TypeError::AmbiguousMatch(_)), "{err:?}");
}

#[test]
fn binding_flags_filter_visibility_and_scope() {
    let mut store = TypeStore::with_minimal_runtime();

    let base = add_class(&mut store, "com.example.VBase", None);
    store.set_methods(
        base,
        vec![method("inherited", Type::Class(base), vec![], Type::void())],
    );
    let derived = add_class(&mut store, "com.example.VDerived", Some(Type::Class(base)));
    store.set_methods(
        derived,
        vec![
            method("declared", Type::Class(derived), vec![], Type::void()),
            MethodSig {
                access_flags: flags::ACC_PRIVATE,
                ..method("hidden", Type::Class(derived), vec![], Type::void())
            },
        ],
    );

    let receiver = Type::Class(derived);

    // Default lookup sees public declared and inherited instance methods,
    // plus what Object contributes.
    let default_names: Vec<String> = get_methods(&store, &receiver, BindingFlags::default_lookup())
        .unwrap()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    assert!(default_names.contains(&"declared".to_string()));
    assert!(default_names.contains(&"inherited".to_string()));
    assert!(default_names.contains(&"toString".to_string()));
    assert!(!default_names.contains(&"hidden".to_string()));

    // DECLARED_ONLY cuts the ancestors off.
    let declared_only = BindingFlags::default_lookup() | BindingFlags::DECLARED_ONLY;
    let declared_names: Vec<String> = get_methods(&store, &receiver, declared_only)
        .unwrap()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    assert!(declared_names.contains(&"declared".to_string()));
    assert!(!declared_names.contains(&"inherited".to_string()));

    // NON_PUBLIC surfaces the private method on its own class.
    let non_public = BindingFlags::NON_PUBLIC | BindingFlags::INSTANCE | BindingFlags::STATIC;
    let hidden = get_method(&store, &receiver, "hidden", non_public, Some(&[]))
        .unwrap();
    assert!(hidden.is_some());
}

#[test]
fn ignore_case_lookup_matches_case_insensitively() {
    let mut store = TypeStore::with_minimal_runtime();

    let util = add_class(&mut store, "com.example.CaseUtil", None);
    store.set_methods(
        util,
        vec![method("doWork", Type::Class(util), vec![], Type::void())],
    );

    let flags_ci = BindingFlags::default_lookup() | BindingFlags::IGNORE_CASE;
    let found = get_method(&store, &Type::Class(util), "DOWORK", flags_ci, Some(&[])).unwrap();
    assert!(found.is_some());

    let found = get_method(
        &store,
        &Type::Class(util),
        "DOWORK",
        BindingFlags::default_lookup(),
        Some(&[]),
    )
    .unwrap();
    assert!(found.is_none());
}

#[test]
fn constructor_lookup_selects_by_argument_types() {
    let store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let array_list = store.class_id("java.util.ArrayList").unwrap();
    let string = Type::Class(wk.string);

    let array_list_string = make_generic(&store, array_list, vec![string.clone()]).unwrap();

    let nullary = get_constructor(
        &store,
        &array_list_string,
        BindingFlags::default_lookup(),
        &[],
    )
    .unwrap()
    .expect("ArrayList() exists");
    assert!(nullary.params.is_empty());
    assert_eq!(nullary.kind, MethodKind::Constructor);

    // ArrayList(Collection<? extends E>) instantiated at E = String accepts a
    // List<String>.
    let list_string = make_generic(&store, wk.list, vec![string.clone()]).unwrap();
    let copying = get_constructor(
        &store,
        &array_list_string,
        BindingFlags::default_lookup(),
        std::slice::from_ref(&list_string),
    )
    .unwrap()
    .expect("the copy constructor applies");
    let expected_param = make_generic(
        &store,
        wk.collection,
        vec![Type::extends_wildcard(string)],
    )
    .unwrap();
    assert_eq!(copying.params, vec![expected_param]);
}

#[test]
fn overrides_checks_hierarchy_signature_and_return() {
    let mut store = TypeStore::with_minimal_runtime();
    let wk = store.well_known();
    let number = Type::Class(wk.number);
    let integer = Type::Class(wk.integer);

    let base = add_class(&mut store, "com.example.OBase", None);
    store.set_methods(
        base,
        vec![
            method("m", Type::Class(base), vec![], number.clone()),
            MethodSig {
                access_flags: flags::ACC_PUBLIC | flags::ACC_FINAL,
                ..method("frozen", Type::Class(base), vec![], Type::void())
            },
        ],
    );
    let derived = add_class(&mut store, "com.example.ODerived", Some(Type::Class(base)));
    store.set_methods(
        derived,
        vec![
            // Covariant return: Integer narrows Number.
            method("m", Type::Class(derived), vec![], integer),
            method("frozen", Type::Class(derived), vec![], Type::void()),
            method("unrelated", Type::Class(derived), vec![], Type::void()),
        ],
    );

    let base_methods = get_methods(
        &store,
        &Type::Class(base),
        BindingFlags::default_lookup() | BindingFlags::NON_PUBLIC,
    )
    .unwrap();
    let derived_methods = get_methods(
        &store,
        &Type::Class(derived),
        BindingFlags::default_lookup() | BindingFlags::NON_PUBLIC,
    )
    .unwrap();

    let find = |methods: &[std::sync::Arc<MethodSig>], name: &str, declaring: &Type| {
        methods
            .iter()
            .find(|m| m.name == name && m.declaring == *declaring)
            .cloned()
            .unwrap_or_else(|| panic!("method {name} on {declaring:?}"))
    };

    let base_m = find(&base_methods, "m", &Type::Class(base));
    let derived_m = find(&derived_methods, "m", &Type::Class(derived));
    assert!(overrides(&store, &derived_m, &base_m, true));
    assert!(!overrides(&store, &base_m, &derived_m, true));

    // Final methods cannot be overridden.
    let base_frozen = find(&base_methods, "frozen", &Type::Class(base));
    let derived_frozen = find(&derived_methods, "frozen", &Type::Class(derived));
    assert!(!overrides(&store, &derived_frozen, &base_frozen, false));

    // Unrelated names never override.
    let unrelated = find(&derived_methods, "unrelated", &Type::Class(derived));
    assert!(!overrides(&store, &unrelated, &base_m, false));
}
