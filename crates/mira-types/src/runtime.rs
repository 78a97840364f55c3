//! The built-in minimal runtime universe.
//!
//! A small, self-contained set of descriptor stubs covering the anchor
//! classes the algebra depends on (`java.lang` core, the boxed primitives,
//! and the handful of `java.util` interfaces the tests lean on). It feeds
//! the same resolution path as any external [`mira_descriptors::DescriptorSource`].

use mira_descriptors::{
    flags, ClassStub, FieldStub, MethodStub, RawType, RawTypeParam, StubSet, CONSTRUCTOR_NAME,
};

const OBJECT: &str = "java.lang.Object";
const STRING: &str = "java.lang.String";

fn object() -> RawType {
    RawType::named(OBJECT)
}

fn string() -> RawType {
    RawType::named(STRING)
}

fn method(name: &str, params: Vec<RawType>, return_type: Option<RawType>) -> MethodStub {
    MethodStub {
        name: name.to_string(),
        access_flags: flags::ACC_PUBLIC,
        type_params: vec![],
        params,
        return_type,
        throws: vec![],
    }
}

fn abstract_method(name: &str, params: Vec<RawType>, return_type: Option<RawType>) -> MethodStub {
    MethodStub {
        access_flags: flags::ACC_PUBLIC | flags::ACC_ABSTRACT,
        ..method(name, params, return_type)
    }
}

fn constructor(params: Vec<RawType>) -> MethodStub {
    method(CONSTRUCTOR_NAME, params, None)
}

fn static_method(name: &str, params: Vec<RawType>, return_type: Option<RawType>) -> MethodStub {
    MethodStub {
        access_flags: flags::ACC_PUBLIC | flags::ACC_STATIC,
        ..method(name, params, return_type)
    }
}

fn box_class(name: &str, value_method: &str, value_type: RawType) -> ClassStub {
    let mut stub = ClassStub::class(name, RawType::named("java.lang.Number"));
    stub.access_flags |= flags::ACC_FINAL;
    stub.interfaces = vec![RawType::generic(
        "java.lang.Comparable",
        vec![RawType::named(name)],
    )];
    stub.methods = vec![
        constructor(vec![value_type.clone()]),
        method(value_method, vec![], Some(value_type.clone())),
        method("compareTo", vec![RawType::named(name)], Some(RawType::Base(mira_descriptors::BaseType::Int))),
        static_method("valueOf", vec![value_type], Some(RawType::named(name))),
    ];
    stub
}

pub(crate) fn minimal_runtime_stubs() -> StubSet {
    use mira_descriptors::BaseType::*;

    let int = RawType::Base(Int);
    let boolean = RawType::Base(Boolean);
    let ch = RawType::Base(Char);

    let mut set = StubSet::new();

    // java.lang.Object is the hierarchy root; it has no supertype.
    let mut object_stub = ClassStub::class(OBJECT, object());
    object_stub.super_class = None;
    object_stub.methods = vec![
        constructor(vec![]),
        method("equals", vec![object()], Some(boolean.clone())),
        method("hashCode", vec![], Some(int.clone())),
        method("toString", vec![], Some(string())),
    ];
    set.insert(object_stub);

    set.insert(ClassStub::interface("java.io.Serializable"));
    set.insert(ClassStub::interface("java.lang.Cloneable"));

    let mut comparable = ClassStub::interface("java.lang.Comparable");
    comparable.type_params = vec![RawTypeParam::unbounded("T")];
    comparable.methods = vec![abstract_method(
        "compareTo",
        vec![RawType::var("T")],
        Some(int.clone()),
    )];
    set.insert(comparable);

    let mut char_sequence = ClassStub::interface("java.lang.CharSequence");
    char_sequence.methods = vec![
        abstract_method("length", vec![], Some(int.clone())),
        abstract_method("charAt", vec![int.clone()], Some(ch.clone())),
    ];
    set.insert(char_sequence);

    let mut string_stub = ClassStub::class(STRING, object());
    string_stub.access_flags |= flags::ACC_FINAL;
    string_stub.interfaces = vec![
        RawType::named("java.io.Serializable"),
        RawType::generic("java.lang.Comparable", vec![string()]),
        RawType::named("java.lang.CharSequence"),
    ];
    string_stub.methods = vec![
        constructor(vec![]),
        method("length", vec![], Some(int.clone())),
        method("isEmpty", vec![], Some(boolean.clone())),
        method("charAt", vec![int.clone()], Some(ch.clone())),
        method("compareTo", vec![string()], Some(int.clone())),
        method("concat", vec![string()], Some(string())),
        method("substring", vec![int.clone()], Some(string())),
        method("substring", vec![int.clone(), int.clone()], Some(string())),
    ];
    set.insert(string_stub);

    let mut number = ClassStub::class("java.lang.Number", object());
    number.access_flags |= flags::ACC_ABSTRACT;
    number.interfaces = vec![RawType::named("java.io.Serializable")];
    number.methods = vec![
        constructor(vec![]),
        abstract_method("intValue", vec![], Some(int.clone())),
        abstract_method("longValue", vec![], Some(RawType::Base(Long))),
        abstract_method("floatValue", vec![], Some(RawType::Base(Float))),
        abstract_method("doubleValue", vec![], Some(RawType::Base(Double))),
    ];
    set.insert(number);

    set.insert(box_class("java.lang.Byte", "byteValue", RawType::Base(Byte)));
    set.insert(box_class("java.lang.Short", "shortValue", RawType::Base(Short)));
    set.insert(box_class("java.lang.Integer", "intValue", int.clone()));
    set.insert(box_class("java.lang.Long", "longValue", RawType::Base(Long)));
    set.insert(box_class("java.lang.Float", "floatValue", RawType::Base(Float)));
    set.insert(box_class("java.lang.Double", "doubleValue", RawType::Base(Double)));

    // Boolean and Character box non-numeric kinds, so they sit outside the
    // Number hierarchy.
    for (name, value_method, value_type) in [
        ("java.lang.Boolean", "booleanValue", boolean.clone()),
        ("java.lang.Character", "charValue", ch.clone()),
    ] {
        let mut stub = ClassStub::class(name, object());
        stub.access_flags |= flags::ACC_FINAL;
        stub.interfaces = vec![
            RawType::named("java.io.Serializable"),
            RawType::generic("java.lang.Comparable", vec![RawType::named(name)]),
        ];
        stub.methods = vec![
            constructor(vec![value_type.clone()]),
            method(value_method, vec![], Some(value_type.clone())),
            static_method("valueOf", vec![value_type], Some(RawType::named(name))),
        ];
        set.insert(stub);
    }

    let mut iterator = ClassStub::interface("java.util.Iterator");
    iterator.type_params = vec![RawTypeParam::unbounded("E")];
    iterator.methods = vec![
        abstract_method("hasNext", vec![], Some(boolean.clone())),
        abstract_method("next", vec![], Some(RawType::var("E"))),
    ];
    set.insert(iterator);

    let mut iterable = ClassStub::interface("java.lang.Iterable");
    iterable.type_params = vec![RawTypeParam::unbounded("T")];
    iterable.methods = vec![abstract_method(
        "iterator",
        vec![],
        Some(RawType::generic("java.util.Iterator", vec![RawType::var("T")])),
    )];
    set.insert(iterable);

    let mut collection = ClassStub::interface("java.util.Collection");
    collection.type_params = vec![RawTypeParam::unbounded("E")];
    collection.interfaces = vec![RawType::generic(
        "java.lang.Iterable",
        vec![RawType::var("E")],
    )];
    collection.methods = vec![
        abstract_method("size", vec![], Some(int.clone())),
        abstract_method("isEmpty", vec![], Some(boolean.clone())),
        abstract_method("add", vec![RawType::var("E")], Some(boolean.clone())),
        abstract_method("contains", vec![object()], Some(boolean.clone())),
    ];
    set.insert(collection);

    let mut list = ClassStub::interface("java.util.List");
    list.type_params = vec![RawTypeParam::unbounded("E")];
    list.interfaces = vec![RawType::generic(
        "java.util.Collection",
        vec![RawType::var("E")],
    )];
    list.methods = vec![
        abstract_method("get", vec![int.clone()], Some(RawType::var("E"))),
        abstract_method("set", vec![int.clone(), RawType::var("E")], Some(RawType::var("E"))),
        abstract_method("add", vec![int.clone(), RawType::var("E")], None),
        abstract_method("indexOf", vec![object()], Some(int.clone())),
    ];
    set.insert(list);

    let mut array_list = ClassStub::class("java.util.ArrayList", object());
    array_list.type_params = vec![RawTypeParam::unbounded("E")];
    array_list.interfaces = vec![
        RawType::generic("java.util.List", vec![RawType::var("E")]),
        RawType::named("java.lang.Cloneable"),
        RawType::named("java.io.Serializable"),
    ];
    array_list.methods = vec![
        constructor(vec![]),
        constructor(vec![int.clone()]),
        constructor(vec![RawType::generic(
            "java.util.Collection",
            vec![RawType::extends_wildcard(RawType::var("E"))],
        )]),
        method("get", vec![int.clone()], Some(RawType::var("E"))),
        method("set", vec![int.clone(), RawType::var("E")], Some(RawType::var("E"))),
        method("add", vec![RawType::var("E")], Some(boolean.clone())),
        method("add", vec![int.clone(), RawType::var("E")], None),
        method("size", vec![], Some(int.clone())),
    ];
    set.insert(array_list);

    let mut map = ClassStub::interface("java.util.Map");
    map.type_params = vec![RawTypeParam::unbounded("K"), RawTypeParam::unbounded("V")];
    map.methods = vec![
        abstract_method("get", vec![object()], Some(RawType::var("V"))),
        abstract_method(
            "put",
            vec![RawType::var("K"), RawType::var("V")],
            Some(RawType::var("V")),
        ),
        abstract_method("size", vec![], Some(int.clone())),
        abstract_method("containsKey", vec![object()], Some(boolean.clone())),
    ];
    set.insert(map);

    let mut throwable = ClassStub::class("java.lang.Throwable", object());
    throwable.interfaces = vec![RawType::named("java.io.Serializable")];
    throwable.fields = vec![FieldStub {
        name: "detailMessage".to_string(),
        access_flags: flags::ACC_PRIVATE,
        ty: string(),
    }];
    throwable.methods = vec![
        constructor(vec![]),
        constructor(vec![string()]),
        method("getMessage", vec![], Some(string())),
    ];
    set.insert(throwable);

    let mut exception = ClassStub::class("java.lang.Exception", RawType::named("java.lang.Throwable"));
    exception.methods = vec![constructor(vec![]), constructor(vec![string()])];
    set.insert(exception);

    let mut runtime_exception =
        ClassStub::class("java.lang.RuntimeException", RawType::named("java.lang.Exception"));
    runtime_exception.methods = vec![constructor(vec![]), constructor(vec![string()])];
    set.insert(runtime_exception);

    let mut runnable = ClassStub::interface("java.lang.Runnable");
    runnable.methods = vec![abstract_method("run", vec![], None)];
    set.insert(runnable);

    set
}
