//! Raw class and member descriptors consumed by the Mira type engine.
//!
//! This crate is deliberately dumb: it models what a host runtime's class
//! metadata *says*, keyed by canonical binary name, without resolving any of
//! it. The engine (`mira-types`) turns these stubs into its type algebra on
//! demand through the [`DescriptorSource`] interface.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub mod flags {
    //! JVM-style access flags carried verbatim on stubs.

    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_PRIVATE: u16 = 0x0002;
    pub const ACC_PROTECTED: u16 = 0x0004;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_FINAL: u16 = 0x0010;
    pub const ACC_VOLATILE: u16 = 0x0040;
    pub const ACC_VARARGS: u16 = 0x0080;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
    pub const ACC_SYNTHETIC: u16 = 0x1000;
    pub const ACC_ENUM: u16 = 0x4000;
}

/// Member/class visibility derived from access flags.
///
/// `Package` is the absence of all three explicit visibility flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Protected,
    Package,
    Private,
}

pub fn visibility_of(access_flags: u16) -> Visibility {
    if access_flags & flags::ACC_PUBLIC != 0 {
        Visibility::Public
    } else if access_flags & flags::ACC_PROTECTED != 0 {
        Visibility::Protected
    } else if access_flags & flags::ACC_PRIVATE != 0 {
        Visibility::Private
    } else {
        Visibility::Package
    }
}

/// The eight non-void primitive kinds as they appear in descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawWildcard {
    Unbounded,
    Extends(Box<RawType>),
    Super(Box<RawType>),
}

/// A type reference as spelled inside a descriptor.
///
/// `Var` references a type parameter by name; the engine resolves it against
/// the enclosing method's, then the enclosing class's, parameter scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawType {
    Base(BaseType),
    Named { name: String, args: Vec<RawType> },
    Var(String),
    Array(Box<RawType>),
    Wildcard(RawWildcard),
}

impl RawType {
    pub fn named(name: impl Into<String>) -> Self {
        RawType::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, args: Vec<RawType>) -> Self {
        RawType::Named {
            name: name.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        RawType::Var(name.into())
    }

    pub fn array(elem: RawType) -> Self {
        RawType::Array(Box::new(elem))
    }

    pub fn extends_wildcard(bound: RawType) -> Self {
        RawType::Wildcard(RawWildcard::Extends(Box::new(bound)))
    }

    pub fn super_wildcard(bound: RawType) -> Self {
        RawType::Wildcard(RawWildcard::Super(Box::new(bound)))
    }
}

/// A declared generic parameter. An empty bounds list means the root object
/// type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTypeParam {
    pub name: String,
    pub bounds: Vec<RawType>,
}

impl RawTypeParam {
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    pub fn bounded(name: impl Into<String>, bounds: Vec<RawType>) -> Self {
        Self {
            name: name.into(),
            bounds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStub {
    pub name: String,
    pub access_flags: u16,
    pub ty: RawType,
}

impl FieldStub {
    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    pub fn visibility(&self) -> Visibility {
        visibility_of(self.access_flags)
    }
}

/// Name used for constructor entries in [`ClassStub::methods`], as in JVM
/// metadata.
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodStub {
    pub name: String,
    pub access_flags: u16,
    pub type_params: Vec<RawTypeParam>,
    pub params: Vec<RawType>,
    /// `None` means void.
    pub return_type: Option<RawType>,
    pub throws: Vec<RawType>,
}

impl MethodStub {
    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & flags::ACC_ABSTRACT != 0
    }

    pub fn is_varargs(&self) -> bool {
        self.access_flags & flags::ACC_VARARGS != 0
    }

    pub fn visibility(&self) -> Visibility {
        visibility_of(self.access_flags)
    }
}

/// Everything the engine needs to know about one class-like entity.
///
/// Constructors appear in `methods` under [`CONSTRUCTOR_NAME`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassStub {
    pub binary_name: String,
    pub access_flags: u16,
    pub super_class: Option<RawType>,
    pub interfaces: Vec<RawType>,
    pub type_params: Vec<RawTypeParam>,
    pub fields: Vec<FieldStub>,
    pub methods: Vec<MethodStub>,
    pub nested_classes: Vec<String>,
    pub enclosing_class: Option<String>,
}

impl ClassStub {
    /// A public class with an object supertype and nothing else.
    pub fn class(binary_name: impl Into<String>, super_class: RawType) -> Self {
        Self {
            binary_name: binary_name.into(),
            access_flags: flags::ACC_PUBLIC,
            super_class: Some(super_class),
            interfaces: Vec::new(),
            type_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested_classes: Vec::new(),
            enclosing_class: None,
        }
    }

    /// A public interface with no superinterfaces.
    pub fn interface(binary_name: impl Into<String>) -> Self {
        Self {
            binary_name: binary_name.into(),
            access_flags: flags::ACC_PUBLIC | flags::ACC_INTERFACE | flags::ACC_ABSTRACT,
            super_class: None,
            interfaces: Vec::new(),
            type_params: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            nested_classes: Vec::new(),
            enclosing_class: None,
        }
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & flags::ACC_INTERFACE != 0
    }

    pub fn visibility(&self) -> Visibility {
        visibility_of(self.access_flags)
    }

    /// The package prefix of `binary_name`, or `""` for the default package.
    pub fn package(&self) -> &str {
        match self.binary_name.rfind('.') {
            Some(idx) => &self.binary_name[..idx],
            None => "",
        }
    }
}

/// The external collaborator the engine pulls raw descriptors from.
///
/// Implementations must be deterministic: repeated lookups of the same name
/// must describe the same class.
pub trait DescriptorSource: Send + Sync {
    fn class_stub(&self, binary_name: &str) -> Option<ClassStub>;
}

/// In-memory [`DescriptorSource`] for tests and programmatic embedders.
#[derive(Debug, Default, Clone)]
pub struct StubSet {
    stubs: HashMap<String, ClassStub>,
}

impl StubSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stub, replacing any previous stub with the same name.
    pub fn insert(&mut self, stub: ClassStub) {
        self.stubs.insert(stub.binary_name.clone(), stub);
    }

    pub fn with(mut self, stub: ClassStub) -> Self {
        self.insert(stub);
        self
    }

    pub fn len(&self) -> usize {
        self.stubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stubs.is_empty()
    }
}

impl DescriptorSource for StubSet {
    fn class_stub(&self, binary_name: &str) -> Option<ClassStub> {
        self.stubs.get(binary_name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visibility_prefers_explicit_flags_over_package() {
        assert_eq!(visibility_of(flags::ACC_PUBLIC), Visibility::Public);
        assert_eq!(
            visibility_of(flags::ACC_PROTECTED | flags::ACC_STATIC),
            Visibility::Protected
        );
        assert_eq!(visibility_of(flags::ACC_PRIVATE), Visibility::Private);
        assert_eq!(visibility_of(flags::ACC_FINAL), Visibility::Package);
    }

    #[test]
    fn package_splits_on_last_dot() {
        let stub = ClassStub::class("java.util.ArrayList", RawType::named("java.lang.Object"));
        assert_eq!(stub.package(), "java.util");

        let unpackaged = ClassStub::class("Standalone", RawType::named("java.lang.Object"));
        assert_eq!(unpackaged.package(), "");
    }

    #[test]
    fn stub_set_replaces_by_name() {
        let mut set = StubSet::new();
        set.insert(ClassStub::class("a.B", RawType::named("java.lang.Object")));
        let mut updated = ClassStub::class("a.B", RawType::named("java.lang.Object"));
        updated.access_flags |= flags::ACC_FINAL;
        set.insert(updated.clone());

        assert_eq!(set.len(), 1);
        assert_eq!(set.class_stub("a.B"), Some(updated));
        assert_eq!(set.class_stub("a.Missing"), None);
    }

    #[test]
    fn constructor_stubs_are_recognized_by_name() {
        let ctor = MethodStub {
            name: CONSTRUCTOR_NAME.to_string(),
            access_flags: flags::ACC_PUBLIC,
            type_params: vec![],
            params: vec![],
            return_type: None,
            throws: vec![],
        };
        assert!(ctor.is_constructor());
        assert!(!ctor.is_varargs());
    }
}
