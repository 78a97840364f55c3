//! The closed set of type shapes the engine works with.
//!
//! `Type` is a value: cheap to clone, structurally comparable and hashable.
//! Nominal entities (classes, type variables) live in the [`crate::TypeStore`]
//! arenas and are referenced by id, which is what makes self-referential
//! shapes like `EnumLike<E extends EnumLike<E>>` representable.

use std::fmt;

use crate::bindings::TypeBindings;
use crate::error::{Result, TypeError};
use crate::store::TypeEnv;

/// Arena handle for a class or interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class#{}", self.0)
    }
}

/// Arena handle for a type variable (declared generic parameter or capture).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub(crate) u32);

impl TypeVarId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeVarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tv#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Void,
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    /// Fixed storage width. `boolean` is modeled as a single isolated bit and
    /// participates in no widening at all.
    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Void => 0,
            PrimitiveKind::Boolean => 1,
            PrimitiveKind::Byte => 8,
            PrimitiveKind::Char | PrimitiveKind::Short => 16,
            PrimitiveKind::Int | PrimitiveKind::Float => 32,
            PrimitiveKind::Long | PrimitiveKind::Double => 64,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveKind::Byte
                | PrimitiveKind::Char
                | PrimitiveKind::Short
                | PrimitiveKind::Int
                | PrimitiveKind::Long
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveKind::Float | PrimitiveKind::Double)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integral() || self.is_floating()
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Void => "void",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WildcardBound {
    Unbounded,
    Extends(Box<Type>),
    Super(Box<Type>),
}

/// A generic definition or instantiation: a generic class plus bindings for
/// its parameters. A definition binds every parameter to itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenericType {
    pub def: ClassId,
    pub bindings: TypeBindings,
}

impl GenericType {
    /// Bound types in declaration order.
    pub fn type_arguments(&self) -> Vec<Type> {
        self.bindings.bound_types().cloned().collect()
    }

    /// Whether this is an uninstantiated generic definition.
    pub fn is_definition(&self) -> bool {
        !self.bindings.has_bound_parameters()
    }
}

/// A synthetic intersection: at most one class bound plus interface bounds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntersectionType {
    pub base: Type,
    pub interfaces: Vec<Type>,
}

impl IntersectionType {
    /// All bounds, class bound first.
    pub fn bounds(&self) -> Vec<Type> {
        let mut out = Vec::with_capacity(1 + self.interfaces.len());
        out.push(self.base.clone());
        out.extend(self.interfaces.iter().cloned());
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Primitive(PrimitiveKind),
    /// Raw or non-generic nominal class/interface reference.
    Class(ClassId),
    /// Generic definition or instantiation.
    Generic(Box<GenericType>),
    Array(Box<Type>),
    /// Declared generic parameter.
    Var(TypeVarId),
    Wildcard(WildcardBound),
    /// Capture variable synthesized by capture conversion (or by substitution
    /// re-bounding an unbound parameter).
    Captured(TypeVarId),
    Intersection(Box<IntersectionType>),
    /// Subtype of everything; the default lower bound.
    Bottom,
    /// The type of the null reference.
    Null,
}

impl Type {
    pub fn void() -> Type {
        Type::Primitive(PrimitiveKind::Void)
    }

    pub fn boolean() -> Type {
        Type::Primitive(PrimitiveKind::Boolean)
    }

    pub fn byte() -> Type {
        Type::Primitive(PrimitiveKind::Byte)
    }

    pub fn char() -> Type {
        Type::Primitive(PrimitiveKind::Char)
    }

    pub fn short() -> Type {
        Type::Primitive(PrimitiveKind::Short)
    }

    pub fn int() -> Type {
        Type::Primitive(PrimitiveKind::Int)
    }

    pub fn long() -> Type {
        Type::Primitive(PrimitiveKind::Long)
    }

    pub fn float() -> Type {
        Type::Primitive(PrimitiveKind::Float)
    }

    pub fn double() -> Type {
        Type::Primitive(PrimitiveKind::Double)
    }

    pub fn class(id: ClassId) -> Type {
        Type::Class(id)
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn unbounded_wildcard() -> Type {
        Type::Wildcard(WildcardBound::Unbounded)
    }

    pub fn extends_wildcard(bound: Type) -> Type {
        Type::Wildcard(WildcardBound::Extends(Box::new(bound)))
    }

    pub fn super_wildcard(bound: Type) -> Type {
        Type::Wildcard(WildcardBound::Super(Box::new(bound)))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array(_))
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Type::Wildcard(_))
    }

    /// Generic parameter in the broad sense: declared or captured.
    pub fn is_type_variable(&self) -> bool {
        matches!(self, Type::Var(_) | Type::Captured(_))
    }

    /// Anything a reference value can inhabit.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Type::Primitive(_) | Type::Wildcard(_))
    }

    pub fn has_extends_bound(&self) -> bool {
        matches!(self, Type::Wildcard(WildcardBound::Extends(_)))
    }

    pub fn has_super_bound(&self) -> bool {
        matches!(self, Type::Wildcard(WildcardBound::Super(_)))
    }

    /// The element type of an array.
    pub fn element_type(&self) -> Result<&Type> {
        match self {
            Type::Array(elem) => Ok(elem),
            _ => Err(TypeError::NotArray),
        }
    }

    /// The definition-plus-bindings view of a generic type.
    pub fn generic(&self) -> Result<&GenericType> {
        match self {
            Type::Generic(g) => Ok(g),
            _ => Err(TypeError::NotGeneric),
        }
    }

    /// The arena id of a declared or captured type variable.
    pub fn var_id(&self) -> Result<TypeVarId> {
        match self {
            Type::Var(id) | Type::Captured(id) => Ok(*id),
            _ => Err(TypeError::NotGenericParameter),
        }
    }

    pub fn wildcard(&self) -> Result<&WildcardBound> {
        match self {
            Type::Wildcard(w) => Ok(w),
            _ => Err(TypeError::NotWildcard),
        }
    }

    pub fn extends_bound(&self) -> Result<&Type> {
        match self.wildcard()? {
            WildcardBound::Extends(b) => Ok(b),
            _ => Err(TypeError::NotBounded("extends")),
        }
    }

    pub fn super_bound(&self) -> Result<&Type> {
        match self.wildcard()? {
            WildcardBound::Super(b) => Ok(b),
            _ => Err(TypeError::NotBounded("super")),
        }
    }

    /// The class id behind this type's erasure, if it erases to a class.
    pub fn erased_class(&self) -> Option<ClassId> {
        match self {
            Type::Class(id) => Some(*id),
            Type::Generic(g) => Some(g.def),
            _ => None,
        }
    }

    /// Structural scan for any type-variable occurrence.
    pub fn contains_variables(&self) -> bool {
        match self {
            Type::Var(_) | Type::Captured(_) => true,
            Type::Array(elem) => elem.contains_variables(),
            Type::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => {
                b.contains_variables()
            }
            Type::Wildcard(WildcardBound::Unbounded) => false,
            Type::Generic(g) => g.bindings.bound_types().any(Type::contains_variables),
            Type::Intersection(i) => {
                i.base.contains_variables() || i.interfaces.iter().any(Type::contains_variables)
            }
            _ => false,
        }
    }

    /// Whether any of `bindings`' non-identity parameters occur in this type.
    pub(crate) fn mentions_any_of(&self, bindings: &TypeBindings) -> bool {
        match self {
            Type::Var(id) | Type::Captured(id) => bindings.binds(*id),
            Type::Array(elem) => elem.mentions_any_of(bindings),
            Type::Wildcard(WildcardBound::Extends(b) | WildcardBound::Super(b)) => {
                b.mentions_any_of(bindings)
            }
            Type::Wildcard(WildcardBound::Unbounded) => false,
            Type::Generic(g) => g
                .bindings
                .bound_types()
                .any(|b| b.mentions_any_of(bindings)),
            Type::Intersection(i) => {
                i.base.mentions_any_of(bindings)
                    || i.interfaces.iter().any(|t| t.mentions_any_of(bindings))
            }
            _ => false,
        }
    }
}

/// Instantiate a generic class with the given arguments.
///
/// Fails with [`TypeError::NotGeneric`] for classes without parameters and
/// [`TypeError::ArityMismatch`] when the argument count is off.
pub fn make_generic(env: &dyn TypeEnv, def: ClassId, args: Vec<Type>) -> Result<Type> {
    let class = env
        .class(def)
        .ok_or_else(|| TypeError::UnresolvedReference(def.to_string()))?;

    if class.type_params.is_empty() {
        return Err(TypeError::NotGeneric);
    }
    if class.type_params.len() != args.len() {
        return Err(TypeError::ArityMismatch {
            expected: class.type_params.len(),
            found: args.len(),
        });
    }

    let bindings = TypeBindings::from_ids(&class.type_params, args);
    Ok(Type::Generic(Box::new(GenericType { def, bindings })))
}

/// The definition form of a class: its unbound `Generic` when it declares
/// parameters, its plain `Class` reference otherwise.
pub fn definition_of(env: &dyn TypeEnv, id: ClassId) -> Type {
    match env.class(id) {
        Some(class) if !class.type_params.is_empty() => Type::Generic(Box::new(GenericType {
            def: id,
            bindings: TypeBindings::of_params(&class.type_params),
        })),
        _ => Type::Class(id),
    }
}

/// Build an intersection type from an ordered bound list.
///
/// The first bound may be a class; every other bound must be an interface.
/// Generic parameters are never legal bounds.
pub fn make_intersection(env: &dyn TypeEnv, bounds: Vec<Type>) -> Result<Type> {
    let mut base = Type::Class(env.well_known().object);
    let mut interfaces = Vec::with_capacity(bounds.len());

    for (index, bound) in bounds.into_iter().enumerate() {
        if bound.is_type_variable() {
            return Err(TypeError::IllegalIntersectionBounds(
                "a generic parameter may not be an intersection bound",
            ));
        }

        let is_interface = bound
            .erased_class()
            .and_then(|id| env.class(id))
            .map(|c| c.is_interface())
            .unwrap_or(false);

        if is_interface {
            interfaces.push(bound);
        } else if index == 0 {
            base = bound;
        } else {
            return Err(TypeError::IllegalIntersectionBounds(
                "an intersection may have at most one class bound, and it must come first",
            ));
        }
    }

    Ok(Type::Intersection(Box::new(IntersectionType {
        base,
        interfaces,
    })))
}
