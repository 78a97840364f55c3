//! Mira's type algebra: a runtime type-introspection and generics-resolution
//! engine.
//!
//! Raw class descriptors (from a [`mira_descriptors::DescriptorSource`])
//! resolve into a closed set of type shapes ([`Type`]) held in a
//! [`TypeStore`] arena. On top of that model the crate implements the
//! generics relations — subtyping with capture conversion and wildcard
//! containment, erasure, substitution under [`TypeBindings`], greatest lower
//! bounds over canonical hierarchy closures — plus member lookup with
//! binding flags and most-specific overload selection.
//!
//! All queries are synchronous and safe to issue from any thread: resolution
//! is cached and idempotent, published type data never mutates, and the only
//! growth is append-only (fresh capture variables, newly resolved classes).

mod bindings;
mod closure;
mod error;
mod format;
mod members;
mod overload;
mod runtime;
mod store;
mod substitute;
mod subtyping;
mod ty;

pub use bindings::TypeBindings;
pub use closure::{closure, glb, interfaces_of, precedes, rank, super_type, union};
pub use error::{Result, TypeError};
pub use format::TypeDisplay;
pub use members::{
    get_constructor, get_constructors, get_field, get_fields, get_method, get_methods,
    get_nested_classes, has_same_args, hierarchy_depth, in_same_package, is_inherited_in,
    is_sub_signature, overrides, BindingFlags, FieldSig, MethodKind, MethodSig,
};
pub use overload::select_method;
pub use store::{ClassDef, ClassKind, TypeEnv, TypeStore, TypeVarDef, VarOwner, WellKnownTypes};
pub use substitute::{
    bind_field, bind_method, erasure, erasure_all, erasure_recursive, root_definition,
    same_definition, substitute, substitute_all,
};
pub use subtyping::{
    are_same_types, as_super, capture, contains_type, contains_type_equivalent, element_type,
    is_assignable, is_capture_of, is_convertible, is_reifiable, is_same_type, is_subtype,
    is_subtype_no_capture, is_super_type, lower_bound, same_wildcard, upper_bound,
};
pub use ty::{
    definition_of, make_generic, make_intersection, ClassId, GenericType, IntersectionType,
    PrimitiveKind, Type, TypeVarId, WildcardBound,
};
