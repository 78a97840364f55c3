use thiserror::Error;

use crate::ty::TypeVarId;

pub type Result<T> = std::result::Result<T, TypeError>;

/// Errors surfaced by the type algebra.
///
/// Lookups that can legitimately find nothing return `Ok(None)` instead of an
/// error; everything here is either a caller mistake (wrong variant shape,
/// arity mismatch, dangling reference, genuinely ambiguous request) or an
/// engine defect (`InternalInvariant`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("expected {expected} type arguments, found {found}")]
    ArityMismatch { expected: usize, found: usize },

    #[error("type parameter {0} has no binding")]
    UnboundParameter(TypeVarId),

    #[error("ambiguous match: {0}")]
    AmbiguousMatch(String),

    #[error("type is not a generic type")]
    NotGeneric,

    #[error("type is not a generic parameter")]
    NotGenericParameter,

    #[error("type is not an array type")]
    NotArray,

    #[error("type has no {0} bound")]
    NotBounded(&'static str),

    #[error("type is not a wildcard type")]
    NotWildcard,

    #[error("unresolved type reference `{0}`")]
    UnresolvedReference(String),

    #[error("illegal intersection bounds: {0}")]
    IllegalIntersectionBounds(&'static str),

    /// A relation-engine precondition thought impossible was violated. This
    /// is a logic defect, not a user-input problem, and is never swallowed.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}
