//! Subtyping, same-type, containment, capture conversion, and assignability.
//!
//! These are pure functions over the type algebra; the only side effect any
//! of them has is appending fresh capture variables to the arena during
//! capture conversion.

use crate::bindings::TypeBindings;
use crate::closure::{glb, interfaces_of, super_type};
use crate::store::{define_capture, TypeEnv};
use crate::substitute::substitute;
use crate::ty::{GenericType, PrimitiveKind, Type, TypeVarId, WildcardBound};

fn object_type(env: &dyn TypeEnv) -> Type {
    env.well_known().object_type()
}

pub(crate) fn var_upper(env: &dyn TypeEnv, id: TypeVarId) -> Type {
    env.type_param(id)
        .map(|def| def.upper_bound.clone())
        .unwrap_or_else(|| object_type(env))
}

fn var_lower(env: &dyn TypeEnv, id: TypeVarId) -> Option<Type> {
    env.type_param(id).and_then(|def| def.lower_bound.clone())
}

/// The effective upper bound: resolves wildcards and captures, leaves
/// everything else untouched.
pub fn upper_bound(env: &dyn TypeEnv, t: &Type) -> Type {
    match t {
        Type::Wildcard(WildcardBound::Unbounded) => object_type(env),
        Type::Wildcard(WildcardBound::Extends(bound)) => upper_bound(env, bound),
        Type::Wildcard(WildcardBound::Super(bound)) => match &**bound {
            Type::Wildcard(WildcardBound::Extends(inner)) => upper_bound(env, inner),
            _ => object_type(env),
        },
        Type::Captured(id) => upper_bound(env, &var_upper(env, *id)),
        _ => t.clone(),
    }
}

/// The effective lower bound: wildcards and captures resolve to their super
/// bound (bottom when absent), everything else to itself.
pub fn lower_bound(env: &dyn TypeEnv, t: &Type) -> Type {
    match t {
        Type::Wildcard(WildcardBound::Extends(_)) | Type::Wildcard(WildcardBound::Unbounded) => {
            Type::Bottom
        }
        Type::Wildcard(WildcardBound::Super(bound)) => lower_bound(env, bound),
        Type::Captured(id) => match var_lower(env, *id) {
            Some(lower) => lower_bound(env, &lower),
            None => Type::Bottom,
        },
        _ => t.clone(),
    }
}

/// The element type of an array, looking through wildcard bounds.
pub fn element_type(env: &dyn TypeEnv, t: &Type) -> Option<Type> {
    match t {
        Type::Array(elem) => Some((**elem).clone()),
        Type::Wildcard(_) => element_type(env, &upper_bound(env, t)),
        _ => None,
    }
}

pub fn is_same_type(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    if t == p {
        return true;
    }
    match (t, p) {
        (Type::Var(a) | Type::Captured(a), Type::Var(b) | Type::Captured(b)) => {
            if a == b {
                return true;
            }
            let (Some(da), Some(db)) = (env.type_param(*a), env.type_param(*b)) else {
                return false;
            };
            da.name == db.name
                && da.declared_by == db.declared_by
                && is_same_type(env, &da.upper_bound, &db.upper_bound)
        }
        (Type::Wildcard(wt), Type::Wildcard(wp)) => same_wildcard(env, wt, wp),
        (Type::Array(a), Type::Array(b)) => is_same_type(env, a, b),
        (Type::Generic(a), Type::Generic(b)) => {
            a.def == b.def
                && a.bindings.len() == b.bindings.len()
                && a.bindings
                    .bound_types()
                    .zip(b.bindings.bound_types())
                    .all(|(x, y)| is_same_type(env, x, y))
        }
        (Type::Intersection(a), Type::Intersection(b)) => {
            is_same_type(env, &a.base, &b.base)
                && a.interfaces.len() == b.interfaces.len()
                && a.interfaces
                    .iter()
                    .zip(&b.interfaces)
                    .all(|(x, y)| is_same_type(env, x, y))
        }
        _ => false,
    }
}

pub fn are_same_types(env: &dyn TypeEnv, ts: &[Type], ps: &[Type]) -> bool {
    ts.len() == ps.len()
        && ts
            .iter()
            .zip(ps)
            .all(|(t, p)| is_same_type(env, t, p))
}

/// Bound-shape equality of two wildcards, checked in the order given.
pub fn same_wildcard(env: &dyn TypeEnv, t: &WildcardBound, p: &WildcardBound) -> bool {
    match p {
        WildcardBound::Unbounded => matches!(t, WildcardBound::Unbounded),
        WildcardBound::Super(pb) => {
            matches!(t, WildcardBound::Super(tb) if is_same_type(env, pb, tb))
        }
        WildcardBound::Extends(pb) => {
            matches!(t, WildcardBound::Extends(tb) if is_same_type(env, pb, tb))
        }
    }
}

/// Whether `p` is a capture variable standing for the wildcard `t`.
pub fn is_capture_of(env: &dyn TypeEnv, p: &Type, t: &Type) -> bool {
    let Type::Captured(id) = p else {
        return false;
    };
    let Type::Wildcard(wt) = t else {
        return false;
    };
    env.type_param(*id)
        .and_then(|def| def.captured_from.clone())
        .is_some_and(|source| same_wildcard(env, &source, wt))
}

pub fn is_subtype(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    is_subtype_with(env, t, p, true)
}

pub fn is_subtype_no_capture(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    is_subtype_with(env, t, p, false)
}

pub fn is_subtype_with(env: &dyn TypeEnv, t: &Type, p: &Type, capture_first: bool) -> bool {
    if t == p {
        return true;
    }
    if *p == object_type(env) {
        return true;
    }
    if is_same_type(env, t, p) {
        return true;
    }

    if let Type::Intersection(i) = p {
        if !is_subtype_with(env, t, &i.base, capture_first) {
            return false;
        }
        return i
            .interfaces
            .iter()
            .all(|iface| is_subtype_with(env, t, iface, capture_first));
    }

    let lower = lower_bound(env, p);
    if lower != *p {
        let t = if capture_first { capture(env, t) } else { t.clone() };
        return is_subtype_with(env, &t, &lower, false);
    }

    let t = if capture_first { capture(env, t) } else { t.clone() };
    subtype_dispatch(env, &t, p)
}

fn subtype_dispatch(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    match t {
        Type::Primitive(kt) => match p {
            Type::Primitive(kp) => primitive_subtype(*kt, *kp),
            _ => false,
        },
        Type::Bottom => true,
        Type::Null => p.is_reference() && !matches!(p, Type::Bottom),
        Type::Var(id) | Type::Captured(id) => {
            is_subtype_no_capture(env, &var_upper(env, *id), p)
        }
        Type::Wildcard(_) => false,
        Type::Array(elem) => match p {
            Type::Array(p_elem) => {
                if elem.is_primitive() {
                    is_same_type(env, elem, p_elem)
                } else {
                    is_subtype_no_capture(env, elem, p_elem)
                }
            }
            Type::Class(id) => {
                let wk = env.well_known();
                *id == wk.object || *id == wk.cloneable || *id == wk.serializable
            }
            _ => false,
        },
        Type::Class(_) | Type::Generic(_) | Type::Intersection(_) => class_subtype(env, t, p),
    }
}

fn class_subtype(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    let Some(found) = as_super(env, t, p) else {
        return false;
    };

    let args_ok = match (p, &found) {
        (Type::Generic(pg), Type::Generic(fg)) => {
            contains_type_lists(env, &pg.type_arguments(), &fg.type_arguments())
        }
        // A raw ancestor never satisfies a parameterized target without an
        // unchecked conversion, which the subtype relation does not grant.
        (Type::Generic(_), _) => false,
        _ => true,
    };
    if !args_ok {
        return false;
    }

    // Enclosing chains compared at the erased level.
    let enclosing_of = |ty: &Type| {
        ty.erased_class()
            .and_then(|id| env.class(id))
            .and_then(|c| c.enclosing)
    };
    match (enclosing_of(&found), enclosing_of(p)) {
        (Some(a), Some(b)) => is_subtype_no_capture(env, &Type::Class(a), &Type::Class(b)),
        _ => true,
    }
}

/// The primitive widening table. `boolean` never widens; `char` widens to
/// the 32-bit-and-up numeric kinds but is never a widening target.
fn primitive_subtype(kt: PrimitiveKind, kp: PrimitiveKind) -> bool {
    if kt == kp {
        return true;
    }
    if kt == PrimitiveKind::Void || kp == PrimitiveKind::Void {
        return false;
    }
    if kt == PrimitiveKind::Boolean || kp == PrimitiveKind::Boolean {
        return false;
    }
    match kp {
        PrimitiveKind::Byte | PrimitiveKind::Short => {
            kt != PrimitiveKind::Char && kt.is_integral() && kt.bit_width() <= kp.bit_width()
        }
        PrimitiveKind::Int | PrimitiveKind::Long => {
            kt.is_integral() && kt.bit_width() <= kp.bit_width()
        }
        PrimitiveKind::Float | PrimitiveKind::Double => {
            kt.is_integral() || kt.bit_width() <= kp.bit_width()
        }
        _ => false,
    }
}

/// Walk `t`'s ancestry (superclass first, then interfaces, depth first) for
/// the member whose erasure matches `target`'s. Returns the instantiated
/// ancestor, or `None`.
pub fn as_super(env: &dyn TypeEnv, t: &Type, target: &Type) -> Option<Type> {
    match t {
        Type::Class(_) | Type::Generic(_) | Type::Intersection(_) => {
            as_super_class(env, t, target)
        }
        Type::Primitive(_) => (t == target).then(|| t.clone()),
        Type::Var(id) | Type::Captured(id) => {
            if is_same_type(env, t, target) {
                Some(t.clone())
            } else {
                as_super(env, &var_upper(env, *id), target)
            }
        }
        Type::Array(_) => is_subtype(env, t, target).then(|| target.clone()),
        Type::Wildcard(_) => as_super(env, &upper_bound(env, t), target),
        Type::Bottom | Type::Null => None,
    }
}

fn as_super_class(env: &dyn TypeEnv, t: &Type, target: &Type) -> Option<Type> {
    match (t.erased_class(), target.erased_class()) {
        (Some(tid), Some(pid)) => {
            if tid == pid {
                return Some(t.clone());
            }
        }
        _ => {
            if is_same_type(env, t, target) {
                return Some(t.clone());
            }
        }
    }

    if let Some(st) = super_type(env, t) {
        let super_is_interface = st
            .erased_class()
            .and_then(|id| env.class(id))
            .map(|c| c.is_interface())
            .unwrap_or(false);
        if !super_is_interface {
            if let Some(found) = as_super(env, &st, target) {
                return Some(found);
            }
        }
    }

    for iface in interfaces_of(env, t) {
        if let Some(found) = as_super(env, &iface, target) {
            return Some(found);
        }
    }

    None
}

/// Capture conversion: replace each wildcard argument of a parameterized
/// type with a fresh capture variable whose bounds derive from the wildcard
/// and the declared parameter bound. Idempotent on wildcard-free inputs.
pub fn capture(env: &dyn TypeEnv, t: &Type) -> Type {
    let Type::Generic(g) = t else {
        return t.clone();
    };
    let args = g.type_arguments();
    if !args.iter().any(Type::is_wildcard) {
        return t.clone();
    }
    let Some(class) = env.class(g.def) else {
        return t.clone();
    };
    let params = &class.type_params;
    if params.len() != args.len() {
        // A malformed instantiation; fall back to its erasure.
        return crate::substitute::erasure(env, t);
    }

    // Reserve all capture ids first: a declared bound may reference its own
    // or a sibling position (`E extends EnumLike<E>`), so the substitution
    // targets must exist before any bound is computed.
    let fresh: Vec<Type> = args
        .iter()
        .map(|arg| match arg {
            Type::Wildcard(_) => Type::Captured(env.reserve_var()),
            other => other.clone(),
        })
        .collect();
    let fresh_bindings = TypeBindings::from_ids(params, fresh.clone());

    for (position, arg) in args.iter().enumerate() {
        let Type::Wildcard(wildcard) = arg else {
            continue;
        };
        let Type::Captured(cap_id) = &fresh[position] else {
            unreachable!("wildcard positions were reserved as captures");
        };
        let cap_id = *cap_id;

        let declared = env
            .type_param(params[position])
            .map(|def| def.upper_bound.clone())
            .unwrap_or_else(|| object_type(env));
        let declared = substitute(env, &declared, &fresh_bindings);

        let (upper_bound, lower_bound) = match wildcard {
            WildcardBound::Unbounded => (declared, None),
            WildcardBound::Extends(wb) => (
                glb(env, wb, &declared)
                    .expect("capture bounds always have a greatest lower bound"),
                None,
            ),
            WildcardBound::Super(wb) => (declared, Some((**wb).clone())),
        };
        define_capture(env, cap_id, upper_bound, lower_bound, wildcard.clone());
    }

    Type::Generic(Box::new(GenericType {
        def: g.def,
        bindings: TypeBindings::from_ids(params, fresh),
    }))
}

/// Wildcard containment: whether type argument `t` (the pattern side)
/// contains type argument `p`.
pub fn contains_type(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    let Type::Wildcard(tb) = t else {
        return is_same_type(env, t, p);
    };

    if matches!(p, Type::Wildcard(pb) if same_wildcard(env, tb, pb)) {
        return true;
    }
    if is_capture_of(env, p, t) {
        return true;
    }

    let has_extends = matches!(tb, WildcardBound::Extends(_));
    let has_super = matches!(tb, WildcardBound::Super(_));

    (has_extends || is_subtype_no_capture(env, &wild_lower(t), &lower_bound(env, p)))
        && (has_super || is_subtype_no_capture(env, &upper_bound(env, p), &wild_upper(env, t)))
}

fn wild_upper(env: &dyn TypeEnv, t: &Type) -> Type {
    let mut current = t.clone();
    loop {
        match current {
            Type::Wildcard(WildcardBound::Super(bound)) => {
                return match *bound {
                    Type::Wildcard(WildcardBound::Extends(inner)) => *inner,
                    _ => object_type(env),
                };
            }
            Type::Wildcard(WildcardBound::Extends(bound)) => current = *bound,
            Type::Wildcard(WildcardBound::Unbounded) => return object_type(env),
            other => return other,
        }
    }
}

fn wild_lower(t: &Type) -> Type {
    let mut current = t.clone();
    loop {
        match current {
            Type::Wildcard(WildcardBound::Extends(_)) | Type::Wildcard(WildcardBound::Unbounded) => {
                return Type::Bottom;
            }
            Type::Wildcard(WildcardBound::Super(bound)) => current = *bound,
            other => return other,
        }
    }
}

pub(crate) fn contains_type_lists(env: &dyn TypeEnv, ts: &[Type], ps: &[Type]) -> bool {
    ts.len() == ps.len()
        && ts
            .iter()
            .zip(ps)
            .all(|(t, p)| contains_type(env, t, p))
}

/// Mutual containment (or plain same-type), the equivalence used by
/// sub-signature checks.
pub fn contains_type_equivalent(env: &dyn TypeEnv, t: &Type, p: &Type) -> bool {
    is_same_type(env, t, p) || (contains_type(env, t, p) && contains_type(env, p, t))
}

pub(crate) fn contains_type_equivalent_lists(
    env: &dyn TypeEnv,
    ts: &[Type],
    ps: &[Type],
) -> bool {
    ts.len() == ps.len()
        && ts
            .iter()
            .zip(ps)
            .all(|(t, p)| contains_type_equivalent(env, t, p))
}

pub fn is_super_type(env: &dyn TypeEnv, t: &Type, other: &Type) -> bool {
    if t == other || *other == Type::Bottom {
        return true;
    }
    if let Type::Var(id) | Type::Captured(id) = t {
        return is_super_type(env, &var_upper(env, *id), other);
    }
    is_subtype(env, other, t)
}

/// Assignability: reference widening plus boxing/unboxing. This is the
/// relation overload applicability uses; the subtype relation never boxes.
pub fn is_assignable(env: &dyn TypeEnv, source: &Type, target: &Type) -> bool {
    if source == target {
        return true;
    }
    match target {
        Type::Var(id) | Type::Captured(id) => {
            return is_assignable(env, source, &var_upper(env, *id));
        }
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            return is_assignable(env, source, bound);
        }
        _ => {}
    }
    is_convertible(env, source, target)
}

pub fn is_convertible(env: &dyn TypeEnv, source: &Type, target: &Type) -> bool {
    if matches!(source, Type::Null | Type::Bottom) {
        return !target.is_primitive();
    }
    if *target == object_type(env) {
        return true;
    }
    if let Type::Var(id) | Type::Captured(id) = target {
        return is_convertible(env, source, &var_upper(env, *id));
    }

    let source_primitive = source.is_primitive();
    let target_primitive = target.is_primitive();

    if source_primitive == target_primitive {
        return is_subtype_unchecked(env, source, target);
    }

    let wk = env.well_known();
    if source_primitive {
        let Type::Primitive(kind) = source else {
            unreachable!();
        };
        match wk.boxed(*kind) {
            Some(boxed) => is_subtype(env, &Type::Class(boxed), target),
            None => false,
        }
    } else {
        match source.erased_class().and_then(|id| wk.unboxed(id)) {
            Some(kind) => is_subtype(env, &Type::Primitive(kind), target),
            None => false,
        }
    }
}

fn is_subtype_unchecked(env: &dyn TypeEnv, t: &Type, s: &Type) -> bool {
    if let (Type::Array(te), Type::Array(se)) = (t, s) {
        if te.is_primitive() {
            return is_same_type(env, te, se);
        }
        return is_subtype_unchecked(env, te, se);
    }
    if is_subtype(env, t, s) {
        return true;
    }
    if let Type::Var(id) | Type::Captured(id) = t {
        return is_subtype_unchecked(env, &var_upper(env, *id), s);
    }
    if let Type::Var(id) | Type::Captured(id) = s {
        return is_subtype_unchecked(env, t, &var_upper(env, *id));
    }
    // Raw-to-parameterized: allowed here (unchecked), not in the subtype
    // relation proper.
    if let Type::Generic(g) = s {
        if g.bindings.has_bound_parameters() && as_super(env, t, s).is_some() {
            return true;
        }
    }
    false
}

/// Whether `t` is fully reifiable: no type variables, and type arguments
/// only as unbounded wildcards.
pub fn is_reifiable(env: &dyn TypeEnv, t: &Type) -> bool {
    match t {
        Type::Var(_) | Type::Captured(_) => false,
        Type::Array(elem) => is_reifiable(env, elem),
        Type::Intersection(_) => false,
        Type::Generic(g) => g
            .bindings
            .bound_types()
            .all(|arg| matches!(arg, Type::Wildcard(WildcardBound::Unbounded))),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeStore;

    #[test]
    fn primitive_widening_follows_the_fixed_table() {
        use PrimitiveKind::*;

        let widening: &[(PrimitiveKind, PrimitiveKind, bool)] = &[
            (Byte, Int, true),
            (Byte, Short, true),
            (Int, Byte, false),
            (Char, Short, false),
            (Char, Int, true),
            (Byte, Char, false),
            (Boolean, Int, false),
            (Int, Boolean, false),
            (Int, Long, true),
            (Long, Float, true),
            (Float, Long, false),
            (Float, Double, true),
            (Double, Float, false),
            (Short, Byte, false),
            (Void, Double, false),
            (Int, Int, true),
        ];

        for &(from, to, expected) in widening {
            assert_eq!(
                primitive_subtype(from, to),
                expected,
                "{} -> {}",
                from.name(),
                to.name()
            );
        }
    }

    #[test]
    fn primitive_widening_through_the_public_relation() {
        let store = TypeStore::with_minimal_runtime();
        assert!(is_subtype(&store, &Type::byte(), &Type::int()));
        assert!(!is_subtype(&store, &Type::int(), &Type::byte()));
        assert!(!is_subtype(&store, &Type::char(), &Type::short()));
        assert!(!is_subtype(&store, &Type::boolean(), &Type::int()));
        assert!(is_subtype(&store, &Type::int(), &Type::long()));
        assert!(is_subtype(&store, &Type::long(), &Type::float()));
        assert!(!is_subtype(&store, &Type::float(), &Type::long()));
    }

    #[test]
    fn arrays_subtype_object_cloneable_serializable() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let arr = Type::array(Type::Class(wk.string));

        assert!(is_subtype(&store, &arr, &Type::Class(wk.object)));
        assert!(is_subtype(&store, &arr, &Type::Class(wk.cloneable)));
        assert!(is_subtype(&store, &arr, &Type::Class(wk.serializable)));
        assert!(!is_subtype(&store, &arr, &Type::Class(wk.number)));
    }

    #[test]
    fn array_covariance_is_reference_only() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();

        let strings = Type::array(Type::Class(wk.string));
        let objects = Type::array(Type::Class(wk.object));
        assert!(is_subtype(&store, &strings, &objects));
        assert!(!is_subtype(&store, &objects, &strings));

        let ints = Type::array(Type::int());
        let longs = Type::array(Type::long());
        assert!(!is_subtype(&store, &ints, &longs));
        assert!(is_subtype(&store, &ints, &ints.clone()));
    }

    #[test]
    fn null_and_bottom_sentinels() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();

        assert!(is_subtype(&store, &Type::Null, &Type::Class(wk.string)));
        assert!(!is_subtype(&store, &Type::Null, &Type::int()));
        assert!(is_subtype(&store, &Type::Bottom, &Type::Class(wk.string)));
        assert!(is_subtype(&store, &Type::Bottom, &Type::int()));
        assert!(!is_subtype(&store, &Type::Class(wk.string), &Type::Bottom));
    }

    #[test]
    fn boxing_is_assignability_not_subtyping() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let integer = Type::Class(wk.integer);
        let number = Type::Class(wk.number);

        assert!(is_assignable(&store, &Type::int(), &integer));
        assert!(is_assignable(&store, &Type::int(), &number));
        assert!(is_assignable(&store, &integer, &Type::int()));
        assert!(!is_subtype(&store, &Type::int(), &integer));
        assert!(!is_subtype(&store, &integer, &Type::int()));
        assert!(!is_assignable(&store, &Type::boolean(), &number));
    }
}
