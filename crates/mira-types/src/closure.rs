//! Hierarchy linearization and greatest-lower-bound computation.
//!
//! `closure` produces a type's transitive ancestor set in a canonical
//! most-specific-first order, defined by the `precedes` total order over
//! hierarchy rank with reverse-lexicographic name tiebreak. `union` merges
//! two closures preserving that order, and `glb` minimizes the merged set
//! into a single bound or an intersection.

use std::collections::HashMap;

use crate::error::{Result, TypeError};
use crate::store::TypeEnv;
use crate::substitute::{erasure, substitute};
use crate::subtyping::{is_same_type, is_subtype, is_subtype_no_capture, var_upper};
use crate::ty::{IntersectionType, Type};

fn object_type(env: &dyn TypeEnv) -> Type {
    env.well_known().object_type()
}

fn is_interface_type(env: &dyn TypeEnv, t: &Type) -> bool {
    t.erased_class()
        .and_then(|id| env.class(id))
        .map(|c| c.is_interface())
        .unwrap_or(false)
}

fn class_name(env: &dyn TypeEnv, t: &Type) -> String {
    match t {
        Type::Intersection(i) => class_name(env, &i.base),
        _ => t
            .erased_class()
            .and_then(|id| env.class(id))
            .map(|c| c.name.clone())
            .unwrap_or_default(),
    }
}

fn is_class_like(t: &Type) -> bool {
    matches!(t, Type::Class(_) | Type::Generic(_) | Type::Intersection(_))
}

/// The direct supertype of `t`, with `t`'s own instantiation applied.
///
/// Raw uses of a generic class get erased supertypes; interfaces have the
/// root object type as their implicit supertype.
pub fn super_type(env: &dyn TypeEnv, t: &Type) -> Option<Type> {
    match t {
        Type::Class(id) => {
            let def = env.class(*id)?;
            let base = match &def.super_class {
                Some(base) => base.clone(),
                None if def.is_interface() => object_type(env),
                None => return None,
            };
            if def.type_params.is_empty() {
                Some(base)
            } else {
                // Raw use: the supertype is raw too.
                Some(erasure(env, &base))
            }
        }
        Type::Generic(g) => {
            let def = env.class(g.def)?;
            let base = match &def.super_class {
                Some(base) => base.clone(),
                None if def.is_interface() => object_type(env),
                None => return None,
            };
            Some(substitute(env, &base, &g.bindings))
        }
        Type::Var(id) | Type::Captured(id) => {
            let bound = var_upper(env, *id);
            if matches!(bound, Type::Intersection(_)) || is_interface_type(env, &bound) {
                super_type(env, &bound)
            } else {
                Some(bound)
            }
        }
        Type::Array(elem) => {
            if elem.is_primitive() || is_same_type(env, elem, &object_type(env)) {
                Some(array_super_type(env))
            } else {
                Some(Type::array(super_type(env, elem)?))
            }
        }
        Type::Intersection(i) => Some(i.base.clone()),
        _ => None,
    }
}

/// All arrays implement `Cloneable` and `Serializable`.
fn array_super_type(env: &dyn TypeEnv) -> Type {
    let wk = env.well_known();
    Type::Intersection(Box::new(IntersectionType {
        base: Type::Class(wk.object),
        interfaces: vec![Type::Class(wk.serializable), Type::Class(wk.cloneable)],
    }))
}

/// The directly-implemented interfaces of `t`, instantiated like
/// [`super_type`].
pub fn interfaces_of(env: &dyn TypeEnv, t: &Type) -> Vec<Type> {
    match t {
        Type::Class(id) => {
            let Some(def) = env.class(*id) else {
                return Vec::new();
            };
            if def.type_params.is_empty() {
                def.interfaces.clone()
            } else {
                def.interfaces.iter().map(|i| erasure(env, i)).collect()
            }
        }
        Type::Generic(g) => {
            let Some(def) = env.class(g.def) else {
                return Vec::new();
            };
            def.interfaces
                .iter()
                .map(|i| substitute(env, i, &g.bindings))
                .collect()
        }
        Type::Var(id) | Type::Captured(id) => {
            let bound = var_upper(env, *id);
            match bound {
                Type::Intersection(i) => i.interfaces.clone(),
                bound if is_interface_type(env, &bound) => vec![bound],
                _ => Vec::new(),
            }
        }
        Type::Intersection(i) => i.interfaces.clone(),
        _ => Vec::new(),
    }
}

/// Hierarchy rank: the longest supertype chain above `t`.
pub fn rank(env: &dyn TypeEnv, t: &Type) -> u32 {
    debug_assert!(
        is_class_like(t) || t.is_type_variable(),
        "rank is only defined for class-like types and type variables"
    );
    if *t == object_type(env) {
        return 0;
    }
    let mut r = super_type(env, t).map(|s| rank(env, &s)).unwrap_or(0);
    for iface in interfaces_of(env, t) {
        r = r.max(rank(env, &iface));
    }
    r + 1
}

/// The canonical closure order: type variables precede class-likes; deeper
/// hierarchy rank precedes shallower; ties break reverse-lexicographically
/// on the full name.
pub fn precedes(env: &dyn TypeEnv, origin: &Type, other: &Type) -> bool {
    if origin == other {
        return false;
    }
    if origin.is_type_variable() && other.is_type_variable() {
        return is_subtype(env, origin, other);
    }
    let origin_class_like = is_class_like(origin);
    let other_class_like = is_class_like(other);
    if origin_class_like && other_class_like {
        let origin_rank = rank(env, origin);
        let other_rank = rank(env, other);
        return other_rank < origin_rank
            || (other_rank == origin_rank
                && class_name(env, other) < class_name(env, origin));
    }
    origin.is_type_variable()
}

/// Insert `t` into a canonically ordered closure, dropping duplicates.
pub fn insert(env: &dyn TypeEnv, cl: Vec<Type>, t: Type) -> Vec<Type> {
    let Some(head) = cl.first() else {
        return vec![t];
    };
    if precedes(env, &t, head) {
        let mut out = Vec::with_capacity(cl.len() + 1);
        out.push(t);
        out.extend(cl);
        out
    } else if precedes(env, head, &t) {
        let head = cl[0].clone();
        let mut out = insert(env, cl[1..].to_vec(), t);
        out.insert(0, head);
        out
    } else {
        cl
    }
}

/// Merge two canonically ordered closures, deduplicating incomparable
/// (equal) heads.
pub fn union(env: &dyn TypeEnv, cl1: Vec<Type>, cl2: Vec<Type>) -> Vec<Type> {
    enum Take {
        Left,
        Right,
        Both,
    }

    let mut out = Vec::with_capacity(cl1.len() + cl2.len());
    let mut left = std::collections::VecDeque::from(cl1);
    let mut right = std::collections::VecDeque::from(cl2);

    loop {
        let take = match (left.front(), right.front()) {
            (Some(a), Some(b)) => {
                if precedes(env, a, b) {
                    Take::Left
                } else if precedes(env, b, a) {
                    Take::Right
                } else {
                    Take::Both
                }
            }
            (Some(_), None) => Take::Left,
            (None, Some(_)) => Take::Right,
            (None, None) => return out,
        };
        match take {
            Take::Left => out.push(left.pop_front().expect("nonempty")),
            Take::Right => out.push(right.pop_front().expect("nonempty")),
            Take::Both => {
                out.push(left.pop_front().expect("nonempty"));
                right.pop_front();
            }
        }
    }
}

/// `t` plus all its transitive ancestors in canonical order.
pub fn closure(env: &dyn TypeEnv, t: &Type) -> Vec<Type> {
    let mut cache = HashMap::new();
    closure_cached(env, t, &mut cache)
}

/// Closures are referentially transparent, so memoization is scoped to the
/// computation that needs it: callers that fan out (like `glb`) thread one
/// cache through every inner call.
pub(crate) fn closure_cached(
    env: &dyn TypeEnv,
    t: &Type,
    cache: &mut HashMap<Type, Vec<Type>>,
) -> Vec<Type> {
    if let Some(cached) = cache.get(t) {
        return cached.clone();
    }

    let st = super_type(env, t);
    let mut cl = if !matches!(t, Type::Intersection(_)) {
        match &st {
            Some(s) if is_class_like(s) => insert(env, closure_cached(env, s, cache), t.clone()),
            Some(s) if s.is_type_variable() => {
                let mut out = vec![t.clone()];
                out.extend(closure_cached(env, s, cache));
                out
            }
            _ => vec![t.clone()],
        }
    } else {
        match &st {
            Some(s) => closure_cached(env, s, cache),
            None => Vec::new(),
        }
    };

    for iface in interfaces_of(env, t) {
        let iface_closure = closure_cached(env, &iface, cache);
        cl = union(env, cl, iface_closure);
    }

    cache.insert(t.clone(), cl.clone());
    cl
}

/// Drop every member that is a strict supertype of another member; classes
/// come out before interfaces.
pub(crate) fn closure_min(env: &dyn TypeEnv, mut cl: Vec<Type>) -> Vec<Type> {
    let mut classes = Vec::new();
    let mut interfaces = Vec::new();

    while !cl.is_empty() {
        let current = cl.remove(0);
        cl.retain(|t| !is_subtype_no_capture(env, &current, t));
        if is_interface_type(env, &current) {
            interfaces.push(current);
        } else {
            classes.push(current);
        }
    }

    classes.extend(interfaces);
    classes
}

/// Greatest lower bound of two reference types.
///
/// Undefined over primitives. A minimized bound set with more than one
/// class bound means the inputs were ill-formed; that is surfaced as
/// [`TypeError::InternalInvariant`], never swallowed.
pub fn glb(env: &dyn TypeEnv, t: &Type, p: &Type) -> Result<Type> {
    if t.is_primitive() || p.is_primitive() {
        return Err(TypeError::InternalInvariant(
            "greatest lower bound is undefined for primitive types".to_string(),
        ));
    }
    if is_subtype_no_capture(env, t, p) {
        return Ok(t.clone());
    }
    if is_subtype_no_capture(env, p, t) {
        return Ok(p.clone());
    }

    let mut cache = HashMap::new();
    let merged = union(
        env,
        closure_cached(env, t, &mut cache),
        closure_cached(env, p, &mut cache),
    );
    let bounds = closure_min(env, merged);

    match bounds.len() {
        0 => Ok(object_type(env)),
        1 => Ok(bounds.into_iter().next().expect("length checked")),
        _ => {
            let class_count = bounds
                .iter()
                .filter(|b| !is_interface_type(env, b))
                .count();
            if class_count > 1 {
                return Err(TypeError::InternalInvariant(format!(
                    "greatest lower bound minimized to {class_count} class bounds"
                )));
            }

            let mut base = object_type(env);
            let mut interfaces = Vec::with_capacity(bounds.len());
            for bound in bounds {
                if is_interface_type(env, &bound) {
                    interfaces.push(bound);
                } else {
                    base = bound;
                }
            }
            Ok(Type::Intersection(Box::new(IntersectionType {
                base,
                interfaces,
            })))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeStore;
    use crate::ty::make_generic;

    #[test]
    fn closure_is_most_specific_first_and_contains_all_ancestors() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let string = Type::Class(wk.string);

        let cl = closure(&store, &string);
        assert_eq!(cl.first(), Some(&string));
        assert!(cl.contains(&Type::Class(wk.object)));
        assert!(cl.contains(&Type::Class(wk.serializable)));
        assert!(cl
            .iter()
            .any(|t| matches!(t, Type::Generic(g) if g.def == wk.comparable)));
        // Object is the least specific member and sorts last.
        assert_eq!(cl.last(), Some(&Type::Class(wk.object)));
    }

    #[test]
    fn closure_instantiates_inherited_interfaces() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let string = Type::Class(wk.string);

        let array_list = store.class_id("java.util.ArrayList").unwrap();
        let array_list_string =
            make_generic(&store, array_list, vec![string.clone()]).unwrap();

        let cl = closure(&store, &array_list_string);
        let list_string = make_generic(&store, wk.list, vec![string.clone()]).unwrap();
        let iterable_string = make_generic(&store, wk.iterable, vec![string]).unwrap();
        assert!(cl.contains(&list_string));
        assert!(cl.contains(&iterable_string));
    }

    #[test]
    fn rank_counts_the_longest_ancestor_chain() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();

        assert_eq!(rank(&store, &Type::Class(wk.object)), 0);
        assert!(rank(&store, &Type::Class(wk.list)) > rank(&store, &Type::Class(wk.collection)));
        assert!(rank(&store, &Type::Class(wk.integer)) > rank(&store, &Type::Class(wk.number)));
    }

    #[test]
    fn glb_picks_the_more_specific_of_related_types() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let number = Type::Class(wk.number);
        let integer = Type::Class(wk.integer);

        assert_eq!(glb(&store, &number, &integer).unwrap(), integer);
        assert_eq!(glb(&store, &integer, &number).unwrap(), integer);
    }

    #[test]
    fn glb_of_unrelated_interfaces_is_an_intersection() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let cloneable = Type::Class(wk.cloneable);
        let serializable = Type::Class(wk.serializable);

        let bound = glb(&store, &cloneable, &serializable).unwrap();
        let Type::Intersection(i) = &bound else {
            panic!("expected an intersection, got {bound:?}");
        };
        assert_eq!(i.base, Type::Class(wk.object));
        assert_eq!(i.interfaces.len(), 2);
        assert!(i.interfaces.contains(&cloneable));
        assert!(i.interfaces.contains(&serializable));

        // Symmetric up to bound-set equality.
        let flipped = glb(&store, &serializable, &cloneable).unwrap();
        let Type::Intersection(j) = &flipped else {
            panic!("expected an intersection, got {flipped:?}");
        };
        assert_eq!(i.base, j.base);
        assert_eq!(
            {
                let mut a = i.interfaces.clone();
                a.sort_by_key(|t| format!("{t:?}"));
                a
            },
            {
                let mut b = j.interfaces.clone();
                b.sort_by_key(|t| format!("{t:?}"));
                b
            }
        );
    }

    #[test]
    fn glb_of_primitives_is_an_internal_error() {
        let store = TypeStore::with_minimal_runtime();
        let err = glb(&store, &Type::int(), &Type::long()).unwrap_err();
        assert!(matches!(err, TypeError::InternalInvariant(_)));
    }

    #[test]
    fn glb_result_is_a_subtype_of_both_inputs() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let string = Type::Class(wk.string);
        let comparable_string =
            make_generic(&store, wk.comparable, vec![string.clone()]).unwrap();
        let serializable = Type::Class(wk.serializable);

        let bound = glb(&store, &comparable_string, &serializable).unwrap();
        assert!(is_subtype_no_capture(&store, &bound, &comparable_string));
        assert!(is_subtype_no_capture(&store, &bound, &serializable));
    }
}
