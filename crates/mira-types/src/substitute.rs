//! The substitution binder: structurally rewrites types and member
//! signatures under a [`TypeBindings`], and the eraser built on top of it.
//!
//! Identity preservation is part of the contract: every path returns the
//! input unchanged (structurally, and by `Arc` for members) when nothing
//! under it changed. Cycle protection for self-referential bounds is an
//! explicit visiting set threaded through the recursion, never ambient
//! state.

use std::collections::HashSet;
use std::sync::Arc;

use crate::bindings::TypeBindings;
use crate::members::{FieldSig, MethodSig};
use crate::store::{TypeEnv, TypeVarDef};
use crate::subtyping::upper_bound;
use crate::ty::{GenericType, IntersectionType, Type, TypeVarId, WildcardBound};

/// Rewrite `ty` under `bindings`.
pub fn substitute(env: &dyn TypeEnv, ty: &Type, bindings: &TypeBindings) -> Type {
    if bindings.is_empty() {
        return ty.clone();
    }
    let mut visiting = HashSet::new();
    substitute_guarded(env, ty, bindings, &mut visiting)
}

pub(crate) fn substitute_guarded(
    env: &dyn TypeEnv,
    ty: &Type,
    bindings: &TypeBindings,
    visiting: &mut HashSet<TypeVarId>,
) -> Type {
    match ty {
        Type::Primitive(_) | Type::Class(_) | Type::Bottom | Type::Null => ty.clone(),
        Type::Generic(g) => {
            if !ty.mentions_any_of(bindings) {
                return ty.clone();
            }
            let mut changed = false;
            let new_args: Vec<Type> = g
                .bindings
                .bound_types()
                .map(|arg| {
                    let rewritten = substitute_guarded(env, arg, bindings, visiting);
                    if rewritten != *arg {
                        changed = true;
                    }
                    rewritten
                })
                .collect();
            if !changed {
                return ty.clone();
            }
            let params: Vec<TypeVarId> = g.bindings.parameters().collect();
            Type::Generic(Box::new(GenericType {
                def: g.def,
                bindings: TypeBindings::from_ids(&params, new_args),
            }))
        }
        Type::Var(id) => substitute_var(env, ty, *id, false, bindings, visiting),
        Type::Captured(id) => substitute_var(env, ty, *id, true, bindings, visiting),
        Type::Wildcard(WildcardBound::Unbounded) => ty.clone(),
        Type::Wildcard(WildcardBound::Extends(bound)) => {
            let rewritten = substitute_guarded(env, bound, bindings, visiting);
            if rewritten == **bound {
                ty.clone()
            } else {
                Type::extends_wildcard(rewritten)
            }
        }
        Type::Wildcard(WildcardBound::Super(bound)) => {
            let rewritten = substitute_guarded(env, bound, bindings, visiting);
            if rewritten == **bound {
                ty.clone()
            } else {
                Type::super_wildcard(rewritten)
            }
        }
        Type::Array(elem) => {
            let rewritten = substitute_guarded(env, elem, bindings, visiting);
            if rewritten == **elem {
                ty.clone()
            } else {
                Type::array(rewritten)
            }
        }
        Type::Intersection(i) => {
            let base = substitute_guarded(env, &i.base, bindings, visiting);
            let mut changed = base != i.base;
            let interfaces: Vec<Type> = i
                .interfaces
                .iter()
                .map(|iface| {
                    let rewritten = substitute_guarded(env, iface, bindings, visiting);
                    if rewritten != *iface {
                        changed = true;
                    }
                    rewritten
                })
                .collect();
            if !changed {
                ty.clone()
            } else {
                Type::Intersection(Box::new(IntersectionType { base, interfaces }))
            }
        }
    }
}

fn substitute_var(
    env: &dyn TypeEnv,
    ty: &Type,
    id: TypeVarId,
    is_capture: bool,
    bindings: &TypeBindings,
    visiting: &mut HashSet<TypeVarId>,
) -> Type {
    if let Some(bound) = bindings.get(id) {
        if matches!(bound, Type::Var(b) | Type::Captured(b) if *b == id) {
            return ty.clone();
        }
        // Chained bindings substitute recursively; re-entry on the same
        // variable means a self-referential bound, which breaks the cycle by
        // returning the variable unchanged.
        if !visiting.insert(id) {
            return ty.clone();
        }
        let result = substitute_guarded(env, bound, bindings, visiting);
        visiting.remove(&id);
        return result;
    }

    // Not bound directly, but its bounds may mention substituted parameters.
    // If they do, synthesize a fresh variable with the same declaration and
    // the rewritten bounds; the original is never mutated.
    let Some(def) = env.type_param(id) else {
        return ty.clone();
    };
    if visiting.contains(&id) {
        return ty.clone();
    }
    let lower_mentions = def
        .lower_bound
        .as_ref()
        .is_some_and(|l| l.mentions_any_of(bindings));
    if !def.upper_bound.mentions_any_of(bindings) && !lower_mentions {
        return ty.clone();
    }

    visiting.insert(id);
    let upper_bound = substitute_guarded(env, &def.upper_bound, bindings, visiting);
    let lower_bound = def
        .lower_bound
        .as_ref()
        .map(|l| substitute_guarded(env, l, bindings, visiting));
    visiting.remove(&id);

    if upper_bound == def.upper_bound && lower_bound == def.lower_bound {
        return ty.clone();
    }

    let fresh = env.reserve_var();
    env.define_var(
        fresh,
        TypeVarDef {
            name: def.name.clone(),
            position: def.position,
            declared_by: def.declared_by.clone(),
            upper_bound,
            lower_bound,
            captured_from: def.captured_from.clone(),
        },
    );
    if is_capture {
        Type::Captured(fresh)
    } else {
        Type::Var(fresh)
    }
}

/// Substitute every element of a list.
pub fn substitute_all(env: &dyn TypeEnv, types: &[Type], bindings: &TypeBindings) -> Vec<Type> {
    types
        .iter()
        .map(|ty| substitute(env, ty, bindings))
        .collect()
}

pub fn root_definition(method: &Arc<MethodSig>) -> Arc<MethodSig> {
    method.definition.clone().unwrap_or_else(|| method.clone())
}

/// Whether two signatures descend from the same declaration.
pub fn same_definition(a: &Arc<MethodSig>, b: &Arc<MethodSig>) -> bool {
    Arc::ptr_eq(&root_definition(a), &root_definition(b))
}

/// Bind a field signature onto `declaring` under `bindings`.
///
/// Unchanged signature and matching declaring type return the same `Arc`.
pub fn bind_field(
    env: &dyn TypeEnv,
    field: &Arc<FieldSig>,
    bindings: &TypeBindings,
    declaring: &Type,
) -> Arc<FieldSig> {
    let ty = substitute(env, &field.ty, bindings);
    if ty == field.ty && field.declaring == *declaring {
        return field.clone();
    }
    Arc::new(FieldSig {
        name: field.name.clone(),
        declaring: declaring.clone(),
        ty,
        access_flags: field.access_flags,
    })
}

/// Bind a method signature onto `declaring` under `bindings`.
///
/// Unchanged signature and matching declaring type return the same `Arc`;
/// unchanged signature on a different declaring type returns a redeclared
/// wrapper that keeps a handle to the original declaration.
pub fn bind_method(
    env: &dyn TypeEnv,
    method: &Arc<MethodSig>,
    bindings: &TypeBindings,
    declaring: &Type,
) -> Arc<MethodSig> {
    let params = substitute_all(env, &method.params, bindings);
    let return_type = substitute(env, &method.return_type, bindings);
    let throws = substitute_all(env, &method.throws, bindings);

    let unchanged =
        params == method.params && return_type == method.return_type && throws == method.throws;

    if unchanged && method.declaring == *declaring {
        return method.clone();
    }

    Arc::new(MethodSig {
        name: method.name.clone(),
        kind: method.kind,
        declaring: declaring.clone(),
        type_params: method.type_params.clone(),
        params,
        return_type,
        throws,
        access_flags: method.access_flags,
        is_varargs: method.is_varargs,
        definition: Some(root_definition(method)),
    })
}

/// The erasure of `ty`: its raw, parameter-free shape.
pub fn erasure(env: &dyn TypeEnv, ty: &Type) -> Type {
    erase(env, ty, false)
}

/// Erasure that also walks nested structure. With id-based raw references
/// the two agree on every reachable shape; both entry points exist because
/// callers distinguish the intent.
pub fn erasure_recursive(env: &dyn TypeEnv, ty: &Type) -> Type {
    erase(env, ty, true)
}

pub fn erasure_all(env: &dyn TypeEnv, types: &[Type]) -> Vec<Type> {
    types.iter().map(|ty| erasure(env, ty)).collect()
}

fn erase(env: &dyn TypeEnv, ty: &Type, recurse: bool) -> Type {
    match ty {
        Type::Primitive(_) | Type::Class(_) | Type::Bottom | Type::Null => ty.clone(),
        Type::Generic(g) => Type::Class(g.def),
        Type::Array(elem) => Type::array(erase(env, elem, recurse)),
        Type::Var(id) | Type::Captured(id) => match env.type_param(*id) {
            Some(def) => erase(env, &def.upper_bound, recurse),
            None => env.well_known().object_type(),
        },
        Type::Wildcard(_) => {
            let upper = upper_bound(env, ty);
            erase(env, &upper, recurse)
        }
        Type::Intersection(i) => {
            let object = env.well_known().object;
            if matches!(&i.base, Type::Class(id) if *id == object) {
                if let Some(first) = i.interfaces.first() {
                    return erase(env, first, recurse);
                }
            }
            erase(env, &i.base, recurse)
        }
    }
}
