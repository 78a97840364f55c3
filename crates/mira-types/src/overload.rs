//! Overload resolution: applicability filtering and the pairwise
//! most-specific tournament.

use std::sync::Arc;

use tracing::trace;

use crate::error::{Result, TypeError};
use crate::members::{hierarchy_depth, same_erased_signature, BindingFlags, MethodSig};
use crate::store::TypeEnv;
use crate::subtyping::{is_assignable, is_same_type};
use crate::ty::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MostSpecific {
    First,
    Second,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeWinner {
    First,
    Second,
    Tie,
}

/// Select the unique applicable-and-most-specific candidate for the supplied
/// argument types.
///
/// An empty applicable set is `Ok(None)` (the caller decides whether that is
/// an error); a tournament that ends ambiguous fails with
/// [`TypeError::AmbiguousMatch`].
pub fn select_method(
    env: &dyn TypeEnv,
    binding_flags: BindingFlags,
    candidates: &[Arc<MethodSig>],
    argument_types: &[Type],
) -> Result<Option<Arc<MethodSig>>> {
    let applicable: Vec<&Arc<MethodSig>> = candidates
        .iter()
        .filter(|m| is_applicable(env, binding_flags, m, argument_types))
        .collect();

    if applicable.is_empty() {
        return Ok(None);
    }
    if applicable.len() == 1 {
        return Ok(Some(applicable[0].clone()));
    }

    // Pairwise tournament: a running best, re-confirmed against every later
    // candidate. An ambiguity only survives if the final winner was never
    // strictly preferred over the last ambiguous challenger.
    let mut best = 0;
    let mut ambiguous = false;
    for challenger in 1..applicable.len() {
        match find_most_specific(
            env,
            applicable[best],
            applicable[challenger],
            argument_types,
            true,
        ) {
            MostSpecific::First => {}
            MostSpecific::Second => {
                best = challenger;
                ambiguous = false;
            }
            MostSpecific::Ambiguous => ambiguous = true,
        }
    }

    if ambiguous {
        return Err(TypeError::AmbiguousMatch(format!(
            "no single most specific overload of `{}` for {} argument(s)",
            applicable[0].name,
            argument_types.len()
        )));
    }

    trace!(
        name = %applicable[best].name,
        params = applicable[best].params.len(),
        "selected overload"
    );
    Ok(Some(applicable[best].clone()))
}

/// Whether a candidate can accept the supplied argument types at all.
pub(crate) fn is_applicable(
    env: &dyn TypeEnv,
    binding_flags: BindingFlags,
    method: &MethodSig,
    argument_types: &[Type],
) -> bool {
    let declared = method.params.len();
    let supplied = argument_types.len();

    if declared == supplied {
        if binding_flags.contains(BindingFlags::EXACT_BINDING) {
            return method
                .params
                .iter()
                .zip(argument_types)
                .all(|(p, a)| is_same_type(env, p, a));
        }
        for (index, (param, arg)) in method.params.iter().zip(argument_types).enumerate() {
            if parameter_accepts(env, param, arg) {
                continue;
            }
            if method.is_varargs && index + 1 == declared {
                if let Ok(element) = param.element_type() {
                    if is_assignable(env, arg, element) {
                        continue;
                    }
                }
            }
            return false;
        }
        return true;
    }

    // Count mismatch: only a variadic slot can absorb the difference.
    if !method.is_varargs || declared == 0 {
        return false;
    }
    if supplied < declared - 1 {
        return false;
    }
    if supplied < declared && binding_flags.contains(BindingFlags::EXACT_BINDING) {
        return false;
    }
    let Ok(element) = method.params[declared - 1].element_type() else {
        return false;
    };
    for index in 0..declared - 1 {
        if !parameter_accepts(env, &method.params[index], &argument_types[index]) {
            return false;
        }
    }
    argument_types[declared - 1..]
        .iter()
        .all(|arg| is_assignable(env, arg, element))
}

fn parameter_accepts(env: &dyn TypeEnv, param: &Type, arg: &Type) -> bool {
    is_same_type(env, param, arg)
        || *param == env.well_known().object_type()
        || is_assignable(env, arg, param)
}

fn effective_param(method: &MethodSig, index: usize, supplied: usize) -> Type {
    let declared = method.params.len();
    if method.is_varargs && index + 1 >= declared && supplied != declared {
        if let Ok(element) = method.params[declared - 1].element_type() {
            return element.clone();
        }
    }
    method.params[index.min(declared - 1)].clone()
}

fn find_most_specific(
    env: &dyn TypeEnv,
    m1: &Arc<MethodSig>,
    m2: &Arc<MethodSig>,
    argument_types: &[Type],
    real_arguments: bool,
) -> MostSpecific {
    // A variadic candidate is categorically less specific.
    if m1.is_varargs != m2.is_varargs {
        return if m1.is_varargs {
            MostSpecific::Second
        } else {
            MostSpecific::First
        };
    }

    let supplied = argument_types.len();
    let mut first_wins = 0u32;
    let mut second_wins = 0u32;

    for (index, arg) in argument_types.iter().enumerate() {
        let p1 = effective_param(m1, index, supplied);
        let p2 = effective_param(m2, index, supplied);
        match find_most_specific_type(env, &p1, &p2, arg) {
            TypeWinner::First => first_wins += 1,
            TypeWinner::Second => second_wins += 1,
            TypeWinner::Tie => {}
        }
    }

    match (first_wins > 0, second_wins > 0) {
        (true, false) => return MostSpecific::First,
        (false, true) => return MostSpecific::Second,
        (true, true) => return MostSpecific::Ambiguous,
        (false, false) => {}
    }

    // Every position tied. A longer fixed-arity list beats a shorter,
    // variadic-absorbing one on a real call.
    if real_arguments && m1.params.len() != m2.params.len() {
        return if m1.params.len() > m2.params.len() {
            MostSpecific::First
        } else {
            MostSpecific::Second
        };
    }

    // Same-signature collision (reachable through variance): the deeper
    // declaring type wins; equal depth stays ambiguous.
    if same_erased_signature(env, m1, m2) {
        let d1 = declaring_depth(env, m1);
        let d2 = declaring_depth(env, m2);
        if d1 != d2 {
            return if d1 > d2 {
                MostSpecific::First
            } else {
                MostSpecific::Second
            };
        }
    }

    MostSpecific::Ambiguous
}

fn declaring_depth(env: &dyn TypeEnv, method: &MethodSig) -> u32 {
    method
        .declaring
        .erased_class()
        .map(|id| hierarchy_depth(env, id))
        .unwrap_or(0)
}

fn find_most_specific_type(env: &dyn TypeEnv, p1: &Type, p2: &Type, arg: &Type) -> TypeWinner {
    if p1 == p2 || is_same_type(env, p1, p2) {
        return TypeWinner::Tie;
    }
    // Exact match with the supplied argument beats everything.
    if is_same_type(env, p1, arg) {
        return TypeWinner::First;
    }
    if is_same_type(env, p2, arg) {
        return TypeWinner::Second;
    }

    // Whichever parameter is assignable from the other (and not vice versa)
    // is the wider, less specific one.
    let p1_accepts_p2 = is_assignable(env, p2, p1);
    let p2_accepts_p1 = is_assignable(env, p1, p2);
    match (p1_accepts_p2, p2_accepts_p1) {
        (true, false) => TypeWinner::Second,
        (false, true) => TypeWinner::First,
        _ => TypeWinner::Tie,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::TypeStore;

    #[test]
    fn parameter_specificity_prefers_the_narrower_type() {
        let store = TypeStore::with_minimal_runtime();
        let wk = store.well_known();
        let object = Type::Class(wk.object);
        let string = Type::Class(wk.string);

        assert_eq!(
            find_most_specific_type(&store, &string, &object, &string),
            TypeWinner::First
        );
        assert_eq!(
            find_most_specific_type(&store, &object, &string, &string),
            TypeWinner::Second
        );
        assert_eq!(
            find_most_specific_type(&store, &object, &object, &string),
            TypeWinner::Tie
        );
    }

    #[test]
    fn primitive_parameters_compare_by_widening() {
        let store = TypeStore::with_minimal_runtime();

        // For an int argument, int beats long; long beats double.
        assert_eq!(
            find_most_specific_type(&store, &Type::int(), &Type::long(), &Type::int()),
            TypeWinner::First
        );
        assert_eq!(
            find_most_specific_type(&store, &Type::double(), &Type::long(), &Type::int()),
            TypeWinner::Second
        );
    }
}
