//! The substitution environment: an immutable, ordered association of
//! generic parameters to bound types.

use crate::error::{Result, TypeError};
use crate::ty::{Type, TypeVarId};

/// Ordered parameter-to-type bindings for one generic entity.
///
/// Order is declaration order and is significant: equality and hashing are
/// structural over the ordered pairs, and the binding list's length always
/// equals the bound entity's parameter arity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypeBindings {
    entries: Vec<(TypeVarId, Type)>,
}

impl TypeBindings {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Bind `parameters` to `bound_types` positionally.
    ///
    /// Every parameter entry must be a generic-parameter variant, and the two
    /// lists must have the same length.
    pub fn create(parameters: &[Type], bound_types: Vec<Type>) -> Result<Self> {
        if parameters.len() != bound_types.len() {
            return Err(TypeError::ArityMismatch {
                expected: parameters.len(),
                found: bound_types.len(),
            });
        }

        let mut entries = Vec::with_capacity(parameters.len());
        for (parameter, bound) in parameters.iter().zip(bound_types) {
            match parameter {
                Type::Var(id) | Type::Captured(id) => entries.push((*id, bound)),
                _ => return Err(TypeError::NotGenericParameter),
            }
        }

        Ok(Self { entries })
    }

    /// The identity binding: each parameter bound to itself. This is the
    /// binding shape of an uninstantiated generic definition.
    pub fn of_params(parameters: &[TypeVarId]) -> Self {
        Self {
            entries: parameters
                .iter()
                .map(|&id| (id, Type::Var(id)))
                .collect(),
        }
    }

    pub(crate) fn from_ids(parameters: &[TypeVarId], bound_types: Vec<Type>) -> Self {
        debug_assert_eq!(parameters.len(), bound_types.len());
        Self {
            entries: parameters.iter().copied().zip(bound_types).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `parameter` has an entry at all (identity or not).
    pub fn binds(&self, parameter: TypeVarId) -> bool {
        self.entries.iter().any(|(id, _)| *id == parameter)
    }

    pub fn get(&self, parameter: TypeVarId) -> Option<&Type> {
        self.entries
            .iter()
            .find(|(id, _)| *id == parameter)
            .map(|(_, ty)| ty)
    }

    /// The type bound to `parameter`, failing if it has no entry.
    pub fn bound_type(&self, parameter: TypeVarId) -> Result<&Type> {
        self.get(parameter)
            .ok_or(TypeError::UnboundParameter(parameter))
    }

    pub fn parameters(&self) -> impl Iterator<Item = TypeVarId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }

    pub fn bound_types(&self) -> impl Iterator<Item = &Type> {
        self.entries.iter().map(|(_, ty)| ty)
    }

    pub fn pairs(&self) -> impl Iterator<Item = (TypeVarId, &Type)> {
        self.entries.iter().map(|(id, ty)| (*id, ty))
    }

    /// Add or overwrite one binding.
    ///
    /// If other entries were bound to the rebound parameter (parameter
    /// aliasing from merged scopes), they are re-pointed transitively so no
    /// stale indirect binding survives the merge.
    pub fn with_additional_binding(&self, parameter: TypeVarId, bound_type: Type) -> Self {
        let mut entries = self.entries.clone();

        match entries.iter_mut().find(|(id, _)| *id == parameter) {
            Some(entry) => entry.1 = bound_type,
            None => entries.push((parameter, bound_type)),
        }

        // Chase alias chains to a fixpoint. Each pass shortens every chain by
        // at least one hop, so `entries.len()` passes always suffice.
        for _ in 0..entries.len() {
            let mut changed = false;
            for i in 0..entries.len() {
                let Type::Var(alias) = entries[i].1 else {
                    continue;
                };
                if alias == entries[i].0 {
                    continue;
                }
                let Some(target) = entries
                    .iter()
                    .find(|(id, _)| *id == alias)
                    .map(|(_, ty)| ty.clone())
                else {
                    continue;
                };
                if target != Type::Var(alias) && target != entries[i].1 {
                    entries[i].1 = target;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        Self { entries }
    }

    /// Fold [`Self::with_additional_binding`] over all of `other`'s entries.
    pub fn with_additional_bindings(&self, other: &TypeBindings) -> Self {
        let mut result = self.clone();
        for (parameter, bound_type) in other.pairs() {
            result = result.with_additional_binding(parameter, bound_type.clone());
        }
        result
    }

    /// Whether any parameter is bound to something other than itself.
    pub fn has_bound_parameters(&self) -> bool {
        self.entries
            .iter()
            .any(|(id, ty)| *ty != Type::Var(*id))
    }

    /// Whether any parameter is still bound to itself.
    pub fn has_unbound_parameters(&self) -> bool {
        self.entries
            .iter()
            .any(|(id, ty)| *ty == Type::Var(*id))
    }

    /// Whether at least one binding is fully concrete (mentions no type
    /// variable at all).
    pub fn has_concrete_parameters(&self) -> bool {
        self.entries.iter().any(|(_, ty)| !ty.contains_variables())
    }
}
