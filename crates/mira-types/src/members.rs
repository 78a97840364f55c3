//! Member signatures, binding-flags filtering, and member lookup over the
//! instantiated hierarchy.
//!
//! Lookup walks the receiver's ancestry superclass-first, applying each
//! ancestor's type-argument substitution, so an inherited member reports the
//! signature it has *on the receiver* (a `Box<String>` field declared as `T`
//! reports `String`).

use std::collections::HashSet;
use std::ops::BitOr;
use std::sync::Arc;

use mira_descriptors::{flags, visibility_of, Visibility};

use crate::bindings::TypeBindings;
use crate::error::{Result, TypeError};
use crate::store::TypeEnv;
use crate::substitute::{
    bind_field, bind_method, erasure, erasure_all, same_definition, substitute,
};
use crate::subtyping::{
    as_super, capture, contains_type_equivalent_lists, is_assignable, is_same_type,
    is_subtype_no_capture, upper_bound, var_upper,
};
use crate::ty::{ClassId, Type, TypeVarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSig {
    pub name: String,
    pub declaring: Type,
    pub ty: Type,
    pub access_flags: u16,
}

impl FieldSig {
    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    pub fn is_final(&self) -> bool {
        self.access_flags & flags::ACC_FINAL != 0
    }

    pub fn visibility(&self) -> Visibility {
        visibility_of(self.access_flags)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSig {
    pub name: String,
    pub kind: MethodKind,
    pub declaring: Type,
    pub type_params: Vec<TypeVarId>,
    pub params: Vec<Type>,
    /// Void for constructors.
    pub return_type: Type,
    pub throws: Vec<Type>,
    pub access_flags: u16,
    pub is_varargs: bool,
    /// The declaration this signature was instantiated from, if any.
    pub definition: Option<Arc<MethodSig>>,
}

impl MethodSig {
    pub fn is_static(&self) -> bool {
        self.access_flags & flags::ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & flags::ACC_ABSTRACT != 0
    }

    pub fn is_final(&self) -> bool {
        self.access_flags & flags::ACC_FINAL != 0
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }

    pub fn visibility(&self) -> Visibility {
        visibility_of(self.access_flags)
    }

    pub fn is_generic(&self) -> bool {
        !self.type_params.is_empty()
    }
}

/// Caller-specified member lookup filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BindingFlags(u16);

impl BindingFlags {
    pub const PUBLIC: BindingFlags = BindingFlags(1 << 0);
    pub const NON_PUBLIC: BindingFlags = BindingFlags(1 << 1);
    pub const INSTANCE: BindingFlags = BindingFlags(1 << 2);
    pub const STATIC: BindingFlags = BindingFlags(1 << 3);
    /// Restrict to members declared directly on the receiver's class.
    pub const DECLARED_ONLY: BindingFlags = BindingFlags(1 << 4);
    /// Include inherited static members.
    pub const FLATTEN_HIERARCHY: BindingFlags = BindingFlags(1 << 5);
    /// Require parameter types to match the supplied argument types exactly.
    pub const EXACT_BINDING: BindingFlags = BindingFlags(1 << 6);
    pub const IGNORE_CASE: BindingFlags = BindingFlags(1 << 7);

    pub const fn empty() -> BindingFlags {
        BindingFlags(0)
    }

    /// Public instance and static members, the standard lookup.
    pub const fn default_lookup() -> BindingFlags {
        BindingFlags(1 << 0 | 1 << 2 | 1 << 3)
    }

    pub const fn contains(self, other: BindingFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: BindingFlags) -> BindingFlags {
        BindingFlags(self.0 | other.0)
    }
}

impl BitOr for BindingFlags {
    type Output = BindingFlags;

    fn bitor(self, rhs: BindingFlags) -> BindingFlags {
        self.with(rhs)
    }
}

/// One ancestor of a receiver type, with the receiver's instantiation
/// applied.
#[derive(Debug, Clone)]
pub(crate) struct Ancestor {
    pub class: ClassId,
    pub instantiated: Type,
    pub depth: u32,
}

impl Ancestor {
    fn inherited(&self) -> bool {
        self.depth > 0
    }
}

/// The receiver's class-like ancestry, most derived first, superclasses
/// before interfaces at each level.
pub(crate) fn member_hierarchy(env: &dyn TypeEnv, ty: &Type) -> Vec<Ancestor> {
    let start = match ty {
        Type::Var(id) | Type::Captured(id) => var_upper(env, *id),
        Type::Wildcard(_) => upper_bound(env, ty),
        Type::Array(_) => Type::Class(env.well_known().object),
        Type::Primitive(_) | Type::Bottom | Type::Null => return Vec::new(),
        other => other.clone(),
    };
    let start = capture(env, &start);

    let mut out = Vec::new();
    let mut seen: HashSet<ClassId> = HashSet::new();
    let mut queue: Vec<(Type, u32)> = vec![(start, 0)];

    while !queue.is_empty() {
        let (current, depth) = queue.remove(0);
        match &current {
            Type::Intersection(i) => {
                queue.insert(0, (i.base.clone(), depth));
                for iface in &i.interfaces {
                    queue.push((iface.clone(), depth));
                }
                continue;
            }
            Type::Var(id) | Type::Captured(id) => {
                queue.insert(0, (var_upper(env, *id), depth));
                continue;
            }
            _ => {}
        }

        let Some(class) = current.erased_class() else {
            continue;
        };
        if !seen.insert(class) {
            continue;
        }
        out.push(Ancestor {
            class,
            instantiated: current.clone(),
            depth,
        });

        if let Some(st) = crate::closure::super_type(env, &current) {
            queue.push((st, depth + 1));
        }
        for iface in crate::closure::interfaces_of(env, &current) {
            queue.push((iface, depth + 1));
        }
    }

    out
}

/// The substitution an ancestor's declared members go through: its own
/// bindings for an instantiation, erased parameter bounds for a raw use.
fn member_bindings(env: &dyn TypeEnv, instantiated: &Type) -> TypeBindings {
    match instantiated {
        Type::Generic(g) => g.bindings.clone(),
        Type::Class(id) => match env.class(*id) {
            Some(def) if !def.type_params.is_empty() => {
                let erased: Vec<Type> = def
                    .type_params
                    .iter()
                    .map(|&p| erasure(env, &var_upper(env, p)))
                    .collect();
                TypeBindings::from_ids(&def.type_params, erased)
            }
            _ => TypeBindings::empty(),
        },
        _ => TypeBindings::empty(),
    }
}

fn visibility_passes(visibility: Visibility, binding_flags: BindingFlags) -> bool {
    if visibility == Visibility::Public {
        binding_flags.contains(BindingFlags::PUBLIC)
    } else {
        binding_flags.contains(BindingFlags::NON_PUBLIC)
    }
}

fn member_passes(
    visibility: Visibility,
    is_static: bool,
    inherited: bool,
    binding_flags: BindingFlags,
) -> bool {
    if !visibility_passes(visibility, binding_flags) {
        return false;
    }
    if inherited {
        if binding_flags.contains(BindingFlags::DECLARED_ONLY) {
            return false;
        }
        // Private members are never inherited.
        if visibility == Visibility::Private {
            return false;
        }
        if is_static && !binding_flags.contains(BindingFlags::FLATTEN_HIERARCHY) {
            return false;
        }
    }
    if is_static {
        binding_flags.contains(BindingFlags::STATIC)
    } else {
        binding_flags.contains(BindingFlags::INSTANCE)
    }
}

fn name_matches(member_name: &str, wanted: &str, binding_flags: BindingFlags) -> bool {
    if binding_flags.contains(BindingFlags::IGNORE_CASE) {
        member_name.eq_ignore_ascii_case(wanted)
    } else {
        member_name == wanted
    }
}

/// All fields visible on `ty` under `binding_flags`, instantiated signatures,
/// most derived declaration first. Hidden (re-declared) fields of ancestors
/// are included; [`get_field`] resolves the hiding.
pub fn get_fields(
    env: &dyn TypeEnv,
    ty: &Type,
    binding_flags: BindingFlags,
) -> Result<Vec<Arc<FieldSig>>> {
    let mut out = Vec::new();
    for ancestor in member_hierarchy(env, ty) {
        let bindings = member_bindings(env, &ancestor.instantiated);
        for field in env.fields(ancestor.class)?.iter() {
            if !member_passes(
                field.visibility(),
                field.is_static(),
                ancestor.inherited(),
                binding_flags,
            ) {
                continue;
            }
            out.push(bind_field(env, field, &bindings, &ancestor.instantiated));
        }
    }
    Ok(out)
}

/// All methods visible on `ty` under `binding_flags`, most derived first,
/// with overridden ancestor declarations collapsed away.
pub fn get_methods(
    env: &dyn TypeEnv,
    ty: &Type,
    binding_flags: BindingFlags,
) -> Result<Vec<Arc<MethodSig>>> {
    let mut out = Vec::new();
    let mut seen: HashSet<(String, Vec<Type>)> = HashSet::new();
    for ancestor in member_hierarchy(env, ty) {
        let bindings = member_bindings(env, &ancestor.instantiated);
        for method in env.methods(ancestor.class)?.iter() {
            if !member_passes(
                method.visibility(),
                method.is_static(),
                ancestor.inherited(),
                binding_flags,
            ) {
                continue;
            }
            // Keyed on the declared (pre-substitution) erased signature, so
            // an override shadows its ancestor regardless of instantiation.
            let key = (method.name.clone(), erasure_all(env, &method.params));
            if !seen.insert(key) {
                continue;
            }
            out.push(bind_method(env, method, &bindings, &ancestor.instantiated));
        }
    }
    Ok(out)
}

/// Declared constructors of `ty` under `binding_flags`; constructors are
/// never inherited.
pub fn get_constructors(
    env: &dyn TypeEnv,
    ty: &Type,
    binding_flags: BindingFlags,
) -> Result<Vec<Arc<MethodSig>>> {
    let Some(class) = ty.erased_class() else {
        return Ok(Vec::new());
    };
    let bindings = member_bindings(env, ty);
    let mut out = Vec::new();
    for ctor in env.constructors(class)?.iter() {
        if !visibility_passes(ctor.visibility(), binding_flags) {
            continue;
        }
        out.push(bind_method(env, ctor, &bindings, ty));
    }
    Ok(out)
}

/// Nested classes of `ty` (and its ancestors unless `DECLARED_ONLY`).
pub fn get_nested_classes(
    env: &dyn TypeEnv,
    ty: &Type,
    binding_flags: BindingFlags,
) -> Result<Vec<ClassId>> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for ancestor in member_hierarchy(env, ty) {
        if ancestor.inherited() && binding_flags.contains(BindingFlags::DECLARED_ONLY) {
            continue;
        }
        for &nested in env.nested_classes(ancestor.class)?.iter() {
            let Some(def) = env.class(nested) else {
                continue;
            };
            if !visibility_passes(def.visibility(), binding_flags) {
                continue;
            }
            if seen.insert(nested) {
                out.push(nested);
            }
        }
    }
    Ok(out)
}

/// Field lookup: the most derived declaration wins; two candidates on the
/// same declaring type, or statics inherited from competing interfaces, are
/// ambiguous.
pub fn get_field(
    env: &dyn TypeEnv,
    ty: &Type,
    name: &str,
    binding_flags: BindingFlags,
) -> Result<Option<Arc<FieldSig>>> {
    let mut candidates = Vec::new();
    for ancestor in member_hierarchy(env, ty) {
        let bindings = member_bindings(env, &ancestor.instantiated);
        for field in env.fields(ancestor.class)?.iter() {
            if !name_matches(&field.name, name, binding_flags) {
                continue;
            }
            if !member_passes(
                field.visibility(),
                field.is_static(),
                ancestor.inherited(),
                binding_flags,
            ) {
                continue;
            }
            candidates.push((
                bind_field(env, field, &bindings, &ancestor.instantiated),
                ancestor.class,
            ));
        }
    }

    let mut found: Option<(Arc<FieldSig>, ClassId)> = None;
    let mut competing_interface_statics = false;

    for (candidate, declaring) in candidates {
        let Some(found_declaring) = found.as_ref().map(|(_, id)| *id) else {
            found = Some((candidate, declaring));
            continue;
        };
        if declaring == found_declaring {
            return Err(TypeError::AmbiguousMatch(format!(
                "multiple fields named `{name}` on the same declaring type"
            )));
        }
        let found_is_interface = class_is_interface(env, found_declaring);
        if found_is_interface && class_is_interface(env, declaring) {
            competing_interface_statics = true;
        }
        if is_subtype_no_capture(env, &Type::Class(declaring), &Type::Class(found_declaring))
            || found_is_interface
        {
            found = Some((candidate, declaring));
        }
    }

    if competing_interface_statics {
        if let Some((_, declaring)) = &found {
            if class_is_interface(env, *declaring) {
                return Err(TypeError::AmbiguousMatch(format!(
                    "field `{name}` is inherited from multiple interfaces"
                )));
            }
        }
    }

    Ok(found.map(|(field, _)| field))
}

fn class_is_interface(env: &dyn TypeEnv, id: ClassId) -> bool {
    env.class(id).map(|c| c.is_interface()).unwrap_or(false)
}

/// Method lookup. With argument types the candidate set goes through
/// overload selection; without them, a unique candidate (or re-declarations
/// of one signature, resolved to the most derived) is required.
pub fn get_method(
    env: &dyn TypeEnv,
    ty: &Type,
    name: &str,
    binding_flags: BindingFlags,
    parameter_types: Option<&[Type]>,
) -> Result<Option<Arc<MethodSig>>> {
    let mut candidates = Vec::new();
    for method in get_methods(env, ty, binding_flags)? {
        if name_matches(&method.name, name, binding_flags) {
            candidates.push(method);
        }
    }

    if candidates.is_empty() {
        return Ok(None);
    }

    let Some(parameter_types) = parameter_types else {
        if candidates.len() == 1 {
            return Ok(Some(candidates.into_iter().next().expect("length checked")));
        }
        let first = candidates[0].clone();
        let all_same = candidates
            .iter()
            .all(|c| same_erased_signature(env, c, &first));
        if !all_same {
            return Err(TypeError::AmbiguousMatch(format!(
                "multiple methods named `{name}` with different signatures"
            )));
        }
        return Ok(most_derived(env, candidates));
    };

    crate::overload::select_method(env, binding_flags, &candidates, parameter_types)
}

/// Constructor lookup, routed through overload selection.
pub fn get_constructor(
    env: &dyn TypeEnv,
    ty: &Type,
    binding_flags: BindingFlags,
    parameter_types: &[Type],
) -> Result<Option<Arc<MethodSig>>> {
    let candidates = get_constructors(env, ty, binding_flags)?;
    if candidates.is_empty() {
        return Ok(None);
    }
    crate::overload::select_method(env, binding_flags, &candidates, parameter_types)
}

pub(crate) fn same_erased_signature(
    env: &dyn TypeEnv,
    a: &Arc<MethodSig>,
    b: &Arc<MethodSig>,
) -> bool {
    a.name == b.name && erasure_all(env, &a.params) == erasure_all(env, &b.params)
}

fn most_derived(env: &dyn TypeEnv, candidates: Vec<Arc<MethodSig>>) -> Option<Arc<MethodSig>> {
    candidates.into_iter().max_by_key(|m| {
        m.declaring
            .erased_class()
            .map(|id| hierarchy_depth(env, id))
            .unwrap_or(0)
    })
}

/// Supertype hops from `id` to the hierarchy root.
pub fn hierarchy_depth(env: &dyn TypeEnv, id: ClassId) -> u32 {
    let mut depth = 0;
    let mut current = Type::Class(id);
    while let Some(next) = crate::closure::super_type(env, &current) {
        let next = erasure(env, &next);
        if next == current {
            break;
        }
        depth += 1;
        current = next;
    }
    depth
}

pub fn in_same_package(env: &dyn TypeEnv, a: ClassId, b: ClassId) -> bool {
    if a == b {
        return true;
    }
    match (env.class(a), env.class(b)) {
        (Some(ca), Some(cb)) => ca.package() == cb.package(),
        _ => false,
    }
}

/// Whether `member` (by visibility and declaring type) is inherited into
/// `site`.
pub fn is_inherited_in(env: &dyn TypeEnv, site: &Type, member: &MethodSig) -> bool {
    if matches!(site, Type::Null | Type::Bottom) {
        return false;
    }
    let site_is_interface = site
        .erased_class()
        .map(|id| class_is_interface(env, id))
        .unwrap_or(false);

    match member.visibility() {
        Visibility::Public => true,
        Visibility::Private => is_same_type(env, site, &member.declaring),
        Visibility::Protected => !site_is_interface,
        Visibility::Package => {
            let Some(declaring) = member.declaring.erased_class() else {
                return false;
            };
            let mut current = site.clone();
            loop {
                let Some(id) = current.erased_class() else {
                    return true;
                };
                if id == declaring {
                    break;
                }
                if !in_same_package(env, id, declaring) {
                    return false;
                }
                match crate::closure::super_type(env, &current) {
                    Some(next) => current = next,
                    None => break,
                }
            }
            !site_is_interface
        }
    }
}

fn is_overridable_in(env: &dyn TypeEnv, method: &MethodSig, origin: &Type) -> bool {
    let origin_is_interface = origin
        .erased_class()
        .map(|id| class_is_interface(env, id))
        .unwrap_or(false);

    match method.visibility() {
        Visibility::Public => true,
        Visibility::Private => false,
        Visibility::Protected => !origin_is_interface,
        Visibility::Package => {
            let (Some(a), Some(b)) = (
                method.declaring.erased_class(),
                origin.erased_class(),
            ) else {
                return false;
            };
            in_same_package(env, a, b) && !origin_is_interface
        }
    }
}

/// Same-parameters check up to the containment equivalence.
pub fn has_same_args(env: &dyn TypeEnv, a: &MethodSig, b: &MethodSig) -> bool {
    contains_type_equivalent_lists(env, &a.params, &b.params)
}

/// Whether `a`'s parameter list matches `b`'s exactly or matches `b`'s
/// erasure.
pub fn is_sub_signature(env: &dyn TypeEnv, a: &MethodSig, b: &MethodSig) -> bool {
    has_same_args(env, a, b)
        || contains_type_equivalent_lists(env, &a.params, &erasure_all(env, &b.params))
}

fn covariant_return_type(env: &dyn TypeEnv, t: &Type, s: &Type) -> bool {
    is_same_type(env, t, s)
        || (!t.is_primitive() && !s.is_primitive() && is_assignable(env, t, s))
}

fn result_subtype(env: &dyn TypeEnv, t: &MethodSig, s: &MethodSig) -> bool {
    // Rename s's own type variables to t's before comparing returns.
    let s_return = if s.type_params.len() == t.type_params.len() && !s.type_params.is_empty() {
        let t_vars: Vec<Type> = t.type_params.iter().map(|&id| Type::Var(id)).collect();
        let renaming = TypeBindings::from_ids(&s.type_params, t_vars);
        substitute(env, &s.return_type, &renaming)
    } else {
        s.return_type.clone()
    };
    covariant_return_type(env, &t.return_type, &s_return)
}

fn return_type_substitutable(env: &dyn TypeEnv, a: &MethodSig, b: &MethodSig) -> bool {
    if has_same_args(env, a, b) {
        return result_subtype(env, a, b);
    }
    covariant_return_type(env, &a.return_type, &erasure(env, &b.return_type))
}

/// Whether `method` (on a subtype) overrides `other` (declared in an
/// ancestor). With `check_result`, covariant-return compatibility is also
/// required.
pub fn overrides(
    env: &dyn TypeEnv,
    method: &Arc<MethodSig>,
    other: &Arc<MethodSig>,
    check_result: bool,
) -> bool {
    if Arc::ptr_eq(method, other) || same_definition(method, other) {
        return true;
    }
    if method.kind != MethodKind::Method || other.kind != MethodKind::Method {
        return false;
    }
    if other.is_final() || other.is_private() {
        return false;
    }
    if method.name != other.name || method.params.len() != other.params.len() {
        return false;
    }
    if !is_overridable_in(env, other, &method.declaring) {
        return false;
    }

    // Direct implementation.
    if as_super(env, &method.declaring, &other.declaring).is_some()
        && is_sub_signature(env, method, other)
    {
        if !check_result {
            return true;
        }
        if return_type_substitutable(env, method, other) {
            return true;
        }
    }

    // Inherited implementation: a concrete method satisfying an abstract one.
    if method.is_abstract() || !other.is_abstract() {
        return false;
    }
    is_sub_signature(env, method, other) && (!check_result || result_subtype(env, method, other))
}
