//! The type arena: class and type-variable tables, the identity cache from
//! binary names to resolved classes, and lazy member population from an
//! external [`DescriptorSource`].
//!
//! Resolution follows a double-checked discipline: reads are lock-free on a
//! cache hit; misses serialize on a single resolve lock, re-check, resolve,
//! and publish through once-cells. Headers and each member category publish
//! all-or-nothing, so no reader ever observes a partially-populated list.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, RwLock};

use mira_descriptors::{
    flags, ClassStub, DescriptorSource, MethodStub, RawType, RawWildcard, StubSet, Visibility,
};
use tracing::{debug, trace};

use crate::error::{Result, TypeError};
use crate::members::{FieldSig, MethodKind, MethodSig};
use crate::runtime;
use crate::ty::{ClassId, PrimitiveKind, Type, TypeVarId, WildcardBound};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

/// The resolved header of one class-like entity. Members are not part of the
/// header; they resolve lazily per category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDef {
    /// Canonical binary name; also the identity key in the descriptor source.
    pub name: String,
    pub kind: ClassKind,
    pub access_flags: u16,
    pub type_params: Vec<TypeVarId>,
    pub super_class: Option<Type>,
    pub interfaces: Vec<Type>,
    pub enclosing: Option<ClassId>,
}

impl ClassDef {
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & flags::ACC_ABSTRACT != 0
    }

    pub fn is_final(&self) -> bool {
        self.access_flags & flags::ACC_FINAL != 0
    }

    pub fn visibility(&self) -> Visibility {
        mira_descriptors::visibility_of(self.access_flags)
    }

    pub fn package(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) => &self.name[..idx],
            None => "",
        }
    }
}

/// What declared a type variable. An association handle, not ownership: the
/// method form identifies its callable by declaring class, name, and overload
/// ordinal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarOwner {
    Class(ClassId),
    Method {
        class: ClassId,
        name: String,
        index: u32,
    },
    /// Synthesized during capture conversion or substitution.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVarDef {
    pub name: String,
    pub position: u32,
    pub declared_by: VarOwner,
    pub upper_bound: Type,
    /// `None` means the bottom type.
    pub lower_bound: Option<Type>,
    /// For capture variables, the wildcard this capture stands in for.
    pub captured_from: Option<WildcardBound>,
}

impl TypeVarDef {
    pub fn is_capture(&self) -> bool {
        self.captured_from.is_some()
    }
}

/// Anchor classes the algebra itself depends on, resolved once at store
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellKnownTypes {
    pub object: ClassId,
    pub string: ClassId,
    pub cloneable: ClassId,
    pub serializable: ClassId,
    pub comparable: ClassId,
    pub iterable: ClassId,
    pub collection: ClassId,
    pub list: ClassId,
    pub number: ClassId,
    pub throwable: ClassId,
    pub boolean: ClassId,
    pub byte: ClassId,
    pub character: ClassId,
    pub short: ClassId,
    pub integer: ClassId,
    pub long: ClassId,
    pub float: ClassId,
    pub double: ClassId,
}

impl WellKnownTypes {
    pub fn object_type(&self) -> Type {
        Type::Class(self.object)
    }

    /// The boxed class for a primitive kind, if it has one.
    pub fn boxed(&self, kind: PrimitiveKind) -> Option<ClassId> {
        match kind {
            PrimitiveKind::Void => None,
            PrimitiveKind::Boolean => Some(self.boolean),
            PrimitiveKind::Byte => Some(self.byte),
            PrimitiveKind::Char => Some(self.character),
            PrimitiveKind::Short => Some(self.short),
            PrimitiveKind::Int => Some(self.integer),
            PrimitiveKind::Long => Some(self.long),
            PrimitiveKind::Float => Some(self.float),
            PrimitiveKind::Double => Some(self.double),
        }
    }

    /// The primitive kind a box class unwraps to, if any.
    pub fn unboxed(&self, id: ClassId) -> Option<PrimitiveKind> {
        if id == self.boolean {
            Some(PrimitiveKind::Boolean)
        } else if id == self.byte {
            Some(PrimitiveKind::Byte)
        } else if id == self.character {
            Some(PrimitiveKind::Char)
        } else if id == self.short {
            Some(PrimitiveKind::Short)
        } else if id == self.integer {
            Some(PrimitiveKind::Int)
        } else if id == self.long {
            Some(PrimitiveKind::Long)
        } else if id == self.float {
            Some(PrimitiveKind::Float)
        } else if id == self.double {
            Some(PrimitiveKind::Double)
        } else {
            None
        }
    }
}

/// Read interface the relation engine works against.
///
/// `reserve_var`/`define_var` are the one "write" concession: they append to
/// the type-variable arena (never mutating published entries), which is what
/// lets capture conversion and substitution synthesize fresh variables while
/// every relation keeps a `&dyn TypeEnv` signature.
pub trait TypeEnv {
    fn class(&self, id: ClassId) -> Option<Arc<ClassDef>>;
    fn type_param(&self, id: TypeVarId) -> Option<Arc<TypeVarDef>>;
    fn fields(&self, id: ClassId) -> Result<Arc<[Arc<FieldSig>]>>;
    fn methods(&self, id: ClassId) -> Result<Arc<[Arc<MethodSig>]>>;
    fn constructors(&self, id: ClassId) -> Result<Arc<[Arc<MethodSig>]>>;
    fn nested_classes(&self, id: ClassId) -> Result<Arc<[ClassId]>>;
    fn lookup_class(&self, name: &str) -> Option<ClassId>;
    fn well_known(&self) -> WellKnownTypes;
    fn reserve_var(&self) -> TypeVarId;
    fn define_var(&self, id: TypeVarId, def: TypeVarDef);
}

struct ClassEntry {
    name: String,
    /// Set before `def` so in-flight cyclic references can build bindings.
    params: OnceLock<Arc<[TypeVarId]>>,
    def: OnceLock<Arc<ClassDef>>,
    /// Raw members retained for lazy category resolution (source-backed
    /// classes only).
    stub: OnceLock<ClassStub>,
    fields: OnceLock<Arc<[Arc<FieldSig>]>>,
    methods: OnceLock<Arc<[Arc<MethodSig>]>>,
    constructors: OnceLock<Arc<[Arc<MethodSig>]>>,
    nested: OnceLock<Arc<[ClassId]>>,
}

impl ClassEntry {
    fn new(name: String) -> Self {
        Self {
            name,
            params: OnceLock::new(),
            def: OnceLock::new(),
            stub: OnceLock::new(),
            fields: OnceLock::new(),
            methods: OnceLock::new(),
            constructors: OnceLock::new(),
            nested: OnceLock::new(),
        }
    }
}

/// Name scope for resolving `RawType::Var` references: method parameters
/// shadow class parameters.
struct ParamScope<'a> {
    class: &'a [(String, TypeVarId)],
    method: &'a [(String, TypeVarId)],
}

impl ParamScope<'_> {
    fn lookup(&self, name: &str) -> Option<TypeVarId> {
        self.method
            .iter()
            .chain(self.class.iter())
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }
}

pub struct TypeStore {
    classes: RwLock<Vec<Arc<ClassEntry>>>,
    /// Published name -> id mappings (header fully defined).
    names: RwLock<HashMap<String, ClassId>>,
    /// In-flight mappings; only touched under the resolve lock.
    pending_names: Mutex<HashMap<String, ClassId>>,
    vars: RwLock<Vec<Arc<OnceLock<Arc<TypeVarDef>>>>>,
    /// User source first, builtin runtime as fallback.
    sources: Vec<Box<dyn DescriptorSource>>,
    resolve_lock: Mutex<()>,
    well_known: OnceLock<WellKnownTypes>,
}

impl std::fmt::Debug for TypeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeStore")
            .field("classes", &self.classes.read().expect("class table").len())
            .field("vars", &self.vars.read().expect("var table").len())
            .finish_non_exhaustive()
    }
}

impl TypeStore {
    /// A store over the built-in minimal runtime universe.
    pub fn with_minimal_runtime() -> TypeStore {
        Self::from_sources(Vec::new())
            .expect("the builtin runtime universe always resolves")
    }

    /// A store that resolves classes from `source`, falling back to the
    /// built-in minimal runtime for the core `java.lang`/`java.util` anchors.
    pub fn with_source(source: impl DescriptorSource + 'static) -> Result<TypeStore> {
        Self::from_sources(vec![Box::new(source)])
    }

    fn from_sources(mut sources: Vec<Box<dyn DescriptorSource>>) -> Result<TypeStore> {
        sources.push(Box::new(builtin_runtime().clone()));

        let store = TypeStore {
            classes: RwLock::new(Vec::new()),
            names: RwLock::new(HashMap::new()),
            pending_names: Mutex::new(HashMap::new()),
            vars: RwLock::new(Vec::new()),
            sources,
            resolve_lock: Mutex::new(()),
            well_known: OnceLock::new(),
        };
        store.install_well_known()?;
        Ok(store)
    }

    fn install_well_known(&self) -> Result<()> {
        let wk = WellKnownTypes {
            object: self.resolve("java.lang.Object")?,
            string: self.resolve("java.lang.String")?,
            cloneable: self.resolve("java.lang.Cloneable")?,
            serializable: self.resolve("java.io.Serializable")?,
            comparable: self.resolve("java.lang.Comparable")?,
            iterable: self.resolve("java.lang.Iterable")?,
            collection: self.resolve("java.util.Collection")?,
            list: self.resolve("java.util.List")?,
            number: self.resolve("java.lang.Number")?,
            throwable: self.resolve("java.lang.Throwable")?,
            boolean: self.resolve("java.lang.Boolean")?,
            byte: self.resolve("java.lang.Byte")?,
            character: self.resolve("java.lang.Character")?,
            short: self.resolve("java.lang.Short")?,
            integer: self.resolve("java.lang.Integer")?,
            long: self.resolve("java.lang.Long")?,
            float: self.resolve("java.lang.Float")?,
            double: self.resolve("java.lang.Double")?,
        };
        self.well_known
            .set(wk)
            .expect("well-known types installed exactly once");
        Ok(())
    }

    /// Resolve a binary name to its class, pulling the descriptor from the
    /// attached source on a cache miss. Idempotent and safe to call from any
    /// thread.
    pub fn resolve(&self, binary_name: &str) -> Result<ClassId> {
        if let Some(id) = self.lookup_class(binary_name) {
            return Ok(id);
        }
        let _guard = self.resolve_lock.lock().expect("resolve lock poisoned");
        self.resolve_locked(binary_name)
    }

    /// Teacher-style convenience: published id for a name, if any.
    pub fn class_id(&self, binary_name: &str) -> Option<ClassId> {
        self.lookup_class(binary_name)
    }

    fn resolve_locked(&self, binary_name: &str) -> Result<ClassId> {
        if let Some(id) = self.lookup_class(binary_name) {
            return Ok(id);
        }
        if let Some(&id) = self
            .pending_names
            .lock()
            .expect("pending names poisoned")
            .get(binary_name)
        {
            return Ok(id);
        }

        let stub = self
            .source_stub(binary_name)
            .ok_or_else(|| TypeError::UnresolvedReference(binary_name.to_string()))?;

        let id = self.push_entry(binary_name.to_string());
        self.pending_names
            .lock()
            .expect("pending names poisoned")
            .insert(binary_name.to_string(), id);

        let defined = self.define_from_stub(id, &stub);

        self.pending_names
            .lock()
            .expect("pending names poisoned")
            .remove(binary_name);

        defined?;

        self.names
            .write()
            .expect("name table poisoned")
            .insert(binary_name.to_string(), id);

        debug!(class = binary_name, %id, "resolved class header");
        Ok(id)
    }

    fn source_stub(&self, binary_name: &str) -> Option<ClassStub> {
        self.sources
            .iter()
            .find_map(|source| source.class_stub(binary_name))
    }

    fn push_entry(&self, name: String) -> ClassId {
        let mut classes = self.classes.write().expect("class table poisoned");
        let id = ClassId(classes.len() as u32);
        classes.push(Arc::new(ClassEntry::new(name)));
        id
    }

    fn entry(&self, id: ClassId) -> Option<Arc<ClassEntry>> {
        self.classes
            .read()
            .expect("class table poisoned")
            .get(id.index())
            .cloned()
    }

    fn define_from_stub(&self, id: ClassId, stub: &ClassStub) -> Result<()> {
        let entry = self.entry(id).expect("entry reserved before definition");

        let param_ids: Vec<TypeVarId> = stub.type_params.iter().map(|_| self.reserve_var()).collect();
        entry
            .params
            .set(Arc::from(param_ids.as_slice()))
            .expect("class params defined exactly once");

        let class_scope: Vec<(String, TypeVarId)> = stub
            .type_params
            .iter()
            .zip(&param_ids)
            .map(|(tp, &vid)| (tp.name.clone(), vid))
            .collect();
        let scope = ParamScope {
            class: &class_scope,
            method: &[],
        };

        for (position, (tp, &vid)) in stub.type_params.iter().zip(&param_ids).enumerate() {
            let upper_bound = self.raw_bounds_to_type(&tp.bounds, &scope)?;
            self.define_var(
                vid,
                TypeVarDef {
                    name: tp.name.clone(),
                    position: position as u32,
                    declared_by: VarOwner::Class(id),
                    upper_bound,
                    lower_bound: None,
                    captured_from: None,
                },
            );
        }

        let super_class = stub
            .super_class
            .as_ref()
            .map(|raw| self.raw_to_type(raw, &scope))
            .transpose()?;
        let interfaces = stub
            .interfaces
            .iter()
            .map(|raw| self.raw_to_type(raw, &scope))
            .collect::<Result<Vec<_>>>()?;
        let enclosing = stub
            .enclosing_class
            .as_deref()
            .map(|name| self.resolve_locked(name))
            .transpose()?;

        let def = ClassDef {
            name: stub.binary_name.clone(),
            kind: if stub.is_interface() {
                ClassKind::Interface
            } else {
                ClassKind::Class
            },
            access_flags: stub.access_flags,
            type_params: param_ids,
            super_class,
            interfaces,
            enclosing,
        };

        entry
            .def
            .set(Arc::new(def))
            .expect("class header defined exactly once");
        entry
            .stub
            .set(stub.clone())
            .expect("class stub retained exactly once");
        Ok(())
    }

    fn raw_bounds_to_type(&self, bounds: &[RawType], scope: &ParamScope<'_>) -> Result<Type> {
        match bounds {
            [] => Ok(Type::Class(self.resolve_locked("java.lang.Object")?)),
            [single] => self.raw_to_type(single, scope),
            many => {
                let resolved = many
                    .iter()
                    .map(|raw| self.raw_to_type(raw, scope))
                    .collect::<Result<Vec<_>>>()?;
                self.intersection_of(resolved)
            }
        }
    }

    /// Intersection construction that does not require the well-known anchors
    /// to be installed yet (it is used while installing them).
    fn intersection_of(&self, bounds: Vec<Type>) -> Result<Type> {
        let object = Type::Class(self.resolve_locked("java.lang.Object")?);
        let mut base = object;
        let mut interfaces = Vec::with_capacity(bounds.len());

        for (index, bound) in bounds.into_iter().enumerate() {
            if bound.is_type_variable() {
                return Err(TypeError::IllegalIntersectionBounds(
                    "a generic parameter may not be an intersection bound",
                ));
            }
            let is_interface = bound
                .erased_class()
                .and_then(|cid| self.class(cid))
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

        Ok(Type::Intersection(Box::new(crate::ty::IntersectionType {
            base,
            interfaces,
        })))
    }

    fn raw_to_type(&self, raw: &RawType, scope: &ParamScope<'_>) -> Result<Type> {
        match raw {
            RawType::Base(base) => Ok(Type::Primitive(base_kind(*base))),
            RawType::Var(name) => scope.lookup(name).map(Type::Var).ok_or_else(|| {
                TypeError::UnresolvedReference(format!("type variable `{name}`"))
            }),
            RawType::Array(elem) => Ok(Type::array(self.raw_to_type(elem, scope)?)),
            RawType::Wildcard(RawWildcard::Unbounded) => Ok(Type::unbounded_wildcard()),
            RawType::Wildcard(RawWildcard::Extends(bound)) => {
                Ok(Type::extends_wildcard(self.raw_to_type(bound, scope)?))
            }
            RawType::Wildcard(RawWildcard::Super(bound)) => {
                Ok(Type::super_wildcard(self.raw_to_type(bound, scope)?))
            }
            RawType::Named { name, args } => {
                let cid = self.resolve_locked(name)?;
                if args.is_empty() {
                    return Ok(Type::Class(cid));
                }
                let entry = self.entry(cid).expect("resolved class has an entry");
                let params = entry
                    .params
                    .get()
                    .cloned()
                    .ok_or_else(|| TypeError::UnresolvedReference(name.clone()))?;
                if params.len() != args.len() {
                    return Err(TypeError::ArityMismatch {
                        expected: params.len(),
                        found: args.len(),
                    });
                }
                let resolved_args = args
                    .iter()
                    .map(|raw| self.raw_to_type(raw, scope))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Type::Generic(Box::new(crate::ty::GenericType {
                    def: cid,
                    bindings: crate::bindings::TypeBindings::from_ids(&params, resolved_args),
                })))
            }
        }
    }

    fn class_scope_of(&self, entry: &ClassEntry) -> Vec<(String, TypeVarId)> {
        entry
            .params
            .get()
            .map(|params| {
                params
                    .iter()
                    .map(|&vid| {
                        let name = self
                            .type_param(vid)
                            .map(|def| def.name.clone())
                            .unwrap_or_default();
                        (name, vid)
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn fields_of(&self, id: ClassId) -> Result<Arc<[Arc<FieldSig>]>> {
        let Some(entry) = self.entry(id) else {
            return Ok(Arc::from([]));
        };
        if let Some(fields) = entry.fields.get() {
            return Ok(fields.clone());
        }
        let _guard = self.resolve_lock.lock().expect("resolve lock poisoned");
        if let Some(fields) = entry.fields.get() {
            return Ok(fields.clone());
        }

        let computed = self.resolve_declared_fields(&entry, id)?;
        let _ = entry.fields.set(computed.clone());
        Ok(computed)
    }

    fn resolve_declared_fields(
        &self,
        entry: &ClassEntry,
        id: ClassId,
    ) -> Result<Arc<[Arc<FieldSig>]>> {
        let Some(stub) = entry.stub.get() else {
            return Ok(Arc::from([]));
        };
        let declaring = crate::ty::definition_of(self, id);
        let class_scope = self.class_scope_of(entry);
        let scope = ParamScope {
            class: &class_scope,
            method: &[],
        };

        let fields = stub
            .fields
            .iter()
            .map(|f| {
                Ok(Arc::new(FieldSig {
                    name: f.name.clone(),
                    declaring: declaring.clone(),
                    ty: self.raw_to_type(&f.ty, &scope)?,
                    access_flags: f.access_flags,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        trace!(class = %entry.name, count = fields.len(), "resolved declared fields");
        Ok(Arc::from(fields))
    }

    fn methods_of(&self, id: ClassId, kind: MethodKind) -> Result<Arc<[Arc<MethodSig>]>> {
        let Some(entry) = self.entry(id) else {
            return Ok(Arc::from([]));
        };
        let cell = match kind {
            MethodKind::Method => &entry.methods,
            MethodKind::Constructor => &entry.constructors,
        };
        if let Some(methods) = cell.get() {
            return Ok(methods.clone());
        }
        let _guard = self.resolve_lock.lock().expect("resolve lock poisoned");
        if let Some(methods) = cell.get() {
            return Ok(methods.clone());
        }

        let computed = self.resolve_declared_methods(&entry, id, kind)?;
        let cell = match kind {
            MethodKind::Method => &entry.methods,
            MethodKind::Constructor => &entry.constructors,
        };
        let _ = cell.set(computed.clone());
        Ok(computed)
    }

    fn resolve_declared_methods(
        &self,
        entry: &ClassEntry,
        id: ClassId,
        kind: MethodKind,
    ) -> Result<Arc<[Arc<MethodSig>]>> {
        let Some(stub) = entry.stub.get() else {
            return Ok(Arc::from([]));
        };
        let declaring = crate::ty::definition_of(self, id);
        let class_scope = self.class_scope_of(entry);

        let mut out = Vec::new();
        for (index, m) in stub
            .methods
            .iter()
            .filter(|m| m.is_constructor() == (kind == MethodKind::Constructor))
            .enumerate()
        {
            out.push(Arc::new(self.resolve_method_stub(
                id,
                &declaring,
                &class_scope,
                m,
                kind,
                index as u32,
            )?));
        }

        trace!(class = %entry.name, ?kind, count = out.len(), "resolved declared methods");
        Ok(Arc::from(out))
    }

    fn resolve_method_stub(
        &self,
        class: ClassId,
        declaring: &Type,
        class_scope: &[(String, TypeVarId)],
        stub: &MethodStub,
        kind: MethodKind,
        index: u32,
    ) -> Result<MethodSig> {
        let param_ids: Vec<TypeVarId> = stub.type_params.iter().map(|_| self.reserve_var()).collect();
        let method_scope: Vec<(String, TypeVarId)> = stub
            .type_params
            .iter()
            .zip(&param_ids)
            .map(|(tp, &vid)| (tp.name.clone(), vid))
            .collect();
        let scope = ParamScope {
            class: class_scope,
            method: &method_scope,
        };

        for (position, (tp, &vid)) in stub.type_params.iter().zip(&param_ids).enumerate() {
            let upper_bound = self.raw_bounds_to_type(&tp.bounds, &scope)?;
            self.define_var(
                vid,
                TypeVarDef {
                    name: tp.name.clone(),
                    position: position as u32,
                    declared_by: VarOwner::Method {
                        class,
                        name: stub.name.clone(),
                        index,
                    },
                    upper_bound,
                    lower_bound: None,
                    captured_from: None,
                },
            );
        }

        let params = stub
            .params
            .iter()
            .map(|raw| self.raw_to_type(raw, &scope))
            .collect::<Result<Vec<_>>>()?;
        let return_type = stub
            .return_type
            .as_ref()
            .map(|raw| self.raw_to_type(raw, &scope))
            .transpose()?
            .unwrap_or_else(Type::void);
        let throws = stub
            .throws
            .iter()
            .map(|raw| self.raw_to_type(raw, &scope))
            .collect::<Result<Vec<_>>>()?;

        Ok(MethodSig {
            name: stub.name.clone(),
            kind,
            declaring: declaring.clone(),
            type_params: param_ids,
            params,
            return_type,
            throws,
            access_flags: stub.access_flags,
            is_varargs: stub.is_varargs(),
            definition: None,
        })
    }

    fn nested_of(&self, id: ClassId) -> Result<Arc<[ClassId]>> {
        let Some(entry) = self.entry(id) else {
            return Ok(Arc::from([]));
        };
        if let Some(nested) = entry.nested.get() {
            return Ok(nested.clone());
        }
        let _guard = self.resolve_lock.lock().expect("resolve lock poisoned");
        if let Some(nested) = entry.nested.get() {
            return Ok(nested.clone());
        }

        let computed: Arc<[ClassId]> = match entry.stub.get() {
            Some(stub) => stub
                .nested_classes
                .iter()
                .map(|name| self.resolve_locked(name))
                .collect::<Result<Vec<_>>>()?
                .into(),
            None => Arc::from([]),
        };
        let _ = entry.nested.set(computed.clone());
        Ok(computed)
    }

    // ---- programmatic definition ------------------------------------------

    /// Reserve a class id under `name` without defining it yet. The header
    /// must be supplied later through [`Self::define_class`]; references to
    /// the id are legal in the meantime, which is how cyclic headers are
    /// built.
    pub fn intern_class(&mut self, name: &str) -> ClassId {
        if let Some(id) = self.lookup_class(name) {
            return id;
        }
        let id = self.push_entry(name.to_string());
        self.names
            .write()
            .expect("name table poisoned")
            .insert(name.to_string(), id);
        id
    }

    pub fn define_class(&mut self, id: ClassId, def: ClassDef) {
        let entry = self.entry(id).expect("class id was interned");
        debug_assert_eq!(entry.name, def.name, "definition name must match interned name");
        entry
            .params
            .set(Arc::from(def.type_params.as_slice()))
            .expect("class params defined exactly once");
        entry
            .def
            .set(Arc::new(def))
            .expect("class header defined exactly once");
    }

    pub fn add_class(&mut self, def: ClassDef) -> ClassId {
        let id = self.intern_class(&def.name.clone());
        self.define_class(id, def);
        id
    }

    pub fn reserve_type_param(&mut self) -> TypeVarId {
        self.reserve_var()
    }

    pub fn define_type_param(&mut self, id: TypeVarId, def: TypeVarDef) {
        self.define_var(id, def);
    }

    pub fn add_type_param(&mut self, def: TypeVarDef) -> TypeVarId {
        let id = self.reserve_var();
        self.define_var(id, def);
        id
    }

    pub fn set_fields(&mut self, id: ClassId, fields: Vec<FieldSig>) {
        let entry = self.entry(id).expect("class id was interned");
        let fields: Vec<Arc<FieldSig>> = fields.into_iter().map(Arc::new).collect();
        entry
            .fields
            .set(Arc::from(fields))
            .expect("fields populated exactly once");
    }

    pub fn set_methods(&mut self, id: ClassId, methods: Vec<MethodSig>) {
        let entry = self.entry(id).expect("class id was interned");
        let methods: Vec<Arc<MethodSig>> = methods.into_iter().map(Arc::new).collect();
        entry
            .methods
            .set(Arc::from(methods))
            .expect("methods populated exactly once");
    }

    pub fn set_constructors(&mut self, id: ClassId, constructors: Vec<MethodSig>) {
        let entry = self.entry(id).expect("class id was interned");
        let constructors: Vec<Arc<MethodSig>> = constructors.into_iter().map(Arc::new).collect();
        entry
            .constructors
            .set(Arc::from(constructors))
            .expect("constructors populated exactly once");
    }

    pub fn set_nested_classes(&mut self, id: ClassId, nested: Vec<ClassId>) {
        let entry = self.entry(id).expect("class id was interned");
        entry
            .nested
            .set(Arc::from(nested))
            .expect("nested classes populated exactly once");
    }
}

impl TypeEnv for TypeStore {
    fn class(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        self.entry(id)?.def.get().cloned()
    }

    fn type_param(&self, id: TypeVarId) -> Option<Arc<TypeVarDef>> {
        self.vars
            .read()
            .expect("var table poisoned")
            .get(id.index())?
            .get()
            .cloned()
    }

    fn fields(&self, id: ClassId) -> Result<Arc<[Arc<FieldSig>]>> {
        self.fields_of(id)
    }

    fn methods(&self, id: ClassId) -> Result<Arc<[Arc<MethodSig>]>> {
        self.methods_of(id, MethodKind::Method)
    }

    fn constructors(&self, id: ClassId) -> Result<Arc<[Arc<MethodSig>]>> {
        self.methods_of(id, MethodKind::Constructor)
    }

    fn nested_classes(&self, id: ClassId) -> Result<Arc<[ClassId]>> {
        self.nested_of(id)
    }

    fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.names
            .read()
            .expect("name table poisoned")
            .get(name)
            .copied()
    }

    fn well_known(&self) -> WellKnownTypes {
        *self
            .well_known
            .get()
            .expect("well-known types are installed at construction")
    }

    fn reserve_var(&self) -> TypeVarId {
        let mut vars = self.vars.write().expect("var table poisoned");
        let id = TypeVarId(vars.len() as u32);
        vars.push(Arc::new(OnceLock::new()));
        id
    }

    fn define_var(&self, id: TypeVarId, def: TypeVarDef) {
        let cell = self
            .vars
            .read()
            .expect("var table poisoned")
            .get(id.index())
            .cloned()
            .expect("type variable was reserved");
        cell.set(Arc::new(def))
            .expect("type variable defined exactly once");
    }
}

fn base_kind(base: mira_descriptors::BaseType) -> PrimitiveKind {
    use mira_descriptors::BaseType;
    match base {
        BaseType::Boolean => PrimitiveKind::Boolean,
        BaseType::Byte => PrimitiveKind::Byte,
        BaseType::Char => PrimitiveKind::Char,
        BaseType::Short => PrimitiveKind::Short,
        BaseType::Int => PrimitiveKind::Int,
        BaseType::Long => PrimitiveKind::Long,
        BaseType::Float => PrimitiveKind::Float,
        BaseType::Double => PrimitiveKind::Double,
    }
}

fn builtin_runtime() -> &'static StubSet {
    static RUNTIME: OnceLock<StubSet> = OnceLock::new();
    RUNTIME.get_or_init(runtime::minimal_runtime_stubs)
}

/// Define a reserved id as a capture variable; reservation happens first so
/// the bounds may reference the id itself.
pub(crate) fn define_capture(
    env: &dyn TypeEnv,
    id: TypeVarId,
    upper_bound: Type,
    lower_bound: Option<Type>,
    wildcard: WildcardBound,
) {
    env.define_var(
        id,
        TypeVarDef {
            name: format!("CAP#{}", id.0),
            position: 0,
            declared_by: VarOwner::Capture,
            upper_bound,
            lower_bound,
            captured_from: Some(wildcard),
        },
    );
}
