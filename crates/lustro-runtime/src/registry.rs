//! Type registry
//!
//! The registry is the source of truth for type descriptors: names,
//! inheritance, member metadata, static storage, and the raw access
//! primitives that read, write, invoke, and construct through resolved
//! descriptors. Types are registered up front through [`TypeBuilder`];
//! after that the registry is shared behind an `Arc` and is read-only
//! except for static field values, which sit in per-slot locks.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::builder::TypeBuilder;
use crate::builtin;
use crate::capability::{AccessCapability, AccessKind};
use crate::descriptor::{
    ConstructorDescriptor, FieldDescriptor, MethodDescriptor, Visibility,
};
use crate::value::{Object, ObjectRef, Value};
use crate::RuntimeError;

/// Identifier for a type registered in a [`TypeRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub(crate) usize);

impl TypeId {
    /// Raw index into the registry
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// Native implementation of a method body.
///
/// Receives the registry, the receiver (`Value::Null` for static methods)
/// and the arguments in declared order. Void methods return `Value::Null`.
pub type MethodBody =
    Arc<dyn Fn(&TypeRegistry, Value, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

/// Native implementation of a constructor body.
///
/// Receives the registry, the type being constructed, and the arguments.
pub type ConstructorBody =
    Arc<dyn Fn(&TypeRegistry, TypeId, &[Value]) -> Result<Value, RuntimeError> + Send + Sync>;

/// Declared field record
pub(crate) struct FieldDef {
    pub(crate) name: String,
    pub(crate) value_type: TypeId,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) slot: usize,
    pub(crate) initial: Option<Value>,
}

/// Declared method record
pub(crate) struct MethodDef {
    pub(crate) name: String,
    pub(crate) params: Vec<TypeId>,
    pub(crate) ret: Option<TypeId>,
    pub(crate) visibility: Visibility,
    pub(crate) is_static: bool,
    pub(crate) body: MethodBody,
}

/// Declared constructor record
pub(crate) struct ConstructorDef {
    pub(crate) params: Vec<TypeId>,
    pub(crate) visibility: Visibility,
    pub(crate) body: ConstructorBody,
}

/// Full type record
pub(crate) struct TypeDef {
    pub(crate) id: TypeId,
    pub(crate) name: String,
    pub(crate) parent: Option<TypeId>,
    pub(crate) visibility: Visibility,
    /// Boxed partner for unboxed primitives (widening target)
    pub(crate) boxed: Option<TypeId>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) constructors: Vec<ConstructorDef>,
    /// Static field storage, indexed by static slot
    pub(crate) statics: Vec<RwLock<Value>>,
    /// Total instance slot count including inherited slots
    pub(crate) instance_total: usize,
}

/// Registry of types and the raw access primitives over them
pub struct TypeRegistry {
    types: Vec<TypeDef>,
    by_name: FxHashMap<String, TypeId>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.iter().map(|t| &t.name).collect::<Vec<_>>())
            .finish()
    }
}

impl TypeRegistry {
    /// Create a registry with the built-in primitive descriptors installed
    pub fn new() -> Self {
        let mut registry = Self {
            types: Vec::new(),
            by_name: FxHashMap::default(),
        };
        builtin::install(&mut registry);
        registry
    }

    /// Start defining a new type
    pub fn define(&mut self, name: &str) -> TypeBuilder<'_> {
        TypeBuilder::new(self, name)
    }

    pub(crate) fn register_def(&mut self, mut def: TypeDef) -> TypeId {
        let id = TypeId(self.types.len());
        def.id = id;
        self.by_name.insert(def.name.clone(), id);
        self.types.push(def);
        id
    }

    fn def(&self, ty: TypeId) -> Result<&TypeDef, RuntimeError> {
        self.types.get(ty.0).ok_or(RuntimeError::UnknownType(ty))
    }

    // ===== Type queries =====

    /// Look up a type by name
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Human-readable name for a type id
    pub fn type_name(&self, ty: TypeId) -> String {
        match self.types.get(ty.0) {
            Some(def) => def.name.clone(),
            None => ty.to_string(),
        }
    }

    /// Direct ancestor of a type, if any
    pub fn parent_of(&self, ty: TypeId) -> Option<TypeId> {
        self.types.get(ty.0).and_then(|def| def.parent)
    }

    /// Type-level visibility
    pub fn visibility_of(&self, ty: TypeId) -> Visibility {
        self.types
            .get(ty.0)
            .map(|def| def.visibility)
            .unwrap_or(Visibility::Public)
    }

    /// Total instance slot count, including inherited slots
    pub(crate) fn instance_total(&self, ty: TypeId) -> usize {
        self.types.get(ty.0).map(|def| def.instance_total).unwrap_or(0)
    }

    /// Widen an unboxed primitive to its boxed partner; identity for
    /// everything else
    pub fn widen(&self, ty: TypeId) -> TypeId {
        self.types
            .get(ty.0)
            .and_then(|def| def.boxed)
            .unwrap_or(ty)
    }

    /// Whether `source` is `target` itself or one of its descendants
    pub fn is_assignable_from(&self, target: TypeId, source: TypeId) -> bool {
        let mut current = Some(source);
        while let Some(ty) = current {
            if ty == target {
                return true;
            }
            current = self.parent_of(ty);
        }
        false
    }

    /// Runtime type of a value. `None` for null: a null carries no type.
    pub fn type_of(&self, value: &Value) -> Option<TypeId> {
        match value {
            Value::Null => None,
            Value::Bool(_) => Some(builtin::BOOL_OBJ),
            Value::Int(_) => Some(builtin::INT_OBJ),
            Value::Float(_) => Some(builtin::FLOAT_OBJ),
            Value::Str(_) => Some(builtin::STR),
            Value::Object(obj) => Some(obj.type_id()),
        }
    }

    /// A member is effectively private when either the member itself or
    /// its declaring type is non-public
    pub fn effective_visibility(&self, member: Visibility, declaring: TypeId) -> Visibility {
        if member.is_private() || self.visibility_of(declaring).is_private() {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    // ===== Member enumeration =====

    /// Fields declared directly on a type (no inherited ones), unfiltered
    /// by visibility, split by staticness
    pub fn declared_fields(&self, ty: TypeId, statics: bool) -> Vec<FieldDescriptor> {
        let Ok(def) = self.def(ty) else {
            return Vec::new();
        };
        def.fields
            .iter()
            .filter(|f| f.is_static == statics)
            .map(|f| FieldDescriptor {
                name: f.name.clone(),
                declared_in: ty,
                value_type: f.value_type,
                visibility: f.visibility,
                is_static: f.is_static,
                slot: f.slot,
            })
            .collect()
    }

    /// Methods declared directly on a type, unfiltered by visibility
    pub fn declared_methods(&self, ty: TypeId) -> Vec<MethodDescriptor> {
        let Ok(def) = self.def(ty) else {
            return Vec::new();
        };
        def.methods
            .iter()
            .enumerate()
            .map(|(index, m)| MethodDescriptor {
                name: m.name.clone(),
                declared_in: ty,
                params: m.params.clone(),
                ret: m.ret,
                visibility: m.visibility,
                is_static: m.is_static,
                index,
            })
            .collect()
    }

    /// Constructors declared on a type, unfiltered by visibility.
    /// Constructors are never inherited.
    pub fn declared_constructors(&self, ty: TypeId) -> Vec<ConstructorDescriptor> {
        let Ok(def) = self.def(ty) else {
            return Vec::new();
        };
        def.constructors
            .iter()
            .enumerate()
            .map(|(index, c)| ConstructorDescriptor {
                declared_in: ty,
                params: c.params.clone(),
                visibility: c.visibility,
                index,
            })
            .collect()
    }

    /// The ancestor-inclusive public method set, most-derived first.
    /// Members of non-public types are excluded.
    pub fn public_methods(&self, ty: TypeId) -> Vec<MethodDescriptor> {
        let mut methods = Vec::new();
        let mut current = Some(ty);
        while let Some(level) = current {
            if self.visibility_of(level).is_public() {
                methods.extend(
                    self.declared_methods(level)
                        .into_iter()
                        .filter(|m| m.visibility.is_public()),
                );
            }
            current = self.parent_of(level);
        }
        methods
    }

    // ===== Instantiation and direct field access =====

    /// Allocate a null-initialized instance of a type, applying declared
    /// field initial values down the inheritance chain
    pub fn instantiate(&self, ty: TypeId) -> Result<ObjectRef, RuntimeError> {
        let def = self.def(ty)?;
        let obj = ObjectRef::new(Object::new(ty, def.instance_total));
        let mut current = Some(ty);
        while let Some(level) = current {
            let level_def = self.def(level)?;
            for field in level_def.fields.iter().filter(|f| !f.is_static) {
                if let Some(initial) = &field.initial {
                    obj.set_slot(field.slot, initial.clone())?;
                }
            }
            current = level_def.parent;
        }
        Ok(obj)
    }

    fn find_instance_field(&self, start: TypeId, name: &str) -> Option<FieldDescriptor> {
        let mut current = Some(start);
        while let Some(level) = current {
            if let Some(field) = self
                .declared_fields(level, false)
                .into_iter()
                .find(|f| f.name == name)
            {
                return Some(field);
            }
            current = self.parent_of(level);
        }
        None
    }

    /// Direct field read for member bodies. Walks from the object's
    /// runtime type, ignores visibility, performs no capability check:
    /// this is the runtime's own storage primitive, not reflective access.
    pub fn object_get_field(&self, obj: &ObjectRef, name: &str) -> Result<Value, RuntimeError> {
        let field = self
            .find_instance_field(obj.type_id(), name)
            .ok_or_else(|| RuntimeError::TypeError(format!("no field `{}`", name)))?;
        obj.get_slot(field.slot)
            .ok_or(RuntimeError::SlotOutOfBounds(field.slot))
    }

    /// Direct field write for member bodies; counterpart of
    /// [`object_get_field`](Self::object_get_field)
    pub fn object_set_field(
        &self,
        obj: &ObjectRef,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.object_set_field_from(obj, obj.type_id(), name, value)
    }

    /// Direct field write starting the name lookup at an explicit type.
    /// Lets a descendant's constructor reach an ancestor slot shadowed by
    /// its own declaration.
    pub fn object_set_field_from(
        &self,
        obj: &ObjectRef,
        start: TypeId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let field = self
            .find_instance_field(start, name)
            .ok_or_else(|| RuntimeError::TypeError(format!("no field `{}`", name)))?;
        obj.set_slot(field.slot, value)
    }

    // ===== Raw access primitives =====

    fn check_access(
        &self,
        cap: &AccessCapability,
        kind: AccessKind,
        member: Visibility,
        declaring: TypeId,
        what: &str,
    ) -> Result<(), RuntimeError> {
        let visibility = self.effective_visibility(member, declaring);
        if cap.allows(kind, visibility, declaring) {
            Ok(())
        } else {
            Err(RuntimeError::AccessDenied(format!(
                "capability does not cover {:?} of `{}` on `{}`",
                kind,
                what,
                self.type_name(declaring)
            )))
        }
    }

    fn receiver<'a>(
        &self,
        target: &'a Value,
        declaring: TypeId,
    ) -> Result<&'a ObjectRef, RuntimeError> {
        if target.is_null() {
            return Err(RuntimeError::NullReceiver);
        }
        let obj = target.as_object().ok_or_else(|| {
            RuntimeError::TypeError(format!(
                "receiver is not an object of `{}`",
                self.type_name(declaring)
            ))
        })?;
        if !self.is_assignable_from(declaring, obj.type_id()) {
            return Err(RuntimeError::TypeError(format!(
                "receiver of type `{}` is not a `{}`",
                self.type_name(obj.type_id()),
                self.type_name(declaring)
            )));
        }
        Ok(obj)
    }

    fn check_value_assignable(&self, expected: TypeId, value: &Value) -> Result<(), RuntimeError> {
        let Some(actual) = self.type_of(value) else {
            // null is assignable to anything
            return Ok(());
        };
        if self.is_assignable_from(self.widen(expected), self.widen(actual)) {
            Ok(())
        } else {
            Err(RuntimeError::TypeError(format!(
                "value of type `{}` is not assignable to `{}`",
                self.type_name(actual),
                self.type_name(expected)
            )))
        }
    }

    /// Read an instance field through a resolved descriptor
    pub fn raw_get(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
        target: &Value,
    ) -> Result<Value, RuntimeError> {
        self.check_access(cap, AccessKind::Read, field.visibility, field.declared_in, &field.name)?;
        let obj = self.receiver(target, field.declared_in)?;
        obj.get_slot(field.slot)
            .ok_or(RuntimeError::SlotOutOfBounds(field.slot))
    }

    /// Write an instance field through a resolved descriptor
    pub fn raw_set(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
        target: &Value,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.check_access(cap, AccessKind::Write, field.visibility, field.declared_in, &field.name)?;
        let obj = self.receiver(target, field.declared_in)?;
        self.check_value_assignable(field.value_type, &value)?;
        obj.set_slot(field.slot, value)
    }

    /// Read a static field through a resolved descriptor
    pub fn raw_static_get(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
    ) -> Result<Value, RuntimeError> {
        self.check_access(cap, AccessKind::Read, field.visibility, field.declared_in, &field.name)?;
        let def = self.def(field.declared_in)?;
        let cell = def
            .statics
            .get(field.slot)
            .ok_or(RuntimeError::SlotOutOfBounds(field.slot))?;
        Ok(cell.read().clone())
    }

    /// Write a static field through a resolved descriptor
    pub fn raw_static_set(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
        value: Value,
    ) -> Result<(), RuntimeError> {
        self.check_access(cap, AccessKind::Write, field.visibility, field.declared_in, &field.name)?;
        let def = self.def(field.declared_in)?;
        self.check_value_assignable(field.value_type, &value)?;
        let cell = def
            .statics
            .get(field.slot)
            .ok_or(RuntimeError::SlotOutOfBounds(field.slot))?;
        *cell.write() = value;
        Ok(())
    }

    /// Invoke a method through a resolved descriptor. `target` is `None`
    /// for static methods. Faults raised by the body are wrapped in
    /// [`RuntimeError::MethodFault`] so callers can tell them apart from
    /// pre-call failures.
    pub fn raw_invoke(
        &self,
        method: &MethodDescriptor,
        cap: &AccessCapability,
        target: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if args.len() != method.params.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: method.params.len(),
                got: args.len(),
            });
        }
        self.check_access(
            cap,
            AccessKind::Invoke,
            method.visibility,
            method.declared_in,
            &method.name,
        )?;
        let recv = match target {
            Some(value) => {
                if method.is_static {
                    return Err(RuntimeError::TypeError(format!(
                        "static method `{}` invoked with a receiver",
                        method.name
                    )));
                }
                self.receiver(value, method.declared_in)?;
                value.clone()
            }
            None => {
                if !method.is_static {
                    return Err(RuntimeError::TypeError(format!(
                        "instance method `{}` requires a receiver",
                        method.name
                    )));
                }
                Value::Null
            }
        };
        let def = self.def(method.declared_in)?;
        let body = def
            .methods
            .get(method.index)
            .map(|m| Arc::clone(&m.body))
            .ok_or_else(|| {
                RuntimeError::TypeError(format!("stale method descriptor `{}`", method.name))
            })?;
        body(self, recv, args).map_err(|cause| RuntimeError::MethodFault {
            method: method.name.clone(),
            cause: Box::new(cause),
        })
    }

    /// Invoke a constructor through a resolved descriptor
    pub fn raw_construct(
        &self,
        ctor: &ConstructorDescriptor,
        cap: &AccessCapability,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        if args.len() != ctor.params.len() {
            return Err(RuntimeError::ArityMismatch {
                expected: ctor.params.len(),
                got: args.len(),
            });
        }
        let type_name = self.type_name(ctor.declared_in);
        self.check_access(
            cap,
            AccessKind::Construct,
            ctor.visibility,
            ctor.declared_in,
            &type_name,
        )?;
        let def = self.def(ctor.declared_in)?;
        let body = def
            .constructors
            .get(ctor.index)
            .map(|c| Arc::clone(&c.body))
            .ok_or_else(|| {
                RuntimeError::TypeError(format!("stale constructor descriptor on `{}`", type_name))
            })?;
        body(self, ctor.declared_in, args).map_err(|cause| RuntimeError::MethodFault {
            method: type_name,
            cause: Box::new(cause),
        })
    }
}
