//! The mirror facade
//!
//! A [`Mirror`] wraps either a live value or a type and exposes the whole
//! access surface behind one fluent API: field reads and writes, method
//! invocation, construction, view redirection onto an ancestor type, and
//! factories for reusable bound accessors. Every operation resolves on
//! demand, escalates the mirror's capability when the member requires it,
//! and normalizes failures to [`AccessError`].

use std::fmt;
use std::sync::Arc;

use lustro_runtime::{
    AccessCapability, AccessKind, FieldDescriptor, MethodDescriptor, TypeId, TypeRegistry, Value,
};

use crate::accessor::{
    AccessorBuilder, BoundGetter, BoundInvoker, BoundSetter, StaticGetter, StaticInvoker,
    StaticSetter,
};
use crate::error::AccessError;
use crate::resolve::{Resolver, TypeHint};

const NULL: Value = Value::Null;

/// What a mirror reflects
#[derive(Debug, Clone)]
enum Target {
    /// A live value; never null
    Instance(Value),
    /// A type, for static members and construction
    Static(TypeId),
}

/// A reflective handle over a value or a type
#[derive(Clone)]
pub struct Mirror {
    registry: Arc<TypeRegistry>,
    target: Target,
    /// The target's own runtime type
    actual: TypeId,
    /// When set, resolution starts here instead of the target's own type
    view: Option<TypeId>,
    capability: AccessCapability,
}

impl Mirror {
    /// Mirror a live value. Null cannot be mirrored: it has no type to
    /// resolve members against.
    pub fn over(registry: Arc<TypeRegistry>, value: Value) -> Result<Mirror, AccessError> {
        let actual = registry
            .type_of(&value)
            .ok_or_else(|| AccessError::TypeMismatch {
                detail: "cannot mirror a null value".to_string(),
                cause: None,
            })?;
        Ok(Mirror {
            registry,
            target: Target::Instance(value),
            actual,
            view: None,
            capability: AccessCapability::unrestricted(),
        })
    }

    /// Mirror a type, for static member access and construction
    pub fn of_type(registry: Arc<TypeRegistry>, ty: TypeId) -> Mirror {
        Mirror {
            registry,
            target: Target::Static(ty),
            actual: ty,
            view: None,
            capability: AccessCapability::unrestricted(),
        }
    }

    /// Replace the capability this mirror escalates from. Mirrors and
    /// values derived from this one inherit the replacement.
    pub fn with_capability(mut self, capability: AccessCapability) -> Mirror {
        self.capability = capability;
        self
    }

    /// Redirect resolution to an ancestor type, reaching members the
    /// reflected type shadows. The view must be the actual type itself or
    /// one of its ancestors.
    pub fn as_type(&self, view: TypeId) -> Result<Mirror, AccessError> {
        let actual = self.actual;
        if !self.registry.is_assignable_from(view, actual) {
            return Err(AccessError::TypeMismatch {
                detail: format!(
                    "`{}` is not an ancestor of `{}`",
                    self.registry.type_name(view),
                    self.registry.type_name(actual)
                ),
                cause: None,
            });
        }
        let mut redirected = self.clone();
        redirected.view = Some(view);
        Ok(redirected)
    }

    /// The reflected value. Type mirrors have no value and report null.
    pub fn value(&self) -> &Value {
        match &self.target {
            Target::Instance(value) => value,
            Target::Static(_) => &NULL,
        }
    }

    /// The type resolution starts from: the view if one is set, the
    /// target's own type otherwise
    pub fn reflected_type(&self) -> TypeId {
        self.view.unwrap_or(self.actual)
    }

    /// The shared registry this mirror resolves against
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn is_static(&self) -> bool {
        matches!(self.target, Target::Static(_))
    }

    fn builder(&self) -> AccessorBuilder {
        AccessorBuilder::new(Arc::clone(&self.registry))
    }

    fn wrap(&self, value: Value, member: &str) -> Result<Mirror, AccessError> {
        let actual = self
            .registry
            .type_of(&value)
            .ok_or_else(|| AccessError::NullResult {
                member: member.to_string(),
            })?;
        Ok(Mirror {
            registry: Arc::clone(&self.registry),
            target: Target::Instance(value),
            actual,
            view: None,
            capability: self.capability.clone(),
        })
    }

    // ===== Field access =====

    fn resolve_field_here(
        &self,
        name: &str,
        value_type: Option<TypeId>,
    ) -> Result<FieldDescriptor, AccessError> {
        Resolver::new(&self.registry).resolve_field(
            self.reflected_type(),
            name,
            value_type,
            self.is_static(),
        )
    }

    fn read_field(&self, field: &FieldDescriptor) -> Result<Value, AccessError> {
        let cap = self.builder().escalated(
            &self.capability,
            AccessKind::Read,
            field.visibility,
            field.declared_in,
        )?;
        let result = match &self.target {
            Target::Instance(value) => self.registry.raw_get(field, &cap, value),
            Target::Static(_) => self.registry.raw_static_get(field, &cap),
        };
        result.map_err(|e| AccessError::from_runtime(&field.name, e))
    }

    /// Read a field by name
    pub fn get(&self, name: &str) -> Result<Value, AccessError> {
        let field = self.resolve_field_here(name, None)?;
        self.read_field(&field)
    }

    /// Write a field by name, returning the mirror for chaining. The
    /// field is located by name alone; a null value carries no type to
    /// narrow the lookup with, and a typed one is checked against the
    /// declared field type on write.
    pub fn set(&self, name: &str, value: Value) -> Result<&Mirror, AccessError> {
        let field = self.resolve_field_here(name, None)?;
        let cap = self.builder().escalated(
            &self.capability,
            AccessKind::Write,
            field.visibility,
            field.declared_in,
        )?;
        let result = match &self.target {
            Target::Instance(target) => self.registry.raw_set(&field, &cap, target, value),
            Target::Static(_) => self.registry.raw_static_set(&field, &cap, value),
        };
        result.map_err(|e| AccessError::from_runtime(&field.name, e))?;
        Ok(self)
    }

    /// Read a field and mirror its value for further drilling. A null
    /// field value cannot be mirrored and reports [`AccessError::NullResult`].
    pub fn field(&self, name: &str) -> Result<Mirror, AccessError> {
        let field = self.resolve_field_here(name, None)?;
        let value = self.read_field(&field)?;
        self.wrap(value, name)
    }

    // ===== Invocation =====

    fn resolve_method_here(
        &self,
        name: &str,
        args: &[Value],
    ) -> Result<MethodDescriptor, AccessError> {
        let hints = TypeHint::of_values(&self.registry, args);
        Resolver::new(&self.registry).resolve_method(
            self.reflected_type(),
            name,
            &hints,
            self.is_static(),
        )
    }

    fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, AccessError> {
        let method = self.resolve_method_here(name, args)?;
        let cap = self.builder().escalated(
            &self.capability,
            AccessKind::Invoke,
            method.visibility,
            method.declared_in,
        )?;
        let target = match &self.target {
            Target::Instance(value) => Some(value),
            Target::Static(_) => None,
        };
        self.registry
            .raw_invoke(&method, &cap, target, args)
            .map_err(|e| AccessError::from_runtime(&method.name, e))
    }

    /// Invoke a method for its side effect, returning the mirror for
    /// chaining. Any result, null included, is discarded.
    pub fn run(&self, name: &str, args: &[Value]) -> Result<&Mirror, AccessError> {
        self.invoke(name, args)?;
        Ok(self)
    }

    /// Invoke a method and mirror its result. A null result reports
    /// [`AccessError::NullResult`].
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Mirror, AccessError> {
        let value = self.invoke(name, args)?;
        self.wrap(value, name)
    }

    // ===== Construction =====

    /// Construct a new instance of the reflected type and mirror it.
    /// Constructor lookup is exact on the argument types; there is no
    /// similarity fallback for construction.
    pub fn create(&self, args: &[Value]) -> Result<Mirror, AccessError> {
        let ty = self.reflected_type();
        let hints = TypeHint::of_values(&self.registry, args);
        let ctor = Resolver::new(&self.registry).resolve_constructor(ty, &hints)?;
        let cap = self.builder().escalated(
            &self.capability,
            AccessKind::Construct,
            ctor.visibility,
            ctor.declared_in,
        )?;
        let type_name = self.registry.type_name(ty);
        let value = self
            .registry
            .raw_construct(&ctor, &cap, args)
            .map_err(|e| AccessError::from_runtime(&type_name, e))?;
        self.wrap(value, &type_name)
    }

    // ===== Accessor factories =====

    /// Bind a reusable getter for an instance field of the reflected type
    pub fn getter(&self, name: &str) -> Result<BoundGetter, AccessError> {
        let field =
            Resolver::new(&self.registry).resolve_field(self.reflected_type(), name, None, false)?;
        self.builder().bind_getter(&field, &self.capability)
    }

    /// Bind a reusable setter for an instance field of the reflected type
    pub fn setter(&self, name: &str) -> Result<BoundSetter, AccessError> {
        let field =
            Resolver::new(&self.registry).resolve_field(self.reflected_type(), name, None, false)?;
        self.builder().bind_setter(&field, &self.capability)
    }

    /// Bind a reusable getter for a static field of the reflected type
    pub fn static_getter(&self, name: &str) -> Result<StaticGetter, AccessError> {
        let field =
            Resolver::new(&self.registry).resolve_field(self.reflected_type(), name, None, true)?;
        self.builder().bind_static_getter(&field, &self.capability)
    }

    /// Bind a reusable setter for a static field of the reflected type
    pub fn static_setter(&self, name: &str) -> Result<StaticSetter, AccessError> {
        let field =
            Resolver::new(&self.registry).resolve_field(self.reflected_type(), name, None, true)?;
        self.builder().bind_static_setter(&field, &self.capability)
    }

    /// Bind a reusable invoker for an instance method. `hints` describe
    /// the argument types the invoker will be used with.
    pub fn invoker(&self, name: &str, hints: &[TypeHint]) -> Result<BoundInvoker, AccessError> {
        let method =
            Resolver::new(&self.registry).resolve_method(self.reflected_type(), name, hints, false)?;
        self.builder().bind_invoker(&method, &self.capability)
    }

    /// Bind a reusable invoker for a static method
    pub fn static_invoker(
        &self,
        name: &str,
        hints: &[TypeHint],
    ) -> Result<StaticInvoker, AccessError> {
        let method =
            Resolver::new(&self.registry).resolve_method(self.reflected_type(), name, hints, true)?;
        self.builder().bind_static_invoker(&method, &self.capability)
    }
}

impl PartialEq for Mirror {
    fn eq(&self, other: &Mirror) -> bool {
        match (&self.target, &other.target) {
            (Target::Instance(a), Target::Instance(b)) => a == b,
            (Target::Static(a), Target::Static(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror")
            .field("target", &self.target)
            .field("view", &self.view)
            .finish()
    }
}

impl fmt::Display for Mirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Target::Instance(value) => write!(f, "{}", value),
            Target::Static(ty) => write!(f, "{}", self.registry.type_name(*ty)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lustro_runtime::builtin;
    use lustro_runtime::{ConstructorSpec, FieldSpec, MethodSpec, RuntimeError};

    fn point_registry() -> (Arc<TypeRegistry>, TypeId) {
        let mut registry = TypeRegistry::new();
        let ty = registry
            .define("Point")
            .field(FieldSpec::new("x", builtin::INT_OBJ).private().initial(Value::Int(0)))
            .field(FieldSpec::new("y", builtin::INT_OBJ).private().initial(Value::Int(0)))
            .method(MethodSpec::new("sum", |rt, recv, _| {
                let obj = recv.as_object().ok_or(RuntimeError::NullReceiver)?;
                match (
                    rt.object_get_field(obj, "x")?,
                    rt.object_get_field(obj, "y")?,
                ) {
                    (Value::Int(x), Value::Int(y)) => Ok(Value::Int(x + y)),
                    _ => Err(RuntimeError::TypeError("non-int coordinates".into())),
                }
            })
            .returns(builtin::INT_OBJ))
            .constructor(ConstructorSpec::new(
                vec![builtin::INT_OBJ, builtin::INT_OBJ],
                |rt, ty, args| {
                    let obj = rt.instantiate(ty)?;
                    rt.object_set_field(&obj, "x", args[0].clone())?;
                    rt.object_set_field(&obj, "y", args[1].clone())?;
                    Ok(Value::Object(obj))
                },
            ))
            .build();
        (Arc::new(registry), ty)
    }

    #[test]
    fn test_over_rejects_null() {
        let (registry, _) = point_registry();
        assert!(matches!(
            Mirror::over(registry, Value::Null),
            Err(AccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_create_set_get_chain() {
        let (registry, ty) = point_registry();
        let point = Mirror::of_type(Arc::clone(&registry), ty)
            .create(&[Value::Int(1), Value::Int(2)])
            .unwrap();

        assert_eq!(point.get("x").unwrap(), Value::Int(1));
        point
            .set("x", Value::Int(10))
            .unwrap()
            .set("y", Value::Int(20))
            .unwrap();
        assert_eq!(point.call("sum", &[]).unwrap().value(), &Value::Int(30));
    }

    #[test]
    fn test_mirror_displays_like_its_value() {
        let (registry, ty) = point_registry();
        let m = Mirror::over(Arc::clone(&registry), Value::Str("hello".into())).unwrap();
        assert_eq!(m.to_string(), "hello");
        assert_eq!(Mirror::of_type(registry, ty).to_string(), "Point");
    }

    #[test]
    fn test_field_on_null_value_is_null_result() {
        let (registry, ty) = point_registry();
        let mut builder_registry = TypeRegistry::new();
        // separate registry with a nullable holder type
        let holder = builder_registry
            .define("Holder")
            .field(FieldSpec::new("inner", builtin::STR).private())
            .build();
        let registry2 = Arc::new(builder_registry);
        let obj = Value::Object(registry2.instantiate(holder).unwrap());
        let m = Mirror::over(Arc::clone(&registry2), obj).unwrap();
        assert!(matches!(
            m.field("inner"),
            Err(AccessError::NullResult { .. })
        ));

        // the plain getter tolerates the null
        let m2 = Mirror::of_type(registry, ty)
            .create(&[Value::Int(0), Value::Int(0)])
            .unwrap();
        assert_eq!(m2.get("x").unwrap(), Value::Int(0));
    }
}
