//! Bound accessors
//!
//! An accessor is resolved once and reused: the builder takes a member
//! descriptor and a capability, performs the escalation the member's
//! visibility requires, and returns a handle carrying the descriptor and
//! the escalated capability. Repeated gets, sets, and invocations through
//! the handle skip resolution and escalation entirely; only the raw
//! access check and the operation itself remain.

use std::sync::Arc;

use lustro_runtime::{
    AccessCapability, AccessKind, FieldDescriptor, MethodDescriptor, TypeId, TypeRegistry, Value,
    Visibility,
};

use crate::error::AccessError;

/// Builds bound accessors out of resolved descriptors
pub struct AccessorBuilder {
    registry: Arc<TypeRegistry>,
}

impl AccessorBuilder {
    /// Create a builder over a shared registry
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self { registry }
    }

    /// Escalate a capability when the member's effective visibility
    /// requires it; a public member passes the capability through as is.
    pub(crate) fn escalated(
        &self,
        cap: &AccessCapability,
        kind: AccessKind,
        visibility: Visibility,
        declaring: TypeId,
    ) -> Result<AccessCapability, AccessError> {
        if self
            .registry
            .effective_visibility(visibility, declaring)
            .is_private()
        {
            cap.escalate(declaring, kind)
                .map_err(|cause| AccessError::EscalationDenied {
                    context: self.registry.type_name(declaring),
                    cause,
                })
        } else {
            Ok(cap.clone())
        }
    }

    /// Bind a reusable getter for an instance field
    pub fn bind_getter(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
    ) -> Result<BoundGetter, AccessError> {
        self.require_instance(field)?;
        let capability = self.escalated(cap, AccessKind::Read, field.visibility, field.declared_in)?;
        Ok(BoundGetter {
            registry: Arc::clone(&self.registry),
            field: field.clone(),
            capability,
        })
    }

    /// Bind a reusable setter for an instance field
    pub fn bind_setter(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
    ) -> Result<BoundSetter, AccessError> {
        self.require_instance(field)?;
        let capability =
            self.escalated(cap, AccessKind::Write, field.visibility, field.declared_in)?;
        Ok(BoundSetter {
            registry: Arc::clone(&self.registry),
            field: field.clone(),
            capability,
        })
    }

    /// Bind a reusable getter for a static field
    pub fn bind_static_getter(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
    ) -> Result<StaticGetter, AccessError> {
        self.require_static(field)?;
        let capability = self.escalated(cap, AccessKind::Read, field.visibility, field.declared_in)?;
        Ok(StaticGetter {
            registry: Arc::clone(&self.registry),
            field: field.clone(),
            capability,
        })
    }

    /// Bind a reusable setter for a static field
    pub fn bind_static_setter(
        &self,
        field: &FieldDescriptor,
        cap: &AccessCapability,
    ) -> Result<StaticSetter, AccessError> {
        self.require_static(field)?;
        let capability =
            self.escalated(cap, AccessKind::Write, field.visibility, field.declared_in)?;
        Ok(StaticSetter {
            registry: Arc::clone(&self.registry),
            field: field.clone(),
            capability,
        })
    }

    /// Bind a reusable invoker for an instance method
    pub fn bind_invoker(
        &self,
        method: &MethodDescriptor,
        cap: &AccessCapability,
    ) -> Result<BoundInvoker, AccessError> {
        if method.is_static {
            return Err(AccessError::TypeMismatch {
                detail: format!("`{}` is static, use a static invoker", method.name),
                cause: None,
            });
        }
        let capability =
            self.escalated(cap, AccessKind::Invoke, method.visibility, method.declared_in)?;
        Ok(BoundInvoker {
            registry: Arc::clone(&self.registry),
            method: method.clone(),
            capability,
        })
    }

    /// Bind a reusable invoker for a static method
    pub fn bind_static_invoker(
        &self,
        method: &MethodDescriptor,
        cap: &AccessCapability,
    ) -> Result<StaticInvoker, AccessError> {
        if !method.is_static {
            return Err(AccessError::TypeMismatch {
                detail: format!("`{}` is an instance method, use a bound invoker", method.name),
                cause: None,
            });
        }
        let capability =
            self.escalated(cap, AccessKind::Invoke, method.visibility, method.declared_in)?;
        Ok(StaticInvoker {
            registry: Arc::clone(&self.registry),
            method: method.clone(),
            capability,
        })
    }

    fn require_instance(&self, field: &FieldDescriptor) -> Result<(), AccessError> {
        if field.is_static {
            Err(AccessError::TypeMismatch {
                detail: format!("`{}` is static, use a static accessor", field.name),
                cause: None,
            })
        } else {
            Ok(())
        }
    }

    fn require_static(&self, field: &FieldDescriptor) -> Result<(), AccessError> {
        if field.is_static {
            Ok(())
        } else {
            Err(AccessError::TypeMismatch {
                detail: format!("`{}` is an instance field, use a bound accessor", field.name),
                cause: None,
            })
        }
    }
}

/// Reads one instance field of any compatible receiver
#[derive(Clone, Debug)]
pub struct BoundGetter {
    registry: Arc<TypeRegistry>,
    field: FieldDescriptor,
    capability: AccessCapability,
}

impl BoundGetter {
    /// Read the field off a receiver
    pub fn get(&self, target: &Value) -> Result<Value, AccessError> {
        self.registry
            .raw_get(&self.field, &self.capability, target)
            .map_err(|e| AccessError::from_runtime(&self.field.name, e))
    }

    /// The descriptor this getter was bound to
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field
    }
}

/// Writes one instance field of any compatible receiver
#[derive(Clone)]
pub struct BoundSetter {
    registry: Arc<TypeRegistry>,
    field: FieldDescriptor,
    capability: AccessCapability,
}

impl BoundSetter {
    /// Write the field on a receiver
    pub fn set(&self, target: &Value, value: Value) -> Result<(), AccessError> {
        self.registry
            .raw_set(&self.field, &self.capability, target, value)
            .map_err(|e| AccessError::from_runtime(&self.field.name, e))
    }

    /// The descriptor this setter was bound to
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field
    }
}

/// Reads one static field
#[derive(Clone)]
pub struct StaticGetter {
    registry: Arc<TypeRegistry>,
    field: FieldDescriptor,
    capability: AccessCapability,
}

impl StaticGetter {
    /// Read the static field
    pub fn get(&self) -> Result<Value, AccessError> {
        self.registry
            .raw_static_get(&self.field, &self.capability)
            .map_err(|e| AccessError::from_runtime(&self.field.name, e))
    }

    /// The descriptor this getter was bound to
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field
    }
}

/// Writes one static field
#[derive(Clone)]
pub struct StaticSetter {
    registry: Arc<TypeRegistry>,
    field: FieldDescriptor,
    capability: AccessCapability,
}

impl StaticSetter {
    /// Write the static field
    pub fn set(&self, value: Value) -> Result<(), AccessError> {
        self.registry
            .raw_static_set(&self.field, &self.capability, value)
            .map_err(|e| AccessError::from_runtime(&self.field.name, e))
    }

    /// The descriptor this setter was bound to
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.field
    }
}

/// Invokes one instance method against any compatible receiver
#[derive(Clone)]
pub struct BoundInvoker {
    registry: Arc<TypeRegistry>,
    method: MethodDescriptor,
    capability: AccessCapability,
}

impl BoundInvoker {
    /// Invoke and return whatever the method produced, null included
    pub fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value, AccessError> {
        self.registry
            .raw_invoke(&self.method, &self.capability, Some(target), args)
            .map_err(|e| AccessError::from_runtime(&self.method.name, e))
    }

    /// Invoke expecting a usable value; a null result is an error
    pub fn call(&self, target: &Value, args: &[Value]) -> Result<Value, AccessError> {
        let value = self.invoke(target, args)?;
        if value.is_null() {
            Err(AccessError::NullResult {
                member: self.method.name.clone(),
            })
        } else {
            Ok(value)
        }
    }

    /// Invoke for the side effect, discarding any result
    pub fn run(&self, target: &Value, args: &[Value]) -> Result<(), AccessError> {
        self.invoke(target, args).map(|_| ())
    }

    /// The descriptor this invoker was bound to
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.method
    }
}

/// Invokes one static method
#[derive(Clone)]
pub struct StaticInvoker {
    registry: Arc<TypeRegistry>,
    method: MethodDescriptor,
    capability: AccessCapability,
}

impl StaticInvoker {
    /// Invoke and return whatever the method produced, null included
    pub fn invoke(&self, args: &[Value]) -> Result<Value, AccessError> {
        self.registry
            .raw_invoke(&self.method, &self.capability, None, args)
            .map_err(|e| AccessError::from_runtime(&self.method.name, e))
    }

    /// Invoke expecting a usable value; a null result is an error
    pub fn call(&self, args: &[Value]) -> Result<Value, AccessError> {
        let value = self.invoke(args)?;
        if value.is_null() {
            Err(AccessError::NullResult {
                member: self.method.name.clone(),
            })
        } else {
            Ok(value)
        }
    }

    /// Invoke for the side effect, discarding any result
    pub fn run(&self, args: &[Value]) -> Result<(), AccessError> {
        self.invoke(args).map(|_| ())
    }

    /// The descriptor this invoker was bound to
    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.method
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use lustro_runtime::builtin;
    use lustro_runtime::{FieldSpec, MethodSpec, RuntimeError};

    fn counter_registry() -> (Arc<TypeRegistry>, TypeId) {
        let mut registry = TypeRegistry::new();
        let ty = registry
            .define("Counter")
            .field(FieldSpec::new("count", builtin::INT_OBJ).private().initial(Value::Int(0)))
            .field(
                FieldSpec::new("total", builtin::INT_OBJ)
                    .private()
                    .static_member()
                    .initial(Value::Int(0)),
            )
            .method(MethodSpec::new("bump", |rt, recv, _| {
                let obj = recv.as_object().ok_or(RuntimeError::NullReceiver)?;
                let current = match rt.object_get_field(obj, "count")? {
                    Value::Int(n) => n,
                    other => {
                        return Err(RuntimeError::TypeError(format!(
                            "count holds {}",
                            other
                        )))
                    }
                };
                rt.object_set_field(obj, "count", Value::Int(current + 1))?;
                Ok(Value::Int(current + 1))
            })
            .returns(builtin::INT_OBJ))
            .method(MethodSpec::new("reset", |rt, recv, _| {
                let obj = recv.as_object().ok_or(RuntimeError::NullReceiver)?;
                rt.object_set_field(obj, "count", Value::Int(0))?;
                Ok(Value::Null)
            }))
            .build();
        (Arc::new(registry), ty)
    }

    #[test]
    fn test_bound_getter_setter_reuse() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let field = resolver.resolve_field(ty, "count", None, false).unwrap();
        let builder = AccessorBuilder::new(Arc::clone(&registry));
        let cap = AccessCapability::unrestricted();

        let getter = builder.bind_getter(&field, &cap).unwrap();
        let setter = builder.bind_setter(&field, &cap).unwrap();

        let a = Value::Object(registry.instantiate(ty).unwrap());
        let b = Value::Object(registry.instantiate(ty).unwrap());
        setter.set(&a, Value::Int(10)).unwrap();
        setter.set(&b, Value::Int(20)).unwrap();
        assert_eq!(getter.get(&a).unwrap(), Value::Int(10));
        assert_eq!(getter.get(&b).unwrap(), Value::Int(20));
    }

    #[test]
    fn test_binding_fails_without_private_grant() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let field = resolver.resolve_field(ty, "count", None, false).unwrap();
        let builder = AccessorBuilder::new(Arc::clone(&registry));

        let err = builder
            .bind_getter(&field, &AccessCapability::public_only())
            .unwrap_err();
        assert!(matches!(err, AccessError::EscalationDenied { .. }));
    }

    #[test]
    fn test_static_accessors_share_storage() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let field = resolver.resolve_field(ty, "total", None, true).unwrap();
        let builder = AccessorBuilder::new(Arc::clone(&registry));
        let cap = AccessCapability::unrestricted();

        let getter = builder.bind_static_getter(&field, &cap).unwrap();
        let setter = builder.bind_static_setter(&field, &cap).unwrap();
        setter.set(Value::Int(99)).unwrap();
        assert_eq!(getter.get().unwrap(), Value::Int(99));

        // a second getter bound later observes the same cell
        let other = builder.bind_static_getter(&field, &cap).unwrap();
        assert_eq!(other.get().unwrap(), Value::Int(99));
    }

    #[test]
    fn test_staticness_guards() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let instance = resolver.resolve_field(ty, "count", None, false).unwrap();
        let stat = resolver.resolve_field(ty, "total", None, true).unwrap();
        let builder = AccessorBuilder::new(Arc::clone(&registry));
        let cap = AccessCapability::unrestricted();

        assert!(matches!(
            builder.bind_static_getter(&instance, &cap),
            Err(AccessError::TypeMismatch { .. })
        ));
        assert!(matches!(
            builder.bind_setter(&stat, &cap),
            Err(AccessError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_invoker_call_rejects_null_result() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let builder = AccessorBuilder::new(Arc::clone(&registry));
        let cap = AccessCapability::unrestricted();
        let target = Value::Object(registry.instantiate(ty).unwrap());

        let reset = resolver.resolve_method(ty, "reset", &[], false).unwrap();
        let invoker = builder.bind_invoker(&reset, &cap).unwrap();
        // run tolerates the null, call does not
        invoker.run(&target, &[]).unwrap();
        assert!(matches!(
            invoker.call(&target, &[]),
            Err(AccessError::NullResult { .. })
        ));

        let bump = resolver.resolve_method(ty, "bump", &[], false).unwrap();
        let bump = builder.bind_invoker(&bump, &cap).unwrap();
        assert_eq!(bump.call(&target, &[]).unwrap(), Value::Int(1));
        assert_eq!(bump.call(&target, &[]).unwrap(), Value::Int(2));
    }

    /// A bound invoker skips resolution, so a wrong argument count is
    /// only caught at call time. The body never runs, so the error is a
    /// type mismatch rather than an invocation failure.
    #[test]
    fn test_invoker_arity_mismatch_is_type_mismatch() {
        let (registry, ty) = counter_registry();
        let resolver = Resolver::new(&registry);
        let builder = AccessorBuilder::new(Arc::clone(&registry));
        let cap = AccessCapability::unrestricted();
        let target = Value::Object(registry.instantiate(ty).unwrap());

        let bump = resolver.resolve_method(ty, "bump", &[], false).unwrap();
        let invoker = builder.bind_invoker(&bump, &cap).unwrap();
        match invoker.invoke(&target, &[Value::Int(1)]).unwrap_err() {
            AccessError::TypeMismatch { cause, .. } => {
                assert!(matches!(
                    cause,
                    Some(RuntimeError::ArityMismatch { expected: 0, got: 1 })
                ));
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
        // the counter was never touched
        assert_eq!(invoker.call(&target, &[]).unwrap(), Value::Int(1));
    }
}
