//! Fluent registration of types
//!
//! Types are described with [`FieldSpec`], [`MethodSpec`] and
//! [`ConstructorSpec`] records and committed to the registry with
//! [`TypeBuilder::build`], which assigns storage slots: instance slots
//! continue the parent's layout, static slots are per declaring type.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::descriptor::Visibility;
use crate::registry::{
    ConstructorBody, ConstructorDef, FieldDef, MethodBody, MethodDef, TypeDef, TypeId,
    TypeRegistry,
};
use crate::value::Value;
use crate::RuntimeError;

/// Specification for a field to be declared on a type
pub struct FieldSpec {
    name: String,
    value_type: TypeId,
    visibility: Visibility,
    is_static: bool,
    initial: Option<Value>,
}

impl FieldSpec {
    /// A public instance field
    pub fn new(name: &str, value_type: TypeId) -> Self {
        Self {
            name: name.to_string(),
            value_type,
            visibility: Visibility::Public,
            is_static: false,
            initial: None,
        }
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as static (class-level storage)
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Set the initial value
    pub fn initial(mut self, value: Value) -> Self {
        self.initial = Some(value);
        self
    }
}

/// Specification for a method to be declared on a type
pub struct MethodSpec {
    name: String,
    params: Vec<TypeId>,
    ret: Option<TypeId>,
    visibility: Visibility,
    is_static: bool,
    body: MethodBody,
}

impl MethodSpec {
    /// A public instance method with no parameters and no return value
    pub fn new<F>(name: &str, body: F) -> Self
    where
        F: Fn(&TypeRegistry, Value, &[Value]) -> Result<Value, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.to_string(),
            params: Vec::new(),
            ret: None,
            visibility: Visibility::Public,
            is_static: false,
            body: Arc::new(body),
        }
    }

    /// Append one parameter type
    pub fn param(mut self, ty: TypeId) -> Self {
        self.params.push(ty);
        self
    }

    /// Replace the parameter list
    pub fn params(mut self, types: Vec<TypeId>) -> Self {
        self.params = types;
        self
    }

    /// Declare the return type (absent means void)
    pub fn returns(mut self, ty: TypeId) -> Self {
        self.ret = Some(ty);
        self
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Mark as static
    pub fn static_member(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// Specification for a constructor
pub struct ConstructorSpec {
    params: Vec<TypeId>,
    visibility: Visibility,
    body: ConstructorBody,
}

impl ConstructorSpec {
    /// A public constructor
    pub fn new<F>(params: Vec<TypeId>, body: F) -> Self
    where
        F: Fn(&TypeRegistry, TypeId, &[Value]) -> Result<Value, RuntimeError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            params,
            visibility: Visibility::Public,
            body: Arc::new(body),
        }
    }

    /// Mark as private
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }
}

/// Builder for registering one type
pub struct TypeBuilder<'r> {
    registry: &'r mut TypeRegistry,
    name: String,
    parent: Option<TypeId>,
    visibility: Visibility,
    boxed: Option<TypeId>,
    fields: Vec<FieldSpec>,
    methods: Vec<MethodSpec>,
    constructors: Vec<ConstructorSpec>,
}

impl<'r> TypeBuilder<'r> {
    pub(crate) fn new(registry: &'r mut TypeRegistry, name: &str) -> Self {
        Self {
            registry,
            name: name.to_string(),
            parent: None,
            visibility: Visibility::Public,
            boxed: None,
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Set the direct ancestor
    pub fn extends(mut self, parent: TypeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Mark the type itself as non-public
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    /// Link an unboxed primitive to its boxed partner (widening target)
    pub(crate) fn boxed_as(mut self, boxed: TypeId) -> Self {
        self.boxed = Some(boxed);
        self
    }

    /// Declare a field
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Declare a method
    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.push(spec);
        self
    }

    /// Declare a constructor
    pub fn constructor(mut self, spec: ConstructorSpec) -> Self {
        self.constructors.push(spec);
        self
    }

    /// Assign slots and commit the type to the registry
    pub fn build(self) -> TypeId {
        let base = self
            .parent
            .map(|p| self.registry.instance_total(p))
            .unwrap_or(0);

        let mut instance_slot = base;
        let mut static_slot = 0usize;
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut statics = Vec::new();
        for spec in self.fields {
            let slot = if spec.is_static {
                statics.push(RwLock::new(spec.initial.clone().unwrap_or(Value::Null)));
                let slot = static_slot;
                static_slot += 1;
                slot
            } else {
                let slot = instance_slot;
                instance_slot += 1;
                slot
            };
            fields.push(FieldDef {
                name: spec.name,
                value_type: spec.value_type,
                visibility: spec.visibility,
                is_static: spec.is_static,
                slot,
                initial: if spec.is_static { None } else { spec.initial },
            });
        }

        let methods = self
            .methods
            .into_iter()
            .map(|spec| MethodDef {
                name: spec.name,
                params: spec.params,
                ret: spec.ret,
                visibility: spec.visibility,
                is_static: spec.is_static,
                body: spec.body,
            })
            .collect();

        let constructors = self
            .constructors
            .into_iter()
            .map(|spec| ConstructorDef {
                params: spec.params,
                visibility: spec.visibility,
                body: spec.body,
            })
            .collect();

        self.registry.register_def(TypeDef {
            id: TypeId(0), // assigned by register_def
            name: self.name,
            parent: self.parent,
            visibility: self.visibility,
            boxed: self.boxed,
            fields,
            methods,
            constructors,
            statics,
            instance_total: instance_slot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn test_slot_layout_continues_parent() {
        let mut registry = TypeRegistry::new();
        let base = registry
            .define("Base")
            .field(FieldSpec::new("a", builtin::INT_OBJ))
            .field(FieldSpec::new("b", builtin::INT_OBJ))
            .build();
        let derived = registry
            .define("Derived")
            .extends(base)
            .field(FieldSpec::new("c", builtin::INT_OBJ))
            .build();

        let base_fields = registry.declared_fields(base, false);
        let derived_fields = registry.declared_fields(derived, false);
        assert_eq!(base_fields[0].slot, 0);
        assert_eq!(base_fields[1].slot, 1);
        assert_eq!(derived_fields[0].slot, 2);

        let obj = registry.instantiate(derived).unwrap();
        assert_eq!(obj.field_count(), 3);
    }

    #[test]
    fn test_static_slots_are_per_type() {
        let mut registry = TypeRegistry::new();
        let ty = registry
            .define("Counters")
            .field(FieldSpec::new("a", builtin::INT_OBJ).static_member().initial(Value::Int(1)))
            .field(FieldSpec::new("x", builtin::INT_OBJ))
            .field(FieldSpec::new("b", builtin::INT_OBJ).static_member().initial(Value::Int(2)))
            .build();

        let statics = registry.declared_fields(ty, true);
        assert_eq!(statics.len(), 2);
        assert_eq!(statics[0].slot, 0);
        assert_eq!(statics[1].slot, 1);

        let instance = registry.declared_fields(ty, false);
        assert_eq!(instance.len(), 1);
        assert_eq!(instance[0].slot, 0);
    }

    #[test]
    fn test_instance_initial_applied_on_instantiate() {
        let mut registry = TypeRegistry::new();
        let ty = registry
            .define("Defaulted")
            .field(FieldSpec::new("n", builtin::INT_OBJ).initial(Value::Int(41)))
            .build();

        let obj = registry.instantiate(ty).unwrap();
        assert_eq!(registry.object_get_field(&obj, "n").unwrap(), Value::Int(41));
    }

    #[test]
    fn test_lookup_by_name() {
        let mut registry = TypeRegistry::new();
        let ty = registry.define("Named").build();
        assert_eq!(registry.lookup("Named"), Some(ty));
        assert_eq!(registry.lookup("Missing"), None);
        assert_eq!(registry.type_name(ty), "Named");
    }
}
