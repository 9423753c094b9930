//! Dynamic values and the object model

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::registry::TypeId;
use crate::RuntimeError;

/// Global counter for generating unique object IDs
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Generate a new unique object ID
fn generate_object_id() -> u64 {
    NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Object instance (heap-allocated)
///
/// Field storage is a flat slot vector: inherited slots first, declared
/// slots after, so a descendant never disturbs ancestor layout.
#[derive(Debug)]
pub struct Object {
    /// Unique object ID (assigned on creation, used for identity equality)
    object_id: u64,
    /// Type ID (index into the type registry)
    type_id: TypeId,
    /// Field values, indexed by slot
    fields: Vec<Value>,
}

impl Object {
    /// Create a new object with null-initialized fields
    pub fn new(type_id: TypeId, field_count: usize) -> Self {
        Self {
            object_id: generate_object_id(),
            type_id,
            fields: vec![Value::Null; field_count],
        }
    }

    /// The type this object was instantiated from
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Unique identity of this object
    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// Get a field value by slot
    pub fn get_slot(&self, slot: usize) -> Option<Value> {
        self.fields.get(slot).cloned()
    }

    /// Set a field value by slot
    pub fn set_slot(&mut self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        match self.fields.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(RuntimeError::SlotOutOfBounds(slot)),
        }
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

/// Shared handle to a heap object
///
/// Cloning the handle shares the underlying storage; mutation through any
/// clone is visible to all of them. Identity equality follows the object
/// ID, not the field contents.
#[derive(Debug, Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Wrap an object into a shared handle
    pub fn new(object: Object) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// The type this object was instantiated from
    pub fn type_id(&self) -> TypeId {
        self.0.read().type_id()
    }

    /// Unique identity of the underlying object
    pub fn object_id(&self) -> u64 {
        self.0.read().object_id()
    }

    /// Read a field slot
    pub fn get_slot(&self, slot: usize) -> Option<Value> {
        self.0.read().get_slot(slot)
    }

    /// Write a field slot
    pub fn set_slot(&self, slot: usize, value: Value) -> Result<(), RuntimeError> {
        self.0.write().set_slot(slot, value)
    }

    /// Number of field slots
    pub fn field_count(&self) -> usize {
        self.0.read().field_count()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.object_id() == other.object_id()
    }
}

impl Eq for ObjectRef {}

/// A dynamic runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The null value; carries no runtime type
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// String
    Str(String),
    /// Heap object (shared handle)
    Object(ObjectRef),
}

impl Value {
    /// Whether this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the object handle, if this is an object value
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Integer payload, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean payload, if any
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Float payload, if any
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String payload, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "#<object {}>", obj.object_id()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_slots() {
        let mut obj = Object::new(TypeId(7), 2);
        assert_eq!(obj.field_count(), 2);
        assert_eq!(obj.get_slot(0), Some(Value::Null));

        obj.set_slot(0, Value::Int(42)).unwrap();
        obj.set_slot(1, Value::Str("x".to_string())).unwrap();
        assert_eq!(obj.get_slot(0), Some(Value::Int(42)));
        assert_eq!(obj.get_slot(1), Some(Value::Str("x".to_string())));

        assert!(matches!(
            obj.set_slot(2, Value::Null),
            Err(RuntimeError::SlotOutOfBounds(2))
        ));
        assert_eq!(obj.get_slot(2), None);
    }

    #[test]
    fn test_object_ref_shares_storage() {
        let obj = ObjectRef::new(Object::new(TypeId(1), 1));
        let alias = obj.clone();

        alias.set_slot(0, Value::Bool(true)).unwrap();
        assert_eq!(obj.get_slot(0), Some(Value::Bool(true)));
    }

    #[test]
    fn test_object_identity_equality() {
        let a = ObjectRef::new(Object::new(TypeId(1), 0));
        let b = ObjectRef::new(Object::new(TypeId(1), 0));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Str("hi".to_string()).as_str(), Some("hi"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).as_str(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Int(5).to_string(), "5");
        assert_eq!(Value::Str("abc".to_string()).to_string(), "abc");
    }
}
