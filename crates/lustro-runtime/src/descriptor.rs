//! Member descriptors
//!
//! Resolved handles identifying one member on one declaring type.
//! Descriptors are immutable snapshots produced by registry queries; the
//! reflective layer passes them back to the raw access primitives.

use crate::registry::TypeId;

/// Member and type visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Ordinary, unrestricted access
    Public,
    /// Access requires an escalated capability
    Private,
}

impl Visibility {
    /// Whether this is public visibility
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }

    /// Whether this is private visibility
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }
}

/// A resolved handle to one field on one declaring type
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name
    pub name: String,
    /// The type that declares this field
    pub declared_in: TypeId,
    /// Declared value type
    pub value_type: TypeId,
    /// Visibility tag
    pub visibility: Visibility,
    /// Whether the field is static (class-level storage)
    pub is_static: bool,
    /// Storage slot: instance slot for instance fields, static slot
    /// within the declaring type otherwise
    pub slot: usize,
}

/// A resolved handle to one method on one declaring type
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// The type that declares this method
    pub declared_in: TypeId,
    /// Declared parameter types, in order
    pub params: Vec<TypeId>,
    /// Declared return type (`None` for void)
    pub ret: Option<TypeId>,
    /// Visibility tag
    pub visibility: Visibility,
    /// Whether the method is static
    pub is_static: bool,
    /// Index into the declaring type's method table
    pub index: usize,
}

/// A resolved handle to one constructor
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorDescriptor {
    /// The type this constructor produces
    pub declared_in: TypeId,
    /// Declared parameter types, in order
    pub params: Vec<TypeId>,
    /// Visibility tag
    pub visibility: Visibility,
    /// Index into the declaring type's constructor table
    pub index: usize,
}
