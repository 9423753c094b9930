//! Lustro Runtime Substrate
//!
//! This crate provides the host-runtime half of the lustro workspace:
//! - Dynamic values and the heap object model
//! - The type registry (type descriptors, member metadata, inheritance)
//! - The capability model for privileged member access
//! - Raw field/method/constructor access primitives
//!
//! The reflective access layer in `lustro-core` consumes this crate through
//! a narrow interface: type queries, member descriptors, capability
//! escalation, and the raw access primitives. Nothing here performs
//! signature matching or visibility fallback; that is the core's job.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod builder;
pub mod builtin;
pub mod capability;
pub mod descriptor;
pub mod registry;
pub mod value;

pub use builder::{ConstructorSpec, FieldSpec, MethodSpec, TypeBuilder};
pub use capability::{AccessCapability, AccessGrant, AccessKind};
pub use descriptor::{
    ConstructorDescriptor, FieldDescriptor, MethodDescriptor, Visibility,
};
pub use registry::{ConstructorBody, MethodBody, TypeId, TypeRegistry};
pub use value::{Object, ObjectRef, Value};

/// Low-level runtime errors produced by the registry and raw access
/// primitives. The reflective layer wraps these into its own taxonomy;
/// they are never surfaced raw to mirror clients.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A type id that is not registered
    #[error("unknown type {0}")]
    UnknownType(TypeId),

    /// A field slot outside the object's storage
    #[error("field slot {0} out of bounds")]
    SlotOutOfBounds(usize),

    /// A value of the wrong shape for the requested operation
    #[error("type error: {0}")]
    TypeError(String),

    /// The capability does not cover the requested access
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// An instance operation received a null receiver
    #[error("null receiver")]
    NullReceiver,

    /// Wrong number of arguments for a method or constructor
    #[error("expected {expected} arguments, got {got}")]
    ArityMismatch {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        got: usize,
    },

    /// A method or constructor body raised a fault of its own
    #[error("method `{method}` raised a fault")]
    MethodFault {
        /// Name of the faulting member
        method: String,
        /// The fault raised by the body
        #[source]
        cause: Box<RuntimeError>,
    },

    /// A fault raised inside a native member body
    #[error("{0}")]
    Fault(String),
}
