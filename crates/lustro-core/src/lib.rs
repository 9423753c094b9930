//! Lustro reflective access layer
//!
//! Uniform, capability-checked access to the members of runtime values
//! and types: fields, methods, and constructors, public or private,
//! resolved by name and argument types with graceful signature matching.
//!
//! Three pieces:
//! - [`Resolver`]: turns a name plus type hints into a member descriptor,
//!   trying exact signatures before widened ones and public members before
//!   the full declared hierarchy
//! - [`AccessorBuilder`]: binds a resolved descriptor and a capability
//!   into a reusable accessor, paying for escalation once
//! - [`Mirror`]: the fluent facade wrapping a value or type, resolving
//!   and escalating per operation
//!
//! ```
//! use std::sync::Arc;
//! use lustro_core::Mirror;
//! use lustro_runtime::{builtin, FieldSpec, TypeRegistry, Value};
//!
//! let mut registry = TypeRegistry::new();
//! let point = registry
//!     .define("Point")
//!     .field(FieldSpec::new("x", builtin::INT_OBJ).private().initial(Value::Int(0)))
//!     .build();
//! let registry = Arc::new(registry);
//!
//! let obj = Value::Object(registry.instantiate(point).unwrap());
//! let mirror = Mirror::over(registry, obj).unwrap();
//! mirror.set("x", Value::Int(3)).unwrap();
//! assert_eq!(mirror.get("x").unwrap(), Value::Int(3));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod accessor;
pub mod error;
pub mod mirror;
pub mod resolve;

pub use accessor::{
    AccessorBuilder, BoundGetter, BoundInvoker, BoundSetter, StaticGetter, StaticInvoker,
    StaticSetter,
};
pub use error::AccessError;
pub use mirror::Mirror;
pub use resolve::{Resolver, TypeHint};
