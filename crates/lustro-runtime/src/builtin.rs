//! Built-in type descriptors
//!
//! Every fresh registry starts with the primitive descriptors installed
//! at fixed ids. Unboxed primitives (`int`, `float`, `bool`) exist so
//! that method signatures can be declared against them; runtime values
//! always report the boxed partner from `type_of`, which is what makes
//! exact and widened signature matching observably different.

use crate::registry::{TypeId, TypeRegistry};

/// Unboxed integer primitive
pub const INT: TypeId = TypeId(0);
/// Unboxed float primitive
pub const FLOAT: TypeId = TypeId(1);
/// Unboxed boolean primitive
pub const BOOL: TypeId = TypeId(2);
/// Boxed integer
pub const INT_OBJ: TypeId = TypeId(3);
/// Boxed float
pub const FLOAT_OBJ: TypeId = TypeId(4);
/// Boxed boolean
pub const BOOL_OBJ: TypeId = TypeId(5);
/// String type (no unboxed form)
pub const STR: TypeId = TypeId(6);

/// Install the built-in descriptors into a fresh registry
pub(crate) fn install(registry: &mut TypeRegistry) {
    let int = registry.define("int").boxed_as(INT_OBJ).build();
    let float = registry.define("float").boxed_as(FLOAT_OBJ).build();
    let bool_ = registry.define("bool").boxed_as(BOOL_OBJ).build();
    let int_obj = registry.define("Int").build();
    let float_obj = registry.define("Float").build();
    let bool_obj = registry.define("Bool").build();
    let str_ = registry.define("Str").build();

    debug_assert_eq!(int, INT);
    debug_assert_eq!(float, FLOAT);
    debug_assert_eq!(bool_, BOOL);
    debug_assert_eq!(int_obj, INT_OBJ);
    debug_assert_eq!(float_obj, FLOAT_OBJ);
    debug_assert_eq!(bool_obj, BOOL_OBJ);
    debug_assert_eq!(str_, STR);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_installed_at_fixed_ids() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.lookup("int"), Some(INT));
        assert_eq!(registry.lookup("Int"), Some(INT_OBJ));
        assert_eq!(registry.lookup("Str"), Some(STR));
        assert_eq!(registry.type_name(INT_OBJ), "Int");
    }
}
