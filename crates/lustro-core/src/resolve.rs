//! Member resolution
//!
//! Finds the single best-matching member for a name and a set of type
//! hints. Method resolution runs an explicit ordered list of matcher
//! passes rather than nested branching, so the fallback order is
//! auditable and testable per stage:
//!
//! 1. exact signature, ancestor-inclusive public set
//! 2. exact signature, declared-only, walking ancestors most-derived first
//! 3. widened ("similar") signature, public set
//! 4. widened signature, declared-only, walking ancestors
//!
//! Within one searched set the first structural match wins; no ranking
//! among simultaneously similar candidates is attempted. Callers that
//! care about overload precision supply exact types.

use lustro_runtime::{
    ConstructorDescriptor, FieldDescriptor, MethodDescriptor, TypeId, TypeRegistry, Value,
};

use crate::error::AccessError;

/// A parameter or value type hint used during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeHint {
    /// A null argument: carries no runtime type, matches any parameter
    /// position in similarity passes and none in exact passes
    Null,
    /// A concrete type
    Of(TypeId),
}

impl TypeHint {
    /// Hint for one argument value
    pub fn of_value(registry: &TypeRegistry, value: &Value) -> TypeHint {
        match registry.type_of(value) {
            Some(ty) => TypeHint::Of(ty),
            None => TypeHint::Null,
        }
    }

    /// Hints for an argument list, in order
    pub fn of_values(registry: &TypeRegistry, values: &[Value]) -> Vec<TypeHint> {
        values
            .iter()
            .map(|v| TypeHint::of_value(registry, v))
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum MatchKind {
    Exact,
    Similar,
}

#[derive(Debug, Clone, Copy)]
enum SearchScope {
    PublicHierarchy,
    DeclaredPerLevel,
}

/// The fixed pass order; a matching strategy, not error recovery
const METHOD_PASSES: [(MatchKind, SearchScope); 4] = [
    (MatchKind::Exact, SearchScope::PublicHierarchy),
    (MatchKind::Exact, SearchScope::DeclaredPerLevel),
    (MatchKind::Similar, SearchScope::PublicHierarchy),
    (MatchKind::Similar, SearchScope::DeclaredPerLevel),
];

/// Finds member descriptors on a registry
pub struct Resolver<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Resolver<'r> {
    /// Create a resolver over a registry
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a method by name and argument hints, starting at `start`
    /// and escalating through the pass list. `statics` selects between
    /// instance and static members.
    pub fn resolve_method(
        &self,
        start: TypeId,
        name: &str,
        hints: &[TypeHint],
        statics: bool,
    ) -> Result<MethodDescriptor, AccessError> {
        for (kind, scope) in METHOD_PASSES {
            let candidate = match scope {
                SearchScope::PublicHierarchy => self
                    .registry
                    .public_methods(start)
                    .into_iter()
                    .find(|m| self.method_matches(kind, m, name, hints, statics)),
                SearchScope::DeclaredPerLevel => self.find_declared(start, |level| {
                    self.registry
                        .declared_methods(level)
                        .into_iter()
                        .find(|m| self.method_matches(kind, m, name, hints, statics))
                }),
            };
            if let Some(method) = candidate {
                return Ok(method);
            }
        }
        Err(AccessError::MemberNotFound {
            type_name: self.registry.type_name(start),
            member: name.to_string(),
        })
    }

    /// Resolve a field by name, walking declared sets most-derived first.
    /// No similarity or widening applies to fields; when a value type is
    /// hinted it must match the declared type exactly.
    pub fn resolve_field(
        &self,
        start: TypeId,
        name: &str,
        value_type: Option<TypeId>,
        statics: bool,
    ) -> Result<FieldDescriptor, AccessError> {
        self.find_declared(start, |level| {
            self.registry
                .declared_fields(level, statics)
                .into_iter()
                .find(|f| {
                    f.name == name && value_type.map(|ty| ty == f.value_type).unwrap_or(true)
                })
        })
        .ok_or_else(|| AccessError::MemberNotFound {
            type_name: self.registry.type_name(start),
            member: name.to_string(),
        })
    }

    /// Resolve a constructor by exact parameter types on exactly `ty`.
    /// Constructors are never inherited and get no similarity pass.
    pub fn resolve_constructor(
        &self,
        ty: TypeId,
        hints: &[TypeHint],
    ) -> Result<ConstructorDescriptor, AccessError> {
        self.registry
            .declared_constructors(ty)
            .into_iter()
            .find(|c| self.signature_matches(MatchKind::Exact, &c.params, hints))
            .ok_or_else(|| AccessError::MemberNotFound {
                type_name: self.registry.type_name(ty),
                member: "constructor".to_string(),
            })
    }

    fn find_declared<T>(
        &self,
        start: TypeId,
        mut search_level: impl FnMut(TypeId) -> Option<T>,
    ) -> Option<T> {
        let mut current = Some(start);
        while let Some(level) = current {
            if let Some(found) = search_level(level) {
                return Some(found);
            }
            current = self.registry.parent_of(level);
        }
        None
    }

    fn method_matches(
        &self,
        kind: MatchKind,
        method: &MethodDescriptor,
        name: &str,
        hints: &[TypeHint],
        statics: bool,
    ) -> bool {
        method.is_static == statics
            && method.name == name
            && self.signature_matches(kind, &method.params, hints)
    }

    fn signature_matches(&self, kind: MatchKind, params: &[TypeId], hints: &[TypeHint]) -> bool {
        if params.len() != hints.len() {
            return false;
        }
        params.iter().zip(hints).all(|(param, hint)| match kind {
            MatchKind::Exact => matches!(hint, TypeHint::Of(ty) if ty == param),
            MatchKind::Similar => match hint {
                TypeHint::Null => true,
                TypeHint::Of(ty) => self
                    .registry
                    .is_assignable_from(self.registry.widen(*param), self.registry.widen(*ty)),
            },
        })
    }
}
