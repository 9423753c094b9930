//! Error taxonomy for reflective access
//!
//! Every failure mode is normalized to a single public [`AccessError`]
//! kind so calling code has one type to catch regardless of which
//! internal step failed. The original low-level cause is attached as a
//! source, never swallowed.

use lustro_runtime::RuntimeError;

/// The one error kind surfaced by resolution, binding, and access
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// No exact or similar match after exhausting all passes
    #[error("no member `{member}` on `{type_name}` matches the requested signature")]
    MemberNotFound {
        /// The type the lookup started from
        type_name: String,
        /// The requested member name
        member: String,
    },

    /// The environment refused to grant elevated access
    #[error("privileged access denied for `{context}`")]
    EscalationDenied {
        /// The declaring type or member the escalation was for
        context: String,
        /// The refusal from the capability layer
        #[source]
        cause: RuntimeError,
    },

    /// A view change to a non-ancestor, or an incompatible value
    #[error("type mismatch: {detail}")]
    TypeMismatch {
        /// What did not line up
        detail: String,
        /// Low-level cause, when one exists
        #[source]
        cause: Option<RuntimeError>,
    },

    /// The located member was invoked but its own execution failed
    #[error("invocation of `{member}` failed")]
    InvocationFailure {
        /// The invoked member
        member: String,
        /// The fault raised during execution
        #[source]
        cause: RuntimeError,
    },

    /// An operation that requires a usable result received null
    #[error("`{member}` produced a null result where a value was required")]
    NullResult {
        /// The member that produced nothing
        member: String,
    },
}

impl AccessError {
    /// Map a raw runtime failure into the public taxonomy, attributing it
    /// to the named member. Body faults become invocation failures; access
    /// refusals become escalation denials; shape problems, including
    /// arguments that do not fit the resolved signature, become type
    /// mismatches. Invocation failures are reserved for members that were
    /// actually entered; an arity mismatch fires before the body runs.
    pub(crate) fn from_runtime(member: &str, err: RuntimeError) -> Self {
        match err {
            RuntimeError::AccessDenied(_) => AccessError::EscalationDenied {
                context: member.to_string(),
                cause: err,
            },
            RuntimeError::TypeError(_)
            | RuntimeError::NullReceiver
            | RuntimeError::ArityMismatch { .. } => AccessError::TypeMismatch {
                detail: err.to_string(),
                cause: Some(err),
            },
            RuntimeError::MethodFault { .. }
            | RuntimeError::Fault(_)
            | RuntimeError::SlotOutOfBounds(_)
            | RuntimeError::UnknownType(_) => AccessError::InvocationFailure {
                member: member.to_string(),
                cause: err,
            },
        }
    }
}
