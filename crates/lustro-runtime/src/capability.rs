//! Access capabilities and privilege escalation
//!
//! Privileged access is modeled as an explicit capability token, never as
//! ambient global state. A capability carries a grant (bitflags describing
//! what the caller may do at all) and an optional opened scope: the one
//! declaring type the capability has been escalated for. Escalation is
//! per-declaring-type, so a member declared on an ancestor is accessed
//! with an escalation scoped to that ancestor.

use std::fmt;

use crate::descriptor::Visibility;
use crate::registry::TypeId;
use crate::RuntimeError;

/// Access grant flags (bitflags)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessGrant(u8);

impl AccessGrant {
    /// No access at all
    pub const NONE: Self = Self(0x00);
    /// Read public fields
    pub const READ_PUBLIC: Self = Self(0x01);
    /// Read private fields
    pub const READ_PRIVATE: Self = Self(0x02);
    /// Write public fields
    pub const WRITE_PUBLIC: Self = Self(0x04);
    /// Write private fields
    pub const WRITE_PRIVATE: Self = Self(0x08);
    /// Invoke public methods
    pub const INVOKE_PUBLIC: Self = Self(0x10);
    /// Invoke private methods
    pub const INVOKE_PRIVATE: Self = Self(0x20);
    /// Invoke public constructors
    pub const CONSTRUCT_PUBLIC: Self = Self(0x40);
    /// Invoke private constructors
    pub const CONSTRUCT_PRIVATE: Self = Self(0x80);

    // Common combinations
    /// READ_PUBLIC | READ_PRIVATE
    pub const READ_ALL: Self = Self(0x03);
    /// WRITE_PUBLIC | WRITE_PRIVATE
    pub const WRITE_ALL: Self = Self(0x0C);
    /// INVOKE_PUBLIC | INVOKE_PRIVATE
    pub const INVOKE_ALL: Self = Self(0x30);
    /// All public flags, no private ones
    pub const PUBLIC_ONLY: Self = Self(0x55);
    /// Everything
    pub const ALL: Self = Self(0xFF);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if the grant contains a flag
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of grants
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Parse a single named grant, or a hex/decimal bit pattern
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "NONE" => Some(Self::NONE),
            "READ_PUBLIC" => Some(Self::READ_PUBLIC),
            "READ_PRIVATE" => Some(Self::READ_PRIVATE),
            "WRITE_PUBLIC" => Some(Self::WRITE_PUBLIC),
            "WRITE_PRIVATE" => Some(Self::WRITE_PRIVATE),
            "INVOKE_PUBLIC" => Some(Self::INVOKE_PUBLIC),
            "INVOKE_PRIVATE" => Some(Self::INVOKE_PRIVATE),
            "CONSTRUCT_PUBLIC" => Some(Self::CONSTRUCT_PUBLIC),
            "CONSTRUCT_PRIVATE" => Some(Self::CONSTRUCT_PRIVATE),
            "READ_ALL" => Some(Self::READ_ALL),
            "WRITE_ALL" => Some(Self::WRITE_ALL),
            "INVOKE_ALL" => Some(Self::INVOKE_ALL),
            "PUBLIC_ONLY" => Some(Self::PUBLIC_ONLY),
            "ALL" => Some(Self::ALL),
            _ => {
                if let Some(hex) = s.strip_prefix("0x") {
                    u8::from_str_radix(hex, 16).ok().map(Self::from_bits)
                } else {
                    s.parse::<u8>().ok().map(Self::from_bits)
                }
            }
        }
    }

    /// Parse combined flags from a pipe-separated string
    /// (e.g. `"READ_PUBLIC|WRITE_PUBLIC"`)
    pub fn parse_combined(s: &str) -> Option<Self> {
        let mut result = Self::NONE;
        for part in s.split('|') {
            let grant = Self::parse(part.trim())?;
            result = result.union(grant);
        }
        Some(result)
    }
}

impl fmt::Display for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::NONE => "NONE",
            Self::READ_PUBLIC => "READ_PUBLIC",
            Self::READ_PRIVATE => "READ_PRIVATE",
            Self::WRITE_PUBLIC => "WRITE_PUBLIC",
            Self::WRITE_PRIVATE => "WRITE_PRIVATE",
            Self::INVOKE_PUBLIC => "INVOKE_PUBLIC",
            Self::INVOKE_PRIVATE => "INVOKE_PRIVATE",
            Self::CONSTRUCT_PUBLIC => "CONSTRUCT_PUBLIC",
            Self::CONSTRUCT_PRIVATE => "CONSTRUCT_PRIVATE",
            Self::READ_ALL => "READ_ALL",
            Self::WRITE_ALL => "WRITE_ALL",
            Self::INVOKE_ALL => "INVOKE_ALL",
            Self::PUBLIC_ONLY => "PUBLIC_ONLY",
            Self::ALL => "ALL",
            _ => return write!(f, "0x{:02X}", self.0),
        };
        f.write_str(name)
    }
}

/// The kind of access an operation performs, used to pick the grant flag
/// that must cover it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    /// Field read
    Read,
    /// Field write
    Write,
    /// Method invocation
    Invoke,
    /// Constructor invocation
    Construct,
}

impl AccessKind {
    /// The flag required to perform this access on a public member
    pub fn public_flag(self) -> AccessGrant {
        match self {
            AccessKind::Read => AccessGrant::READ_PUBLIC,
            AccessKind::Write => AccessGrant::WRITE_PUBLIC,
            AccessKind::Invoke => AccessGrant::INVOKE_PUBLIC,
            AccessKind::Construct => AccessGrant::CONSTRUCT_PUBLIC,
        }
    }

    /// The flag required to perform this access on a private member
    pub fn private_flag(self) -> AccessGrant {
        match self {
            AccessKind::Read => AccessGrant::READ_PRIVATE,
            AccessKind::Write => AccessGrant::WRITE_PRIVATE,
            AccessKind::Invoke => AccessGrant::INVOKE_PRIVATE,
            AccessKind::Construct => AccessGrant::CONSTRUCT_PRIVATE,
        }
    }
}

/// An opaque token representing the caller's right to access members,
/// including (when the grant allows it) members that are not public.
///
/// A fresh capability is unscoped: it can reach public members anywhere
/// its grant covers, but no private ones. Reaching a private member
/// requires [`escalate`](AccessCapability::escalate)-ing the capability
/// for that member's declaring type first.
#[derive(Debug, Clone)]
pub struct AccessCapability {
    grant: AccessGrant,
    opened: Option<TypeId>,
}

impl AccessCapability {
    /// Create a capability with the given grant and no opened scope
    pub fn new(grant: AccessGrant) -> Self {
        Self {
            grant,
            opened: None,
        }
    }

    /// A capability that may do everything, once escalated per type
    pub fn unrestricted() -> Self {
        Self::new(AccessGrant::ALL)
    }

    /// A capability limited to public members
    pub fn public_only() -> Self {
        Self::new(AccessGrant::PUBLIC_ONLY)
    }

    /// The grant this capability carries
    pub fn grant(&self) -> AccessGrant {
        self.grant
    }

    /// The declaring type this capability has been escalated for, if any
    pub fn opened(&self) -> Option<TypeId> {
        self.opened
    }

    /// Upgrade this capability for private access scoped to one declaring
    /// type. The grant itself never widens: escalation fails unless the
    /// caller already holds the private flag for the access kind.
    pub fn escalate(
        &self,
        declaring: TypeId,
        kind: AccessKind,
    ) -> Result<AccessCapability, RuntimeError> {
        if self.grant.contains(kind.private_flag()) {
            Ok(AccessCapability {
                grant: self.grant,
                opened: Some(declaring),
            })
        } else {
            Err(RuntimeError::AccessDenied(format!(
                "grant {} does not permit {}",
                self.grant,
                kind.private_flag()
            )))
        }
    }

    /// Whether this capability covers the given access against a member
    /// of the given visibility declared on the given type
    pub fn allows(&self, kind: AccessKind, visibility: Visibility, declaring: TypeId) -> bool {
        match visibility {
            Visibility::Public => self.grant.contains(kind.public_flag()),
            Visibility::Private => {
                self.grant.contains(kind.private_flag()) && self.opened == Some(declaring)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_flags() {
        assert_eq!(AccessGrant::NONE.bits(), 0x00);
        assert_eq!(AccessGrant::ALL.bits(), 0xFF);
        assert_eq!(AccessGrant::READ_ALL.bits(), 0x03);
        assert_eq!(AccessGrant::PUBLIC_ONLY.bits(), 0x55);
    }

    #[test]
    fn test_grant_contains() {
        assert!(AccessGrant::ALL.contains(AccessGrant::READ_PRIVATE));
        assert!(AccessGrant::PUBLIC_ONLY.contains(AccessGrant::INVOKE_PUBLIC));
        assert!(!AccessGrant::PUBLIC_ONLY.contains(AccessGrant::READ_PRIVATE));
    }

    #[test]
    fn test_grant_union() {
        let grant = AccessGrant::READ_PUBLIC.union(AccessGrant::WRITE_PUBLIC);
        assert!(grant.contains(AccessGrant::READ_PUBLIC));
        assert!(grant.contains(AccessGrant::WRITE_PUBLIC));
        assert!(!grant.contains(AccessGrant::READ_PRIVATE));
    }

    #[test]
    fn test_grant_parse() {
        assert_eq!(AccessGrant::parse("ALL"), Some(AccessGrant::ALL));
        assert_eq!(AccessGrant::parse("all"), Some(AccessGrant::ALL));
        assert_eq!(
            AccessGrant::parse("PUBLIC_ONLY"),
            Some(AccessGrant::PUBLIC_ONLY)
        );
        assert_eq!(AccessGrant::parse("0xFF"), Some(AccessGrant::ALL));
        assert_eq!(AccessGrant::parse("255"), Some(AccessGrant::ALL));
        assert_eq!(AccessGrant::parse("bogus"), None);
    }

    #[test]
    fn test_grant_parse_combined() {
        let grant = AccessGrant::parse_combined("READ_PUBLIC|WRITE_PUBLIC").unwrap();
        assert!(grant.contains(AccessGrant::READ_PUBLIC));
        assert!(grant.contains(AccessGrant::WRITE_PUBLIC));
        assert!(!grant.contains(AccessGrant::INVOKE_PUBLIC));
        assert!(AccessGrant::parse_combined("READ_PUBLIC|bogus").is_none());
    }

    #[test]
    fn test_escalate_scopes_to_declaring_type() {
        let cap = AccessCapability::unrestricted();
        let target = TypeId(9);
        assert_eq!(cap.opened(), None);

        let opened = cap.escalate(target, AccessKind::Read).unwrap();
        assert_eq!(opened.opened(), Some(target));
        assert!(opened.allows(AccessKind::Read, Visibility::Private, target));
        assert!(!opened.allows(AccessKind::Read, Visibility::Private, TypeId(10)));
    }

    #[test]
    fn test_escalate_denied_without_private_grant() {
        let cap = AccessCapability::public_only();
        let err = cap.escalate(TypeId(1), AccessKind::Write).unwrap_err();
        assert!(matches!(err, RuntimeError::AccessDenied(_)));
    }

    #[test]
    fn test_allows_public_without_escalation() {
        let cap = AccessCapability::public_only();
        assert!(cap.allows(AccessKind::Invoke, Visibility::Public, TypeId(3)));
        assert!(!cap.allows(AccessKind::Invoke, Visibility::Private, TypeId(3)));
    }
}
