//! Roles and capabilities of staff users

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::UserId;
use crate::error::ClaimError;

/// Staff role carried in the session token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Billing administrators
    Admin,
    /// Front-office and billing staff
    Staff,
    /// Read-only users
    #[serde(alias = "USER")]
    Viewer,
}

/// Things a role may be allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ReadClaims,
    AnnotateClaims,
    UpdateClaimStatus,
    BulkUpdateClaims,
}

impl Role {
    pub fn allows(&self, capability: Capability) -> bool {
        match self {
            Role::Admin => true,
            Role::Staff => matches!(capability, Capability::ReadClaims | Capability::AnnotateClaims),
            Role::Viewer => matches!(capability, Capability::ReadClaims),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Staff => "STAFF",
            Role::Viewer => "VIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::ReadClaims => "read claims",
            Capability::AnnotateClaims => "annotate claims",
            Capability::UpdateClaimStatus => "update claim status",
            Capability::BulkUpdateClaims => "bulk update claims",
        };
        f.write_str(name)
    }
}

/// The authenticated user behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Fails with `ClaimError::Forbidden` unless the role grants `capability`
    pub fn require(&self, capability: Capability) -> Result<(), ClaimError> {
        if self.role.allows(capability) {
            Ok(())
        } else {
            Err(ClaimError::Forbidden(format!(
                "role {} may not {}",
                self.role, capability
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_bulk_updates() {
        assert!(Role::Admin.allows(Capability::BulkUpdateClaims));
        assert!(!Role::Staff.allows(Capability::BulkUpdateClaims));
        assert!(!Role::Viewer.allows(Capability::BulkUpdateClaims));
    }

    #[test]
    fn test_user_is_an_alias_for_viewer() {
        let role: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(role, Role::Viewer);
        let role: Role = serde_json::from_str("\"VIEWER\"").unwrap();
        assert_eq!(role, Role::Viewer);
    }

    #[test]
    fn test_role_names_are_exact_case() {
        assert!(serde_json::from_str::<Role>("\"admin\"").is_err());
        assert!(serde_json::from_str::<Role>("\"Staff\"").is_err());
        assert_eq!(serde_json::from_str::<Role>("\"ADMIN\"").unwrap(), Role::Admin);
    }

    #[test]
    fn test_require_reports_forbidden() {
        let actor = Actor::new(UserId::new(), Role::Staff);
        assert!(actor.require(Capability::AnnotateClaims).is_ok());
        assert!(matches!(
            actor.require(Capability::UpdateClaimStatus),
            Err(ClaimError::Forbidden(_))
        ));
    }
}
