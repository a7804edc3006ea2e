use thiserror::Error;

use crate::{Principal, Role, RoleMapping};

/// Roles an endpoint statically declares as allowed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AllowedRoles(&'static [Role]);

impl AllowedRoles {
    /// Any authenticated caller whose role resolves.
    pub const ANY: AllowedRoles = AllowedRoles(&Role::ALL);
    pub const STAFF: AllowedRoles = AllowedRoles(&[Role::Technician, Role::Administrator]);
    pub const ADMIN: AllowedRoles = AllowedRoles(&[Role::Administrator]);

    pub const fn new(roles: &'static [Role]) -> Self {
        Self(roles)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }
}

/// Why the role gate refused a request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleRejection {
    /// No verified credential accompanies the request.
    #[error("authentication required")]
    Unauthenticated,

    /// The credential predates the role claim.
    #[error("credential carries no role claim; sign in again to obtain a fresh token")]
    MissingRole,

    /// The role claim maps to no canonical role.
    #[error("unrecognized role '{0}'")]
    Unresolved(String),

    /// The role resolved but is not allowed on this endpoint.
    #[error("insufficient privilege for this operation")]
    InsufficientPrivilege(Role),
}

impl RoleRejection {
    /// `true` for the only rejection that means "who are you?" rather than
    /// "you may not".
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, RoleRejection::Unauthenticated)
    }
}

/// Decide whether the current principal may call an endpoint.
///
/// - No IO
/// - No panics
/// - Fails closed on anything it cannot resolve
pub fn authorize_role(
    principal: Option<&Principal>,
    allowed: AllowedRoles,
    mapping: &RoleMapping,
) -> Result<Role, RoleRejection> {
    let principal = principal.ok_or(RoleRejection::Unauthenticated)?;
    let raw = principal.role_claim().ok_or(RoleRejection::MissingRole)?;

    let role = mapping
        .resolve(raw)
        .ok_or_else(|| RoleRejection::Unresolved(raw.to_string()))?;

    if !allowed.contains(role) {
        return Err(RoleRejection::InsufficientPrivilege(role));
    }

    Ok(role)
}
