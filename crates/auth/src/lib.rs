//! `ticketdesk-auth`: pure authentication/authorization boundary (zero-trust).
//!
//! This crate is intentionally decoupled from HTTP and storage: it models the
//! verified principal, the role alias table, and the two gate decisions
//! (role authorization and tenant/user consistency) as plain functions.

pub mod authorize;
pub mod claims;
pub mod consistency;
pub mod continuation;
pub mod principal;
pub mod roles;

pub use authorize::{AllowedRoles, RoleRejection, authorize_role};
pub use claims::{Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims};
pub use consistency::{
    ConsistencyRejection, IdentityHeaders, PublicPaths, ReconciledIdentity, TENANT_HEADER,
    USER_HEADER, reconcile,
};
pub use continuation::{ClientMetadata, ContinuationToken, TokenId};
pub use principal::Principal;
pub use roles::{Role, RoleMapping};
