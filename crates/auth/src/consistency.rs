//! Tenant/user identifier reconciliation between transport headers and the
//! verified credential.
//!
//! A caller may *repeat* the identifiers bound in its credential as headers,
//! but never assert different ones.

use thiserror::Error;

use ticketdesk_core::{TenantId, UserId};

use crate::Principal;

pub const TENANT_HEADER: &str = "X-Tenant-Id";
pub const USER_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathRule {
    Exact(&'static str),
    Prefix(&'static str),
}

/// Paths that bypass identifier reconciliation entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPaths {
    rules: Vec<PathRule>,
}

impl PublicPaths {
    /// Login, health, API docs, self-service setup, public registration,
    /// password recovery, and the root path.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                PathRule::Exact("/"),
                PathRule::Prefix("/api/auth/login"),
                PathRule::Prefix("/api/auth/refresh"),
                PathRule::Prefix("/health"),
                PathRule::Prefix("/swagger"),
                PathRule::Prefix("/api-docs"),
                PathRule::Prefix("/api/setup"),
                PathRule::Prefix("/api/public/register"),
                PathRule::Prefix("/api/auth/forgot-password"),
                PathRule::Prefix("/api/auth/reset-password"),
            ],
        }
    }

    /// Case-insensitive exact or prefix match.
    pub fn is_public(&self, path: &str) -> bool {
        let path = path.to_ascii_lowercase();
        self.rules.iter().any(|rule| match rule {
            PathRule::Exact(p) => path == *p,
            PathRule::Prefix(p) => path.starts_with(p),
        })
    }
}

impl Default for PublicPaths {
    fn default() -> Self {
        Self::standard()
    }
}

/// Identifier headers as presented on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityHeaders {
    pub tenant: Option<String>,
    pub user: Option<String>,
}

/// Outcome of a successful reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledIdentity {
    pub tenant_id: Option<TenantId>,
    pub user_id: Option<UserId>,
    /// Headers that were absent and filled in from the credential; the
    /// transport layer re-injects these for downstream consumers.
    pub backfilled: Vec<(&'static str, String)>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsistencyRejection {
    #[error("header {header} must be a positive integer")]
    HeaderMalformed { header: &'static str },

    #[error("header {header} does not match the authenticated credential")]
    IdentityMismatch { header: &'static str },
}

/// Reconcile identifier headers against the principal.
///
/// Steps, in order: backfill absent headers from the credential, then for the
/// tenant header and afterwards the user header, validate the format and
/// compare with the bound claim. The comparison only runs for authenticated
/// requests. Absence of both header and claim is not an error here.
pub fn reconcile(
    headers: IdentityHeaders,
    principal: Option<&Principal>,
) -> Result<ReconciledIdentity, ConsistencyRejection> {
    let mut backfilled = Vec::new();

    let tenant_raw = backfill(
        headers.tenant,
        principal.and_then(Principal::tenant_claim),
        TENANT_HEADER,
        &mut backfilled,
    );
    let user_raw = backfill(
        headers.user,
        principal.and_then(Principal::subject),
        USER_HEADER,
        &mut backfilled,
    );

    let tenant_id = check::<TenantId>(
        tenant_raw.as_deref(),
        principal.map(Principal::tenant_claim),
        TENANT_HEADER,
    )?;
    let user_id = check::<UserId>(
        user_raw.as_deref(),
        principal.map(Principal::subject),
        USER_HEADER,
    )?;

    Ok(ReconciledIdentity {
        tenant_id,
        user_id,
        backfilled,
    })
}

fn backfill(
    header: Option<String>,
    claim: Option<&str>,
    name: &'static str,
    backfilled: &mut Vec<(&'static str, String)>,
) -> Option<String> {
    match header {
        Some(value) => Some(value),
        None => {
            let claim = claim?.trim().to_string();
            backfilled.push((name, claim.clone()));
            Some(claim)
        }
    }
}

/// `claim` is `None` when unauthenticated, `Some(None)` when authenticated
/// without the claim.
fn check<T>(
    raw: Option<&str>,
    claim: Option<Option<&str>>,
    header: &'static str,
) -> Result<Option<T>, ConsistencyRejection>
where
    T: core::str::FromStr + PartialEq,
{
    let Some(raw) = raw else {
        return Ok(None);
    };

    let value: T = raw
        .parse()
        .map_err(|_| ConsistencyRejection::HeaderMalformed { header })?;

    if let Some(Some(claim)) = claim {
        // A claim that does not parse can never equal a valid header value.
        match claim.parse::<T>() {
            Ok(bound) if bound == value => {}
            _ => return Err(ConsistencyRejection::IdentityMismatch { header }),
        }
    }

    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn principal(tenant: Option<&str>, subject: Option<&str>) -> Principal {
        Principal::new(
            subject.map(str::to_string),
            tenant.map(str::to_string),
            Some("2".to_string()),
            None,
        )
    }

    fn headers(tenant: Option<&str>, user: Option<&str>) -> IdentityHeaders {
        IdentityHeaders {
            tenant: tenant.map(str::to_string),
            user: user.map(str::to_string),
        }
    }

    #[test]
    fn public_paths_match_exact_and_prefix_case_insensitively() {
        let public = PublicPaths::standard();
        assert!(public.is_public("/"));
        assert!(public.is_public("/api/auth/login"));
        assert!(public.is_public("/API/Auth/Login"));
        assert!(public.is_public("/health/ready"));
        assert!(public.is_public("/swagger/index.html"));
        assert!(public.is_public("/api/auth/forgot-password"));
        assert!(public.is_public("/api/public/register"));
        assert!(!public.is_public("/api/session"));
        assert!(!public.is_public("/api/admin/maintenance/reap"));
    }

    #[test]
    fn matching_headers_pass() {
        let p = principal(Some("9"), Some("15"));
        let out = reconcile(headers(Some("9"), Some("15")), Some(&p)).unwrap();
        assert_eq!(out.tenant_id.map(|t| t.get()), Some(9));
        assert_eq!(out.user_id.map(|u| u.get()), Some(15));
        assert!(out.backfilled.is_empty());
    }

    #[test]
    fn absent_headers_are_backfilled_from_claims() {
        let p = principal(Some("9"), Some("15"));
        let out = reconcile(IdentityHeaders::default(), Some(&p)).unwrap();
        assert_eq!(out.tenant_id.map(|t| t.get()), Some(9));
        assert_eq!(out.user_id.map(|u| u.get()), Some(15));
        assert_eq!(
            out.backfilled,
            vec![(TENANT_HEADER, "9".to_string()), (USER_HEADER, "15".to_string())]
        );
    }

    #[test]
    fn tenant_mismatch_is_rejected() {
        let p = principal(Some("9"), Some("15"));
        let err = reconcile(headers(Some("7"), None), Some(&p)).unwrap_err();
        assert_eq!(err, ConsistencyRejection::IdentityMismatch { header: TENANT_HEADER });
    }

    #[test]
    fn user_mismatch_is_rejected() {
        let p = principal(Some("9"), Some("15"));
        let err = reconcile(headers(Some("9"), Some("16")), Some(&p)).unwrap_err();
        assert_eq!(err, ConsistencyRejection::IdentityMismatch { header: USER_HEADER });
    }

    #[test]
    fn malformed_tenant_header_wins_over_mismatch() {
        let p = principal(Some("9"), Some("15"));
        for bad in ["abc", "0", "-4", ""] {
            let err = reconcile(headers(Some(bad), Some("99")), Some(&p)).unwrap_err();
            assert_eq!(err, ConsistencyRejection::HeaderMalformed { header: TENANT_HEADER });
        }
    }

    #[test]
    fn malformed_user_header_is_rejected_after_a_valid_tenant() {
        let p = principal(Some("9"), Some("15"));
        for bad in ["abc", "0", "-4"] {
            let err = reconcile(headers(Some("9"), Some(bad)), Some(&p)).unwrap_err();
            assert_eq!(err, ConsistencyRejection::HeaderMalformed { header: USER_HEADER });

            let err = reconcile(headers(None, Some(bad)), None).unwrap_err();
            assert_eq!(err, ConsistencyRejection::HeaderMalformed { header: USER_HEADER });
        }
    }

    #[test]
    fn unauthenticated_requests_skip_the_mismatch_check() {
        let out = reconcile(headers(Some("7"), Some("3")), None).unwrap();
        assert_eq!(out.tenant_id.map(|t| t.get()), Some(7));
        assert_eq!(out.user_id.map(|u| u.get()), Some(3));
    }

    #[test]
    fn unauthenticated_requests_still_validate_format() {
        let err = reconcile(headers(Some("abc"), None), None).unwrap_err();
        assert_eq!(err, ConsistencyRejection::HeaderMalformed { header: TENANT_HEADER });
    }

    #[test]
    fn authenticated_without_claims_accepts_any_valid_header() {
        let p = principal(None, None);
        let out = reconcile(headers(Some("7"), Some("3")), Some(&p)).unwrap();
        assert_eq!(out.tenant_id.map(|t| t.get()), Some(7));
    }

    #[test]
    fn neither_header_nor_claim_is_deferred() {
        let p = principal(None, None);
        let out = reconcile(IdentityHeaders::default(), Some(&p)).unwrap();
        assert_eq!(out, ReconciledIdentity::default());
    }

    #[test]
    fn unparseable_claim_never_matches() {
        let p = principal(Some("tenant-nine"), None);
        let err = reconcile(headers(Some("9"), None), Some(&p)).unwrap_err();
        assert_eq!(err, ConsistencyRejection::IdentityMismatch { header: TENANT_HEADER });
    }

    proptest! {
        #[test]
        fn differing_tenants_always_mismatch(header in 1i64..1_000_000, claim in 1i64..1_000_000) {
            prop_assume!(header != claim);
            let p = principal(Some(&claim.to_string()), None);
            let err = reconcile(headers(Some(&header.to_string()), None), Some(&p)).unwrap_err();
            prop_assert_eq!(err, ConsistencyRejection::IdentityMismatch { header: TENANT_HEADER });
        }

        #[test]
        fn non_numeric_tenant_headers_are_malformed(raw in "[a-zA-Z_ ]{1,12}") {
            let p = principal(Some("9"), None);
            let err = reconcile(headers(Some(&raw), None), Some(&p)).unwrap_err();
            prop_assert_eq!(err, ConsistencyRejection::HeaderMalformed { header: TENANT_HEADER });
        }
    }
}
