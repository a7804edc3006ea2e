use serde::Serialize;

use crate::claims::JwtClaims;

/// Verified identity for the current request.
///
/// Produced once per request by the upstream verifier and never mutated
/// afterwards. Claim values are kept exactly as the credential carried them:
/// the role may be a legacy alias, and the identifier claims are only
/// interpreted when they are cross-checked against transport headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    subject: Option<String>,
    tenant_id: Option<String>,
    role: Option<String>,
    display_name: Option<String>,
}

impl Principal {
    pub fn new(
        subject: Option<String>,
        tenant_id: Option<String>,
        role: Option<String>,
        display_name: Option<String>,
    ) -> Self {
        Self {
            subject: non_blank(subject),
            tenant_id: non_blank(tenant_id),
            role: non_blank(role),
            display_name,
        }
    }

    pub fn from_claims(claims: JwtClaims) -> Self {
        Self::new(claims.sub, claims.tenant_id, claims.role, claims.name)
    }

    /// Subject claim (the user id bound in the credential).
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Tenant claim bound in the credential.
    pub fn tenant_claim(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    /// Raw role representation (numeric code or textual alias).
    pub fn role_claim(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_claims_are_treated_as_absent() {
        let p = Principal::new(
            Some("  ".to_string()),
            Some(String::new()),
            Some("2".to_string()),
            None,
        );
        assert_eq!(p.subject(), None);
        assert_eq!(p.tenant_claim(), None);
        assert_eq!(p.role_claim(), Some("2"));
    }
}
