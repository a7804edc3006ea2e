use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// JWT claims model (transport-agnostic).
///
/// Identifier and role claims are accepted as either JSON strings or numbers;
/// older credentials carry the role as an enum name, newer ones as a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject / user identifier.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Tenant the credential is bound to.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Role representation (numeric code or legacy alias).
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Issued-at (seconds since epoch).
    pub iat: i64,

    /// Expiration (seconds since epoch).
    pub exp: i64,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(integral(&n).map_or_else(|| n.to_string(), |i| i.to_string())),
        Some(other) => Some(other.to_string()),
    })
}

/// `9` and `9.0` name the same identifier; `9.5` does not.
fn integral(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid token time window (expires_at <= issued_at)")]
    InvalidTimeWindow,

    #[error("malformed or unverifiable token: {0}")]
    Malformed(String),
}

/// Deterministically validate the time window of already-decoded claims.
pub fn validate_claims(claims: &JwtClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Verifies a bearer credential and yields its claims.
pub trait JwtValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError>;
}

/// HMAC-SHA256 verifier for credentials issued by the login service.
pub struct Hs256JwtValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256JwtValidator {
    pub fn new(secret: Vec<u8>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks run in `validate_claims` against an explicit clock.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            key: DecodingKey::from_secret(&secret),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256JwtValidator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256JwtValidator").finish_non_exhaustive()
    }
}

impl JwtValidator for Hs256JwtValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<JwtClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<JwtClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;

        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn claims(now: DateTime<Utc>) -> JwtClaims {
        JwtClaims {
            sub: Some("15".to_string()),
            tenant_id: Some("9".to_string()),
            role: Some("Tecnico".to_string()),
            name: Some("Ana".to_string()),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(10)).timestamp(),
        }
    }

    fn mint(secret: &[u8], claims: &JwtClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn numeric_claims_are_read_as_strings() {
        let raw = r#"{"sub":15,"tenant_id":9,"role":2,"iat":1,"exp":2}"#;
        let claims: JwtClaims = serde_json::from_str(raw).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("15"));
        assert_eq!(claims.tenant_id.as_deref(), Some("9"));
        assert_eq!(claims.role.as_deref(), Some("2"));
        assert_eq!(claims.name, None);
    }

    #[test]
    fn integral_float_claims_drop_the_fraction() {
        let raw = r#"{"sub":15.0,"tenant_id":9.0,"role":2.0,"iat":1,"exp":2}"#;
        let claims: JwtClaims = serde_json::from_str(raw).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("15"));
        assert_eq!(claims.tenant_id.as_deref(), Some("9"));
        assert_eq!(claims.role.as_deref(), Some("2"));

        let raw = r#"{"tenant_id":9.5,"iat":1,"exp":2}"#;
        let claims: JwtClaims = serde_json::from_str(raw).unwrap();
        assert_eq!(claims.tenant_id.as_deref(), Some("9.5"));
    }

    #[test]
    fn missing_role_claim_is_none() {
        let raw = r#"{"sub":"15","iat":1,"exp":2}"#;
        let claims: JwtClaims = serde_json::from_str(raw).unwrap();
        assert_eq!(claims.role, None);
        assert_eq!(claims.tenant_id, None);
    }

    #[test]
    fn validator_accepts_well_signed_token() {
        let now = Utc::now();
        let token = mint(b"secret", &claims(now));
        let validator = Hs256JwtValidator::new(b"secret".to_vec());
        let decoded = validator.validate(&token, now).unwrap();
        assert_eq!(decoded.role.as_deref(), Some("Tecnico"));
    }

    #[test]
    fn validator_rejects_wrong_secret() {
        let now = Utc::now();
        let token = mint(b"secret", &claims(now));
        let validator = Hs256JwtValidator::new(b"other".to_vec());
        assert!(matches!(
            validator.validate(&token, now),
            Err(TokenValidationError::Malformed(_))
        ));
    }

    #[test]
    fn time_window_is_enforced() {
        let now = Utc::now();
        let c = claims(now);
        assert_eq!(
            validate_claims(&c, now + Duration::minutes(11)),
            Err(TokenValidationError::Expired)
        );
        assert_eq!(
            validate_claims(&c, now - Duration::minutes(1)),
            Err(TokenValidationError::NotYetValid)
        );

        let mut inverted = c.clone();
        inverted.exp = inverted.iat;
        assert_eq!(
            validate_claims(&inverted, now),
            Err(TokenValidationError::InvalidTimeWindow)
        );
    }
}
