use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::{Config, MIN_JWT_SECRET_LEN};
use crate::error::{Error, Result};
use crate::models::user::{User, UserRole};

/// Claims sealed into every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account email.
    pub sub: String,
    pub uid: Uuid,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn has_any_role(&self, allowed: &[UserRole]) -> bool {
        allowed.contains(&self.role)
    }

    pub fn require_any_role(&self, allowed: &[UserRole]) -> Result<()> {
        if self.has_any_role(allowed) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "role {} may not perform this operation",
                self.role.as_str()
            )))
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Issues and verifies HS256 access tokens.
///
/// Holds nothing but the key material and the configured lifetime, so a
/// clone can be shared freely across request handlers.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    expiry: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub fn new(secret: &str, expiry: Duration) -> Result<Self> {
        if secret.chars().count() < MIN_JWT_SECRET_LEN {
            return Err(Error::Config(format!(
                "JWT secret must be at least {} characters long",
                MIN_JWT_SECRET_LEN
            )));
        }
        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret.as_bytes()),
                decoding: DecodingKey::from_secret(secret.as_bytes()),
            }),
            expiry,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.jwt_secret, config.jwt_expiration())
    }

    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    pub fn issue(&self, user: &User) -> Result<String> {
        self.issue_at(user, Utc::now())
    }

    /// Issues a token as if the current instant were `now`.
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String> {
        let issued_at = now.timestamp();
        let claims = Claims {
            sub: user.email.clone(),
            uid: user.id,
            role: user.role,
            iat: issued_at,
            exp: (now + self.expiry).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(|e| Error::Internal(format!("token signing failed: {}", e)))
    }

    /// Checks signature and expiry and returns the claims.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        decode::<Claims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => Error::TokenExpired,
                ErrorKind::InvalidSignature => Error::TokenSignatureInvalid,
                _ => Error::TokenMalformed,
            })
    }

    pub fn extract_subject(&self, token: &str) -> Result<String> {
        Ok(self.decode(token)?.sub)
    }

    pub fn extract_expiry(&self, token: &str) -> Result<DateTime<Utc>> {
        let exp = self.decode(token)?.exp;
        Utc.timestamp_opt(exp, 0)
            .single()
            .ok_or(Error::TokenMalformed)
    }

    /// True when the token is currently valid and was issued to `expected_subject`.
    pub fn verify(&self, token: &str, expected_subject: &str) -> bool {
        self.decode(token)
            .map(|claims| claims.sub == expected_subject)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-must-be-at-least-32-characters-long";

    fn service() -> TokenService {
        TokenService::new(SECRET, Duration::hours(1)).unwrap()
    }

    fn user(email: &str) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            email: email.to_string(),
            first_name: "Test".into(),
            last_name: "User".into(),
            full_name: "Test User".into(),
            role: UserRole::Dispatcher,
            phone: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn short_secret_is_rejected_at_construction() {
        let err = TokenService::new("short", Duration::hours(1)).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn token_has_three_segments() {
        let token = service().issue(&user("test@example.com")).unwrap();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn subject_round_trips() {
        let svc = service();
        let u = user("test@example.com");
        let token = svc.issue(&u).unwrap();
        assert_eq!(svc.extract_subject(&token).unwrap(), "test@example.com");
        assert!(svc.verify(&token, "test@example.com"));

        let claims = svc.decode(&token).unwrap();
        assert_eq!(claims.uid, u.id);
        assert_eq!(claims.role, UserRole::Dispatcher);
    }

    #[test]
    fn verify_rejects_other_subject() {
        let svc = service();
        let token = svc.issue(&user("test@example.com")).unwrap();
        assert!(!svc.verify(&token, "other@example.com"));
    }

    #[test]
    fn expiry_is_issued_at_plus_duration() {
        let svc = service();
        let now = Utc::now();
        let token = svc.issue_at(&user("a@x.com"), now).unwrap();
        let exp = svc.extract_expiry(&token).unwrap();
        assert_eq!(exp.timestamp(), now.timestamp() + 3600);
        assert!(exp > Utc::now());
    }

    #[test]
    fn tokens_issued_at_different_instants_differ() {
        let svc = service();
        let u = user("a@x.com");
        let now = Utc::now();
        let first = svc.issue_at(&u, now).unwrap();
        let second = svc.issue_at(&u, now + Duration::seconds(1)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn issuance_is_pure_for_a_fixed_instant() {
        let svc = service();
        let u = user("a@x.com");
        let now = Utc::now();
        assert_eq!(svc.issue_at(&u, now).unwrap(), svc.issue_at(&u, now).unwrap());
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let svc = TokenService::new(SECRET, Duration::zero()).unwrap();
        let u = user("a@x.com");
        let token = svc
            .issue_at(&u, Utc::now() - Duration::seconds(5))
            .unwrap();
        assert!(matches!(svc.decode(&token), Err(Error::TokenExpired)));
        assert!(matches!(svc.extract_subject(&token), Err(Error::TokenExpired)));
        assert!(!svc.verify(&token, "a@x.com"));
    }

    #[test]
    fn token_from_other_secret_has_invalid_signature() {
        let other =
            TokenService::new("another-secret-that-is-also-32-chars-long!", Duration::hours(1))
                .unwrap();
        let token = other.issue(&user("a@x.com")).unwrap();
        assert!(matches!(
            service().decode(&token),
            Err(Error::TokenSignatureInvalid)
        ));
    }

    #[test]
    fn tampered_payload_has_invalid_signature() {
        let svc = service();
        let token = svc.issue(&user("a@x.com")).unwrap();
        let forged = svc.issue(&user("admin@x.com")).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);
        assert!(matches!(
            svc.decode(&spliced),
            Err(Error::TokenSignatureInvalid)
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = service();
        for bad in ["", "abc", "a.b", "not.a.token", "!!!.???.***"] {
            assert!(
                matches!(svc.decode(bad), Err(Error::TokenMalformed)),
                "expected malformed for {:?}",
                bad
            );
        }
    }

    #[test]
    fn claims_role_checks() {
        let claims = Claims {
            sub: "a@x.com".into(),
            uid: Uuid::now_v7(),
            role: UserRole::Driver,
            iat: 0,
            exp: 0,
        };
        assert!(claims.require_any_role(&[UserRole::Driver]).is_ok());
        assert!(matches!(
            claims.require_any_role(&[UserRole::Admin, UserRole::Dispatcher]),
            Err(Error::Forbidden(_))
        ));
        assert!(!claims.is_admin());
    }
}
