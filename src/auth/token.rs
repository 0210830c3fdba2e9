use crate::accounts::types::Identity;
use crate::error::{AppError, Result};

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Payload of a bearer token: the account id, its role, and expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub id: String,
    pub role: String,
    pub exp: i64,
}

/// HS256 signer/verifier for bearer credentials.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token valid for `ttl_secs` seconds from now.
    ///
    /// A negative ttl produces an already-expired token.
    pub fn issue(&self, user_id: &str, role: &str, ttl_secs: i64) -> Result<String> {
        let claims = Claims {
            id: user_id.to_string(),
            role: role.to_string(),
            exp: Utc::now().timestamp() + ttl_secs,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("could not sign token: {}", e)))
    }

    /// Issues a token for `identity`, carrying its account role.
    pub fn issue_for(&self, identity: &Identity, ttl_secs: i64) -> Result<String> {
        self.issue(&identity.user_id, identity.kind.role(), ttl_secs)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    AppError::Auth("token expired, please log in again".to_string())
                }
                _ => AppError::Auth("invalid token".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new("test-secret");
        let token = service.issue("v1", "volunteer", 3600).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.id, "v1");
        assert_eq!(claims.role, "volunteer");
    }

    #[test]
    fn test_issue_for_carries_account_role() {
        use crate::accounts::types::AccountKind;

        let service = TokenService::new("test-secret");
        let ngo = Identity {
            user_id: "n1".to_string(),
            name: "Green Earth".to_string(),
            kind: AccountKind::Ngo,
        };

        let claims = service.verify(&service.issue_for(&ngo, 60).unwrap()).unwrap();
        assert_eq!(claims.id, "n1");
        assert_eq!(claims.role, "ngo");
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new("test-secret");
        let token = service.issue("v1", "volunteer", -120).unwrap();

        let err = service.verify(&token).unwrap_err();
        assert!(err.to_string().contains("expired"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = TokenService::new("secret-a");
        let verifier = TokenService::new("secret-b");
        let token = issuer.issue("v1", "volunteer", 3600).unwrap();

        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, AppError::Auth(_)));
        assert!(err.to_string().contains("invalid token"));
    }

    #[test]
    fn test_garbage_rejected() {
        let service = TokenService::new("test-secret");
        assert!(service.verify("not-a-jwt").is_err());
    }
}
