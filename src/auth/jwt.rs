/// JWT Token Generation and Validation
///
/// Short-lived HS256 access tokens. Verification is stateless: signature, issuer
/// and expiry are all checked against the codec's own key and the current time.

use chrono::Duration;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, ACCESS_TOKEN_ISSUER};
use crate::error::AccessTokenError;

/// Signs and verifies access tokens with a single symmetric secret
#[derive(Clone)]
pub struct AccessTokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AccessTokenCodec {
    /// Create a codec keyed with `secret`
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expired means expired: no grace period.
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue an access token for `user_id` that expires `ttl` from now
    ///
    /// # Errors
    /// Returns error if signing fails
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AccessTokenError> {
        let claims = Claims::new(user_id, ttl);

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AccessTokenError::SigningFailure(e.to_string()))
    }

    /// Verify an access token and return the user it was issued for
    ///
    /// # Errors
    /// - `BadSignature` if the token was not signed by this codec
    /// - `Expired` if the token's expiry has passed
    /// - `MalformedSubject` if the subject is not a UUID
    /// - `Malformed` if the token cannot be parsed at all
    pub fn verify(&self, token: &str) -> Result<Uuid, AccessTokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("JWT validation error: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AccessTokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAlgorithm => AccessTokenError::BadSignature,
                _ => AccessTokenError::Malformed,
            }
        })?;

        data.claims.user_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn sign_raw(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to sign claims")
    }

    #[test]
    fn test_issue_and_verify_token() {
        let codec = AccessTokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, Duration::hours(1)).expect("Failed to issue token");

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token), Ok(user_id));
        // Stateless: verifying again gives the same answer
        assert_eq!(codec.verify(&token), Ok(user_id));
    }

    #[test]
    fn test_expired_token() {
        let codec = AccessTokenCodec::new(SECRET);

        let token = codec
            .issue(Uuid::new_v4(), Duration::seconds(-10))
            .expect("Failed to issue token");

        assert_eq!(codec.verify(&token), Err(AccessTokenError::Expired));
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let codec = AccessTokenCodec::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = codec.issue(user_id, Duration::seconds(1)).expect("Failed to issue token");
        assert_eq!(codec.verify(&token), Ok(user_id));

        std::thread::sleep(std::time::Duration::from_secs(2));
        assert_eq!(codec.verify(&token), Err(AccessTokenError::Expired));
    }

    #[test]
    fn test_wrong_secret() {
        let signer = AccessTokenCodec::new(SECRET);
        let verifier = AccessTokenCodec::new("a-completely-different-secret-value");

        let token = signer.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        assert_eq!(verifier.verify(&token), Err(AccessTokenError::BadSignature));
    }

    #[test]
    fn test_forged_claims() {
        let codec = AccessTokenCodec::new(SECRET);

        let victim = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();
        let attacker = codec.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        // Attacker's claims segment under the victim's signature
        let victim_parts: Vec<&str> = victim.split('.').collect();
        let attacker_parts: Vec<&str> = attacker.split('.').collect();
        let forged = format!("{}.{}.{}", victim_parts[0], attacker_parts[1], victim_parts[2]);

        assert_eq!(codec.verify(&forged), Err(AccessTokenError::BadSignature));
    }

    #[test]
    fn test_wrong_issuer() {
        let codec = AccessTokenCodec::new(SECRET);
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
        claims.iss = "someone-else".to_string();

        let token = sign_raw(&claims, SECRET);

        assert_eq!(codec.verify(&token), Err(AccessTokenError::BadSignature));
    }

    #[test]
    fn test_malformed_subject() {
        let codec = AccessTokenCodec::new(SECRET);
        let mut claims = Claims::new(Uuid::new_v4(), Duration::hours(1));
        claims.sub = "not-a-uuid".to_string();

        let token = sign_raw(&claims, SECRET);

        assert_eq!(codec.verify(&token), Err(AccessTokenError::MalformedSubject));
    }

    #[test]
    fn test_invalid_token() {
        let codec = AccessTokenCodec::new(SECRET);

        assert_eq!(codec.verify("invalid.token.here"), Err(AccessTokenError::Malformed));
        assert_eq!(codec.verify("not-a-jwt"), Err(AccessTokenError::Malformed));
    }
}
