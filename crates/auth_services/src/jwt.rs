use campspot_core::UserId;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use uuid::Uuid;

use crate::types::{AuthError, Claims, TokenType, User};

const ACCESS_TOKEN_TTL_HOURS: i64 = 1;
const REFRESH_TOKEN_TTL_DAYS: i64 = 30;

/// Issues and verifies HS256 tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Creates a service signing with `secret`
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    /// Reads the signing secret from `JWT_SECRET`
    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            log::warn!("JWT_SECRET is not set, using the development secret");
            "your-secret-key-change-this-in-production".to_string()
        });
        Self::new(&secret)
    }

    /// Issues a short-lived access token carrying the user's email and role
    pub fn generate_access_token(&self, user: &User) -> Result<String, AuthError> {
        self.sign(
            Claims {
                sub: user.id.to_string(),
                email: user.email.clone(),
                role: user.role.clone(),
                typ: TokenType::Access,
                sid: None,
                exp: 0,
                iat: 0,
            },
            Duration::hours(ACCESS_TOKEN_TTL_HOURS),
        )
    }

    /// Issues a long-lived refresh token bound to `session_id`
    pub fn generate_refresh_token(
        &self,
        user_id: UserId,
        session_id: Uuid,
    ) -> Result<String, AuthError> {
        self.sign(
            Claims {
                sub: user_id.to_string(),
                email: String::new(),
                role: String::new(),
                typ: TokenType::Refresh,
                sid: Some(session_id),
                exp: 0,
                iat: 0,
            },
            Duration::days(REFRESH_TOKEN_TTL_DAYS),
        )
    }

    fn sign(&self, mut claims: Claims, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        claims.iat = now.timestamp() as usize;
        claims.exp = (now + ttl).timestamp() as usize;

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Checks the signature and expiry of a token
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data = decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }

    /// Verifies an access token and returns the user ID in its subject.
    ///
    /// Refresh tokens are rejected.
    pub fn extract_user_id_from_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.verify_token(token)?;
        if claims.typ != TokenType::Access {
            return Err(invalid_token());
        }

        parse_subject(&claims)
    }

    /// Verifies a refresh token and returns its user ID and session ID
    pub fn extract_refresh_session(&self, token: &str) -> Result<(UserId, Uuid), AuthError> {
        let claims = self.verify_token(token)?;
        let session_id = match (claims.typ, claims.sid) {
            (TokenType::Refresh, Some(session_id)) => session_id,
            _ => return Err(invalid_token()),
        };

        Ok((parse_subject(&claims)?, session_id))
    }
}

fn invalid_token() -> AuthError {
    AuthError::Jwt(jsonwebtoken::errors::Error::from(
        jsonwebtoken::errors::ErrorKind::InvalidToken,
    ))
}

fn parse_subject(claims: &Claims) -> Result<UserId, AuthError> {
    claims.sub.parse::<UserId>().map_err(|_| {
        AuthError::Jwt(jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidSubject,
        ))
    })
}

/// Portion of a token that is stored hashed in a session.
///
/// bcrypt reads at most 72 bytes and the token header is shared by every
/// token, so the signature segment is used instead of the whole token.
pub fn refresh_token_fingerprint(token: &str) -> &str {
    token.rsplit('.').next().unwrap_or(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: UserId) -> User {
        User {
            id,
            user_name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: String::new(),
            security_question: String::new(),
            security_answer_hash: String::new(),
            role: "user".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn access_token_round_trip() {
        let jwt = JwtService::new("test-secret");
        let token = jwt.generate_access_token(&user(42)).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.email, "dana@example.com");
        assert_eq!(claims.role, "user");
        assert_eq!(jwt.extract_user_id_from_token(&token).unwrap(), 42);
    }

    #[test]
    fn refresh_token_carries_subject_and_session() {
        let jwt = JwtService::new("test-secret");
        let session_id = Uuid::new_v4();
        let token = jwt.generate_refresh_token(7, session_id).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.typ, TokenType::Refresh);
        assert!(claims.email.is_empty());
        assert!(claims.exp > claims.iat + 29 * 24 * 3600);
        assert_eq!(jwt.extract_refresh_session(&token).unwrap(), (7, session_id));
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let jwt = JwtService::new("test-secret");
        let access = jwt.generate_access_token(&user(3)).unwrap();
        let refresh = jwt.generate_refresh_token(3, Uuid::new_v4()).unwrap();

        assert!(jwt.extract_user_id_from_token(&refresh).is_err());
        assert!(jwt.extract_refresh_session(&access).is_err());
    }

    #[test]
    fn rejects_foreign_and_garbage_tokens() {
        let issuer = JwtService::new("one-secret");
        let verifier = JwtService::new("another-secret");
        let token = issuer.generate_access_token(&user(1)).unwrap();

        assert!(verifier.verify_token(&token).is_err());
        assert!(verifier.extract_user_id_from_token("not.a.token").is_err());
    }

    #[test]
    fn fingerprint_is_signature_segment() {
        assert_eq!(refresh_token_fingerprint("aaa.bbb.ccc"), "ccc");
        assert_eq!(refresh_token_fingerprint("opaque"), "opaque");
    }
}
