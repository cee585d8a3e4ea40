use campspot_core::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request structure for user sign-up
#[derive(Debug, Deserialize, Validate)]
pub struct SignUpRequest {
    /// Display name of the user
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub user_name: String,

    /// Email address of the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Question asked before a password reset
    #[validate(length(min = 1, max = 255, message = "Security question is required"))]
    pub security_question: String,

    /// Answer to the security question
    #[validate(length(min = 1, max = 255, message = "Security answer is required"))]
    pub security_answer: String,
}

/// Request structure for user login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address of the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Password for the user account
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Request structure for exchanging a refresh token
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    /// Refresh token issued at login or sign-up
    pub refresh_token: String,
}

/// Query string for looking up a security question
#[derive(Debug, Deserialize)]
pub struct SecurityQuestionQuery {
    /// Email address of the account
    pub email: String,
}

/// Response carrying the security question of an account
#[derive(Debug, Serialize)]
pub struct SecurityQuestionResponse {
    /// The stored question
    pub security_question: String,
}

/// Request structure for resetting a forgotten password
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Email address of the account
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Answer to the security question
    #[validate(length(min = 1, message = "Security answer is required"))]
    pub security_answer: String,

    /// Replacement password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// Request structure for updating user profile
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    /// Display name of the user
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub user_name: String,

    /// Email address of the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,
}

/// Response structure for user authentication
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Access token for the user
    pub access_token: String,
    /// Refresh token for the user
    pub refresh_token: String,
    /// User information
    pub user: UserInfo,
}

/// Response structure for a refreshed access token
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Newly issued access token
    pub access_token: String,
}

/// Information about the user, used in responses
#[derive(Debug, Serialize)]
pub struct UserInfo {
    /// Unique identifier for the user
    pub id: UserId,
    /// Display name of the user
    pub user_name: String,
    /// Email address of the user
    pub email: String,
    /// Role of the user
    pub role: String,
    /// Time at which the user was created
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            user_name: user.user_name,
            email: user.email,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// User model representing the database schema
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for the user
    pub id: UserId,
    /// Display name of the user
    pub user_name: String,
    /// Email address of the user, stored lowercased
    pub email: String,
    /// Hashed password of the user
    pub password_hash: String,
    /// Question asked before a password reset
    pub security_question: String,
    /// Hash of the normalized security answer
    pub security_answer_hash: String,
    /// Role of the user (e.g., "user", "admin")
    pub role: String,
    /// Timestamp when the user was created
    pub created_at: DateTime<Utc>,
    /// Timestamp when the user was last updated
    pub updated_at: DateTime<Utc>,
}

/// Purpose of a signed token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Bearer credential for protected routes
    Access,
    /// Only exchangeable for a new access token
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject of the token, the user ID
    pub sub: String,
    /// Email address of the user, empty on refresh tokens
    pub email: String,
    /// Role of the user, empty on refresh tokens
    pub role: String,
    /// Whether this is an access or a refresh token
    pub typ: TokenType,
    /// Session backing a refresh token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<Uuid>,
    /// Expiration timestamp of the token
    pub exp: usize,
    /// Issued at timestamp of the token
    pub iat: usize,
}

/// Custom error type for authentication-related errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The email address already exists in the system
    #[error("Email already exists")]
    EmailExists,

    /// The provided credentials are invalid
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// The refresh token is unknown, expired or malformed
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The user was not found in the system
    #[error("User not found")]
    UserNotFound,

    /// An internal server error occurred
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An error occurred while hashing the password
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// An error occurred while signing or decoding a token
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// An error occurred while validating input data
    #[error("Validation error: {0}")]
    Validation(String),
}

impl actix_web::ResponseError for AuthError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            AuthError::EmailExists => HttpResponse::Conflict().json(serde_json::json!({
                "error": "email_exists",
                "message": "An account with this email already exists"
            })),
            AuthError::InvalidCredentials => HttpResponse::Unauthorized().json(serde_json::json!({
                "error": "invalid_credentials",
                "message": "Invalid email or password"
            })),
            AuthError::InvalidRefreshToken => {
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "invalid_token",
                    "message": "Invalid or expired refresh token"
                }))
            }
            AuthError::UserNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "user_not_found",
                "message": "User not found"
            })),
            AuthError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            _ => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "internal_error",
                "message": "An internal error occurred"
            })),
        }
    }
}

/// Canonical form of a security answer before hashing or comparison
pub fn normalize_security_answer(answer: &str) -> String {
    answer.trim().to_lowercase()
}
