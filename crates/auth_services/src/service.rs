use bcrypt::{DEFAULT_COST, hash, verify};
use campspot_core::UserId;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::jwt::refresh_token_fingerprint;
use crate::types::{
    AuthError, ResetPasswordRequest, SignUpRequest, UpdateProfileRequest, User,
    normalize_security_answer,
};

const USER_COLUMNS: &str = "id, user_name, email, password_hash, security_question, \
     security_answer_hash, role, created_at, updated_at";

const SESSION_TTL_DAYS: i64 = 30;

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        user_name: row.get("user_name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        security_question: row.get("security_question"),
        security_answer_hash: row.get("security_answer_hash"),
        role: row.get("role"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// A service for handling user authentication operations such as creating users,
/// retrieving user information, verifying credentials, and managing sessions.
#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
}

impl AuthService {
    /// Creates a new instance of `AuthService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a new user in the database with the provided sign-up request.
    pub async fn create_user(&self, request: &SignUpRequest) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();

        let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&self.pool)
            .await?;

        if existing_user.is_some() {
            return Err(AuthError::EmailExists);
        }

        let password_hash = hash(&request.password, DEFAULT_COST)?;
        let answer_hash = hash(
            normalize_security_answer(&request.security_answer),
            DEFAULT_COST,
        )?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO users (
                user_name, email, password_hash, security_question, security_answer_hash
            ) VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.user_name.trim())
        .bind(&email)
        .bind(&password_hash)
        .bind(request.security_question.trim())
        .bind(&answer_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // a concurrent sign-up can pass the check above
            if is_unique_violation(&e) {
                AuthError::EmailExists
            } else {
                AuthError::Database(e)
            }
        })?;

        let user = user_from_row(&row);
        log::info!("Created user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Retrieves a user by their email address, returning `None` if not found.
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Retrieves a user by their ID, returning `None` if not found.
    pub async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Verifies the user's password against the stored hash.
    pub async fn verify_password(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Stores a session under `session_id` holding a hash of the refresh token.
    ///
    /// The user's expired sessions are deleted first.
    pub async fn create_session(
        &self,
        session_id: Uuid,
        user_id: UserId,
        refresh_token: &str,
    ) -> Result<(), AuthError> {
        let refresh_token_hash = hash(refresh_token_fingerprint(refresh_token), DEFAULT_COST)?;

        let mut tx = self.pool.begin().await?;
        let pruned =
            sqlx::query("DELETE FROM user_sessions WHERE user_id = $1 AND expires_at <= NOW()")
                .bind(user_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        sqlx::query(
            r#"
            INSERT INTO user_sessions (id, user_id, refresh_token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .bind(&refresh_token_hash)
        .bind(Utc::now() + chrono::Duration::days(SESSION_TTL_DAYS))
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        if pruned > 0 {
            log::debug!("Pruned {} expired sessions for user {}", pruned, user_id);
        }
        Ok(())
    }

    /// Succeeds when `refresh_token` matches the unexpired session `session_id`
    pub async fn verify_refresh_token(
        &self,
        user_id: UserId,
        session_id: Uuid,
        refresh_token: &str,
    ) -> Result<User, AuthError> {
        let row = sqlx::query(
            r#"
            SELECT refresh_token_hash FROM user_sessions
            WHERE id = $1 AND user_id = $2 AND expires_at > NOW()
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AuthError::InvalidRefreshToken)?;

        let stored: String = row.get("refresh_token_hash");
        if !verify(refresh_token_fingerprint(refresh_token), &stored)? {
            return Err(AuthError::InvalidRefreshToken);
        }

        self.get_user_by_id(user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)
    }

    /// Returns the security question of the account registered under `email`
    pub async fn security_question(&self, email: &str) -> Result<String, AuthError> {
        let user = self
            .get_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.security_question)
    }

    /// Replaces the password when the security answer matches.
    ///
    /// Existing sessions are revoked.
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), AuthError> {
        let user = self
            .get_user_by_email(&request.email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let answer = normalize_security_answer(&request.security_answer);
        if !verify(answer, &user.security_answer_hash)? {
            log::warn!("Wrong security answer for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let password_hash = hash(&request.new_password, DEFAULT_COST)?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM user_sessions WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        log::info!("Password reset for user {}", user.id);
        Ok(())
    }

    /// Updates the user's profile information
    pub async fn update_user_profile(
        &self,
        user_id: UserId,
        request: &UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET user_name = $1,
                email = $2,
                updated_at = NOW()
            WHERE id = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(request.user_name.trim())
        .bind(request.email.trim().to_lowercase())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::EmailExists
            } else {
                AuthError::Database(e)
            }
        })?;

        row.as_ref()
            .map(user_from_row)
            .ok_or(AuthError::UserNotFound)
    }
}
