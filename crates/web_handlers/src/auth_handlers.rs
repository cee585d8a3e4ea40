use actix_web::{HttpResponse, Result, web};
use uuid::Uuid;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::service::AuthService;
use auth_services::types::*;

async fn issue_tokens(
    auth_service: &AuthService,
    jwt_service: &JwtService,
    user: User,
) -> Result<AuthResponse, AuthError> {
    let access_token = jwt_service.generate_access_token(&user)?;
    let session_id = Uuid::new_v4();
    let refresh_token = jwt_service.generate_refresh_token(user.id, session_id)?;
    auth_service
        .create_session(session_id, user.id, &refresh_token)
        .await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

/// Handles user signup by validating the request, creating a new user,
/// and returning the user info with a fresh pair of tokens.
pub async fn signup(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let user = auth_service.create_user(&request).await?;
    let response = issue_tokens(&auth_service, &jwt_service, user).await?;

    Ok(HttpResponse::Created().json(response))
}

/// Handles user login by verifying credentials and issuing tokens.
pub async fn login(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let user = auth_service
        .verify_password(&request.email, &request.password)
        .await?;
    let response = issue_tokens(&auth_service, &jwt_service, user).await?;

    Ok(HttpResponse::Ok().json(response))
}

/// Exchanges a refresh token backed by a live session for a new access token.
pub async fn refresh(
    auth_service: web::Data<AuthService>,
    jwt_service: web::Data<JwtService>,
    request: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AuthError> {
    let (user_id, session_id) = jwt_service
        .extract_refresh_session(&request.refresh_token)
        .map_err(|_| AuthError::InvalidRefreshToken)?;

    let user = auth_service
        .verify_refresh_token(user_id, session_id, &request.refresh_token)
        .await?;
    let access_token = jwt_service.generate_access_token(&user)?;

    Ok(HttpResponse::Ok().json(RefreshResponse { access_token }))
}

/// Returns the security question of an account, the first step of a reset.
pub async fn security_question(
    auth_service: web::Data<AuthService>,
    query: web::Query<SecurityQuestionQuery>,
) -> Result<HttpResponse, AuthError> {
    let security_question = auth_service.security_question(&query.email).await?;

    Ok(HttpResponse::Ok().json(SecurityQuestionResponse { security_question }))
}

/// Sets a new password after checking the security answer.
pub async fn reset_password(
    auth_service: web::Data<AuthService>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    auth_service.reset_password(&request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Password has been reset"
    })))
}
