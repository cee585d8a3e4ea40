use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use auth_services::service::AuthService;
use auth_services::types::*;

/// Handles user profile retrieval for the authenticated user.
pub async fn get_profile(
    auth_service: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AuthError> {
    let user = auth_service
        .get_user_by_id(user.identity().user_id)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    Ok(HttpResponse::Ok().json(UserInfo::from(user)))
}

/// Handles user profile update by validating the request and storing the new values.
pub async fn update_profile(
    auth_service: web::Data<AuthService>,
    user: AuthenticatedUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AuthError> {
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let updated_user = auth_service
        .update_user_profile(user.identity().user_id, &request)
        .await?;

    Ok(HttpResponse::Ok().json(UserInfo::from(updated_user)))
}
