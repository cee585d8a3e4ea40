use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use campspot_core::CoreError;

/// HTTP rendering of a [`CoreError`]
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub CoreError);

impl ApiError {
    /// Wraps request validation failures
    pub fn validation(errors: validator::ValidationErrors) -> Self {
        ApiError(CoreError::Validation(errors.to_string()))
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            CoreError::NotFound(_) => "not_found",
            CoreError::Conflict(_) => "conflict",
            CoreError::Forbidden(_) => "forbidden",
            CoreError::InvalidRange => "invalid_range",
            CoreError::Validation(_) => "validation_error",
            CoreError::Database(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoreError::NotFound(_) => StatusCode::NOT_FOUND,
            CoreError::Conflict(_) => StatusCode::CONFLICT,
            CoreError::Forbidden(_) => StatusCode::FORBIDDEN,
            CoreError::InvalidRange | CoreError::Validation(_) => StatusCode::BAD_REQUEST,
            CoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match &self.0 {
            CoreError::Database(e) => {
                log::error!("Database error: {}", e);
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.code(),
            "message": message
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campspot_core::{ConflictKind, Entity, ForbiddenReason};

    #[test]
    fn maps_core_errors_to_statuses() {
        let cases = [
            (CoreError::NotFound(Entity::Spot), StatusCode::NOT_FOUND),
            (CoreError::Conflict(ConflictKind::Overlap), StatusCode::CONFLICT),
            (
                CoreError::Forbidden(ForbiddenReason::SelfBooking),
                StatusCode::FORBIDDEN,
            ),
            (CoreError::InvalidRange, StatusCode::BAD_REQUEST),
            (CoreError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                CoreError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError(error).error_response().status(), status);
        }
    }

    #[actix_web::test]
    async fn hides_database_details() {
        let response = ApiError(CoreError::Database(sqlx::Error::PoolTimedOut)).error_response();
        let body = actix_web::body::to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(body["error"], "internal_error");
        assert_eq!(body["message"], "An internal error occurred");
    }
}
