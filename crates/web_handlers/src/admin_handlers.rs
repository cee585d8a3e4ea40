use actix_web::{HttpResponse, Result};

/// Liveness probe for the whole server
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}

/// Health check endpoint for auth service
pub async fn auth_health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "service": "auth",
        "status": "healthy",
        "timestamp": chrono::Utc::now()
    })))
}
