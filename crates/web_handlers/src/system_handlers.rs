use actix_web::{HttpResponse, Result, web};
use documents::Database;

/// Banner served at the root path
pub async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Rental Wheels Server is running")
}

/// Health check endpoint; reports the document store as unavailable when it cannot be reached
pub async fn health(db: web::Data<Database>) -> Result<HttpResponse> {
    match db.ping().await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "service": "rental-wheels",
            "status": "healthy",
            "timestamp": chrono::Utc::now()
        }))),
        Err(e) => {
            log::error!("❌ Health check failed: {}", e);
            Ok(HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "service": "rental-wheels",
                "status": "unavailable",
                "timestamp": chrono::Utc::now()
            })))
        }
    }
}
