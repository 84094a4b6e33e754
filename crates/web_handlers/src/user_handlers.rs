use actix_web::{HttpResponse, Result, web};
use documents::Database;
use validator::Validate;

use crate::rental_types::*;
use crate::user_service::UserService;

/// Lists every user record
pub async fn list_users(db: web::Data<Database>) -> Result<HttpResponse, RentalError> {
    let user_service = UserService::new(db.users());
    let users = user_service.list_users().await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Creates the user record for an email, or updates it if one exists
pub async fn upsert_user(
    db: web::Data<Database>,
    request: web::Json<UpsertUserRequest>,
) -> Result<HttpResponse, RentalError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let user_service = UserService::new(db.users());
    let result = user_service.upsert_user(&request).await?;

    Ok(HttpResponse::Ok().json(result))
}
