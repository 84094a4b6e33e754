use actix_web::{HttpResponse, Result, web};
use documents::Database;
use identity::AuthenticatedUser;
use validator::Validate;

use crate::booking_service::BookingService;
use crate::rental_types::*;

/// Books a car for the authenticated renter
pub async fn create_booking(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse, RentalError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let booking_service = BookingService::new(db.bookings(), db.cars());
    let result = booking_service.create_booking(&user.0, &request).await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Lists the authenticated renter's bookings
pub async fn list_bookings(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    query: web::Query<BookingsQuery>,
) -> Result<HttpResponse, RentalError> {
    let booking_service = BookingService::new(db.bookings(), db.cars());
    let bookings = booking_service.list_bookings(&user.0, &query).await?;

    Ok(HttpResponse::Ok().json(bookings))
}

/// Deletes a booking made by the authenticated renter
pub async fn delete_booking(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, RentalError> {
    let booking_service = BookingService::new(db.bookings(), db.cars());
    let result = booking_service.delete_booking(&user.0, &path).await?;

    Ok(HttpResponse::Ok().json(result))
}
