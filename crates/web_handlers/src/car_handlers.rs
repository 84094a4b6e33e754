use actix_web::{HttpResponse, Result, web};
use documents::Database;
use identity::AuthenticatedUser;
use validator::Validate;

use crate::car_service::CarService;
use crate::rental_types::*;

/// Lists a new car for the authenticated provider
pub async fn create_car(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    request: web::Json<CreateCarRequest>,
) -> Result<HttpResponse, RentalError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let car_service = CarService::new(db.cars());
    let result = car_service.create_car(&user.0, &request).await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Lists cars, filtered by `email` and/or `search`
pub async fn list_cars(
    db: web::Data<Database>,
    query: web::Query<CarsQuery>,
) -> Result<HttpResponse, RentalError> {
    let car_service = CarService::new(db.cars());
    let cars = car_service.list_cars(&query).await?;

    Ok(HttpResponse::Ok().json(cars))
}

/// Lists the cars of one provider
pub async fn list_provider_cars(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, RentalError> {
    let query = CarsQuery {
        email: Some(path.into_inner()),
        search: None,
    };
    let car_service = CarService::new(db.cars());
    let cars = car_service.list_cars(&query).await?;

    Ok(HttpResponse::Ok().json(cars))
}

/// Gets a specific car by ID
pub async fn get_car(
    db: web::Data<Database>,
    path: web::Path<String>,
) -> Result<HttpResponse, RentalError> {
    let car_service = CarService::new(db.cars());
    let car = car_service.get_car(&path).await?;

    Ok(HttpResponse::Ok().json(car))
}

/// Updates a car owned by the authenticated provider
pub async fn update_car(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    request: web::Json<UpdateCarRequest>,
) -> Result<HttpResponse, RentalError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let car_service = CarService::new(db.cars());
    let result = car_service.update_car(&user.0, &path, &request).await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Updates the status of a car owned by the authenticated provider
pub async fn update_car_status(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    request: web::Json<UpdateCarStatusRequest>,
) -> Result<HttpResponse, RentalError> {
    let car_service = CarService::new(db.cars());
    let result = car_service
        .update_car_status(&user.0, &path, request.status)
        .await?;

    Ok(HttpResponse::Ok().json(result))
}

/// Deletes a car owned by the authenticated provider
pub async fn delete_car(
    db: web::Data<Database>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> Result<HttpResponse, RentalError> {
    let car_service = CarService::new(db.cars());
    let result = car_service.delete_car(&user.0, &path).await?;

    Ok(HttpResponse::Ok().json(result))
}
