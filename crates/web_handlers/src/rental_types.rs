use chrono::NaiveDate;
use documents::{Document, StoreError};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Availability state of a car listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    /// Listed and free to book
    #[default]
    Available,
    /// Reserved by a renter
    Booked,
    /// Temporarily withdrawn for servicing
    Maintenance,
    /// Withdrawn by the provider
    Unavailable,
}

impl CarStatus {
    /// The value stored in the `status` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Booked => "booked",
            CarStatus::Maintenance => "maintenance",
            CarStatus::Unavailable => "unavailable",
        }
    }
}

/// Request structure for creating or updating a user record
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpsertUserRequest {
    /// Email address identifying the user
    #[validate(email(message = "Please enter a valid email"))]
    pub email: String,

    /// Any other profile fields supplied by the client
    #[serde(flatten)]
    pub profile: Document,
}

/// Request structure for listing a new car
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarRequest {
    /// Display name of the car
    #[validate(length(min = 1, max = 255, message = "Car name is required"))]
    pub car_name: String,

    /// Initial availability, `available` when omitted
    #[serde(default)]
    pub status: CarStatus,

    /// Provider email; must match the caller when supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_email: Option<String>,

    /// Remaining listing fields (price, location, images, ...)
    #[serde(flatten)]
    pub details: Document,
}

/// Request structure for updating a car listing
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarRequest {
    /// New display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Car name cannot be empty"))]
    pub car_name: Option<String>,

    /// New availability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<CarStatus>,

    /// Provider email; listings cannot change hands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_email: Option<String>,

    /// Remaining listing fields to overwrite
    #[serde(flatten)]
    pub details: Document,
}

/// Request structure for changing only a car's status
#[derive(Debug, Deserialize)]
pub struct UpdateCarStatusRequest {
    /// New availability
    pub status: CarStatus,
}

/// Request structure for booking a car
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// ID of the booked car
    #[validate(length(min = 1, message = "Car ID is required"))]
    pub car_id: String,

    /// Renter ID; must match the caller when supplied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renter_id: Option<String>,

    /// First day of the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    /// Last day of the trip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,

    /// Remaining trip fields (pickup location, notes, ...)
    #[serde(flatten)]
    pub trip: Document,
}

/// Query parameters for listing cars
#[derive(Debug, Default, Deserialize)]
pub struct CarsQuery {
    /// Exact provider email
    pub email: Option<String>,
    /// Case-insensitive fragment of the car name
    pub search: Option<String>,
}

/// Query parameters for listing bookings
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsQuery {
    /// Renter whose bookings to list
    pub renter_id: Option<String>,
}

/// Treats a blank query parameter as absent.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Serializes a request into the document that gets stored.
pub fn to_document<T: Serialize>(request: &T) -> Result<Document, RentalError> {
    match serde_json::to_value(request)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(RentalError::Validation(
            "Request body must be a JSON object".to_string(),
        )),
    }
}

/// Custom error type for rental operations
#[derive(thiserror::Error, Debug)]
pub enum RentalError {
    /// Document store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// JSON conversion error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Car not found
    #[error("Car not found")]
    CarNotFound,

    /// Booking not found
    #[error("Booking not found")]
    BookingNotFound,

    /// Caller does not own the document
    #[error("Forbidden: {0}")]
    NotOwner(String),

    /// Invalid date range
    #[error("Invalid date range: end date must be after start date")]
    InvalidDateRange,
}

impl actix_web::ResponseError for RentalError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;

        match self {
            RentalError::Validation(_) | RentalError::InvalidDateRange => StatusCode::BAD_REQUEST,
            RentalError::CarNotFound | RentalError::BookingNotFound => StatusCode::NOT_FOUND,
            RentalError::NotOwner(_) => StatusCode::FORBIDDEN,
            RentalError::Store(_) | RentalError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            RentalError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            RentalError::InvalidDateRange => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_date_range",
                "message": "End date must be after start date"
            })),
            RentalError::CarNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "car_not_found",
                "message": "Car not found"
            })),
            RentalError::BookingNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "booking_not_found",
                "message": "Booking not found"
            })),
            RentalError::NotOwner(msg) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": msg
            })),
            _ => {
                log::error!("❌ {}", self);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_car_keeps_extra_fields() {
        let request: CreateCarRequest = serde_json::from_value(json!({
            "carName": "Model 3",
            "dailyPrice": 80,
            "location": "Dhaka"
        }))
        .unwrap();

        assert_eq!(request.status, CarStatus::Available);
        assert_eq!(request.provider_email, None);

        let doc = to_document(&request).unwrap();
        assert_eq!(doc["carName"], json!("Model 3"));
        assert_eq!(doc["status"], json!("available"));
        assert_eq!(doc["dailyPrice"], json!(80));
        assert!(!doc.contains_key("providerEmail"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let result = serde_json::from_value::<UpdateCarStatusRequest>(json!({"status": "stolen"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_user_email_is_validated() {
        let request: UpsertUserRequest =
            serde_json::from_value(json!({"email": "not-an-email", "name": "A"})).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_empty_car_name_is_rejected() {
        let request: UpdateCarRequest = serde_json::from_value(json!({"carName": ""})).unwrap();
        assert!(request.validate().is_err());

        let request: UpdateCarRequest = serde_json::from_value(json!({"seats": 4})).unwrap();
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_booking_dates_are_parsed() {
        let request: CreateBookingRequest = serde_json::from_value(json!({
            "carId": "c1",
            "startDate": "2026-05-01",
            "endDate": "2026-05-04",
            "pickup": "Airport"
        }))
        .unwrap();

        assert_eq!(request.start_date, NaiveDate::from_ymd_opt(2026, 5, 1));
        assert_eq!(request.trip["pickup"], json!("Airport"));
    }

    #[test]
    fn test_blank_query_values_are_absent() {
        assert_eq!(non_blank(&Some("  ".to_string())), None);
        assert_eq!(non_blank(&None), None);
        assert_eq!(non_blank(&Some(" Tesla ".to_string())), Some("Tesla"));
    }
}
