use std::sync::Arc;

use chrono::Utc;
use documents::{DeleteResult, Document, DocumentFilter, DocumentStore, InsertOneResult};
use identity::CallerIdentity;
use serde_json::Value;

use crate::car_service::{CREATED_AT_FIELD, parse_document_id};
use crate::rental_types::*;

/// Owner field of a booking.
pub const RENTER_ID_FIELD: &str = "renterId";
/// Field referencing the booked car.
pub const CAR_ID_FIELD: &str = "carId";

/// Service for bookings
pub struct BookingService {
    bookings: Arc<dyn DocumentStore>,
    cars: Arc<dyn DocumentStore>,
}

impl BookingService {
    /// Creates a new instance of `BookingService` over the bookings and cars collections
    pub fn new(bookings: Arc<dyn DocumentStore>, cars: Arc<dyn DocumentStore>) -> Self {
        Self { bookings, cars }
    }

    /// Books a car for the caller
    pub async fn create_booking(
        &self,
        caller: &CallerIdentity,
        request: &CreateBookingRequest,
    ) -> Result<InsertOneResult, RentalError> {
        if let Some(renter_id) = non_blank(&request.renter_id) {
            if renter_id != caller.uid {
                return Err(RentalError::NotOwner(
                    "Bookings can only be made for yourself".to_string(),
                ));
            }
        }

        if let (Some(start), Some(end)) = (request.start_date, request.end_date) {
            if end <= start {
                return Err(RentalError::InvalidDateRange);
            }
        }

        let car_id = parse_document_id(&request.car_id).ok_or(RentalError::CarNotFound)?;
        if self.cars.find_by_id(&car_id).await?.is_none() {
            return Err(RentalError::CarNotFound);
        }

        let mut doc = to_document(request)?;
        doc.insert(CAR_ID_FIELD.to_string(), Value::String(car_id.to_string()));
        doc.insert(
            RENTER_ID_FIELD.to_string(),
            Value::String(caller.uid.clone()),
        );
        doc.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let result = self.bookings.insert_one(doc).await?;
        log::info!(
            "📅 Booking {} created for car {} by {}",
            result.inserted_id,
            car_id,
            caller.uid
        );

        Ok(result)
    }

    /// Lists the caller's bookings
    pub async fn list_bookings(
        &self,
        caller: &CallerIdentity,
        query: &BookingsQuery,
    ) -> Result<Vec<Document>, RentalError> {
        if let Some(renter_id) = non_blank(&query.renter_id) {
            if renter_id != caller.uid {
                return Err(RentalError::NotOwner(
                    "You can only list your own bookings".to_string(),
                ));
            }
        }

        let filter = DocumentFilter::new().equals(RENTER_ID_FIELD, caller.uid.clone());
        Ok(self.bookings.find(&filter).await?)
    }

    /// Deletes a booking made by the caller
    pub async fn delete_booking(
        &self,
        caller: &CallerIdentity,
        id: &str,
    ) -> Result<DeleteResult, RentalError> {
        let id = parse_document_id(id).ok_or(RentalError::BookingNotFound)?;
        let booking = self
            .bookings
            .find_by_id(&id)
            .await?
            .ok_or(RentalError::BookingNotFound)?;

        let renter = booking
            .get(RENTER_ID_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();

        if renter != caller.uid {
            log::warn!(
                "🚫 {} attempted to delete booking {} of {}",
                caller.uid,
                id,
                renter
            );
            return Err(RentalError::NotOwner(
                "You are not authorized to delete this booking".to_string(),
            ));
        }

        let result = self.bookings.delete_by_id(&id).await?;
        if result.deleted_count == 0 {
            return Err(RentalError::BookingNotFound);
        }

        Ok(result)
    }
}
