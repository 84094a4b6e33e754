use std::sync::Arc;

use chrono::Utc;
use documents::{
    DeleteResult, Document, DocumentFilter, DocumentStore, InsertOneResult, UpdateResult,
};
use identity::CallerIdentity;
use serde_json::Value;
use uuid::Uuid;

use crate::rental_types::*;

/// Owner field of a car listing.
pub const PROVIDER_EMAIL_FIELD: &str = "providerEmail";
/// Display name field of a car listing.
pub const CAR_NAME_FIELD: &str = "carName";
/// Availability field of a car listing.
pub const STATUS_FIELD: &str = "status";
/// Creation timestamp stamped on cars and bookings.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// Parses a path identifier; malformed identifiers never match a document.
pub fn parse_document_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id.trim()).ok()
}

/// Service for car listings
pub struct CarService {
    cars: Arc<dyn DocumentStore>,
}

impl CarService {
    /// Creates a new instance of `CarService` over the cars collection
    pub fn new(cars: Arc<dyn DocumentStore>) -> Self {
        Self { cars }
    }

    /// Lists a new car owned by the caller
    pub async fn create_car(
        &self,
        caller: &CallerIdentity,
        request: &CreateCarRequest,
    ) -> Result<InsertOneResult, RentalError> {
        if let Some(email) = non_blank(&request.provider_email) {
            if !caller.owns_email(email) {
                return Err(RentalError::NotOwner(
                    "Cars can only be listed under your own email".to_string(),
                ));
            }
        }

        let mut doc = to_document(request)?;
        doc.insert(
            PROVIDER_EMAIL_FIELD.to_string(),
            Value::String(normalize_email(&caller.email)),
        );
        doc.insert(
            CREATED_AT_FIELD.to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let result = self.cars.insert_one(doc).await?;
        log::info!("🚗 Car {} listed by {}", result.inserted_id, caller.email);

        Ok(result)
    }

    /// Gets a car by ID
    pub async fn get_car(&self, id: &str) -> Result<Document, RentalError> {
        let id = parse_document_id(id).ok_or(RentalError::CarNotFound)?;

        self.cars
            .find_by_id(&id)
            .await?
            .ok_or(RentalError::CarNotFound)
    }

    /// Lists cars, optionally narrowed to one provider and/or a name fragment
    pub async fn list_cars(&self, query: &CarsQuery) -> Result<Vec<Document>, RentalError> {
        let mut filter = DocumentFilter::new();

        if let Some(email) = non_blank(&query.email) {
            filter = filter.equals(PROVIDER_EMAIL_FIELD, normalize_email(email));
        }
        if let Some(search) = non_blank(&query.search) {
            filter = filter.contains(CAR_NAME_FIELD, search);
        }

        Ok(self.cars.find(&filter).await?)
    }

    /// Overwrites the supplied fields of a car owned by the caller
    pub async fn update_car(
        &self,
        caller: &CallerIdentity,
        id: &str,
        request: &UpdateCarRequest,
    ) -> Result<UpdateResult, RentalError> {
        let id = self.owned_car(caller, id).await?;

        if let Some(email) = non_blank(&request.provider_email) {
            if !caller.owns_email(email) {
                return Err(RentalError::NotOwner(
                    "Car listings cannot be transferred to another provider".to_string(),
                ));
            }
        }

        let mut fields = to_document(request)?;
        fields.remove(PROVIDER_EMAIL_FIELD);
        fields.remove(CREATED_AT_FIELD);

        self.apply(&id, fields).await
    }

    /// Sets the status of a car owned by the caller
    pub async fn update_car_status(
        &self,
        caller: &CallerIdentity,
        id: &str,
        status: CarStatus,
    ) -> Result<UpdateResult, RentalError> {
        let id = self.owned_car(caller, id).await?;

        let mut fields = Document::new();
        fields.insert(
            STATUS_FIELD.to_string(),
            Value::String(status.as_str().to_string()),
        );

        self.apply(&id, fields).await
    }

    /// Deletes a car owned by the caller. Bookings of the car are left in place.
    pub async fn delete_car(
        &self,
        caller: &CallerIdentity,
        id: &str,
    ) -> Result<DeleteResult, RentalError> {
        let id = self.owned_car(caller, id).await?;

        let result = self.cars.delete_by_id(&id).await?;
        if result.deleted_count == 0 {
            return Err(RentalError::CarNotFound);
        }

        log::info!("🗑️ Car {} deleted by {}", id, caller.email);
        Ok(result)
    }

    /// Loads a car and checks that the caller is its provider
    async fn owned_car(&self, caller: &CallerIdentity, id: &str) -> Result<Uuid, RentalError> {
        let id = parse_document_id(id).ok_or(RentalError::CarNotFound)?;
        let car = self
            .cars
            .find_by_id(&id)
            .await?
            .ok_or(RentalError::CarNotFound)?;

        let provider = car
            .get(PROVIDER_EMAIL_FIELD)
            .and_then(Value::as_str)
            .unwrap_or_default();

        if !caller.owns_email(provider) {
            log::warn!(
                "🚫 {} attempted to modify car {} owned by {}",
                caller.email,
                id,
                provider
            );
            return Err(RentalError::NotOwner(
                "You are not authorized to modify this car".to_string(),
            ));
        }

        Ok(id)
    }

    async fn apply(&self, id: &Uuid, fields: Document) -> Result<UpdateResult, RentalError> {
        let result = self.cars.update_by_id(id, fields).await?;

        // Deleted between the ownership check and the write.
        if result.matched_count == 0 {
            return Err(RentalError::CarNotFound);
        }

        Ok(result)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
