use std::sync::Arc;

use documents::gateway::USER_KEY_FIELD;
use documents::{Document, DocumentFilter, DocumentStore, UpdateResult};
use serde_json::Value;

use crate::rental_types::*;

/// Service for the user directory
pub struct UserService {
    users: Arc<dyn DocumentStore>,
}

impl UserService {
    /// Creates a new instance of `UserService` over the users collection
    pub fn new(users: Arc<dyn DocumentStore>) -> Self {
        Self { users }
    }

    /// Lists every user record
    pub async fn list_users(&self) -> Result<Vec<Document>, RentalError> {
        Ok(self.users.find(&DocumentFilter::new()).await?)
    }

    /// Inserts the user, or overwrites the supplied fields of the record with the same email
    pub async fn upsert_user(
        &self,
        request: &UpsertUserRequest,
    ) -> Result<UpdateResult, RentalError> {
        let email = request.email.trim().to_lowercase();

        let mut doc = to_document(request)?;
        doc.insert(USER_KEY_FIELD.to_string(), Value::String(email.clone()));

        let result = self.users.upsert_by_key(USER_KEY_FIELD, doc).await?;
        if result.upserted_count > 0 {
            log::info!("👤 New user registered: {}", email);
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use documents::MemoryDocumentStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_same_email_is_stored_once() {
        let service = UserService::new(Arc::new(MemoryDocumentStore::new()));

        let first = service
            .upsert_user(&body(json!({"email": "A@x.com", "name": "A"})))
            .await
            .unwrap();
        assert_eq!(first.upserted_count, 1);

        let second = service
            .upsert_user(&body(json!({"email": "a@x.com ", "name": "Alice", "photo": "p.png"})))
            .await
            .unwrap();
        assert_eq!(second.upserted_count, 0);
        assert_eq!(second.matched_count, 1);

        let users = service.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(field(&users[0], "email"), "a@x.com");
        assert_eq!(field(&users[0], "name"), "Alice");
        assert_eq!(field(&users[0], "photo"), "p.png");
    }

    #[tokio::test]
    async fn test_resubmitting_same_fields_modifies_nothing() {
        let service = UserService::new(Arc::new(MemoryDocumentStore::new()));
        let request: UpsertUserRequest = body(json!({"email": "a@x.com", "name": "A"}));

        service.upsert_user(&request).await.unwrap();
        let again = service.upsert_user(&request).await.unwrap();

        assert_eq!(again.matched_count, 1);
        assert_eq!(again.modified_count, 0);
    }
}
