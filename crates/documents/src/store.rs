use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// A schema-less JSON document.
pub type Document = serde_json::Map<String, Value>;

/// Field under which a document's generated identifier is returned.
pub const ID_FIELD: &str = "_id";

/// Errors raised by document stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored document could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An upsert was requested for a document lacking its key field
    #[error("Document is missing the string field `{0}`")]
    MissingKey(String),

    /// A collection or field name is not a plain identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
}

/// Conjunction of field predicates used to select documents.
///
/// An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    /// Exact string matches: `(field, value)`
    pub equals: Vec<(String, String)>,
    /// Case-insensitive substring matches: `(field, needle)`
    pub contains: Vec<(String, String)>,
}

impl DocumentFilter {
    /// Creates an empty filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value` exactly.
    pub fn equals(mut self, field: &str, value: impl Into<String>) -> Self {
        self.equals.push((field.to_string(), value.into()));
        self
    }

    /// Requires `field` to contain `needle`, ignoring case.
    pub fn contains(mut self, field: &str, needle: impl Into<String>) -> Self {
        self.contains.push((field.to_string(), needle.into()));
        self
    }

    /// Evaluates the filter against a document held in memory.
    pub fn matches(&self, doc: &Document) -> bool {
        let field_str = |field: &str| doc.get(field).and_then(Value::as_str);

        let equal = self
            .equals
            .iter()
            .all(|(field, value)| field_str(field) == Some(value.as_str()));

        let contained = self.contains.iter().all(|(field, needle)| {
            field_str(field)
                .map(|s| s.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false)
        });

        equal && contained
    }
}

/// Result of inserting a single document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    /// Whether the write was acknowledged by the store
    pub acknowledged: bool,
    /// Identifier generated for the new document
    pub inserted_id: Uuid,
}

/// Result of an update or upsert
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// Whether the write was acknowledged by the store
    pub acknowledged: bool,
    /// Number of documents matched by the selector
    pub matched_count: u64,
    /// Number of matched documents whose content changed
    pub modified_count: u64,
    /// Number of documents inserted by an upsert
    pub upserted_count: u64,
    /// Identifier of the document inserted by an upsert
    pub upserted_id: Option<Uuid>,
}

impl UpdateResult {
    /// An update that matched `matched` documents and changed `modified` of them.
    pub fn updated(matched: u64, modified: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count: matched,
            modified_count: modified,
            upserted_count: 0,
            upserted_id: None,
        }
    }

    /// An upsert that inserted a new document.
    pub fn upserted(id: Uuid) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_count: 1,
            upserted_id: Some(id),
        }
    }
}

/// Result of a delete
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// Whether the write was acknowledged by the store
    pub acknowledged: bool,
    /// Number of documents removed
    pub deleted_count: u64,
}

/// A collection of JSON documents addressed by generated identifiers.
///
/// Writes never trust an `_id` carried in the document body; identifiers are always
/// assigned by the store. Documents read back carry their identifier under [`ID_FIELD`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new document and returns its generated identifier.
    async fn insert_one(&self, doc: Document) -> Result<InsertOneResult, StoreError>;

    /// Fetches a single document.
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Document>, StoreError>;

    /// Fetches every document matching `filter`, oldest first.
    async fn find(&self, filter: &DocumentFilter) -> Result<Vec<Document>, StoreError>;

    /// Merges `fields` over the stored document's top-level fields.
    async fn update_by_id(&self, id: &Uuid, fields: Document) -> Result<UpdateResult, StoreError>;

    /// Inserts `doc` unless a document with the same string value at `key` exists,
    /// in which case `doc` is merged over it.
    async fn upsert_by_key(&self, key: &str, doc: Document) -> Result<UpdateResult, StoreError>;

    /// Removes a single document.
    async fn delete_by_id(&self, id: &Uuid) -> Result<DeleteResult, StoreError>;

    /// Checks that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Drops any client-supplied identifier from a document about to be written.
pub(crate) fn strip_id(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc
}

/// Attaches the identifier to a document being returned.
pub(crate) fn with_id(id: &Uuid, mut doc: Document) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc
}

/// Returns the string stored at `key`, as used for upserts.
pub(crate) fn key_value(doc: &Document, key: &str) -> Result<String, StoreError> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::MissingKey(key.to_string()))
}

/// Shallow merge of `fields` into `target`; returns whether anything changed.
pub(crate) fn merge_into(target: &mut Document, fields: Document) -> bool {
    let mut changed = false;
    for (field, value) in fields {
        if target.get(&field) != Some(&value) {
            target.insert(field, value);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(DocumentFilter::new().matches(&doc(json!({"a": 1}))));
    }

    #[test]
    fn test_filter_combines_equality_and_substring() {
        let filter = DocumentFilter::new()
            .equals("providerEmail", "a@x.com")
            .contains("carName", "tesla");

        assert!(filter.matches(&doc(
            json!({"providerEmail": "a@x.com", "carName": "My TESLA Model 3"})
        )));
        assert!(!filter.matches(&doc(
            json!({"providerEmail": "b@x.com", "carName": "Tesla"})
        )));
        assert!(!filter.matches(&doc(
            json!({"providerEmail": "a@x.com", "carName": "Civic"})
        )));
        assert!(!filter.matches(&doc(json!({"providerEmail": "a@x.com"}))));
    }

    #[test]
    fn test_merge_reports_changes() {
        let mut target = doc(json!({"status": "available", "carName": "Civic"}));

        assert!(!merge_into(&mut target, doc(json!({"status": "available"}))));
        assert!(merge_into(&mut target, doc(json!({"status": "booked", "seats": 4}))));
        assert_eq!(target.get("status"), Some(&json!("booked")));
        assert_eq!(target.get("carName"), Some(&json!("Civic")));
        assert_eq!(target.get("seats"), Some(&json!(4)));
    }

    #[test]
    fn test_update_result_serializes_camel_case() {
        let value = serde_json::to_value(UpdateResult::updated(1, 0)).unwrap();
        assert_eq!(value["matchedCount"], json!(1));
        assert_eq!(value["modifiedCount"], json!(0));
        assert_eq!(value["upsertedId"], Value::Null);
    }
}
