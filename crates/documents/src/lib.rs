//! # Documents
//!
//! This crate provides the document storage gateway for the Rental Wheels backend.
//! Documents are free-form JSON objects grouped into collections, stored either in
//! PostgreSQL (as JSONB) or in process memory.

/// Connection pool creation and connectivity checks.
pub mod database;
/// Gateway holding the users, cars and bookings collections.
pub mod gateway;
/// In-memory document store.
pub mod memory_store;
/// PostgreSQL JSONB document store.
pub mod pg_store;
/// The `DocumentStore` trait and the types shared by its implementations.
pub mod store;

pub use gateway::Database;
pub use memory_store::MemoryDocumentStore;
pub use pg_store::PgDocumentStore;
pub use store::{
    DeleteResult, Document, DocumentFilter, DocumentStore, ID_FIELD, InsertOneResult, StoreError,
    UpdateResult,
};
