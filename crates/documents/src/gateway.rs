use std::sync::Arc;

use sqlx::PgPool;

use crate::memory_store::MemoryDocumentStore;
use crate::pg_store::PgDocumentStore;
use crate::store::{DocumentStore, StoreError};

/// Name of the users collection.
pub const USERS_COLLECTION: &str = "users";
/// Name of the cars collection.
pub const CARS_COLLECTION: &str = "cars";
/// Name of the bookings collection.
pub const BOOKINGS_COLLECTION: &str = "bookings";

/// Field that uniquely identifies a user document.
pub const USER_KEY_FIELD: &str = "email";

/// Long-lived handle on the three rental collections.
///
/// Built once at startup and shared with every worker; cloning is cheap.
#[derive(Clone)]
pub struct Database {
    users: Arc<dyn DocumentStore>,
    cars: Arc<dyn DocumentStore>,
    bookings: Arc<dyn DocumentStore>,
    pool: Option<PgPool>,
}

impl Database {
    /// Opens the collections on PostgreSQL, creating tables and indexes as needed.
    pub async fn connect_postgres(pool: PgPool) -> Result<Self, StoreError> {
        let users = PgDocumentStore::new(pool.clone(), USERS_COLLECTION)?;
        let cars = PgDocumentStore::new(pool.clone(), CARS_COLLECTION)?;
        let bookings = PgDocumentStore::new(pool.clone(), BOOKINGS_COLLECTION)?;

        for store in [&users, &cars, &bookings] {
            store.ensure_table().await?;
        }
        users.ensure_unique_key(USER_KEY_FIELD).await?;

        log::info!("🗃️ Collections ready: {USERS_COLLECTION}, {CARS_COLLECTION}, {BOOKINGS_COLLECTION}");

        Ok(Self {
            users: Arc::new(users),
            cars: Arc::new(cars),
            bookings: Arc::new(bookings),
            pool: Some(pool),
        })
    }

    /// Opens empty collections held in memory.
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryDocumentStore::new()),
            cars: Arc::new(MemoryDocumentStore::new()),
            bookings: Arc::new(MemoryDocumentStore::new()),
            pool: None,
        }
    }

    /// The users collection.
    pub fn users(&self) -> Arc<dyn DocumentStore> {
        self.users.clone()
    }

    /// The cars collection.
    pub fn cars(&self) -> Arc<dyn DocumentStore> {
        self.cars.clone()
    }

    /// The bookings collection.
    pub fn bookings(&self) -> Arc<dyn DocumentStore> {
        self.bookings.clone()
    }

    /// Checks that the backing store is reachable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.users.ping().await
    }

    /// Releases the database connections. Further operations fail.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            log::info!("🗃️ Database pool closed");
        }
    }
}
