//! Main entry point for the Rental Wheels backend server.
//! This crate wires configuration, the document store and token verification into the
//! REST API for users, cars and bookings.

mod config;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use documents::Database;
use documents::database::{create_connection_pool, test_connection};
use identity::{AuthMiddleware, IdentityVerifier, JwksVerifier, JwtService};
use web_handlers::*;

use crate::config::{IdentityConfig, ServerConfig, StoreBackend};

async fn open_database(store: &StoreBackend) -> anyhow::Result<Database> {
    match store {
        StoreBackend::Memory => {
            log::warn!("⚠️ Using the in-memory document store, data will not survive a restart");
            Ok(Database::in_memory())
        }
        StoreBackend::Postgres { database_url } => {
            let pool = create_connection_pool(database_url).await?;
            log::info!("🗃️ Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("❌ Database connection test failed: {}", e);
            }

            Ok(Database::connect_postgres(pool).await?)
        }
    }
}

fn build_verifier(identity: &IdentityConfig) -> anyhow::Result<Arc<dyn IdentityVerifier>> {
    match identity {
        IdentityConfig::Jwks(jwks) => {
            log::info!("🔑 Verifying tokens against {}", jwks.jwks_url);
            Ok(Arc::new(JwksVerifier::new(jwks.clone())?))
        }
        IdentityConfig::SharedSecret { secret, is_default } => {
            if *is_default {
                log::warn!("⚠️ JWT_SECRET is not set, using the development secret");
            }
            log::info!("🔑 Verifying shared-secret tokens");
            Ok(Arc::new(JwtService::new(secret)))
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("🚀 Starting Rental Wheels server...");

    let config = ServerConfig::from_env()?;

    let db = match open_database(&config.store).await {
        Ok(db) => db,
        Err(e) => {
            log::error!("❌ Failed to open the document store: {}", e);
            log::error!("💡 Check DATABASE_URL or run with DOCUMENT_STORE=memory");
            std::process::exit(1);
        }
    };

    let auth = AuthMiddleware::new(build_verifier(&config.identity)?);

    log::info!(
        "🌐 Server will be available at: http://{}:{}",
        config.bind_address,
        config.port
    );

    let data = web::Data::new(db.clone());

    let result = HttpServer::new(move || {
        let auth = auth.clone();

        App::new()
            .app_data(data.clone())
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .route("/", web::get().to(index))
            .route("/health", web::get().to(health))
            // Legacy prefix still used by deployed web clients
            .service(web::scope("/api").configure(|cfg| rental_routes(cfg, &auth)))
            .configure(|cfg| rental_routes(cfg, &auth))
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await;

    db.close().await;
    log::info!("👋 Server stopped");

    Ok(result?)
}
