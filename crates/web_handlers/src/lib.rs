//! # Web Handlers for the Rental Wheels backend
//!
//! This crate provides the users, cars and bookings endpoints and the route table
//! that binds them to paths.

/// Request schemas and the error type shared by all rental handlers
pub mod rental_types;

/// User directory operations
mod user_service;
pub use user_service::*;

/// Car listing operations with provider ownership checks
mod car_service;
pub use car_service::*;

/// Booking operations with renter ownership checks
mod booking_service;
pub use booking_service::*;

/// Handlers for the users endpoints
mod user_handlers;
pub use user_handlers::*;

/// Handlers for the cars endpoints
mod car_handlers;
pub use car_handlers::*;

/// Handlers for the bookings endpoints
mod booking_handlers;
pub use booking_handlers::*;

/// Health and banner endpoints
mod system_handlers;
pub use system_handlers::*;

/// Route table for the rental API
mod routes;
pub use routes::*;

#[cfg(test)]
mod test_support;
