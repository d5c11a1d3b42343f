//! Likeness Server Library - REST API components for image comparison
//!
//! This library exposes the server components for use in integration tests.
//! The main binary uses these same components.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod upload;
pub mod validation;

pub use config::Config;
pub use db::{
    CreateGeneratedImage, DatabaseConfig, GeneratedImage, GeneratedImageRepository,
    GenerationStatus,
};
pub use error::ApiError;
pub use openapi::ApiDoc;
pub use routes::{create_router, create_router_with_config};
pub use state::AppState;
