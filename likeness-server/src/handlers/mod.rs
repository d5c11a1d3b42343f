//! HTTP request handlers
//!
//! This module contains all the request handlers for the API endpoints.

pub mod compare;
pub mod generate;
pub mod health;

pub use crate::state::AppState;
pub use compare::{compare_handler, CompareResponse};
pub use generate::{generate_handler, GenerateRequest, GenerateResponse};
pub use health::{health, ready, HealthResponse, ReadyResponse};
