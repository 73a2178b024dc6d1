//! Core business logic for the blog backend.

pub mod services;

pub use services::*;
