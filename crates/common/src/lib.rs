//! Common utilities and shared types for the blog backend.
//!
//! This crate provides foundational components used across all blog crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: user ids, token ids and verification codes via [`IdGenerator`]
//! - **Pagination**: 1-based page arithmetic via [`Pagination`]
//!
//! # Example
//!
//! ```no_run
//! use blog_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate_user_id();
//!     println!("{} listening on {}", id, config.server.port);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod pagination;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use pagination::Pagination;
