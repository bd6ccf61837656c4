//! Common utilities and shared types for formkit.
//!
//! This crate provides foundational components used across all formkit crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and bearer tokens via [`IdGenerator`]
//!
//! # Example
//!
//! ```no_run
//! use formkit_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id = IdGenerator::new().generate();
//!     println!("Listening on {} as {}", config.bind_addr(), id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod nullable;

pub use config::Config;
pub use error::{AppError, AppResult, ItemError};
pub use id::IdGenerator;
