//! Core business logic for formkit.
//!
//! - [`validation`]: structural rules checked before any write
//! - [`analytics`]: the per-question frequency engine
//! - [`services`]: repositories combined with the rules above

pub mod analytics;
pub mod services;
pub mod validation;

pub use analytics::{FormAnalytics, QuestionAnalytics};
pub use services::*;
