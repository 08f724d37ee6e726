//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the Emora domain.

mod errors;
mod ids;
mod locale;
mod timestamp;

pub use errors::ValidationError;
pub use ids::SessionId;
pub use locale::Locale;
pub use timestamp::Timestamp;
