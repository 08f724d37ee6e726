//! Session state storage adapters.
//!
//! Implementations of the [`crate::ports::SessionStateStorage`] port.
//!
//! - **FileStateStorage** - one JSON file per session on disk
//! - **InMemoryStateStorage** - shared map for tests and development

mod file;
mod in_memory;

pub use file::FileStateStorage;
pub use in_memory::InMemoryStateStorage;
