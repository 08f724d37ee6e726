//! Adapters - implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion port implementations (OpenAI-compatible HTTP, mock)
//! - `storage` - Session state persistence (in-memory, file-backed)
//! - `export` - Session log export for analysis

pub mod ai;
pub mod export;
pub mod storage;
