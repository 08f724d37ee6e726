//! Domain layer containing the orchestration engine and its types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, locale, validation errors)
//! - `dialogue` - Turns, the append-only dialogue log, special-token extraction
//! - `phases` - Phase enum, decision records, templates, and the phase registry
//! - `engine` - Generators, summarizers, session state, transition rules, and
//!   the orchestrator that ties them together

pub mod dialogue;
pub mod engine;
pub mod foundation;
pub mod phases;
