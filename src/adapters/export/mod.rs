//! Session export adapters.
//!
//! Renders a finished (or in-progress) dialogue into formats the
//! research side consumes.

mod csv;

pub use csv::render_session_csv;
