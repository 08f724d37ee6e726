//! Phase catalogue: the phase enum, per-phase decision records, default
//! instruction templates, and the registry wiring generators and
//! summarizers to phases.

mod decisions;
mod phase;
mod registry;
mod templates;

pub use decisions::{
    CopingDecision, DecisionRecord, ExploreDecision, IdentifiedEmotion, LabelDecision,
    NextCopingPhase, SensitiveDecision, ShareDecision,
};
pub use phase::Phase;
pub use registry::PhaseRegistry;
pub use templates::PhaseTemplates;
