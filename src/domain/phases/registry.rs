//! Phase registry: one generator per phase, one summarizer per phase
//! that transitions, plus the cross-cutting sensitive-topic check.
//!
//! Built once per session from a template set. There is no shared
//! mutable cache; two sessions never observe each other's bindings.

use crate::domain::dialogue::{
    SpecialTokenExtractor, TokenSpec, EMOTION_SELECT_MARKER, NEW_EPISODE_MARKER,
    NEW_EPISODE_REQUESTED_KEY, SELECT_EMOTION_KEY,
};
use crate::domain::engine::{FewShotExample, LlmGenerator, LlmSummarizer};

use super::decisions::{
    CopingDecision, ExploreDecision, LabelDecision, SensitiveDecision, ShareDecision,
};
use super::templates::PhaseTemplates;
use super::Phase;

/// The generators and summarizers for one session.
#[derive(Debug, Clone)]
pub struct PhaseRegistry {
    explore_generator: LlmGenerator,
    label_generator: LlmGenerator,
    find_generator: LlmGenerator,
    record_generator: LlmGenerator,
    share_generator: LlmGenerator,
    help_generator: LlmGenerator,

    explore_summarizer: LlmSummarizer<ExploreDecision>,
    label_summarizer: LlmSummarizer<LabelDecision>,
    find_summarizer: LlmSummarizer<CopingDecision>,
    record_summarizer: LlmSummarizer<CopingDecision>,
    share_summarizer: LlmSummarizer<ShareDecision>,
    sensitive_summarizer: LlmSummarizer<SensitiveDecision>,

    extractor: SpecialTokenExtractor,
}

impl PhaseRegistry {
    /// Builds a registry from a template set.
    ///
    /// `max_summarizer_attempts` is the malformed-retry budget shared
    /// by every summarizer.
    pub fn with_templates(templates: &PhaseTemplates, max_summarizer_attempts: u32) -> Self {
        let label_tokens = vec![TokenSpec::flag(EMOTION_SELECT_MARKER, SELECT_EMOTION_KEY)];
        let share_tokens = vec![TokenSpec::flag(NEW_EPISODE_MARKER, NEW_EPISODE_REQUESTED_KEY)];

        Self {
            explore_generator: LlmGenerator::new(
                templates.generator_instruction(Phase::Explore),
            ),
            label_generator: LlmGenerator::new(templates.generator_instruction(Phase::Label))
                .with_token_specs(label_tokens),
            find_generator: LlmGenerator::new(templates.generator_instruction(Phase::Find)),
            record_generator: LlmGenerator::new(templates.generator_instruction(Phase::Record)),
            share_generator: LlmGenerator::new(templates.generator_instruction(Phase::Share))
                .with_token_specs(share_tokens),
            help_generator: LlmGenerator::new(templates.generator_instruction(Phase::Help)),

            explore_summarizer: LlmSummarizer::new(&templates.explore_summarizer)
                .with_examples(explore_examples())
                .with_max_attempts(max_summarizer_attempts),
            label_summarizer: LlmSummarizer::new(&templates.label_summarizer)
                .with_examples(label_examples())
                .with_max_attempts(max_summarizer_attempts),
            find_summarizer: LlmSummarizer::new(&templates.find_summarizer)
                .with_examples(find_examples())
                .with_max_attempts(max_summarizer_attempts),
            record_summarizer: LlmSummarizer::new(&templates.record_summarizer)
                .with_max_attempts(max_summarizer_attempts),
            share_summarizer: LlmSummarizer::new(&templates.share_summarizer)
                .with_max_attempts(max_summarizer_attempts),
            sensitive_summarizer: LlmSummarizer::new(&templates.sensitive_summarizer)
                .with_max_attempts(max_summarizer_attempts),

            extractor: SpecialTokenExtractor::standard(),
        }
    }

    /// The generator for a phase.
    pub fn generator(&self, phase: Phase) -> &LlmGenerator {
        match phase {
            Phase::Explore => &self.explore_generator,
            Phase::Label => &self.label_generator,
            Phase::Find => &self.find_generator,
            Phase::Record => &self.record_generator,
            Phase::Share => &self.share_generator,
            Phase::Help => &self.help_generator,
        }
    }

    pub fn explore_summarizer(&self) -> &LlmSummarizer<ExploreDecision> {
        &self.explore_summarizer
    }

    pub fn label_summarizer(&self) -> &LlmSummarizer<LabelDecision> {
        &self.label_summarizer
    }

    /// The coping summarizer for the given branch phase.
    ///
    /// Only `Find` and `Record` carry one; other phases fall back to
    /// the find summarizer, which the transition rules never request.
    pub fn coping_summarizer(&self, phase: Phase) -> &LlmSummarizer<CopingDecision> {
        match phase {
            Phase::Record => &self.record_summarizer,
            _ => &self.find_summarizer,
        }
    }

    pub fn share_summarizer(&self) -> &LlmSummarizer<ShareDecision> {
        &self.share_summarizer
    }

    pub fn sensitive_summarizer(&self) -> &LlmSummarizer<SensitiveDecision> {
        &self.sensitive_summarizer
    }

    pub fn extractor(&self) -> &SpecialTokenExtractor {
        &self.extractor
    }
}

/// Worked examples for the explore judgement: one transcript that has
/// surfaced an episode and an emotion, one that has not yet.
fn explore_examples() -> Vec<FewShotExample> {
    vec![
        FewShotExample::new(
            "assistant: How was your day?\n\
             user: Not great. I messed up my dance performance in front of everyone.\n\
             assistant: Oh no. How did that make you feel?\n\
             user: I was so embarrassed I wanted to disappear.",
            r#"{"key_episode": "messed up a dance performance in front of everyone", "user_emotion": "embarrassed", "move_to_next": true, "rationale": "the user named one episode and the feeling it caused"}"#,
        ),
        FewShotExample::new(
            "assistant: How was your day?\n\
             user: It was fine, I guess. Nothing much happened.",
            r#"{"key_episode": null, "user_emotion": null, "move_to_next": false, "rationale": "no specific episode has come up yet"}"#,
        ),
    ]
}

fn label_examples() -> Vec<FewShotExample> {
    vec![FewShotExample::new(
        "user: I think I was angry but also a bit sad.\n\
         assistant: That makes sense. Being left out can really sting, and it's \
         okay to feel both at once.\n\
         user: Yeah. Mostly sad, now that I say it out loud.",
        r#"{"identified_emotions": [{"emotion": "anger", "reason": "being left out felt unfair", "is_positive": false}, {"emotion": "sadness", "reason": "missed being with the group", "is_positive": false}], "empathized_all_emotions": true, "next_phase": "find", "rationale": "both named emotions were acknowledged and both are negative"}"#,
    )]
}

fn find_examples() -> Vec<FewShotExample> {
    vec![FewShotExample::new(
        "assistant: One thing that can help is telling your friend how you felt. \
         Talking it over often makes the knot smaller. What do you think?\n\
         user: Maybe. I could try talking to her tomorrow at lunch.",
        r#"{"strategies_discussed": true, "importance_explained": true, "user_reflection_provided": true, "rationale": "a concrete idea was offered with a reason and the user responded with their own plan"}"#,
    )]
}

impl Default for PhaseRegistry {
    fn default() -> Self {
        Self::with_templates(&PhaseTemplates::default(), 3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_phase_has_a_generator() {
        let registry = PhaseRegistry::default();
        for phase in Phase::ALL {
            // A registry miss would be a wiring bug, not a runtime case.
            let _ = registry.generator(phase);
        }
    }

    #[test]
    fn label_generator_declares_the_emotion_picker_token() {
        let registry = PhaseRegistry::default();
        let specs = registry.generator(Phase::Label).token_specs();
        assert!(specs.iter().any(|s| s.marker == EMOTION_SELECT_MARKER));
    }

    #[test]
    fn share_generator_declares_the_new_episode_token() {
        let registry = PhaseRegistry::default();
        let specs = registry.generator(Phase::Share).token_specs();
        assert!(specs.iter().any(|s| s.marker == NEW_EPISODE_MARKER));
    }

    #[test]
    fn explore_generator_has_no_special_tokens() {
        let registry = PhaseRegistry::default();
        assert!(registry.generator(Phase::Explore).token_specs().is_empty());
    }

    #[test]
    fn early_phase_summarizers_carry_worked_examples() {
        let registry = PhaseRegistry::default();
        assert!(!registry.explore_summarizer().examples().is_empty());
        assert!(!registry.label_summarizer().examples().is_empty());
        assert!(!registry.coping_summarizer(Phase::Find).examples().is_empty());
    }

    #[test]
    fn record_and_share_summarizers_run_bare() {
        let registry = PhaseRegistry::default();
        assert!(registry.coping_summarizer(Phase::Record).examples().is_empty());
        assert!(registry.share_summarizer().examples().is_empty());
        assert!(registry.sensitive_summarizer().examples().is_empty());
    }
}
