//! Two-flag gate deciding when the picking action may be enabled.

use serde::{Deserialize, Serialize};

/// Predicate applied to the gate flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessRule {
    /// Ready only once a trace file is selected and a model is loaded.
    #[default]
    Conjunction,
    /// Legacy rule: ready whenever both flags agree, including when neither is set.
    Equality,
}

/// Tracks the two independent prerequisites for picking.
///
/// Flags only ever go from unset to set. The gate raises no events; callers
/// re-read [`ReadinessGate::is_ready`] after every mark.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReadinessGate {
    rule: ReadinessRule,
    artifact_selected: bool,
    model_loaded: bool,
}

impl ReadinessGate {
    pub fn new(rule: ReadinessRule) -> Self {
        Self {
            rule,
            artifact_selected: false,
            model_loaded: false,
        }
    }

    pub fn mark_artifact_selected(&mut self) {
        self.artifact_selected = true;
    }

    pub fn mark_model_loaded(&mut self) {
        self.model_loaded = true;
    }

    pub fn artifact_selected(&self) -> bool {
        self.artifact_selected
    }

    pub fn model_loaded(&self) -> bool {
        self.model_loaded
    }

    pub fn is_ready(&self) -> bool {
        match self.rule {
            ReadinessRule::Conjunction => self.artifact_selected && self.model_loaded,
            ReadinessRule::Equality => self.artifact_selected == self.model_loaded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(rule: ReadinessRule, artifact: bool, model: bool) -> ReadinessGate {
        let mut gate = ReadinessGate::new(rule);
        if artifact {
            gate.mark_artifact_selected();
        }
        if model {
            gate.mark_model_loaded();
        }
        gate
    }

    #[test]
    fn conjunction_requires_both_flags() {
        let rule = ReadinessRule::Conjunction;
        assert!(!gate(rule, false, false).is_ready());
        assert!(!gate(rule, true, false).is_ready());
        assert!(!gate(rule, false, true).is_ready());
        assert!(gate(rule, true, true).is_ready());
    }

    #[test]
    fn equality_rule_is_ready_when_nothing_is_selected() {
        let rule = ReadinessRule::Equality;
        assert!(gate(rule, false, false).is_ready());
        assert!(!gate(rule, true, false).is_ready());
        assert!(!gate(rule, false, true).is_ready());
        assert!(gate(rule, true, true).is_ready());
    }

    #[test]
    fn marks_are_idempotent() {
        let mut gate = ReadinessGate::new(ReadinessRule::Conjunction);
        gate.mark_model_loaded();
        gate.mark_model_loaded();
        assert!(gate.model_loaded());
        assert!(!gate.artifact_selected());
        gate.mark_artifact_selected();
        gate.mark_artifact_selected();
        assert!(gate.is_ready());
    }

    #[test]
    fn default_rule_is_conjunction() {
        assert!(!ReadinessGate::default().is_ready());
        assert!(!gate(ReadinessRule::default(), true, false).is_ready());
    }
}
