//! Dialogue state machine states and session phases
//!
//! The per-turn protocol walks the `DialogueState` graph; the legal edge
//! set is a static table so every observed transition can be validated
//! against it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-turn dialogue protocol state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    /// Turn accepted, nothing evaluated yet
    #[default]
    Start,
    /// Risk assessment in progress
    RiskCheck,
    /// High/imminent risk branch: pre-vetted response + escalation
    CrisisPath,
    /// Intent classification and context extraction
    ContextEnrich,
    /// Strategy selection and invocation
    TechniqueSelect,
    /// Mandatory response quality/safety gate
    Supervise,
    /// Response committed and returned to the caller
    Respond,
    /// Session archived; no further turns accepted under this id
    EndSession,
}

/// Static transition map for O(1) legality checks.
static STATE_TRANSITIONS: Lazy<HashMap<DialogueState, &'static [DialogueState]>> =
    Lazy::new(|| {
        use DialogueState::*;
        let mut map = HashMap::new();
        map.insert(Start, &[RiskCheck] as &[_]);
        map.insert(RiskCheck, &[CrisisPath, ContextEnrich] as &[_]);
        map.insert(CrisisPath, &[Respond] as &[_]);
        map.insert(ContextEnrich, &[TechniqueSelect] as &[_]);
        map.insert(TechniqueSelect, &[Supervise] as &[_]);
        // Supervise loops back to TechniqueSelect for the single revision
        // attempt, or proceeds to Respond (approved or fallback).
        map.insert(Supervise, &[TechniqueSelect, Respond] as &[_]);
        // Respond re-arms for the next turn or ends the session.
        map.insert(Respond, &[Start, EndSession] as &[_]);
        map.insert(EndSession, &[] as &[_]);
        map
    });

impl DialogueState {
    /// Get allowed transitions from the current state
    pub fn allowed_transitions(&self) -> &'static [DialogueState] {
        STATE_TRANSITIONS.get(self).copied().unwrap_or(&[])
    }

    /// Check if a transition to `target` is a member of the edge set
    pub fn can_transition_to(&self, target: DialogueState) -> bool {
        self.allowed_transitions().contains(&target)
    }

    /// Terminal states accept no further turns
    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueState::EndSession)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DialogueState::Start => "start",
            DialogueState::RiskCheck => "risk_check",
            DialogueState::CrisisPath => "crisis_path",
            DialogueState::ContextEnrich => "context_enrich",
            DialogueState::TechniqueSelect => "technique_select",
            DialogueState::Supervise => "supervise",
            DialogueState::Respond => "respond",
            DialogueState::EndSession => "end_session",
        }
    }
}

/// Longer-arc conversation phase, advanced across turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// First contact, establishing rapport
    #[default]
    Opening,
    /// Understanding what the user is going through
    Exploration,
    /// Applying intervention strategies
    Intervention,
    /// De-escalation and consolidation after a crisis or heavy turn
    Stabilization,
    /// Wrapping up the session
    Closing,
}

impl SessionPhase {
    /// Default forward progression
    pub fn default_next(&self) -> Option<SessionPhase> {
        match self {
            SessionPhase::Opening => Some(SessionPhase::Exploration),
            SessionPhase::Exploration => Some(SessionPhase::Intervention),
            SessionPhase::Intervention => Some(SessionPhase::Stabilization),
            SessionPhase::Stabilization => Some(SessionPhase::Closing),
            SessionPhase::Closing => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionPhase::Opening => "opening",
            SessionPhase::Exploration => "exploration",
            SessionPhase::Intervention => "intervention",
            SessionPhase::Stabilization => "stabilization",
            SessionPhase::Closing => "closing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_always_enters_risk_check() {
        assert_eq!(
            DialogueState::Start.allowed_transitions(),
            &[DialogueState::RiskCheck]
        );
    }

    #[test]
    fn test_risk_check_branches() {
        assert!(DialogueState::RiskCheck.can_transition_to(DialogueState::CrisisPath));
        assert!(DialogueState::RiskCheck.can_transition_to(DialogueState::ContextEnrich));
        assert!(!DialogueState::RiskCheck.can_transition_to(DialogueState::Respond));
    }

    #[test]
    fn test_crisis_path_goes_straight_to_respond() {
        assert_eq!(
            DialogueState::CrisisPath.allowed_transitions(),
            &[DialogueState::Respond]
        );
    }

    #[test]
    fn test_supervise_retry_loop_edge() {
        assert!(DialogueState::Supervise.can_transition_to(DialogueState::TechniqueSelect));
        assert!(DialogueState::Supervise.can_transition_to(DialogueState::Respond));
    }

    #[test]
    fn test_end_session_is_terminal() {
        assert!(DialogueState::EndSession.is_terminal());
        assert!(DialogueState::EndSession.allowed_transitions().is_empty());
    }

    #[test]
    fn test_every_state_has_a_table_entry() {
        use DialogueState::*;
        for state in [
            Start,
            RiskCheck,
            CrisisPath,
            ContextEnrich,
            TechniqueSelect,
            Supervise,
            Respond,
            EndSession,
        ] {
            // Terminal state is the only one allowed an empty edge set.
            if state != EndSession {
                assert!(
                    !state.allowed_transitions().is_empty(),
                    "{:?} has no outgoing edges",
                    state
                );
            }
        }
    }

    #[test]
    fn test_phase_progression_terminates() {
        let mut phase = SessionPhase::Opening;
        let mut hops = 0;
        while let Some(next) = phase.default_next() {
            phase = next;
            hops += 1;
            assert!(hops < 10, "phase progression must terminate");
        }
        assert_eq!(phase, SessionPhase::Closing);
    }
}
