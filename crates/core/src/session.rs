//! Session state: one per end user, mutated exactly once per completed turn
//!
//! The engine computes each turn against a working copy and commits it
//! atomically through the session store; nothing here is shared mutable
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::dialogue::{DialogueState, SessionPhase};
use crate::risk::RiskLevel;

/// One completed turn in the recent-history window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRecord {
    /// Monotonic per-session sequence number (1-based)
    pub sequence: u64,
    pub user_text: String,
    pub response_text: String,
    pub risk_level: RiskLevel,
    /// `None` when the canonical fallback was delivered
    pub applied_strategy: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Per-user session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: String,
    pub current_state: DialogueState,
    pub phase: SessionPhase,
    risk_score: f32,
    emotional_score: f32,
    pub turn_count: u64,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub context: HashMap<String, serde_json::Value>,
    /// Recent turns only; older entries live in the durable store's copy
    pub history: VecDeque<TurnRecord>,
    /// Ordered list of strategies chosen across the session
    pub completed_strategies: Vec<String>,
    pub active_goals: Vec<String>,
}

impl SessionState {
    /// Create a fresh session for a first turn
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            current_state: DialogueState::Start,
            phase: SessionPhase::Opening,
            risk_score: 0.0,
            emotional_score: 0.0,
            turn_count: 0,
            created_at: now,
            last_activity_at: now,
            context: HashMap::new(),
            history: VecDeque::new(),
            completed_strategies: Vec::new(),
            active_goals: Vec::new(),
        }
    }

    pub fn risk_score(&self) -> f32 {
        self.risk_score
    }

    pub fn emotional_score(&self) -> f32 {
        self.emotional_score
    }

    /// Scores are always clamped to [0, 1]
    pub fn set_risk_score(&mut self, score: f32) {
        self.risk_score = score.clamp(0.0, 1.0);
    }

    pub fn set_emotional_score(&mut self, score: f32) {
        self.emotional_score = score.clamp(0.0, 1.0);
    }

    /// Whether the session has been explicitly ended
    pub fn is_ended(&self) -> bool {
        self.current_state.is_terminal()
    }

    /// The strategies chosen in the most recent `n` turns, newest last.
    ///
    /// Fallback responses are not chosen strategies and never appear here.
    pub fn recently_used_strategies(&self, n: usize) -> Vec<String> {
        let start = self.completed_strategies.len().saturating_sub(n);
        self.completed_strategies[start..].to_vec()
    }

    /// Apply one completed turn's mutation.
    ///
    /// Called on a working copy only; the turn becomes visible when the
    /// copy is committed back to the store. `history_limit` bounds the
    /// in-memory window (oldest evicted).
    pub fn record_turn(&mut self, record: TurnRecord, history_limit: usize) {
        self.turn_count += 1;
        self.last_activity_at = record.timestamp;
        if let Some(strategy) = &record.applied_strategy {
            self.completed_strategies.push(strategy.clone());
        }
        if self.history.len() >= history_limit.max(1) {
            self.history.pop_front();
        }
        self.history.push_back(record);
        self.current_state = DialogueState::Start;
    }

    /// Advance the longer-arc phase on turn-count milestones; a crisis
    /// turn pins the session at Stabilization instead.
    pub fn advance_phase(&mut self, risk_level: RiskLevel) {
        if risk_level.requires_escalation() {
            self.phase = SessionPhase::Stabilization;
            return;
        }
        let milestone = match self.phase {
            SessionPhase::Opening => 2,
            SessionPhase::Exploration => 6,
            SessionPhase::Intervention => 12,
            SessionPhase::Stabilization => 16,
            SessionPhase::Closing => u64::MAX,
        };
        if self.turn_count >= milestone {
            if let Some(next) = self.phase.default_next() {
                self.phase = next;
            }
        }
    }

    /// Mark the session ended; further turns must be rejected
    pub fn end(&mut self, now: DateTime<Utc>) {
        self.current_state = DialogueState::EndSession;
        self.last_activity_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(seq: u64, strategy: Option<&str>) -> TurnRecord {
        TurnRecord {
            sequence: seq,
            user_text: format!("message {}", seq),
            response_text: "I'm here with you.".to_string(),
            risk_level: RiskLevel::Low,
            applied_strategy: strategy.map(String::from),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_scores_clamped() {
        let mut session = SessionState::new("s1", Utc::now());
        session.set_risk_score(2.0);
        session.set_emotional_score(-1.0);
        assert_eq!(session.risk_score(), 1.0);
        assert_eq!(session.emotional_score(), 0.0);
    }

    #[test]
    fn test_history_bounded() {
        let mut session = SessionState::new("s1", Utc::now());
        for i in 1..=10 {
            session.record_turn(turn(i, Some("general_support")), 4);
        }
        assert_eq!(session.history.len(), 4);
        assert_eq!(session.history.front().unwrap().sequence, 7);
        assert_eq!(session.turn_count, 10);
    }

    #[test]
    fn test_fallback_not_in_recent_strategies() {
        let mut session = SessionState::new("s1", Utc::now());
        session.record_turn(turn(1, Some("grounding")), 50);
        session.record_turn(turn(2, None), 50);
        session.record_turn(turn(3, Some("active_listening")), 50);
        assert_eq!(
            session.recently_used_strategies(2),
            vec!["grounding".to_string(), "active_listening".to_string()]
        );
    }

    #[test]
    fn test_crisis_pins_stabilization() {
        let mut session = SessionState::new("s1", Utc::now());
        session.advance_phase(RiskLevel::Imminent);
        assert_eq!(session.phase, SessionPhase::Stabilization);
    }

    #[test]
    fn test_phase_milestones() {
        let mut session = SessionState::new("s1", Utc::now());
        for i in 1..=2 {
            session.record_turn(turn(i, None), 50);
            session.advance_phase(RiskLevel::Low);
        }
        assert_eq!(session.phase, SessionPhase::Exploration);
    }

    #[test]
    fn test_ended_session_rejects_state() {
        let mut session = SessionState::new("s1", Utc::now());
        session.end(Utc::now());
        assert!(session.is_ended());
    }
}
