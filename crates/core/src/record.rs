//! Versioned persisted session record
//!
//! Contract with the durable-store collaborator. `schema_version` gates
//! forward-compatible evolution; fields this code version does not know
//! about survive a load/save cycle through the flattened `extra` map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::dialogue::{DialogueState, SessionPhase};
use crate::session::SessionState;

/// Current record schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Wire layout of a persisted session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    pub schema_version: u32,
    pub session_id: String,
    pub current_state: DialogueState,
    pub phase: SessionPhase,
    pub risk_score: f32,
    pub emotional_score: f32,
    pub turn_count: u64,
    /// Opaque to the store; round-trips as-is
    pub context: HashMap<String, serde_json::Value>,
    pub completed_strategies: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Fields written by newer code versions; preserved, never dropped
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl From<&SessionState> for PersistedSession {
    fn from(state: &SessionState) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            session_id: state.id.clone(),
            current_state: state.current_state,
            phase: state.phase,
            risk_score: state.risk_score(),
            emotional_score: state.emotional_score(),
            turn_count: state.turn_count,
            context: state.context.clone(),
            completed_strategies: state.completed_strategies.clone(),
            created_at: state.created_at,
            last_activity_at: state.last_activity_at,
            extra: HashMap::new(),
        }
    }
}

impl PersistedSession {
    /// Rehydrate a session from its persisted record.
    ///
    /// The recent-history window is in-memory working state and starts
    /// empty after a load; the durable store keeps the archived copy.
    pub fn into_session_state(self) -> SessionState {
        let mut state = SessionState::new(self.session_id, self.created_at);
        state.current_state = self.current_state;
        state.phase = self.phase;
        state.set_risk_score(self.risk_score);
        state.set_emotional_score(self.emotional_score);
        state.turn_count = self.turn_count;
        state.context = self.context;
        state.completed_strategies = self.completed_strategies;
        state.last_activity_at = self.last_activity_at;
        state.history = VecDeque::new();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::risk::RiskLevel;
    use crate::session::TurnRecord;

    #[test]
    fn test_round_trip_field_for_field() {
        let mut state = SessionState::new("s-42", Utc::now());
        state.set_risk_score(0.4);
        state.set_emotional_score(0.6);
        state
            .context
            .insert("topic".into(), serde_json::json!("sleep"));
        state.record_turn(
            TurnRecord {
                sequence: 1,
                user_text: "hello".into(),
                response_text: "hi".into(),
                risk_level: RiskLevel::Low,
                applied_strategy: Some("general_support".into()),
                timestamp: Utc::now(),
            },
            50,
        );

        let record = PersistedSession::from(&state);
        let restored = record.clone().into_session_state();

        assert_eq!(restored.id, state.id);
        assert_eq!(restored.current_state, state.current_state);
        assert_eq!(restored.phase, state.phase);
        assert_eq!(restored.risk_score(), state.risk_score());
        assert_eq!(restored.emotional_score(), state.emotional_score());
        assert_eq!(restored.turn_count, state.turn_count);
        assert_eq!(restored.context, state.context);
        assert_eq!(restored.completed_strategies, state.completed_strategies);
        assert_eq!(restored.created_at, state.created_at);
        assert_eq!(restored.last_activity_at, state.last_activity_at);

        // Record → record through JSON is lossless.
        let json = serde_json::to_string(&record).unwrap();
        let decoded: PersistedSession = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_unknown_fields_preserved() {
        let json = serde_json::json!({
            "schema_version": 2,
            "session_id": "s-future",
            "current_state": "start",
            "phase": "opening",
            "risk_score": 0.1,
            "emotional_score": 0.2,
            "turn_count": 3,
            "context": {},
            "completed_strategies": [],
            "created_at": "2026-01-01T00:00:00Z",
            "last_activity_at": "2026-01-01T00:05:00Z",
            "introduced_in_v2": {"nested": true}
        });

        let record: PersistedSession = serde_json::from_value(json).unwrap();
        assert!(record.extra.contains_key("introduced_in_v2"));

        let rewritten = serde_json::to_value(&record).unwrap();
        assert_eq!(
            rewritten.get("introduced_in_v2"),
            Some(&serde_json::json!({"nested": true}))
        );
    }
}
