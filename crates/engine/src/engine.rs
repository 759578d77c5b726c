//! Turn protocol driver

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use support_agent_config::{ConfigError, Settings};
use support_agent_core::{
    ContextExtractor, DialogueState, EscalationSink, RiskAssessment, SessionState, TurnOutcome,
    TurnRecord,
};
use support_agent_metrics::MetricsCollector;
use support_agent_risk::{
    IntentClassifier, PatternContextExtractor, RiskAssessor, SESSION_RISK_KEY,
};
use support_agent_session::SessionStore;
use support_agent_supervision::{ResponseSupervisor, SupervisionContext};
use support_agent_techniques::{
    default_registry, TechniqueContext, TechniqueOrchestrator, REJECTION_REASONS_KEY,
};

use crate::error::EngineError;

/// Escalation idempotence keys already notified, bounded FIFO.
const ESCALATION_LEDGER_CAPACITY: usize = 4096;

/// Turns of strategy history handed to selection. The repeat-skip rule
/// reads the last two; the rest feeds the least-recently-used tie-break.
const SELECTION_RECENCY_WINDOW: usize = 8;

struct EscalationLedger {
    seen: HashSet<(String, u64)>,
    order: VecDeque<(String, u64)>,
}

impl EscalationLedger {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            order: VecDeque::new(),
        }
    }

    /// True exactly once per `(session, turn)` key.
    fn first_notice(&mut self, session_id: &str, turn: u64) -> bool {
        let key = (session_id.to_string(), turn);
        if self.seen.contains(&key) {
            return false;
        }
        if self.order.len() == ESCALATION_LEDGER_CAPACITY {
            if let Some(evicted) = self.order.pop_front() {
                self.seen.remove(&evicted);
            }
        }
        self.order.push_back(key.clone());
        self.seen.insert(key);
        true
    }
}

pub struct DialogueEngine {
    settings: Settings,
    store: Arc<SessionStore>,
    orchestrator: TechniqueOrchestrator,
    assessor: RiskAssessor,
    supervisor: ResponseSupervisor,
    intent: IntentClassifier,
    extractor: Arc<dyn ContextExtractor>,
    escalation: Option<Arc<dyn EscalationSink>>,
    metrics: MetricsCollector,
    escalations: Mutex<EscalationLedger>,
}

pub struct DialogueEngineBuilder {
    settings: Settings,
    store: Option<Arc<SessionStore>>,
    orchestrator: Option<TechniqueOrchestrator>,
    assessor: Option<RiskAssessor>,
    supervisor: Option<ResponseSupervisor>,
    extractor: Option<Arc<dyn ContextExtractor>>,
    escalation: Option<Arc<dyn EscalationSink>>,
    metrics: Option<MetricsCollector>,
}

impl DialogueEngineBuilder {
    pub fn store(mut self, store: Arc<SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn orchestrator(mut self, orchestrator: TechniqueOrchestrator) -> Self {
        self.orchestrator = Some(orchestrator);
        self
    }

    pub fn assessor(mut self, assessor: RiskAssessor) -> Self {
        self.assessor = Some(assessor);
        self
    }

    pub fn supervisor(mut self, supervisor: ResponseSupervisor) -> Self {
        self.supervisor = Some(supervisor);
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn ContextExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn escalation(mut self, sink: Arc<dyn EscalationSink>) -> Self {
        self.escalation = Some(sink);
        self
    }

    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Wire the engine. Configuration problems fail here, never mid-turn.
    pub fn build(self) -> Result<DialogueEngine, EngineError> {
        self.settings.validate()?;

        let store = self
            .store
            .ok_or_else(|| ConfigError::invalid("engine requires a session store"))?;

        let orchestrator = match self.orchestrator {
            Some(orchestrator) => orchestrator,
            None => {
                let registry = default_registry()
                    .map_err(|err| ConfigError::invalid(err.to_string()))?;
                TechniqueOrchestrator::from_config(registry, &self.settings.engine)
            }
        };
        if orchestrator.registry().is_empty() {
            return Err(ConfigError::invalid("strategy registry must not be empty").into());
        }

        let assessor = self
            .assessor
            .unwrap_or_else(|| RiskAssessor::new(self.settings.risk.clone()));
        let supervisor = self
            .supervisor
            .unwrap_or_else(|| ResponseSupervisor::new(&self.settings.supervision));
        let extractor = self
            .extractor
            .unwrap_or_else(|| Arc::new(PatternContextExtractor::new()));

        Ok(DialogueEngine {
            settings: self.settings,
            store,
            orchestrator,
            assessor,
            supervisor,
            intent: IntentClassifier::new(),
            extractor,
            escalation: self.escalation,
            metrics: self.metrics.unwrap_or_default(),
            escalations: Mutex::new(EscalationLedger::new()),
        })
    }
}

impl DialogueEngine {
    pub fn builder(settings: Settings) -> DialogueEngineBuilder {
        DialogueEngineBuilder {
            settings,
            store: None,
            orchestrator: None,
            assessor: None,
            supervisor: None,
            extractor: None,
            escalation: None,
            metrics: None,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Handle one inbound turn.
    ///
    /// Same-session turns are serialized on the store's turn guard;
    /// distinct sessions run in parallel. The working copy taken at
    /// turn start is committed only when the protocol reaches `Respond`,
    /// so cancellation at any await point leaves no partial mutation.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<TurnOutcome, EngineError> {
        let guard = self.store.turn_guard(session_id);
        let _serial = guard.lock().await;
        let started = Instant::now();

        let mut session = self.store.get(session_id, timestamp).await;
        if session.is_ended() {
            return Err(EngineError::SessionEnded(session_id.to_string()));
        }
        let turn = session.turn_count + 1;

        Self::advance(&mut session, DialogueState::RiskCheck);
        let assessment = self.assess_risk(&session, text).await;
        info!(
            session_id,
            turn,
            risk_level = assessment.level.display_name(),
            degraded = assessment.degraded,
            "risk assessed"
        );

        let (response_text, applied_strategy) = if assessment.requires_escalation {
            Self::advance(&mut session, DialogueState::CrisisPath);
            self.notify_escalation(session_id, turn, &assessment);
            self.metrics.incr_counter("crisis_turns_total");
            (self.crisis_text(), None)
        } else {
            self.standard_path(&mut session, session_id, text, turn, &assessment)
                .await
        };

        Self::advance(&mut session, DialogueState::Respond);

        // Commit point: everything above mutated the working copy only.
        session.set_risk_score(assessment.score);
        session.record_turn(
            TurnRecord {
                sequence: turn,
                user_text: text.to_string(),
                response_text: response_text.clone(),
                risk_level: assessment.level,
                applied_strategy: applied_strategy.clone(),
                timestamp,
            },
            self.store.history_limit(),
        );
        session.advance_phase(assessment.level);
        self.store.put(session_id, session);

        self.metrics.incr_counter("turns_total");
        self.metrics.record_duration("turn_latency_ms", started.elapsed());
        if let Some(strategy) = &applied_strategy {
            self.metrics.incr_counter(&format!("strategy_{strategy}_total"));
        }

        Ok(TurnOutcome {
            response_text,
            risk_level: assessment.level,
            applied_strategy,
        })
    }

    /// Standard (non-crisis) branch: enrich, select, supervise with at
    /// most one revision, fall back on a second rejection.
    async fn standard_path(
        &self,
        session: &mut SessionState,
        session_id: &str,
        text: &str,
        turn: u64,
        assessment: &RiskAssessment,
    ) -> (String, Option<String>) {
        Self::advance(session, DialogueState::ContextEnrich);
        let (emotion, emotion_confidence) = self.intent.classify(text);
        session.set_emotional_score(emotion_confidence);
        for (key, value) in self.extract_facts(session_id, turn, text).await {
            session.context.insert(key, value);
        }

        Self::advance(session, DialogueState::TechniqueSelect);
        let mut technique_ctx = TechniqueContext {
            session_id: session_id.to_string(),
            user_text: text.to_string(),
            risk_level: assessment.level,
            emotion,
            facts: session.context.clone(),
            turn_count: session.turn_count,
        };
        let recent = session.recently_used_strategies(SELECTION_RECENCY_WINDOW);
        let selected = match self.orchestrator.select(&technique_ctx, &recent) {
            Some(technique) => technique,
            // Unreachable with a validated registry; still fail safe.
            None => {
                Self::advance(session, DialogueState::Supervise);
                return (self.settings.engine.fallback_response.clone(), None);
            }
        };
        debug!(session_id, turn, strategy = selected.name(), "strategy selected");

        let candidate = self.orchestrator.invoke(&selected, &technique_ctx).await;
        Self::advance(session, DialogueState::Supervise);
        let supervision_ctx = SupervisionContext {
            session_id: session_id.to_string(),
            user_text: text.to_string(),
        };
        let verdict = self.supervisor.supervise(&candidate, &supervision_ctx);
        if verdict.approved() {
            return (candidate.response_text, Some(candidate.strategy_name));
        }
        self.audit_rejection(session_id, turn, &verdict.critical_issues);

        if self.settings.engine.max_revision_attempts > 0 {
            Self::advance(session, DialogueState::TechniqueSelect);
            let mut reasons: Vec<String> = verdict.critical_issues.clone();
            reasons.extend(verdict.warnings.iter().cloned());
            if let Some(hint) = &verdict.revision_hint {
                reasons.push(hint.clone());
            }
            technique_ctx
                .facts
                .insert(REJECTION_REASONS_KEY.to_string(), serde_json::json!(reasons));

            // Selection runs again with the rejection reasons in context,
            // so a strategy can bow out of its own revision.
            let reselected = self
                .orchestrator
                .select(&technique_ctx, &recent)
                .unwrap_or_else(|| selected.clone());
            debug!(
                session_id,
                turn,
                strategy = reselected.name(),
                "strategy selected for revision"
            );
            let revised = self.orchestrator.invoke(&reselected, &technique_ctx).await;
            Self::advance(session, DialogueState::Supervise);
            let second = self.supervisor.supervise(&revised, &supervision_ctx);
            if second.approved() {
                self.metrics.incr_counter("revisions_approved_total");
                return (revised.response_text, Some(revised.strategy_name));
            }
            self.audit_rejection(session_id, turn, &second.critical_issues);
        }

        // Second rejection: canonical fallback. The fallback is not a
        // chosen strategy and does not feed anti-repetition tracking.
        self.metrics.incr_counter("fallback_responses_total");
        (self.settings.engine.fallback_response.clone(), None)
    }

    /// End the session explicitly; idempotent.
    pub async fn end_session(
        &self,
        session_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        let guard = self.store.turn_guard(session_id);
        let _serial = guard.lock().await;

        let mut session = self.store.get(session_id, timestamp).await;
        if session.is_ended() {
            return Ok(());
        }
        session.end(timestamp);
        self.store.put(session_id, session);
        self.store.remove(session_id).await;
        self.metrics.incr_counter("sessions_ended_total");
        info!(session_id, "session ended");
        Ok(())
    }

    async fn assess_risk(&self, session: &SessionState, text: &str) -> RiskAssessment {
        let mut risk_context = session.context.clone();
        risk_context.insert(
            SESSION_RISK_KEY.to_string(),
            serde_json::json!(session.risk_score()),
        );
        let assessment = self.assessor.assess(text, &risk_context).await;
        if assessment.degraded {
            self.metrics.incr_counter("risk_assessments_degraded_total");
        }
        assessment
    }

    async fn extract_facts(
        &self,
        session_id: &str,
        turn: u64,
        text: &str,
    ) -> HashMap<String, serde_json::Value> {
        let budget = Duration::from_millis(self.settings.engine.extractor_timeout_ms);
        match timeout(budget, self.extractor.extract(text)).await {
            Ok(Ok(facts)) => facts,
            Ok(Err(err)) => {
                warn!(session_id, turn, error = %err, "context extraction failed, proceeding without facts");
                self.metrics.incr_counter("context_extraction_failures_total");
                HashMap::new()
            }
            Err(_) => {
                warn!(session_id, turn, "context extraction timed out, proceeding without facts");
                self.metrics.incr_counter("context_extraction_failures_total");
                HashMap::new()
            }
        }
    }

    /// Notify the escalation sink at most once per `(session, turn)`.
    ///
    /// The notification runs on a detached task under its own budget, so
    /// a slow or hung sink can never stall the crisis turn it belongs to
    /// or the turns queued behind the session guard.
    fn notify_escalation(&self, session_id: &str, turn: u64, assessment: &RiskAssessment) {
        if !self.escalations.lock().first_notice(session_id, turn) {
            return;
        }
        self.metrics.incr_counter("escalations_total");
        let Some(sink) = self.escalation.clone() else {
            warn!(
                session_id,
                turn,
                risk_level = assessment.level.display_name(),
                "escalation required but no sink configured"
            );
            return;
        };

        let session_id = session_id.to_string();
        let assessment = assessment.clone();
        let budget = Duration::from_millis(self.settings.engine.escalation_timeout_ms);
        let metrics = self.metrics.clone();
        tokio::spawn(async move {
            match timeout(budget, sink.notify(&session_id, turn, &assessment)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(session_id = %session_id, turn, error = %err, "escalation notification failed");
                    metrics.incr_counter("escalation_failures_total");
                }
                Err(_) => {
                    warn!(session_id = %session_id, turn, "escalation notification timed out");
                    metrics.incr_counter("escalation_failures_total");
                }
            }
        });
    }

    /// Auditable record of a supervision rejection. Candidate text is
    /// sensitive and never logged.
    fn audit_rejection(&self, session_id: &str, turn: u64, critical_issues: &[String]) {
        let content_violation = critical_issues
            .iter()
            .any(|issue| issue.starts_with("deny-listed"));
        if content_violation {
            warn!(session_id, turn, "content_violation: candidate tripped the deny list");
            self.metrics.incr_counter("content_violations_total");
        } else {
            self.metrics.incr_counter("supervision_rejections_total");
        }
    }

    fn crisis_text(&self) -> String {
        format!(
            "{}\n\n{}",
            self.settings.engine.crisis_response,
            self.settings.engine.crisis_resources.join("\n")
        )
    }

    fn advance(session: &mut SessionState, next: DialogueState) {
        debug_assert!(
            session.current_state.can_transition_to(next),
            "illegal dialogue transition {} -> {}",
            session.current_state.display_name(),
            next.display_name()
        );
        trace!(
            session_id = %session.id,
            from = session.current_state.display_name(),
            to = next.display_name(),
            "dialogue transition"
        );
        session.current_state = next;
    }
}
