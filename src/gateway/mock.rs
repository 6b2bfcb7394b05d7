//! Mock gateway for development & testing
//!
//! Keeps the wizard functional without the remote agents. Answers every
//! role with a canned result, records each call and can be told to fail.

use super::{AgentContext, AgentGateway, AgentResponse};
use crate::error::WizardError;
use crate::models::AgentRole;
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// The call errors before an envelope exists.
    Transport,
    /// The envelope comes back with `success = false`.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub role: Option<AgentRole>,
    pub agent_id: String,
    pub message: String,
    pub session_id: String,
}

#[derive(Default)]
pub struct MockAgentGateway {
    calls: Mutex<Vec<RecordedCall>>,
    overrides: Mutex<HashMap<AgentRole, Value>>,
    failure: Mutex<Option<FailureMode>>,
    latency: Option<Duration>,
}

impl MockAgentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mode: FailureMode) -> Self {
        let gateway = Self::new();
        gateway.set_failure(Some(mode));
        gateway
    }

    /// Delay every answer, to exercise overlapping calls.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn set_failure(&self, mode: Option<FailureMode>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = mode;
        }
    }

    /// Replace the canned result for one role.
    pub fn set_result(&self, role: AgentRole, result: Value) {
        if let Ok(mut overrides) = self.overrides.lock() {
            overrides.insert(role, result);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn calls_for(&self, role: AgentRole) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.role == Some(role))
            .collect()
    }

    fn result_for(&self, role: AgentRole) -> Value {
        self.overrides
            .lock()
            .ok()
            .and_then(|o| o.get(&role).cloned())
            .unwrap_or_else(|| canned_result(role))
    }
}

#[async_trait]
impl AgentGateway for MockAgentGateway {
    async fn invoke(
        &self,
        agent_id: &str,
        message: &str,
        context: &AgentContext,
    ) -> Result<AgentResponse> {
        let role = AgentRole::from_agent_id(agent_id);

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                role,
                agent_id: agent_id.to_string(),
                message: message.to_string(),
                session_id: context.session_id.clone(),
            });
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.lock().ok().and_then(|f| *f);
        match failure {
            Some(FailureMode::Transport) => {
                return Err(WizardError::Gateway("mock gateway offline".to_string()))
            }
            Some(FailureMode::Rejected) => {
                return Ok(AgentResponse::failure("mock gateway rejected the call"))
            }
            None => {}
        }

        let Some(role) = role else {
            return Ok(AgentResponse::failure(format!("unknown agent {}", agent_id)));
        };

        Ok(AgentResponse::success(self.result_for(role)))
    }
}

/// Canned successful result for each role
pub fn canned_result(role: AgentRole) -> Value {
    match role {
        AgentRole::Commander => json!({
            "current_screen": "screen",
            "financial_analysis": {
                "health_score": 72,
                "surplus": "healthy",
                "insights": "Your fundamentals are in place."
            },
            "handoff_to": "financial_analyst",
            "next_screen_suggestion": "continue",
            "user_profile_update": {
                "risk_tolerance": "moderate",
                "emotional_state": "confident",
                "literacy_level": "beginner"
            },
            "power_level_update": 5,
            "message": "Objective secured. Moving to the next screen."
        }),
        AgentRole::FinancialAnalyst => json!({
            "health_score": 68,
            "ratio_analysis": {
                "income_to_expense": "1.8",
                "savings_rate": "35%",
                "debt_to_income": "0%"
            },
            "risk_flags": [],
            "opportunity_alerts": ["Surplus can fund a monthly SIP"],
            "recommendations": ["Automate your savings on payday."]
        }),
        AgentRole::Coach => json!({
            "message_type": "encouragement",
            "primary_message": "Protection first is a smart habit.",
            "behavioral_insight": "Small safeguards prevent big setbacks.",
            "suggested_action": "Keep your health cover active.",
            "motivation_level": "high"
        }),
        AgentRole::Educator => json!({
            "lesson_type": "intro",
            "title": "Welcome to Your Financial Journey",
            "simple_explanation": "We will look at what you earn, what you spend, and how to grow the rest.",
            "detailed_explanation": "",
            "key_takeaways": ["Know your surplus"],
            "related_concepts": ["SIP", "Emergency fund"],
            "literacy_level": "beginner"
        }),
        AgentRole::Advisor => json!({
            "advice_type": "general",
            "primary_recommendation": "Start with a SIP you can sustain for years.",
            "clarifying_questions": [],
            "personalized_suggestions": {
                "recommended_amount": "5000",
                "rationale": "Fits your surplus comfortably"
            },
            "risk_assessment": "moderate",
            "next_steps": ["Set up auto-debit"]
        }),
    }
}
