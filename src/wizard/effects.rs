//! Commands the wizard emits and the events that answer them
//!
//! The controller never calls an agent itself. It returns an
//! `AgentCommand`; the dispatcher runs it and feeds an `AgentEvent` back.

use crate::gateway::AgentResponse;
use crate::models::{AgentRole, Screen};
use serde::Serialize;

/// What caused an agent call; decides how its answer is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentTrigger {
    JourneyStarted,
    IncomeEntered,
    LeakPlugged,
    TermInsuranceToggled,
    HealthInsuranceToggled,
    GoalFocused,
    SipAmountChanged,
    QuizCompleted,
    ScreenCompleted(Screen),
}

impl AgentTrigger {
    pub fn role(self) -> AgentRole {
        match self {
            AgentTrigger::JourneyStarted => AgentRole::Educator,
            AgentTrigger::IncomeEntered
            | AgentTrigger::LeakPlugged
            | AgentTrigger::SipAmountChanged => AgentRole::FinancialAnalyst,
            AgentTrigger::TermInsuranceToggled
            | AgentTrigger::GoalFocused
            | AgentTrigger::QuizCompleted => AgentRole::Advisor,
            AgentTrigger::HealthInsuranceToggled => AgentRole::Coach,
            AgentTrigger::ScreenCompleted(_) => AgentRole::Commander,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentCommand {
    pub trigger: AgentTrigger,
    pub role: AgentRole,
    pub message: String,
    pub session_id: String,
}

impl AgentCommand {
    pub fn new(trigger: AgentTrigger, message: String, session_id: &str) -> Self {
        Self {
            trigger,
            role: trigger.role(),
            message,
            session_id: session_id.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum AgentOutcome {
    Answered(AgentResponse),
    Failed(String),
}

impl AgentOutcome {
    pub fn response(&self) -> Option<&AgentResponse> {
        match self {
            AgentOutcome::Answered(response) => Some(response),
            AgentOutcome::Failed(_) => None,
        }
    }
}

/// A finished agent call, ready to be merged into the session
#[derive(Debug, Clone)]
pub struct AgentEvent {
    pub command: AgentCommand,
    pub outcome: AgentOutcome,
}
