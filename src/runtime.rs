//! Session runtime
//!
//! Owns the controller, the durable slot and the agent dispatcher. Every
//! user action locks the controller, mutates it, persists the new state
//! and fires whatever agent calls the controller asked for. Answers to
//! fire-and-forget calls are merged by a single pump task.

use crate::dispatcher::AgentDispatcher;
use crate::gateway::AgentGateway;
use crate::models::{Leak, QuestionId, RiskAnswer, Screen};
use crate::report;
use crate::state::SessionStore;
use crate::wizard::{AgentCommand, AgentEvent, WizardConfig, WizardController};
use crate::Result;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A single field update coming from the UI
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum FieldInput {
    Income(RawAmount),
    FixedBills(RawAmount),
    ToggleLeak(Leak),
    ToggleTermInsurance,
    ToggleHealthInsurance,
    EmergencyFundMonths(i64),
    FocusGoal,
    FinancialGoal(String),
    SipAmount(i64),
    SipYears(i64),
    QuizAnswer {
        question: QuestionId,
        answer: RiskAnswer,
    },
}

/// Amount typed into a text box; accepted as a string or a JSON number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Whole(i64),
    Decimal(f64),
    Text(String),
}

impl RawAmount {
    pub fn as_text(&self) -> String {
        match self {
            RawAmount::Whole(n) => n.to_string(),
            RawAmount::Decimal(n) => n.to_string(),
            RawAmount::Text(text) => text.clone(),
        }
    }
}

pub struct SessionRuntime {
    controller: Arc<Mutex<WizardController>>,
    store: Arc<dyn SessionStore>,
    dispatcher: AgentDispatcher,
    pump: JoinHandle<()>,
}

impl SessionRuntime {
    /// Resume the stored session, or start a fresh one when the slot is
    /// empty or unreadable.
    pub async fn open(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn AgentGateway>,
        config: WizardConfig,
    ) -> Result<Self> {
        let controller = match store.load().await {
            Some(state) => {
                info!(
                    session_id = %state.session_id,
                    screen = %state.current_screen,
                    power_level = state.power_level,
                    "Resuming stored session"
                );
                WizardController::from_state(state, config)
            }
            None => {
                let controller = WizardController::new(config);
                info!(session_id = %controller.session_id(), "Starting new session");
                controller
            }
        };

        store.save(controller.state()).await?;

        let (dispatcher, events) = AgentDispatcher::new(gateway);
        let controller = Arc::new(Mutex::new(controller));
        let pump = tokio::spawn(pump_events(
            events,
            Arc::clone(&controller),
            dispatcher.clone(),
        ));

        Ok(Self {
            controller,
            store,
            dispatcher,
            pump,
        })
    }

    // =============================
    // Navigation
    // =============================

    pub async fn start(&self) -> Result<bool> {
        let mut controller = self.controller.lock().await;
        let Some(command) = controller.start() else {
            return Ok(false);
        };
        self.dispatch(command);
        self.persist(&controller).await?;
        Ok(true)
    }

    /// Run "continue" on the current screen. The Commander call is awaited
    /// without holding the controller, so inputs and other answers keep
    /// flowing while it is out.
    ///
    /// Returns the screen moved to, or `None` when the gate blocked it or
    /// another continue was already pending.
    pub async fn continue_screen(&self) -> Result<Option<Screen>> {
        let command = {
            let mut controller = self.controller.lock().await;
            controller.begin_continue()
        };
        let Some(command) = command else {
            return Ok(None);
        };

        let outcome = self.dispatcher.invoke(&command).await;

        let mut controller = self.controller.lock().await;
        let next = controller.finish_continue(&command, &outcome);
        if next.is_some() {
            self.persist(&controller).await?;
        }
        Ok(next)
    }

    pub async fn back(&self) -> Result<bool> {
        let mut controller = self.controller.lock().await;
        if !controller.back() {
            return Ok(false);
        }
        self.persist(&controller).await?;
        Ok(true)
    }

    pub async fn select_screen(&self, screen: Screen) -> Result<bool> {
        let mut controller = self.controller.lock().await;
        if !controller.select_screen(screen) {
            return Ok(false);
        }
        self.persist(&controller).await?;
        Ok(true)
    }

    // =============================
    // Inputs
    // =============================

    pub async fn apply_input(&self, input: FieldInput) -> Result<()> {
        let mut controller = self.controller.lock().await;

        let command = match input {
            FieldInput::Income(raw) => controller.set_income(&raw.as_text()),
            FieldInput::FixedBills(raw) => {
                controller.set_fixed_bills(&raw.as_text());
                None
            }
            FieldInput::ToggleLeak(leak) => controller.toggle_leak(leak),
            FieldInput::ToggleTermInsurance => controller.toggle_term_insurance(),
            FieldInput::ToggleHealthInsurance => controller.toggle_health_insurance(),
            FieldInput::EmergencyFundMonths(months) => {
                controller.set_emergency_fund_months(months);
                None
            }
            FieldInput::FocusGoal => controller.focus_goal(),
            FieldInput::FinancialGoal(goal) => {
                controller.set_financial_goal(&goal);
                None
            }
            FieldInput::SipAmount(amount) => controller.set_sip_amount(amount),
            FieldInput::SipYears(years) => {
                controller.set_sip_years(years);
                None
            }
            FieldInput::QuizAnswer { question, answer } => controller.answer_quiz(question, answer),
        };

        if let Some(command) = command {
            self.dispatch(command);
        }
        self.persist(&controller).await
    }

    pub async fn dismiss_modal(&self) {
        self.controller.lock().await.dismiss_modal();
    }

    /// Wipe the session. Refused unless the user confirmed.
    pub async fn reset(&self, confirmed: bool) -> Result<bool> {
        if !confirmed {
            debug!("Reset not confirmed");
            return Ok(false);
        }

        let mut controller = self.controller.lock().await;
        controller.reset();
        self.store.clear().await?;
        Ok(true)
    }

    // =============================
    // Reads
    // =============================

    /// True while any agent call is outstanding.
    pub fn is_loading(&self) -> bool {
        self.dispatcher.is_loading()
    }

    /// Wait until every outstanding agent call has been merged.
    pub async fn settle(&self) {
        self.dispatcher.wait_idle().await;
    }

    pub async fn view<R>(&self, read: impl FnOnce(&WizardController) -> R) -> R {
        let controller = self.controller.lock().await;
        read(&controller)
    }

    pub async fn battle_plan(&self, date: NaiveDate) -> String {
        let controller = self.controller.lock().await;
        report::battle_plan(controller.state(), date)
    }

    // =============================
    // Internals
    // =============================

    fn dispatch(&self, command: AgentCommand) {
        debug!(agent = %command.role, trigger = ?command.trigger, "Dispatching agent call");
        self.dispatcher.dispatch(command);
    }

    async fn persist(&self, controller: &WizardController) -> Result<()> {
        self.store.save(controller.state()).await.map_err(|e| {
            warn!(session_id = %controller.session_id(), error = %e, "Failed to save session");
            e
        })
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump_events(
    mut events: mpsc::UnboundedReceiver<AgentEvent>,
    controller: Arc<Mutex<WizardController>>,
    dispatcher: AgentDispatcher,
) {
    while let Some(event) = events.recv().await {
        {
            let mut controller = controller.lock().await;
            if controller.apply_agent_event(&event) {
                debug!(agent = %event.command.role, "Agent answer applied");
            }
        }
        dispatcher.complete();
    }
}
