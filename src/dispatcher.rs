//! Agent dispatcher
//!
//! Runs the agent calls the wizard asks for. Fire-and-forget calls get
//! their own task and report back through a channel; the Commander call on
//! "continue" is awaited inline. A single in-flight counter backs the
//! shared loading flag.

use crate::gateway::{AgentContext, AgentGateway};
use crate::wizard::{AgentCommand, AgentEvent, AgentOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, warn};

#[derive(Clone)]
pub struct AgentDispatcher {
    gateway: Arc<dyn AgentGateway>,
    events: mpsc::UnboundedSender<AgentEvent>,
    in_flight: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl AgentDispatcher {
    /// Create a dispatcher and the receiving end of its result channel.
    pub fn new(gateway: Arc<dyn AgentGateway>) -> (Self, mpsc::UnboundedReceiver<AgentEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let dispatcher = Self {
            gateway,
            events,
            in_flight: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        };
        (dispatcher, receiver)
    }

    /// True while at least one call has not been fully handled.
    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start a call without waiting for it. The result arrives as an
    /// `AgentEvent`; the consumer must call `complete` once it is applied.
    pub fn dispatch(&self, command: AgentCommand) {
        self.in_flight.fetch_add(1, Ordering::SeqCst);

        let gateway = Arc::clone(&self.gateway);
        let events = self.events.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let idle = Arc::clone(&self.idle);

        tokio::spawn(async move {
            let outcome = call_agent(gateway.as_ref(), &command).await;
            if events.send(AgentEvent { command, outcome }).is_err() {
                // Nobody left to apply it
                release(&in_flight, &idle);
            }
        });
    }

    /// Run a call to completion and hand back its outcome.
    pub async fn invoke(&self, command: &AgentCommand) -> AgentOutcome {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let outcome = call_agent(self.gateway.as_ref(), command).await;
        release(&self.in_flight, &self.idle);
        outcome
    }

    /// Mark one dispatched event as applied.
    pub fn complete(&self) {
        release(&self.in_flight, &self.idle);
    }

    /// Wait until no call is in flight.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }
}

fn release(in_flight: &AtomicUsize, idle: &Notify) {
    let previous = in_flight
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)))
        .unwrap_or(0);
    if previous <= 1 {
        idle.notify_waiters();
    }
}

async fn call_agent(gateway: &dyn AgentGateway, command: &AgentCommand) -> AgentOutcome {
    let start = Instant::now();
    let context = AgentContext {
        session_id: command.session_id.clone(),
    };

    let result = gateway
        .invoke(command.role.agent_id(), &command.message, &context)
        .await;
    let elapsed_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(response) => {
            if response.successful_result().is_none() {
                warn!(
                    agent = %command.role,
                    trigger = ?command.trigger,
                    error = ?response.error,
                    "Agent answered without success"
                );
            } else {
                debug!(agent = %command.role, elapsed_ms, "Agent answered");
            }
            AgentOutcome::Answered(response)
        }
        Err(e) => {
            warn!(
                agent = %command.role,
                trigger = ?command.trigger,
                error = %e,
                elapsed_ms,
                "Agent call failed"
            );
            AgentOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{FailureMode, MockAgentGateway};
    use crate::models::AgentRole;
    use crate::wizard::AgentTrigger;
    use std::time::Duration;

    fn command(trigger: AgentTrigger) -> AgentCommand {
        AgentCommand::new(trigger, "test".to_string(), "session_test")
    }

    #[tokio::test]
    async fn test_dispatch_reports_back_and_tracks_loading() {
        let gateway = Arc::new(MockAgentGateway::new().with_latency(Duration::from_millis(20)));
        let (dispatcher, mut events) = AgentDispatcher::new(gateway.clone());

        dispatcher.dispatch(command(AgentTrigger::IncomeEntered));
        dispatcher.dispatch(command(AgentTrigger::HealthInsuranceToggled));
        assert!(dispatcher.is_loading());
        assert_eq!(dispatcher.in_flight(), 2);

        for _ in 0..2 {
            let event = events.recv().await.unwrap();
            assert!(event.outcome.response().is_some());
            dispatcher.complete();
        }

        dispatcher.wait_idle().await;
        assert!(!dispatcher.is_loading());
        assert_eq!(gateway.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_loading_flag_stays_up_until_last_call_finishes() {
        let gateway = Arc::new(MockAgentGateway::new());
        let (dispatcher, mut events) = AgentDispatcher::new(gateway);

        dispatcher.dispatch(command(AgentTrigger::LeakPlugged));
        dispatcher.dispatch(command(AgentTrigger::LeakPlugged));

        events.recv().await.unwrap();
        dispatcher.complete();
        assert!(dispatcher.is_loading());

        events.recv().await.unwrap();
        dispatcher.complete();
        assert!(!dispatcher.is_loading());
    }

    #[tokio::test]
    async fn test_invoke_turns_transport_error_into_failed_outcome() {
        let gateway = Arc::new(MockAgentGateway::failing(FailureMode::Transport));
        let (dispatcher, _events) = AgentDispatcher::new(gateway.clone());

        let outcome = dispatcher
            .invoke(&command(AgentTrigger::ScreenCompleted(crate::models::Screen::Intel)))
            .await;
        assert!(matches!(outcome, AgentOutcome::Failed(_)));
        assert!(!dispatcher.is_loading());
        assert_eq!(gateway.calls_for(AgentRole::Commander).len(), 1);
    }

    #[tokio::test]
    async fn test_dropped_receiver_releases_slot() {
        let gateway = Arc::new(MockAgentGateway::new());
        let (dispatcher, events) = AgentDispatcher::new(gateway);
        drop(events);

        dispatcher.dispatch(command(AgentTrigger::GoalFocused));
        tokio::time::timeout(Duration::from_secs(2), dispatcher.wait_idle())
            .await
            .expect("dispatcher should become idle");
    }
}
