//! Wizard controller - the session state machine
//!
//! LANDING → INTEL → SHIELD → DEPLOYMENT → RECON → BATTLE PLAN
//!
//! Synchronous and free of I/O. Every operation mutates the owned
//! `SessionState` and returns the agent call it wants made, if any.

pub mod effects;

pub use effects::{AgentCommand, AgentEvent, AgentOutcome, AgentTrigger};

use crate::calculator::{compute_surplus, project_growth, sip_bounds};
use crate::classifier::RiskProfileClassifier;
use crate::gate;
use crate::message_log::AgentLog;
use crate::models::{
    AdvisorResult, AgentMessage, AgentRole, CoachResult, CommanderResult, EducatorResult,
    FinancialAnalystResult, Leak, ModalContent, ModalKind, QuestionId, RiskAnswer, Screen,
    SessionState, MAX_EMERGENCY_FUND_MONTHS, MAX_SIP_YEARS, MIN_SIP_YEARS,
};
use tracing::{debug, info, warn};

pub const MAX_POWER_LEVEL: u8 = 100;

const JOURNEY_START_MESSAGE: &str =
    "User just started their financial journey on Screen 1 (The Intel)";

const TERM_WARNING_TITLE: &str = "Consider Keeping Term Insurance";
const TERM_WARNING: &str = "Term insurance protects your family in case of an emergency. \
It's one of the most important steps in financial planning. You can continue anyway, \
but we recommend keeping it.";

const HEALTH_WARNING_TITLE: &str = "Health Insurance is Essential";
const HEALTH_WARNING: &str = "Health insurance protects you from medical emergencies that \
could derail your entire financial plan. Medical costs are rising fast. We strongly \
recommend keeping this protection.";

const ADVICE_TITLE: &str = "Personal Advice";
const ANALYSIS_FALLBACK: &str = "Analysis complete";

/// Which start-screen convention the flow uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardConfig {
    pub include_landing: bool,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            include_landing: true,
        }
    }
}

impl WizardConfig {
    pub fn first_screen(&self) -> Screen {
        if self.include_landing {
            Screen::Landing
        } else {
            Screen::Intel
        }
    }
}

pub struct WizardController {
    config: WizardConfig,
    state: SessionState,
    log: AgentLog,
    modal: Option<ModalContent>,
    /// Screen whose "continue" is waiting on the Commander
    pending_advance: Option<Screen>,
    /// Deepest screen reached this session; bounds direct selection
    furthest_reached: Screen,
}

impl WizardController {
    pub fn new(config: WizardConfig) -> Self {
        Self::from_state(SessionState::new(config.first_screen()), config)
    }

    /// Resume a previously persisted session.
    pub fn from_state(mut state: SessionState, config: WizardConfig) -> Self {
        if state.current_screen < config.first_screen() {
            state.current_screen = config.first_screen();
        }
        state.power_level = state.power_level.min(MAX_POWER_LEVEL);
        state.profile.sanitize();
        let furthest_reached = state.current_screen;

        Self {
            config,
            state,
            log: AgentLog::new(),
            modal: None,
            pending_advance: None,
            furthest_reached,
        }
    }

    // =============================
    // Reads
    // =============================

    pub fn config(&self) -> WizardConfig {
        self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session_id(&self) -> &str {
        &self.state.session_id
    }

    pub fn current_screen(&self) -> Screen {
        self.state.current_screen
    }

    pub fn power_level(&self) -> u8 {
        self.state.power_level
    }

    pub fn log(&self) -> &AgentLog {
        &self.log
    }

    pub fn modal(&self) -> Option<&ModalContent> {
        self.modal.as_ref()
    }

    pub fn surplus(&self) -> i64 {
        compute_surplus(&self.state.profile)
    }

    pub fn projected_value(&self) -> i64 {
        project_growth(self.state.profile.sip_amount, self.state.profile.sip_years)
    }

    pub fn sip_bounds(&self) -> (u64, u64) {
        sip_bounds(&self.state.profile)
    }

    pub fn can_continue(&self) -> bool {
        let screen = self.state.current_screen;
        screen != Screen::Landing
            && !screen.is_terminal()
            && self.pending_advance.is_none()
            && gate::is_complete(screen, &self.state.profile)
    }

    pub fn is_advancing(&self) -> bool {
        self.pending_advance.is_some()
    }

    // =============================
    // Transitions
    // =============================

    /// Landing → Intel, announcing the journey to the Educator.
    pub fn start(&mut self) -> Option<AgentCommand> {
        if self.state.current_screen != Screen::Landing {
            debug!(screen = %self.state.current_screen, "start ignored outside landing");
            return None;
        }

        self.state.current_screen = Screen::Intel;
        self.furthest_reached = self.furthest_reached.max(Screen::Intel);
        info!(session_id = %self.state.session_id, "Journey started");

        Some(self.command(AgentTrigger::JourneyStarted, JOURNEY_START_MESSAGE.to_string()))
    }

    /// First half of "continue": check the gate and produce the Commander
    /// call. The screen does not move until `finish_continue`.
    pub fn begin_continue(&mut self) -> Option<AgentCommand> {
        if !self.can_continue() {
            debug!(
                screen = %self.state.current_screen,
                pending = self.pending_advance.is_some(),
                "continue ignored"
            );
            return None;
        }

        let screen = self.state.current_screen;
        self.pending_advance = Some(screen);

        let snapshot = serde_json::to_string(&self.state.profile).unwrap_or_default();
        let message = format!(
            "User completed screen {}. Financial data: {}",
            screen.index(),
            snapshot
        );

        Some(self.command(AgentTrigger::ScreenCompleted(screen), message))
    }

    /// Second half of "continue": merge the Commander answer (if any),
    /// add the fixed per-screen power and advance one screen.
    ///
    /// Commander failure never blocks the advance.
    pub fn finish_continue(&mut self, command: &AgentCommand, outcome: &AgentOutcome) -> Option<Screen> {
        if command.session_id != self.state.session_id {
            debug!("Commander answer for a previous session dropped");
            return None;
        }

        let from = self.pending_advance.take()?;

        match outcome
            .response()
            .and_then(|response| response.result_as::<CommanderResult>())
        {
            Some(result) => {
                self.add_power(result.power_level_update);
                if !result.message.is_empty() {
                    self.log
                        .append(AgentMessage::from_agent(AgentRole::Commander, result.message));
                }
            }
            None => {
                warn!(
                    session_id = %self.state.session_id,
                    screen = %from,
                    "Commander gave no usable answer; advancing anyway"
                );
            }
        }

        self.add_power(from.power_increment() as i64);

        let next = from.next()?;
        self.state.current_screen = next;
        self.furthest_reached = self.furthest_reached.max(next);

        info!(
            session_id = %self.state.session_id,
            from = %from,
            to = %next,
            power_level = self.state.power_level,
            "Screen advanced"
        );

        Some(next)
    }

    pub fn back(&mut self) -> bool {
        if self.pending_advance.is_some() {
            return false;
        }

        let current = self.state.current_screen;
        match current.prev() {
            Some(prev) if current > self.config.first_screen() => {
                self.state.current_screen = prev;
                debug!(from = %current, to = %prev, "Moved back");
                true
            }
            _ => false,
        }
    }

    pub fn furthest_reached(&self) -> Screen {
        self.furthest_reached
    }

    /// Jump straight to an already visited screen.
    pub fn select_screen(&mut self, target: Screen) -> bool {
        if self.pending_advance.is_some()
            || target < self.config.first_screen()
            || target > self.furthest_reached
        {
            return false;
        }
        self.state.current_screen = target;
        true
    }

    /// Throw the session away and start over with a new session id.
    pub fn reset(&mut self) {
        info!(session_id = %self.state.session_id, "Session reset");
        *self = Self::new(self.config);
    }

    // =============================
    // Field Inputs
    // =============================

    pub fn set_income(&mut self, raw: &str) -> Option<AgentCommand> {
        let value = parse_amount(raw);
        let changed = self.state.profile.income != value;
        self.state.profile.income = value;

        (changed && value > 0).then(|| {
            self.command(
                AgentTrigger::IncomeEntered,
                format!("User entered monthly income of ₹{}", value),
            )
        })
    }

    pub fn set_fixed_bills(&mut self, raw: &str) {
        self.state.profile.fixed_bills = parse_amount(raw);
    }

    pub fn toggle_leak(&mut self, leak: Leak) -> Option<AgentCommand> {
        let plugged = self.state.profile.plugged_leaks.toggle(leak);

        plugged.then(|| {
            self.command(
                AgentTrigger::LeakPlugged,
                format!("User plugged {} leak, saving ₹{}", leak.label(), leak.savings()),
            )
        })
    }

    pub fn toggle_term_insurance(&mut self) -> Option<AgentCommand> {
        let was_on = self.state.profile.term_insurance;
        if was_on {
            self.open_modal(TERM_WARNING_TITLE, TERM_WARNING, ModalKind::Warning);
        }
        self.state.profile.term_insurance = !was_on;

        Some(self.command(
            AgentTrigger::TermInsuranceToggled,
            format!("User {} term insurance", toggle_verb(was_on)),
        ))
    }

    pub fn toggle_health_insurance(&mut self) -> Option<AgentCommand> {
        let was_on = self.state.profile.health_insurance;
        if was_on {
            self.open_modal(HEALTH_WARNING_TITLE, HEALTH_WARNING, ModalKind::Warning);
        }
        self.state.profile.health_insurance = !was_on;

        Some(self.command(
            AgentTrigger::HealthInsuranceToggled,
            format!("User {} health insurance", toggle_verb(was_on)),
        ))
    }

    pub fn set_emergency_fund_months(&mut self, months: i64) {
        self.state.profile.emergency_fund_months =
            months.clamp(0, MAX_EMERGENCY_FUND_MONTHS as i64) as u8;
    }

    pub fn focus_goal(&mut self) -> Option<AgentCommand> {
        Some(self.command(
            AgentTrigger::GoalFocused,
            format!(
                "User is setting financial goal. Monthly surplus: ₹{}",
                self.surplus()
            ),
        ))
    }

    pub fn set_financial_goal(&mut self, goal: &str) {
        self.state.profile.financial_goal = goal.to_string();
    }

    pub fn set_sip_amount(&mut self, amount: i64) -> Option<AgentCommand> {
        let (low, high) = self.sip_bounds();
        let value = amount.clamp(low as i64, high as i64) as u64;
        let changed = self.state.profile.sip_amount != value;
        self.state.profile.sip_amount = value;

        changed.then(|| {
            self.command(
                AgentTrigger::SipAmountChanged,
                format!("User set SIP amount to ₹{}", value),
            )
        })
    }

    pub fn set_sip_years(&mut self, years: i64) {
        self.state.profile.sip_years = years.clamp(MIN_SIP_YEARS as i64, MAX_SIP_YEARS as i64) as u32;
    }

    /// Record a quiz answer. Once all three are answered the risk profile
    /// is derived again and the Advisor is told.
    pub fn answer_quiz(&mut self, question: QuestionId, answer: RiskAnswer) -> Option<AgentCommand> {
        if !self.state.profile.quiz_answers.set(question, answer) {
            return None;
        }

        let profile = RiskProfileClassifier::classify_quiz(&self.state.profile.quiz_answers)?;
        self.state.profile.risk_profile = Some(profile);
        info!(session_id = %self.state.session_id, risk_profile = %profile, "Risk profile derived");

        Some(self.command(
            AgentTrigger::QuizCompleted,
            format!(
                "User completed risk quiz. Profile: {}. Monthly surplus: ₹{}",
                profile,
                self.surplus()
            ),
        ))
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }

    // =============================
    // Agent Results
    // =============================

    /// Merge the answer of a fire-and-forget call.
    ///
    /// Returns whether anything visible changed. Failures, non-success
    /// answers and answers for another session change nothing.
    pub fn apply_agent_event(&mut self, event: &AgentEvent) -> bool {
        let command = &event.command;
        if command.session_id != self.state.session_id {
            debug!(trigger = ?command.trigger, "Agent answer for a previous session dropped");
            return false;
        }

        let Some(response) = event.outcome.response() else {
            return false;
        };

        match command.trigger {
            AgentTrigger::JourneyStarted => match response.result_as::<EducatorResult>() {
                Some(lesson) => {
                    self.open_modal(&lesson.title, &lesson.simple_explanation, ModalKind::Education);
                    true
                }
                None => false,
            },
            AgentTrigger::IncomeEntered
            | AgentTrigger::LeakPlugged
            | AgentTrigger::SipAmountChanged => {
                match response.result_as::<FinancialAnalystResult>() {
                    Some(analysis) => {
                        let text = analysis
                            .recommendations
                            .into_iter()
                            .next()
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| ANALYSIS_FALLBACK.to_string());
                        self.append_log(AgentRole::FinancialAnalyst, text)
                    }
                    None => false,
                }
            }
            AgentTrigger::HealthInsuranceToggled => match response.result_as::<CoachResult>() {
                Some(coach) => self.append_log(AgentRole::Coach, coach.primary_message),
                None => false,
            },
            AgentTrigger::TermInsuranceToggled => match response.result_as::<AdvisorResult>() {
                Some(advice) => self.append_log(AgentRole::Advisor, advice.primary_recommendation),
                None => false,
            },
            AgentTrigger::GoalFocused => match response.result_as::<AdvisorResult>() {
                Some(advice) => {
                    self.open_modal(ADVICE_TITLE, &advice.primary_recommendation, ModalKind::Advice);
                    true
                }
                None => false,
            },
            AgentTrigger::QuizCompleted => match response.result_as::<AdvisorResult>() {
                Some(advice) => {
                    self.open_modal(ADVICE_TITLE, &advice.primary_recommendation, ModalKind::Advice);
                    self.append_log(AgentRole::Advisor, advice.primary_recommendation);
                    true
                }
                None => false,
            },
            // Awaited by the runtime and merged through finish_continue
            AgentTrigger::ScreenCompleted(_) => false,
        }
    }

    // =============================
    // Internals
    // =============================

    fn command(&self, trigger: AgentTrigger, message: String) -> AgentCommand {
        AgentCommand::new(trigger, message, &self.state.session_id)
    }

    fn open_modal(&mut self, title: &str, content: &str, kind: ModalKind) {
        self.modal = Some(ModalContent {
            title: title.to_string(),
            content: content.to_string(),
            kind,
        });
    }

    fn append_log(&mut self, role: AgentRole, text: String) -> bool {
        if text.is_empty() {
            return false;
        }
        self.log.append(AgentMessage::from_agent(role, text));
        true
    }

    /// Add power, clamped to [0, 100]. Negative deltas are ignored so the
    /// level never falls outside of a reset.
    fn add_power(&mut self, delta: i64) {
        let before = self.state.power_level;
        let next = (before as i64).saturating_add(delta.max(0));
        self.state.power_level = next.min(MAX_POWER_LEVEL as i64) as u8;

        if before < MAX_POWER_LEVEL && self.state.power_level == MAX_POWER_LEVEL {
            info!(session_id = %self.state.session_id, "Power level maxed out");
        }
    }
}

fn toggle_verb(was_on: bool) -> &'static str {
    if was_on {
        "disabled"
    } else {
        "enabled"
    }
}

/// Coerce free text into a whole amount: leading digits are read, anything
/// else (empty, non-numeric, negative) becomes zero.
pub fn parse_amount(raw: &str) -> u64 {
    let trimmed = raw.trim();
    if trimmed.starts_with('-') {
        return 0;
    }
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

    digits
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .try_fold(0u64, |acc, c| {
            acc.checked_mul(10)?.checked_add(c.to_digit(10)? as u64)
        })
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::AgentResponse;
    use crate::models::RiskProfile;
    use serde_json::json;

    fn answered(command: &AgentCommand, result: serde_json::Value) -> AgentEvent {
        AgentEvent {
            command: command.clone(),
            outcome: AgentOutcome::Answered(AgentResponse::success(result)),
        }
    }

    fn commander(delta: i64) -> AgentOutcome {
        AgentOutcome::Answered(AgentResponse::success(json!({
            "power_level_update": delta,
            "message": "Onward"
        })))
    }

    fn intel_ready() -> WizardController {
        let mut wizard = WizardController::new(WizardConfig::default());
        wizard.start();
        wizard.set_income("80000");
        wizard.set_fixed_bills("45000");
        wizard
    }

    fn continue_with(wizard: &mut WizardController, outcome: AgentOutcome) -> Option<Screen> {
        let command = wizard.begin_continue()?;
        wizard.finish_continue(&command, &outcome)
    }

    #[test]
    fn test_start_moves_to_intel_and_calls_educator() {
        let mut wizard = WizardController::new(WizardConfig::default());
        assert_eq!(wizard.current_screen(), Screen::Landing);

        let command = wizard.start().unwrap();
        assert_eq!(command.role, AgentRole::Educator);
        assert_eq!(wizard.current_screen(), Screen::Intel);
        assert!(wizard.start().is_none());
    }

    #[test]
    fn test_no_landing_variant_starts_on_intel() {
        let mut wizard = WizardController::new(WizardConfig {
            include_landing: false,
        });
        assert_eq!(wizard.current_screen(), Screen::Intel);
        assert!(!wizard.back());
    }

    #[test]
    fn test_intel_scenario() {
        let mut wizard = WizardController::new(WizardConfig::default());
        wizard.start();
        assert!(wizard.set_income("80000").is_some());
        wizard.set_fixed_bills("45000");
        let leak = wizard.toggle_leak(Leak::Dining).unwrap();
        assert_eq!(leak.message, "User plugged Dining Out leak, saving ₹5000");
        wizard.toggle_leak(Leak::Subscriptions);
        assert_eq!(wizard.surplus(), 43_000);

        let next = continue_with(&mut wizard, commander(0)).unwrap();
        assert_eq!(next, Screen::Shield);
        assert!(wizard.power_level() >= 20);
        assert_eq!(wizard.log().len(), 1);
    }

    #[test]
    fn test_continue_blocked_by_gate() {
        let mut wizard = WizardController::new(WizardConfig::default());
        wizard.start();
        wizard.set_income("80000");
        assert!(wizard.begin_continue().is_none());
        assert_eq!(wizard.current_screen(), Screen::Intel);
        assert_eq!(wizard.power_level(), 0);
    }

    #[test]
    fn test_unanswered_quiz_keeps_recon() {
        let mut wizard = intel_ready();
        for _ in 0..3 {
            continue_with(&mut wizard, commander(0));
        }
        assert_eq!(wizard.current_screen(), Screen::Recon);

        wizard.answer_quiz(QuestionId::Q1, RiskAnswer::Moderate);
        wizard.answer_quiz(QuestionId::Q2, RiskAnswer::Moderate);
        assert!(wizard.begin_continue().is_none());
        assert_eq!(wizard.current_screen(), Screen::Recon);
    }

    #[test]
    fn test_full_walk_power_levels() {
        let mut wizard = intel_ready();
        let mut levels = Vec::new();
        for q in [QuestionId::Q1, QuestionId::Q2, QuestionId::Q3] {
            wizard.answer_quiz(q, RiskAnswer::Aggressive);
        }
        while wizard.can_continue() {
            continue_with(&mut wizard, commander(0));
            levels.push(wizard.power_level());
        }
        assert_eq!(levels, vec![20, 50, 70, 85]);
        assert_eq!(wizard.current_screen(), Screen::BattlePlan);
        assert!(wizard.begin_continue().is_none());
    }

    #[test]
    fn test_power_is_clamped_under_huge_deltas() {
        let mut wizard = intel_ready();
        for q in [QuestionId::Q1, QuestionId::Q2, QuestionId::Q3] {
            wizard.answer_quiz(q, RiskAnswer::Moderate);
        }
        while wizard.can_continue() {
            continue_with(&mut wizard, commander(i64::MAX));
            assert!(wizard.power_level() <= MAX_POWER_LEVEL);
        }
        assert_eq!(wizard.power_level(), 100);
    }

    #[test]
    fn test_negative_commander_delta_never_lowers_power() {
        let mut wizard = intel_ready();
        continue_with(&mut wizard, commander(-50));
        assert_eq!(wizard.power_level(), 20);
    }

    #[test]
    fn test_commander_failure_still_advances_with_fixed_increment() {
        let mut wizard = intel_ready();
        let next = continue_with(&mut wizard, AgentOutcome::Failed("timeout".into()));
        assert_eq!(next, Some(Screen::Shield));
        assert_eq!(wizard.power_level(), 20);
        assert!(wizard.log().is_empty());

        let rejected = AgentOutcome::Answered(AgentResponse::failure("nope"));
        continue_with(&mut wizard, rejected);
        assert_eq!(wizard.current_screen(), Screen::Deployment);
        assert_eq!(wizard.power_level(), 50);
    }

    #[test]
    fn test_commander_answer_with_loose_number_types() {
        let mut wizard = intel_ready();
        let outcome = AgentOutcome::Answered(AgentResponse::success(json!({
            "financial_analysis": { "surplus": 35000 },
            "power_level_update": 10.0,
            "message": "Onward"
        })));
        continue_with(&mut wizard, outcome);

        assert_eq!(wizard.power_level(), 30);
        assert_eq!(wizard.log().len(), 1);
    }

    #[test]
    fn test_commander_delta_adds_to_fixed_increment() {
        let mut wizard = intel_ready();
        continue_with(&mut wizard, commander(5));
        assert_eq!(wizard.power_level(), 25);
    }

    #[test]
    fn test_second_continue_while_pending_is_ignored() {
        let mut wizard = intel_ready();
        let command = wizard.begin_continue().unwrap();
        assert!(wizard.begin_continue().is_none());
        assert!(!wizard.back());
        wizard.finish_continue(&command, &commander(0));
        assert_eq!(wizard.current_screen(), Screen::Shield);
    }

    #[test]
    fn test_commander_message_snapshot() {
        let mut wizard = intel_ready();
        let command = wizard.begin_continue().unwrap();
        assert_eq!(command.role, AgentRole::Commander);
        assert!(command.message.starts_with("User completed screen 1. Financial data: {"));
        assert!(command.message.contains("\"income\":80000"));
    }

    #[test]
    fn test_back_and_select() {
        let mut wizard = intel_ready();
        continue_with(&mut wizard, commander(0));
        continue_with(&mut wizard, commander(0));
        assert_eq!(wizard.current_screen(), Screen::Deployment);

        assert!(!wizard.select_screen(Screen::Recon));
        assert!(wizard.select_screen(Screen::Intel));
        assert_eq!(wizard.current_screen(), Screen::Intel);

        assert!(wizard.back());
        assert_eq!(wizard.current_screen(), Screen::Landing);
        assert!(!wizard.back());
        assert_eq!(wizard.power_level(), 50);
    }

    #[test]
    fn test_select_returns_to_cleared_screen_after_going_back() {
        let mut wizard = intel_ready();
        continue_with(&mut wizard, commander(0));
        continue_with(&mut wizard, commander(0));
        assert_eq!(wizard.furthest_reached(), Screen::Deployment);

        assert!(wizard.back());
        assert!(wizard.back());
        assert_eq!(wizard.current_screen(), Screen::Intel);

        assert!(wizard.select_screen(Screen::Deployment));
        assert_eq!(wizard.current_screen(), Screen::Deployment);
        assert!(!wizard.select_screen(Screen::Recon));

        wizard.reset();
        assert_eq!(wizard.furthest_reached(), Screen::Landing);
        assert!(!wizard.select_screen(Screen::Intel));
    }

    #[test]
    fn test_quiz_derives_profile_and_rederives_on_change() {
        let mut wizard = intel_ready();
        assert!(wizard.answer_quiz(QuestionId::Q1, RiskAnswer::Aggressive).is_none());
        assert!(wizard.answer_quiz(QuestionId::Q2, RiskAnswer::Aggressive).is_none());
        let command = wizard
            .answer_quiz(QuestionId::Q3, RiskAnswer::Moderate)
            .unwrap();
        assert_eq!(command.role, AgentRole::Advisor);
        assert!(command.message.contains("Profile: Aggressive Investor"));
        assert!(command.message.contains("Monthly surplus: ₹35000"));
        assert_eq!(wizard.state().profile.risk_profile, Some(RiskProfile::Aggressive));

        // Same answer again is not a change
        assert!(wizard.answer_quiz(QuestionId::Q3, RiskAnswer::Moderate).is_none());

        wizard.answer_quiz(QuestionId::Q1, RiskAnswer::Conservative);
        wizard.answer_quiz(QuestionId::Q2, RiskAnswer::Conservative);
        assert_eq!(wizard.state().profile.risk_profile, Some(RiskProfile::Conservative));
    }

    #[test]
    fn test_insurance_off_opens_warning_and_calls_agents() {
        let mut wizard = intel_ready();
        let term = wizard.toggle_term_insurance().unwrap();
        assert_eq!(term.role, AgentRole::Advisor);
        assert_eq!(term.message, "User disabled term insurance");
        assert_eq!(wizard.modal().unwrap().kind, ModalKind::Warning);

        wizard.dismiss_modal();
        let term = wizard.toggle_term_insurance().unwrap();
        assert_eq!(term.message, "User enabled term insurance");
        assert!(wizard.modal().is_none());

        let health = wizard.toggle_health_insurance().unwrap();
        assert_eq!(health.role, AgentRole::Coach);
        assert_eq!(wizard.modal().unwrap().title, "Health Insurance is Essential");
    }

    #[test]
    fn test_input_coercion() {
        assert_eq!(parse_amount("80000"), 80_000);
        assert_eq!(parse_amount(" 120abc"), 120);
        assert_eq!(parse_amount("abc"), 0);
        assert_eq!(parse_amount(""), 0);
        assert_eq!(parse_amount("-500"), 0);
        assert_eq!(parse_amount("99999999999999999999999"), u64::MAX);

        let mut wizard = WizardController::new(WizardConfig::default());
        assert!(wizard.set_income("lots").is_none());
        assert_eq!(wizard.state().profile.income, 0);
    }

    #[test]
    fn test_field_clamps() {
        let mut wizard = intel_ready();
        wizard.set_emergency_fund_months(40);
        assert_eq!(wizard.state().profile.emergency_fund_months, 12);
        wizard.set_sip_years(0);
        assert_eq!(wizard.state().profile.sip_years, 1);

        let command = wizard.set_sip_amount(500_000).unwrap();
        assert_eq!(wizard.state().profile.sip_amount, 35_000);
        assert_eq!(command.message, "User set SIP amount to ₹35000");
        assert!(wizard.set_sip_amount(35_000).is_none());
    }

    #[test]
    fn test_fire_and_forget_results() {
        let mut wizard = intel_ready();

        let income = wizard.set_income("90000").unwrap();
        assert!(wizard.apply_agent_event(&answered(
            &income,
            json!({"recommendations": ["Build an emergency fund"]})
        )));
        assert!(wizard.apply_agent_event(&answered(&income, json!({"recommendations": []}))));

        let texts: Vec<&str> = wizard.log().messages().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["Build an emergency fund", "Analysis complete"]);

        let goal = wizard.focus_goal().unwrap();
        wizard.apply_agent_event(&answered(
            &goal,
            json!({"primary_recommendation": "Save for a home"}),
        ));
        let modal = wizard.modal().unwrap();
        assert_eq!(modal.title, "Personal Advice");
        assert_eq!(modal.content, "Save for a home");
        assert_eq!(wizard.power_level(), 0);
    }

    #[test]
    fn test_failed_results_change_nothing() {
        let mut wizard = intel_ready();
        let income = wizard.set_income("90000").unwrap();
        let event = AgentEvent {
            command: income,
            outcome: AgentOutcome::Failed("network".into()),
        };
        assert!(!wizard.apply_agent_event(&event));
        assert!(wizard.log().is_empty());
    }

    #[test]
    fn test_results_from_previous_session_are_dropped() {
        let mut wizard = intel_ready();
        let stale = wizard.set_income("90000").unwrap();
        wizard.reset();

        assert!(!wizard.apply_agent_event(&answered(
            &stale,
            json!({"recommendations": ["old"]})
        )));
        assert!(wizard.log().is_empty());
        assert_eq!(wizard.current_screen(), Screen::Landing);
        assert_eq!(wizard.state().profile, crate::models::UserProfile::default());
        assert_ne!(wizard.session_id(), stale.session_id);
    }

    #[test]
    fn test_restore_sanitizes_state() {
        let mut state = SessionState::new(Screen::Landing);
        state.power_level = 250;
        state.profile.sip_years = 99;
        let wizard = WizardController::from_state(
            state,
            WizardConfig {
                include_landing: false,
            },
        );
        assert_eq!(wizard.power_level(), 100);
        assert_eq!(wizard.current_screen(), Screen::Intel);
        assert_eq!(wizard.state().profile.sip_years, 30);
    }

    #[test]
    fn test_restore_lifts_zero_sip_amount_to_floor() {
        let state = crate::state::decode_record(
            r#"{"currentScreen":3,"powerLevel":50,"userData":{"income":80000,"fixedBills":45000,"sipAmount":0},"sessionId":"session_x"}"#,
        )
        .unwrap();
        let wizard = WizardController::from_state(state, WizardConfig::default());

        assert_eq!(wizard.state().profile.sip_amount, 1000);
        assert_eq!(wizard.current_screen(), Screen::Deployment);
        assert!(wizard.can_continue());

        let mut state = SessionState::new(Screen::Landing);
        state.profile.sip_amount = 500_000;
        let wizard = WizardController::from_state(state, WizardConfig::default());
        assert_eq!(wizard.state().profile.sip_amount, 100_000);

        // The default amount survives a restore before income is entered
        let wizard = WizardController::from_state(
            SessionState::new(Screen::Landing),
            WizardConfig::default(),
        );
        assert_eq!(wizard.state().profile.sip_amount, 5000);
    }
}
