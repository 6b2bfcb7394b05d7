//! Core data models for the money commander wizard

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Screens =================
//

/// The six positions of the wizard. `Landing` is only part of the flow
/// when the landing screen is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Screen {
    Landing = 0,
    Intel = 1,
    Shield = 2,
    Deployment = 3,
    Recon = 4,
    BattlePlan = 5,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Landing,
        Screen::Intel,
        Screen::Shield,
        Screen::Deployment,
        Screen::Recon,
        Screen::BattlePlan,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Screen> {
        Screen::try_from(self.index() + 1).ok()
    }

    pub fn prev(self) -> Option<Screen> {
        self.index().checked_sub(1).and_then(|i| Screen::try_from(i).ok())
    }

    /// No forward transition exists past the battle plan.
    pub fn is_terminal(self) -> bool {
        matches!(self, Screen::BattlePlan)
    }

    /// Fixed power awarded for completing this screen.
    pub fn power_increment(self) -> u8 {
        match self {
            Screen::Intel => 20,
            Screen::Shield => 30,
            Screen::Deployment => 20,
            Screen::Recon => 15,
            Screen::Landing | Screen::BattlePlan => 0,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Landing => "Landing",
            Screen::Intel => "The Intel",
            Screen::Shield => "The Shield",
            Screen::Deployment => "The Deployment",
            Screen::Recon => "The Recon",
            Screen::BattlePlan => "Battle Plan",
        }
    }
}

impl TryFrom<u8> for Screen {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Screen::Landing),
            1 => Ok(Screen::Intel),
            2 => Ok(Screen::Shield),
            3 => Ok(Screen::Deployment),
            4 => Ok(Screen::Recon),
            5 => Ok(Screen::BattlePlan),
            other => Err(format!("screen index {} is outside 0..=5", other)),
        }
    }
}

impl From<Screen> for u8 {
    fn from(screen: Screen) -> Self {
        screen.index()
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

//
// ================= Leaks =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Leak {
    Dining,
    Subscriptions,
    ImpulseBuys,
}

impl Leak {
    pub const ALL: [Leak; 3] = [Leak::Dining, Leak::Subscriptions, Leak::ImpulseBuys];

    /// Monthly amount recovered by plugging this leak.
    pub fn savings(self) -> i64 {
        match self {
            Leak::Dining => 5000,
            Leak::Subscriptions => 3000,
            Leak::ImpulseBuys => 4000,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Leak::Dining => "Dining Out",
            Leak::Subscriptions => "Unused Subscriptions",
            Leak::ImpulseBuys => "Impulse Buys",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PluggedLeaks {
    pub dining: bool,
    pub subscriptions: bool,
    pub impulse_buys: bool,
}

impl PluggedLeaks {
    pub fn is_plugged(&self, leak: Leak) -> bool {
        match leak {
            Leak::Dining => self.dining,
            Leak::Subscriptions => self.subscriptions,
            Leak::ImpulseBuys => self.impulse_buys,
        }
    }

    /// Flip one leak and return its new state.
    pub fn toggle(&mut self, leak: Leak) -> bool {
        let slot = match leak {
            Leak::Dining => &mut self.dining,
            Leak::Subscriptions => &mut self.subscriptions,
            Leak::ImpulseBuys => &mut self.impulse_buys,
        };
        *slot = !*slot;
        *slot
    }

    pub fn plugged(&self) -> impl Iterator<Item = Leak> + '_ {
        Leak::ALL.into_iter().filter(|leak| self.is_plugged(*leak))
    }
}

//
// ================= Risk Quiz =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskAnswer {
    Conservative,
    Moderate,
    Aggressive,
}

impl RiskAnswer {
    pub const ALL: [RiskAnswer; 3] = [
        RiskAnswer::Conservative,
        RiskAnswer::Moderate,
        RiskAnswer::Aggressive,
    ];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum QuestionId {
    Q1,
    Q2,
    Q3,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QuizAnswers {
    #[serde(with = "blank_as_none")]
    pub q1: Option<RiskAnswer>,
    #[serde(with = "blank_as_none")]
    pub q2: Option<RiskAnswer>,
    #[serde(with = "blank_as_none")]
    pub q3: Option<RiskAnswer>,
}

impl QuizAnswers {
    pub fn get(&self, question: QuestionId) -> Option<RiskAnswer> {
        match question {
            QuestionId::Q1 => self.q1,
            QuestionId::Q2 => self.q2,
            QuestionId::Q3 => self.q3,
        }
    }

    /// Record an answer; returns whether the stored value changed.
    pub fn set(&mut self, question: QuestionId, answer: RiskAnswer) -> bool {
        let slot = match question {
            QuestionId::Q1 => &mut self.q1,
            QuestionId::Q2 => &mut self.q2,
            QuestionId::Q3 => &mut self.q3,
        };
        let changed = *slot != Some(answer);
        *slot = Some(answer);
        changed
    }

    /// All three answers, or `None` while any is missing.
    pub fn complete(&self) -> Option<[RiskAnswer; 3]> {
        Some([self.q1?, self.q2?, self.q3?])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RiskProfile {
    #[serde(rename = "Conservative Investor")]
    Conservative,
    #[serde(rename = "Moderate Investor")]
    Moderate,
    #[serde(rename = "Aggressive Investor")]
    Aggressive,
}

impl RiskProfile {
    pub fn label(self) -> &'static str {
        match self {
            RiskProfile::Conservative => "Conservative Investor",
            RiskProfile::Moderate => "Moderate Investor",
            RiskProfile::Aggressive => "Aggressive Investor",
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

//
// ================= Profile & Session =================
//

pub const MIN_SIP_AMOUNT: u64 = 1000;
pub const MAX_SIP_AMOUNT: u64 = 100_000;
pub const MAX_EMERGENCY_FUND_MONTHS: u8 = 12;
pub const MIN_SIP_YEARS: u32 = 1;
pub const MAX_SIP_YEARS: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub income: u64,
    pub fixed_bills: u64,
    pub plugged_leaks: PluggedLeaks,
    pub term_insurance: bool,
    pub health_insurance: bool,
    pub emergency_fund_months: u8,
    pub sip_amount: u64,
    pub sip_years: u32,
    pub financial_goal: String,
    pub quiz_answers: QuizAnswers,
    #[serde(with = "blank_as_none")]
    pub risk_profile: Option<RiskProfile>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            income: 0,
            fixed_bills: 0,
            plugged_leaks: PluggedLeaks::default(),
            term_insurance: true,
            health_insurance: true,
            emergency_fund_months: 6,
            sip_amount: 5000,
            sip_years: 10,
            financial_goal: String::new(),
            quiz_answers: QuizAnswers::default(),
            risk_profile: None,
        }
    }
}

impl UserProfile {
    /// Pull out-of-domain values back into their documented ranges.
    pub fn sanitize(&mut self) {
        self.emergency_fund_months = self.emergency_fund_months.min(MAX_EMERGENCY_FUND_MONTHS);
        self.sip_years = self.sip_years.clamp(MIN_SIP_YEARS, MAX_SIP_YEARS);
        self.sip_amount = self.sip_amount.clamp(MIN_SIP_AMOUNT, MAX_SIP_AMOUNT);
    }
}

/// Aggregate root persisted to the durable slot.
///
/// Field order is the on-disk order; do not reorder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_screen: Screen,
    pub power_level: u8,
    #[serde(rename = "userData")]
    pub profile: UserProfile,
    pub session_id: String,
}

impl SessionState {
    pub fn new(start: Screen) -> Self {
        Self {
            current_screen: start,
            power_level: 0,
            profile: UserProfile::default(),
            session_id: new_session_id(),
        }
    }
}

pub fn new_session_id() -> String {
    format!("session_{}", uuid::Uuid::new_v4().simple())
}

//
// ================= Agents =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Commander,
    FinancialAnalyst,
    Coach,
    Educator,
    Advisor,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Commander,
        AgentRole::FinancialAnalyst,
        AgentRole::Coach,
        AgentRole::Educator,
        AgentRole::Advisor,
    ];

    /// Static identifier of the remote agent serving this role.
    pub fn agent_id(self) -> &'static str {
        match self {
            AgentRole::Commander => "6985a453301c62c7ca2c7de1",
            AgentRole::FinancialAnalyst => "6985a3ede17e33c11eed1b5a",
            AgentRole::Coach => "6985a405e17e33c11eed1b5d",
            AgentRole::Educator => "6985a41bb37fff3a03c07c72",
            AgentRole::Advisor => "6985a434e2c0086a4fc43bd5",
        }
    }

    pub fn from_agent_id(id: &str) -> Option<AgentRole> {
        AgentRole::ALL.into_iter().find(|role| role.agent_id() == id)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            AgentRole::Commander => "Commander",
            AgentRole::FinancialAnalyst => "Financial Analyst",
            AgentRole::Coach => "Coach",
            AgentRole::Educator => "Educator",
            AgentRole::Advisor => "Advisor",
        }
    }

    pub fn category(self) -> MessageCategory {
        match self {
            AgentRole::Commander => MessageCategory::Orchestration,
            AgentRole::FinancialAnalyst => MessageCategory::Analysis,
            AgentRole::Coach => MessageCategory::Encouragement,
            AgentRole::Educator => MessageCategory::Education,
            AgentRole::Advisor => MessageCategory::Advice,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageCategory {
    Analysis,
    Encouragement,
    Education,
    Advice,
    Orchestration,
}

/// Immutable entry of the agent message log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMessage {
    pub agent_name: String,
    pub text: String,
    pub category: MessageCategory,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub fn from_agent(role: AgentRole, text: impl Into<String>) -> Self {
        Self {
            agent_name: role.display_name().to_string(),
            text: text.into(),
            category: role.category(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Warning,
    Education,
    Advice,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModalContent {
    pub title: String,
    pub content: String,
    pub kind: ModalKind,
}

//
// ================= Agent Result Shapes =================
//

// Any field may arrive as a string, a number or null; each one is
// coerced on its own.

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialAnalystResult {
    #[serde(deserialize_with = "lenient::number")]
    pub health_score: f64,
    pub ratio_analysis: RatioAnalysis,
    #[serde(deserialize_with = "lenient::text_list")]
    pub risk_flags: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub opportunity_alerts: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatioAnalysis {
    #[serde(deserialize_with = "lenient::text")]
    pub income_to_expense: String,
    #[serde(deserialize_with = "lenient::text")]
    pub savings_rate: String,
    #[serde(deserialize_with = "lenient::text")]
    pub debt_to_income: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CoachResult {
    #[serde(deserialize_with = "lenient::text")]
    pub message_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub primary_message: String,
    #[serde(deserialize_with = "lenient::text")]
    pub behavioral_insight: String,
    #[serde(deserialize_with = "lenient::text")]
    pub suggested_action: String,
    #[serde(deserialize_with = "lenient::text")]
    pub motivation_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EducatorResult {
    #[serde(deserialize_with = "lenient::text")]
    pub lesson_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(deserialize_with = "lenient::text")]
    pub simple_explanation: String,
    #[serde(deserialize_with = "lenient::text")]
    pub detailed_explanation: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub key_takeaways: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub related_concepts: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub literacy_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorResult {
    #[serde(deserialize_with = "lenient::text")]
    pub advice_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub primary_recommendation: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub clarifying_questions: Vec<String>,
    pub personalized_suggestions: PersonalizedSuggestions,
    #[serde(deserialize_with = "lenient::text")]
    pub risk_assessment: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub next_steps: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalizedSuggestions {
    #[serde(deserialize_with = "lenient::optional_text")]
    pub recommended_amount: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text")]
    pub rationale: Option<String>,
    #[serde(deserialize_with = "lenient::optional_text_list")]
    pub alternatives: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderResult {
    #[serde(deserialize_with = "lenient::text")]
    pub current_screen: String,
    pub financial_analysis: CommanderAnalysis,
    #[serde(deserialize_with = "lenient::text")]
    pub handoff_to: String,
    #[serde(deserialize_with = "lenient::text")]
    pub next_screen_suggestion: String,
    pub user_profile_update: ProfileUpdate,
    #[serde(deserialize_with = "lenient::whole_number")]
    pub power_level_update: i64,
    #[serde(deserialize_with = "lenient::text")]
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommanderAnalysis {
    #[serde(deserialize_with = "lenient::number")]
    pub health_score: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub surplus: String,
    #[serde(deserialize_with = "lenient::text")]
    pub insights: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    #[serde(deserialize_with = "lenient::text")]
    pub risk_tolerance: String,
    #[serde(deserialize_with = "lenient::text")]
    pub emotional_state: String,
    #[serde(deserialize_with = "lenient::text")]
    pub literacy_level: String,
}

/// Field coercions for agent results
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn to_text(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(text) => text,
            other => other.to_string(),
        }
    }

    fn to_number(value: &Value) -> f64 {
        let number = match value {
            Value::Number(n) => n.as_f64().unwrap_or(0.0),
            Value::String(text) => text.trim().trim_end_matches('%').parse::<f64>().unwrap_or(0.0),
            _ => 0.0,
        };
        if number.is_finite() {
            number
        } else {
            0.0
        }
    }

    fn to_text_list(value: Value) -> Vec<String> {
        match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items.into_iter().map(to_text).collect(),
            single => vec![to_text(single)],
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(to_text(Value::deserialize(deserializer)?))
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            value => Some(to_text(value)),
        })
    }

    pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(to_text_list(Value::deserialize(deserializer)?))
    }

    pub fn optional_text_list<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<String>>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            value => Some(to_text_list(value)),
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(to_number(&Value::deserialize(deserializer)?))
    }

    /// Any JSON number, rounded; saturates at the `i64` range.
    pub fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Some(whole) = value.as_i64() {
            return Ok(whole);
        }
        Ok(to_number(&value).round() as i64)
    }
}

/// Serializes `None` as the empty string the durable record uses for
/// "unanswered", and reads `""` or `null` back as `None`.
mod blank_as_none {
    use serde::de::value::StringDeserializer;
    use serde::de::{DeserializeOwned, IntoDeserializer};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            Some(text) if !text.is_empty() => {
                let de: StringDeserializer<D::Error> = text.into_deserializer();
                T::deserialize(de).map(Some)
            }
            _ => Ok(None),
        }
    }
}
