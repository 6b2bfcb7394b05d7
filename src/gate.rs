//! Screen completion gate
//!
//! One pure predicate per screen deciding whether "continue" is allowed.
//! Evaluated on every read; nothing is cached.

use crate::models::{Screen, UserProfile};
use serde::Serialize;

type Predicate = fn(&UserProfile) -> bool;

struct CompletionRule {
    screen: Screen,
    name: &'static str,
    check: Predicate,
}

const RULES: &[CompletionRule] = &[
    CompletionRule {
        screen: Screen::Landing,
        name: "landing_has_no_inputs",
        check: always,
    },
    CompletionRule {
        screen: Screen::Intel,
        name: "income_and_bills_entered",
        check: intel_complete,
    },
    CompletionRule {
        screen: Screen::Shield,
        name: "protection_choices_optional",
        check: always,
    },
    CompletionRule {
        screen: Screen::Deployment,
        name: "sip_amount_set",
        check: deployment_complete,
    },
    CompletionRule {
        screen: Screen::Recon,
        name: "risk_quiz_answered",
        check: recon_complete,
    },
];

fn always(_: &UserProfile) -> bool {
    true
}

fn intel_complete(p: &UserProfile) -> bool {
    p.income > 0 && p.fixed_bills > 0
}

fn deployment_complete(p: &UserProfile) -> bool {
    p.sip_amount > 0
}

fn recon_complete(p: &UserProfile) -> bool {
    p.quiz_answers.complete().is_some()
}

/// Whether the user may move forward from `screen`.
///
/// The battle plan is terminal and never completes.
pub fn is_complete(screen: Screen, profile: &UserProfile) -> bool {
    RULES
        .iter()
        .find(|rule| rule.screen == screen)
        .map(|rule| (rule.check)(profile))
        .unwrap_or(false)
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GateCheck {
    pub screen: Screen,
    pub rule_name: &'static str,
    pub passed: bool,
}

/// Evaluate every gated screen, in screen order.
pub fn evaluate_all(profile: &UserProfile) -> Vec<GateCheck> {
    RULES
        .iter()
        .filter(|rule| rule.screen != Screen::Landing)
        .map(|rule| GateCheck {
            screen: rule.screen,
            rule_name: rule.name,
            passed: (rule.check)(profile),
        })
        .collect()
}
