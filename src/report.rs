//! Battle plan export
//!
//! Plain-text summary of the finished session, offered as a download.

use crate::calculator::{compute_surplus, project_growth};
use crate::models::SessionState;
use chrono::NaiveDate;
use std::fmt::Write;

pub const BATTLE_PLAN_FILENAME: &str = "MoneyCommander-BattlePlan.txt";

const NEXT_STEPS: [&str; 3] = [
    "Set up automatic SIP transfers",
    "Review insurance coverage annually",
    "Monitor and rebalance portfolio quarterly",
];

pub fn battle_plan(state: &SessionState, generated: NaiveDate) -> String {
    let profile = &state.profile;
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "MONEY COMMANDER - FINANCIAL BATTLE PLAN");
    let _ = writeln!(out, "========================================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Power Level: {}/100", state.power_level);
    let _ = writeln!(out);
    let _ = writeln!(out, "FINANCIAL INTEL:");
    let _ = writeln!(out, "- Monthly Income: ₹{}", format_rupees(profile.income.into()));
    let _ = writeln!(
        out,
        "- Investment Surplus: ₹{}",
        format_rupees(compute_surplus(profile).into())
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "THE SHIELD:");
    let _ = writeln!(out, "- Term Insurance: {}", protection(profile.term_insurance));
    let _ = writeln!(out, "- Health Insurance: {}", protection(profile.health_insurance));
    let _ = writeln!(out, "- Emergency Fund: {} months", profile.emergency_fund_months);
    let _ = writeln!(out);
    let _ = writeln!(out, "THE DEPLOYMENT:");
    let _ = writeln!(out, "- Monthly SIP: ₹{}", format_rupees(profile.sip_amount.into()));
    let _ = writeln!(out, "- Time Horizon: {} years", profile.sip_years);
    let _ = writeln!(
        out,
        "- Projected Value: ₹{}",
        format_rupees(project_growth(profile.sip_amount, profile.sip_years).into())
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "RISK PROFILE: {}",
        profile.risk_profile.map(|p| p.label()).unwrap_or("Not assessed")
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "NEXT 3 STEPS:");
    for (i, step) in NEXT_STEPS.iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, step);
    }
    let _ = writeln!(out);
    let _ = write!(out, "Generated: {}", generated.format("%d/%m/%Y"));

    out
}

fn protection(enabled: bool) -> &'static str {
    if enabled {
        "Protected"
    } else {
        "Unprotected"
    }
}

/// Group digits the Indian way: 12,34,56,789.
///
/// Takes `i128` so every `u64` amount and every `i64` surplus fits.
pub fn format_rupees(amount: i128) -> String {
    let digits = amount.unsigned_abs().to_string();
    let sign = if amount < 0 { "-" } else { "" };

    if digits.len() <= 3 {
        return format!("{}{}", sign, digits);
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();

    format!("{}{},{}", sign, groups.join(","), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskProfile, Screen};

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_rupees(0), "0");
        assert_eq!(format_rupees(999), "999");
        assert_eq!(format_rupees(1000), "1,000");
        assert_eq!(format_rupees(43_000), "43,000");
        assert_eq!(format_rupees(1_161_695), "11,61,695");
        assert_eq!(format_rupees(123_456_789), "12,34,56,789");
        assert_eq!(format_rupees(-2_500), "-2,500");
    }

    #[test]
    fn test_battle_plan_sections() {
        let mut state = SessionState::new(Screen::Landing);
        state.current_screen = Screen::BattlePlan;
        state.power_level = 100;
        state.profile.income = 80_000;
        state.profile.fixed_bills = 45_000;
        state.profile.health_insurance = false;
        state.profile.risk_profile = Some(RiskProfile::Moderate);

        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();
        let plan = battle_plan(&state, date);

        assert!(plan.starts_with("MONEY COMMANDER - FINANCIAL BATTLE PLAN\n"));
        assert!(plan.contains("Power Level: 100/100"));
        assert!(plan.contains("- Monthly Income: ₹80,000"));
        assert!(plan.contains("- Investment Surplus: ₹35,000"));
        assert!(plan.contains("- Term Insurance: Protected"));
        assert!(plan.contains("- Health Insurance: Unprotected"));
        assert!(plan.contains("- Emergency Fund: 6 months"));
        assert!(plan.contains("- Monthly SIP: ₹5,000"));
        assert!(plan.contains("- Projected Value: ₹11,61,695"));
        assert!(plan.contains("RISK PROFILE: Moderate Investor"));
        assert!(plan.contains("3. Monitor and rebalance portfolio quarterly"));
        assert!(plan.ends_with("Generated: 09/03/2026"));
    }

    #[test]
    fn test_saturated_income_prints_in_full() {
        let mut state = SessionState::new(Screen::BattlePlan);
        state.profile.income = u64::MAX;

        let plan = battle_plan(&state, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(plan.contains("- Monthly Income: ₹1,84,46,74,40,73,70,95,51,615\n"));
        assert!(!plan.contains("₹-"));
    }

    #[test]
    fn test_unassessed_risk_profile() {
        let state = SessionState::new(Screen::Intel);
        let plan = battle_plan(&state, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(plan.contains("RISK PROFILE: Not assessed"));
    }
}
