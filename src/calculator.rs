//! Financial calculators
//!
//! Pure, deterministic arithmetic over the user profile. Nothing here
//! touches the network or the session store.

use crate::models::{UserProfile, MAX_SIP_AMOUNT, MIN_SIP_AMOUNT};

/// Assumed annual return of the SIP projection.
pub const ANNUAL_RETURN: f64 = 0.12;

/// Income minus fixed bills plus savings from every plugged leak.
/// May be negative.
pub fn compute_surplus(profile: &UserProfile) -> i64 {
    let income = i64::try_from(profile.income).unwrap_or(i64::MAX);
    let bills = i64::try_from(profile.fixed_bills).unwrap_or(i64::MAX);

    let leaks_saved: i64 = profile
        .plugged_leaks
        .plugged()
        .map(|leak| leak.savings())
        .sum();

    income.saturating_sub(bills).saturating_add(leaks_saved)
}

/// Future value of a monthly SIP, annuity-due convention:
/// `FV = P * (((1+r)^n - 1) / r) * (1+r)` with `r = 12% / 12`,
/// rounded to the nearest integer.
pub fn project_growth(sip_amount: u64, sip_years: u32) -> i64 {
    project_growth_at(sip_amount, sip_years, ANNUAL_RETURN)
}

/// Same projection at an arbitrary annual rate. A zero rate degrades to
/// the plain sum of contributions; zero years project to zero.
pub fn project_growth_at(sip_amount: u64, sip_years: u32, annual_rate: f64) -> i64 {
    let payment = sip_amount as f64;
    let months = sip_years as f64 * 12.0;
    let r = annual_rate / 12.0;

    let fv = if r == 0.0 {
        payment * months
    } else {
        payment * (((1.0 + r).powf(months) - 1.0) / r) * (1.0 + r)
    };

    fv.round() as i64
}

/// Inclusive bounds for the SIP amount slider: `[1000, min(100000, surplus)]`,
/// collapsing to `[1000, 1000]` when the surplus is below the floor.
pub fn sip_bounds(profile: &UserProfile) -> (u64, u64) {
    let surplus = compute_surplus(profile).max(0) as u64;
    let upper = MAX_SIP_AMOUNT.min(surplus).max(MIN_SIP_AMOUNT);
    (MIN_SIP_AMOUNT, upper)
}
