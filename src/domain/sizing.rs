//! Risk-based position sizing.
//!
//! quantity = floor(min(risk_per_attempt, remaining_budget) * fx_rate / risk_per_share)
//!
//! Whole shares only. Any non-positive input that would make the division
//! meaningless yields zero. The budget itself is never touched here; the
//! engine deducts the capped risk when it opens the position, before the
//! entry order goes to the broker, and never restores it.

/// Risk actually committed by one attempt: the configured attempt size
/// capped by whatever budget remains.
pub fn capped_risk(risk_per_attempt: f64, remaining_budget: f64) -> f64 {
    risk_per_attempt.min(remaining_budget).max(0.0)
}

pub fn position_size(
    risk_per_attempt: f64,
    remaining_budget: f64,
    fx_rate: f64,
    risk_per_share: f64,
) -> u64 {
    if !(risk_per_share > 0.0) || !(fx_rate > 0.0) {
        return 0;
    }
    let risk = capped_risk(risk_per_attempt, remaining_budget);
    if risk <= 0.0 {
        return 0;
    }
    let shares = (risk * fx_rate / risk_per_share).floor();
    if shares.is_finite() && shares > 0.0 {
        shares as u64
    } else {
        0
    }
}
