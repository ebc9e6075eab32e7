// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Pure helper predicting a goal's completion percentage from its health status and progress
// role: enrichment/estimation
// outputs: Integer percentage 0..=100
// invariants:
// - Deterministic math; no IO; no panics
// - Stable → min(100, p+40); Deviated → min(80, p+20); HighRisk → min(50, p+5)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use crate::model::{Goal, GoalStatus};

/// Uplift and ceiling per health status.
#[derive(Debug, Clone, Copy)]
pub struct AchievementWeights {
  pub stable_uplift: i64,
  pub stable_cap: i64,
  pub deviated_uplift: i64,
  pub deviated_cap: i64,
  pub high_risk_uplift: i64,
  pub high_risk_cap: i64,
}

impl Default for AchievementWeights {
  fn default() -> Self {
    Self {
      stable_uplift: 40,
      stable_cap: 100,
      deviated_uplift: 20,
      deviated_cap: 80,
      high_risk_uplift: 5,
      high_risk_cap: 50,
    }
  }
}

/// Predicted completion percentage; `progress` is expected to be in 0..=100 already.
pub fn estimate(progress: i64, status: GoalStatus) -> i64 {
  estimate_with(progress, status, AchievementWeights::default())
}

pub fn estimate_with(progress: i64, status: GoalStatus, weights: AchievementWeights) -> i64 {
  let (uplift, cap) = match status {
    GoalStatus::Stable => (weights.stable_uplift, weights.stable_cap),
    GoalStatus::Deviated => (weights.deviated_uplift, weights.deviated_cap),
    GoalStatus::HighRisk => (weights.high_risk_uplift, weights.high_risk_cap),
  };
  cap.min(progress.saturating_add(uplift))
}

/// Estimate for a goal record, clamping out-of-range progress first.
pub fn estimate_goal(goal: &Goal) -> i64 {
  estimate(goal.progress.clamp(0, 100), goal.status)
}
