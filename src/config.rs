use crate::Predicates;

/// Tuning knobs for a sweep.
///
/// ```rust
/// # use polysweep::SweepConfig;
/// let config = SweepConfig::default().with_epsilon(1e-9).with_step_budget(10_000);
/// assert_eq!(config.step_budget, Some(10_000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepConfig {
  /// Width of the band in which predicates report "colinear" or
  /// "not inside".
  pub epsilon: f64,
  /// How far the two sentinel points stick out of the bounding box, as a
  /// fraction of its width and height.
  pub alpha: f64,
  /// Upper bound on propagation steps. `None` derives a bound from the
  /// number of input points.
  pub step_budget: Option<usize>,
}

impl Default for SweepConfig {
  fn default() -> Self {
    SweepConfig {
      epsilon: 1e-12,
      alpha: 0.3,
      step_budget: None,
    }
  }
}

impl SweepConfig {
  #[must_use]
  pub fn with_epsilon(mut self, epsilon: f64) -> Self {
    self.epsilon = epsilon;
    self
  }

  #[must_use]
  pub fn with_alpha(mut self, alpha: f64) -> Self {
    self.alpha = alpha;
    self
  }

  #[must_use]
  pub fn with_step_budget(mut self, steps: usize) -> Self {
    self.step_budget = Some(steps);
    self
  }

  pub fn predicates(&self) -> Predicates {
    Predicates::new(self.epsilon)
  }

  pub(crate) fn budget_for(&self, points: usize) -> usize {
    self
      .step_budget
      .unwrap_or_else(|| 100_000usize.saturating_add(points.saturating_mul(1_000)))
  }
}
