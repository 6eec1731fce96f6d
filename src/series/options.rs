use crate::config::Defaults;
use crate::evaluator::Parameters;
use crate::functions::adaptive::{AdaptiveGoal, LossFn};
use crate::functions::discretize::Scale;
use crate::functions::domain_coloring::{Coloring, DEFAULT_PHASERES};
use crate::functions::poles::DEFAULT_EPS;
use crate::series::SeriesKind;
use crate::PlotError;

use std::fmt;
use std::sync::Arc;

/// Elementwise map applied to one output axis.
pub type AxisTransform = Arc<dyn Fn(f64) -> f64 + Send + Sync>;

/// Optional per-axis output transforms. `param` applies to the parameter
/// array of parametric lines.
#[derive(Clone, Default)]
pub struct Transforms {
  pub x: Option<AxisTransform>,
  pub y: Option<AxisTransform>,
  pub z: Option<AxisTransform>,
  pub param: Option<AxisTransform>,
}

impl fmt::Debug for Transforms {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Transforms")
      .field("x", &self.x.is_some())
      .field("y", &self.y.is_some())
      .field("z", &self.z.is_some())
      .field("param", &self.param.is_some())
      .finish()
  }
}

/// Which real quantity a complex surface shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ComplexComponent {
  #[default]
  Abs,
  Real,
  Imag,
  Arg,
}

/// Discretization and post-processing policy of a series.
///
/// Sample counts left as `None` fall back to the built-in count for the
/// series kind.
#[derive(Clone)]
pub struct SeriesOptions {
  pub label: Option<String>,
  pub n1: Option<usize>,
  pub n2: Option<usize>,
  pub n3: Option<usize>,
  /// Spacing of the first, second and third range.
  pub scales: [Scale; 3],
  pub adaptive: bool,
  pub adaptive_goal: AdaptiveGoal,
  pub loss_fn: Option<LossFn>,
  pub only_integers: bool,
  pub steps: bool,
  pub detect_poles: bool,
  pub eps: f64,
  pub is_polar: bool,
  /// Fill closed geometry outlines instead of drawing only the edge.
  pub is_filled: bool,
  pub transforms: Transforms,
  /// Initial Parameter Set; its keys are the bound symbols.
  pub params: Parameters,
  pub coloring: Coloring,
  pub phaseres: u32,
  pub component: ComplexComponent,
}

impl Default for SeriesOptions {
  fn default() -> Self {
    Self {
      label: None,
      n1: None,
      n2: None,
      n3: None,
      scales: [Scale::Linear; 3],
      adaptive: false,
      adaptive_goal: AdaptiveGoal::default(),
      loss_fn: None,
      only_integers: false,
      steps: false,
      detect_poles: false,
      eps: DEFAULT_EPS,
      is_polar: false,
      is_filled: true,
      transforms: Transforms::default(),
      params: Parameters::new(),
      coloring: Coloring::default(),
      phaseres: DEFAULT_PHASERES,
      component: ComplexComponent::default(),
    }
  }
}

impl fmt::Debug for SeriesOptions {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("SeriesOptions")
      .field("label", &self.label)
      .field("n", &(self.n1, self.n2, self.n3))
      .field("scales", &self.scales)
      .field("adaptive", &self.adaptive)
      .field("adaptive_goal", &self.adaptive_goal)
      .field("custom_loss", &self.loss_fn.is_some())
      .field("only_integers", &self.only_integers)
      .field("steps", &self.steps)
      .field("detect_poles", &self.detect_poles)
      .field("eps", &self.eps)
      .field("is_polar", &self.is_polar)
      .field("is_filled", &self.is_filled)
      .field("transforms", &self.transforms)
      .field("params", &self.params)
      .field("coloring", &self.coloring)
      .field("phaseres", &self.phaseres)
      .field("component", &self.component)
      .finish()
  }
}

impl SeriesOptions {
  /// Options seeded from `defaults` for a series of the given kind.
  pub fn from_defaults(
    defaults: &Defaults,
    kind: SeriesKind,
  ) -> Result<Self, PlotError> {
    let n = defaults.samples.for_kind(kind);
    Ok(Self {
      n1: Some(n),
      n2: Some(n),
      n3: Some(n),
      adaptive_goal: AdaptiveGoal::Loss(defaults.adaptive_goal),
      eps: defaults.eps,
      coloring: defaults.coloring()?,
      phaseres: defaults.phaseres,
      ..Self::default()
    })
  }

  /// Sample counts for the three axes, falling back to `fallback`.
  pub(crate) fn counts(&self, fallback: usize) -> [usize; 3] {
    [
      self.n1.unwrap_or(fallback),
      self.n2.unwrap_or(fallback),
      self.n3.unwrap_or(fallback),
    ]
  }
}
