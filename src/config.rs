//! Engine-wide defaults, loadable from a JSON file.
//!
//! Every field is optional in the file; missing entries keep their built-in
//! value:
//!
//! ```json
//! { "adaptive_goal": 0.005, "samples": { "line": 500 }, "coloring": "b" }
//! ```

use crate::functions::domain_coloring::{Coloring, DEFAULT_PHASERES};
use crate::functions::poles::DEFAULT_EPS;
use crate::functions::adaptive::DEFAULT_GOAL;
use crate::series::SeriesKind;
use crate::PlotError;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of samples per axis, by series kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SampleCounts {
  pub line: usize,
  pub surface: usize,
  pub vector_2d: usize,
  pub vector_3d: usize,
  pub complex: usize,
  pub geometry: usize,
}

impl Default for SampleCounts {
  fn default() -> Self {
    Self {
      line: 1000,
      surface: 100,
      vector_2d: 25,
      vector_3d: 10,
      complex: 300,
      geometry: 100,
    }
  }
}

impl SampleCounts {
  pub fn for_kind(&self, kind: SeriesKind) -> usize {
    match kind {
      SeriesKind::Points | SeriesKind::ComplexPoints => self.line,
      SeriesKind::Line
      | SeriesKind::AbsArgLine
      | SeriesKind::Parametric2DLine
      | SeriesKind::Parametric3DLine => self.line,
      SeriesKind::Surface
      | SeriesKind::Contour
      | SeriesKind::ParametricSurface => self.surface,
      SeriesKind::Vector2D => self.vector_2d,
      SeriesKind::Vector3D | SeriesKind::SliceVector3D => self.vector_3d,
      SeriesKind::ComplexSurface | SeriesKind::DomainColoring => self.complex,
      SeriesKind::Geometry => self.geometry,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
  /// Loss threshold of the adaptive sampler.
  pub adaptive_goal: f64,
  pub samples: SampleCounts,
  /// Pole filter sensitivity.
  pub eps: f64,
  /// Domain-coloring scheme letter, `a` to `j`.
  pub coloring: String,
  pub phaseres: u32,
  pub stream_density: f64,
}

impl Default for Defaults {
  fn default() -> Self {
    Self {
      adaptive_goal: DEFAULT_GOAL,
      samples: SampleCounts::default(),
      eps: DEFAULT_EPS,
      coloring: "a".to_string(),
      phaseres: DEFAULT_PHASERES,
      stream_density: 1.0,
    }
  }
}

impl Defaults {
  pub fn from_json(content: &str) -> Result<Self, PlotError> {
    let defaults: Defaults = serde_json::from_str(content).map_err(|e| {
      PlotError::ConfigError(format!("Failed to parse defaults: {}", e))
    })?;
    defaults.validate()?;
    Ok(defaults)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, PlotError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
      PlotError::ConfigError(format!(
        "Failed to read defaults file {:?}: {}",
        path, e
      ))
    })?;
    let defaults = Self::from_json(&content)?;
    tracing::debug!(?path, "loaded defaults");
    Ok(defaults)
  }

  pub fn coloring(&self) -> Result<Coloring, PlotError> {
    self
      .coloring
      .parse()
      .map_err(|e: PlotError| PlotError::ConfigError(e.to_string()))
  }

  fn validate(&self) -> Result<(), PlotError> {
    if !(self.adaptive_goal.is_finite() && self.adaptive_goal >= 0.0) {
      return Err(PlotError::ConfigError(format!(
        "adaptive_goal must be a non-negative number, got {}",
        self.adaptive_goal
      )));
    }
    if !(self.eps.is_finite() && self.eps > 0.0) {
      return Err(PlotError::ConfigError(format!(
        "eps must be positive, got {}",
        self.eps
      )));
    }
    if !(self.stream_density.is_finite() && self.stream_density > 0.0) {
      return Err(PlotError::ConfigError(format!(
        "stream_density must be positive, got {}",
        self.stream_density
      )));
    }
    self.coloring()?;
    Ok(())
  }
}
