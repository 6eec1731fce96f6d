use crate::PlotError;

use ndarray::{Array1, Array2, Array3, Zip};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
  #[default]
  Linear,
  Log,
}

/// A variable and its sampling bounds. Complex bounds describe a rectangle
/// in the complex plane (real part along x, imaginary part along y).
#[derive(Debug, Clone, PartialEq)]
pub struct Range {
  pub var: String,
  pub start: Complex64,
  pub end: Complex64,
}

impl Range {
  pub fn new(var: &str, start: f64, end: f64) -> Self {
    Self {
      var: var.to_string(),
      start: Complex64::new(start, 0.0),
      end: Complex64::new(end, 0.0),
    }
  }

  pub fn complex(var: &str, start: Complex64, end: Complex64) -> Self {
    Self {
      var: var.to_string(),
      start,
      end,
    }
  }

  pub fn is_complex(&self) -> bool {
    self.start.im != 0.0 || self.end.im != 0.0
  }

  pub fn real_bounds(&self) -> (f64, f64) {
    (self.start.re, self.end.re)
  }

  /// Check the bounds. Complex ranges must span a proper rectangle; real
  /// ranges must be non-empty and, for log scale, of one sign.
  pub fn validate(
    &self,
    scale: Scale,
    allow_complex: bool,
  ) -> Result<(), PlotError> {
    let finite = |z: Complex64| z.re.is_finite() && z.im.is_finite();
    if !finite(self.start) || !finite(self.end) {
      return Err(PlotError::DomainError(format!(
        "range of {} has a non-finite bound",
        self.var
      )));
    }
    if self.is_complex() {
      if !allow_complex {
        return Err(PlotError::DomainError(format!(
          "range of {} must be real",
          self.var
        )));
      }
      if self.start.re == self.end.re || self.start.im == self.end.im {
        return Err(PlotError::DomainError(format!(
          "complex range of {} does not span an area",
          self.var
        )));
      }
      if scale == Scale::Log {
        return Err(PlotError::DomainError(format!(
          "log scale is not available for the complex range of {}",
          self.var
        )));
      }
      return Ok(());
    }
    if self.start.re == self.end.re {
      return Err(PlotError::DomainError(format!(
        "range of {} is empty: start == end == {}",
        self.var, self.start.re
      )));
    }
    if scale == Scale::Log {
      let (a, b) = self.real_bounds();
      if a == 0.0 || b == 0.0 || a.signum() != b.signum() {
        return Err(PlotError::DomainError(format!(
          "log scale for {} needs non-zero bounds of the same sign, got \
           ({a}, {b})",
          self.var
        )));
      }
    }
    Ok(())
  }
}

impl fmt::Display for Range {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let show = |z: Complex64| {
      if z.im == 0.0 {
        format!("{:?}", z.re)
      } else {
        format!("{:?}{:+?}*I", z.re, z.im)
      }
    };
    write!(f, "({}, {}, {})", self.var, show(self.start), show(self.end))
  }
}

pub fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
  Array1::linspace(start, end, n)
}

/// Logarithmically spaced samples; both bounds must share a sign.
pub fn logspace(
  start: f64,
  end: f64,
  n: usize,
) -> Result<Array1<f64>, PlotError> {
  if start == 0.0 || end == 0.0 || start.signum() != end.signum() {
    return Err(PlotError::DomainError(format!(
      "logspace needs non-zero bounds of the same sign, got ({start}, {end})"
    )));
  }
  let sign = start.signum();
  Ok(
    Array1::linspace(start.abs().ln(), end.abs().ln(), n)
      .mapv(|e| sign * e.exp()),
  )
}

/// Integers inside `[start, end]`, bounds rounded inward.
pub fn integer_span(start: f64, end: f64) -> Result<Array1<f64>, PlotError> {
  let (lo, hi) = if start <= end {
    (start.ceil(), end.floor())
  } else {
    (end.ceil(), start.floor())
  };
  if lo > hi {
    return Err(PlotError::DomainError(format!(
      "no integer lies in ({start}, {end})"
    )));
  }
  let n = (hi - lo) as usize + 1;
  let mut values = Array1::from_iter((0..n).map(|i| lo + i as f64));
  if start > end {
    values.invert_axis(ndarray::Axis(0));
  }
  Ok(values)
}

/// 1D coordinates for a real range according to the discretization policy.
pub fn discretize(
  range: &Range,
  n: usize,
  scale: Scale,
  only_integers: bool,
) -> Result<Array1<f64>, PlotError> {
  let (start, end) = range.real_bounds();
  if only_integers {
    return integer_span(start, end);
  }
  if n < 2 {
    return Err(PlotError::DomainError(format!(
      "{} needs at least 2 samples, got {n}",
      range.var
    )));
  }
  match scale {
    Scale::Linear => Ok(linspace(start, end, n)),
    Scale::Log => logspace(start, end, n),
  }
}

/// `meshgrid(x, y)`: both outputs have shape `(y.len(), x.len())`.
pub fn meshgrid(
  x: &Array1<f64>,
  y: &Array1<f64>,
) -> (Array2<f64>, Array2<f64>) {
  let shape = (y.len(), x.len());
  let xx = Array2::from_shape_fn(shape, |(_, j)| x[j]);
  let yy = Array2::from_shape_fn(shape, |(i, _)| y[i]);
  (xx, yy)
}

/// Three-axis mesh with shape `(y.len(), x.len(), z.len())`.
pub fn meshgrid3(
  x: &Array1<f64>,
  y: &Array1<f64>,
  z: &Array1<f64>,
) -> (Array3<f64>, Array3<f64>, Array3<f64>) {
  let shape = (y.len(), x.len(), z.len());
  (
    Array3::from_shape_fn(shape, |(_, j, _)| x[j]),
    Array3::from_shape_fn(shape, |(i, _, _)| y[i]),
    Array3::from_shape_fn(shape, |(_, _, k)| z[k]),
  )
}

/// Map a radius/angle mesh onto Cartesian coordinates.
pub fn polar_projection(
  r: &Array2<f64>,
  theta: &Array2<f64>,
) -> (Array2<f64>, Array2<f64>) {
  let x = Zip::from(r).and(theta).map_collect(|&r, &t| r * t.cos());
  let y = Zip::from(r).and(theta).map_collect(|&r, &t| r * t.sin());
  (x, y)
}
