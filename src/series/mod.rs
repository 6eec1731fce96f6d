//! Plotted objects and their numeric generation policy.
//!
//! A [`Series`] owns its expressions, their compiled [`Evaluator`]s, the
//! ranges and the Parameter Set. Evaluators are compiled once at
//! construction; [`Series::update_parameters`] only rebinds values.

use crate::evaluator::{
  real_part, real_value, Bindings, Evaluator, Parameters, SymbolicRef,
};
use crate::functions::adaptive;
use crate::functions::discretize::{
  discretize, meshgrid, meshgrid3, polar_projection, Range, Scale,
};
use crate::functions::domain_coloring::colorize;
use crate::functions::poles::filter_poles;
use crate::functions::seeds::{self, SeedMode, Seeds};
use crate::functions::streamline::{self, Trajectory};
use crate::config::SampleCounts;
use crate::PlotError;

use ndarray::{s, Array, Array1, Array2, ArrayD, Dimension, Ix1, Ix2, Ix3};
use num_complex::Complex64;
use std::collections::BTreeSet;
use std::fmt;

pub mod data;
pub mod geometry;
pub mod options;
pub mod slice;

pub use data::SeriesData;
pub use geometry::Shape;
pub use options::{AxisTransform, ComplexComponent, SeriesOptions, Transforms};
pub use slice::Slice;

use geometry::ShapeKind;
use slice::SliceState;

/// Kind of plotted object. Fixed at construction; it determines how many
/// expressions and ranges a series takes and the shape of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKind {
  Points,
  ComplexPoints,
  Line,
  AbsArgLine,
  Parametric2DLine,
  Parametric3DLine,
  Surface,
  Contour,
  ParametricSurface,
  Vector2D,
  Vector3D,
  SliceVector3D,
  ComplexSurface,
  DomainColoring,
  Geometry,
}

impl SeriesKind {
  fn takes_complex_range(self) -> bool {
    matches!(self, SeriesKind::ComplexSurface | SeriesKind::DomainColoring)
  }

  fn applies_steps(self) -> bool {
    matches!(
      self,
      SeriesKind::Points
        | SeriesKind::ComplexPoints
        | SeriesKind::Line
        | SeriesKind::AbsArgLine
        | SeriesKind::Parametric2DLine
        | SeriesKind::Parametric3DLine
    )
  }

  fn description(self, polar: bool) -> &'static str {
    match self {
      SeriesKind::Points => "2D list plot",
      SeriesKind::ComplexPoints => "complex points",
      SeriesKind::Line if polar => "polar line",
      SeriesKind::Line => "cartesian line",
      SeriesKind::AbsArgLine => "cartesian abs-arg line",
      SeriesKind::Parametric2DLine => "parametric cartesian line",
      SeriesKind::Parametric3DLine => "3D parametric cartesian line",
      SeriesKind::Surface if polar => "polar surface",
      SeriesKind::Surface => "cartesian surface",
      SeriesKind::Contour => "contour",
      SeriesKind::ParametricSurface => "parametric cartesian surface",
      SeriesKind::Vector2D => "2D vector series",
      SeriesKind::Vector3D => "3D vector series",
      SeriesKind::SliceVector3D => "sliced 3D vector series",
      SeriesKind::ComplexSurface => "complex cartesian surface",
      SeriesKind::DomainColoring => "domain coloring",
      SeriesKind::Geometry => "geometry entity",
    }
  }
}

enum Payload {
  None,
  Points { x: Array1<f64>, y: Array1<f64> },
  Slice(SliceState),
  Geometry(ShapeKind),
}

pub struct Series {
  kind: SeriesKind,
  exprs: Vec<SymbolicRef>,
  evaluators: Vec<Evaluator>,
  ranges: Vec<Range>,
  options: SeriesOptions,
  counts: [usize; 3],
  params: Parameters,
  payload: Payload,
}

impl fmt::Debug for Series {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let exprs: Vec<String> = self.exprs.iter().map(|e| e.to_string()).collect();
    f.debug_struct("Series")
      .field("kind", &self.kind)
      .field("exprs", &exprs)
      .field("ranges", &self.ranges)
      .field("params", &self.params)
      .finish()
  }
}

fn shape_error(e: ndarray::ShapeError) -> PlotError {
  PlotError::ShapeError(e.to_string())
}

fn dims<D: Dimension>(a: ArrayD<f64>) -> Result<Array<f64, D>, PlotError> {
  a.into_dimensionality::<D>().map_err(shape_error)
}

/// Exactly `N` evaluated arrays, each of dimension `D`.
fn components<D: Dimension, const N: usize>(
  arrays: Vec<ArrayD<f64>>,
) -> Result<[Array<f64, D>; N], PlotError> {
  let found = arrays.len();
  let typed = arrays
    .into_iter()
    .map(dims::<D>)
    .collect::<Result<Vec<Array<f64, D>>, _>>()?;
  typed.try_into().map_err(|_| {
    PlotError::ShapeError(format!("expected {N} components, got {found}"))
  })
}

fn to_complex<D: Dimension>(a: &Array<f64, D>) -> ArrayD<Complex64> {
  a.mapv(|v| Complex64::new(v, 0.0)).into_dyn()
}

fn transform<D: Dimension>(t: &Option<AxisTransform>, a: &mut Array<f64, D>) {
  if let Some(f) = t {
    a.mapv_inplace(|v| f(v));
  }
}

fn real_outputs(values: &[Complex64]) -> Vec<f64> {
  values.iter().map(|z| real_value(*z)).collect()
}

/// `[a0, a1, a1, a2, a2, ...]`: the abscissa of a staircase.
fn steps_abscissa(a: &Array1<f64>) -> Array1<f64> {
  Array1::from_iter(a.iter().flat_map(|&v| [v, v]).skip(1))
}

/// `[a0, a0, a1, a1, ..., a_last]`: values held between abscissa samples.
fn steps_ordinate(a: &Array1<f64>) -> Array1<f64> {
  let n = (2 * a.len()).saturating_sub(1);
  Array1::from_iter(a.iter().flat_map(|&v| [v, v]).take(n))
}

fn parameter_tuple(names: &[&String]) -> String {
  match names {
    [one] => format!("({one},)"),
    _ => {
      let joined: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
      format!("({})", joined.join(", "))
    }
  }
}

fn join_and(parts: &[String]) -> String {
  match parts {
    [] => String::new(),
    [one] => one.clone(),
    [init @ .., last] => format!("{} and {last}", init.join(", ")),
  }
}

impl Series {
  fn build(
    kind: SeriesKind,
    exprs: Vec<SymbolicRef>,
    ranges: Vec<Range>,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    let params = options.params.clone();
    let bound: BTreeSet<String> = params.keys().cloned().collect();
    for (i, range) in ranges.iter().enumerate() {
      if bound.contains(&range.var) {
        return Err(PlotError::ParameterError(format!(
          "{} is both a range variable and a parameter",
          range.var
        )));
      }
      if ranges[..i].iter().any(|r| r.var == range.var) {
        return Err(PlotError::DomainError(format!(
          "{} has more than one range",
          range.var
        )));
      }
      let scale = options.scales.get(i).copied().unwrap_or_default();
      range.validate(scale, kind.takes_complex_range())?;
      if kind.takes_complex_range() && !range.is_complex() {
        return Err(PlotError::DomainError(format!(
          "{kind:?} needs a complex range, got {range}"
        )));
      }
    }
    if !(options.eps.is_finite() && options.eps > 0.0) {
      return Err(PlotError::DomainError(format!(
        "eps must be positive, got {}",
        options.eps
      )));
    }

    let evaluators = exprs
      .iter()
      .map(|e| Evaluator::compile(e.clone(), &bound))
      .collect::<Result<Vec<_>, _>>()?;
    for ev in &evaluators {
      if let Some(s) = ev
        .signature()
        .iter()
        .find(|s| !ranges.iter().any(|r| &r.var == *s))
      {
        return Err(PlotError::DomainError(format!(
          "symbol {s} in {} has neither a range nor a parameter",
          ev.expr()
        )));
      }
    }
    let counts = options.counts(SampleCounts::default().for_kind(kind));
    tracing::debug!(
      ?kind,
      expressions = exprs.len(),
      parameters = params.len(),
      "created series"
    );
    Ok(Self {
      kind,
      exprs,
      evaluators,
      ranges,
      options,
      counts,
      params,
      payload: Payload::None,
    })
  }

  /// A series over raw coordinates.
  pub fn points(
    x: Vec<f64>,
    y: Vec<f64>,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    if x.len() != y.len() {
      return Err(PlotError::ShapeError(format!(
        "x has {} values but y has {}",
        x.len(),
        y.len()
      )));
    }
    let mut series = Self::build(SeriesKind::Points, vec![], vec![], options)?;
    series.payload = Payload::Points {
      x: Array1::from(x),
      y: Array1::from(y),
    };
    Ok(series)
  }

  /// Complex numbers given as expressions, plotted as `(re, im)` points.
  pub fn complex_points(
    exprs: Vec<SymbolicRef>,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(SeriesKind::ComplexPoints, exprs, vec![], options)
  }

  pub fn line(
    expr: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(SeriesKind::Line, vec![expr.into()], vec![range], options)
  }

  /// Modulus and argument of a complex function of a real variable.
  pub fn abs_arg_line(
    expr: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(SeriesKind::AbsArgLine, vec![expr.into()], vec![range], options)
  }

  pub fn parametric_line_2d(
    x: impl Into<SymbolicRef>,
    y: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(
      SeriesKind::Parametric2DLine,
      vec![x.into(), y.into()],
      vec![range],
      options,
    )
  }

  pub fn parametric_line_3d(
    x: impl Into<SymbolicRef>,
    y: impl Into<SymbolicRef>,
    z: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(
      SeriesKind::Parametric3DLine,
      vec![x.into(), y.into(), z.into()],
      vec![range],
      options,
    )
  }

  /// `z = f(x, y)`. With `is_polar` the ranges are radius and angle.
  pub fn surface(
    expr: impl Into<SymbolicRef>,
    r1: Range,
    r2: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(SeriesKind::Surface, vec![expr.into()], vec![r1, r2], options)
  }

  pub fn contour(
    expr: impl Into<SymbolicRef>,
    r1: Range,
    r2: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(SeriesKind::Contour, vec![expr.into()], vec![r1, r2], options)
  }

  pub fn parametric_surface(
    x: impl Into<SymbolicRef>,
    y: impl Into<SymbolicRef>,
    z: impl Into<SymbolicRef>,
    ru: Range,
    rv: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(
      SeriesKind::ParametricSurface,
      vec![x.into(), y.into(), z.into()],
      vec![ru, rv],
      options,
    )
  }

  /// A 2D or 3D vector field, chosen by the number of components.
  pub fn vector(
    components: Vec<SymbolicRef>,
    ranges: Vec<Range>,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    let kind = match (components.len(), ranges.len()) {
      (2, 2) => SeriesKind::Vector2D,
      (3, 3) => SeriesKind::Vector3D,
      (c, r) => {
        return Err(PlotError::DomainError(format!(
          "a vector field needs 2 or 3 components with as many ranges, got \
           {c} component(s) and {r} range(s)"
        )))
      }
    };
    Self::build(kind, components, ranges, options)
  }

  pub fn vector_2d(
    u: impl Into<SymbolicRef>,
    v: impl Into<SymbolicRef>,
    rx: Range,
    ry: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::vector(vec![u.into(), v.into()], vec![rx, ry], options)
  }

  pub fn vector_3d(
    components: [SymbolicRef; 3],
    ranges: [Range; 3],
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::vector(components.to_vec(), ranges.to_vec(), options)
  }

  /// A 3D vector field sampled on `slice` instead of the full box.
  pub fn slice_vector_3d(
    components: [SymbolicRef; 3],
    ranges: [Range; 3],
    slice: Slice,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    let mut series = Self::build(
      SeriesKind::SliceVector3D,
      components.to_vec(),
      ranges.to_vec(),
      options,
    )?;
    let bound: BTreeSet<String> = series.params.keys().cloned().collect();
    let state = SliceState::new(slice, &series.ranges, &bound)?;
    series.payload = Payload::Slice(state);
    Ok(series)
  }

  /// One component of a complex function over a rectangle of the complex
  /// plane.
  pub fn complex_surface(
    expr: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(
      SeriesKind::ComplexSurface,
      vec![expr.into()],
      vec![range],
      options,
    )
  }

  pub fn domain_coloring(
    expr: impl Into<SymbolicRef>,
    range: Range,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    Self::build(
      SeriesKind::DomainColoring,
      vec![expr.into()],
      vec![range],
      options,
    )
  }

  pub fn geometry(
    shape: Shape,
    options: SeriesOptions,
  ) -> Result<Self, PlotError> {
    let (kind, exprs) = shape.flatten()?;
    let mut series = Self::build(SeriesKind::Geometry, exprs, vec![], options)?;
    series.payload = Payload::Geometry(kind);
    Ok(series)
  }

  pub fn kind(&self) -> SeriesKind {
    self.kind
  }

  pub fn ranges(&self) -> &[Range] {
    &self.ranges
  }

  pub fn options(&self) -> &SeriesOptions {
    &self.options
  }

  pub fn expressions(&self) -> &[SymbolicRef] {
    &self.exprs
  }

  /// The compiled evaluators, one per expression.
  pub fn evaluators(&self) -> &[Evaluator] {
    &self.evaluators
  }

  pub fn parameters(&self) -> &Parameters {
    &self.params
  }

  pub fn is_interactive(&self) -> bool {
    !self.params.is_empty()
  }

  /// Rebind parameter values. Every name must be a parameter of this series
  /// or of its slice surface. Nothing is recompiled.
  pub fn update_parameters(
    &mut self,
    values: &Parameters,
  ) -> Result<(), PlotError> {
    let slice_params = match &self.payload {
      Payload::Slice(state) => {
        state.surface().map(|s| s.parameters().clone()).unwrap_or_default()
      }
      _ => Parameters::new(),
    };
    if let Some(unknown) = values
      .keys()
      .find(|k| !self.params.contains_key(*k) && !slice_params.contains_key(*k))
    {
      return Err(PlotError::ParameterError(format!(
        "{unknown} is not a parameter of {self}"
      )));
    }
    for (name, value) in values {
      if let Some(slot) = self.params.get_mut(name) {
        *slot = *value;
      }
    }
    if let Payload::Slice(state) = &mut self.payload {
      if let Some(surface) = state.surface_mut() {
        let own: Parameters = values
          .iter()
          .filter(|(k, _)| slice_params.contains_key(*k))
          .map(|(k, v)| (k.clone(), *v))
          .collect();
        surface.update_parameters(&own)?;
      }
    }
    tracing::debug!(updated = values.len(), "parameters updated");
    Ok(())
  }

  /// User label if one was given, otherwise the expression(s) in plain or
  /// formatted (LaTeX) form.
  pub fn get_label(&self, formatted: bool) -> String {
    if let Some(label) = &self.options.label {
      return label.clone();
    }
    if let Payload::Geometry(kind) = &self.payload {
      return kind.name().to_string();
    }
    let parts: Vec<String> = self
      .exprs
      .iter()
      .map(|e| {
        if formatted {
          e.to_formatted_string()
        } else {
          e.to_string()
        }
      })
      .collect();
    match parts.len() {
      0 => String::new(),
      1 => parts[0].clone(),
      _ if formatted => format!("\\left({}\\right)", parts.join(", ")),
      _ => format!("({})", parts.join(", ")),
    }
  }

  // ── Sampling helpers ───────────────────────────────────────────────────

  fn axis(&self, i: usize) -> Result<Array1<f64>, PlotError> {
    discretize(
      &self.ranges[i],
      self.counts[i],
      self.options.scales[i],
      self.options.only_integers,
    )
  }

  fn uses_adaptive(&self) -> bool {
    self.options.adaptive && !self.options.only_integers
  }

  /// Every evaluator at one point given by named coordinates.
  fn point_values(&self, named: &[(&str, f64)]) -> Vec<Complex64> {
    let nan = Complex64::new(f64::NAN, f64::NAN);
    self
      .evaluators
      .iter()
      .map(|ev| {
        let args: Vec<Complex64> = ev
          .signature()
          .iter()
          .map(|s| {
            named
              .iter()
              .find(|(n, _)| *n == s.as_str())
              .map_or(nan, |(_, v)| Complex64::new(*v, 0.0))
          })
          .collect();
        let params: Vec<Complex64> = ev
          .parameters()
          .iter()
          .map(|p| self.params.get(p).copied().unwrap_or(nan))
          .collect();
        ev.eval_point(&args, &params).unwrap_or(nan)
      })
      .collect()
  }

  /// Parameter samples of a line: adaptive, integer-snapped or fixed.
  fn line_parameter(
    &self,
    outputs: impl Fn(&[Complex64]) -> Vec<f64>,
  ) -> Result<Array1<f64>, PlotError> {
    let range = &self.ranges[0];
    if !self.uses_adaptive() {
      return self.axis(0);
    }
    let (a, b) = range.real_bounds();
    let log = self.options.scales[0] == Scale::Log;
    let sign = a.signum();
    let to_t = |s: f64| if log { sign * s.exp() } else { s };
    let (sa, sb) = if log {
      (a.abs().ln(), b.abs().ln())
    } else {
      (a, b)
    };
    let samples = adaptive::sample_line(
      |s| outputs(&self.point_values(&[(range.var.as_str(), to_t(s))])),
      sa,
      sb,
      &self.options.adaptive_goal,
      self.options.loss_fn.as_ref(),
    )?;
    let mut t: Vec<f64> = samples.t.into_iter().map(to_t).collect();
    // Keep the start-to-end order of the fixed grid.
    if let (Some(&first), Some(&last)) = (t.first(), t.last()) {
      if (last - first) * (b - a) < 0.0 {
        t.reverse();
      }
    }
    Ok(Array1::from(t))
  }

  fn eval_line(
    &self,
    t: &Array1<f64>,
  ) -> Result<Vec<Array1<Complex64>>, PlotError> {
    let zt = to_complex(t);
    let mut vars = Bindings::new();
    vars.insert(self.ranges[0].var.as_str(), zt.view());
    (0..self.evaluators.len())
      .map(|i| {
        self.evaluators[i]
          .evaluate_named(&vars, &self.params, &[t.len()])?
          .into_dimensionality::<Ix1>()
          .map_err(shape_error)
      })
      .collect()
  }

  /// Coordinates of both axes of a two-parameter grid.
  fn grid_axes(
    &self,
    outputs: impl Fn(&[Complex64]) -> Vec<f64>,
  ) -> Result<(Array1<f64>, Array1<f64>), PlotError> {
    if !self.uses_adaptive() {
      return Ok((self.axis(0)?, self.axis(1)?));
    }
    let (r1, r2) = (&self.ranges[0], &self.ranges[1]);
    let samples = adaptive::sample_surface(
      |u, v| {
        outputs(
          &self.point_values(&[(r1.var.as_str(), u), (r2.var.as_str(), v)]),
        )
      },
      r1.real_bounds(),
      r2.real_bounds(),
      &self.options.adaptive_goal,
      self.options.loss_fn.as_ref(),
    )?;
    Ok((Array1::from(samples.u), Array1::from(samples.v)))
  }

  /// Evaluate every expression on position arrays bound to the ranges.
  fn eval_positions<D: Dimension>(
    &self,
    positions: &[&Array<f64, D>],
  ) -> Result<Vec<ArrayD<f64>>, PlotError> {
    let complex: Vec<ArrayD<Complex64>> =
      positions.iter().map(|p| to_complex(*p)).collect();
    let mut vars = Bindings::new();
    for (range, values) in self.ranges.iter().zip(&complex) {
      vars.insert(range.var.as_str(), values.view());
    }
    let shape = positions
      .first()
      .map(|p| p.shape().to_vec())
      .unwrap_or_default();
    self
      .evaluators
      .iter()
      .map(|ev| {
        let values = ev.evaluate_named(&vars, &self.params, &shape)?;
        Ok(real_part(&values))
      })
      .collect()
  }

  /// Complex-plane grid `(re, im, z)` for complex-range kinds.
  fn complex_grid(
    &self,
  ) -> Result<(Array2<f64>, Array2<f64>, Array2<Complex64>), PlotError> {
    let range = &self.ranges[0];
    let re = Range::new(&range.var, range.start.re, range.end.re);
    let im = Range::new(&range.var, range.start.im, range.end.im);
    let only_integers = self.options.only_integers;
    let xs = discretize(&re, self.counts[0], Scale::Linear, only_integers)?;
    let ys = discretize(&im, self.counts[1], Scale::Linear, only_integers)?;
    let (xx, yy) = meshgrid(&xs, &ys);
    let zz = ndarray::Zip::from(&xx)
      .and(&yy)
      .map_collect(|&a, &b| Complex64::new(a, b))
      .into_dyn();
    let mut vars = Bindings::new();
    vars.insert(range.var.as_str(), zz.view());
    let w = self.evaluators[0]
      .evaluate_named(&vars, &self.params, xx.shape())?
      .into_dimensionality::<Ix2>()
      .map_err(shape_error)?;
    Ok((xx, yy, w))
  }

  fn finish_steps(
    &self,
    abscissa: &mut Array1<f64>,
    rest: &mut [&mut Array1<f64>],
  ) {
    if !(self.options.steps && self.kind.applies_steps()) {
      return;
    }
    *abscissa = steps_abscissa(abscissa);
    for a in rest.iter_mut() {
      let held = steps_ordinate(a);
      **a = held;
    }
  }

  // ── Data generation ────────────────────────────────────────────────────

  /// Evaluate the series. Undefined samples are NaN; only invalid shapes
  /// are errors here.
  pub fn get_data(&self) -> Result<SeriesData, PlotError> {
    let t = &self.options.transforms;
    let data = match self.kind {
      SeriesKind::Points => {
        let Payload::Points { x, y } = &self.payload else {
          return Err(PlotError::ShapeError("missing point data".to_string()));
        };
        let (mut x, mut y) = (x.clone(), y.clone());
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        self.finish_steps(&mut x, &mut [&mut y]);
        SeriesData::Points { x, y }
      }
      SeriesKind::ComplexPoints => {
        let values = self.point_values(&[]);
        let mut x = Array1::from_iter(values.iter().map(|z| z.re));
        let mut y = Array1::from_iter(values.iter().map(|z| z.im));
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        self.finish_steps(&mut x, &mut [&mut y]);
        SeriesData::Points { x, y }
      }
      SeriesKind::Line => self.line_data()?,
      SeriesKind::AbsArgLine => {
        let mut x = self.line_parameter(|v| vec![v[0].norm(), v[0].arg()])?;
        let w = self.eval_line(&x)?.remove(0);
        let mut abs = w.mapv(|z| z.norm());
        let mut arg = w.mapv(|z| z.arg());
        transform(&t.x, &mut x);
        transform(&t.y, &mut abs);
        self.finish_steps(&mut x, &mut [&mut abs, &mut arg]);
        SeriesData::AbsArgLine { x, abs, arg }
      }
      SeriesKind::Parametric2DLine | SeriesKind::Parametric3DLine => {
        let mut param = self.line_parameter(real_outputs)?;
        let mut comps: Vec<Array1<f64>> = self
          .eval_line(&param)?
          .into_iter()
          .map(|c| c.mapv(real_value))
          .collect();
        for (c, tf) in comps.iter_mut().zip([&t.x, &t.y, &t.z]) {
          transform(tf, c);
        }
        transform(&t.param, &mut param);
        let mut it = comps.into_iter();
        let (mut x, mut y) = match (it.next(), it.next()) {
          (Some(x), Some(y)) => (x, y),
          _ => return Err(PlotError::ShapeError("missing component".into())),
        };
        match it.next() {
          Some(mut z) => {
            self.finish_steps(&mut x, &mut [&mut y, &mut z, &mut param]);
            SeriesData::Parametric3DLine { x, y, z, param }
          }
          None => {
            self.finish_steps(&mut x, &mut [&mut y, &mut param]);
            SeriesData::Parametric2DLine { x, y, param }
          }
        }
      }
      SeriesKind::Surface | SeriesKind::Contour => {
        let (xs, ys) = self.grid_axes(real_outputs)?;
        let (mut xx, mut yy) = meshgrid(&xs, &ys);
        let mut z: Array2<f64> =
          dims(self.eval_positions(&[&xx, &yy])?.remove(0))?;
        if self.options.is_polar {
          (xx, yy) = polar_projection(&xx, &yy);
        }
        transform(&t.x, &mut xx);
        transform(&t.y, &mut yy);
        transform(&t.z, &mut z);
        if self.kind == SeriesKind::Contour {
          SeriesData::Contour { x: xx, y: yy, z }
        } else {
          SeriesData::Surface { x: xx, y: yy, z }
        }
      }
      SeriesKind::ParametricSurface => {
        let (us, vs) = self.grid_axes(real_outputs)?;
        let (u, v) = meshgrid(&us, &vs);
        let [mut x, mut y, mut z] =
          components::<Ix2, 3>(self.eval_positions(&[&u, &v])?)?;
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        transform(&t.z, &mut z);
        SeriesData::ParametricSurface { x, y, z, u, v }
      }
      SeriesKind::Vector2D => {
        let (mut x, mut y) = meshgrid(&self.axis(0)?, &self.axis(1)?);
        let [u, v] = components::<Ix2, 2>(self.eval_positions(&[&x, &y])?)?;
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        SeriesData::Vector2D { x, y, u, v }
      }
      SeriesKind::Vector3D => {
        let (mut x, mut y, mut z) =
          meshgrid3(&self.axis(0)?, &self.axis(1)?, &self.axis(2)?);
        let [u, v, w] =
          components::<Ix3, 3>(self.eval_positions(&[&x, &y, &z])?)?;
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        transform(&t.z, &mut z);
        SeriesData::Vector3D { x, y, z, u, v, w }
      }
      SeriesKind::SliceVector3D => {
        let Payload::Slice(state) = &self.payload else {
          return Err(PlotError::ShapeError("missing slice".to_string()));
        };
        let [mut x, mut y, mut z] = state.positions(
          &self.ranges,
          &self.counts,
          self.options.only_integers,
          &self.params,
        )?;
        let [u, v, w] =
          components::<Ix2, 3>(self.eval_positions(&[&x, &y, &z])?)?;
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        transform(&t.z, &mut z);
        SeriesData::SliceVector3D { x, y, z, u, v, w }
      }
      SeriesKind::ComplexSurface => {
        let (mut x, mut y, w) = self.complex_grid()?;
        let mut z = match self.options.component {
          ComplexComponent::Abs => w.mapv(|c| c.norm()),
          ComplexComponent::Real => w.mapv(|c| c.re),
          ComplexComponent::Imag => w.mapv(|c| c.im),
          ComplexComponent::Arg => w.mapv(|c| c.arg()),
        };
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        transform(&t.z, &mut z);
        SeriesData::ComplexSurface { x, y, z }
      }
      SeriesKind::DomainColoring => {
        let (mut x, mut y, w) = self.complex_grid()?;
        let (image, color_scale) =
          colorize(w.view(), &self.options.coloring, self.options.phaseres)?;
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        SeriesData::DomainColoring {
          x,
          y,
          abs: w.mapv(|c| c.norm()),
          arg: w.mapv(|c| c.arg()),
          image,
          color_scale,
        }
      }
      SeriesKind::Geometry => {
        let Payload::Geometry(kind) = &self.payload else {
          return Err(PlotError::ShapeError("missing geometry".to_string()));
        };
        let values = real_outputs(&self.point_values(&[]));
        let (mut x, mut y) = geometry::outline(*kind, &values, self.counts[0]);
        transform(&t.x, &mut x);
        transform(&t.y, &mut y);
        SeriesData::Geometry {
          x,
          y,
          filled: self.options.is_filled && kind.is_closed(),
        }
      }
    };
    Ok(data)
  }

  fn line_data(&self) -> Result<SeriesData, PlotError> {
    let mut x = self.line_parameter(real_outputs)?;
    let mut y = self.eval_line(&x)?.remove(0).mapv(real_value);
    let poles_detected = self.options.detect_poles
      && filter_poles(x.view(), y.view_mut(), self.options.eps);
    if self.options.is_polar {
      let (theta, r) = (x, y);
      x = ndarray::Zip::from(&theta)
        .and(&r)
        .map_collect(|t, r| r * t.cos());
      y = ndarray::Zip::from(&theta)
        .and(&r)
        .map_collect(|t, r| r * t.sin());
    }
    let t = &self.options.transforms;
    transform(&t.x, &mut x);
    transform(&t.y, &mut y);
    self.finish_steps(&mut x, &mut [&mut y]);
    Ok(SeriesData::Line {
      x,
      y,
      poles_detected,
    })
  }

  /// Streamlines of a 2D vector series.
  pub fn streamlines(
    &self,
    density: f64,
  ) -> Result<Vec<Trajectory>, PlotError> {
    match self.get_data()? {
      SeriesData::Vector2D { x, y, u, v } => streamline::integrate(
        x.slice(s![0, ..]),
        y.slice(s![.., 0]),
        u.view(),
        v.view(),
        density,
      ),
      _ => Err(PlotError::DomainError(format!(
        "streamlines need a 2D vector series, not {:?}",
        self.kind
      ))),
    }
  }

  /// Start points for an external 3D stream tracer.
  pub fn seed_points(
    &self,
    as_coordinates: bool,
    mode: &SeedMode,
  ) -> Result<Seeds, PlotError> {
    match self.get_data()? {
      SeriesData::Vector3D { x, y, z, u, v, w } => seeds::select(
        x.view(),
        y.view(),
        z.view(),
        u.view(),
        v.view(),
        w.view(),
        as_coordinates,
        mode,
      ),
      _ => Err(PlotError::DomainError(format!(
        "seed points need a 3D vector series, not {:?}",
        self.kind
      ))),
    }
  }
}

impl fmt::Display for Series {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let prefix = self.kind.description(self.options.is_polar);
    let exprs: Vec<String> = self.exprs.iter().map(|e| e.to_string()).collect();
    let body = match (&self.payload, exprs.as_slice()) {
      (Payload::Points { x, .. }, _) => format!("{} points", x.len()),
      (Payload::Geometry(kind), _) => {
        format!("{}({})", kind.name(), exprs.join(", "))
      }
      (_, [one]) => one.clone(),
      _ => format!("({})", exprs.join(", ")),
    };
    if self.is_interactive() {
      let names: Vec<&String> = self.params.keys().collect();
      write!(f, "interactive {prefix}: {body}")?;
      if !self.ranges.is_empty() {
        let ranges: Vec<String> =
          self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, " with ranges {} and", ranges.join(", "))?;
      } else {
        write!(f, " with")?;
      }
      return write!(f, " parameters {}", parameter_tuple(&names));
    }
    let over: Vec<String> = self
      .ranges
      .iter()
      .flat_map(|r| {
        if r.is_complex() {
          vec![
            format!("re({}) over ({:?}, {:?})", r.var, r.start.re, r.end.re),
            format!("im({}) over ({:?}, {:?})", r.var, r.start.im, r.end.im),
          ]
        } else {
          vec![format!("{} over ({:?}, {:?})", r.var, r.start.re, r.end.re)]
        }
      })
      .collect();
    if over.is_empty() {
      write!(f, "{prefix}: {body}")
    } else {
      write!(f, "{prefix}: {body} for {}", join_and(&over))
    }
  }
}
