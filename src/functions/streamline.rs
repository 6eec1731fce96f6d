//! Streamlines of a 2D vector field sampled on an evenly spaced grid.
//!
//! Integration happens in grid-index coordinates with the field rescaled so
//! that arc length is measured in axes units (the whole domain is one unit
//! wide). A coarse occupancy grid keeps streamlines apart: a branch stops as
//! soon as it enters a cell that another streamline already claimed.

use crate::PlotError;

use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::Serialize;

const STEP: f64 = 0.01;
const MAX_ARC_LENGTH: f64 = 2.0;
const MIN_ARC_LENGTH: f64 = 0.2;
const CELLS_PER_UNIT_DENSITY: f64 = 30.0;

/// One streamline in data coordinates, with the occupancy cells it claimed
/// as `(column, row)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trajectory {
  pub x: Vec<f64>,
  pub y: Vec<f64>,
  pub cells: Vec<(usize, usize)>,
}

impl Trajectory {
  pub fn len(&self) -> usize {
    self.x.len()
  }

  pub fn is_empty(&self) -> bool {
    self.x.is_empty()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Termination {
  LeftDomain,
  ArcLength,
  Occupied,
}

struct Branch {
  arc_length: f64,
  xs: Vec<f64>,
  ys: Vec<f64>,
  reason: Termination,
}

struct Occupancy {
  claimed: Array2<bool>,
  spacing: (f64, f64),
}

impl Occupancy {
  fn cell(&self, xi: f64, yi: f64) -> (usize, usize) {
    (
      (xi / self.spacing.0 + 0.5) as usize,
      (yi / self.spacing.1 + 0.5) as usize,
    )
  }

  fn is_free(&self, (cx, cy): (usize, usize)) -> bool {
    !self.claimed[[cy, cx]]
  }

  fn set(&mut self, (cx, cy): (usize, usize), value: bool) {
    self.claimed[[cy, cx]] = value;
  }
}

struct Field {
  u: Array2<f64>,
  v: Array2<f64>,
  speed: Array2<f64>,
  nx: usize,
  ny: usize,
}

impl Field {
  fn inside(&self, xi: f64, yi: f64) -> bool {
    xi >= 0.0
      && xi < (self.nx - 1) as f64
      && yi >= 0.0
      && yi < (self.ny - 1) as f64
  }

  /// Bilinear interpolation; `None` when a neighbour lies outside the grid.
  fn value_at(a: &Array2<f64>, xi: f64, yi: f64) -> Option<f64> {
    if !(xi.is_finite() && yi.is_finite()) {
      return None;
    }
    let (x, y) = (xi.trunc(), yi.trunc());
    if x < 0.0 || y < 0.0 {
      return None;
    }
    let (c, r) = (x as usize, y as usize);
    let a00 = *a.get([r, c])?;
    let a01 = *a.get([r, c + 1])?;
    let a10 = *a.get([r + 1, c])?;
    let a11 = *a.get([r + 1, c + 1])?;
    let (xt, yt) = (xi - x, yi - y);
    let a0 = a00 * (1.0 - xt) + a01 * xt;
    let a1 = a10 * (1.0 - xt) + a11 * xt;
    Some(a0 * (1.0 - yt) + a1 * yt)
  }

  fn direction(&self, xi: f64, yi: f64, sign: f64) -> Option<(f64, f64)> {
    let dt_ds = 1.0 / Self::value_at(&self.speed, xi, yi)?;
    let ui = Self::value_at(&self.u, xi, yi)?;
    let vi = Self::value_at(&self.v, xi, yi)?;
    Some((sign * ui * dt_ds, sign * vi * dt_ds))
  }

  fn rk4_step(&self, xi: f64, yi: f64, sign: f64) -> Option<(f64, f64)> {
    let (k1x, k1y) = self.direction(xi, yi, sign)?;
    let (k2x, k2y) =
      self.direction(xi + 0.5 * STEP * k1x, yi + 0.5 * STEP * k1y, sign)?;
    let (k3x, k3y) =
      self.direction(xi + 0.5 * STEP * k2x, yi + 0.5 * STEP * k2y, sign)?;
    let (k4x, k4y) = self.direction(xi + STEP * k3x, yi + STEP * k3y, sign)?;
    Some((
      xi + STEP * (k1x + 2.0 * k2x + 2.0 * k3x + k4x) / 6.0,
      yi + STEP * (k1y + 2.0 * k2y + 2.0 * k3y + k4y) / 6.0,
    ))
  }

  /// Follow the field (`sign = 1`) or its negation (`sign = -1`).
  fn branch(
    &self,
    x0: f64,
    y0: f64,
    sign: f64,
    occupancy: &mut Occupancy,
    changes: &mut Vec<(usize, usize)>,
  ) -> Branch {
    let (mut xi, mut yi) = (x0, y0);
    let mut current = occupancy.cell(xi, yi);
    let mut arc_length = 0.0;
    let mut xs = Vec::new();
    let mut ys = Vec::new();
    let reason = loop {
      if !self.inside(xi, yi) {
        break Termination::LeftDomain;
      }
      xs.push(xi);
      ys.push(yi);
      let Some((nx, ny)) = self.rk4_step(xi, yi, sign) else {
        break Termination::LeftDomain;
      };
      if !self.inside(nx, ny) {
        break Termination::LeftDomain;
      }
      xi = nx;
      yi = ny;
      arc_length += STEP;
      let cell = occupancy.cell(xi, yi);
      if cell != current {
        if !occupancy.is_free(cell) {
          break Termination::Occupied;
        }
        occupancy.set(cell, true);
        changes.push(cell);
        current = cell;
      }
      if arc_length > MAX_ARC_LENGTH {
        break Termination::ArcLength;
      }
    };
    Branch {
      arc_length,
      xs,
      ys,
      reason,
    }
  }
}

fn uniform_step(coords: ArrayView1<f64>, axis: &str) -> Result<f64, PlotError> {
  if coords.len() < 2 {
    return Err(PlotError::ShapeError(format!(
      "{axis} needs at least 2 grid coordinates"
    )));
  }
  let step = coords[1] - coords[0];
  if !step.is_finite() || step == 0.0 {
    return Err(PlotError::ShapeError(format!("{axis} grid has zero spacing")));
  }
  let tol = 1e-6 * step.abs();
  if coords
    .windows(2)
    .into_iter()
    .any(|w| ((w[1] - w[0]) - step).abs() > tol)
  {
    return Err(PlotError::ShapeError(format!(
      "{axis} grid is not evenly spaced"
    )));
  }
  Ok(step)
}

/// Extract streamlines from `u`, `v` sampled at `x` (columns) and `y`
/// (rows). Every returned trajectory has at least two points.
pub fn integrate(
  x: ArrayView1<f64>,
  y: ArrayView1<f64>,
  u: ArrayView2<f64>,
  v: ArrayView2<f64>,
  density: f64,
) -> Result<Vec<Trajectory>, PlotError> {
  let (nx, ny) = (x.len(), y.len());
  let dx = uniform_step(x, "x")?;
  let dy = uniform_step(y, "y")?;
  if u.shape() != [ny, nx] || v.shape() != [ny, nx] {
    return Err(PlotError::ShapeError(format!(
      "vector components must have shape [{ny}, {nx}], got {:?} and {:?}",
      u.shape(),
      v.shape()
    )));
  }
  let cells = (CELLS_PER_UNIT_DENSITY * density) as usize;
  if !density.is_finite() || cells < 2 {
    return Err(PlotError::DomainError(format!(
      "streamline density {density} is too small"
    )));
  }

  let (x_span, y_span) = (x[nx - 1] - x[0], y[ny - 1] - y[0]);
  let u_axes = u.mapv(|c| c / x_span);
  let v_axes = v.mapv(|c| c / y_span);
  let speed = ndarray::Zip::from(&u_axes)
    .and(&v_axes)
    .map_collect(|a, b| a.hypot(*b));
  let field = Field {
    u: u_axes * nx as f64,
    v: v_axes * ny as f64,
    speed,
    nx,
    ny,
  };
  let mut occupancy = Occupancy {
    claimed: Array2::from_elem((cells, cells), false),
    spacing: (
      nx as f64 / (cells - 1) as f64,
      ny as f64 / (cells - 1) as f64,
    ),
  };

  let mut trajectories = Vec::new();
  let mut seed = |cx: usize, cy: usize, occupancy: &mut Occupancy| {
    if cx >= cells || cy >= cells || !occupancy.is_free((cx, cy)) {
      return;
    }
    let x0 = cx as f64 * occupancy.spacing.0;
    let y0 = cy as f64 * occupancy.spacing.1;
    let mut changes = Vec::new();
    let forward = field.branch(x0, y0, 1.0, occupancy, &mut changes);
    let backward = field.branch(x0, y0, -1.0, occupancy, &mut changes);
    tracing::trace!(
      cx,
      cy,
      forward = ?forward.reason,
      backward = ?backward.reason,
      "streamline branches ended"
    );
    let total = forward.arc_length + backward.arc_length;
    if total <= MIN_ARC_LENGTH {
      for cell in changes {
        occupancy.set(cell, false);
      }
      return;
    }
    let start = occupancy.cell(x0, y0);
    occupancy.set(start, true);
    if !changes.contains(&start) {
      changes.push(start);
    }
    let skip = usize::from(!forward.xs.is_empty());
    let xs: Vec<f64> = backward
      .xs
      .iter()
      .rev()
      .chain(forward.xs.iter().skip(skip))
      .map(|xi| xi * dx + x[0])
      .collect();
    let ys: Vec<f64> = backward
      .ys
      .iter()
      .rev()
      .chain(forward.ys.iter().skip(skip))
      .map(|yi| yi * dy + y[0])
      .collect();
    if xs.len() >= 2 {
      trajectories.push(Trajectory {
        x: xs,
        y: ys,
        cells: changes,
      });
    }
  };

  // Edges first, then spiral inwards.
  let n = cells;
  for indent in 0..n / 2 {
    for i in 0..n - 2 * indent {
      seed(i + indent, indent, &mut occupancy);
      seed(i + indent, n - 1 - indent, &mut occupancy);
      seed(indent, i + indent, &mut occupancy);
      seed(n - 1 - indent, i + indent, &mut occupancy);
    }
  }
  tracing::debug!(
    density,
    trajectories = trajectories.len(),
    "streamline integration finished"
  );
  Ok(trajectories)
}
