use crate::PlotError;

use ndarray::{s, Array2, ArrayView2, ArrayView3};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

/// How start points for 3D streamlines are chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SeedMode {
  /// Boundary points where the field enters the bounding box.
  #[default]
  InwardFlow,
  /// Caller-supplied points, returned as given.
  Coordinates(Vec<[f64; 3]>),
  /// `n` uniform points inside the bounding box. A fixed `seed` makes the
  /// draw reproducible.
  Random { n: usize, seed: Option<u64> },
}

/// Point cloud in the layout expected by VTK-style stream tracers: every
/// point is its own vertex cell, stored flat as `[1, index, 1, index, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PolyData {
  pub points: Vec<[f64; 3]>,
  pub verts: Vec<usize>,
}

impl PolyData {
  pub fn from_points(points: Vec<[f64; 3]>) -> Self {
    let verts = (0..points.len()).flat_map(|i| [1, i]).collect();
    Self { points, verts }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Seeds {
  Coordinates(Array2<f64>),
  PolyData(PolyData),
}

impl Seeds {
  pub fn len(&self) -> usize {
    match self {
      Seeds::Coordinates(a) => a.nrows(),
      Seeds::PolyData(p) => p.points.len(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn with_rng<F, R>(seed: Option<u64>, f: F) -> R
where
  F: FnOnce(&mut dyn RngCore) -> R,
{
  match seed {
    Some(seed) => f(&mut ChaCha8Rng::seed_from_u64(seed)),
    None => f(&mut rand::thread_rng()),
  }
}

/// Points of one face of the grid where the face-normal component of the
/// field points into the box.
fn inward_on_face(
  coords: [ArrayView2<f64>; 3],
  normal: ArrayView2<f64>,
  entering: impl Fn(f64) -> bool,
  out: &mut Vec<[f64; 3]>,
) {
  for ((idx, &n), &x) in normal.indexed_iter().zip(coords[0].iter()) {
    let p = [x, coords[1][idx], coords[2][idx]];
    if entering(n) && p.iter().any(|c| !c.is_nan()) {
      out.push(p);
    }
  }
}

/// The first (`last == false`) or last plane of `a` across `axis`.
fn face<'a>(
  a: &ArrayView3<'a, f64>,
  axis: usize,
  last: bool,
) -> ArrayView2<'a, f64> {
  let i = if last { a.shape()[axis] as isize - 1 } else { 0 };
  let a = a.clone();
  match axis {
    0 => a.slice_move(s![i, .., ..]),
    1 => a.slice_move(s![.., i, ..]),
    _ => a.slice_move(s![.., .., i]),
  }
}

fn bounds(a: &ArrayView3<f64>) -> (f64, f64) {
  a.iter()
    .filter(|v| v.is_finite())
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
      (lo.min(v), hi.max(v))
    })
}

/// Choose seed points for a vector field sampled on a `(ny, nx, nz)` mesh.
#[allow(clippy::too_many_arguments)]
pub fn select<'a>(
  x: ArrayView3<'a, f64>,
  y: ArrayView3<'a, f64>,
  z: ArrayView3<'a, f64>,
  u: ArrayView3<'a, f64>,
  v: ArrayView3<'a, f64>,
  w: ArrayView3<'a, f64>,
  as_coordinates: bool,
  mode: &SeedMode,
) -> Result<Seeds, PlotError> {
  let shape = x.shape();
  for (name, a) in [("y", &y), ("z", &z), ("u", &u), ("v", &v), ("w", &w)] {
    if a.shape() != shape {
      return Err(PlotError::ShapeError(format!(
        "{name} has shape {:?}, expected {shape:?}",
        a.shape()
      )));
    }
  }

  let points: Vec<[f64; 3]> = match mode {
    SeedMode::Coordinates(points) => points.clone(),
    SeedMode::Random { n, seed } => {
      if x.is_empty() {
        return Err(PlotError::ShapeError("empty grid".to_string()));
      }
      let (bx, by, bz) = (bounds(&x), bounds(&y), bounds(&z));
      with_rng(*seed, |rng| {
        (0..*n)
          .map(|_| {
            let mut draw =
              |(lo, hi): (f64, f64)| lo + (hi - lo) * rng.gen::<f64>();
            [draw(bx), draw(by), draw(bz)]
          })
          .collect()
      })
    }
    SeedMode::InwardFlow => {
      if x.is_empty() {
        return Err(PlotError::ShapeError("empty grid".to_string()));
      }
      let mut found = Vec::new();
      // Mesh axes are (y, x, z); the field component normal to each face.
      for (axis, normal) in [(1usize, &u), (0, &v), (2, &w)] {
        for last in [false, true] {
          let coords = [
            face(&x, axis, last),
            face(&y, axis, last),
            face(&z, axis, last),
          ];
          let n = face(normal, axis, last);
          if last {
            inward_on_face(coords, n, |c| c < 0.0, &mut found);
          } else {
            inward_on_face(coords, n, |c| c > 0.0, &mut found);
          }
        }
      }
      let mut unique: Vec<[f64; 3]> = Vec::with_capacity(found.len());
      let mut seen = std::collections::HashSet::new();
      for p in found {
        if seen.insert(p.map(f64::to_bits)) {
          unique.push(p);
        }
      }
      unique
    }
  };

  tracing::debug!(
    mode = mode_name(mode),
    seeds = points.len(),
    "selected seed points"
  );
  if as_coordinates {
    let flat: Vec<f64> = points.iter().flatten().copied().collect();
    let array = Array2::from_shape_vec((points.len(), 3), flat)
      .map_err(|e| PlotError::ShapeError(e.to_string()))?;
    Ok(Seeds::Coordinates(array))
  } else {
    Ok(Seeds::PolyData(PolyData::from_points(points)))
  }
}

fn mode_name(mode: &SeedMode) -> &'static str {
  match mode {
    SeedMode::InwardFlow => "inward-flow",
    SeedMode::Coordinates(_) => "coordinates",
    SeedMode::Random { .. } => "random",
  }
}
